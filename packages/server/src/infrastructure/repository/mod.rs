//! Repository 実装
//!
//! - `inmemory`: HashMap をインメモリストアとして使用する実装

pub mod inmemory;

pub use inmemory::{InMemoryChannelIndex, InMemoryConnectionRegistry};
