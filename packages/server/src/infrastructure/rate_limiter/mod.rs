//! レートリミッタ実装
//!
//! - `sliding_window`: スライディングウィンドウ方式の実装

pub mod sliding_window;

pub use sliding_window::SlidingWindowRateLimiter;
