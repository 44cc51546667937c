//! Shared library for the torii gateway.
//!
//! Cross-cutting utilities used by the server package: logging setup and
//! time handling with a clock abstraction for testability.

pub mod logger;
pub mod time;
