//! Real-time connection gateway library.
//!
//! This library implements the torii gateway: it admits long-lived WebSocket
//! connections under a capacity bound, authorizes every inbound operation
//! against a role-based access policy, throttles senders with a sliding-window
//! rate limiter, and fans messages out to channel subscribers.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// externally-owned configuration
pub mod config;
