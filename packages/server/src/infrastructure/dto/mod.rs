//! Data Transfer Objects (DTOs) for the gateway.
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket message DTOs (inbound envelope, outbound frames)
//! - `http`: HTTP API request / response DTOs

pub mod http;
pub mod websocket;
