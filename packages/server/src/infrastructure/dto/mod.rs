//! Data Transfer Objects (DTOs) for the relay.
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket message DTOs
//! - `auth`: identity service request / response
//! - `http`: HTTP API response DTOs

pub mod auth;
pub mod conversion;
pub mod http;
pub mod websocket;
