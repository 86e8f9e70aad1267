//! Room-scoped WebSocket relay.
//!
//! Clients authenticate once against the platform identity service, join a
//! named room and then exchange events that are fanned out to every other
//! member of that room.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
