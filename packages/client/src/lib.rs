//! Interactive CLI client for the room relay.
//!
//! Performs the `auth` handshake, prints room events and sends chat lines and
//! slash commands typed at the prompt.

mod domain;
mod error;
mod formatter;
mod runner;
mod session;
mod ui;

pub use error::ClientError;
pub use runner::{ClientConfig, run_client};
