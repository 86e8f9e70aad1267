//! Utilities shared by the Jigger relay server and its CLI client.

pub mod logger;
pub mod time;
