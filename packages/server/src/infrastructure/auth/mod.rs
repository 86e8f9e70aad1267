//! Identity service clients.

pub mod http;

pub use http::HttpAuthVerifier;
