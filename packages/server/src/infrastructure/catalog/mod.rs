//! Catalog implementations.

pub mod fixture;

pub use fixture::StaticCatalog;
