//! Infrastructure layer: concrete implementations of the domain traits and
//! the wire DTOs.

pub mod auth;
pub mod catalog;
pub mod dto;
pub mod registry;
