//! Domain layer of the relay.
//!
//! Value objects, entities and the traits the use case layer depends on.
//! Concrete implementations live in the infrastructure layer (dependency
//! inversion).

pub mod auth;
pub mod catalog;
pub mod entity;
pub mod error;
pub mod outbound;
pub mod registry;
pub mod session;
pub mod value_object;

pub use auth::{AuthClaims, AuthVerifier};
pub use catalog::{BackpackItem, Catalog, MarketItem};
pub use entity::{Connection, Departure, Member, RoomSummary};
pub use error::{AuthError, MessagePushError, RegistryError, ValueObjectError};
pub use outbound::{PusherChannel, PusherReceiver};
pub use registry::RoomRegistry;
pub use session::SessionState;
pub use value_object::{ConnectionId, Identity, RoomId, Timestamp};

#[cfg(test)]
pub use auth::MockAuthVerifier;
