//! UseCase layer: application operations composed from domain traits.

pub mod authenticate;
pub mod broadcast;
pub mod catalog;
pub mod error;
pub mod get_room_detail;
pub mod join_room;
pub mod leave_room;
pub mod list_rooms;

pub use authenticate::AuthenticateUseCase;
pub use broadcast::{BroadcastReport, BroadcastUseCase};
pub use catalog::CatalogUseCase;
pub use error::{GetRoomDetailError, JoinError};
pub use get_room_detail::GetRoomDetailUseCase;
pub use join_room::{JoinRoomUseCase, JoinedRoom};
pub use leave_room::LeaveRoomUseCase;
pub use list_rooms::ListRoomsUseCase;
