pub mod dose_event;
pub mod enums;
pub mod medication;
pub mod patient;
pub mod request;
pub mod user;

pub use dose_event::*;
pub use enums::{ApprovalStatus, DoseStatus, UserRole};
pub use medication::*;
pub use patient::*;
pub use request::*;
pub use user::*;
