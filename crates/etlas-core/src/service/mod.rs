//! Application services.
//!
//! Thin services wrap the entity repositories; `MessageService` additionally
//! orchestrates a full completion round-trip.

pub mod attachment;
pub mod chat;
pub mod message;
pub mod scheme;
pub mod user;

pub use attachment::AttachmentService;
pub use chat::ChatService;
pub use message::{MessageService, SendMessage};
pub use scheme::SchemeService;
pub use user::UserService;
