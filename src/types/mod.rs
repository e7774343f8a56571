//! Canonical types for crosstalk
//!
//! These are the platform-independent shapes produced by the adapter
//! normalizers and consumed by the router, the messaging facade and plugin
//! handlers. Nothing in here knows a Slack field name from a Discord one.

pub mod channel;
pub mod message;
pub mod team;
pub mod user;

// Re-export for convenience
pub use channel::{Channel, ChannelKind};
pub use message::{friendly_timestamp, Attachment, Message, DEFAULT_FALLBACK};
pub use team::Team;
pub use user::User;
