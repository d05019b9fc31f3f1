//! Domain layer for the chat broker.
//!
//! Value objects, entities, and the core broker components
//! (connection registry, room directory, typing coalescer), plus the
//! `MessagePusher` trait that abstracts the outbound transport.

pub mod directory;
pub mod entity;
pub mod error;
pub mod pusher;
pub mod registry;
pub mod typing;
pub mod value_object;

pub use directory::{RoomDirectory, RoomSummary};
pub use entity::{
    Attachment, ChatMessage, DEFAULT_HISTORY_CAPACITY, Destination, Room, User,
};
pub use error::{BrokerError, MessagePushError, ValidationError};
pub use pusher::{MessagePusher, PusherChannel};
pub use registry::ConnectionRegistry;
pub use typing::TypingCoalescer;
pub use value_object::{ConnectionId, MessageBody, MessageId, RoomId, RoomName, Timestamp, UserName};

#[cfg(test)]
pub use pusher::MockMessagePusher;
