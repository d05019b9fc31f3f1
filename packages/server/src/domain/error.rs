//! Error types for the broker domain.

use thiserror::Error;

use super::value_object::{
    ConnectionId, MAX_MESSAGE_BODY_CHARS, MAX_ROOM_NAME_CHARS, MAX_USER_NAME_CHARS,
};

/// Validation errors raised by value object constructors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("connection id must not be empty")]
    EmptyConnectionId,
    #[error("user name must not be empty")]
    EmptyUserName,
    #[error("user name too long: {0} chars (max {max})", max = MAX_USER_NAME_CHARS)]
    UserNameTooLong(usize),
    #[error("room name must not be empty")]
    EmptyRoomName,
    #[error("room name too long: {0} chars (max {max})", max = MAX_ROOM_NAME_CHARS)]
    RoomNameTooLong(usize),
    #[error("room id must not be empty")]
    EmptyRoomId,
    #[error("message body must not be empty")]
    EmptyMessageBody,
    #[error("message body too long: {0} chars (max {max})", max = MAX_MESSAGE_BODY_CHARS)]
    MessageBodyTooLong(usize),
    #[error("attachment file name must not be empty")]
    EmptyFileName,
}

/// Errors raised while handling one inbound event.
///
/// All of these are local and non-fatal: the offending event is dropped and
/// logged, processing continues for every other connection, and nothing is
/// sent back to the originating connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrokerError {
    #[error("connection '{0}' has already joined")]
    DuplicateJoin(ConnectionId),
    #[error("room '{0}' not found")]
    RoomNotFound(String),
    #[error("sender '{0}' is not registered or has no current room")]
    UnregisteredSender(ConnectionId),
    #[error("malformed payload: {0}")]
    MalformedPayload(#[from] ValidationError),
    #[error("payload of {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },
}

/// Errors raised by the outbound transport seam.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("client '{0}' not found")]
    ClientNotFound(String),
    #[error("failed to push message: {0}")]
    PushFailed(String),
}
