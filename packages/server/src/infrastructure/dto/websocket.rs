//! WebSocket frame DTOs.
//!
//! Every frame is a JSON object tagged by `type`. Inbound kinds form a
//! closed enum so that adding a kind is a compile-time-checked change
//! (exhaustive match in the router), instead of dispatch by string tag.

use serde::{Deserialize, Serialize};

/// Inbound events (connection → broker).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    /// `{"type":"user_join","username":"alice"}`
    UserJoin { username: String },
    /// `{"type":"create_room","roomName":"Game Night"}`
    CreateRoom { room_name: String },
    /// `{"type":"join_room","roomId":"game-night"}`
    JoinRoom { room_id: String },
    /// `{"type":"send_message","message":"hello"}`
    SendMessage { message: String },
    /// Room attachment when `to` is absent, private attachment otherwise.
    /// `roomId` is accepted for wire compatibility; the sender's current
    /// room is authoritative for room-scoped delivery.
    SendAttachment {
        filename: String,
        mime: String,
        data: Vec<u8>,
        #[serde(default)]
        room_id: Option<String>,
        #[serde(default)]
        to: Option<String>,
    },
    /// `{"type":"private_message","to":"<connection id>","message":"psst"}`
    PrivateMessage { to: String, message: String },
    /// `{"type":"typing","isTyping":true}`
    Typing { is_typing: bool },
}

/// Outbound events (broker → connection(s)).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// First frame on every accepted connection: the assigned connection id.
    Connected { id: String },
    UserList { users: Vec<UserDto> },
    RoomList { rooms: Vec<RoomSummaryDto> },
    UserJoined { id: String, username: String },
    UserLeft { id: String, username: String },
    /// Sent once, to the connection that just joined a room.
    MessageHistory { messages: Vec<MessageDto> },
    ReceiveMessage(MessageDto),
    ReceiveAttachment(MessageDto),
    PrivateMessage(MessageDto),
    TypingUsers { users: Vec<String> },
}

/// One user as seen in `user_list` broadcasts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: String,
    pub username: String,
}

/// One room as seen in `room_list` broadcasts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummaryDto {
    pub id: String,
    pub name: String,
    pub user_count: usize,
}

/// Attachment payload riding on a message frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentDto {
    pub filename: String,
    pub mime: String,
    pub data: Vec<u8>,
}

/// One delivered message. Clients synthesize their own system entries from
/// `user_joined`/`user_left`, so `system` is false for everything the
/// broker relays today; the field stays on the wire for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub id: String,
    pub sender: String,
    pub sender_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<AttachmentDto>,
    pub is_private: bool,
    pub system: bool,
    pub timestamp: String,
}
