//! Conversion logic between domain entities and DTOs.

use idobata_shared::time::timestamp_to_jst_rfc3339;

use crate::domain::{Attachment, ChatMessage, Destination, RoomSummary, User};
use crate::infrastructure::dto::websocket as dto;

// ========================================
// Domain Entity → DTO
// ========================================

impl From<&User> for dto::UserDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.as_str().to_string(),
            username: user.username.as_str().to_string(),
        }
    }
}

impl From<&RoomSummary> for dto::RoomSummaryDto {
    fn from(summary: &RoomSummary) -> Self {
        Self {
            id: summary.id.as_str().to_string(),
            name: summary.name.as_str().to_string(),
            user_count: summary.member_count,
        }
    }
}

impl From<&Attachment> for dto::AttachmentDto {
    fn from(attachment: &Attachment) -> Self {
        Self {
            filename: attachment.filename.clone(),
            mime: attachment.mime.clone(),
            data: attachment.data.clone(),
        }
    }
}

impl From<&ChatMessage> for dto::MessageDto {
    fn from(message: &ChatMessage) -> Self {
        let (room_id, to) = match &message.destination {
            Destination::Room(room_id) => (Some(room_id.as_str().to_string()), None),
            Destination::Direct(peer) => (None, Some(peer.as_str().to_string())),
        };
        Self {
            id: message.id.as_str().to_string(),
            sender: message.sender.as_str().to_string(),
            sender_id: message.sender_id.as_str().to_string(),
            room_id,
            to,
            message: message.body.as_ref().map(|b| b.as_str().to_string()),
            attachment: message.attachment.as_ref().map(dto::AttachmentDto::from),
            is_private: message.is_private(),
            system: message.is_system,
            timestamp: timestamp_to_jst_rfc3339(message.sent_at.value()),
        }
    }
}
