//! Value objects for the chat broker domain.

use std::fmt;

use uuid::Uuid;

use super::error::ValidationError;

pub const MAX_USER_NAME_CHARS: usize = 32;
pub const MAX_ROOM_NAME_CHARS: usize = 64;
pub const MAX_MESSAGE_BODY_CHARS: usize = 2000;

/// Sentinel display name for senders that raced with their own disconnect.
const ANONYMOUS_USER_NAME: &str = "Anonymous";

/// The room every user lands in on join. Exists for the broker's lifetime.
const GENERAL_ROOM_ID: &str = "general";

/// Transport-level connection identifier, unique for the lifetime of one
/// session. Generated by the transport layer when a connection is accepted;
/// the core references it but never owns the connection itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Generate a fresh identifier for a newly accepted connection.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap an identifier received on the wire (e.g. a private-message
    /// recipient).
    pub fn new(value: String) -> Result<Self, ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::EmptyConnectionId);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Display name a user picked at join time. Not required to be unique.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserName(String);

impl UserName {
    pub fn new(value: String) -> Result<Self, ValidationError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyUserName);
        }
        let chars = trimmed.chars().count();
        if chars > MAX_USER_NAME_CHARS {
            return Err(ValidationError::UserNameTooLong(chars));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Sentinel for unregistered senders (disconnect races).
    pub fn anonymous() -> Self {
        Self(ANONYMOUS_USER_NAME.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Human-readable room name as typed by the user ("Game Night").
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomName(String);

impl RoomName {
    pub fn new(value: String) -> Result<Self, ValidationError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyRoomName);
        }
        let chars = trimmed.chars().count();
        if chars > MAX_ROOM_NAME_CHARS {
            return Err(ValidationError::RoomNameTooLong(chars));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Room identifier, derived from the display name by lower-casing it and
/// collapsing whitespace runs to hyphens. "Game Night" and "game night"
/// both resolve to `game-night`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomId(String);

impl RoomId {
    /// Wrap an identifier received on the wire (`join_room`).
    pub fn new(value: String) -> Result<Self, ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::EmptyRoomId);
        }
        Ok(Self(value))
    }

    /// Derive the identifier for a room name.
    pub fn from_name(name: &RoomName) -> Self {
        let slug = name
            .as_str()
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-");
        Self(slug)
    }

    /// The default room every user joins first.
    pub fn general() -> Self {
        Self(GENERAL_ROOM_ID.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Text content of a chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBody(String);

impl MessageBody {
    pub fn new(value: String) -> Result<Self, ValidationError> {
        if value.is_empty() {
            return Err(ValidationError::EmptyMessageBody);
        }
        let chars = value.chars().count();
        if chars > MAX_MESSAGE_BODY_CHARS {
            return Err(ValidationError::MessageBodyTooLong(chars));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Message identifier, fresh per message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageId(String);

impl MessageId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unix timestamp in JST (milliseconds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_name_rejects_empty() {
        // テスト項目: 空のユーザー名はエラーになる
        // given (前提条件):
        let value = "   ".to_string();

        // when (操作):
        let result = UserName::new(value);

        // then (期待する結果):
        assert_eq!(result, Err(ValidationError::EmptyUserName));
    }

    #[test]
    fn test_user_name_rejects_too_long() {
        // テスト項目: 上限を超えるユーザー名はエラーになる
        // given (前提条件):
        let value = "a".repeat(MAX_USER_NAME_CHARS + 1);

        // when (操作):
        let result = UserName::new(value);

        // then (期待する結果):
        assert_eq!(
            result,
            Err(ValidationError::UserNameTooLong(MAX_USER_NAME_CHARS + 1))
        );
    }

    #[test]
    fn test_user_name_trims_whitespace() {
        // テスト項目: ユーザー名の前後の空白が除去される
        // given (前提条件):
        let value = "  alice  ".to_string();

        // when (操作):
        let result = UserName::new(value).unwrap();

        // then (期待する結果):
        assert_eq!(result.as_str(), "alice");
    }

    #[test]
    fn test_anonymous_user_name() {
        // テスト項目: 未登録の送信者にはセンチネル名 "Anonymous" が使われる
        // given (前提条件):

        // when (操作):
        let name = UserName::anonymous();

        // then (期待する結果):
        assert_eq!(name.as_str(), "Anonymous");
    }

    #[test]
    fn test_room_id_from_name_collapses_whitespace() {
        // テスト項目: ルーム名の空白がハイフンに変換され小文字化される
        // given (前提条件):
        let name = RoomName::new("Game Night".to_string()).unwrap();

        // when (操作):
        let room_id = RoomId::from_name(&name);

        // then (期待する結果):
        assert_eq!(room_id.as_str(), "game-night");
    }

    #[test]
    fn test_room_id_from_name_is_case_insensitive() {
        // テスト項目: 大文字小文字の違うルーム名が同じ ID に解決される
        // given (前提条件):
        let upper = RoomName::new("Game Night".to_string()).unwrap();
        let lower = RoomName::new("game night".to_string()).unwrap();

        // when (操作):
        let id_upper = RoomId::from_name(&upper);
        let id_lower = RoomId::from_name(&lower);

        // then (期待する結果):
        assert_eq!(id_upper, id_lower);
        assert_eq!(id_upper.as_str(), "game-night");
    }

    #[test]
    fn test_room_id_from_name_collapses_whitespace_runs() {
        // テスト項目: 連続する空白が 1 つのハイフンにまとめられる
        // given (前提条件):
        let name = RoomName::new("late   night   talk".to_string()).unwrap();

        // when (操作):
        let room_id = RoomId::from_name(&name);

        // then (期待する結果):
        assert_eq!(room_id.as_str(), "late-night-talk");
    }

    #[test]
    fn test_message_body_rejects_empty() {
        // テスト項目: 空のメッセージ本文はエラーになる
        // given (前提条件):
        let value = String::new();

        // when (操作):
        let result = MessageBody::new(value);

        // then (期待する結果):
        assert_eq!(result, Err(ValidationError::EmptyMessageBody));
    }

    #[test]
    fn test_connection_id_generate_is_unique() {
        // テスト項目: 生成される接続 ID が一意である
        // given (前提条件):

        // when (操作):
        let id1 = ConnectionId::generate();
        let id2 = ConnectionId::generate();

        // then (期待する結果):
        assert_ne!(id1, id2);
    }
}
