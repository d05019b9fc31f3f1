//! Entities for the chat broker domain.

use std::collections::{HashSet, VecDeque};

use super::value_object::{
    ConnectionId, MessageBody, MessageId, RoomId, RoomName, Timestamp, UserName,
};

/// A room's history keeps at most this many messages (FIFO eviction).
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// One user, created on join and destroyed on disconnect. At most one per
/// connection. `current_room` is `None` until the user has joined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: ConnectionId,
    pub username: UserName,
    pub current_room: Option<RoomId>,
}

impl User {
    pub fn new(id: ConnectionId, username: UserName) -> Self {
        Self {
            id,
            username,
            current_room: None,
        }
    }
}

/// Binary payload attached to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub mime: String,
    pub data: Vec<u8>,
}

/// Where a message is delivered: a whole room, or one peer connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Room(RoomId),
    Direct(ConnectionId),
}

/// An immutable chat message. Direct (private) messages are never appended
/// to any room's history; they exist only in the delivery path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: MessageId,
    pub sender_id: ConnectionId,
    pub sender: UserName,
    pub destination: Destination,
    pub body: Option<MessageBody>,
    pub attachment: Option<Attachment>,
    pub is_system: bool,
    pub sent_at: Timestamp,
}

impl ChatMessage {
    /// Build a text message with a fresh id.
    pub fn text(
        sender_id: ConnectionId,
        sender: UserName,
        destination: Destination,
        body: MessageBody,
        sent_at: Timestamp,
    ) -> Self {
        Self {
            id: MessageId::generate(),
            sender_id,
            sender,
            destination,
            body: Some(body),
            attachment: None,
            is_system: false,
            sent_at,
        }
    }

    /// Build an attachment message with a fresh id.
    pub fn attachment(
        sender_id: ConnectionId,
        sender: UserName,
        destination: Destination,
        attachment: Attachment,
        sent_at: Timestamp,
    ) -> Self {
        Self {
            id: MessageId::generate(),
            sender_id,
            sender,
            destination,
            body: None,
            attachment: Some(attachment),
            is_system: false,
            sent_at,
        }
    }

    pub fn is_private(&self) -> bool {
        matches!(self.destination, Destination::Direct(_))
    }
}

/// A named chat room: membership set plus a bounded, ordered message
/// history for replay to newly joined connections.
#[derive(Debug, Clone)]
pub struct Room {
    pub id: RoomId,
    pub name: RoomName,
    members: HashSet<ConnectionId>,
    history: VecDeque<ChatMessage>,
    history_capacity: usize,
    pub created_at: Timestamp,
}

impl Room {
    pub fn new(id: RoomId, name: RoomName, created_at: Timestamp) -> Self {
        Self::with_history_capacity(id, name, created_at, DEFAULT_HISTORY_CAPACITY)
    }

    pub fn with_history_capacity(
        id: RoomId,
        name: RoomName,
        created_at: Timestamp,
        history_capacity: usize,
    ) -> Self {
        Self {
            id,
            name,
            members: HashSet::new(),
            history: VecDeque::with_capacity(history_capacity),
            history_capacity,
            created_at,
        }
    }

    /// Add a connection to the membership set. Returns false if it was
    /// already a member.
    pub fn add_member(&mut self, connection_id: ConnectionId) -> bool {
        self.members.insert(connection_id)
    }

    /// Remove a connection from the membership set. Returns false if it was
    /// not a member.
    pub fn remove_member(&mut self, connection_id: &ConnectionId) -> bool {
        self.members.remove(connection_id)
    }

    pub fn contains_member(&self, connection_id: &ConnectionId) -> bool {
        self.members.contains(connection_id)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Current membership as a value snapshot, sorted for stable output.
    pub fn members_snapshot(&self) -> Vec<ConnectionId> {
        let mut members: Vec<ConnectionId> = self.members.iter().cloned().collect();
        members.sort();
        members
    }

    /// Append a message to the bounded history. When the buffer is at
    /// capacity the oldest entry is evicted first, so the history never
    /// holds more than `history_capacity` messages.
    pub fn append_history(&mut self, message: ChatMessage) {
        if self.history.len() >= self.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(message);
    }

    /// Current history as a value snapshot, oldest first.
    pub fn history_snapshot(&self) -> Vec<ChatMessage> {
        self.history.iter().cloned().collect()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_room() -> Room {
        Room::new(
            RoomId::general(),
            RoomName::new("General Chat".to_string()).unwrap(),
            Timestamp::new(1000),
        )
    }

    fn test_message(body: &str) -> ChatMessage {
        ChatMessage::text(
            ConnectionId::generate(),
            UserName::new("alice".to_string()).unwrap(),
            Destination::Room(RoomId::general()),
            MessageBody::new(body.to_string()).unwrap(),
            Timestamp::new(2000),
        )
    }

    #[test]
    fn test_add_and_remove_member() {
        // テスト項目: メンバーの追加・削除が membership に反映される
        // given (前提条件):
        let mut room = test_room();
        let conn = ConnectionId::generate();

        // when (操作):
        let added = room.add_member(conn.clone());
        let removed = room.remove_member(&conn);

        // then (期待する結果):
        assert!(added);
        assert!(removed);
        assert!(!room.contains_member(&conn));
        assert_eq!(room.member_count(), 0);
    }

    #[test]
    fn test_remove_member_not_present_is_noop() {
        // テスト項目: 存在しないメンバーの削除は no-op になる
        // given (前提条件):
        let mut room = test_room();
        let conn = ConnectionId::generate();

        // when (操作):
        let removed = room.remove_member(&conn);

        // then (期待する結果):
        assert!(!removed);
    }

    #[test]
    fn test_history_never_exceeds_capacity() {
        // テスト項目: 履歴が容量を超えず、101 件目の追加で最古の 1 件が追い出される
        // given (前提条件):
        let mut room = test_room();
        for i in 0..DEFAULT_HISTORY_CAPACITY {
            room.append_history(test_message(&format!("message {i}")));
        }
        assert_eq!(room.history_len(), DEFAULT_HISTORY_CAPACITY);

        // when (操作): 101 件目を追加
        room.append_history(test_message("the newest message"));

        // then (期待する結果):
        let history = room.history_snapshot();
        assert_eq!(history.len(), DEFAULT_HISTORY_CAPACITY);
        // 最古のメッセージが消えている
        assert_eq!(
            history[0].body.as_ref().unwrap().as_str(),
            "message 1"
        );
        // 最新のメッセージが末尾にある
        assert_eq!(
            history.last().unwrap().body.as_ref().unwrap().as_str(),
            "the newest message"
        );
    }

    #[test]
    fn test_history_snapshot_preserves_order() {
        // テスト項目: 履歴スナップショットが追加順を保持する
        // given (前提条件):
        let mut room = test_room();
        room.append_history(test_message("first"));
        room.append_history(test_message("second"));
        room.append_history(test_message("third"));

        // when (操作):
        let history = room.history_snapshot();

        // then (期待する結果):
        let bodies: Vec<&str> = history
            .iter()
            .map(|m| m.body.as_ref().unwrap().as_str())
            .collect();
        assert_eq!(bodies, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_private_message_is_flagged() {
        // テスト項目: Direct 宛てのメッセージが private として判定される
        // given (前提条件):
        let recipient = ConnectionId::generate();
        let message = ChatMessage::text(
            ConnectionId::generate(),
            UserName::new("bob".to_string()).unwrap(),
            Destination::Direct(recipient),
            MessageBody::new("psst".to_string()).unwrap(),
            Timestamp::new(3000),
        );

        // when (操作):
        let is_private = message.is_private();

        // then (期待する結果):
        assert!(is_private);
    }
}
