//! Room directory: the set of rooms, their memberships, and their
//! bounded histories.

use std::collections::HashMap;

use super::entity::{ChatMessage, DEFAULT_HISTORY_CAPACITY, Room};
use super::error::BrokerError;
use super::value_object::{ConnectionId, RoomId, RoomName, Timestamp};

/// Lightweight per-room view for the room-list broadcast and HTTP API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSummary {
    pub id: RoomId,
    pub name: RoomName,
    pub member_count: usize,
    pub created_at: Timestamp,
}

/// Result of joining a room: what the switching connection needs for
/// replay, fixed as a value snapshot inside the critical section.
#[derive(Debug, Clone)]
pub struct RoomJoin {
    pub history: Vec<ChatMessage>,
    pub members: Vec<ConnectionId>,
}

/// All rooms known to the broker. The `general` room exists for the
/// broker's lifetime; other rooms are created on demand and never removed.
#[derive(Debug)]
pub struct RoomDirectory {
    rooms: HashMap<RoomId, Room>,
    history_capacity: usize,
}

impl RoomDirectory {
    /// Create the directory with the `general` room already present.
    pub fn new(created_at: Timestamp) -> Self {
        Self::with_history_capacity(created_at, DEFAULT_HISTORY_CAPACITY)
    }

    pub fn with_history_capacity(created_at: Timestamp, history_capacity: usize) -> Self {
        let general_id = RoomId::general();
        let general = Room::with_history_capacity(
            general_id.clone(),
            RoomName::new("General Chat".to_string())
                .expect("default room name is valid"),
            created_at,
            history_capacity,
        );
        let mut rooms = HashMap::new();
        rooms.insert(general_id, general);
        Self {
            rooms,
            history_capacity,
        }
    }

    /// Ensure a room with this name exists. Idempotent: if a room with the
    /// derived id already exists the call is a no-op, not an error. Returns
    /// the room id and whether a room was actually created.
    pub fn ensure_room(&mut self, name: &RoomName, created_at: Timestamp) -> (RoomId, bool) {
        let room_id = RoomId::from_name(name);
        if self.rooms.contains_key(&room_id) {
            return (room_id, false);
        }
        let room = Room::with_history_capacity(
            room_id.clone(),
            name.clone(),
            created_at,
            self.history_capacity,
        );
        self.rooms.insert(room_id.clone(), room);
        (room_id, true)
    }

    /// Move a connection into a room as one atomic step: remove it from
    /// every other room's membership, add it to the target, and return the
    /// target's history snapshot and membership for replay.
    ///
    /// Fails with `RoomNotFound` if the target room is unknown, in which
    /// case no membership changes.
    pub fn join_room(
        &mut self,
        connection_id: ConnectionId,
        room_id: &RoomId,
    ) -> Result<RoomJoin, BrokerError> {
        if !self.rooms.contains_key(room_id) {
            return Err(BrokerError::RoomNotFound(room_id.as_str().to_string()));
        }
        self.remove_member_everywhere(&connection_id);
        let room = self
            .rooms
            .get_mut(room_id)
            .expect("room existence checked above");
        room.add_member(connection_id);
        Ok(RoomJoin {
            history: room.history_snapshot(),
            members: room.members_snapshot(),
        })
    }

    /// Remove a connection from every room's membership (disconnect path).
    pub fn remove_member_everywhere(&mut self, connection_id: &ConnectionId) {
        for room in self.rooms.values_mut() {
            room.remove_member(connection_id);
        }
    }

    /// Append a message to a room's bounded history. Callers are expected
    /// to pre-validate the room; unknown ids still fail with `RoomNotFound`.
    pub fn append(&mut self, room_id: &RoomId, message: ChatMessage) -> Result<(), BrokerError> {
        let room = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| BrokerError::RoomNotFound(room_id.as_str().to_string()))?;
        room.append_history(message);
        Ok(())
    }

    /// Current membership of a room, or empty if the room is unknown.
    pub fn members_of(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        self.rooms
            .get(room_id)
            .map(|room| room.members_snapshot())
            .unwrap_or_default()
    }

    pub fn contains(&self, room_id: &RoomId) -> bool {
        self.rooms.contains_key(room_id)
    }

    pub fn get(&self, room_id: &RoomId) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    /// Per-room summaries for the room-list broadcast, sorted by id for
    /// stable output.
    pub fn summaries(&self) -> Vec<RoomSummary> {
        let mut summaries: Vec<RoomSummary> = self
            .rooms
            .values()
            .map(|room| RoomSummary {
                id: room.id.clone(),
                name: room.name.clone(),
                member_count: room.member_count(),
                created_at: room.created_at,
            })
            .collect();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        summaries
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::{MessageBody, UserName};
    use crate::domain::entity::Destination;

    fn directory() -> RoomDirectory {
        RoomDirectory::new(Timestamp::new(1000))
    }

    fn room_name(name: &str) -> RoomName {
        RoomName::new(name.to_string()).unwrap()
    }

    fn room_message(room_id: &RoomId, body: &str) -> ChatMessage {
        ChatMessage::text(
            ConnectionId::generate(),
            UserName::new("alice".to_string()).unwrap(),
            Destination::Room(room_id.clone()),
            MessageBody::new(body.to_string()).unwrap(),
            Timestamp::new(2000),
        )
    }

    #[test]
    fn test_general_room_exists_from_the_start() {
        // テスト項目: ディレクトリ生成時に general ルームが存在する
        // given (前提条件):

        // when (操作):
        let directory = directory();

        // then (期待する結果):
        assert!(directory.contains(&RoomId::general()));
        assert_eq!(directory.room_count(), 1);
    }

    #[test]
    fn test_ensure_room_creates_once() {
        // テスト項目: 同じ名前（大文字小文字違い）での二度目の作成は no-op になる
        // given (前提条件):
        let mut directory = directory();

        // when (操作):
        let (id_first, created_first) =
            directory.ensure_room(&room_name("Game Night"), Timestamp::new(2000));
        let (id_second, created_second) =
            directory.ensure_room(&room_name("game night"), Timestamp::new(3000));

        // then (期待する結果):
        assert!(created_first);
        assert!(!created_second);
        assert_eq!(id_first, id_second);
        assert_eq!(id_first.as_str(), "game-night");
        assert_eq!(directory.room_count(), 2);
        // 最初の作成時の表示名が保持される
        let room = directory.get(&id_first).unwrap();
        assert_eq!(room.name.as_str(), "Game Night");
    }

    #[test]
    fn test_join_room_moves_membership_atomically() {
        // テスト項目: ルーム切り替えで古いルームから削除され、新しいルームに追加される
        // given (前提条件):
        let mut directory = directory();
        let (game_night, _) =
            directory.ensure_room(&room_name("Game Night"), Timestamp::new(2000));
        let conn = ConnectionId::generate();
        directory.join_room(conn.clone(), &RoomId::general()).unwrap();

        // when (操作):
        let join = directory.join_room(conn.clone(), &game_night).unwrap();

        // then (期待する結果): どの時点でも所属ルームは 1 つだけ
        assert!(!directory.members_of(&RoomId::general()).contains(&conn));
        assert!(directory.members_of(&game_night).contains(&conn));
        assert_eq!(join.members, vec![conn]);
    }

    #[test]
    fn test_join_unknown_room_fails_without_side_effects() {
        // テスト項目: 存在しないルームへの join は RoomNotFound になり membership が変わらない
        // given (前提条件):
        let mut directory = directory();
        let conn = ConnectionId::generate();
        directory.join_room(conn.clone(), &RoomId::general()).unwrap();
        let unknown = RoomId::new("no-such-room".to_string()).unwrap();

        // when (操作):
        let result = directory.join_room(conn.clone(), &unknown);

        // then (期待する結果):
        assert!(matches!(result, Err(BrokerError::RoomNotFound(_))));
        assert!(directory.members_of(&RoomId::general()).contains(&conn));
    }

    #[test]
    fn test_join_room_returns_history_snapshot_in_order() {
        // テスト項目: join 時に返される履歴スナップショットが追加順を保持する
        // given (前提条件):
        let mut directory = directory();
        let general = RoomId::general();
        directory.append(&general, room_message(&general, "first")).unwrap();
        directory.append(&general, room_message(&general, "second")).unwrap();

        // when (操作):
        let join = directory
            .join_room(ConnectionId::generate(), &general)
            .unwrap();

        // then (期待する結果):
        let bodies: Vec<&str> = join
            .history
            .iter()
            .map(|m| m.body.as_ref().unwrap().as_str())
            .collect();
        assert_eq!(bodies, vec!["first", "second"]);
    }

    #[test]
    fn test_append_to_unknown_room_fails() {
        // テスト項目: 存在しないルームへの append は RoomNotFound になる
        // given (前提条件):
        let mut directory = directory();
        let unknown = RoomId::new("no-such-room".to_string()).unwrap();
        let message = room_message(&unknown, "lost");

        // when (操作):
        let result = directory.append(&unknown, message);

        // then (期待する結果):
        assert!(matches!(result, Err(BrokerError::RoomNotFound(_))));
    }

    #[test]
    fn test_members_of_unknown_room_is_empty() {
        // テスト項目: 存在しないルームの membership は空になる
        // given (前提条件):
        let directory = directory();
        let unknown = RoomId::new("no-such-room".to_string()).unwrap();

        // when (操作):
        let members = directory.members_of(&unknown);

        // then (期待する結果):
        assert!(members.is_empty());
    }
}
