//! Connection registry: which user is behind which live connection.

use std::collections::HashMap;

use super::entity::User;
use super::error::BrokerError;
use super::value_object::{ConnectionId, RoomId, UserName};

/// Maps each live connection to its assigned user. Created and destroyed
/// with the connection lifecycle; owned exclusively by the broker.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    users: HashMap<ConnectionId, User>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user for a connection.
    ///
    /// Fails with `DuplicateJoin` if the connection already has a user; the
    /// first registration stays intact.
    pub fn join(
        &mut self,
        connection_id: ConnectionId,
        username: UserName,
    ) -> Result<(), BrokerError> {
        if self.users.contains_key(&connection_id) {
            return Err(BrokerError::DuplicateJoin(connection_id));
        }
        self.users
            .insert(connection_id.clone(), User::new(connection_id, username));
        Ok(())
    }

    /// Remove the user for a connection. Idempotent: leaving a connection
    /// that is not present is a no-op and returns `None`, which covers late
    /// or duplicate disconnect signals.
    pub fn leave(&mut self, connection_id: &ConnectionId) -> Option<User> {
        self.users.remove(connection_id)
    }

    pub fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.users.contains_key(connection_id)
    }

    pub fn get(&self, connection_id: &ConnectionId) -> Option<&User> {
        self.users.get(connection_id)
    }

    /// Display name of a connection, or the `"Anonymous"` sentinel if it is
    /// not registered (defensive default for races between a disconnect and
    /// an in-flight event).
    pub fn display_name_of(&self, connection_id: &ConnectionId) -> UserName {
        self.users
            .get(connection_id)
            .map(|user| user.username.clone())
            .unwrap_or_else(UserName::anonymous)
    }

    pub fn current_room_of(&self, connection_id: &ConnectionId) -> Option<RoomId> {
        self.users
            .get(connection_id)
            .and_then(|user| user.current_room.clone())
    }

    /// Record which room the connection currently belongs to. Returns false
    /// if the connection is not registered.
    pub fn set_current_room(&mut self, connection_id: &ConnectionId, room_id: RoomId) -> bool {
        match self.users.get_mut(connection_id) {
            Some(user) => {
                user.current_room = Some(room_id);
                true
            }
            None => false,
        }
    }

    /// Full user list as a value snapshot, sorted by name then id so
    /// repeated broadcasts are stable.
    pub fn users_snapshot(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.values().cloned().collect();
        users.sort_by(|a, b| {
            a.username
                .cmp(&b.username)
                .then_with(|| a.id.cmp(&b.id))
        });
        users
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn username(name: &str) -> UserName {
        UserName::new(name.to_string()).unwrap()
    }

    #[test]
    fn test_join_registers_user() {
        // テスト項目: join で接続にユーザーが登録される
        // given (前提条件):
        let mut registry = ConnectionRegistry::new();
        let conn = ConnectionId::generate();

        // when (操作):
        let result = registry.join(conn.clone(), username("alice"));

        // then (期待する結果):
        assert!(result.is_ok());
        assert!(registry.contains(&conn));
        assert_eq!(registry.get(&conn).unwrap().username.as_str(), "alice");
        assert_eq!(registry.get(&conn).unwrap().current_room, None);
    }

    #[test]
    fn test_duplicate_join_is_rejected() {
        // テスト項目: 同じ接続での二重 join は DuplicateJoin になり、最初の登録が保持される
        // given (前提条件):
        let mut registry = ConnectionRegistry::new();
        let conn = ConnectionId::generate();
        registry.join(conn.clone(), username("alice")).unwrap();

        // when (操作):
        let result = registry.join(conn.clone(), username("impostor"));

        // then (期待する結果):
        assert_eq!(result, Err(BrokerError::DuplicateJoin(conn.clone())));
        assert_eq!(registry.get(&conn).unwrap().username.as_str(), "alice");
    }

    #[test]
    fn test_leave_is_idempotent() {
        // テスト項目: 未登録の接続の leave は no-op になる
        // given (前提条件):
        let mut registry = ConnectionRegistry::new();
        let conn = ConnectionId::generate();

        // when (操作):
        let first = registry.leave(&conn);

        // then (期待する結果):
        assert!(first.is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_display_name_of_unregistered_is_anonymous() {
        // テスト項目: 未登録の接続の表示名は "Anonymous" になる
        // given (前提条件):
        let registry = ConnectionRegistry::new();
        let conn = ConnectionId::generate();

        // when (操作):
        let name = registry.display_name_of(&conn);

        // then (期待する結果):
        assert_eq!(name.as_str(), "Anonymous");
    }

    #[test]
    fn test_users_snapshot_is_sorted_by_name() {
        // テスト項目: ユーザーリストのスナップショットが名前順でソートされる
        // given (前提条件):
        let mut registry = ConnectionRegistry::new();
        registry
            .join(ConnectionId::generate(), username("charlie"))
            .unwrap();
        registry
            .join(ConnectionId::generate(), username("alice"))
            .unwrap();
        registry
            .join(ConnectionId::generate(), username("bob"))
            .unwrap();

        // when (操作):
        let snapshot = registry.users_snapshot();

        // then (期待する結果):
        let names: Vec<&str> = snapshot.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob", "charlie"]);
    }

    #[test]
    fn test_set_current_room_for_unregistered_returns_false() {
        // テスト項目: 未登録の接続への current_room 設定は false を返す
        // given (前提条件):
        let mut registry = ConnectionRegistry::new();
        let conn = ConnectionId::generate();

        // when (操作):
        let updated = registry.set_current_room(&conn, RoomId::general());

        // then (期待する結果):
        assert!(!updated);
        assert_eq!(registry.current_room_of(&conn), None);
    }
}
