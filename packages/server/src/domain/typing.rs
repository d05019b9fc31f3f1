//! Typing-state coalescing.
//!
//! High-frequency typing signals are collapsed into a single current-state
//! snapshot that is rebroadcast in full on every change. The set is
//! broker-wide (no per-room scoping) and has no history; debounce is the
//! client's responsibility.

use std::collections::HashMap;

use super::value_object::{ConnectionId, UserName};

/// Transient mapping of connection → display name for "currently typing".
#[derive(Debug, Default)]
pub struct TypingCoalescer {
    typing: HashMap<ConnectionId, UserName>,
}

impl TypingCoalescer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or remove the connection under its resolved display name.
    pub fn set_typing(&mut self, connection_id: ConnectionId, username: UserName, is_typing: bool) {
        if is_typing {
            self.typing.insert(connection_id, username);
        } else {
            self.typing.remove(&connection_id);
        }
    }

    /// Drop a connection's entry entirely (disconnect path). No-op if the
    /// connection was not typing.
    pub fn remove(&mut self, connection_id: &ConnectionId) {
        self.typing.remove(connection_id);
    }

    /// Current snapshot of typing display names, sorted for stable output.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .typing
            .values()
            .map(|name| name.as_str().to_string())
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.typing.len()
    }

    pub fn is_empty(&self) -> bool {
        self.typing.is_empty()
    }
}
