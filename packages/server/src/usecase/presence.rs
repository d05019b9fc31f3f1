//! 在席情報のスナップショット構築
//!
//! membership や identity が変わるたびに、全接続へ送るユーザーリスト・
//! ルームリストのスナップショットを組み立てる。差分ではなく毎回の全量
//! スナップショットであり、想定する接続数（数十）では十分に軽い。

use crate::domain::{ConnectionRegistry, RoomDirectory, TypingCoalescer};
use crate::infrastructure::dto::websocket::{RoomSummaryDto, ServerEvent, UserDto};

/// 現在の全ユーザーのスナップショットを `user_list` イベントにする
pub fn user_list_event(registry: &ConnectionRegistry) -> ServerEvent {
    let users: Vec<UserDto> = registry.users_snapshot().iter().map(UserDto::from).collect();
    ServerEvent::UserList { users }
}

/// 現在の全ルームのスナップショットを `room_list` イベントにする
pub fn room_list_event(directory: &RoomDirectory) -> ServerEvent {
    let rooms: Vec<RoomSummaryDto> = directory
        .summaries()
        .iter()
        .map(RoomSummaryDto::from)
        .collect();
    ServerEvent::RoomList { rooms }
}

/// 現在 typing 中の表示名のスナップショットを `typing_users` イベントにする
pub fn typing_event(typing: &TypingCoalescer) -> ServerEvent {
    ServerEvent::TypingUsers {
        users: typing.names(),
    }
}
