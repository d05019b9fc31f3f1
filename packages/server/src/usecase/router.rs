//! UseCase: 受信イベントのルーティング
//!
//! ブローカーの中核。受信イベント種別ごとに、送信者の状態を検証し、
//! メタデータ（ID・タイムスタンプ）を付与し、履歴を更新してから配送先を
//! 確定し、トランスポート抽象（MessagePusher）へ送り出す。
//!
//! ## 並行性の規律
//!
//! registry / directory / typing の変更はすべて単一の `Mutex` 下で行う。
//! 異なる接続の 2 つのイベントが registry・directory の変更をインター
//! リーブしてはならない（例: ルーム切り替えと同じルームへのメッセージ
//! 追加）。配送先セットとフレーム内容はクリティカルセクション内で値
//! スナップショットとして確定する。フレーム送信はチャンネル書き込みで
//! あってソケット I/O ではないため、接続ごとの順序を守るためロックを
//! 保持したまま行う。実際のソケット書き込みは接続ごとの送信タスクが
//! ロックの外で行う。

use std::sync::Arc;

use tokio::sync::Mutex;

use idobata_shared::time::Clock;

use crate::domain::{
    Attachment, BrokerError, ChatMessage, ConnectionId, ConnectionRegistry, DEFAULT_HISTORY_CAPACITY,
    Destination, MessageBody, MessagePusher, PusherChannel, RoomDirectory, RoomId, RoomName,
    RoomSummary, Timestamp, TypingCoalescer, User, UserName, ValidationError,
};
use crate::infrastructure::dto::websocket::{ClientEvent, MessageDto, ServerEvent};
use crate::usecase::presence;

/// 添付ファイルのデフォルト上限（1 MiB）
pub const DEFAULT_MAX_ATTACHMENT_BYTES: usize = 1024 * 1024;

/// ブローカーの設定
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// ルームごとの履歴保持件数（超過分は FIFO で追い出し）
    pub history_capacity: usize,
    /// 添付ファイルの最大サイズ（バイト）
    pub max_attachment_bytes: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            max_attachment_bytes: DEFAULT_MAX_ATTACHMENT_BYTES,
        }
    }
}

/// ブローカーの共有状態
///
/// 単一の相互排他ドメイン。構成要素をまとめて 1 つのロックで守る。
struct BrokerState {
    registry: ConnectionRegistry,
    directory: RoomDirectory,
    typing: TypingCoalescer,
}

/// 1 フレームの配送先
enum Targets {
    /// 登録済みの全接続
    All,
    /// 指定した接続群（値スナップショット）
    Only(Vec<ConnectionId>),
    /// 特定の 1 接続
    One(ConnectionId),
}

/// 確定済みの配送（配送先セット + 送出イベント）
struct Delivery {
    targets: Targets,
    event: ServerEvent,
}

impl Delivery {
    fn all(event: ServerEvent) -> Self {
        Self {
            targets: Targets::All,
            event,
        }
    }

    fn only(targets: Vec<ConnectionId>, event: ServerEvent) -> Self {
        Self {
            targets: Targets::Only(targets),
            event,
        }
    }

    fn one(target: ConnectionId, event: ServerEvent) -> Self {
        Self {
            targets: Targets::One(target),
            event,
        }
    }
}

type DeliveryPlan = Vec<Delivery>;

/// プライベート配送のペア {sender, recipient}（自分宛てなら 1 接続）
fn private_pair(sender: &ConnectionId, recipient: &ConnectionId) -> Vec<ConnectionId> {
    if sender == recipient {
        vec![sender.clone()]
    } else {
        vec![recipient.clone(), sender.clone()]
    }
}

/// 受信イベントのルーター
///
/// プロセス起動時に 1 度構築し、各接続ハンドラへ `Arc` で渡す。テストでは
/// 独立したインスタンスを複数構築できる。
pub struct MessageRouter {
    state: Mutex<BrokerState>,
    pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
    config: BrokerConfig,
}

impl MessageRouter {
    pub fn new(pusher: Arc<dyn MessagePusher>, clock: Arc<dyn Clock>, config: BrokerConfig) -> Self {
        let created_at = Timestamp::new(clock.now_jst_millis());
        let state = BrokerState {
            registry: ConnectionRegistry::new(),
            directory: RoomDirectory::with_history_capacity(created_at, config.history_capacity),
            typing: TypingCoalescer::new(),
        };
        Self {
            state: Mutex::new(state),
            pusher,
            clock,
            config,
        }
    }

    /// 新しい接続を受け付ける。送信チャンネルを登録し、割り当てた接続 ID
    /// を最初のフレームとして返す。
    pub async fn connect(&self, connection_id: ConnectionId, sender: PusherChannel) {
        self.pusher
            .register_client(connection_id.clone(), sender)
            .await;
        tracing::info!("Connection '{}' accepted", connection_id);
        self.dispatch(vec![Delivery::one(
            connection_id.clone(),
            ServerEvent::Connected {
                id: connection_id.into_string(),
            },
        )])
        .await;
    }

    /// 接続を切断する。共有状態から即時・無条件に取り除く。冪等であり、
    /// 一度も join していない接続の切断は no-op（ブロードキャストなし）。
    pub async fn disconnect(&self, connection_id: &ConnectionId) {
        self.pusher.unregister_client(connection_id).await;
        let mut state = self.state.lock().await;
        let plan = self.drop_connection(&mut state, connection_id);
        self.dispatch(plan).await;
    }

    /// 受信イベントを処理する。エラーはすべて局所的・非致命的で、当該
    /// イベントを破棄してログに残すだけ。送信元へのエラー応答は返さない。
    pub async fn handle_event(&self, connection_id: &ConnectionId, event: ClientEvent) {
        let mut state = self.state.lock().await;
        let result = match event {
            ClientEvent::UserJoin { username } => {
                self.handle_user_join(&mut state, connection_id, username)
            }
            ClientEvent::CreateRoom { room_name } => {
                self.handle_create_room(&mut state, connection_id, room_name)
            }
            ClientEvent::JoinRoom { room_id } => {
                self.handle_join_room(&mut state, connection_id, room_id)
            }
            ClientEvent::SendMessage { message } => {
                self.handle_send_message(&mut state, connection_id, message)
            }
            ClientEvent::SendAttachment {
                filename,
                mime,
                data,
                room_id: _,
                to,
            } => self.handle_send_attachment(&mut state, connection_id, filename, mime, data, to),
            ClientEvent::PrivateMessage { to, message } => {
                self.handle_private_message(&mut state, connection_id, to, message)
            }
            ClientEvent::Typing { is_typing } => {
                self.handle_typing(&mut state, connection_id, is_typing)
            }
        };
        match result {
            Ok(plan) => self.dispatch(plan).await,
            Err(error) => {
                tracing::warn!("Dropping event from '{}': {}", connection_id, error);
            }
        }
    }

    /// 現在の全ユーザーの値スナップショット（HTTP API 用）
    pub async fn users(&self) -> Vec<User> {
        self.state.lock().await.registry.users_snapshot()
    }

    /// 現在の全ルームの値スナップショット（HTTP API 用）
    pub async fn rooms(&self) -> Vec<RoomSummary> {
        self.state.lock().await.directory.summaries()
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_jst_millis())
    }

    fn handle_user_join(
        &self,
        state: &mut BrokerState,
        connection_id: &ConnectionId,
        username: String,
    ) -> Result<DeliveryPlan, BrokerError> {
        let username = UserName::new(username)?;
        state.registry.join(connection_id.clone(), username.clone())?;
        let general = RoomId::general();
        state.directory.join_room(connection_id.clone(), &general)?;
        state.registry.set_current_room(connection_id, general);
        tracing::info!("{} joined the chat", username);
        Ok(vec![
            Delivery::all(presence::user_list_event(&state.registry)),
            Delivery::all(presence::room_list_event(&state.directory)),
            Delivery::all(ServerEvent::UserJoined {
                id: connection_id.as_str().to_string(),
                username: username.into_string(),
            }),
        ])
    }

    fn handle_create_room(
        &self,
        state: &mut BrokerState,
        connection_id: &ConnectionId,
        room_name: String,
    ) -> Result<DeliveryPlan, BrokerError> {
        let name = RoomName::new(room_name)?;
        let (room_id, created) = state.directory.ensure_room(&name, self.now());
        if !created {
            tracing::debug!("Room '{}' already exists, create is a no-op", room_id);
            return Ok(Vec::new());
        }
        tracing::info!("Room '{}' created by '{}'", room_id, connection_id);
        Ok(vec![Delivery::all(presence::room_list_event(
            &state.directory,
        ))])
    }

    fn handle_join_room(
        &self,
        state: &mut BrokerState,
        connection_id: &ConnectionId,
        room_id: String,
    ) -> Result<DeliveryPlan, BrokerError> {
        if !state.registry.contains(connection_id) {
            return Err(BrokerError::UnregisteredSender(connection_id.clone()));
        }
        let room_id = RoomId::new(room_id)?;
        // 切り替えは 1 つのアトミックな遷移: 旧ルームから抜け、新ルームに
        // 入り、履歴スナップショットを確定する
        let join = state.directory.join_room(connection_id.clone(), &room_id)?;
        state.registry.set_current_room(connection_id, room_id.clone());
        tracing::info!("'{}' switched to room '{}'", connection_id, room_id);
        let messages: Vec<MessageDto> = join.history.iter().map(MessageDto::from).collect();
        Ok(vec![
            // 履歴リプレイは、この後に追加されるどのメッセージよりも先に
            // 切り替えた接続へ届く
            Delivery::one(
                connection_id.clone(),
                ServerEvent::MessageHistory { messages },
            ),
            Delivery::all(presence::user_list_event(&state.registry)),
            Delivery::all(presence::room_list_event(&state.directory)),
        ])
    }

    fn handle_send_message(
        &self,
        state: &mut BrokerState,
        connection_id: &ConnectionId,
        message: String,
    ) -> Result<DeliveryPlan, BrokerError> {
        let Some(user) = state.registry.get(connection_id) else {
            return Err(BrokerError::UnregisteredSender(connection_id.clone()));
        };
        let Some(room_id) = user.current_room.clone() else {
            return Err(BrokerError::UnregisteredSender(connection_id.clone()));
        };
        let body = MessageBody::new(message)?;
        let message = ChatMessage::text(
            connection_id.clone(),
            user.username.clone(),
            Destination::Room(room_id.clone()),
            body,
            self.now(),
        );
        let dto = MessageDto::from(&message);
        // 履歴更新を配送より先に行う
        state.directory.append(&room_id, message)?;
        let members = state.directory.members_of(&room_id);
        Ok(vec![Delivery::only(
            members,
            ServerEvent::ReceiveMessage(dto),
        )])
    }

    fn handle_send_attachment(
        &self,
        state: &mut BrokerState,
        connection_id: &ConnectionId,
        filename: String,
        mime: String,
        data: Vec<u8>,
        to: Option<String>,
    ) -> Result<DeliveryPlan, BrokerError> {
        if data.len() > self.config.max_attachment_bytes {
            return Err(BrokerError::PayloadTooLarge {
                size: data.len(),
                limit: self.config.max_attachment_bytes,
            });
        }
        if filename.trim().is_empty() {
            return Err(ValidationError::EmptyFileName.into());
        }
        let attachment = Attachment {
            filename,
            mime,
            data,
        };
        match to {
            Some(to) => {
                let recipient = ConnectionId::new(to)?;
                let sender = state.registry.display_name_of(connection_id);
                let message = ChatMessage::attachment(
                    connection_id.clone(),
                    sender,
                    Destination::Direct(recipient.clone()),
                    attachment,
                    self.now(),
                );
                let dto = MessageDto::from(&message);
                Ok(vec![Delivery::only(
                    private_pair(connection_id, &recipient),
                    ServerEvent::ReceiveAttachment(dto),
                )])
            }
            None => {
                let Some(user) = state.registry.get(connection_id) else {
                    return Err(BrokerError::UnregisteredSender(connection_id.clone()));
                };
                let Some(room_id) = user.current_room.clone() else {
                    return Err(BrokerError::UnregisteredSender(connection_id.clone()));
                };
                let message = ChatMessage::attachment(
                    connection_id.clone(),
                    user.username.clone(),
                    Destination::Room(room_id.clone()),
                    attachment,
                    self.now(),
                );
                let dto = MessageDto::from(&message);
                state.directory.append(&room_id, message)?;
                let members = state.directory.members_of(&room_id);
                Ok(vec![Delivery::only(
                    members,
                    ServerEvent::ReceiveAttachment(dto),
                )])
            }
        }
    }

    fn handle_private_message(
        &self,
        state: &mut BrokerState,
        connection_id: &ConnectionId,
        to: String,
        message: String,
    ) -> Result<DeliveryPlan, BrokerError> {
        let recipient = ConnectionId::new(to)?;
        let body = MessageBody::new(message)?;
        // 切断レースで未登録になった送信者は "Anonymous" として扱う
        let sender = state.registry.display_name_of(connection_id);
        let message = ChatMessage::text(
            connection_id.clone(),
            sender,
            Destination::Direct(recipient.clone()),
            body,
            self.now(),
        );
        let dto = MessageDto::from(&message);
        // プライベートメッセージはどのルーム履歴にも残らない
        Ok(vec![Delivery::only(
            private_pair(connection_id, &recipient),
            ServerEvent::PrivateMessage(dto),
        )])
    }

    fn handle_typing(
        &self,
        state: &mut BrokerState,
        connection_id: &ConnectionId,
        is_typing: bool,
    ) -> Result<DeliveryPlan, BrokerError> {
        let Some(user) = state.registry.get(connection_id) else {
            // 未登録の接続からの typing は黙って無視する
            tracing::debug!("Ignoring typing from unregistered connection '{}'", connection_id);
            return Ok(Vec::new());
        };
        let username = user.username.clone();
        state
            .typing
            .set_typing(connection_id.clone(), username, is_typing);
        Ok(vec![Delivery::all(presence::typing_event(&state.typing))])
    }

    fn drop_connection(
        &self,
        state: &mut BrokerState,
        connection_id: &ConnectionId,
    ) -> DeliveryPlan {
        let Some(user) = state.registry.leave(connection_id) else {
            tracing::debug!(
                "Disconnect for unknown connection '{}', nothing to clean up",
                connection_id
            );
            return Vec::new();
        };
        state.directory.remove_member_everywhere(connection_id);
        state.typing.remove(connection_id);
        tracing::info!("{} left the chat", user.username);
        vec![
            Delivery::all(ServerEvent::UserLeft {
                id: connection_id.as_str().to_string(),
                username: user.username.into_string(),
            }),
            Delivery::all(presence::user_list_event(&state.registry)),
            Delivery::all(presence::room_list_event(&state.directory)),
            Delivery::all(presence::typing_event(&state.typing)),
        ]
    }

    async fn dispatch(&self, plan: DeliveryPlan) {
        for delivery in plan {
            let frame = match serde_json::to_string(&delivery.event) {
                Ok(frame) => frame,
                Err(error) => {
                    tracing::error!("Failed to serialize outbound frame: {}", error);
                    continue;
                }
            };
            let result = match delivery.targets {
                Targets::All => self.pusher.broadcast_all(&frame).await,
                Targets::Only(targets) => self.pusher.broadcast(targets, &frame).await,
                Targets::One(target) => self.pusher.push_to(&target, &frame).await,
            };
            if let Err(error) = result {
                tracing::warn!("Outbound delivery failed: {}", error);
            }
        }
    }
}
