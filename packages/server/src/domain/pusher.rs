//! MessagePusher trait 定義
//!
//! ブローカーが必要とする送信側トランスポートのインターフェースを定義します。
//! 具体的な実装（WebSocket）は Infrastructure 層が提供します（依存性の逆転）。
//!
//! ## 依存性の逆転（DIP）
//!
//! - ドメイン層が必要とするインターフェースをドメイン層自身が定義
//! - Infrastructure 層がドメイン層のインターフェースに依存
//! - UseCase 層はこの trait に依存し、WebSocket の詳細には依存しない

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::error::MessagePushError;
use super::value_object::ConnectionId;

/// 接続ごとの送信チャンネル
///
/// 送信はチャンネルへの書き込みであり、実際のソケット I/O は接続ごとの
/// 送信タスクが行う。チャンネルは unbounded なので送信側はブロックしない。
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// MessagePusher trait
///
/// フレーム（シリアライズ済み JSON）を 1 接続・複数接続・全接続へ届ける。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 接続の送信チャンネルを登録
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel);

    /// 接続の送信チャンネルを登録解除
    async fn unregister_client(&self, connection_id: &ConnectionId);

    /// 特定の接続にフレームを送信
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        frame: &str,
    ) -> Result<(), MessagePushError>;

    /// 指定した接続群にフレームをブロードキャスト（一部の失敗は許容）
    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        frame: &str,
    ) -> Result<(), MessagePushError>;

    /// 登録済みの全接続にフレームをブロードキャスト
    async fn broadcast_all(&self, frame: &str) -> Result<(), MessagePushError>;
}
