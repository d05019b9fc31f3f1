//! Server state shared across request handlers.

use std::sync::Arc;

use crate::usecase::MessageRouter;

/// Shared application state
pub struct AppState {
    /// MessageRouter（受信イベントルーティングのユースケース）
    pub router: Arc<MessageRouter>,
}
