//! チャット送信 usecase
//!
//! 参加者からのメッセージを検証し、サーバ側タイムスタンプを刻印して
//! 全チャット参加者（送信者本人を含む）へファンアウトします。

use std::sync::Arc;

use crate::common::time::get_unix_timestamp_ms;
use crate::domain::{ChatText, ConnectionRegistry, Role};
use crate::infrastructure::dto::chat::ChatMessageOut;
use crate::usecase::error::ChatError;

/// チャット送信 usecase
pub struct SendChatUseCase {
    registry: Arc<dyn ConnectionRegistry>,
}

impl SendChatUseCase {
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// メッセージを検証してファンアウトする
    ///
    /// `user` はハンドシェイク時に確定した表示名で、本文内の値より
    /// 優先されます。戻り値は配送に成功した参加者数です。
    ///
    /// # Errors
    ///
    /// 空白のみ・長すぎる本文は `ChatError::InvalidText` を返します。
    pub async fn execute(&self, user: &str, text: String) -> Result<usize, ChatError> {
        let text = ChatText::new(text)?;
        let message = ChatMessageOut {
            user: user.to_string(),
            text: text.as_str().to_string(),
            ts: get_unix_timestamp_ms(),
        };
        let json = serde_json::to_string(&message)?;
        let delivered = self
            .registry
            .broadcast_to(Role::ChatParticipant, &json)
            .await;
        tracing::debug!("Chat fan-out: user={}, delivered={}", user, delivered);
        Ok(delivered)
    }
}
