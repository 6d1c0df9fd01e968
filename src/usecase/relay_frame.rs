//! フレーム中継 usecase
//!
//! Broadcaster から受信したフレームを全 Viewer へ中継します。
//! フレーム本体はデコードせず、メタデータのカウント整合のみ正規化します。

use std::sync::Arc;

use crate::domain::{ConnectionRegistry, Role};
use crate::infrastructure::dto::frame::FrameEnvelope;
use crate::usecase::error::RelayError;

/// 配信終了通知のワイヤ形式
const STREAM_ENDED_MESSAGE: &str = r#"{"type":"stream_ended"}"#;

/// フレーム中継 usecase
pub struct RelayFrameUseCase {
    registry: Arc<dyn ConnectionRegistry>,
}

impl RelayFrameUseCase {
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// 受信フレームを検証・正規化して Viewer へ中継する
    ///
    /// 戻り値は配送に成功した Viewer 数です。Viewer がいない場合も
    /// フレームは単に捨てられるだけでエラーにはなりません。
    ///
    /// # Errors
    ///
    /// フレームが JSON として解釈できない場合は `RelayError::MalformedFrame`
    /// を返します。不正なフレームは中継せずに捨てます。
    pub async fn execute(&self, raw: &str) -> Result<usize, RelayError> {
        let envelope: FrameEnvelope = serde_json::from_str(raw)?;
        let envelope = FrameEnvelope {
            frame: envelope.frame,
            metadata: envelope.metadata.map(|m| m.normalized()),
        };
        let json = serde_json::to_string(&envelope)?;
        Ok(self.registry.broadcast_to(Role::Viewer, &json).await)
    }

    /// 配信終了を全 Viewer へ通知する
    ///
    /// Broadcaster の切断時に呼ばれます。
    pub async fn stream_ended(&self) {
        let notified = self
            .registry
            .broadcast_to(Role::Viewer, STREAM_ENDED_MESSAGE)
            .await;
        tracing::info!("Stream ended: notified {} viewers", notified);
    }
}
