//! Usecase 層のエラー定義

use thiserror::Error;

use crate::domain::ValueObjectError;

/// チャット送信時のエラー
#[derive(Debug, Error)]
pub enum ChatError {
    /// 本文の検証エラー（空文字・長すぎる等）
    #[error("invalid chat message: {0}")]
    InvalidText(#[from] ValueObjectError),

    /// 受信メッセージが JSON として解釈できない
    #[error("malformed chat payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),
}

/// フレーム中継時のエラー
#[derive(Debug, Error)]
pub enum RelayError {
    /// 受信フレームが JSON として解釈できない
    #[error("malformed frame payload: {0}")]
    MalformedFrame(#[from] serde_json::Error),
}
