//! チャットの DTO
//!
//! チャット参加者から受信するメッセージと、全参加者へファンアウトする
//! メッセージのワイヤ形式を定義します。

use serde::{Deserialize, Serialize};

/// 参加者から受信するチャットメッセージ
///
/// `user` はハンドシェイク時の表示名が優先され、本文内の値は
/// 上書きされます。
#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessageIn {
    #[serde(default)]
    pub user: String,
    pub text: String,
}

/// 全参加者へファンアウトするチャットメッセージ
///
/// `ts` はサーバ側で刻印した Unix ミリ秒タイムスタンプです。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessageOut {
    pub user: String,
    pub text: String,
    pub ts: i64,
}
