//! ConnectionRegistry trait 定義
//!
//! ドメイン層が必要とする接続管理のインターフェースを定義します。
//! 具体的な実装（WebSocket チャンネル管理）は Infrastructure 層が提供します
//! （依存性の逆転）。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{
    error::MessagePushError,
    value_object::{ConnectionId, PlayerId, Role},
};

/// 接続へメッセージを送るためのチャンネル
///
/// シリアライズ済みの JSON テキストを受け取り、接続の pusher タスクが
/// WebSocket へ書き出します。
pub type RegistryChannel = mpsc::UnboundedSender<String>;

/// 登録時に渡す接続情報
///
/// 接続はハンドシェイク時にちょうど 1 つのロールに束縛されます。
/// QuizPlayer のみプレイヤー ID を持ちます。
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    /// 接続 ID
    pub id: ConnectionId,
    /// 接続のロール
    pub role: Role,
    /// QuizPlayer 接続に紐づくプレイヤー ID
    pub player: Option<PlayerId>,
}

impl ConnectionInfo {
    /// プレイヤー ID を持たない接続情報を作成
    pub fn new(id: ConnectionId, role: Role) -> Self {
        Self {
            id,
            role,
            player: None,
        }
    }

    /// プレイヤー ID 付きの接続情報を作成（QuizPlayer 用）
    pub fn for_player(id: ConnectionId, player: PlayerId) -> Self {
        Self {
            id,
            role: Role::QuizPlayer,
            player: Some(player),
        }
    }
}

/// Connection Registry trait
///
/// 生きている接続をロール別に管理し、ユニキャスト／ブロードキャスト送信の
/// プリミティブを提供します。ビジネス状態は一切持ちません。
///
/// ## 送信失敗の扱い
///
/// 個々の接続への送信失敗は隔離されます。失敗した接続はログの上レジストリ
/// から退去させ、他の接続への配送は継続します。呼び出し元に失敗が伝播して
/// クイズの解決処理を中断することはありません。
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// 接続を登録
    ///
    /// シングルスロットのロール（Broadcaster / QuizHost）では既存の接続を
    /// 退去させて置き換え、退去した接続 ID を返します（evict-and-replace）。
    async fn register(
        &self,
        connection: ConnectionInfo,
        channel: RegistryChannel,
    ) -> Option<ConnectionId>;

    /// 接続を登録解除（冪等）
    async fn unregister(&self, connection_id: &ConnectionId);

    /// 特定の接続へユニキャスト送信
    ///
    /// 送信失敗時はその接続を退去させた上でエラーを返します。
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        content: &str,
    ) -> Result<(), MessagePushError>;

    /// 指定ロールの全接続へブロードキャスト送信
    ///
    /// 配送に成功した接続数を返します。失敗した接続は退去させ、残りへの
    /// 配送を続行します。
    async fn broadcast_to(&self, role: Role, content: &str) -> usize;

    /// プレイヤーに紐づく QuizPlayer 接続を検索
    ///
    /// single-active-session-per-player ポリシーの実現に使用します。
    async fn find_player_connection(&self, player_id: &PlayerId) -> Option<ConnectionId>;

    /// 指定ロールの接続数を取得
    async fn count_role(&self, role: Role) -> usize;
}
