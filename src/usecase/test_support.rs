//! Usecase テスト用の手書きモック

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ConnectionId, ConnectionIdFactory, ConnectionInfo, ConnectionRegistry, MessagePushError,
    PlayerId, RegistryChannel, Role,
};

/// 送信内容を記録する ConnectionRegistry のモック
///
/// チャンネルは保持せず、ブロードキャストとユニキャストの履歴のみを
/// 記録します。
pub(crate) struct MockRegistry {
    broadcasts: Mutex<Vec<(Role, String)>>,
    pushes: Mutex<Vec<(ConnectionId, String)>>,
    players: Mutex<HashMap<PlayerId, ConnectionId>>,
}

impl MockRegistry {
    pub(crate) fn new() -> Self {
        Self {
            broadcasts: Mutex::new(Vec::new()),
            pushes: Mutex::new(Vec::new()),
            players: Mutex::new(HashMap::new()),
        }
    }

    /// プレイヤー接続を紐づけ、その接続 ID を返す
    pub(crate) async fn attach_player(&self, player_id: PlayerId) -> ConnectionId {
        let connection_id = ConnectionIdFactory::generate();
        self.players.lock().await.insert(player_id, connection_id);
        connection_id
    }

    /// 指定ロールへのブロードキャスト履歴
    pub(crate) async fn broadcasts_to(&self, role: Role) -> Vec<String> {
        self.broadcasts
            .lock()
            .await
            .iter()
            .filter(|(r, _)| *r == role)
            .map(|(_, content)| content.clone())
            .collect()
    }

    /// 指定接続へのユニキャスト履歴
    pub(crate) async fn pushes_to(&self, connection_id: &ConnectionId) -> Vec<String> {
        self.pushes
            .lock()
            .await
            .iter()
            .filter(|(id, _)| id == connection_id)
            .map(|(_, content)| content.clone())
            .collect()
    }
}

#[async_trait]
impl ConnectionRegistry for MockRegistry {
    async fn register(
        &self,
        connection: ConnectionInfo,
        _channel: RegistryChannel,
    ) -> Option<ConnectionId> {
        if let Some(player_id) = connection.player {
            self.players.lock().await.insert(player_id, connection.id);
        }
        None
    }

    async fn unregister(&self, connection_id: &ConnectionId) {
        self.players
            .lock()
            .await
            .retain(|_, id| id != connection_id);
    }

    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        content: &str,
    ) -> Result<(), MessagePushError> {
        self.pushes
            .lock()
            .await
            .push((*connection_id, content.to_string()));
        Ok(())
    }

    async fn broadcast_to(&self, role: Role, content: &str) -> usize {
        self.broadcasts
            .lock()
            .await
            .push((role, content.to_string()));
        1
    }

    async fn find_player_connection(&self, player_id: &PlayerId) -> Option<ConnectionId> {
        self.players.lock().await.get(player_id).copied()
    }

    async fn count_role(&self, _role: Role) -> usize {
        0
    }
}
