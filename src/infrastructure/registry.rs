//! ConnectionRegistry 実装
//!
//! WebSocket 接続ごとの mpsc チャンネルをメモリ上で管理する
//! ConnectionRegistry trait の実装を提供します。

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::{
    ConnectionId, ConnectionInfo, ConnectionRegistry, MessagePushError, PlayerId, RegistryChannel,
    Role,
};

struct Entry {
    role: Role,
    player: Option<PlayerId>,
    channel: RegistryChannel,
}

/// mpsc チャンネルベースの ConnectionRegistry 実装
///
/// 各接続の pusher タスクへの UnboundedSender を保持します。送信は
/// チャンネルへの enqueue のみで完了するため、ロックは短時間しか
/// 保持されません。
pub struct ChannelConnectionRegistry {
    connections: Mutex<HashMap<ConnectionId, Entry>>,
}

impl ChannelConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ConnectionId, Entry>> {
        // ロック保持中に panic する操作は無いため、毒化は実質的に
        // 発生しない。万一の場合も接続表の整合性は保たれている。
        match self.connections.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for ChannelConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConnectionRegistry for ChannelConnectionRegistry {
    /// 接続を登録
    ///
    /// シングルスロットのロールでは既存の保持者を退去させて置き換え、
    /// 退去した接続 ID を返します。
    async fn register(
        &self,
        connection: ConnectionInfo,
        channel: RegistryChannel,
    ) -> Option<ConnectionId> {
        let mut connections = self.lock();

        let evicted = if connection.role.is_single_slot() {
            let previous = connections
                .iter()
                .find(|(_, entry)| entry.role == connection.role)
                .map(|(id, _)| *id);
            if let Some(id) = previous {
                connections.remove(&id);
                tracing::info!(
                    "Evicted previous {:?} connection: connection_id={}",
                    connection.role,
                    id
                );
            }
            previous
        } else {
            None
        };

        tracing::info!(
            "Registered connection: connection_id={}, role={:?}",
            connection.id,
            connection.role
        );
        connections.insert(
            connection.id,
            Entry {
                role: connection.role,
                player: connection.player,
                channel,
            },
        );

        evicted
    }

    /// 接続を登録解除（冪等）
    async fn unregister(&self, connection_id: &ConnectionId) {
        let mut connections = self.lock();
        if connections.remove(connection_id).is_some() {
            tracing::info!("Unregistered connection: connection_id={}", connection_id);
        }
    }

    /// 特定の接続へユニキャスト送信
    ///
    /// 送信に失敗した接続（pusher タスク終了済み）は退去させます。
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        content: &str,
    ) -> Result<(), MessagePushError> {
        let mut connections = self.lock();

        let entry = connections
            .get(connection_id)
            .ok_or_else(|| MessagePushError::ConnectionNotFound(connection_id.to_string()))?;

        if entry.channel.send(content.to_string()).is_err() {
            connections.remove(connection_id);
            tracing::warn!(
                "Push failed, evicting connection: connection_id={}",
                connection_id
            );
            return Err(MessagePushError::PushFailed(connection_id.to_string()));
        }

        Ok(())
    }

    /// 指定ロールの全接続へブロードキャスト送信
    ///
    /// 個々の接続への送信失敗は隔離し、失敗した接続を退去させた上で
    /// 残りへの配送を続けます。戻り値は配送に成功した接続数です。
    async fn broadcast_to(&self, role: Role, content: &str) -> usize {
        let mut connections = self.lock();

        let mut delivered = 0;
        let mut dead = Vec::new();
        for (id, entry) in connections.iter() {
            if entry.role != role {
                continue;
            }
            if entry.channel.send(content.to_string()).is_ok() {
                delivered += 1;
            } else {
                dead.push(*id);
            }
        }

        for id in dead {
            connections.remove(&id);
            tracing::warn!("Broadcast failed, evicting connection: connection_id={}", id);
        }

        delivered
    }

    /// プレイヤーに紐づく QuizPlayer 接続を検索
    async fn find_player_connection(&self, player_id: &PlayerId) -> Option<ConnectionId> {
        let connections = self.lock();
        connections
            .iter()
            .find(|(_, entry)| entry.player.as_ref() == Some(player_id))
            .map(|(id, _)| *id)
    }

    /// 指定ロールの接続数を取得
    async fn count_role(&self, role: Role) -> usize {
        let connections = self.lock();
        connections
            .values()
            .filter(|entry| entry.role == role)
            .count()
    }
}
