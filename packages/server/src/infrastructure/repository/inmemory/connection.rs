//! インメモリ接続レジストリ実装
//!
//! ドメイン層が定義する ConnectionRepository trait の具体的な実装。
//! HashMap をインメモリの接続テーブルとして使用します。
//!
//! ## 並行性
//!
//! 容量チェックと登録は同一の Mutex クリティカルセクション内で行う。
//! チェックと insert が分かれていると、並行する入場が互いの insert 前の
//! サイズを観測して上限を突破する。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use torii_shared::time::Clock;

use crate::domain::{
    ChannelName, Connection, ConnectionId, ConnectionRepository, GatewayStats, RepositoryError,
    Role, UserId,
};

/// インメモリ接続レジストリ
pub struct InMemoryConnectionRegistry {
    connections: Mutex<HashMap<ConnectionId, Connection>>,
    max_connections: usize,
    stats: Arc<GatewayStats>,
    clock: Arc<dyn Clock>,
}

impl InMemoryConnectionRegistry {
    /// 新しい InMemoryConnectionRegistry を作成
    pub fn new(max_connections: usize, stats: Arc<GatewayStats>, clock: Arc<dyn Clock>) -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
            max_connections,
            stats,
            clock,
        }
    }
}

#[async_trait]
impl ConnectionRepository for InMemoryConnectionRegistry {
    async fn admit(&self, user_id: UserId, role: Role) -> Result<Connection, RepositoryError> {
        // 容量チェックと登録を 1 つのクリティカルセクションで行う
        let mut connections = self.connections.lock().await;
        let active = connections.len();
        if active >= self.max_connections {
            self.stats.connection_rejected();
            tracing::warn!(
                "Connection capacity reached ({}/{}), rejecting user '{}'",
                active,
                self.max_connections,
                user_id.as_str()
            );
            return Err(RepositoryError::CapacityExceeded { active });
        }

        let connection = Connection::new(
            ConnectionId::generate(),
            user_id,
            role,
            self.clock.now_millis(),
        );
        connections.insert(connection.id, connection.clone());
        self.stats.connection_opened();

        Ok(connection)
    }

    async fn remove(&self, connection_id: &ConnectionId) -> Option<Connection> {
        let mut connections = self.connections.lock().await;
        let removed = connections.remove(connection_id);
        if removed.is_some() {
            self.stats.connection_closed();
        }
        removed
    }

    async fn get(&self, connection_id: &ConnectionId) -> Option<Connection> {
        let connections = self.connections.lock().await;
        connections.get(connection_id).cloned()
    }

    async fn find_by_user(&self, user_id: &UserId) -> Vec<ConnectionId> {
        let connections = self.connections.lock().await;
        connections
            .values()
            .filter(|conn| &conn.user_id == user_id)
            .map(|conn| conn.id)
            .collect()
    }

    async fn touch(&self, connection_id: &ConnectionId) {
        let mut connections = self.connections.lock().await;
        if let Some(conn) = connections.get_mut(connection_id) {
            conn.touch(self.clock.now_millis());
        }
    }

    async fn add_subscription(
        &self,
        connection_id: &ConnectionId,
        channel: &ChannelName,
    ) -> Result<(), RepositoryError> {
        let mut connections = self.connections.lock().await;
        let conn = connections
            .get_mut(connection_id)
            .ok_or(RepositoryError::ConnectionNotFound(*connection_id))?;
        conn.add_subscription(channel.clone());
        Ok(())
    }

    async fn remove_subscription(&self, connection_id: &ConnectionId, channel: &ChannelName) {
        let mut connections = self.connections.lock().await;
        if let Some(conn) = connections.get_mut(connection_id) {
            conn.remove_subscription(channel);
        }
    }

    async fn count(&self) -> usize {
        let connections = self.connections.lock().await;
        connections.len()
    }
}
