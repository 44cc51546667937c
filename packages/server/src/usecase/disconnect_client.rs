//! UseCase: クライアント切断処理
//!
//! トランスポートの切断検知を受けて、接続を全ての索引から取り除きます。
//! 切断処理はトランスポート側の事情で二重に走り得るため、全体が冪等です。

use std::sync::Arc;

use crate::domain::{ChannelIndex, Connection, ConnectionId, ConnectionRepository, MessagePusher};

/// クライアント切断のユースケース
pub struct DisconnectClientUseCase {
    /// Repository（接続テーブルの抽象化）
    repository: Arc<dyn ConnectionRepository>,
    /// ChannelIndex（チャンネル索引の抽象化）
    channel_index: Arc<dyn ChannelIndex>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl DisconnectClientUseCase {
    /// 新しい DisconnectClientUseCase を作成
    pub fn new(
        repository: Arc<dyn ConnectionRepository>,
        channel_index: Arc<dyn ChannelIndex>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            channel_index,
            message_pusher,
        }
    }

    /// クライアント切断を実行
    ///
    /// 接続を全てのチャンネルから外し、sender の登録を解除し、
    /// 接続テーブルから削除する。既に削除済みなら no-op。
    ///
    /// # Returns
    ///
    /// 削除された接続レコード（既に削除済みなら `None`）
    pub async fn execute(&self, connection_id: &ConnectionId) -> Option<Connection> {
        // 1. 全てのチャンネルから外す
        self.channel_index.drop_connection(connection_id).await;

        // 2. MessagePusher から登録解除
        self.message_pusher.unregister(connection_id).await;

        // 3. 接続テーブルから削除（冪等）
        let removed = self.repository.remove(connection_id).await;
        if removed.is_some() {
            tracing::info!("Connection '{}' disconnected and removed", connection_id);
        }
        removed
    }
}
