//! インメモリチャンネル索引実装
//!
//! チャンネル名 → 購読中の接続 ID 集合のマップ。subscribe / unsubscribe /
//! drop_connection が書き手、ブロードキャストの members_of が読み手。
//! 読み手は呼び出し時点のスナップショットを受け取るため、ファンアウト中の
//! 変更が走査を破壊することはない。

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ChannelIndex, ChannelName, ConnectionId};

/// インメモリチャンネル索引
#[derive(Default)]
pub struct InMemoryChannelIndex {
    channels: Mutex<HashMap<ChannelName, HashSet<ConnectionId>>>,
}

impl InMemoryChannelIndex {
    /// 新しい InMemoryChannelIndex を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 現在メンバーのいるチャンネル数（テスト・デバッグ用）
    pub async fn channel_count(&self) -> usize {
        let channels = self.channels.lock().await;
        channels.len()
    }
}

#[async_trait]
impl ChannelIndex for InMemoryChannelIndex {
    async fn subscribe(&self, connection_id: ConnectionId, channel: ChannelName) {
        let mut channels = self.channels.lock().await;
        channels.entry(channel).or_default().insert(connection_id);
    }

    async fn unsubscribe(&self, connection_id: &ConnectionId, channel: &ChannelName) {
        let mut channels = self.channels.lock().await;
        if let Some(members) = channels.get_mut(channel) {
            members.remove(connection_id);
            if members.is_empty() {
                channels.remove(channel);
            }
        }
    }

    async fn members_of(&self, channel: &ChannelName) -> Vec<ConnectionId> {
        let channels = self.channels.lock().await;
        channels
            .get(channel)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    async fn drop_connection(&self, connection_id: &ConnectionId) {
        let mut channels = self.channels.lock().await;
        for members in channels.values_mut() {
            members.remove(connection_id);
        }
        channels.retain(|_, members| !members.is_empty());
    }
}
