//! 接続エンティティ
//!
//! 1 つの生きているトランスポートセッションに対応する `Connection` と、
//! 入場時に採番される `ConnectionId` を定義します。

use std::collections::HashSet;
use std::fmt;

use uuid::Uuid;

use super::values::{ChannelName, Role, UserId};

/// 接続 ID（入場時に採番される不透明な識別子）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// 新しい ConnectionId を採番
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 接続エンティティ
///
/// `user_id` と `role` は外部の認証ステップで確立され、接続の生存期間を
/// 通じて不変。`subscribed_channels` は自接続の subscribe / unsubscribe
/// 操作でのみ変更される。
#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnectionId,
    pub user_id: UserId,
    pub role: Role,
    pub subscribed_channels: HashSet<ChannelName>,
    /// 接続時刻（UTC ミリ秒）
    pub connected_at: i64,
    /// 最終受信時刻（UTC ミリ秒）。アイドル接続の将来の刈り取りに備えて
    /// 受信フレームごとに更新される。
    pub last_activity_at: i64,
}

impl Connection {
    /// 新しい Connection を作成
    pub fn new(id: ConnectionId, user_id: UserId, role: Role, connected_at: i64) -> Self {
        Self {
            id,
            user_id,
            role,
            subscribed_channels: HashSet::new(),
            connected_at,
            last_activity_at: connected_at,
        }
    }

    /// 最終受信時刻を更新
    pub fn touch(&mut self, now_millis: i64) {
        self.last_activity_at = now_millis;
    }

    /// チャンネル購読を追加（冪等）。新規追加なら true
    pub fn add_subscription(&mut self, channel: ChannelName) -> bool {
        self.subscribed_channels.insert(channel)
    }

    /// チャンネル購読を解除（冪等）。実際に削除されたら true
    pub fn remove_subscription(&mut self, channel: &ChannelName) -> bool {
        self.subscribed_channels.remove(channel)
    }

    /// 指定チャンネルを購読しているか
    pub fn is_subscribed(&self, channel: &ChannelName) -> bool {
        self.subscribed_channels.contains(channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_connection() -> Connection {
        Connection::new(
            ConnectionId::generate(),
            UserId::new("alice".to_string()).unwrap(),
            Role::new("student".to_string()).unwrap(),
            1000,
        )
    }

    #[test]
    fn test_new_connection_has_no_subscriptions() {
        // テスト項目: 新規接続は購読チャンネルを持たない
        // given (前提条件):

        // when (操作):
        let conn = test_connection();

        // then (期待する結果):
        assert!(conn.subscribed_channels.is_empty());
        assert_eq!(conn.connected_at, 1000);
        assert_eq!(conn.last_activity_at, 1000);
    }

    #[test]
    fn test_add_subscription_is_idempotent() {
        // テスト項目: 同じチャンネルの重複購読は 1 件として扱われる（冪等性）
        // given (前提条件):
        let mut conn = test_connection();
        let channel = ChannelName::new("general".to_string()).unwrap();

        // when (操作):
        let first = conn.add_subscription(channel.clone());
        let second = conn.add_subscription(channel.clone());

        // then (期待する結果):
        assert!(first);
        assert!(!second);
        assert_eq!(conn.subscribed_channels.len(), 1);
        assert!(conn.is_subscribed(&channel));
    }

    #[test]
    fn test_remove_subscription_of_unjoined_channel_is_noop() {
        // テスト項目: 購読していないチャンネルの解除は no-op
        // given (前提条件):
        let mut conn = test_connection();
        let channel = ChannelName::new("general".to_string()).unwrap();

        // when (操作):
        let removed = conn.remove_subscription(&channel);

        // then (期待する結果):
        assert!(!removed);
        assert!(conn.subscribed_channels.is_empty());
    }

    #[test]
    fn test_touch_updates_last_activity_only() {
        // テスト項目: touch は last_activity_at のみ更新する
        // given (前提条件):
        let mut conn = test_connection();

        // when (操作):
        conn.touch(5000);

        // then (期待する結果):
        assert_eq!(conn.last_activity_at, 5000);
        assert_eq!(conn.connected_at, 1000);
    }

    #[test]
    fn test_connection_ids_are_unique() {
        // テスト項目: ConnectionId は採番ごとに一意
        // given (前提条件):

        // when (操作):
        let id1 = ConnectionId::generate();
        let id2 = ConnectionId::generate();

        // then (期待する結果):
        assert_ne!(id1, id2);
    }
}
