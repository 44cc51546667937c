//! Repository trait 定義
//!
//! ドメイン層が必要とする接続テーブル・チャンネル索引へのインターフェースを
//! 定義します。具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;
use thiserror::Error;

use super::connection::{Connection, ConnectionId};
use super::values::{ChannelName, Role, UserId};

/// 接続テーブル操作のエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    /// 入場時の容量超過。この接続試行に対して終端的で、既存接続の
    /// 追い出しは行わない。
    #[error("connection capacity reached ({active} active)")]
    CapacityExceeded { active: usize },

    #[error("connection not found: {0}")]
    ConnectionNotFound(ConnectionId),
}

/// 接続レジストリ
///
/// 生きている接続の集合を所有し、グローバルな容量上限を強制する。
///
/// ## 不変条件
///
/// `admit` の容量チェックと登録は分割不可能な 1 ステップであること。
/// 素朴な read-then-write は並行入場で上限を突破する実バグになる。
#[async_trait]
pub trait ConnectionRepository: Send + Sync {
    /// 接続を入場させる（容量チェックと登録をアトミックに行う）
    ///
    /// 拒否時は `connections_rejected` を加算して
    /// `RepositoryError::CapacityExceeded` を返す。リトライはしない。
    async fn admit(&self, user_id: UserId, role: Role) -> Result<Connection, RepositoryError>;

    /// 接続を削除する（冪等）。削除されたレコードを返す
    async fn remove(&self, connection_id: &ConnectionId) -> Option<Connection>;

    /// 接続を取得する
    async fn get(&self, connection_id: &ConnectionId) -> Option<Connection>;

    /// ユーザー ID に紐づく全ての接続 ID を取得する
    async fn find_by_user(&self, user_id: &UserId) -> Vec<ConnectionId>;

    /// 最終受信時刻を更新する
    async fn touch(&self, connection_id: &ConnectionId);

    /// 接続の購読チャンネル集合にチャンネルを追加する（冪等）
    async fn add_subscription(
        &self,
        connection_id: &ConnectionId,
        channel: &ChannelName,
    ) -> Result<(), RepositoryError>;

    /// 接続の購読チャンネル集合からチャンネルを外す（冪等）
    async fn remove_subscription(&self, connection_id: &ConnectionId, channel: &ChannelName);

    /// 現在の接続数を取得する
    async fn count(&self) -> usize;
}

/// チャンネル索引
///
/// チャンネル名 → 購読中の接続 ID 集合。subscribe / unsubscribe で
/// 変更され、ブロードキャストはスナップショットを読む。
///
/// ## 不変条件
///
/// ある接続 ID がチャンネルの集合に含まれるのは、その接続の
/// `subscribed_channels` が同じチャンネル名を含むとき、かつそのときに
/// 限る（両構造は同一操作でロックステップに保たれる）。
#[async_trait]
pub trait ChannelIndex: Send + Sync {
    /// 接続をチャンネルに登録する（冪等）
    async fn subscribe(&self, connection_id: ConnectionId, channel: ChannelName);

    /// 接続をチャンネルから外す（冪等）
    async fn unsubscribe(&self, connection_id: &ConnectionId, channel: &ChannelName);

    /// チャンネルの購読者のスナップショットを取得する
    ///
    /// ファンアウト中の並行した subscribe / unsubscribe が走査を
    /// 破壊しないよう、呼び出し時点のコピーを返す。
    async fn members_of(&self, channel: &ChannelName) -> Vec<ConnectionId>;

    /// 接続を全てのチャンネルから外す（切断時に Registry 側から呼ばれる）
    async fn drop_connection(&self, connection_id: &ConnectionId);
}
