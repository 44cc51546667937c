//! メッセージ送信（通知）の trait 定義
//!
//! UseCase 層はこの trait に依存し、Infrastructure 層の具体的な実装
//! （WebSocket sender の管理）には依存しない。

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use super::connection::ConnectionId;

/// クライアントへメッセージを届けるチャンネルの型
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// メッセージ送信のエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MessagePushError {
    #[error("connection not found: {0}")]
    ConnectionNotFound(String),

    #[error("failed to push message: {0}")]
    PushFailed(String),
}

/// MessagePusher trait
///
/// 接続ごとの sender を管理し、単一接続への送信（push_to）と
/// 複数接続への送信（broadcast）を提供する。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// クライアントの sender を登録する
    async fn register(&self, connection_id: ConnectionId, sender: PusherChannel);

    /// クライアントの sender を登録解除する
    async fn unregister(&self, connection_id: &ConnectionId);

    /// 特定の接続にメッセージを送信する
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        content: &str,
    ) -> Result<(), MessagePushError>;

    /// 複数の接続にメッセージを送信する
    ///
    /// ターゲットの消失（切断レース）は通常の事象として許容し、
    /// 一部の送信失敗でもエラーにしない。
    async fn broadcast(&self, targets: Vec<ConnectionId>, content: &str);
}
