//! UseCase: クライアント接続処理
//!
//! 容量上限下での入場（admission）と、入場に成功した接続の sender 登録を
//! 行います。容量チェックと登録のアトミック性は Repository 実装が保証し、
//! この UseCase は入場の成否を型付きの結果として返すだけです。

use std::sync::Arc;

use crate::domain::{Connection, ConnectionRepository, MessagePusher, PusherChannel, Role, UserId};

use super::error::ConnectError;

/// クライアント接続のユースケース
pub struct ConnectClientUseCase {
    /// Repository（接続テーブルの抽象化）
    repository: Arc<dyn ConnectionRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl ConnectClientUseCase {
    /// 新しい ConnectClientUseCase を作成
    pub fn new(
        repository: Arc<dyn ConnectionRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// クライアント接続を実行
    ///
    /// # Arguments
    ///
    /// * `user_id` - 外部の認証ステップで確立されたユーザー ID
    /// * `role` - 外部の認証ステップで確立されたロール
    /// * `sender` - クライアントへのメッセージ送信用チャンネル
    ///
    /// # Returns
    ///
    /// * `Ok(Connection)` - 入場成功（採番済みの接続レコードを返す）
    /// * `Err(ConnectError)` - 容量超過（この試行に対して終端的）
    pub async fn execute(
        &self,
        user_id: UserId,
        role: Role,
        sender: PusherChannel,
    ) -> Result<Connection, ConnectError> {
        // 1. 入場（容量チェックと登録は Repository 内で分割不可能に行われる）
        let connection = self
            .repository
            .admit(user_id, role)
            .await
            .map_err(|_| ConnectError::CapacityExceeded)?;

        // 2. MessagePusher にクライアントを登録
        self.message_pusher.register(connection.id, sender).await;

        Ok(connection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GatewayStats, MockMessagePusher};
    use crate::infrastructure::repository::InMemoryConnectionRegistry;
    use torii_shared::time::FixedClock;

    fn create_test_repository(max_connections: usize) -> Arc<InMemoryConnectionRegistry> {
        Arc::new(InMemoryConnectionRegistry::new(
            max_connections,
            Arc::new(GatewayStats::new()),
            Arc::new(FixedClock::new(1_700_000_000_000)),
        ))
    }

    fn user(s: &str) -> UserId {
        UserId::new(s.to_string()).unwrap()
    }

    fn role(s: &str) -> Role {
        Role::new(s.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_connect_success_registers_sender() {
        // テスト項目: 入場成功時に sender が MessagePusher に登録される
        // given (前提条件):
        let repository = create_test_repository(10);
        let mut pusher = MockMessagePusher::new();
        pusher.expect_register().times(1).return_const(());
        let usecase = ConnectClientUseCase::new(repository.clone(), Arc::new(pusher));

        // when (操作):
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let result = usecase.execute(user("alice"), role("student"), tx).await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(repository.count().await, 1);
    }

    #[tokio::test]
    async fn test_connect_rejected_at_capacity() {
        // テスト項目: 容量いっぱいのとき入場が拒否され、sender は登録されない
        // given (前提条件):
        let repository = create_test_repository(1);
        let mut pusher = MockMessagePusher::new();
        // 1 件目の登録だけが起きる
        pusher.expect_register().times(1).return_const(());
        let usecase = ConnectClientUseCase::new(repository.clone(), Arc::new(pusher));

        let (tx1, _rx1) = tokio::sync::mpsc::unbounded_channel();
        usecase
            .execute(user("alice"), role("student"), tx1)
            .await
            .unwrap();

        // when (操作):
        let (tx2, _rx2) = tokio::sync::mpsc::unbounded_channel();
        let result = usecase.execute(user("bob"), role("student"), tx2).await;

        // then (期待する結果):
        assert_eq!(result, Err(ConnectError::CapacityExceeded));
        assert_eq!(repository.count().await, 1);
    }

    #[tokio::test]
    async fn test_connections_of_same_user_are_distinct() {
        // テスト項目: 同一ユーザーの複数接続はそれぞれ別の接続 ID を持つ
        // given (前提条件):
        let repository = create_test_repository(10);
        let mut pusher = MockMessagePusher::new();
        pusher.expect_register().times(2).return_const(());
        let usecase = ConnectClientUseCase::new(repository.clone(), Arc::new(pusher));

        // when (操作):
        let (tx1, _rx1) = tokio::sync::mpsc::unbounded_channel();
        let (tx2, _rx2) = tokio::sync::mpsc::unbounded_channel();
        let conn1 = usecase
            .execute(user("alice"), role("student"), tx1)
            .await
            .unwrap();
        let conn2 = usecase
            .execute(user("alice"), role("student"), tx2)
            .await
            .unwrap();

        // then (期待する結果):
        assert_ne!(conn1.id, conn2.id);
        assert_eq!(repository.count().await, 2);
    }
}
