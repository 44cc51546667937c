//! UseCase: メッセージルーティング処理
//!
//! 受信フレーム 1 件ごとの判定シーケンス
//! `decode → authorize(type) → rate-limit → dispatch` を実装します。
//! 途中のどのステップで失敗しても残りのステップを打ち切り、送信元に
//! 構造化エラー応答を返すだけで、接続は閉じません。トランスポート層に
//! エラーが伝播することはなく、全ての結果は「1 つ以上の接続への書き込み」
//! か「送信元への構造化エラー応答」のどちらかです。
//!
//! ## ハンドラ
//!
//! - `ping`: ロールによらず常に許可（レート制限の対象）。`pong` を返す。
//! - `subscribe`: チャンネルごとにプレフィックス認可。許可されたものだけ
//!   追加し、拒否されたものはチャンネル単位のエラーで個別に報告する
//!   （混在リクエストは部分的に成功する）。
//! - `unsubscribe`: 認可不要。未参加チャンネルからの離脱は no-op。
//! - `broadcast`: メッセージタイプの認可後、メンバーのスナップショットへ
//!   ファンアウト（送信元は除く）。消えたターゲットは黙ってスキップ。
//! - `user_message`: ターゲットユーザーの全接続へ配送。未知のターゲットは
//!   エラーではなく黙って破棄（切断レースは通常の事象）。

use std::sync::Arc;

use serde_json::Value;

use torii_shared::time::Clock;

use crate::domain::{
    AccessPolicy, ChannelIndex, ChannelName, Connection, ConnectionId, ConnectionRepository,
    GatewayStats, MessagePusher, RateLimitDecision, RateLimitQuota, RateLimitSource, RateLimiter,
    UserId,
};
use crate::infrastructure::dto::websocket::{
    BroadcastMessage, ErrorMessage, InboundEnvelope, OutboundType, PongMessage, SubscribedMessage,
    UnsubscribedMessage, UserMessageDelivery,
};

use super::error::RouteError;

/// ルーティングの結果（ロギング・テスト用の観測値）
#[derive(Debug, PartialEq, Eq)]
pub enum RouteOutcome {
    Ping,
    Subscribed {
        accepted: Vec<ChannelName>,
        denied: usize,
    },
    Unsubscribed {
        channels: Vec<ChannelName>,
    },
    Broadcast {
        delivered: usize,
    },
    DirectMessage {
        delivered: usize,
    },
    Rejected(RouteError),
}

/// メッセージルーティングのユースケース
pub struct RouteMessageUseCase {
    /// Repository（接続テーブルの抽象化）
    repository: Arc<dyn ConnectionRepository>,
    /// ChannelIndex（チャンネル索引の抽象化）
    channel_index: Arc<dyn ChannelIndex>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    /// AccessPolicy（ロールベースの認可）
    policy: Arc<AccessPolicy>,
    /// RateLimiter（スライディングウィンドウのレート制限）
    rate_limiter: Arc<dyn RateLimiter>,
    /// 統計カウンタ
    stats: Arc<GatewayStats>,
    clock: Arc<dyn Clock>,
    /// ゲートウェイトラフィックに適用するクォータ
    gateway_quota: RateLimitQuota,
}

impl RouteMessageUseCase {
    /// 新しい RouteMessageUseCase を作成
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repository: Arc<dyn ConnectionRepository>,
        channel_index: Arc<dyn ChannelIndex>,
        message_pusher: Arc<dyn MessagePusher>,
        policy: Arc<AccessPolicy>,
        rate_limiter: Arc<dyn RateLimiter>,
        stats: Arc<GatewayStats>,
        clock: Arc<dyn Clock>,
        gateway_quota: RateLimitQuota,
    ) -> Self {
        Self {
            repository,
            channel_index,
            message_pusher,
            policy,
            rate_limiter,
            stats,
            clock,
            gateway_quota,
        }
    }

    /// 受信フレーム 1 件を処理する
    ///
    /// # Arguments
    ///
    /// * `connection_id` - フレームの送信元接続
    /// * `raw` - 受信したテキストフレーム（JSON）
    pub async fn execute(&self, connection_id: &ConnectionId, raw: &str) -> RouteOutcome {
        let Some(connection) = self.repository.get(connection_id).await else {
            // 切断レース: 接続は既に消えている。返信先もないので観測値だけ返す
            return RouteOutcome::Rejected(RouteError::UnknownConnection);
        };
        self.repository.touch(connection_id).await;

        // decode
        let envelope = match serde_json::from_str::<InboundEnvelope>(raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                return self
                    .reject(connection_id, RouteError::MalformedMessage(e.to_string()))
                    .await;
            }
        };

        // authorize(type): ping はハートビートなのでロールによらず常に許可
        // （レート制限の対象にはなる）
        if envelope.r#type != "ping" {
            if let Some(required) = self.policy.required_role_for_message_type(&envelope.r#type) {
                if !AccessPolicy::authorize(&connection.role, Some(&required)) {
                    return self
                        .reject(
                            connection_id,
                            RouteError::AuthorizationDenied {
                                message_type: envelope.r#type.clone(),
                                required_role: required.to_string(),
                            },
                        )
                        .await;
                }
            }
        }

        // rate-limit（identifier はユーザー ID、source は Gateway）
        if let RateLimitDecision::Denied {
            retry_after_seconds,
        } = self.rate_limiter.check_and_record(
            connection.user_id.as_str(),
            RateLimitSource::Gateway,
            self.gateway_quota,
        ) {
            return self
                .reject(
                    connection_id,
                    RouteError::RateLimited {
                        retry_after_seconds,
                    },
                )
                .await;
        }

        // dispatch
        let outcome = match envelope.r#type.as_str() {
            "ping" => self.handle_ping(connection_id).await,
            "subscribe" => self.handle_subscribe(&connection, envelope.channels).await,
            "unsubscribe" => self.handle_unsubscribe(&connection, envelope.channels).await,
            "broadcast" => {
                self.handle_broadcast(&connection, envelope.channels, envelope.data)
                    .await
            }
            "user_message" => {
                self.handle_user_message(&connection, envelope.target_user, envelope.data)
                    .await
            }
            unknown => {
                self.reject(
                    connection_id,
                    RouteError::UnknownMessageType(unknown.to_string()),
                )
                .await
            }
        };

        if !matches!(outcome, RouteOutcome::Rejected(_)) {
            self.stats.message_routed();
        }
        outcome
    }

    async fn handle_ping(&self, connection_id: &ConnectionId) -> RouteOutcome {
        let pong = PongMessage {
            r#type: OutboundType::Pong,
            timestamp: self.clock.now_millis(),
        };
        self.push_frame(connection_id, &serde_json::to_string(&pong).unwrap())
            .await;
        RouteOutcome::Ping
    }

    async fn handle_subscribe(
        &self,
        connection: &Connection,
        channels: Option<Vec<String>>,
    ) -> RouteOutcome {
        let Some(channels) = channels.filter(|c| !c.is_empty()) else {
            return self
                .reject(
                    &connection.id,
                    RouteError::MalformedMessage("subscribe requires at least one channel".into()),
                )
                .await;
        };

        let mut accepted: Vec<ChannelName> = Vec::new();
        let mut denied = 0;
        for raw_name in channels {
            let channel = match ChannelName::new(raw_name) {
                Ok(channel) => channel,
                Err(e) => {
                    denied += 1;
                    self.reply_error(&connection.id, &RouteError::MalformedMessage(e.to_string()))
                        .await;
                    continue;
                }
            };

            // authorize(channel): 最長一致プレフィックスで必要ロールを解決し、
            // 拒否はチャンネル単位で個別に報告する
            if let Some(required) = self.policy.required_role_for_channel(channel.as_str()) {
                if !AccessPolicy::authorize(&connection.role, Some(&required)) {
                    denied += 1;
                    self.reply_error(
                        &connection.id,
                        &RouteError::ChannelDenied {
                            channel: channel.to_string(),
                            required_role: required.to_string(),
                        },
                    )
                    .await;
                    continue;
                }
            }

            // 接続レコードとチャンネル索引を同一操作でロックステップに保つ
            if self
                .repository
                .add_subscription(&connection.id, &channel)
                .await
                .is_ok()
            {
                self.channel_index
                    .subscribe(connection.id, channel.clone())
                    .await;
                accepted.push(channel);
            }
        }

        if !accepted.is_empty() {
            let reply = SubscribedMessage {
                r#type: OutboundType::Subscribed,
                channels: accepted.iter().map(|c| c.to_string()).collect(),
            };
            self.push_frame(&connection.id, &serde_json::to_string(&reply).unwrap())
                .await;
        }

        RouteOutcome::Subscribed { accepted, denied }
    }

    async fn handle_unsubscribe(
        &self,
        connection: &Connection,
        channels: Option<Vec<String>>,
    ) -> RouteOutcome {
        let Some(channels) = channels.filter(|c| !c.is_empty()) else {
            return self
                .reject(
                    &connection.id,
                    RouteError::MalformedMessage(
                        "unsubscribe requires at least one channel".into(),
                    ),
                )
                .await;
        };

        // 認可は不要（参加中のチャンネルからはいつでも離脱できる）
        let mut left: Vec<ChannelName> = Vec::new();
        for raw_name in channels {
            let Ok(channel) = ChannelName::new(raw_name) else {
                // 不正な名前のチャンネルには参加し得ないので黙ってスキップ
                continue;
            };
            self.repository
                .remove_subscription(&connection.id, &channel)
                .await;
            self.channel_index
                .unsubscribe(&connection.id, &channel)
                .await;
            left.push(channel);
        }

        let reply = UnsubscribedMessage {
            r#type: OutboundType::Unsubscribed,
            channels: left.iter().map(|c| c.to_string()).collect(),
        };
        self.push_frame(&connection.id, &serde_json::to_string(&reply).unwrap())
            .await;

        RouteOutcome::Unsubscribed { channels: left }
    }

    async fn handle_broadcast(
        &self,
        connection: &Connection,
        channels: Option<Vec<String>>,
        data: Option<Value>,
    ) -> RouteOutcome {
        let Some(channels) = channels.filter(|c| !c.is_empty()) else {
            return self
                .reject(
                    &connection.id,
                    RouteError::MalformedMessage("broadcast requires at least one channel".into()),
                )
                .await;
        };
        let data = data.unwrap_or(Value::Null);

        let mut delivered = 0;
        for raw_name in channels {
            let Ok(channel) = ChannelName::new(raw_name) else {
                // 不正な名前のチャンネルにはメンバーがいない
                continue;
            };

            // スナップショットに対してファンアウトする（走査中の購読変更に
            // 影響されない）。送信元自身は配送対象から除く。
            let targets: Vec<ConnectionId> = self
                .channel_index
                .members_of(&channel)
                .await
                .into_iter()
                .filter(|id| id != &connection.id)
                .collect();

            let frame = BroadcastMessage {
                r#type: OutboundType::Broadcast,
                channel: channel.to_string(),
                from_user: connection.user_id.to_string(),
                data: data.clone(),
            };
            let json = serde_json::to_string(&frame).unwrap();
            delivered += targets.len();
            self.message_pusher.broadcast(targets, &json).await;
        }

        RouteOutcome::Broadcast { delivered }
    }

    async fn handle_user_message(
        &self,
        connection: &Connection,
        target_user: Option<String>,
        data: Option<Value>,
    ) -> RouteOutcome {
        let Some(target_raw) = target_user else {
            return self
                .reject(
                    &connection.id,
                    RouteError::MalformedMessage("user_message requires target_user".into()),
                )
                .await;
        };
        let Ok(target) = UserId::new(target_raw) else {
            return self
                .reject(
                    &connection.id,
                    RouteError::MalformedMessage("invalid target_user".into()),
                )
                .await;
        };

        // ターゲットの不在（切断レース）はエラーではなく黙って破棄する
        let targets: Vec<ConnectionId> = self
            .repository
            .find_by_user(&target)
            .await
            .into_iter()
            .filter(|id| id != &connection.id)
            .collect();

        let frame = UserMessageDelivery {
            r#type: OutboundType::UserMessage,
            from_user: connection.user_id.to_string(),
            data: data.unwrap_or(Value::Null),
        };
        let json = serde_json::to_string(&frame).unwrap();
        let delivered = targets.len();
        self.message_pusher.broadcast(targets, &json).await;

        RouteOutcome::DirectMessage { delivered }
    }

    /// エラー応答を送信元に返し、観測値を組み立てる
    async fn reject(&self, connection_id: &ConnectionId, error: RouteError) -> RouteOutcome {
        self.reply_error(connection_id, &error).await;
        RouteOutcome::Rejected(error)
    }

    async fn reply_error(&self, connection_id: &ConnectionId, error: &RouteError) {
        tracing::debug!("Rejecting frame from '{}': {}", connection_id, error);
        let reply = ErrorMessage {
            r#type: OutboundType::Error,
            error: error.to_string(),
        };
        self.push_frame(connection_id, &serde_json::to_string(&reply).unwrap())
            .await;
    }

    async fn push_frame(&self, connection_id: &ConnectionId, json: &str) {
        // 送信元が直前に切断していても通常の事象として扱う
        if let Err(e) = self.message_pusher.push_to(connection_id, json).await {
            tracing::debug!("Failed to push frame to '{}': {}", connection_id, e);
        }
    }
}
