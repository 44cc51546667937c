//! WebSocket メッセージ DTO
//!
//! トランスポート非依存の構造化ペイロード。インバウンドは 1 種類の
//! エンベロープ、アウトバウンドはタイプごとの構造体で表現します。

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// インバウンドメッセージのエンベロープ
///
/// ```json
/// { "type": "subscribe", "channels": ["general"], "target_user": null, "data": null }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct InboundEnvelope {
    pub r#type: String,
    #[serde(default)]
    pub channels: Option<Vec<String>>,
    #[serde(default)]
    pub target_user: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

/// アウトバウンドメッセージのタイプ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboundType {
    Connected,
    Pong,
    Subscribed,
    Unsubscribed,
    Broadcast,
    UserMessage,
    Error,
}

/// 接続確立通知（入場直後にこの接続へ送られる）
#[derive(Debug, Serialize, Deserialize)]
pub struct ConnectedMessage {
    pub r#type: OutboundType,
    pub connection_id: String,
    pub user_id: String,
    pub role: String,
}

/// ハートビート応答
#[derive(Debug, Serialize, Deserialize)]
pub struct PongMessage {
    pub r#type: OutboundType,
    pub timestamp: i64,
}

/// 購読完了通知（認可を通過したチャンネルのみを列挙する）
#[derive(Debug, Serialize, Deserialize)]
pub struct SubscribedMessage {
    pub r#type: OutboundType,
    pub channels: Vec<String>,
}

/// 購読解除通知
#[derive(Debug, Serialize, Deserialize)]
pub struct UnsubscribedMessage {
    pub r#type: OutboundType,
    pub channels: Vec<String>,
}

/// チャンネルブロードキャストの配送フレーム
#[derive(Debug, Serialize, Deserialize)]
pub struct BroadcastMessage {
    pub r#type: OutboundType,
    pub channel: String,
    pub from_user: String,
    pub data: Value,
}

/// ダイレクトメッセージの配送フレーム
#[derive(Debug, Serialize, Deserialize)]
pub struct UserMessageDelivery {
    pub r#type: OutboundType,
    pub from_user: String,
    pub data: Value,
}

/// 構造化エラー応答
///
/// ```json
/// { "type": "error", "error": "Rate limit exceeded, retry after 20s" }
/// ```
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub r#type: OutboundType,
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inbound_envelope_with_all_fields() {
        // テスト項目: 全フィールドを持つエンベロープがデコードできる
        // given (前提条件):
        let json = r#"{
            "type": "broadcast",
            "channels": ["general"],
            "target_user": "bob",
            "data": {"text": "hello"}
        }"#;

        // when (操作):
        let envelope: InboundEnvelope = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        assert_eq!(envelope.r#type, "broadcast");
        assert_eq!(envelope.channels, Some(vec!["general".to_string()]));
        assert_eq!(envelope.target_user, Some("bob".to_string()));
        assert!(envelope.data.is_some());
    }

    #[test]
    fn test_inbound_envelope_optional_fields_default_to_none() {
        // テスト項目: 省略可能フィールドは None になる
        // given (前提条件):
        let json = r#"{"type": "ping"}"#;

        // when (操作):
        let envelope: InboundEnvelope = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        assert_eq!(envelope.r#type, "ping");
        assert_eq!(envelope.channels, None);
        assert_eq!(envelope.target_user, None);
        assert_eq!(envelope.data, None);
    }

    #[test]
    fn test_inbound_envelope_without_type_is_rejected() {
        // テスト項目: type を欠くエンベロープはデコードエラーになる
        // given (前提条件):
        let json = r#"{"channels": ["general"]}"#;

        // when (操作):
        let result = serde_json::from_str::<InboundEnvelope>(json);

        // then (期待する結果):
        assert!(result.is_err());
    }

    #[test]
    fn test_error_message_wire_format() {
        // テスト項目: エラー応答のワイヤ形式が仕様どおりになる
        // given (前提条件):
        let message = ErrorMessage {
            r#type: OutboundType::Error,
            error: "Rate limit exceeded, retry after 20s".to_string(),
        };

        // when (操作):
        let json = serde_json::to_string(&message).unwrap();

        // then (期待する結果):
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "error");
        assert_eq!(value["error"], "Rate limit exceeded, retry after 20s");
    }

    #[test]
    fn test_outbound_type_serializes_as_snake_case() {
        // テスト項目: アウトバウンドタイプが snake_case で直列化される
        // given (前提条件):
        let message = UserMessageDelivery {
            r#type: OutboundType::UserMessage,
            from_user: "alice".to_string(),
            data: serde_json::json!({"text": "hi"}),
        };

        // when (操作):
        let value = serde_json::to_value(&message).unwrap();

        // then (期待する結果):
        assert_eq!(value["type"], "user_message");
    }
}
