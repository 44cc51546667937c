//! HTTP API の DTO

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::GatewayStatsSnapshot;

/// `GET /api/stats` のレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponseDto {
    pub active_connections: usize,
    pub connections_rejected: u64,
    pub messages_routed: u64,
}

impl From<GatewayStatsSnapshot> for StatsResponseDto {
    fn from(snapshot: GatewayStatsSnapshot) -> Self {
        Self {
            active_connections: snapshot.active_connections,
            connections_rejected: snapshot.connections_rejected,
            messages_routed: snapshot.messages_routed,
        }
    }
}

/// `GET / PUT /api/policy/message-types` のボディ
///
/// メッセージタイプ → 必要ロールのマッピング。PUT はテーブルをまるごと
/// 置き換える（部分更新はしない）。
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageTypeRolesDto {
    pub message_type_roles: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_dto_from_snapshot() {
        // テスト項目: 統計スナップショットが DTO に変換される
        // given (前提条件):
        let snapshot = GatewayStatsSnapshot {
            active_connections: 3,
            connections_rejected: 1,
            messages_routed: 42,
        };

        // when (操作):
        let dto = StatsResponseDto::from(snapshot);

        // then (期待する結果):
        assert_eq!(dto.active_connections, 3);
        assert_eq!(dto.connections_rejected, 1);
        assert_eq!(dto.messages_routed, 42);
    }

    #[test]
    fn test_message_type_roles_dto_round_trip() {
        // テスト項目: ポリシー DTO の JSON 形式が安定している
        // given (前提条件):
        let json = r#"{"message_type_roles": {"broadcast": "teacher"}}"#;

        // when (操作):
        let dto: MessageTypeRolesDto = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        assert_eq!(
            dto.message_type_roles.get("broadcast"),
            Some(&"teacher".to_string())
        );
    }
}
