//! UseCase 層のエラー定義
//!
//! どのエラーも接続を閉じる理由にはならない。MessageRouter 系のエラーは
//! `Display` の文字列がそのまま構造化エラー応答（`{"type":"error",...}`）の
//! 本文になるため、文言は安定させること。

use thiserror::Error;

/// 参加者接続のエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConnectError {
    /// 容量超過。この接続試行に対して終端的（リトライ・追い出しなし）。
    #[error("connection capacity reached")]
    CapacityExceeded,
}

/// メッセージルーティングのエラー
///
/// いずれも非致死。構造化エラー応答として送信元に返され、接続は開いたまま。
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RouteError {
    /// メッセージタイプに必要なロールを満たしていない
    #[error("Forbidden: message type '{message_type}' requires role '{required_role}'")]
    AuthorizationDenied {
        message_type: String,
        required_role: String,
    },

    /// チャンネルに必要なロールを満たしていない（subscribe 時、チャンネル単位）
    #[error("Channel '{channel}' requires role '{required_role}'")]
    ChannelDenied {
        channel: String,
        required_role: String,
    },

    /// 現在のウィンドウでの操作数超過
    #[error("Rate limit exceeded, retry after {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 },

    /// デコード不能・必須フィールド欠落
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    #[error("Unknown message type: '{0}'")]
    UnknownMessageType(String),

    /// ルータに渡された時点で接続が既に消えていた（切断レース）
    #[error("unknown connection")]
    UnknownConnection,
}

/// ポリシー管理操作のエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyUpdateError {
    #[error("Forbidden: updating message type roles requires role '{0}'")]
    Forbidden(String),

    #[error("Rate limit exceeded, retry after {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 },

    #[error("invalid role '{0}' in mapping")]
    InvalidRole(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_strings_carry_required_vocabulary() {
        // テスト項目: エラー文字列が仕様の語彙（requires role / Forbidden /
        //             capacity / Rate limit）を含む
        // given (前提条件):
        let channel_denied = RouteError::ChannelDenied {
            channel: "admin_updates".to_string(),
            required_role: "admin".to_string(),
        };
        let forbidden = RouteError::AuthorizationDenied {
            message_type: "broadcast".to_string(),
            required_role: "teacher".to_string(),
        };
        let rate_limited = RouteError::RateLimited {
            retry_after_seconds: 20,
        };
        let capacity = ConnectError::CapacityExceeded;

        // when (操作) / then (期待する結果):
        assert!(channel_denied.to_string().contains("requires role"));
        assert!(forbidden.to_string().contains("Forbidden"));
        assert!(rate_limited.to_string().contains("Rate limit"));
        assert!(capacity.to_string().contains("capacity"));
    }
}
