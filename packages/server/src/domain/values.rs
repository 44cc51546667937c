//! 値オブジェクト
//!
//! ゲートウェイが扱う識別子（ユーザー ID・ロール・チャンネル名）を
//! バリデーション付きのコンストラクタを持つ newtype として定義します。
//! 不正な値はドメイン層に入る前に `DomainError` として弾かれます。

use std::fmt;

use super::error::DomainError;

const MAX_USER_ID_LEN: usize = 64;
const MAX_ROLE_LEN: usize = 32;
const MAX_CHANNEL_NAME_LEN: usize = 128;

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// ユーザー ID（外部の認証ステップで確立されたもの）
///
/// 接続の生存期間を通じて不変。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    /// 新しい UserId を作成（バリデーション付き）
    pub fn new(value: String) -> Result<Self, DomainError> {
        if value.is_empty()
            || value.len() > MAX_USER_ID_LEN
            || !value.chars().all(is_identifier_char)
        {
            return Err(DomainError::InvalidUserId(value));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ロール（例: "student", "teacher", "admin"）
///
/// 認可は設定されたロールとの完全一致で判定される。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Role(String);

impl Role {
    /// 新しい Role を作成（バリデーション付き）
    ///
    /// 小文字の ASCII 英数字とアンダースコアのみ許可。
    pub fn new(value: String) -> Result<Self, DomainError> {
        if value.is_empty()
            || value.len() > MAX_ROLE_LEN
            || !value
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        {
            return Err(DomainError::InvalidRole(value));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Role {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// チャンネル名（ブロードキャストグループの識別子）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelName(String);

impl ChannelName {
    /// 新しい ChannelName を作成（バリデーション付き）
    pub fn new(value: String) -> Result<Self, DomainError> {
        if value.is_empty()
            || value.len() > MAX_CHANNEL_NAME_LEN
            || !value.chars().all(is_identifier_char)
        {
            return Err(DomainError::InvalidChannelName(value));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ChannelName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_accepts_valid_value() {
        // テスト項目: 有効なユーザー ID が受理される
        // given (前提条件):
        let value = "alice-01".to_string();

        // when (操作):
        let result = UserId::new(value);

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(result.unwrap().as_str(), "alice-01");
    }

    #[test]
    fn test_user_id_rejects_empty_value() {
        // テスト項目: 空のユーザー ID が拒否される
        // given (前提条件):
        let value = String::new();

        // when (操作):
        let result = UserId::new(value);

        // then (期待する結果):
        assert!(matches!(result, Err(DomainError::InvalidUserId(_))));
    }

    #[test]
    fn test_user_id_rejects_invalid_characters() {
        // テスト項目: 空白や記号を含むユーザー ID が拒否される
        // given (前提条件):
        let value = "alice smith!".to_string();

        // when (操作):
        let result = UserId::new(value);

        // then (期待する結果):
        assert!(matches!(result, Err(DomainError::InvalidUserId(_))));
    }

    #[test]
    fn test_role_accepts_lowercase_value() {
        // テスト項目: 小文字のロールが受理される
        // given (前提条件):
        let value = "teacher".to_string();

        // when (操作):
        let result = Role::new(value);

        // then (期待する結果):
        assert!(result.is_ok());
    }

    #[test]
    fn test_role_rejects_uppercase_value() {
        // テスト項目: 大文字を含むロールが拒否される
        // given (前提条件):
        let value = "Admin".to_string();

        // when (操作):
        let result = Role::new(value);

        // then (期待する結果):
        assert!(matches!(result, Err(DomainError::InvalidRole(_))));
    }

    #[test]
    fn test_channel_name_accepts_prefixed_value() {
        // テスト項目: プレフィックス付きチャンネル名が受理される
        // given (前提条件):
        let value = "admin_updates".to_string();

        // when (操作):
        let result = ChannelName::new(value);

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(result.unwrap().as_str(), "admin_updates");
    }

    #[test]
    fn test_channel_name_rejects_too_long_value() {
        // テスト項目: 長すぎるチャンネル名が拒否される
        // given (前提条件):
        let value = "a".repeat(129);

        // when (操作):
        let result = ChannelName::new(value);

        // then (期待する結果):
        assert!(matches!(result, Err(DomainError::InvalidChannelName(_))));
    }
}
