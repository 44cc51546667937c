//! ドメイン層のエラー定義

use thiserror::Error;

/// 値オブジェクトのバリデーションエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid user id: '{0}'")]
    InvalidUserId(String),

    #[error("invalid role: '{0}'")]
    InvalidRole(String),

    #[error("invalid channel name: '{0}'")]
    InvalidChannelName(String),
}
