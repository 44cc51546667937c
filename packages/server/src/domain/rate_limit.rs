//! レート制限の trait と関連型の定義
//!
//! スライディングウィンドウ方式のリクエストカウンタを
//! (identifier, source) ごとに追跡するインターフェース。
//! 具体的な実装は Infrastructure 層が提供します。

use serde::Deserialize;

/// レート制限の対象トラフィック種別
///
/// ゲートウェイのトラフィックと一般 API のトラフィックでは閾値が異なり、
/// カウンタを共有してはならない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateLimitSource {
    Gateway,
    Api,
}

impl RateLimitSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gateway => "gateway",
            Self::Api => "api",
        }
    }
}

/// ウィンドウあたりの許容リクエスト数とウィンドウ幅
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RateLimitQuota {
    pub max_requests: u32,
    pub window_seconds: u64,
}

/// レート制限の判定結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    Denied {
        /// 最古の記録がウィンドウから抜けるまでの残り秒数
        retry_after_seconds: u64,
    },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// レートリミッタの動作モード（プロセス全体で 1 つ）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimiterMode {
    Production,
    Development,
    Testing,
}

/// RateLimiter trait
///
/// 同一 identifier への並行リクエストは check-and-record の周りで
/// 直列化され、異なる identifier 同士は競合しない。
pub trait RateLimiter: Send + Sync {
    /// ウィンドウ内の記録を purge した上で判定し、許可なら記録する
    fn check_and_record(
        &self,
        identifier: &str,
        source: RateLimitSource,
        quota: RateLimitQuota,
    ) -> RateLimitDecision;

    /// バイパスが有効か
    ///
    /// `production` モードでは設定によらず常に false。
    fn should_bypass(&self) -> bool;

    /// 全ての identifier の状態を破棄する（テストセットアップ・再デプロイ用）
    fn clear_all(&self);
}
