//! スライディングウィンドウ方式レートリミッタ実装
//!
//! (identifier, source) ごとに直近ウィンドウ内のリクエスト時刻列を保持し、
//! 判定のたびにウィンドウ外の記録を purge してから残数を数えます。
//!
//! ## 並行性
//!
//! 状態は `DashMap` に保持する。エントリ単位のロックにより、同一
//! identifier への並行リクエストは check-and-record の周りで直列化され
//! （2 つの並行リクエストが同時に「残り 1 枠」を観測することはない）、
//! 異なる identifier 同士は競合しない。
//!
//! ## モード
//!
//! バイパスは `production` 以外のモードでのみ設定可能。`production`
//! モードでは設定によらず必ず判定が走る。

use std::collections::VecDeque;
use std::sync::Arc;

use dashmap::DashMap;

use torii_shared::time::Clock;

use crate::domain::{LimiterMode, RateLimitDecision, RateLimitQuota, RateLimitSource, RateLimiter};

type WindowKey = (String, RateLimitSource);

/// スライディングウィンドウ方式レートリミッタ
pub struct SlidingWindowRateLimiter {
    windows: DashMap<WindowKey, VecDeque<i64>>,
    mode: LimiterMode,
    bypass: bool,
    clock: Arc<dyn Clock>,
}

impl SlidingWindowRateLimiter {
    /// 新しい SlidingWindowRateLimiter を作成
    pub fn new(mode: LimiterMode, bypass: bool, clock: Arc<dyn Clock>) -> Self {
        Self {
            windows: DashMap::new(),
            mode,
            bypass,
            clock,
        }
    }

    /// 現在追跡中の (identifier, source) の数（テスト・デバッグ用）
    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }
}

impl RateLimiter for SlidingWindowRateLimiter {
    fn check_and_record(
        &self,
        identifier: &str,
        source: RateLimitSource,
        quota: RateLimitQuota,
    ) -> RateLimitDecision {
        if self.should_bypass() {
            return RateLimitDecision::Allowed;
        }

        let now = self.clock.now_millis();
        let window_millis = (quota.window_seconds as i64) * 1000;

        // entry() がエントリ単位の排他参照を返すため、同一 identifier の
        // check-and-record はここで直列化される
        let mut window = self
            .windows
            .entry((identifier.to_string(), source))
            .or_default();

        // ウィンドウ外に出た記録を先頭から purge する
        while let Some(&oldest) = window.front() {
            if oldest + window_millis <= now {
                window.pop_front();
            } else {
                break;
            }
        }

        if window.len() < quota.max_requests as usize {
            window.push_back(now);
            return RateLimitDecision::Allowed;
        }

        // 最古の記録がウィンドウから抜けるまでの残り時間（秒、切り上げ）
        let retry_after_millis = match window.front() {
            Some(&oldest) => (oldest + window_millis - now).max(0),
            None => 0,
        };
        let retry_after_seconds = (retry_after_millis as u64).div_ceil(1000);
        tracing::debug!(
            "Rate limit exceeded for '{}' (source: {}), retry after {}s",
            identifier,
            source.as_str(),
            retry_after_seconds
        );
        RateLimitDecision::Denied {
            retry_after_seconds,
        }
    }

    fn should_bypass(&self) -> bool {
        self.bypass && self.mode != LimiterMode::Production
    }

    fn clear_all(&self) {
        self.windows.clear();
        tracing::debug!("Cleared all rate limit state");
    }
}
