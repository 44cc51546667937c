//! ゲートウェイ全体の統計カウンタ
//!
//! 容量制御と可観測性のための単調カウンタ。永続化はしない。

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use serde::Serialize;

/// ゲートウェイ全体の統計カウンタ
///
/// Registry（接続の開閉・拒否）と MessageRouter（ルーティング済み件数）が
/// 共有する。`active_connections` は接続テーブルと同じクリティカル
/// セクション内で増減されるため、テーブルの実サイズと一致する。
#[derive(Debug, Default)]
pub struct GatewayStats {
    active_connections: AtomicUsize,
    connections_rejected: AtomicU64,
    messages_routed: AtomicU64,
}

impl GatewayStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.active_connections.fetch_add(1, Ordering::SeqCst);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn connection_rejected(&self) {
        self.connections_rejected.fetch_add(1, Ordering::SeqCst);
    }

    pub fn message_routed(&self) {
        self.messages_routed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::SeqCst)
    }

    pub fn connections_rejected(&self) -> u64 {
        self.connections_rejected.load(Ordering::SeqCst)
    }

    pub fn messages_routed(&self) -> u64 {
        self.messages_routed.load(Ordering::SeqCst)
    }

    /// 現在値のスナップショットを取得
    pub fn snapshot(&self) -> GatewayStatsSnapshot {
        GatewayStatsSnapshot {
            active_connections: self.active_connections(),
            connections_rejected: self.connections_rejected(),
            messages_routed: self.messages_routed(),
        }
    }
}

/// 統計カウンタのスナップショット
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatewayStatsSnapshot {
    pub active_connections: usize,
    pub connections_rejected: u64,
    pub messages_routed: u64,
}
