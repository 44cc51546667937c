//! Server state shared across handlers.

use std::sync::Arc;

use crate::domain::GatewayStats;
use crate::usecase::{
    ConnectClientUseCase, DisconnectClientUseCase, RouteMessageUseCase, UpdatePolicyUseCase,
};

/// Shared application state
pub struct AppState {
    /// ConnectClientUseCase（クライアント接続のユースケース）
    pub connect_client_usecase: Arc<ConnectClientUseCase>,
    /// DisconnectClientUseCase（クライアント切断のユースケース）
    pub disconnect_client_usecase: Arc<DisconnectClientUseCase>,
    /// RouteMessageUseCase（メッセージルーティングのユースケース）
    pub route_message_usecase: Arc<RouteMessageUseCase>,
    /// UpdatePolicyUseCase（ポリシー管理のユースケース）
    pub update_policy_usecase: Arc<UpdatePolicyUseCase>,
    /// 統計カウンタ
    pub stats: Arc<GatewayStats>,
}
