//! UseCase 層
//!
//! アプリケーションの操作単位ごとに 1 つの UseCase を定義します。
//! 各 UseCase はドメイン層の trait（`Arc<dyn _>`）にのみ依存し、
//! Infrastructure 層の具体的な実装には依存しません。

mod connect_client;
mod disconnect_client;
mod error;
mod route_message;
mod update_policy;

pub use connect_client::ConnectClientUseCase;
pub use disconnect_client::DisconnectClientUseCase;
pub use error::{ConnectError, PolicyUpdateError, RouteError};
pub use route_message::{RouteMessageUseCase, RouteOutcome};
pub use update_policy::UpdatePolicyUseCase;
