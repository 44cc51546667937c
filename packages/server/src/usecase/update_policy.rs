//! UseCase: メッセージタイプロールの管理操作
//!
//! 外部の管理インターフェースから呼ばれる、メッセージタイプ → 必要ロール
//! マッピングの取得と差し替え。差し替えはテーブルまるごとのアトミック
//! スワップで、認可チェックを通過済みの処理中フレームには影響しない。
//! 操作は特権ロールに限定され、一般 API 用のクォータ（`Api` source）で
//! レート制限される。

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::{
    AccessPolicy, RateLimitDecision, RateLimitQuota, RateLimitSource, RateLimiter, Role,
};

use super::error::PolicyUpdateError;

/// ポリシー管理のユースケース
pub struct UpdatePolicyUseCase {
    /// AccessPolicy（ロールベースの認可）
    policy: Arc<AccessPolicy>,
    /// RateLimiter（一般 API トラフィックのレート制限）
    rate_limiter: Arc<dyn RateLimiter>,
    /// 一般 API トラフィックに適用するクォータ
    api_quota: RateLimitQuota,
    /// 管理操作に必要なロール
    privileged_role: Role,
}

impl UpdatePolicyUseCase {
    /// 新しい UpdatePolicyUseCase を作成
    pub fn new(
        policy: Arc<AccessPolicy>,
        rate_limiter: Arc<dyn RateLimiter>,
        api_quota: RateLimitQuota,
        privileged_role: Role,
    ) -> Self {
        Self {
            policy,
            rate_limiter,
            api_quota,
            privileged_role,
        }
    }

    /// 現在のメッセージタイプ → 必要ロールのマッピングを取得
    pub fn get(
        &self,
        caller_id: &str,
        caller_role: &Role,
    ) -> Result<HashMap<String, String>, PolicyUpdateError> {
        self.authorize_caller(caller_role)?;
        self.check_rate(caller_id)?;

        Ok(self
            .policy
            .message_type_roles()
            .into_iter()
            .map(|(message_type, role)| (message_type, role.to_string()))
            .collect())
    }

    /// メッセージタイプ → 必要ロールのマッピングをまるごと差し替える
    pub fn replace(
        &self,
        caller_id: &str,
        caller_role: &Role,
        mapping: HashMap<String, String>,
    ) -> Result<(), PolicyUpdateError> {
        self.authorize_caller(caller_role)?;
        self.check_rate(caller_id)?;

        let mut converted = HashMap::with_capacity(mapping.len());
        for (message_type, raw_role) in mapping {
            let role = Role::new(raw_role.clone())
                .map_err(|_| PolicyUpdateError::InvalidRole(raw_role))?;
            converted.insert(message_type, role);
        }

        self.policy.replace_message_type_roles(converted);
        tracing::info!("Message type role mapping replaced by '{}'", caller_id);
        Ok(())
    }

    fn authorize_caller(&self, caller_role: &Role) -> Result<(), PolicyUpdateError> {
        if !AccessPolicy::authorize(caller_role, Some(&self.privileged_role)) {
            return Err(PolicyUpdateError::Forbidden(
                self.privileged_role.to_string(),
            ));
        }
        Ok(())
    }

    fn check_rate(&self, caller_id: &str) -> Result<(), PolicyUpdateError> {
        match self
            .rate_limiter
            .check_and_record(caller_id, RateLimitSource::Api, self.api_quota)
        {
            RateLimitDecision::Allowed => Ok(()),
            RateLimitDecision::Denied {
                retry_after_seconds,
            } => Err(PolicyUpdateError::RateLimited {
                retry_after_seconds,
            }),
        }
    }
}
