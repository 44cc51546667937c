//! アクセスポリシー
//!
//! メッセージタイプ → 必要ロール、チャンネル名プレフィックス → 必要ロール
//! の 2 つの独立したテーブルを保持するドメインサービス。
//!
//! ## 設計ノート
//!
//! テーブルは実行時に管理インターフェースから差し替えられるため、
//! イミュータブルなスナップショット（`PolicyTables`）を `ArcSwap` の
//! 背後に置き、`replace_*` はポインタごと交換します。読み手は
//! 「全部古い」か「全部新しい」テーブルのどちらかだけを観測し、
//! 半分だけ更新された状態は存在しません。

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;

use super::values::Role;

/// ポリシーテーブルのイミュータブルなスナップショット
#[derive(Debug, Clone, Default)]
pub struct PolicyTables {
    /// メッセージタイプ → 必要ロール
    message_type_roles: HashMap<String, Role>,
    /// チャンネル名プレフィックス → 必要ロール（プレフィックス長の降順）
    channel_prefix_roles: Vec<(String, Role)>,
}

impl PolicyTables {
    /// 新しい PolicyTables を作成
    ///
    /// プレフィックスは最長一致解決のために長さの降順でソートされる。
    pub fn new(
        message_type_roles: HashMap<String, Role>,
        channel_prefix_roles: HashMap<String, Role>,
    ) -> Self {
        Self {
            message_type_roles,
            channel_prefix_roles: sort_prefixes(channel_prefix_roles),
        }
    }

    fn required_role_for_message_type(&self, message_type: &str) -> Option<&Role> {
        self.message_type_roles.get(message_type)
    }

    /// 最長一致するプレフィックスのロールを返す
    fn required_role_for_channel(&self, channel_name: &str) -> Option<&Role> {
        self.channel_prefix_roles
            .iter()
            .find(|(prefix, _)| channel_name.starts_with(prefix.as_str()))
            .map(|(_, role)| role)
    }
}

fn sort_prefixes(prefixes: HashMap<String, Role>) -> Vec<(String, Role)> {
    let mut sorted: Vec<(String, Role)> = prefixes.into_iter().collect();
    // 最長一致を線形走査で実現するため、長い（より限定的な）プレフィックスを先に置く
    sorted.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    sorted
}

/// ロールベースのアクセスポリシー
///
/// 認可の失敗は例外ではなく値として返り、MessageRouter が構造化エラーに
/// 変換する（接続は閉じない）。
pub struct AccessPolicy {
    tables: ArcSwap<PolicyTables>,
}

impl AccessPolicy {
    /// 新しい AccessPolicy を作成
    pub fn new(tables: PolicyTables) -> Self {
        Self {
            tables: ArcSwap::from_pointee(tables),
        }
    }

    /// メッセージタイプに必要なロールを取得（未設定なら None）
    pub fn required_role_for_message_type(&self, message_type: &str) -> Option<Role> {
        self.tables
            .load()
            .required_role_for_message_type(message_type)
            .cloned()
    }

    /// チャンネル名に必要なロールを最長一致プレフィックスで解決
    ///
    /// どのプレフィックスにも一致しないチャンネルはロール不要。
    pub fn required_role_for_channel(&self, channel_name: &str) -> Option<Role> {
        self.tables
            .load()
            .required_role_for_channel(channel_name)
            .cloned()
    }

    /// ロールが要求を満たすか判定（要求されたロールとの完全一致）
    pub fn authorize(role: &Role, required: Option<&Role>) -> bool {
        match required {
            None => true,
            Some(required) => role == required,
        }
    }

    /// メッセージタイプテーブルをまるごと差し替える（アトミックスワップ）
    pub fn replace_message_type_roles(&self, message_type_roles: HashMap<String, Role>) {
        self.tables.rcu(|current| {
            let mut next = (**current).clone();
            next.message_type_roles = message_type_roles.clone();
            Arc::new(next)
        });
    }

    /// チャンネルプレフィックステーブルをまるごと差し替える（アトミックスワップ）
    pub fn replace_channel_prefix_roles(&self, channel_prefix_roles: HashMap<String, Role>) {
        let sorted = sort_prefixes(channel_prefix_roles);
        self.tables.rcu(|current| {
            let mut next = (**current).clone();
            next.channel_prefix_roles = sorted.clone();
            Arc::new(next)
        });
    }

    /// 現在のメッセージタイプテーブルのスナップショットを取得
    pub fn message_type_roles(&self) -> HashMap<String, Role> {
        self.tables.load().message_type_roles.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role(s: &str) -> Role {
        Role::new(s.to_string()).unwrap()
    }

    fn test_policy() -> AccessPolicy {
        let mut message_types = HashMap::new();
        message_types.insert("broadcast".to_string(), role("teacher"));

        let mut prefixes = HashMap::new();
        prefixes.insert("admin_".to_string(), role("admin"));
        prefixes.insert("teacher_".to_string(), role("teacher"));

        AccessPolicy::new(PolicyTables::new(message_types, prefixes))
    }

    #[test]
    fn test_required_role_for_message_type() {
        // テスト項目: 設定済みメッセージタイプの必要ロールが返される
        // given (前提条件):
        let policy = test_policy();

        // when (操作):
        let required = policy.required_role_for_message_type("broadcast");

        // then (期待する結果):
        assert_eq!(required, Some(role("teacher")));
    }

    #[test]
    fn test_unconfigured_message_type_requires_no_role() {
        // テスト項目: 未設定のメッセージタイプはロール不要
        // given (前提条件):
        let policy = test_policy();

        // when (操作):
        let required = policy.required_role_for_message_type("ping");

        // then (期待する結果):
        assert_eq!(required, None);
    }

    #[test]
    fn test_channel_prefix_match() {
        // テスト項目: プレフィックスに一致するチャンネルの必要ロールが返される
        // given (前提条件):
        let policy = test_policy();

        // when (操作):
        let required = policy.required_role_for_channel("admin_updates");

        // then (期待する結果):
        assert_eq!(required, Some(role("admin")));
    }

    #[test]
    fn test_unmatched_channel_requires_no_role() {
        // テスト項目: どのプレフィックスにも一致しないチャンネルはロール不要
        // given (前提条件):
        let policy = test_policy();

        // when (操作):
        let required = policy.required_role_for_channel("general");

        // then (期待する結果):
        assert_eq!(required, None);
    }

    #[test]
    fn test_longest_prefix_wins() {
        // テスト項目: 複数プレフィックスに一致する場合は最長一致が優先される
        // given (前提条件):
        let mut prefixes = HashMap::new();
        prefixes.insert("admin_".to_string(), role("admin"));
        prefixes.insert("admin_internal_".to_string(), role("superadmin"));
        let policy = AccessPolicy::new(PolicyTables::new(HashMap::new(), prefixes));

        // when (操作):
        let required = policy.required_role_for_channel("admin_internal_audit");

        // then (期待する結果):
        assert_eq!(required, Some(role("superadmin")));

        // 短い方のプレフィックスにしか一致しないチャンネルは短い方で解決される
        assert_eq!(
            policy.required_role_for_channel("admin_updates"),
            Some(role("admin"))
        );
    }

    #[test]
    fn test_authorize_exact_match() {
        // テスト項目: 認可は要求ロールとの完全一致（階層なし）
        // given (前提条件):
        let teacher = role("teacher");
        let admin = role("admin");

        // when (操作) / then (期待する結果):
        assert!(AccessPolicy::authorize(&teacher, Some(&teacher)));
        // admin であっても teacher 要求は満たさない（完全一致）
        assert!(!AccessPolicy::authorize(&admin, Some(&teacher)));
        // 要求なしなら常に許可
        assert!(AccessPolicy::authorize(&teacher, None));
    }

    #[test]
    fn test_replace_message_type_roles_is_visible_to_subsequent_lookups() {
        // テスト項目: メッセージタイプテーブルの差し替えが後続の参照に反映される
        // given (前提条件):
        let policy = test_policy();
        assert_eq!(
            policy.required_role_for_message_type("broadcast"),
            Some(role("teacher"))
        );

        // when (操作):
        let mut replacement = HashMap::new();
        replacement.insert("broadcast".to_string(), role("admin"));
        replacement.insert("user_message".to_string(), role("teacher"));
        policy.replace_message_type_roles(replacement);

        // then (期待する結果):
        assert_eq!(
            policy.required_role_for_message_type("broadcast"),
            Some(role("admin"))
        );
        assert_eq!(
            policy.required_role_for_message_type("user_message"),
            Some(role("teacher"))
        );
    }

    #[test]
    fn test_replace_channel_prefix_roles_is_visible_to_subsequent_lookups() {
        // テスト項目: プレフィックステーブルの差し替えが後続の参照に反映される
        // given (前提条件):
        let policy = test_policy();
        assert_eq!(
            policy.required_role_for_channel("admin_updates"),
            Some(role("admin"))
        );

        // when (操作): admin_ プレフィックスのないテーブルに差し替える
        let mut replacement = HashMap::new();
        replacement.insert("staff_".to_string(), role("teacher"));
        policy.replace_channel_prefix_roles(replacement);

        // then (期待する結果): 旧プレフィックスは消え、新プレフィックスだけが効く
        assert_eq!(policy.required_role_for_channel("admin_updates"), None);
        assert_eq!(
            policy.required_role_for_channel("staff_room"),
            Some(role("teacher"))
        );
        // メッセージタイプテーブルには影響しない
        assert_eq!(
            policy.required_role_for_message_type("broadcast"),
            Some(role("teacher"))
        );
    }

    #[test]
    fn test_replace_message_type_roles_keeps_channel_prefixes() {
        // テスト項目: メッセージタイプテーブルの差し替えはプレフィックステーブルに影響しない
        // given (前提条件):
        let policy = test_policy();

        // when (操作):
        policy.replace_message_type_roles(HashMap::new());

        // then (期待する結果):
        assert_eq!(
            policy.required_role_for_channel("admin_updates"),
            Some(role("admin"))
        );
    }
}
