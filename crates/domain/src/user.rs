//! # ユーザー
//!
//! 認証・プロフィール管理は外部サービスの責務。
//! このクレートが扱うのは、リクエストごとに解決済みの数値ユーザー ID と
//! 管理者判定に使うロールのみ。

use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};

define_i64_id! {
    /// ユーザー ID（`users.id`）
    pub struct UserId;
}

/// ユーザーロール
///
/// `users.role` カラムに対応する。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UserRole {
    /// 現場ワーカー
    User,
    /// コーディネーター
    Coordinator,
    /// スーパーバイザー
    Supervisor,
    /// 全権管理者
    Superadmin,
}

impl UserRole {
    /// プロモコード管理操作（取り込み・統計・受付ブランド設定）を許可するか
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Coordinator | Self::Supervisor | Self::Superadmin)
    }
}
