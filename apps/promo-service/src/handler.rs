//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - 各ハンドラはサブモジュールに配置し、ここで re-export する
//! - ハンドラは入力の変換のみ行い、ビジネスロジックはユースケースに委譲
//! - ユーザー ID は上流（BFF・認証ゲートウェイ）が解決済みのものを
//!   `user_id` クエリパラメータで受け取る

pub mod admin;
pub mod health;
pub mod promo;

pub use admin::{AdminState, clear_active_brand, get_active_brand, set_active_brand};
pub use health::health_check;
pub use promo::{PromoState, claim_promo, get_promo_stats, list_my_claims, upload_promo_codes};
use promopool_domain::user::UserId;
use serde::Deserialize;

use crate::error::ServiceError;

/// ユーザー ID クエリパラメータ
#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user_id: Option<i64>,
}

impl UserQuery {
    /// 解決済みのユーザー ID を取り出す
    ///
    /// # エラー
    ///
    /// `user_id` がない場合は `Unauthorized`。
    pub fn user_id(&self) -> Result<UserId, ServiceError> {
        self.user_id
            .map(UserId::new)
            .ok_or_else(|| ServiceError::Unauthorized("user_id が指定されていません".to_string()))
    }
}
