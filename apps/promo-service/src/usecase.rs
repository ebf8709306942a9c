//! # ユースケース層
//!
//! Promo Service のビジネスロジックを実装する。
//!
//! ## 設計方針
//!
//! - **依存性注入**: リポジトリ・時刻を `Arc<dyn Trait>` で外部から注入
//! - **薄いハンドラ**: ハンドラは入力の変換のみ行い、ロジックはユースケースに集約
//! - **管理者判定**: 管理操作は最初に [`ensure_admin`] で弾き、プールには触れない
//!
//! ## モジュール構成
//!
//! - `claim`: 払い出し（ゲート → 冪等チェック → 割り当て）と払い出し記録の参照
//! - `ingestion`: 取り込みバッチの検証と一括挿入
//! - `active_brand`: 受付中ブランドの設定・解除・参照
//! - `stats`: 残数集計

pub mod active_brand;
pub mod claim;
pub mod ingestion;
pub mod stats;

pub use active_brand::ActiveBrandUseCaseImpl;
pub use claim::ClaimUseCaseImpl;
pub use ingestion::{IngestionReport, IngestionUseCaseImpl};
use promopool_domain::user::UserId;
use promopool_infra::repository::UserRepository;
pub use stats::StatsUseCaseImpl;

use crate::error::ServiceError;

/// 管理者でなければ `Forbidden` を返す
pub(crate) async fn ensure_admin(
    user_repository: &dyn UserRepository,
    user_id: UserId,
) -> Result<(), ServiceError> {
    if user_repository.is_admin(user_id).await? {
        Ok(())
    } else {
        tracing::warn!(%user_id, "管理者以外による管理操作を拒否");
        Err(ServiceError::Forbidden("管理者権限が必要です".to_string()))
    }
}
