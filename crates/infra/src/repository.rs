//! # リポジトリ実装
//!
//! - **トレイト + PostgreSQL 実装**: ユースケース層はトレイト経由で使い、
//!   テストでは [`crate::mock`] のインメモリ実装に差し替える
//! - **書き込みは TxContext 必須**: 割り当て・取り込み・記録の書き込みは
//!   呼び出し側のトランザクション内で行う

pub mod active_brand_repository;
pub mod promo_claim_repository;
pub mod promo_code_repository;
pub mod user_repository;

pub use active_brand_repository::{ActiveBrandRepository, PostgresActiveBrandRepository};
pub use promo_claim_repository::{PostgresPromoClaimRepository, PromoClaimRepository};
pub use promo_code_repository::{
    PAIR_DATE_CANDIDATES,
    PostgresPromoCodeRepository,
    PromoCodeRepository,
};
pub use user_repository::{PostgresUserRepository, UserRepository};

use promopool_domain::brand::Brand;

use crate::error::InfraError;

/// DB の `brand` カラム値をドメインの Brand に変換する
///
/// CHECK 制約があるため通常は失敗しない。
pub(crate) fn brand_from_db(value: &str) -> Result<Brand, InfraError> {
    Brand::parse(value).map_err(|_| InfraError::unexpected(format!("不正なブランド値: {value}")))
}
