//! # PromoClaimRepository
//!
//! ユーザー × ブランドの払い出し記録（`user_promo_claims`）を扱う。
//!
//! 主キー (user_id, brand) で冪等性を担保する。書き込みは
//! `ON CONFLICT DO NOTHING` で、既に記録があれば何も変えずに `false` を返す。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use promopool_domain::{
    brand::Brand,
    claim::UserClaim,
    promo_code::PromoCodeValue,
    user::UserId,
};
use sqlx::PgPool;

use super::brand_from_db;
use crate::{db::TxContext, error::InfraError};

/// 払い出し記録リポジトリトレイト
#[async_trait]
pub trait PromoClaimRepository: Send + Sync {
    /// (ユーザー, ブランド) の記録を取得する
    async fn find(&self, user_id: UserId, brand: Brand) -> Result<Option<UserClaim>, InfraError>;

    /// ユーザーの全記録をブランド順に取得する
    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<UserClaim>, InfraError>;

    /// 記録がなければ挿入する
    ///
    /// 挿入した場合は `true`、既に記録があった場合は `false`。
    async fn insert_if_absent(
        &self,
        tx: &mut TxContext,
        claim: &UserClaim,
    ) -> Result<bool, InfraError>;
}

#[derive(Debug, sqlx::FromRow)]
struct PromoClaimRow {
    user_id:     i64,
    brand:       String,
    promo_codes: Vec<String>,
    claimed_at:  DateTime<Utc>,
}

impl TryFrom<PromoClaimRow> for UserClaim {
    type Error = InfraError;

    fn try_from(row: PromoClaimRow) -> Result<Self, Self::Error> {
        let codes = row
            .promo_codes
            .into_iter()
            .map(PromoCodeValue::new)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| InfraError::unexpected(format!("不正な払い出し記録: {e}")))?;
        Ok(UserClaim::from_db(
            UserId::new(row.user_id),
            brand_from_db(&row.brand)?,
            codes,
            row.claimed_at,
        ))
    }
}

/// PostgreSQL 実装の PromoClaimRepository
#[derive(Debug, Clone)]
pub struct PostgresPromoClaimRepository {
    pool: PgPool,
}

impl PostgresPromoClaimRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PromoClaimRepository for PostgresPromoClaimRepository {
    async fn find(&self, user_id: UserId, brand: Brand) -> Result<Option<UserClaim>, InfraError> {
        let row: Option<PromoClaimRow> = sqlx::query_as(
            r#"
            SELECT user_id, brand, promo_codes, claimed_at
            FROM user_promo_claims
            WHERE user_id = $1 AND brand = $2
            "#,
        )
        .bind(user_id.as_i64())
        .bind(brand.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserClaim::try_from).transpose()
    }

    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<UserClaim>, InfraError> {
        let rows: Vec<PromoClaimRow> = sqlx::query_as(
            r#"
            SELECT user_id, brand, promo_codes, claimed_at
            FROM user_promo_claims
            WHERE user_id = $1
            ORDER BY brand
            "#,
        )
        .bind(user_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(UserClaim::try_from).collect()
    }

    async fn insert_if_absent(
        &self,
        tx: &mut TxContext,
        claim: &UserClaim,
    ) -> Result<bool, InfraError> {
        let inserted: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO user_promo_claims (user_id, brand, promo_codes, claimed_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, brand) DO NOTHING
            RETURNING user_id
            "#,
        )
        .bind(claim.user_id().as_i64())
        .bind(claim.brand().as_str())
        .bind(claim.code_strings())
        .bind(claim.claimed_at())
        .fetch_optional(tx.conn())
        .await?;

        Ok(inserted.is_some())
    }
}
