//! # PromoCodeRepository
//!
//! コードプール（`promo_codes`）の永続化と、払い出し用の行ロック付き更新。
//!
//! ## 払い出しの仕組み
//!
//! - **単発（claim_single）**: 「古い順」で最初の未ロック行を
//!   `FOR UPDATE SKIP LOCKED` で選び、同じ UPDATE 文で割り当てる。
//!   同時に請求した側は待たずに次の行を受け取る
//! - **ペア（claim_pair）**: 2 枚以上残っている有効期限を古い順に候補として取り、
//!   候補ごとにセーブポイントを切って「同じ日付の未ロック行をちょうど 2 行」
//!   割り当てる。2 行揃わなければセーブポイントまで戻して次の候補へ進む。
//!   1 枚だけ割り当てた状態がコミットされることはない
//!
//! PostgreSQL は `GROUP BY` と `FOR UPDATE` を併用できないため、
//! 候補日付の集計はロックなしで行い、ロックは 2 段目で取る。

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use promopool_domain::{
    brand::Brand,
    promo_code::{NewPromoCode, PromoCode, PromoCodeId, PromoCodeValue},
    stats::RemainingCount,
    user::UserId,
};
use sqlx::{Connection, PgPool};

use super::brand_from_db;
use crate::{db::TxContext, error::InfraError};

/// ペア払い出しで試す有効期限の候補数
pub const PAIR_DATE_CANDIDATES: i64 = 5;

/// プロモコードリポジトリトレイト
#[async_trait]
pub trait PromoCodeRepository: Send + Sync {
    /// 1 枚を割り当てる
    ///
    /// 払い出し対象がなければ `None`。
    async fn claim_single(
        &self,
        tx: &mut TxContext,
        brand: Brand,
        user_id: UserId,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Option<PromoCodeValue>, InfraError>;

    /// 同じ有効期限の 2 枚を割り当てる
    ///
    /// 2 枚揃う日付がなければ `None`。1 枚だけ割り当てることはない。
    async fn claim_pair(
        &self,
        tx: &mut TxContext,
        brand: Brand,
        user_id: UserId,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Option<[PromoCodeValue; 2]>, InfraError>;

    /// 取り込んだコードを一括挿入する
    ///
    /// (ブランド, コード) が既存と衝突した場合は `InfraErrorKind::Conflict`。
    async fn insert_batch(
        &self,
        tx: &mut TxContext,
        codes: &[NewPromoCode],
        created_by: UserId,
        now: DateTime<Utc>,
    ) -> Result<u64, InfraError>;

    /// 払い出し対象の残数を (有効期限, ブランド) ごとに集計する
    async fn count_remaining(
        &self,
        today: NaiveDate,
        brand: Option<Brand>,
    ) -> Result<Vec<RemainingCount>, InfraError>;

    /// ブランドとコード文字列で検索する
    async fn find_by_code(
        &self,
        brand: Brand,
        code: &PromoCodeValue,
    ) -> Result<Option<PromoCode>, InfraError>;
}

/// DB の promo_codes テーブルの行を表す中間構造体
#[derive(Debug, sqlx::FromRow)]
struct PromoCodeRow {
    id: i64,
    brand: String,
    promo_code: String,
    valid_until: NaiveDate,
    assigned_to_user_id: Option<i64>,
    claimed_at: Option<DateTime<Utc>>,
    created_by_admin_id: i64,
}

impl TryFrom<PromoCodeRow> for PromoCode {
    type Error = InfraError;

    fn try_from(row: PromoCodeRow) -> Result<Self, Self::Error> {
        Ok(PromoCode::from_db(
            PromoCodeId::new(row.id),
            brand_from_db(&row.brand)?,
            code_from_db(row.promo_code)?,
            row.valid_until,
            row.assigned_to_user_id.map(UserId::new),
            row.claimed_at,
            UserId::new(row.created_by_admin_id),
        ))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RemainingRow {
    valid_until: NaiveDate,
    brand: String,
    count: i64,
}

fn code_from_db(value: String) -> Result<PromoCodeValue, InfraError> {
    PromoCodeValue::new(value)
        .map_err(|e| InfraError::unexpected(format!("不正なプロモコード値: {e}")))
}

/// PostgreSQL 実装の PromoCodeRepository
#[derive(Debug, Clone)]
pub struct PostgresPromoCodeRepository {
    pool: PgPool,
}

impl PostgresPromoCodeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PromoCodeRepository for PostgresPromoCodeRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(%brand, %user_id))]
    async fn claim_single(
        &self,
        tx: &mut TxContext,
        brand: Brand,
        user_id: UserId,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Option<PromoCodeValue>, InfraError> {
        let code: Option<String> = sqlx::query_scalar(
            r#"
            UPDATE promo_codes
            SET assigned_to_user_id = $1, claimed_at = $2
            WHERE id = (
                SELECT id FROM promo_codes
                WHERE brand = $3
                  AND assigned_to_user_id IS NULL
                  AND valid_until >= $4
                ORDER BY valid_until, id
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING promo_code
            "#,
        )
        .bind(user_id.as_i64())
        .bind(now)
        .bind(brand.as_str())
        .bind(today)
        .fetch_optional(tx.conn())
        .await?;

        code.map(code_from_db).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%brand, %user_id))]
    async fn claim_pair(
        &self,
        tx: &mut TxContext,
        brand: Brand,
        user_id: UserId,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Option<[PromoCodeValue; 2]>, InfraError> {
        let candidates: Vec<NaiveDate> = sqlx::query_scalar(
            r#"
            SELECT valid_until FROM promo_codes
            WHERE brand = $1
              AND assigned_to_user_id IS NULL
              AND valid_until >= $2
            GROUP BY valid_until
            HAVING COUNT(*) >= 2
            ORDER BY valid_until
            LIMIT $3
            "#,
        )
        .bind(brand.as_str())
        .bind(today)
        .bind(PAIR_DATE_CANDIDATES)
        .fetch_all(tx.conn())
        .await?;

        for valid_until in candidates {
            let mut savepoint = tx.conn().begin().await?;

            // picked が 2 行揃ったときだけ更新する。1 行しか取れなければ 0 行更新
            let codes: Vec<String> = sqlx::query_scalar(
                r#"
                WITH picked AS (
                    SELECT id FROM promo_codes
                    WHERE brand = $3
                      AND valid_until = $4
                      AND assigned_to_user_id IS NULL
                    ORDER BY id
                    LIMIT 2
                    FOR UPDATE SKIP LOCKED
                )
                UPDATE promo_codes
                SET assigned_to_user_id = $1, claimed_at = $2
                WHERE id IN (SELECT id FROM picked)
                  AND (SELECT COUNT(*) FROM picked) = 2
                RETURNING promo_code
                "#,
            )
            .bind(user_id.as_i64())
            .bind(now)
            .bind(brand.as_str())
            .bind(valid_until)
            .fetch_all(&mut *savepoint)
            .await?;

            match <[String; 2]>::try_from(codes) {
                Ok([first, second]) => {
                    savepoint.commit().await?;
                    return Ok(Some([code_from_db(first)?, code_from_db(second)?]));
                }
                Err(partial) => {
                    // 取れた 1 行のロックを手放して次の日付へ
                    savepoint.rollback().await?;
                    tracing::debug!(
                        %valid_until,
                        locked = partial.len(),
                        "ペアが揃わないため次の有効期限を試行"
                    );
                }
            }
        }

        Ok(None)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(count = codes.len(), %created_by))]
    async fn insert_batch(
        &self,
        tx: &mut TxContext,
        codes: &[NewPromoCode],
        created_by: UserId,
        now: DateTime<Utc>,
    ) -> Result<u64, InfraError> {
        let brands: Vec<String> = codes.iter().map(|c| c.brand.as_str().to_string()).collect();
        let values: Vec<String> = codes.iter().map(|c| c.code.as_str().to_string()).collect();
        let dates: Vec<NaiveDate> = codes.iter().map(|c| c.valid_until).collect();

        let result = sqlx::query(
            r#"
            INSERT INTO promo_codes (brand, promo_code, valid_until, created_by_admin_id, created_at)
            SELECT t.brand, t.promo_code, t.valid_until, $4, $5
            FROM UNNEST($1::text[], $2::text[], $3::date[]) AS t(brand, promo_code, valid_until)
            "#,
        )
        .bind(brands)
        .bind(values)
        .bind(dates)
        .bind(created_by.as_i64())
        .bind(now)
        .execute(tx.conn())
        .await
        .map_err(|e| InfraError::from_sqlx_with_conflict(e, "PromoCode"))?;

        Ok(result.rows_affected())
    }

    async fn count_remaining(
        &self,
        today: NaiveDate,
        brand: Option<Brand>,
    ) -> Result<Vec<RemainingCount>, InfraError> {
        let rows: Vec<RemainingRow> = sqlx::query_as(
            r#"
            SELECT valid_until, brand, COUNT(*) AS count
            FROM promo_codes
            WHERE assigned_to_user_id IS NULL
              AND valid_until >= $1
              AND ($2::text IS NULL OR brand = $2)
            GROUP BY valid_until, brand
            ORDER BY valid_until, brand
            "#,
        )
        .bind(today)
        .bind(brand.map(|b| b.as_str()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(RemainingCount {
                    valid_until: row.valid_until,
                    brand:       brand_from_db(&row.brand)?,
                    count:       row.count,
                })
            })
            .collect()
    }

    async fn find_by_code(
        &self,
        brand: Brand,
        code: &PromoCodeValue,
    ) -> Result<Option<PromoCode>, InfraError> {
        let row: Option<PromoCodeRow> = sqlx::query_as(
            r#"
            SELECT id, brand, promo_code, valid_until,
                   assigned_to_user_id, claimed_at, created_by_admin_id
            FROM promo_codes
            WHERE brand = $1 AND promo_code = $2
            "#,
        )
        .bind(brand.as_str())
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(PromoCode::try_from).transpose()
    }
}
