//! # ActiveBrandRepository
//!
//! 受付中ブランドのシングルトン（`active_promo_brand`）を扱う。
//!
//! 主キーは定数 `TRUE` のため、行は最大 1 つ。設定は
//! `ON CONFLICT (singleton) DO UPDATE` で常に前の設定を置き換える。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use promopool_domain::active_brand::ActiveBrandWindow;
use sqlx::PgPool;

use super::brand_from_db;
use crate::{db::TxContext, error::InfraError};

/// 受付中ブランドリポジトリトレイト
#[async_trait]
pub trait ActiveBrandRepository: Send + Sync {
    /// ウィンドウを設定する（既存の設定は置き換える）
    async fn upsert(
        &self,
        tx: &mut TxContext,
        window: &ActiveBrandWindow,
        now: DateTime<Utc>,
    ) -> Result<(), InfraError>;

    /// ウィンドウを解除する
    async fn clear(&self, tx: &mut TxContext) -> Result<(), InfraError>;

    /// `now` 時点で有効なウィンドウを取得する
    ///
    /// 未設定、または期限切れなら `None`。
    async fn find_active(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<ActiveBrandWindow>, InfraError>;
}

#[derive(Debug, sqlx::FromRow)]
struct ActiveBrandRow {
    brand:      String,
    expires_at: DateTime<Utc>,
}

/// PostgreSQL 実装の ActiveBrandRepository
#[derive(Debug, Clone)]
pub struct PostgresActiveBrandRepository {
    pool: PgPool,
}

impl PostgresActiveBrandRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActiveBrandRepository for PostgresActiveBrandRepository {
    async fn upsert(
        &self,
        tx: &mut TxContext,
        window: &ActiveBrandWindow,
        now: DateTime<Utc>,
    ) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            INSERT INTO active_promo_brand (singleton, brand, expires_at, updated_at)
            VALUES (TRUE, $1, $2, $3)
            ON CONFLICT (singleton) DO UPDATE
            SET brand = EXCLUDED.brand,
                expires_at = EXCLUDED.expires_at,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(window.brand().as_str())
        .bind(window.expires_at())
        .bind(now)
        .execute(tx.conn())
        .await?;

        Ok(())
    }

    async fn clear(&self, tx: &mut TxContext) -> Result<(), InfraError> {
        sqlx::query("DELETE FROM active_promo_brand")
            .execute(tx.conn())
            .await?;
        Ok(())
    }

    async fn find_active(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<ActiveBrandWindow>, InfraError> {
        let row: Option<ActiveBrandRow> = sqlx::query_as(
            r#"
            SELECT brand, expires_at
            FROM active_promo_brand
            WHERE singleton AND expires_at > $1
            "#,
        )
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(ActiveBrandWindow::from_db(
                brand_from_db(&row.brand)?,
                row.expires_at,
            ))
        })
        .transpose()
    }
}
