//! 取り込みユースケース
//!
//! 行データを検証し、全グループを 1 つのトランザクションで挿入する。
//! 検証エラー・既存コードとの重複・DB エラーのいずれでも何もコミットしない。

use std::sync::Arc;

use chrono::NaiveDate;
use promopool_domain::{
    brand::Brand,
    clock::Clock,
    ingestion::{PromoRow, ValidatedBatch},
    user::UserId,
};
use promopool_infra::{
    TransactionManager,
    repository::{PromoCodeRepository, UserRepository},
};
use serde::Serialize;

use crate::{error::ServiceError, usecase::ensure_admin};

/// (ブランド, 有効期限) ごとの挿入件数
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupReport {
    pub brand:       Brand,
    pub valid_until: NaiveDate,
    pub count:       usize,
}

/// 取り込み結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestionReport {
    pub inserted: u64,
    pub groups:   Vec<GroupReport>,
}

/// 取り込みユースケース
pub struct IngestionUseCaseImpl {
    code_repository: Arc<dyn PromoCodeRepository>,
    user_repository: Arc<dyn UserRepository>,
    tx_manager:      Arc<dyn TransactionManager>,
    clock:           Arc<dyn Clock>,
}

impl IngestionUseCaseImpl {
    pub fn new(
        code_repository: Arc<dyn PromoCodeRepository>,
        user_repository: Arc<dyn UserRepository>,
        tx_manager: Arc<dyn TransactionManager>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            code_repository,
            user_repository,
            tx_manager,
            clock,
        }
    }

    /// 取り込みバッチを登録する
    ///
    /// # エラー
    ///
    /// - 管理者でない: `Forbidden`
    /// - 検証エラー、または既に登録済みのコードを含む: `BadRequest`
    #[tracing::instrument(skip(self, rows), fields(%admin_id, rows = rows.len()))]
    pub async fn upload(
        &self,
        admin_id: UserId,
        rows: &[PromoRow],
    ) -> Result<IngestionReport, ServiceError> {
        ensure_admin(self.user_repository.as_ref(), admin_id).await?;

        let batch = ValidatedBatch::validate(rows)?;

        let mut tx = self.tx_manager.begin().await?;
        let inserted = match self
            .code_repository
            .insert_batch(&mut tx, &batch.new_codes(), admin_id, self.clock.now())
            .await
        {
            Ok(inserted) => inserted,
            Err(e) => {
                tx.rollback().await?;
                return Err(match e.as_conflict() {
                    Some(_) => ServiceError::BadRequest(
                        "既に登録済みのプロモコードが含まれています".to_string(),
                    ),
                    None => e.into(),
                });
            }
        };
        tx.commit().await?;

        let groups = batch
            .groups()
            .iter()
            .map(|g| GroupReport {
                brand:       g.brand,
                valid_until: g.valid_until,
                count:       g.len(),
            })
            .collect();

        tracing::info!(inserted, "プロモコードを取り込みました");

        Ok(IngestionReport { inserted, groups })
    }
}
