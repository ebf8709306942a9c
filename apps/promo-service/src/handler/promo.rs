//! # プロモコードハンドラ
//!
//! ## エンドポイント
//!
//! - `POST /internal/promo/claim/{brand}` - ブランドのコードを請求
//! - `GET /internal/promo/claims` - 自分の払い出し記録一覧
//! - `POST /internal/promo/upload` - 取り込みバッチの登録（管理者）
//! - `GET /internal/promo/stats` - 残数集計（管理者）

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use promopool_domain::{
    brand::Brand,
    claim::{ClaimOutcome, UserClaim},
    ingestion::PromoRow,
};
use promopool_shared::ApiResponse;
use serde::{Deserialize, Serialize};

use crate::{
    error::ServiceError,
    handler::UserQuery,
    usecase::{ClaimUseCaseImpl, IngestionUseCaseImpl, StatsUseCaseImpl},
};

/// プロモコード API の共有状態
pub struct PromoState {
    pub claim_usecase:     ClaimUseCaseImpl,
    pub ingestion_usecase: IngestionUseCaseImpl,
    pub stats_usecase:     StatsUseCaseImpl,
}

// --- リクエスト/レスポンス型 ---

/// 請求結果 DTO
#[derive(Debug, Serialize)]
pub struct ClaimDto {
    pub brand:           Brand,
    pub codes:           Vec<String>,
    pub already_claimed: bool,
    pub claimed_at:      DateTime<Utc>,
}

impl From<ClaimOutcome> for ClaimDto {
    fn from(outcome: ClaimOutcome) -> Self {
        Self {
            already_claimed: outcome.already_claimed,
            ..Self::from(outcome.claim)
        }
    }
}

impl From<UserClaim> for ClaimDto {
    fn from(claim: UserClaim) -> Self {
        Self {
            brand:           claim.brand(),
            codes:           claim.code_strings(),
            already_claimed: true,
            claimed_at:      claim.claimed_at(),
        }
    }
}

/// 取り込みリクエスト
///
/// `rows` はシートの行（`[ブランド, コード, 有効期限]`）。
#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    pub rows:       Vec<Vec<String>>,
    /// 先頭行をヘッダーとして読み飛ばすか
    #[serde(default = "default_true")]
    pub has_header: bool,
}

/// 集計クエリパラメータ
#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub user_id:     Option<i64>,
    pub active_only: Option<bool>,
}

fn default_true() -> bool {
    true
}

// --- ハンドラ ---

/// POST /internal/promo/claim/{brand}
///
/// 払い出し済みなら同じコードを `already_claimed: true` で返す。
pub async fn claim_promo(
    State(state): State<Arc<PromoState>>,
    Path(brand): Path<String>,
    Query(query): Query<UserQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let user_id = query.user_id()?;
    let brand = Brand::parse(&brand)?;

    let outcome = state.claim_usecase.claim(user_id, brand).await?;

    let response = ApiResponse::new(ClaimDto::from(outcome));
    Ok((StatusCode::OK, Json(response)))
}

/// GET /internal/promo/claims
pub async fn list_my_claims(
    State(state): State<Arc<PromoState>>,
    Query(query): Query<UserQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let user_id = query.user_id()?;

    let claims = state.claim_usecase.list_claims(user_id).await?;

    let items: Vec<ClaimDto> = claims.into_iter().map(ClaimDto::from).collect();
    Ok((StatusCode::OK, Json(ApiResponse::new(items))))
}

/// POST /internal/promo/upload
///
/// バッチ全体を検証してから 1 トランザクションで登録する。部分登録はしない。
pub async fn upload_promo_codes(
    State(state): State<Arc<PromoState>>,
    Query(query): Query<UserQuery>,
    Json(req): Json<UploadRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let admin_id = query.user_id()?;

    let skip = usize::from(req.has_header);
    let rows: Vec<PromoRow> = req
        .rows
        .iter()
        .skip(skip)
        .map(|cells| PromoRow::from_cells(cells))
        .collect();

    let report = state.ingestion_usecase.upload(admin_id, &rows).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::new(report))))
}

/// GET /internal/promo/stats
///
/// `active_only` の既定は true。
pub async fn get_promo_stats(
    State(state): State<Arc<PromoState>>,
    Query(query): Query<StatsQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let admin_id = UserQuery {
        user_id: query.user_id,
    }
    .user_id()?;

    let stats = state
        .stats_usecase
        .get_stats(admin_id, query.active_only.unwrap_or(true))
        .await?;

    Ok((StatusCode::OK, Json(ApiResponse::new(stats))))
}
