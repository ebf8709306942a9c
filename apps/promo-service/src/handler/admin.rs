//! # 受付中ブランド管理ハンドラ
//!
//! ## エンドポイント
//!
//! - `POST /internal/admin/promo/active-brand` - 受付中ブランドを設定
//! - `DELETE /internal/admin/promo/active-brand` - 受付中ブランドを解除
//! - `GET /internal/admin/promo/active-brand` - 受付中ブランドを取得（なければ `data: null`）

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use promopool_domain::{active_brand::ActiveBrandWindow, brand::Brand};
use promopool_shared::ApiResponse;
use serde::{Deserialize, Serialize};

use crate::{error::ServiceError, handler::UserQuery, usecase::ActiveBrandUseCaseImpl};

/// 管理 API の共有状態
pub struct AdminState {
    pub active_brand_usecase: ActiveBrandUseCaseImpl,
}

/// 受付中ブランド設定リクエスト
#[derive(Debug, Deserialize)]
pub struct SetActiveBrandRequest {
    pub brand: String,
    /// 受付日数（未指定・0 以下なら既定値）
    pub days:  Option<i64>,
}

/// 受付中ブランド DTO
#[derive(Debug, Serialize)]
pub struct ActiveBrandDto {
    pub brand:      Brand,
    pub expires_at: DateTime<Utc>,
}

impl From<ActiveBrandWindow> for ActiveBrandDto {
    fn from(window: ActiveBrandWindow) -> Self {
        Self {
            brand:      window.brand(),
            expires_at: window.expires_at(),
        }
    }
}

/// POST /internal/admin/promo/active-brand
pub async fn set_active_brand(
    State(state): State<Arc<AdminState>>,
    Query(query): Query<UserQuery>,
    Json(req): Json<SetActiveBrandRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let admin_id = query.user_id()?;
    let brand = Brand::parse(&req.brand)?;

    let window = state
        .active_brand_usecase
        .set(admin_id, brand, req.days)
        .await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::new(ActiveBrandDto::from(window))),
    ))
}

/// DELETE /internal/admin/promo/active-brand
pub async fn clear_active_brand(
    State(state): State<Arc<AdminState>>,
    Query(query): Query<UserQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let admin_id = query.user_id()?;

    state.active_brand_usecase.clear(admin_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /internal/admin/promo/active-brand
pub async fn get_active_brand(
    State(state): State<Arc<AdminState>>,
    Query(query): Query<UserQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let admin_id = query.user_id()?;

    let window = state.active_brand_usecase.get(admin_id).await?;

    let response = ApiResponse::new(window.map(ActiveBrandDto::from));
    Ok((StatusCode::OK, Json(response)))
}
