//! # Promo Service エラー定義
//!
//! Promo Service 固有のエラーと、HTTP レスポンスへの変換を定義する。
//!
//! | バリアント | HTTP ステータス | type |
//! |-----------|----------------|------|
//! | `BadRequest` | 400 | `validation-error` |
//! | `Unauthorized` | 401 | `unauthorized` |
//! | `Forbidden` | 403 | `forbidden` |
//! | `Exhausted` | 409 | `promo-exhausted` |
//! | `Database` / `Internal` | 500 | `internal-error` |

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use promopool_domain::DomainError;
use promopool_shared::ErrorResponse;
use thiserror::Error;

/// Promo Service で発生するエラー
#[derive(Debug, Error)]
pub enum ServiceError {
    /// 不正なリクエスト（取り込みバッチの検証エラー等）
    #[error("不正なリクエスト: {0}")]
    BadRequest(String),

    /// 払い出せるコードがない
    #[error("在庫切れ: {0}")]
    Exhausted(String),

    /// 権限不足、または受付中でないブランドの請求
    #[error("権限がありません: {0}")]
    Forbidden(String),

    /// ユーザー ID が解決できない
    #[error("認証されていません: {0}")]
    Unauthorized(String),

    /// データベースエラー
    #[error("データベースエラー: {0}")]
    Database(#[from] promopool_infra::InfraError),

    /// 内部エラー
    #[error("内部エラー: {0}")]
    Internal(String),
}

impl From<DomainError> for ServiceError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::Validation(msg) => Self::BadRequest(msg),
            DomainError::Exhausted(msg) => Self::Exhausted(msg),
            DomainError::Forbidden(msg) => Self::Forbidden(msg),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let body = match &self {
            ServiceError::BadRequest(msg) => ErrorResponse::validation_error(msg),
            ServiceError::Exhausted(msg) => ErrorResponse::promo_exhausted(msg),
            ServiceError::Forbidden(msg) => ErrorResponse::forbidden(msg),
            ServiceError::Unauthorized(msg) => ErrorResponse::unauthorized(msg),
            ServiceError::Database(e) => {
                tracing::error!(
                    error = %e,
                    span_trace = %e.span_trace(),
                    "データベースエラー"
                );
                ErrorResponse::internal_error()
            }
            ServiceError::Internal(msg) => {
                tracing::error!("内部エラー: {}", msg);
                ErrorResponse::internal_error()
            }
        };

        let status =
            StatusCode::from_u16(body.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(body)).into_response()
    }
}
