//! # Promo Service
//!
//! プロモコードの払い出し・取り込み・残数集計を行う内部サービス。
//!
//! ## 処理の流れ
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌───────────┐   ┌──────────────┐
//! │ handler  │──>│ usecase  │──>│ repository│──>│ PostgreSQL   │
//! └──────────┘   └──────────┘   └───────────┘   └──────────────┘
//!   入力変換        ゲート・冪等      SKIP LOCKED
//!                   ・検証           による割り当て
//! ```
//!
//! ## ルート
//!
//! [`build_router`] を参照。ユーザー ID は上流で解決済みのものを
//! `user_id` クエリパラメータで受け取る。

pub mod config;
pub mod error;
pub mod handler;
pub mod usecase;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use handler::{
    AdminState,
    PromoState,
    claim_promo,
    clear_active_brand,
    get_active_brand,
    get_promo_stats,
    health_check,
    list_my_claims,
    set_active_brand,
    upload_promo_codes,
};
use tower_http::trace::TraceLayer;

/// ルーターを構築する
pub fn build_router(promo_state: Arc<PromoState>, admin_state: Arc<AdminState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/internal/promo/claim/{brand}", post(claim_promo))
        .route("/internal/promo/claims", get(list_my_claims))
        .route("/internal/promo/upload", post(upload_promo_codes))
        .route("/internal/promo/stats", get(get_promo_stats))
        .with_state(promo_state)
        .route(
            "/internal/admin/promo/active-brand",
            get(get_active_brand)
                .post(set_active_brand)
                .delete(clear_active_brand),
        )
        .with_state(admin_state)
        .layer(TraceLayer::new_for_http())
}
