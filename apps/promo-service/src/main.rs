//! # Promo Service サーバー
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `PROMO_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `PROMO_PORT` | **Yes** | ポート番号 |
//! | `DATABASE_URL` | **Yes** | PostgreSQL 接続 URL |
//! | `DATABASE_MAX_CONNECTIONS` | No | 接続プールの最大接続数（デフォルト: 10） |
//! | `RUN_MIGRATIONS` | No | 起動時にマイグレーションを適用するか（デフォルト: true） |
//! | `LOG_FORMAT` | No | `json` または `pretty`（デフォルト: `pretty`） |
//! | `RUST_LOG` | No | ログレベル（デフォルト: `info,promopool=debug`） |
//!
//! ## 起動方法
//!
//! ```bash
//! PROMO_PORT=3100 DATABASE_URL=postgres://... cargo run -p promopool-service
//! ```

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context as _;
use promopool_domain::clock::{Clock, SystemClock};
use promopool_infra::{
    PgTransactionManager,
    TransactionManager,
    db,
    repository::{
        ActiveBrandRepository,
        PostgresActiveBrandRepository,
        PostgresPromoClaimRepository,
        PostgresPromoCodeRepository,
        PostgresUserRepository,
        PromoClaimRepository,
        PromoCodeRepository,
        UserRepository,
    },
};
use promopool_service::{
    build_router,
    config::ServiceConfig,
    handler::{AdminState, PromoState},
    usecase::{
        ActiveBrandUseCaseImpl,
        ClaimUseCaseImpl,
        IngestionUseCaseImpl,
        StatsUseCaseImpl,
    },
};
use promopool_shared::observability::{TracingConfig, init_tracing};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    init_tracing(&TracingConfig::from_env("promo-service"));

    let config = ServiceConfig::from_env().context("設定の読み込みに失敗しました")?;

    tracing::info!(
        "Promo Service サーバーを起動します: {}:{}",
        config.host,
        config.port
    );

    let pool = db::create_pool(&config.database_url, config.database_max_connections)
        .await
        .context("データベース接続に失敗しました")?;
    tracing::info!("データベースに接続しました");

    if config.run_migrations {
        db::run_migrations(&pool)
            .await
            .context("マイグレーションに失敗しました")?;
        tracing::info!("マイグレーションを適用しました");
    }

    // 依存コンポーネントを初期化
    let code_repository: Arc<dyn PromoCodeRepository> =
        Arc::new(PostgresPromoCodeRepository::new(pool.clone()));
    let claim_repository: Arc<dyn PromoClaimRepository> =
        Arc::new(PostgresPromoClaimRepository::new(pool.clone()));
    let active_brand_repository: Arc<dyn ActiveBrandRepository> =
        Arc::new(PostgresActiveBrandRepository::new(pool.clone()));
    let user_repository: Arc<dyn UserRepository> =
        Arc::new(PostgresUserRepository::new(pool.clone()));
    let tx_manager: Arc<dyn TransactionManager> = Arc::new(PgTransactionManager::new(pool));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let promo_state = Arc::new(PromoState {
        claim_usecase:     ClaimUseCaseImpl::new(
            code_repository.clone(),
            claim_repository,
            active_brand_repository.clone(),
            tx_manager.clone(),
            clock.clone(),
        ),
        ingestion_usecase: IngestionUseCaseImpl::new(
            code_repository.clone(),
            user_repository.clone(),
            tx_manager.clone(),
            clock.clone(),
        ),
        stats_usecase:     StatsUseCaseImpl::new(
            code_repository,
            active_brand_repository.clone(),
            user_repository.clone(),
            clock.clone(),
        ),
    });
    let admin_state = Arc::new(AdminState {
        active_brand_usecase: ActiveBrandUseCaseImpl::new(
            active_brand_repository,
            user_repository,
            tx_manager,
            clock,
        ),
    });

    let app = build_router(promo_state, admin_state);

    // サーバー起動
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("アドレスのパースに失敗しました")?;

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Promo Service サーバーが起動しました: {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
