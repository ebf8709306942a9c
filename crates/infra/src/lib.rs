//! # PromoPool インフラ層
//!
//! PostgreSQL との接続と、リポジトリトレイトの具体実装を提供する。
//!
//! ## 責務
//!
//! - **データベース接続**: 接続プール、マイグレーション、トランザクション境界
//! - **リポジトリ実装**: コードプール、受付中ブランド、払い出し記録、ユーザーロール
//! - **モック**: `test-utils` feature でインメモリ実装を公開
//!
//! ## 依存関係
//!
//! ```text
//! promo-service → infra → domain
//! ```
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use promopool_infra::{db, repository::PostgresPromoCodeRepository};
//!
//! async fn setup() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = db::create_pool("postgres://localhost/promopool", 10).await?;
//!     db::run_migrations(&pool).await?;
//!     let repo = PostgresPromoCodeRepository::new(pool);
//!     Ok(())
//! }
//! ```

pub mod db;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod repository;

pub use db::{PgTransactionManager, TransactionManager, TxContext};
pub use error::{InfraError, InfraErrorKind};
