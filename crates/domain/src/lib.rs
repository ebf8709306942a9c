//! # PromoPool ドメイン層
//!
//! プロモコード払い出しのビジネスルールを定義する。
//!
//! ## 設計方針
//!
//! - **値オブジェクト**: [`brand::Brand`], [`promo_code::PromoCodeValue`] など、
//!   生成時に検証を済ませた不変の型
//! - **エンティティ**: [`promo_code::PromoCode`], [`claim::UserClaim`]
//! - **ルール**: ペア払い出し（[`brand::Brand::PAIRED`]）、アクティブブランドの
//!   制限（[`active_brand::ActiveBrandWindow`]）、取り込みバッチの検証
//!   （[`ingestion::ValidatedBatch`]）
//!
//! ## 依存関係の方向
//!
//! ```text
//! promo-service → infra → domain
//! ```
//!
//! ドメイン層は DB にも HTTP にも依存しない。現在時刻も [`clock::Clock`]
//! 経由で受け取る。
//!
//! ## 使用例
//!
//! ```rust
//! use promopool_domain::{DomainError, brand::Brand};
//!
//! let brand = Brand::parse(" yandex ").unwrap();
//! assert_eq!(brand.claim_size(), 2);
//!
//! let error = Brand::parse("UBER").unwrap_err();
//! assert!(matches!(error, DomainError::Validation(_)));
//! ```

#[macro_use]
mod macros;

pub mod active_brand;
pub mod brand;
pub mod claim;
pub mod clock;
pub mod error;
pub mod ingestion;
pub mod promo_code;
pub mod stats;
pub mod user;

pub use error::DomainError;
