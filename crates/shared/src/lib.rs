//! # PromoPool 共有ユーティリティ
//!
//! ワークスペース全体で使用される共通ユーティリティを提供する。
//!
//! ## 設計方針
//!
//! - domain / infra / service のすべてから依存される
//! - ビジネスロジックを含まない純粋なユーティリティのみを配置
//! - axum などのフレームワークには依存しない

pub mod api_response;
pub mod error_response;
pub mod observability;

pub use api_response::ApiResponse;
pub use error_response::ErrorResponse;
