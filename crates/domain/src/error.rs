//! # ドメイン層エラー定義
//!
//! ビジネスルール違反やドメイン固有の例外状態を表現するエラー型。
//!
//! ## エラーの種類と HTTP ステータスの対応
//!
//! | エラー種別 | HTTP ステータス | 用途 |
//! |-----------|----------------|------|
//! | `Validation` | 400 Bad Request | 不明なブランド、日付形式不正、必須項目欠落、ペア数違反 |
//! | `Exhausted` | 409 Conflict | 払い出し可能なコード（ペア）が残っていない |
//! | `Forbidden` | 403 Forbidden | 管理者権限なし、受付中でないブランドの請求 |
//!
//! ## 使用例
//!
//! ```rust
//! use promopool_domain::{DomainError, brand::Brand};
//!
//! let err = Brand::parse("UBER").unwrap_err();
//! assert!(matches!(err, DomainError::Validation(_)));
//! ```

use thiserror::Error;

/// ドメイン層で発生するエラー
///
/// サービス層はこの種別を保ったまま HTTP レスポンスに変換する。
/// 「在庫切れ」を汎用の成功・失敗に丸めないため、独立したバリアントを持つ。
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// 取り込みバッチ全体、またはリクエスト全体を拒否する。部分適用はしない。
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    /// 在庫切れ
    ///
    /// 条件を満たすコードが存在しない。障害ではなく想定内の結果。
    #[error("在庫がありません: {0}")]
    Exhausted(String),

    /// 権限エラー
    ///
    /// コードプールへのアクセス前に拒否される。
    #[error("権限がありません: {0}")]
    Forbidden(String),
}
