//! # ブランド
//!
//! プロモコードの提供元パートナーを表す閉じた列挙型。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 説明 |
//! |---|------------|------|
//! | [`Brand`] | ブランド | 外部パートナー 1 社に対応するコードの分類 |
//! | [`Brand::is_paired`] | ペア払い出し | 同一有効期限のコードを 2 枚 1 組でのみ払い出すブランド |
//!
//! ## 使用例
//!
//! ```rust
//! use promopool_domain::brand::Brand;
//!
//! let brand = Brand::parse(" yandex ").unwrap();
//! assert_eq!(brand, Brand::Yandex);
//! assert!(brand.is_paired());
//! assert_eq!(brand.claim_size(), 2);
//! assert_eq!(brand.as_str(), "YANDEX");
//! ```

use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString, IntoStaticStr};

use crate::DomainError;

/// プロモコードのブランド
///
/// DB の `brand` カラムには大文字表記（`"JET"` 等）で保存する。
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    EnumIter,
    IntoStaticStr,
    strum::Display,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Brand {
    Jet,
    Yandex,
    Whoosh,
    Bolt,
}

impl Brand {
    /// ペア払い出し対象のブランド
    pub const PAIRED: Brand = Brand::Yandex;

    /// 入力文字列からブランドを解釈する
    ///
    /// 前後の空白を除去し、大文字小文字を区別しない。
    ///
    /// # エラー
    ///
    /// 未知のブランドは `DomainError::Validation`。
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        let trimmed = value.trim();
        trimmed
            .parse::<Self>()
            .map_err(|_| DomainError::Validation(format!("不明なブランドです: {trimmed}")))
    }

    /// DB / API 上の表記
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// 2 枚 1 組でのみ払い出すブランドか
    pub fn is_paired(&self) -> bool {
        *self == Self::PAIRED
    }

    /// 1 回の請求で払い出す枚数
    pub fn claim_size(&self) -> usize {
        if self.is_paired() { 2 } else { 1 }
    }
}
