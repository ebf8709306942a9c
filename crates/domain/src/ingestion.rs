//! # 取り込みバッチの検証（Ingestion Validator）
//!
//! 外部で解析済みの行（ブランド, コード, 有効期限）を検証し、
//! (ブランド, 有効期限) ごとのグループにまとめる。
//!
//! ## 検証ルール
//!
//! 1. 前後空白を除去する。3 項目すべて空の行（シート末尾の空行）は読み飛ばす
//! 2. 項目の欠落、不明なブランド、`YYYY-MM-DD` 以外の日付はバッチ全体を拒否
//! 3. バッチ内で (ブランド, コード) が重複していればバッチ全体を拒否
//! 4. ペアブランドで奇数枚のグループがあればバッチ全体を拒否
//! 5. 有効な行が 1 件もなければ拒否
//!
//! 取り込みは全件成功か全件失敗のいずれか。部分的な取り込みはしない。
//!
//! ## 使用例
//!
//! ```rust
//! use promopool_domain::ingestion::{PromoRow, ValidatedBatch};
//!
//! let rows = vec![
//!     PromoRow::new("YANDEX", "Y1", "2026-05-01"),
//!     PromoRow::new("YANDEX", "Y2", "2026-05-01"),
//!     PromoRow::new("jet", "J1", "2026-05-01"),
//! ];
//! let batch = ValidatedBatch::validate(&rows).unwrap();
//! assert_eq!(batch.total_codes(), 3);
//! assert_eq!(batch.groups().len(), 2);
//! ```

use std::collections::BTreeMap;

use chrono::NaiveDate;
use itertools::Itertools;

use crate::{
    DomainError,
    brand::Brand,
    promo_code::{NewPromoCode, PromoCodeValue},
};

/// 有効期限の日付形式
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// 取り込み行（未検証）
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PromoRow {
    pub brand:       String,
    pub code:        String,
    pub valid_until: String,
}

impl PromoRow {
    pub fn new(
        brand: impl Into<String>,
        code: impl Into<String>,
        valid_until: impl Into<String>,
    ) -> Self {
        Self {
            brand:       brand.into(),
            code:        code.into(),
            valid_until: valid_until.into(),
        }
    }

    /// シートのセル列から行を作る
    ///
    /// 足りないセルは空文字として扱う。4 列目以降は無視する。
    pub fn from_cells(cells: &[String]) -> Self {
        let cell = |i: usize| cells.get(i).cloned().unwrap_or_default();
        Self::new(cell(0), cell(1), cell(2))
    }

    fn is_blank(&self) -> bool {
        self.brand.trim().is_empty()
            && self.code.trim().is_empty()
            && self.valid_until.trim().is_empty()
    }
}

/// 検証済みの (ブランド, 有効期限) グループ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeGroup {
    pub brand:       Brand,
    pub valid_until: NaiveDate,
    pub codes:       Vec<PromoCodeValue>,
}

impl CodeGroup {
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// 検証済みバッチ
///
/// グループは (ブランド, 有効期限) の昇順。グループ内のコードは入力順。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedBatch {
    groups: Vec<CodeGroup>,
}

impl ValidatedBatch {
    /// 行を検証してバッチを作る
    ///
    /// # エラー
    ///
    /// いずれかのルールに違反した場合は `DomainError::Validation`。
    /// メッセージには 1 始まりの行番号を含める。
    pub fn validate(rows: &[PromoRow]) -> Result<Self, DomainError> {
        let parsed = rows
            .iter()
            .enumerate()
            .filter(|(_, row)| !row.is_blank())
            .map(|(index, row)| parse_row(index + 1, row))
            .collect::<Result<Vec<_>, _>>()?;

        if parsed.is_empty() {
            return Err(DomainError::Validation(
                "取り込むプロモコードがありません".to_string(),
            ));
        }

        if let Some(dup) = parsed
            .iter()
            .duplicates_by(|c| (c.brand, c.code.clone()))
            .next()
        {
            return Err(DomainError::Validation(format!(
                "{} のプロモコード {} が重複しています",
                dup.brand, dup.code
            )));
        }

        let mut grouped: BTreeMap<(Brand, NaiveDate), Vec<PromoCodeValue>> = BTreeMap::new();
        for code in parsed {
            grouped
                .entry((code.brand, code.valid_until))
                .or_default()
                .push(code.code);
        }

        let groups: Vec<CodeGroup> = grouped
            .into_iter()
            .map(|((brand, valid_until), codes)| CodeGroup {
                brand,
                valid_until,
                codes,
            })
            .collect();

        if let Some(odd) = groups
            .iter()
            .find(|g| g.brand.is_paired() && g.len() % 2 != 0)
        {
            return Err(DomainError::Validation(format!(
                "{} は有効期限 {} のプロモコードが偶数枚である必要があります（{} 枚）",
                odd.brand,
                odd.valid_until.format(DATE_FORMAT),
                odd.len()
            )));
        }

        Ok(Self { groups })
    }

    pub fn groups(&self) -> &[CodeGroup] {
        &self.groups
    }

    /// バッチ内のコード総数
    pub fn total_codes(&self) -> usize {
        self.groups.iter().map(CodeGroup::len).sum()
    }

    /// 挿入用の新規コード列に展開する（グループ順）
    pub fn new_codes(&self) -> Vec<NewPromoCode> {
        self.groups
            .iter()
            .flat_map(|g| {
                g.codes.iter().map(move |code| NewPromoCode {
                    brand:       g.brand,
                    code:        code.clone(),
                    valid_until: g.valid_until,
                })
            })
            .collect()
    }
}

fn parse_row(row_number: usize, row: &PromoRow) -> Result<NewPromoCode, DomainError> {
    let at_row = |msg: String| DomainError::Validation(format!("{row_number} 行目: {msg}"));

    let brand = row.brand.trim();
    let code = row.code.trim();
    let valid_until = row.valid_until.trim();

    if brand.is_empty() || code.is_empty() || valid_until.is_empty() {
        return Err(at_row(
            "ブランド・プロモコード・有効期限はすべて必須です".to_string(),
        ));
    }

    let brand = Brand::parse(brand).map_err(|_| at_row(format!("不明なブランドです: {brand}")))?;
    let code = PromoCodeValue::new(code).map_err(|e| at_row(e.to_string()))?;
    let valid_until = NaiveDate::parse_from_str(valid_until, DATE_FORMAT).map_err(|_| {
        at_row(format!(
            "有効期限の形式が不正です（YYYY-MM-DD）: {valid_until}"
        ))
    })?;

    Ok(NewPromoCode {
        brand,
        code,
        valid_until,
    })
}
