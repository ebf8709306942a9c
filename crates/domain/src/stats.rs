//! # 残数集計（Stats Aggregator）
//!
//! 未割り当てかつ有効期限内のプロモコード数を、ブランド別と
//! 有効期限別に集計したレポートモデル。集計クエリ自体はインフラ層が担い、
//! ここでは行データからレスポンス形を組み立てる。

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::brand::Brand;

/// 集計クエリの 1 行（有効期限, ブランド, 残数）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemainingCount {
    pub valid_until: NaiveDate,
    pub brand:       Brand,
    pub count:       i64,
}

/// 有効期限ごとの残数
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateStat {
    pub valid_until: NaiveDate,
    pub counts:      BTreeMap<Brand, i64>,
}

/// 残数レポート
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromoStats {
    /// ブランド → 残数
    pub summary:      BTreeMap<Brand, i64>,
    /// 有効期限の昇順
    pub by_date:      Vec<DateStat>,
    /// 適用したブランド絞り込み（なしなら `None`）
    pub filter_brand: Option<Brand>,
}

impl PromoStats {
    /// 集計行からレポートを組み立てる
    ///
    /// `filter_brand` が指定されていれば、そのブランド以外の行は無視する。
    pub fn from_counts(counts: &[RemainingCount], filter_brand: Option<Brand>) -> Self {
        let mut summary: BTreeMap<Brand, i64> = BTreeMap::new();
        let mut by_date: BTreeMap<NaiveDate, BTreeMap<Brand, i64>> = BTreeMap::new();

        for row in counts
            .iter()
            .filter(|row| filter_brand.is_none_or(|b| b == row.brand))
            .filter(|row| row.count > 0)
        {
            *summary.entry(row.brand).or_default() += row.count;
            *by_date
                .entry(row.valid_until)
                .or_default()
                .entry(row.brand)
                .or_default() += row.count;
        }

        Self {
            summary,
            by_date: by_date
                .into_iter()
                .map(|(valid_until, counts)| DateStat {
                    valid_until,
                    counts,
                })
                .collect(),
            filter_brand,
        }
    }

    /// 残数の総計
    pub fn total(&self) -> i64 {
        self.summary.values().sum()
    }
}
