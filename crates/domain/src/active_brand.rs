//! # 受付中ブランド（Active-Brand Window）
//!
//! 一般ユーザーがセルフサービスで請求できるブランドを、期限付きで 1 つに絞る設定。
//!
//! ## 不変条件
//!
//! - 同時に存在するウィンドウは最大 1 つ（シングルトン）
//! - 最後に設定したものが常に勝つ
//! - `expires_at` を過ぎたウィンドウ、または未設定の場合は全ブランドが請求可能
//!
//! ## 使用例
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use promopool_domain::{active_brand::ActiveBrandWindow, brand::Brand};
//!
//! let now = Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap();
//! let window = ActiveBrandWindow::open(Brand::Jet, Some(5), now);
//!
//! assert!(window.permits(Brand::Jet, now));
//! assert!(!window.permits(Brand::Bolt, now));
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::{DomainError, brand::Brand};

/// 日数未指定（または 0 以下）の場合の受付期間
pub const DEFAULT_ACTIVE_DAYS: i64 = 10;

/// 受付期間の上限日数
const MAX_ACTIVE_DAYS: i64 = 366;

/// 受付中ブランドのウィンドウ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActiveBrandWindow {
    brand:      Brand,
    expires_at: DateTime<Utc>,
}

impl ActiveBrandWindow {
    /// `now` から `days` 日間のウィンドウを開く
    ///
    /// `days` が未指定または 0 以下なら [`DEFAULT_ACTIVE_DAYS`]、
    /// 上限を超える場合は上限日数に切り詰める。
    pub fn open(brand: Brand, days: Option<i64>, now: DateTime<Utc>) -> Self {
        let days = match days {
            Some(d) if d > 0 => d.min(MAX_ACTIVE_DAYS),
            _ => DEFAULT_ACTIVE_DAYS,
        };
        Self {
            brand,
            expires_at: now + Duration::days(days),
        }
    }

    /// DB から復元する
    pub fn from_db(brand: Brand, expires_at: DateTime<Utc>) -> Self {
        Self { brand, expires_at }
    }

    pub fn brand(&self) -> Brand {
        self.brand
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// `now` 時点で有効か
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }

    /// `brand` の請求を許可するか
    ///
    /// 期限切れのウィンドウは何も制限しない。
    pub fn permits(&self, brand: Brand, now: DateTime<Utc>) -> bool {
        !self.is_active_at(now) || self.brand == brand
    }

    /// 請求ゲート
    ///
    /// # エラー
    ///
    /// 有効なウィンドウがあり、ブランドが異なる場合は `DomainError::Forbidden`。
    pub fn ensure_permits(
        window: Option<&Self>,
        brand: Brand,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        match window {
            Some(w) if !w.permits(brand, now) => Err(DomainError::Forbidden(format!(
                "現在受付中のブランドは {} のため、{} のプロモコードは請求できません",
                w.brand, brand
            ))),
            _ => Ok(()),
        }
    }
}
