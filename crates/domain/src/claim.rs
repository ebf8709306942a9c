//! # 払い出し記録（UserClaimCache）
//!
//! ユーザー × ブランドごとに、払い出し済みのコードを保持する。
//!
//! ## 不変条件
//!
//! - (ユーザー, ブランド) ごとに最大 1 件
//! - コードは 1 枚以上。ペアブランドは必ず 2 枚
//! - 一度作成したら変更しない。再請求時はこの記録をそのまま返す

use chrono::{DateTime, Utc};

use crate::{DomainError, brand::Brand, promo_code::PromoCodeValue, user::UserId};

/// 払い出し記録
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserClaim {
    user_id:    UserId,
    brand:      Brand,
    codes:      Vec<PromoCodeValue>,
    claimed_at: DateTime<Utc>,
}

impl UserClaim {
    /// 払い出し結果から記録を作成する
    ///
    /// # エラー
    ///
    /// 枚数がブランドの払い出し枚数と一致しない場合は `DomainError::Validation`。
    /// ペアブランドで 1 枚だけの記録は作れない。
    pub fn new(
        user_id: UserId,
        brand: Brand,
        codes: Vec<PromoCodeValue>,
        claimed_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if codes.len() != brand.claim_size() {
            return Err(DomainError::Validation(format!(
                "{} の払い出し枚数は {} 枚である必要があります（実際: {} 枚）",
                brand,
                brand.claim_size(),
                codes.len()
            )));
        }
        Ok(Self {
            user_id,
            brand,
            codes,
            claimed_at,
        })
    }

    /// DB から復元する
    ///
    /// 過去の記録は枚数検証をしない（取り込み仕様の変更前の記録も読めるように）。
    /// 空の記録は DB 制約で存在しない。
    pub fn from_db(
        user_id: UserId,
        brand: Brand,
        codes: Vec<PromoCodeValue>,
        claimed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            brand,
            codes,
            claimed_at,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn brand(&self) -> Brand {
        self.brand
    }

    pub fn codes(&self) -> &[PromoCodeValue] {
        &self.codes
    }

    pub fn claimed_at(&self) -> DateTime<Utc> {
        self.claimed_at
    }

    /// コード文字列のリスト
    pub fn code_strings(&self) -> Vec<String> {
        self.codes.iter().map(|c| c.as_str().to_string()).collect()
    }
}

/// 請求結果
///
/// `already_claimed` が true の場合、コードプールは一切変更されていない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimOutcome {
    pub claim:           UserClaim,
    pub already_claimed: bool,
}

impl ClaimOutcome {
    /// 新規に払い出した結果
    pub fn issued(claim: UserClaim) -> Self {
        Self {
            claim,
            already_claimed: false,
        }
    }

    /// 既存の記録を返した結果
    pub fn cached(claim: UserClaim) -> Self {
        Self {
            claim,
            already_claimed: true,
        }
    }
}
