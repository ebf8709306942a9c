//! # プロモコード
//!
//! コードプールに格納される 1 枚のコードを表すエンティティ。
//!
//! ## ライフサイクル
//!
//! ```text
//! 取り込み（未割り当て） ──払い出し──→ 割り当て済み（終端）
//! ```
//!
//! - 行を作るのは取り込み処理のみ
//! - 状態を変えるのは払い出し処理のみ（1 回だけ）
//! - 通常運用では削除しない
//!
//! ## 不変条件
//!
//! - `assigned_to` が一度設定されたら、解除・再割り当てされない
//! - `assigned_to` と `claimed_at` は常に同時に設定される
//! - 払い出し対象（eligible）は「未割り当て かつ `valid_until >= 今日`」

use chrono::{DateTime, NaiveDate, Utc};

use crate::{DomainError, brand::Brand, user::UserId};

define_i64_id! {
    /// プロモコード ID（`promo_codes.id`）
    pub struct PromoCodeId;
}

define_validated_string! {
    /// コード文字列（値オブジェクト）
    ///
    /// パートナーが発行した割引コードそのもの。
    ///
    /// # バリデーション
    ///
    /// - 空文字列ではない（前後空白は除去）
    /// - 最大 255 文字
    pub struct PromoCodeValue {
        label: "プロモコード",
        max_length: 255,
    }
}

/// 取り込み時に挿入する新規コード
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPromoCode {
    pub brand:       Brand,
    pub code:        PromoCodeValue,
    pub valid_until: NaiveDate,
}

/// プロモコードエンティティ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromoCode {
    id:          PromoCodeId,
    brand:       Brand,
    code:        PromoCodeValue,
    valid_until: NaiveDate,
    assigned_to: Option<UserId>,
    claimed_at:  Option<DateTime<Utc>>,
    created_by:  UserId,
}

impl PromoCode {
    /// 取り込み直後（未割り当て）のコードを作成する
    pub fn new(id: PromoCodeId, new_code: NewPromoCode, created_by: UserId) -> Self {
        Self {
            id,
            brand: new_code.brand,
            code: new_code.code,
            valid_until: new_code.valid_until,
            assigned_to: None,
            claimed_at: None,
            created_by,
        }
    }

    /// DB から復元する
    pub fn from_db(
        id: PromoCodeId,
        brand: Brand,
        code: PromoCodeValue,
        valid_until: NaiveDate,
        assigned_to: Option<UserId>,
        claimed_at: Option<DateTime<Utc>>,
        created_by: UserId,
    ) -> Self {
        Self {
            id,
            brand,
            code,
            valid_until,
            assigned_to,
            claimed_at,
            created_by,
        }
    }

    pub fn id(&self) -> PromoCodeId {
        self.id
    }

    pub fn brand(&self) -> Brand {
        self.brand
    }

    pub fn code(&self) -> &PromoCodeValue {
        &self.code
    }

    pub fn valid_until(&self) -> NaiveDate {
        self.valid_until
    }

    pub fn assigned_to(&self) -> Option<UserId> {
        self.assigned_to
    }

    pub fn claimed_at(&self) -> Option<DateTime<Utc>> {
        self.claimed_at
    }

    pub fn created_by(&self) -> UserId {
        self.created_by
    }

    /// 払い出し対象か
    pub fn is_eligible(&self, today: NaiveDate) -> bool {
        self.assigned_to.is_none() && self.valid_until >= today
    }

    /// ユーザーに割り当てる
    ///
    /// # エラー
    ///
    /// 既に割り当て済みのコードは `DomainError::Validation`（終端状態）。
    pub fn assign(self, user_id: UserId, now: DateTime<Utc>) -> Result<Self, DomainError> {
        if let Some(owner) = self.assigned_to {
            return Err(DomainError::Validation(format!(
                "プロモコード {} は既にユーザー {} に割り当て済みです",
                self.id, owner
            )));
        }
        Ok(Self {
            assigned_to: Some(user_id),
            claimed_at: Some(now),
            ..self
        })
    }
}
