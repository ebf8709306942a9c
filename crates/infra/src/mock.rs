//! # テスト用モックリポジトリ
//!
//! ユースケーステスト・ハンドラテストで使用するインメモリ実装。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! promopool-infra = { workspace = true, features = ["test-utils"] }
//! ```
//!
//! トランザクションは持たないため、書き込みは即座に反映され、
//! ロールバックしても戻らない。

use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use promopool_domain::{
    active_brand::ActiveBrandWindow,
    brand::Brand,
    claim::UserClaim,
    promo_code::{NewPromoCode, PromoCode, PromoCodeId, PromoCodeValue},
    stats::RemainingCount,
    user::{UserId, UserRole},
};

use crate::{
    db::{TransactionManager, TxContext},
    error::InfraError,
    repository::{
        ActiveBrandRepository,
        PromoClaimRepository,
        PromoCodeRepository,
        UserRepository,
    },
};

// ===== MockTransactionManager =====

/// `TxContext::mock()` を返す TransactionManager
pub struct MockTransactionManager;

#[async_trait]
impl TransactionManager for MockTransactionManager {
    async fn begin(&self) -> Result<TxContext, InfraError> {
        Ok(TxContext::mock())
    }
}

// ===== MockPromoCodeRepository =====

#[derive(Clone, Default)]
pub struct MockPromoCodeRepository {
    codes: Arc<Mutex<Vec<PromoCode>>>,
}

impl MockPromoCodeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 未割り当てのコードを追加する
    pub fn add_code(&self, brand: Brand, code: &str, valid_until: NaiveDate) {
        let mut codes = self.codes.lock().unwrap();
        let id = PromoCodeId::new(codes.len() as i64 + 1);
        codes.push(PromoCode::new(
            id,
            NewPromoCode {
                brand,
                code: PromoCodeValue::new(code).unwrap(),
                valid_until,
            },
            UserId::new(0),
        ));
    }

    /// 格納中の全コード（挿入順）
    pub fn all(&self) -> Vec<PromoCode> {
        self.codes.lock().unwrap().clone()
    }

    /// 払い出し対象の残数
    pub fn eligible_count(&self, brand: Brand, today: NaiveDate) -> usize {
        self.codes
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.brand() == brand && c.is_eligible(today))
            .count()
    }

    fn assign(codes: &mut [PromoCode], index: usize, user_id: UserId, now: DateTime<Utc>) {
        codes[index] = codes[index].clone().assign(user_id, now).unwrap();
    }
}

#[async_trait]
impl PromoCodeRepository for MockPromoCodeRepository {
    async fn claim_single(
        &self,
        _tx: &mut TxContext,
        brand: Brand,
        user_id: UserId,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Option<PromoCodeValue>, InfraError> {
        let mut codes = self.codes.lock().unwrap();
        let picked = codes
            .iter()
            .enumerate()
            .filter(|(_, c)| c.brand() == brand && c.is_eligible(today))
            .min_by_key(|(_, c)| (c.valid_until(), c.id()))
            .map(|(i, _)| i);

        Ok(picked.map(|i| {
            Self::assign(&mut codes, i, user_id, now);
            codes[i].code().clone()
        }))
    }

    async fn claim_pair(
        &self,
        _tx: &mut TxContext,
        brand: Brand,
        user_id: UserId,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Option<[PromoCodeValue; 2]>, InfraError> {
        let mut codes = self.codes.lock().unwrap();
        let mut by_date: BTreeMap<NaiveDate, Vec<usize>> = BTreeMap::new();
        for (i, c) in codes.iter().enumerate() {
            if c.brand() == brand && c.is_eligible(today) {
                by_date.entry(c.valid_until()).or_default().push(i);
            }
        }

        let Some(mut pair) = by_date.into_values().find(|ids| ids.len() >= 2) else {
            return Ok(None);
        };
        pair.sort_by_key(|&i| codes[i].id());
        let (first, second) = (pair[0], pair[1]);
        Self::assign(&mut codes, first, user_id, now);
        Self::assign(&mut codes, second, user_id, now);

        Ok(Some([codes[first].code().clone(), codes[second].code().clone()]))
    }

    async fn insert_batch(
        &self,
        _tx: &mut TxContext,
        new_codes: &[NewPromoCode],
        created_by: UserId,
        _now: DateTime<Utc>,
    ) -> Result<u64, InfraError> {
        let mut codes = self.codes.lock().unwrap();
        if let Some(dup) = new_codes
            .iter()
            .find(|n| codes.iter().any(|c| c.brand() == n.brand && c.code() == &n.code))
        {
            return Err(InfraError::conflict(
                "PromoCode",
                format!("{}/{}", dup.brand, dup.code),
            ));
        }
        for new_code in new_codes {
            let id = PromoCodeId::new(codes.len() as i64 + 1);
            codes.push(PromoCode::new(id, new_code.clone(), created_by));
        }
        Ok(new_codes.len() as u64)
    }

    async fn count_remaining(
        &self,
        today: NaiveDate,
        brand: Option<Brand>,
    ) -> Result<Vec<RemainingCount>, InfraError> {
        let mut counts: BTreeMap<(NaiveDate, Brand), i64> = BTreeMap::new();
        for c in self.codes.lock().unwrap().iter() {
            if c.is_eligible(today) && brand.is_none_or(|b| b == c.brand()) {
                *counts.entry((c.valid_until(), c.brand())).or_default() += 1;
            }
        }
        Ok(counts
            .into_iter()
            .map(|((valid_until, brand), count)| RemainingCount {
                valid_until,
                brand,
                count,
            })
            .collect())
    }

    async fn find_by_code(
        &self,
        brand: Brand,
        code: &PromoCodeValue,
    ) -> Result<Option<PromoCode>, InfraError> {
        Ok(self
            .codes
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.brand() == brand && c.code() == code)
            .cloned())
    }
}

// ===== MockActiveBrandRepository =====

#[derive(Clone, Default)]
pub struct MockActiveBrandRepository {
    window: Arc<Mutex<Option<ActiveBrandWindow>>>,
}

impl MockActiveBrandRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, window: ActiveBrandWindow) {
        *self.window.lock().unwrap() = Some(window);
    }

    /// 期限を問わず保存されているウィンドウ
    pub fn stored(&self) -> Option<ActiveBrandWindow> {
        *self.window.lock().unwrap()
    }
}

#[async_trait]
impl ActiveBrandRepository for MockActiveBrandRepository {
    async fn upsert(
        &self,
        _tx: &mut TxContext,
        window: &ActiveBrandWindow,
        _now: DateTime<Utc>,
    ) -> Result<(), InfraError> {
        self.set(*window);
        Ok(())
    }

    async fn clear(&self, _tx: &mut TxContext) -> Result<(), InfraError> {
        *self.window.lock().unwrap() = None;
        Ok(())
    }

    async fn find_active(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<ActiveBrandWindow>, InfraError> {
        Ok(self.stored().filter(|w| w.is_active_at(now)))
    }
}

// ===== MockPromoClaimRepository =====

#[derive(Clone, Default)]
pub struct MockPromoClaimRepository {
    claims: Arc<Mutex<HashMap<(UserId, Brand), UserClaim>>>,
    racing: Arc<Mutex<Vec<UserClaim>>>,
}

impl MockPromoClaimRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_claim(&self, claim: UserClaim) {
        self.claims
            .lock()
            .unwrap()
            .insert((claim.user_id(), claim.brand()), claim);
    }

    /// 同じ (ユーザー, ブランド) への並行リクエストをシミュレートする
    ///
    /// 次の `find` は `None` を返し、その直後に `claim` がコミットされた状態になる。
    pub fn add_racing_claim(&self, claim: UserClaim) {
        self.racing.lock().unwrap().push(claim);
    }

    pub fn count(&self) -> usize {
        self.claims.lock().unwrap().len()
    }
}

#[async_trait]
impl PromoClaimRepository for MockPromoClaimRepository {
    async fn find(&self, user_id: UserId, brand: Brand) -> Result<Option<UserClaim>, InfraError> {
        let mut racing = self.racing.lock().unwrap();
        if let Some(pos) = racing
            .iter()
            .position(|c| c.user_id() == user_id && c.brand() == brand)
        {
            self.add_claim(racing.remove(pos));
            return Ok(None);
        }
        Ok(self.claims.lock().unwrap().get(&(user_id, brand)).cloned())
    }

    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<UserClaim>, InfraError> {
        let mut claims: Vec<UserClaim> = self
            .claims
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.user_id() == user_id)
            .cloned()
            .collect();
        claims.sort_by_key(|c| c.brand().as_str());
        Ok(claims)
    }

    async fn insert_if_absent(
        &self,
        _tx: &mut TxContext,
        claim: &UserClaim,
    ) -> Result<bool, InfraError> {
        let mut claims = self.claims.lock().unwrap();
        let key = (claim.user_id(), claim.brand());
        if claims.contains_key(&key) {
            return Ok(false);
        }
        claims.insert(key, claim.clone());
        Ok(true)
    }
}

// ===== MockUserRepository =====

#[derive(Clone, Default)]
pub struct MockUserRepository {
    roles: Arc<Mutex<HashMap<UserId, UserRole>>>,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, user_id: UserId, role: UserRole) {
        self.roles.lock().unwrap().insert(user_id, role);
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn find_role(&self, user_id: UserId) -> Result<Option<UserRole>, InfraError> {
        Ok(self.roles.lock().unwrap().get(&user_id).copied())
    }
}
