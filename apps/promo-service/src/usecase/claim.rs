//! 払い出しユースケース
//!
//! ## 処理順序
//!
//! 1. **ゲート**: 受付中ブランドが設定されていて、請求ブランドと異なれば拒否
//! 2. **冪等チェック**: 払い出し記録があれば、それを `already_claimed = true` で返す
//! 3. **割り当て**: 1 つのトランザクション内でコードを割り当て、記録を書き込む
//!
//! 同じユーザーの同じブランドへの請求が並行した場合、記録の書き込みで負けた側は
//! 割り当てをロールバックし（コードはプールに戻る）、勝った側の記録を返す。

use std::sync::Arc;

use promopool_domain::{
    DomainError,
    active_brand::ActiveBrandWindow,
    brand::Brand,
    claim::{ClaimOutcome, UserClaim},
    clock::Clock,
    promo_code::PromoCodeValue,
    user::UserId,
};
use promopool_infra::{
    TransactionManager,
    TxContext,
    repository::{ActiveBrandRepository, PromoClaimRepository, PromoCodeRepository},
};

use crate::error::ServiceError;

/// 払い出しユースケース
pub struct ClaimUseCaseImpl {
    code_repository:         Arc<dyn PromoCodeRepository>,
    claim_repository:        Arc<dyn PromoClaimRepository>,
    active_brand_repository: Arc<dyn ActiveBrandRepository>,
    tx_manager:              Arc<dyn TransactionManager>,
    clock:                   Arc<dyn Clock>,
}

impl ClaimUseCaseImpl {
    pub fn new(
        code_repository: Arc<dyn PromoCodeRepository>,
        claim_repository: Arc<dyn PromoClaimRepository>,
        active_brand_repository: Arc<dyn ActiveBrandRepository>,
        tx_manager: Arc<dyn TransactionManager>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            code_repository,
            claim_repository,
            active_brand_repository,
            tx_manager,
            clock,
        }
    }

    /// ブランドのコードを請求する
    ///
    /// # エラー
    ///
    /// - 受付中ブランドと異なる: `Forbidden`
    /// - 払い出せるコード（ペア）がない: `Exhausted`
    #[tracing::instrument(skip(self), fields(%user_id, %brand))]
    pub async fn claim(&self, user_id: UserId, brand: Brand) -> Result<ClaimOutcome, ServiceError> {
        let now = self.clock.now();

        let window = self.active_brand_repository.find_active(now).await?;
        ActiveBrandWindow::ensure_permits(window.as_ref(), brand, now)?;

        if let Some(existing) = self.claim_repository.find(user_id, brand).await? {
            tracing::info!("払い出し済みの記録を返却");
            return Ok(ClaimOutcome::cached(existing));
        }

        let mut tx = self.tx_manager.begin().await?;

        let Some(codes) = self.allocate(&mut tx, brand, user_id).await? else {
            tx.rollback().await?;
            tracing::warn!("払い出せるプロモコードがありません");
            return Err(DomainError::Exhausted(exhausted_message(brand)).into());
        };

        let claim = UserClaim::new(user_id, brand, codes, now)
            .map_err(|e| ServiceError::Internal(format!("払い出し枚数の不整合: {e}")))?;

        if !self.claim_repository.insert_if_absent(&mut tx, &claim).await? {
            // 同じ請求が先にコミットされた。割り当てを戻して先の記録を返す
            tx.rollback().await?;
            let existing = self
                .claim_repository
                .find(user_id, brand)
                .await?
                .ok_or_else(|| {
                    ServiceError::Internal("競合した払い出し記録が見つかりません".to_string())
                })?;
            tracing::info!("並行した請求の記録を返却");
            return Ok(ClaimOutcome::cached(existing));
        }

        tx.commit().await?;
        tracing::info!(count = claim.codes().len(), "プロモコードを払い出しました");

        Ok(ClaimOutcome::issued(claim))
    }

    /// ユーザーの払い出し記録を全ブランド分取得する
    pub async fn list_claims(&self, user_id: UserId) -> Result<Vec<UserClaim>, ServiceError> {
        Ok(self.claim_repository.find_by_user(user_id).await?)
    }

    async fn allocate(
        &self,
        tx: &mut TxContext,
        brand: Brand,
        user_id: UserId,
    ) -> Result<Option<Vec<PromoCodeValue>>, ServiceError> {
        let today = self.clock.today();
        let now = self.clock.now();

        let codes = if brand.is_paired() {
            self.code_repository
                .claim_pair(tx, brand, user_id, today, now)
                .await?
                .map(Vec::from)
        } else {
            self.code_repository
                .claim_single(tx, brand, user_id, today, now)
                .await?
                .map(|code| vec![code])
        };
        Ok(codes)
    }
}

fn exhausted_message(brand: Brand) -> String {
    if brand.is_paired() {
        format!("{brand} は同じ有効期限の 2 枚組で払い出せるプロモコードがありません")
    } else {
        format!("{brand} の払い出せるプロモコードがありません")
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use promopool_domain::clock::FixedClock;
    use promopool_infra::mock::{
        MockActiveBrandRepository,
        MockPromoClaimRepository,
        MockPromoCodeRepository,
        MockTransactionManager,
    };

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).unwrap()
    }

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, d).unwrap()
    }

    struct Fixture {
        codes:  MockPromoCodeRepository,
        claims: MockPromoClaimRepository,
        active: MockActiveBrandRepository,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                codes:  MockPromoCodeRepository::new(),
                claims: MockPromoClaimRepository::new(),
                active: MockActiveBrandRepository::new(),
            }
        }

        fn usecase(&self) -> ClaimUseCaseImpl {
            ClaimUseCaseImpl::new(
                Arc::new(self.codes.clone()),
                Arc::new(self.claims.clone()),
                Arc::new(self.active.clone()),
                Arc::new(MockTransactionManager),
                Arc::new(FixedClock::new(now())),
            )
        }
    }

    fn strings(outcome: &ClaimOutcome) -> Vec<String> {
        outcome.claim.code_strings()
    }

    #[tokio::test]
    async fn test_単発ブランドは1枚を払い出し記録する() {
        let f = Fixture::new();
        f.codes.add_code(Brand::Jet, "J-LATE", date(6, 1));
        f.codes.add_code(Brand::Jet, "J-EARLY", date(5, 1));
        let user = UserId::new(10);

        let outcome = f.usecase().claim(user, Brand::Jet).await.unwrap();

        assert!(!outcome.already_claimed);
        assert_eq!(strings(&outcome), vec!["J-EARLY"]);
        assert_eq!(f.claims.count(), 1);
    }

    #[tokio::test]
    async fn test_ペアブランドは同じ有効期限の2枚を払い出す() {
        let f = Fixture::new();
        f.codes.add_code(Brand::Yandex, "Y-SOLO", date(5, 1));
        f.codes.add_code(Brand::Yandex, "Y1", date(5, 2));
        f.codes.add_code(Brand::Yandex, "Y2", date(5, 2));

        let outcome = f
            .usecase()
            .claim(UserId::new(10), Brand::Yandex)
            .await
            .unwrap();

        assert_eq!(strings(&outcome), vec!["Y1", "Y2"]);
    }

    #[tokio::test]
    async fn test_2回目の請求は同じコードをalready_claimedで返しプールを変えない() {
        let f = Fixture::new();
        for c in ["J1", "J2", "J3"] {
            f.codes.add_code(Brand::Jet, c, date(5, 1));
        }
        let usecase = f.usecase();
        let user = UserId::new(10);

        let first = usecase.claim(user, Brand::Jet).await.unwrap();
        let remaining = f.codes.eligible_count(Brand::Jet, now().date_naive());
        let second = usecase.claim(user, Brand::Jet).await.unwrap();

        assert!(second.already_claimed);
        assert_eq!(second.claim, first.claim);
        assert_eq!(
            f.codes.eligible_count(Brand::Jet, now().date_naive()),
            remaining
        );
    }

    #[tokio::test]
    async fn test_在庫がなければexhausted() {
        let f = Fixture::new();
        f.codes.add_code(Brand::Bolt, "B-EXPIRED", date(3, 31));

        let result = f.usecase().claim(UserId::new(10), Brand::Bolt).await;

        assert!(matches!(result, Err(ServiceError::Exhausted(_))));
        assert_eq!(f.claims.count(), 0);
    }

    #[tokio::test]
    async fn test_ペアが揃わなければexhaustedで1枚も払い出さない() {
        let f = Fixture::new();
        f.codes.add_code(Brand::Yandex, "Y1", date(5, 1));
        f.codes.add_code(Brand::Yandex, "Y2", date(5, 2));

        let result = f.usecase().claim(UserId::new(10), Brand::Yandex).await;

        assert!(matches!(result, Err(ServiceError::Exhausted(_))));
        assert_eq!(f.codes.eligible_count(Brand::Yandex, now().date_naive()), 2);
    }

    #[tokio::test]
    async fn test_受付中ブランドと異なる請求はforbiddenでプールに触れない() {
        let f = Fixture::new();
        f.codes.add_code(Brand::Bolt, "B1", date(5, 1));
        f.active
            .set(ActiveBrandWindow::open(Brand::Jet, Some(5), now()));

        let result = f.usecase().claim(UserId::new(10), Brand::Bolt).await;

        assert!(matches!(result, Err(ServiceError::Forbidden(_))));
        assert_eq!(f.codes.eligible_count(Brand::Bolt, now().date_naive()), 1);
    }

    #[tokio::test]
    async fn test_受付中ブランドと同じ請求は払い出す() {
        let f = Fixture::new();
        f.codes.add_code(Brand::Jet, "J1", date(5, 1));
        f.active
            .set(ActiveBrandWindow::open(Brand::Jet, Some(5), now()));

        let outcome = f.usecase().claim(UserId::new(10), Brand::Jet).await.unwrap();

        assert_eq!(strings(&outcome), vec!["J1"]);
    }

    #[tokio::test]
    async fn test_期限切れのウィンドウは請求を制限しない() {
        let f = Fixture::new();
        f.codes.add_code(Brand::Bolt, "B1", date(5, 1));
        let past = now() - chrono::Duration::days(30);
        f.active.set(ActiveBrandWindow::open(Brand::Jet, Some(5), past));

        let outcome = f.usecase().claim(UserId::new(10), Brand::Bolt).await.unwrap();

        assert_eq!(strings(&outcome), vec!["B1"]);
    }

    #[tokio::test]
    async fn test_ゲートは払い出し記録より先に判定する() {
        let f = Fixture::new();
        let user = UserId::new(10);
        f.claims.add_claim(
            UserClaim::new(
                user,
                Brand::Bolt,
                vec![PromoCodeValue::new("B-OLD").unwrap()],
                now(),
            )
            .unwrap(),
        );
        f.active
            .set(ActiveBrandWindow::open(Brand::Jet, Some(5), now()));

        let result = f.usecase().claim(user, Brand::Bolt).await;

        assert!(matches!(result, Err(ServiceError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_並行した同じ請求に負けたら先の記録を返す() {
        let f = Fixture::new();
        f.codes.add_code(Brand::Jet, "J1", date(5, 1));
        f.codes.add_code(Brand::Jet, "J2", date(5, 1));
        let user = UserId::new(10);
        let winner = UserClaim::new(
            user,
            Brand::Jet,
            vec![PromoCodeValue::new("J-WINNER").unwrap()],
            now(),
        )
        .unwrap();
        f.claims.add_racing_claim(winner.clone());

        let outcome = f.usecase().claim(user, Brand::Jet).await.unwrap();

        assert!(outcome.already_claimed);
        assert_eq!(outcome.claim, winner);
    }

    #[tokio::test]
    async fn test_払い出し記録を全ブランド分取得する() {
        let f = Fixture::new();
        f.codes.add_code(Brand::Jet, "J1", date(5, 1));
        f.codes.add_code(Brand::Yandex, "Y1", date(5, 1));
        f.codes.add_code(Brand::Yandex, "Y2", date(5, 1));
        let usecase = f.usecase();
        let user = UserId::new(10);
        usecase.claim(user, Brand::Jet).await.unwrap();
        usecase.claim(user, Brand::Yandex).await.unwrap();

        let claims = usecase.list_claims(user).await.unwrap();

        let brands: Vec<Brand> = claims.iter().map(UserClaim::brand).collect();
        assert_eq!(brands, vec![Brand::Jet, Brand::Yandex]);
        assert!(usecase.list_claims(UserId::new(99)).await.unwrap().is_empty());
    }
}
