//! 残数集計ユースケース

use std::sync::Arc;

use promopool_domain::{clock::Clock, stats::PromoStats, user::UserId};
use promopool_infra::repository::{
    ActiveBrandRepository,
    PromoCodeRepository,
    UserRepository,
};

use crate::{error::ServiceError, usecase::ensure_admin};

pub struct StatsUseCaseImpl {
    code_repository:         Arc<dyn PromoCodeRepository>,
    active_brand_repository: Arc<dyn ActiveBrandRepository>,
    user_repository:         Arc<dyn UserRepository>,
    clock:                   Arc<dyn Clock>,
}

impl StatsUseCaseImpl {
    pub fn new(
        code_repository: Arc<dyn PromoCodeRepository>,
        active_brand_repository: Arc<dyn ActiveBrandRepository>,
        user_repository: Arc<dyn UserRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            code_repository,
            active_brand_repository,
            user_repository,
            clock,
        }
    }

    /// 払い出し可能な残数を集計する
    ///
    /// `active_only` が true かつ受付中ブランドがあれば、そのブランドに絞り込む。
    pub async fn get_stats(
        &self,
        admin_id: UserId,
        active_only: bool,
    ) -> Result<PromoStats, ServiceError> {
        ensure_admin(self.user_repository.as_ref(), admin_id).await?;

        let now = self.clock.now();
        let filter = if active_only {
            self.active_brand_repository
                .find_active(now)
                .await?
                .map(|w| w.brand())
        } else {
            None
        };

        let counts = self
            .code_repository
            .count_remaining(self.clock.today(), filter)
            .await?;

        Ok(PromoStats::from_counts(&counts, filter))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use promopool_domain::{
        active_brand::ActiveBrandWindow,
        brand::Brand,
        clock::FixedClock,
        user::UserRole,
    };
    use promopool_infra::mock::{
        MockActiveBrandRepository,
        MockPromoCodeRepository,
        MockUserRepository,
    };
    use rstest::rstest;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).unwrap()
    }

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, d).unwrap()
    }

    fn setup() -> (StatsUseCaseImpl, MockPromoCodeRepository, MockActiveBrandRepository) {
        let codes = MockPromoCodeRepository::new();
        let active = MockActiveBrandRepository::new();
        let users = MockUserRepository::new();
        users.add_user(UserId::new(1), UserRole::Superadmin);

        codes.add_code(Brand::Jet, "J1", date(5, 1));
        codes.add_code(Brand::Jet, "J2", date(5, 2));
        codes.add_code(Brand::Jet, "J-EXPIRED", date(3, 31));
        codes.add_code(Brand::Yandex, "Y1", date(5, 1));
        codes.add_code(Brand::Yandex, "Y2", date(5, 1));

        let usecase = StatsUseCaseImpl::new(
            Arc::new(codes.clone()),
            Arc::new(active.clone()),
            Arc::new(users),
            Arc::new(FixedClock::new(now())),
        );
        (usecase, codes, active)
    }

    #[tokio::test]
    async fn test_期限切れを除いてブランド別と日付別に集計する() {
        let (usecase, _, _) = setup();

        let stats = usecase.get_stats(UserId::new(1), true).await.unwrap();

        assert_eq!(
            stats.summary,
            BTreeMap::from([(Brand::Jet, 2), (Brand::Yandex, 2)])
        );
        assert_eq!(stats.by_date.len(), 2);
        assert_eq!(stats.by_date[0].valid_until, date(5, 1));
        assert_eq!(stats.filter_brand, None);
    }

    #[rstest]
    #[case(true, Some(Brand::Yandex), 2)]
    #[case(false, None, 4)]
    #[tokio::test]
    async fn test_active_onlyなら受付中ブランドに絞り込む(
        #[case] active_only: bool,
        #[case] expected_filter: Option<Brand>,
        #[case] expected_total: i64,
    ) {
        let (usecase, _, active) = setup();
        active.set(ActiveBrandWindow::open(Brand::Yandex, Some(3), now()));

        let stats = usecase
            .get_stats(UserId::new(1), active_only)
            .await
            .unwrap();

        assert_eq!(stats.filter_brand, expected_filter);
        assert_eq!(stats.total(), expected_total);
    }

    #[tokio::test]
    async fn test_集計はプールを変更しない() {
        let (usecase, codes, _) = setup();
        let before = codes.all();

        usecase.get_stats(UserId::new(1), false).await.unwrap();

        assert_eq!(codes.all(), before);
    }

    #[tokio::test]
    async fn test_管理者以外はforbidden() {
        let (usecase, _, _) = setup();

        let result = usecase.get_stats(UserId::new(2), false).await;

        assert!(matches!(result, Err(ServiceError::Forbidden(_))));
    }
}
