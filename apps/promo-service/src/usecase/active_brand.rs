//! 受付中ブランドユースケース
//!
//! 設定は固定キーへの upsert なので、最後の設定が常に勝つ。

use std::sync::Arc;

use promopool_domain::{
    active_brand::ActiveBrandWindow,
    brand::Brand,
    clock::Clock,
    user::UserId,
};
use promopool_infra::{
    TransactionManager,
    repository::{ActiveBrandRepository, UserRepository},
};

use crate::{error::ServiceError, usecase::ensure_admin};

pub struct ActiveBrandUseCaseImpl {
    active_brand_repository: Arc<dyn ActiveBrandRepository>,
    user_repository:         Arc<dyn UserRepository>,
    tx_manager:              Arc<dyn TransactionManager>,
    clock:                   Arc<dyn Clock>,
}

impl ActiveBrandUseCaseImpl {
    pub fn new(
        active_brand_repository: Arc<dyn ActiveBrandRepository>,
        user_repository: Arc<dyn UserRepository>,
        tx_manager: Arc<dyn TransactionManager>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            active_brand_repository,
            user_repository,
            tx_manager,
            clock,
        }
    }

    /// 受付中ブランドを設定する
    ///
    /// `days` が未指定または 0 以下なら既定の日数。
    #[tracing::instrument(skip(self), fields(%admin_id, %brand))]
    pub async fn set(
        &self,
        admin_id: UserId,
        brand: Brand,
        days: Option<i64>,
    ) -> Result<ActiveBrandWindow, ServiceError> {
        ensure_admin(self.user_repository.as_ref(), admin_id).await?;

        let now = self.clock.now();
        let window = ActiveBrandWindow::open(brand, days, now);

        let mut tx = self.tx_manager.begin().await?;
        self.active_brand_repository
            .upsert(&mut tx, &window, now)
            .await?;
        tx.commit().await?;

        tracing::info!(expires_at = %window.expires_at(), "受付中ブランドを設定しました");
        Ok(window)
    }

    /// 受付中ブランドを解除する（未設定でも成功）
    #[tracing::instrument(skip(self), fields(%admin_id))]
    pub async fn clear(&self, admin_id: UserId) -> Result<(), ServiceError> {
        ensure_admin(self.user_repository.as_ref(), admin_id).await?;

        let mut tx = self.tx_manager.begin().await?;
        self.active_brand_repository.clear(&mut tx).await?;
        tx.commit().await?;

        tracing::info!("受付中ブランドを解除しました");
        Ok(())
    }

    /// 有効な受付中ブランドを取得する（未設定・期限切れなら `None`）
    pub async fn get(&self, admin_id: UserId) -> Result<Option<ActiveBrandWindow>, ServiceError> {
        ensure_admin(self.user_repository.as_ref(), admin_id).await?;

        Ok(self
            .active_brand_repository
            .find_active(self.clock.now())
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use promopool_domain::{active_brand::DEFAULT_ACTIVE_DAYS, clock::FixedClock, user::UserRole};
    use promopool_infra::mock::{
        MockActiveBrandRepository,
        MockTransactionManager,
        MockUserRepository,
    };

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).unwrap()
    }

    fn setup() -> (ActiveBrandUseCaseImpl, MockActiveBrandRepository) {
        let repo = MockActiveBrandRepository::new();
        let users = MockUserRepository::new();
        users.add_user(UserId::new(1), UserRole::Superadmin);
        users.add_user(UserId::new(2), UserRole::User);

        let usecase = ActiveBrandUseCaseImpl::new(
            Arc::new(repo.clone()),
            Arc::new(users),
            Arc::new(MockTransactionManager),
            Arc::new(FixedClock::new(now())),
        );
        (usecase, repo)
    }

    #[tokio::test]
    async fn test_設定した受付中ブランドを取得できる() {
        let (usecase, _) = setup();
        let admin = UserId::new(1);

        let window = usecase.set(admin, Brand::Jet, Some(5)).await.unwrap();

        assert_eq!(window.expires_at(), now() + Duration::days(5));
        assert_eq!(usecase.get(admin).await.unwrap(), Some(window));
    }

    #[tokio::test]
    async fn test_日数未指定なら既定の日数で設定する() {
        let (usecase, repo) = setup();

        usecase.set(UserId::new(1), Brand::Bolt, None).await.unwrap();

        assert_eq!(
            repo.stored().unwrap().expires_at(),
            now() + Duration::days(DEFAULT_ACTIVE_DAYS)
        );
    }

    #[tokio::test]
    async fn test_後から設定したブランドが勝つ() {
        let (usecase, _) = setup();
        let admin = UserId::new(1);

        usecase.set(admin, Brand::Jet, Some(5)).await.unwrap();
        usecase.set(admin, Brand::Whoosh, Some(2)).await.unwrap();

        let active = usecase.get(admin).await.unwrap().unwrap();
        assert_eq!(active.brand(), Brand::Whoosh);
    }

    #[tokio::test]
    async fn test_解除後はnoneを返す() {
        let (usecase, _) = setup();
        let admin = UserId::new(1);
        usecase.set(admin, Brand::Jet, Some(5)).await.unwrap();

        usecase.clear(admin).await.unwrap();

        assert_eq!(usecase.get(admin).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_期限切れのウィンドウはnoneを返す() {
        let (usecase, repo) = setup();
        repo.set(ActiveBrandWindow::open(
            Brand::Jet,
            Some(1),
            now() - Duration::days(2),
        ));

        assert_eq!(usecase.get(UserId::new(1)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_管理者以外の操作はforbiddenで状態を変えない() {
        let (usecase, repo) = setup();
        let member = UserId::new(2);

        assert!(matches!(
            usecase.set(member, Brand::Jet, Some(5)).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            usecase.clear(member).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            usecase.get(member).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert_eq!(repo.stored(), None);
    }
}
