//! 払い出しの並行実行テスト
//!
//! `tokio::spawn` で複数のトランザクションを同時に走らせ、
//! 同じコードが二重に払い出されないこと、ペアが分割されないことを検証する。
//!
//! 実行方法:
//! ```bash
//! DATABASE_URL=postgres://... cargo test -p promopool-infra --test claim_concurrency_test
//! ```

mod common;

use std::{collections::HashSet, sync::Arc};

use chrono::NaiveDate;
use common::{count_eligible, date, insert_code, test_now, today};
use promopool_domain::{brand::Brand, promo_code::PromoCodeValue, user::UserId};
use promopool_infra::{
    db::{PgTransactionManager, TransactionManager},
    repository::{PostgresPromoCodeRepository, PromoCodeRepository},
};
use sqlx::PgPool;

struct Harness {
    repo:       Arc<PostgresPromoCodeRepository>,
    tx_manager: Arc<PgTransactionManager>,
}

impl Harness {
    fn new(pool: &PgPool) -> Self {
        Self {
            repo:       Arc::new(PostgresPromoCodeRepository::new(pool.clone())),
            tx_manager: Arc::new(PgTransactionManager::new(pool.clone())),
        }
    }

    /// `n` 人が同時に 1 枚ずつ請求する
    async fn claim_single_concurrently(&self, brand: Brand, n: i64) -> Vec<Option<PromoCodeValue>> {
        let handles: Vec<_> = (1..=n)
            .map(|user| {
                let repo = self.repo.clone();
                let tx_manager = self.tx_manager.clone();
                tokio::spawn(async move {
                    let mut tx = tx_manager.begin().await.unwrap();
                    let code = repo
                        .claim_single(&mut tx, brand, UserId::new(user), today(), test_now())
                        .await
                        .unwrap();
                    tx.commit().await.unwrap();
                    code
                })
            })
            .collect();

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }
        results
    }

    /// `n` 人が同時にペアを請求する
    async fn claim_pair_concurrently(&self, n: i64) -> Vec<Option<[PromoCodeValue; 2]>> {
        let handles: Vec<_> = (1..=n)
            .map(|user| {
                let repo = self.repo.clone();
                let tx_manager = self.tx_manager.clone();
                tokio::spawn(async move {
                    let mut tx = tx_manager.begin().await.unwrap();
                    let pair = repo
                        .claim_pair(&mut tx, Brand::Yandex, UserId::new(user), today(), test_now())
                        .await
                        .unwrap();
                    tx.commit().await.unwrap();
                    pair
                })
            })
            .collect();

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }
        results
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_残数より多い同時請求では残数分だけ成功し重複しない(pool: PgPool) {
    for c in ["J1", "J2", "J3"] {
        insert_code(&pool, Brand::Jet, c, date(2026, 5, 1)).await;
    }
    let harness = Harness::new(&pool);

    let results = harness.claim_single_concurrently(Brand::Jet, 8).await;

    let issued: Vec<String> = results
        .iter()
        .flatten()
        .map(|c| c.as_str().to_string())
        .collect();
    let distinct: HashSet<&String> = issued.iter().collect();
    assert_eq!(issued.len(), 3, "成功数は残数と一致する: {results:?}");
    assert_eq!(distinct.len(), 3, "同じコードは二度払い出されない");
    assert_eq!(results.iter().filter(|r| r.is_none()).count(), 5);
    assert_eq!(count_eligible(&pool, Brand::Jet).await, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_同時のペア請求は同じ日付の2枚ずつを重複なく受け取る(pool: PgPool) {
    for (c, d) in [
        ("Y1", date(2026, 5, 1)),
        ("Y2", date(2026, 5, 1)),
        ("Y3", date(2026, 5, 2)),
        ("Y4", date(2026, 5, 2)),
        ("Y5", date(2026, 5, 3)),
        ("Y6", date(2026, 5, 3)),
    ] {
        insert_code(&pool, Brand::Yandex, c, d).await;
    }
    let harness = Harness::new(&pool);

    let results = harness.claim_pair_concurrently(4).await;

    let pairs: Vec<&[PromoCodeValue; 2]> = results.iter().flatten().collect();
    let mut seen = HashSet::new();
    for pair in &pairs {
        for c in pair.iter() {
            assert!(seen.insert(c.as_str().to_string()), "重複払い出し: {c}");
        }
        let dates: Vec<NaiveDate> = sqlx::query_scalar(
            "SELECT valid_until FROM promo_codes WHERE brand = 'YANDEX' AND promo_code = ANY($1)",
        )
        .bind(vec![pair[0].as_str(), pair[1].as_str()])
        .fetch_all(&pool)
        .await
        .unwrap();
        assert_eq!(dates[0], dates[1], "ペアの有効期限は一致する: {pair:?}");
    }

    // 割り当て済み数は常に偶数（1 枚だけの割り当ては残らない）
    let assigned: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM promo_codes WHERE brand = 'YANDEX' AND assigned_to_user_id IS NOT NULL",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(assigned % 2, 0);
    assert_eq!(assigned, pairs.len() as i64 * 2);
}
