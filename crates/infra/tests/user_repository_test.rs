//! UserRepository の統合テスト

mod common;

use common::insert_user;
use promopool_domain::user::{UserId, UserRole};
use promopool_infra::repository::{PostgresUserRepository, UserRepository};
use sqlx::PgPool;

#[sqlx::test(migrations = "../../migrations")]
async fn test_ロールに応じて管理者判定する(pool: PgPool) {
    let repo = PostgresUserRepository::new(pool.clone());
    let cases = [
        ("user", false),
        ("coordinator", true),
        ("supervisor", true),
        ("superadmin", true),
    ];

    for (role, expected) in cases {
        let user_id = insert_user(&pool, role, role).await;
        assert_eq!(
            repo.is_admin(user_id).await.unwrap(),
            expected,
            "role = {role}"
        );
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_ロールを取得できる(pool: PgPool) {
    let user_id = insert_user(&pool, "管理者", "supervisor").await;
    let repo = PostgresUserRepository::new(pool);

    assert_eq!(
        repo.find_role(user_id).await.unwrap(),
        Some(UserRole::Supervisor)
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_存在しないユーザーは管理者ではない(pool: PgPool) {
    let repo = PostgresUserRepository::new(pool);

    assert!(!repo.is_admin(UserId::new(999_999)).await.unwrap());
    assert_eq!(repo.find_role(UserId::new(999_999)).await.unwrap(), None);
}
