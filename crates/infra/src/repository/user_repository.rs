//! # UserRepository
//!
//! 管理者判定のためにユーザーのロールだけを参照する。
//! ユーザーの作成・更新は外部の認証サービスの責務。

use async_trait::async_trait;
use promopool_domain::user::{UserId, UserRole};
use sqlx::PgPool;

use crate::error::InfraError;

/// ユーザーリポジトリトレイト
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// ユーザーのロールを取得する（存在しなければ `None`）
    async fn find_role(&self, user_id: UserId) -> Result<Option<UserRole>, InfraError>;

    /// 管理者か
    ///
    /// 存在しないユーザーは管理者ではない。
    async fn is_admin(&self, user_id: UserId) -> Result<bool, InfraError> {
        Ok(self
            .find_role(user_id)
            .await?
            .is_some_and(|role| role.is_admin()))
    }
}

/// PostgreSQL 実装の UserRepository
#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_role(&self, user_id: UserId) -> Result<Option<UserRole>, InfraError> {
        let role: Option<String> = sqlx::query_scalar("SELECT role FROM users WHERE id = $1")
            .bind(user_id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        role.map(|r| {
            r.parse::<UserRole>()
                .map_err(|_| InfraError::unexpected(format!("不正なロール値: {r}")))
        })
        .transpose()
    }
}
