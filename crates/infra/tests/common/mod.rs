//! テスト共通フィクスチャ
//!
//! DB を使用する統合テストで共通利用する日付定数とシードデータ投入ヘルパー。
//! Rust の統合テスト規約に従い `tests/common/mod.rs` に配置。

// 各テストファイルが独立したクレートとしてコンパイルされるため、
// 使用しない関数に dead_code 警告が出る。モジュール全体で抑制する。
#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use promopool_domain::{brand::Brand, user::UserId};
use sqlx::PgPool;

/// テスト用の固定日時（2026-04-01 09:00 UTC）
pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).unwrap()
}

/// `test_now()` の日付
pub fn today() -> NaiveDate {
    test_now().date_naive()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// 取り込みを行った管理者 ID
pub fn admin_id() -> UserId {
    UserId::new(1)
}

/// 未割り当てのコードを直接 SQL で挿入する
pub async fn insert_code(pool: &PgPool, brand: Brand, code: &str, valid_until: NaiveDate) -> i64 {
    sqlx::query_scalar(
        r#"
        INSERT INTO promo_codes (brand, promo_code, valid_until, created_by_admin_id)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(brand.as_str())
    .bind(code)
    .bind(valid_until)
    .bind(admin_id().as_i64())
    .fetch_one(pool)
    .await
    .expect("コード挿入に失敗")
}

/// 割り当て済みのユーザー ID（未割り当てなら `None`）
pub async fn owner_of(pool: &PgPool, brand: Brand, code: &str) -> Option<i64> {
    sqlx::query_scalar(
        "SELECT assigned_to_user_id FROM promo_codes WHERE brand = $1 AND promo_code = $2",
    )
    .bind(brand.as_str())
    .bind(code)
    .fetch_one(pool)
    .await
    .expect("コード取得に失敗")
}

/// promo_codes の総行数
pub async fn count_codes(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM promo_codes")
        .fetch_one(pool)
        .await
        .expect("件数取得に失敗")
}

/// 払い出し対象の残数
pub async fn count_eligible(pool: &PgPool, brand: Brand) -> i64 {
    sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM promo_codes
        WHERE brand = $1 AND assigned_to_user_id IS NULL AND valid_until >= $2
        "#,
    )
    .bind(brand.as_str())
    .bind(today())
    .fetch_one(pool)
    .await
    .expect("件数取得に失敗")
}

/// ユーザーを作成する
pub async fn insert_user(pool: &PgPool, name: &str, role: &str) -> UserId {
    let id: i64 = sqlx::query_scalar("INSERT INTO users (name, role) VALUES ($1, $2) RETURNING id")
        .bind(name)
        .bind(role)
        .fetch_one(pool)
        .await
        .expect("ユーザー作成に失敗");
    UserId::new(id)
}
