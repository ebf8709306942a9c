//! # Promo Service 設定
//!
//! 環境変数から Promo Service サーバーの設定を読み込む。

use std::env;

use thiserror::Error;

/// 設定読み込みエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// 必須の環境変数が未設定
    #[error("{0} が設定されていません")]
    Missing(&'static str),

    /// 値を解釈できない
    #[error("{name} の値が不正です: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Promo Service サーバーの設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// バインドアドレス
    pub host: String,
    /// ポート番号
    pub port: u16,
    /// データベース接続 URL
    pub database_url: String,
    /// 接続プールの最大接続数
    pub database_max_connections: u32,
    /// 起動時にマイグレーションを適用するか
    pub run_migrations: bool,
}

impl ServiceConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 任意の参照関数から設定を読み込む
    ///
    /// テストでプロセスの環境変数を書き換えずに済むよう分離している。
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::Missing(name));

        Ok(Self {
            host: lookup("PROMO_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse("PROMO_PORT", required("PROMO_PORT")?)?,
            database_url: required("DATABASE_URL")?,
            database_max_connections: lookup("DATABASE_MAX_CONNECTIONS")
                .map(|v| parse("DATABASE_MAX_CONNECTIONS", v))
                .transpose()?
                .unwrap_or(10),
            run_migrations: lookup("RUN_MIGRATIONS")
                .map(|v| parse_bool("RUN_MIGRATIONS", v))
                .transpose()?
                .unwrap_or(true),
        })
    }
}

fn parse<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}

fn parse_bool(name: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::Invalid { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ServiceConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_必須項目のみでデフォルト値が入る() {
        let config = load(&[("PROMO_PORT", "3100"), ("DATABASE_URL", "postgres://db")]).unwrap();

        assert_eq!(
            config,
            ServiceConfig {
                host: "0.0.0.0".to_string(),
                port: 3100,
                database_url: "postgres://db".to_string(),
                database_max_connections: 10,
                run_migrations: true,
            }
        );
    }

    #[test]
    fn test_任意項目を上書きできる() {
        let config = load(&[
            ("PROMO_HOST", "127.0.0.1"),
            ("PROMO_PORT", "8080"),
            ("DATABASE_URL", "postgres://db"),
            ("DATABASE_MAX_CONNECTIONS", "32"),
            ("RUN_MIGRATIONS", "false"),
        ])
        .unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.database_max_connections, 32);
        assert!(!config.run_migrations);
    }

    #[test]
    fn test_必須項目がなければmissing() {
        assert_eq!(
            load(&[("DATABASE_URL", "postgres://db")]),
            Err(ConfigError::Missing("PROMO_PORT"))
        );
        assert_eq!(
            load(&[("PROMO_PORT", "3100")]),
            Err(ConfigError::Missing("DATABASE_URL"))
        );
    }

    #[test]
    fn test_不正な値はinvalid() {
        assert_eq!(
            load(&[("PROMO_PORT", "http"), ("DATABASE_URL", "postgres://db")]),
            Err(ConfigError::Invalid {
                name:  "PROMO_PORT",
                value: "http".to_string(),
            })
        );
        assert!(matches!(
            load(&[
                ("PROMO_PORT", "3100"),
                ("DATABASE_URL", "postgres://db"),
                ("RUN_MIGRATIONS", "maybe"),
            ]),
            Err(ConfigError::Invalid {
                name: "RUN_MIGRATIONS",
                ..
            })
        ));
    }
}
