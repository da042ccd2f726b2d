use std::env;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {name}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    /// 未设置时使用内存存储
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_expiration_secs: i64,
    pub catalogue_url: String,
    pub catalogue_timeout_secs: u64,
    pub server_host: String,
    pub server_port: u16,
    pub environment: String,
    pub cors_origin: String,
    pub bcrypt_cost: u32,
    pub starting_balance: Decimal,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let jwt_expiration_secs = parse_var("JWT_EXPIRATION", "3h", expiration_secs)?;

        Ok(Config {
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            jwt_secret: required("JWT_SECRET")?,
            jwt_expiration_secs,
            catalogue_url: required("CATALOGUE_URL")?,
            catalogue_timeout_secs: parse_var("CATALOGUE_TIMEOUT_SECS", "5", |raw| {
                raw.parse::<u64>().ok().filter(|secs| *secs > 0)
            })?,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            server_port: parse_var("SERVER_PORT", "4000", |raw| raw.parse::<u16>().ok())?,
            environment: env::var("APP_ENV").unwrap_or_else(|_| "development".into()),
            cors_origin: env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".into()),
            bcrypt_cost: parse_var("BCRYPT_COST", &bcrypt::DEFAULT_COST.to_string(), |raw| {
                raw.parse::<u32>().ok().filter(|cost| (4..=31).contains(cost))
            })?,
            starting_balance: parse_var("STARTING_BALANCE", "5000", |raw| {
                Decimal::from_str(raw)
                    .ok()
                    .filter(|balance| !balance.is_sign_negative() && balance.scale() <= 2)
            })?,
        })
    }

    pub fn catalogue_timeout(&self) -> Duration {
        Duration::from_secs(self.catalogue_timeout_secs)
    }

    /// 生产环境下会话 cookie 带 secure 标记
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

/// `3h` 或 `3` 表示小时数，换算成秒；溢出视为无效
fn expiration_secs(raw: &str) -> Option<i64> {
    raw.trim_end_matches('h')
        .parse::<i64>()
        .ok()
        .filter(|hours| *hours > 0)
        .and_then(|hours| hours.checked_mul(3600))
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn parse_var<T>(
    name: &'static str,
    default: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    parse(raw.trim()).ok_or(ConfigError::Invalid { name, value: raw })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiration_accepts_hours_with_or_without_suffix() {
        assert_eq!(expiration_secs("3h"), Some(3 * 3600));
        assert_eq!(expiration_secs("24"), Some(24 * 3600));
    }

    #[test]
    fn expiration_rejects_overflow_and_garbage() {
        assert_eq!(expiration_secs(&format!("{}h", i64::MAX)), None);
        assert_eq!(expiration_secs("99999999999999999999h"), None);
        assert_eq!(expiration_secs("0h"), None);
        assert_eq!(expiration_secs("-1h"), None);
        assert_eq!(expiration_secs("soon"), None);
    }
}
