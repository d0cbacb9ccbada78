use std::{env, net::SocketAddr, path::PathBuf, str::FromStr};

use crate::constants::{
    DEFAULT_PAGE_SIZE, DEFAULT_TOKEN_LIFETIME_HOURS, MAX_PAGE_SIZE, MAX_TOKEN_LIFETIME_HOURS,
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_address: SocketAddr,
    pub media_root: PathBuf,
    pub media_url: String,
    pub jwt_secret: String,
    pub token_lifetime_hours: i64,
    pub page_size: i64,
}

impl Config {
    /// Reads the environment, after loading a `.env` file when one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let page_size = parse_or(&lookup, "PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(ConfigError::Invalid {
                key: "PAGE_SIZE",
                value: page_size.to_string(),
            });
        }

        let token_lifetime_hours =
            parse_or(&lookup, "TOKEN_LIFETIME_HOURS", DEFAULT_TOKEN_LIFETIME_HOURS)?;
        if !(1..=MAX_TOKEN_LIFETIME_HOURS).contains(&token_lifetime_hours) {
            return Err(ConfigError::Invalid {
                key: "TOKEN_LIFETIME_HOURS",
                value: token_lifetime_hours.to_string(),
            });
        }

        let jwt_secret = lookup("JWT_SECRET")
            .filter(|secret| !secret.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| "sqlite://foodgram.db".into()),
            bind_address: parse_or(&lookup, "BIND_ADDRESS", SocketAddr::from(([0, 0, 0, 0], 8000)))?,
            media_root: lookup("MEDIA_ROOT").unwrap_or_else(|| "media".into()).into(),
            media_url: lookup("MEDIA_URL").unwrap_or_else(|| "/media/".into()),
            jwt_secret,
            token_lifetime_hours,
            page_size,
        })
    }
}

fn parse_or<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_fill_everything_but_the_secret() {
        let config = config(&[("JWT_SECRET", "s3cret")]).unwrap();

        assert_eq!(config.database_url, "sqlite://foodgram.db");
        assert_eq!(config.bind_address.port(), 8000);
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.media_url, "/media/");
    }

    #[test]
    fn missing_secret_and_bad_numbers_fail() {
        assert!(matches!(config(&[]), Err(ConfigError::Missing("JWT_SECRET"))));
        assert!(matches!(
            config(&[("JWT_SECRET", "x"), ("PAGE_SIZE", "lots")]),
            Err(ConfigError::Invalid { key: "PAGE_SIZE", .. })
        ));
        assert!(config(&[("JWT_SECRET", "x"), ("PAGE_SIZE", "0")]).is_err());
    }

    #[test]
    fn token_lifetime_must_be_within_a_year() {
        for hours in ["0", "-3", "9999999999999"] {
            assert!(
                matches!(
                    config(&[("JWT_SECRET", "x"), ("TOKEN_LIFETIME_HOURS", hours)]),
                    Err(ConfigError::Invalid { key: "TOKEN_LIFETIME_HOURS", .. })
                ),
                "{hours}"
            );
        }

        let config = config(&[("JWT_SECRET", "x"), ("TOKEN_LIFETIME_HOURS", "8760")]).unwrap();
        assert_eq!(config.token_lifetime_hours, MAX_TOKEN_LIFETIME_HOURS);
    }
}
