use std::{env, fmt::Display, str::FromStr};

use anyhow::Context;
use tracing::{debug, info};

pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub quiz_limit: i64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .context("DATABASE_URL must be set to a production Postgres instance")?,
            max_connections: try_load("ROOTD_MAX_CONNECTIONS", "5")?,
            quiz_limit: try_load("ROOTD_QUIZ_LIMIT", "30")?,
        })
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> anyhow::Result<T>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    debug!("{key} = {raw}");

    raw.parse()
        .map_err(|e| anyhow::anyhow!("invalid {key} value `{raw}`: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let value: u32 = try_load("ROOTD_TEST_UNSET_KEY", "7").unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn unparsable_values_are_errors() {
        let result: anyhow::Result<u32> = try_load("ROOTD_TEST_UNSET_KEY_2", "many");
        let message = result.unwrap_err().to_string();
        assert!(message.contains("ROOTD_TEST_UNSET_KEY_2"));
    }
}
