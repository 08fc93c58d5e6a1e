use alloy_primitives::U256;
use chrono::Duration;
use reqwest::Url;
use serde::{
    de::{DeserializeOwned, Error},
    Deserialize, Deserializer,
};
use std::fmt;
use tracing::error;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Network {
    Eth,
    Bsc,
}

impl Network {
    /// Request parameters select bsc case-insensitively, anything else is
    /// treated as mainnet.
    pub fn from_request_param(param: &str) -> Self {
        if param.eq_ignore_ascii_case("bsc") {
            Network::Bsc
        } else {
            Network::Eth
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let str = match &self {
            Network::Eth => "eth",
            Network::Bsc => "bsc",
        };
        write!(f, "{}", str)
    }
}

/// Deserialize a Vec<Url> from a comma separated string
pub fn deserialize_urls<'de, D>(deserializer: D) -> Result<Vec<Url>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    s.split(',')
        .map(|s| Url::parse(s.trim()).map_err(Error::custom))
        .collect()
}

pub fn deserialize_duration_days<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let days: i64 = Deserialize::deserialize(deserializer)?;
    Ok(Duration::days(days))
}

/// Deserialize a U256 from a base-10 string
pub fn deserialize_u256<'de, D>(deserializer: D) -> Result<U256, D::Error>
where
    D: Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    U256::from_str_radix(&s, 10).map_err(Error::custom)
}

pub fn get_app_config<T: DeserializeOwned>() -> T {
    match envy::from_env::<T>() {
        Ok(config) => config,
        Err(err) => {
            error!("failed to parse config: {}", err);
            std::process::exit(1);
        }
    }
}
