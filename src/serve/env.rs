use std::sync::LazyLock;

use alloy_primitives::{Address, U256};
use chrono::Duration;
use reqwest::Url;
use serde::Deserialize;

use crate::env::{
    deserialize_duration_days, deserialize_u256, deserialize_urls, get_app_config, Network,
};

/// Contract addresses for one network, fixed at startup.
#[derive(Clone)]
pub struct ChainContracts {
    pub token: Address,
    pub nft: Address,
    pub rewards: Address,
    pub honeypot: Address,
    pub bridge: Address,
    pub treasury: Address,
    pub dex_utils: Address,
}

#[derive(Deserialize)]
pub struct AppConfig {
    pub port: u16,
    pub redis_uri: String,
    #[serde(deserialize_with = "deserialize_urls")]
    pub eth_rpc_nodes: Vec<Url>,
    #[serde(deserialize_with = "deserialize_urls")]
    pub bsc_rpc_nodes: Vec<Url>,
    /// How long a validation result sticks around before holders have to
    /// revalidate.
    #[serde(
        default = "defaults::validated_ttl",
        deserialize_with = "deserialize_duration_days",
        rename = "validated_ttl_days"
    )]
    pub validated_ttl: Duration,
    /// Raw token amount a holder needs across both chains for alpha access.
    #[serde(
        default = "defaults::holding_threshold",
        deserialize_with = "deserialize_u256"
    )]
    pub holding_threshold: U256,
    #[serde(default = "defaults::eth_token")]
    pub eth_token: Address,
    #[serde(default = "defaults::eth_nft")]
    pub eth_nft: Address,
    #[serde(default = "defaults::eth_rewards")]
    pub eth_rewards: Address,
    #[serde(default = "defaults::eth_honeypot")]
    pub eth_honeypot: Address,
    #[serde(default = "defaults::eth_bridge")]
    pub eth_bridge: Address,
    #[serde(default = "defaults::eth_treasury")]
    pub eth_treasury: Address,
    #[serde(default = "defaults::bsc_token")]
    pub bsc_token: Address,
    #[serde(default = "defaults::bsc_nft")]
    pub bsc_nft: Address,
    #[serde(default = "defaults::bsc_rewards")]
    pub bsc_rewards: Address,
    #[serde(default = "defaults::bsc_honeypot")]
    pub bsc_honeypot: Address,
    #[serde(default = "defaults::bsc_bridge")]
    pub bsc_bridge: Address,
    #[serde(default = "defaults::bsc_treasury")]
    pub bsc_treasury: Address,
    /// Same utility contract is deployed at the same address on both chains.
    #[serde(default = "defaults::dex_utils")]
    pub dex_utils: Address,
}

impl AppConfig {
    pub fn contracts(&self, network: Network) -> ChainContracts {
        match network {
            Network::Eth => ChainContracts {
                token: self.eth_token,
                nft: self.eth_nft,
                rewards: self.eth_rewards,
                honeypot: self.eth_honeypot,
                bridge: self.eth_bridge,
                treasury: self.eth_treasury,
                dex_utils: self.dex_utils,
            },
            Network::Bsc => ChainContracts {
                token: self.bsc_token,
                nft: self.bsc_nft,
                rewards: self.bsc_rewards,
                honeypot: self.bsc_honeypot,
                bridge: self.bsc_bridge,
                treasury: self.bsc_treasury,
                dex_utils: self.dex_utils,
            },
        }
    }
}

mod defaults {
    use alloy_primitives::{Address, U256};
    use chrono::Duration;

    pub fn validated_ttl() -> Duration {
        Duration::days(1)
    }

    // 30 million tokens at 9 decimals
    pub fn holding_threshold() -> U256 {
        U256::from(30_000_000u64) * U256::from(10u64).pow(U256::from(9))
    }

    pub fn eth_token() -> Address {
        "0x5dbb9f64cd96e2dbbca58d14863d615b67b42f2e".parse().unwrap()
    }

    pub fn eth_nft() -> Address {
        "0xdaf531fd52eaa4b33a5158b0da3305caaaf96cd6".parse().unwrap()
    }

    pub fn eth_rewards() -> Address {
        "0x8b61f51f639adf0d883f6b6e30f2c822b238fc2e".parse().unwrap()
    }

    pub fn eth_honeypot() -> Address {
        "0x1275263fdcdc721981fc7d13b632db68c9229e8b".parse().unwrap()
    }

    pub fn eth_bridge() -> Address {
        "0xd21cbf03eb55935743098c73e6eb3af85d20502a".parse().unwrap()
    }

    pub fn eth_treasury() -> Address {
        "0xdb3ac91239b79fae75c21e1f75a189b1d75dd906".parse().unwrap()
    }

    pub fn bsc_token() -> Address {
        "0x55e8b37a3c43b049dedf56c77f462db095108651".parse().unwrap()
    }

    pub fn bsc_nft() -> Address {
        "0x8d87c61e1dd1351fbbc0026f478416b67e660726".parse().unwrap()
    }

    pub fn bsc_rewards() -> Address {
        "0x6a67398c803aefe4f7b6768d42ef76426bfe0f8d".parse().unwrap()
    }

    pub fn bsc_honeypot() -> Address {
        "0x195a67439292e32b4e9482a04cd3d34373af095a".parse().unwrap()
    }

    pub fn bsc_bridge() -> Address {
        "0x3f0dd16553e33664dc0256ac58b84ec8e5caa037".parse().unwrap()
    }

    pub fn bsc_treasury() -> Address {
        "0xdb7014e9bc92d087ad7c096d9ff9940711015ec3".parse().unwrap()
    }

    pub fn dex_utils() -> Address {
        "0x738f7a7d2f7af556321fae259b37d49034827e09".parse().unwrap()
    }
}

pub static APP_CONFIG: LazyLock<AppConfig> = LazyLock::new(get_app_config);
