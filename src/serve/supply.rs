use std::sync::LazyLock;

use alloy_primitives::Address;
use axum::extract::State;
use tokio::try_join;

use crate::chain_api::to_scaled_decimal;
use crate::env::Network;

use super::types::{internal_error, ApiError};
use super::AppState;

// tokens burned by sending them to the conventional dead address
static BURN_WALLET: LazyLock<Address> = LazyLock::new(|| {
    "0x000000000000000000000000000000000000dead"
        .parse()
        .unwrap()
});

/// Total supply as a plain decimal string. The supply lives on bsc, the eth
/// side only contributes burns.
pub async fn total(State(state): State<AppState>) -> Result<String, ApiError> {
    let chain = &state.chain_api;
    let bsc = state.contracts(Network::Bsc);
    let eth = state.contracts(Network::Eth);

    let (bsc_supply, bsc_decimals, bsc_burned, eth_decimals, eth_burned) = try_join!(
        chain.total_supply(Network::Bsc, bsc.token),
        chain.decimals(Network::Bsc, bsc.token),
        chain.balance_of(Network::Bsc, bsc.token, *BURN_WALLET),
        chain.decimals(Network::Eth, eth.token),
        chain.balance_of(Network::Eth, eth.token, *BURN_WALLET),
    )
    .map_err(internal_error)?;

    let total = to_scaled_decimal(bsc_supply, bsc_decimals)
        - to_scaled_decimal(bsc_burned, bsc_decimals)
        - to_scaled_decimal(eth_burned, eth_decimals);

    Ok(total.normalized().to_string())
}

/// Circulating supply: both chains' supplies minus burned, treasury and
/// bridge holdings.
pub async fn circulating(State(state): State<AppState>) -> Result<String, ApiError> {
    let chain = &state.chain_api;
    let bsc = state.contracts(Network::Bsc);
    let eth = state.contracts(Network::Eth);

    let (
        bsc_supply,
        eth_supply,
        bsc_decimals,
        eth_decimals,
        bsc_burned,
        eth_burned,
        bsc_treasury,
        eth_treasury,
        bsc_bridge,
        eth_bridge,
    ) = try_join!(
        chain.total_supply(Network::Bsc, bsc.token),
        chain.total_supply(Network::Eth, eth.token),
        chain.decimals(Network::Bsc, bsc.token),
        chain.decimals(Network::Eth, eth.token),
        chain.balance_of(Network::Bsc, bsc.token, *BURN_WALLET),
        chain.balance_of(Network::Eth, eth.token, *BURN_WALLET),
        chain.balance_of(Network::Bsc, bsc.token, bsc.treasury),
        chain.balance_of(Network::Eth, eth.token, eth.treasury),
        chain.balance_of(Network::Bsc, bsc.token, bsc.bridge),
        chain.balance_of(Network::Eth, eth.token, eth.bridge),
    )
    .map_err(internal_error)?;

    let circulating = to_scaled_decimal(bsc_supply, bsc_decimals)
        + to_scaled_decimal(eth_supply, eth_decimals)
        - to_scaled_decimal(bsc_burned, bsc_decimals)
        - to_scaled_decimal(eth_burned, eth_decimals)
        - to_scaled_decimal(bsc_treasury, bsc_decimals)
        - to_scaled_decimal(eth_treasury, eth_decimals)
        - to_scaled_decimal(bsc_bridge, bsc_decimals)
        - to_scaled_decimal(eth_bridge, eth_decimals);

    Ok(circulating.normalized().to_string())
}
