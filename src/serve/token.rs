use alloy_primitives::{Address, U256};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::chain_api::to_scaled_decimal;
use crate::env::Network;

use super::cache;
use super::types::{error_response, internal_error, ApiResponse};
use super::AppState;

#[derive(Deserialize)]
pub struct PriceQuery {
    network: Option<String>,
    token: Option<String>,
}

#[derive(Serialize)]
pub struct PriceBody {
    price: String,
}

pub async fn price(
    State(state): State<AppState>,
    Query(query): Query<PriceQuery>,
) -> ApiResponse<PriceBody> {
    let network = query
        .network
        .as_deref()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| error_response(StatusCode::BAD_REQUEST, "network must be provided"))?;
    let token = query
        .token
        .as_deref()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| error_response(StatusCode::BAD_REQUEST, "token must be provided"))?;
    let network = Network::from_request_param(network);

    // cached prices are already normalized, return them untouched
    if let Some(cached) = cache::get_price(&state.redis_client, token)
        .await
        .map_err(internal_error)?
    {
        return Ok(Json(PriceBody { price: cached }));
    }

    let token_address: Address = token
        .parse()
        .map_err(|_| error_response(StatusCode::BAD_REQUEST, "token must be a contract address"))?;

    let raw = state
        .chain_api
        .main_price_via_native_pair(network, state.contracts(network).dex_utils, token_address)
        .await
        .map_err(internal_error)?;

    let price = normalize_price(&raw);

    cache::set_price(&state.redis_client, token, &price)
        .await
        .map_err(internal_error)?;

    Ok(Json(PriceBody { price }))
}

/// Prices come back as a raw 18-decimal integer. Return data that does not
/// decode as one counts as a zero price.
pub fn normalize_price(raw: &str) -> String {
    let wei = U256::from_str_radix(raw.trim_start_matches("0x"), 16).unwrap_or(U256::ZERO);
    to_scaled_decimal(wei, 18).normalized().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_price() {
        let raw = format!("{:#x}", U256::from(1_500_000_000_000_000_000u64));
        assert_eq!(normalize_price(&raw), "1.5");

        let raw = format!("{:#x}", U256::from(10u64).pow(U256::from(18)));
        assert_eq!(normalize_price(&raw), "1");
    }

    #[test]
    fn test_undecodable_price_normalizes_to_zero() {
        assert_eq!(normalize_price("NaN"), "0");
        assert_eq!(normalize_price("0x"), "0");
        assert_eq!(normalize_price(""), "0");
    }
}
