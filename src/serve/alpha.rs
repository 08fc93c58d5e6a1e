use alloy_primitives::{Address, Signature, U256};
use async_trait::async_trait;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use futures::try_join;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::chain_api::{ChainApi, ChainError};
use crate::env::Network;

use super::cache;
use super::env::{ChainContracts, APP_CONFIG};
use super::types::{error_response, internal_error, ApiError, ApiResponse};
use super::AppState;

#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("{0}")]
    Validation(&'static str),
    #[error("{0}")]
    Authentication(&'static str),
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error(transparent)]
    Cache(#[from] redis::RedisError),
}

impl ValidateError {
    fn into_api_error(self) -> ApiError {
        match self {
            ValidateError::Validation(message) => {
                error_response(StatusCode::BAD_REQUEST, message)
            }
            ValidateError::Authentication(message) => {
                error_response(StatusCode::UNAUTHORIZED, message)
            }
            ValidateError::Chain(err) => internal_error(err),
            ValidateError::Cache(err) => internal_error(err),
        }
    }
}

/// Address that produced `signature` over the EIP-191 personal-message hash
/// of `message`.
pub fn recover_signer(message: &str, signature: &str) -> Result<Address, ValidateError> {
    let bytes = hex::decode(signature.trim_start_matches("0x"))
        .map_err(|_| ValidateError::Authentication("signature is not valid hex"))?;
    let signature = Signature::from_raw(&bytes)
        .map_err(|_| ValidateError::Authentication("malformed signature"))?;
    signature
        .recover_address_from_msg(message)
        .map_err(|_| ValidateError::Authentication("could not recover signer"))
}

pub fn verify_signer(
    address: Address,
    message: &str,
    signature: &str,
) -> Result<(), ValidateError> {
    let signer = recover_signer(message, signature)?;
    if signer == address {
        Ok(())
    } else {
        Err(ValidateError::Authentication(
            "address and signer do not match",
        ))
    }
}

/// Seam over the per-contract balance reads so the aggregation is testable
/// without live nodes.
#[async_trait]
pub trait HoldingsSource {
    async fn token_balance(
        &self,
        network: Network,
        token: Address,
        owner: Address,
    ) -> Result<U256, ChainError>;

    async fn nft_balance(
        &self,
        network: Network,
        nft: Address,
        owner: Address,
    ) -> Result<U256, ChainError>;

    async fn base_shares(
        &self,
        network: Network,
        rewards: Address,
        owner: Address,
    ) -> Result<U256, ChainError>;

    async fn boost_nft_count(
        &self,
        network: Network,
        rewards: Address,
        owner: Address,
    ) -> Result<U256, ChainError>;
}

#[async_trait]
impl HoldingsSource for ChainApi {
    async fn token_balance(
        &self,
        network: Network,
        token: Address,
        owner: Address,
    ) -> Result<U256, ChainError> {
        self.balance_of(network, token, owner).await
    }

    async fn nft_balance(
        &self,
        network: Network,
        nft: Address,
        owner: Address,
    ) -> Result<U256, ChainError> {
        self.balance_of(network, nft, owner).await
    }

    async fn base_shares(
        &self,
        network: Network,
        rewards: Address,
        owner: Address,
    ) -> Result<U256, ChainError> {
        ChainApi::base_shares(self, network, rewards, owner).await
    }

    async fn boost_nft_count(
        &self,
        network: Network,
        rewards: Address,
        owner: Address,
    ) -> Result<U256, ChainError> {
        ChainApi::boost_nft_count(self, network, rewards, owner).await
    }
}

pub struct HoldingTotals {
    pub token: U256,
    pub nft: U256,
}

/// Fans out the eight per-chain reads concurrently and sums them. All or
/// nothing: a single failed read fails the whole aggregation, no partial
/// credit.
pub async fn aggregate_holdings<S: HoldingsSource>(
    source: &S,
    eth: &ChainContracts,
    bsc: &ChainContracts,
    owner: Address,
) -> Result<HoldingTotals, ChainError> {
    let (
        eth_token_balance,
        eth_base_shares,
        eth_nft_balance,
        eth_boost_count,
        bsc_token_balance,
        bsc_base_shares,
        bsc_nft_balance,
        bsc_boost_count,
    ) = try_join!(
        source.token_balance(Network::Eth, eth.token, owner),
        source.base_shares(Network::Eth, eth.rewards, owner),
        source.nft_balance(Network::Eth, eth.nft, owner),
        source.boost_nft_count(Network::Eth, eth.rewards, owner),
        source.token_balance(Network::Bsc, bsc.token, owner),
        source.base_shares(Network::Bsc, bsc.rewards, owner),
        source.nft_balance(Network::Bsc, bsc.nft, owner),
        source.boost_nft_count(Network::Bsc, bsc.rewards, owner),
    )?;

    Ok(HoldingTotals {
        token: eth_token_balance + eth_base_shares + bsc_token_balance + bsc_base_shares,
        nft: eth_nft_balance + eth_boost_count + bsc_nft_balance + bsc_boost_count,
    })
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ValidateBody {
    pub validated: bool,
    pub total_token_balance: String,
    pub total_nft_balance: String,
}

/// The whole validation pipeline short of the cache write: signature check
/// first, balance reads only afterwards.
pub async fn run_validation<S: HoldingsSource>(
    source: &S,
    eth: &ChainContracts,
    bsc: &ChainContracts,
    address: &str,
    message: &str,
    signature: &str,
    threshold: U256,
) -> Result<ValidateBody, ValidateError> {
    let owner: Address = address
        .parse()
        .map_err(|_| ValidateError::Validation("address is not a valid hex address"))?;

    verify_signer(owner, message, signature)?;

    let totals = aggregate_holdings(source, eth, bsc, owner).await?;

    Ok(ValidateBody {
        validated: totals.token >= threshold,
        total_token_balance: totals.token.to_string(),
        total_nft_balance: totals.nft.to_string(),
    })
}

#[derive(Deserialize)]
pub struct ValidateRequest {
    address: Option<String>,
    message: Option<String>,
    signature: Option<String>,
}

pub async fn validate(
    State(state): State<AppState>,
    Json(request): Json<ValidateRequest>,
) -> ApiResponse<ValidateBody> {
    let address = non_empty(&request.address)
        .ok_or(ValidateError::Validation("need an address to validate"))
        .map_err(ValidateError::into_api_error)?;
    let message = non_empty(&request.message)
        .ok_or(ValidateError::Validation("need a message to validate"))
        .map_err(ValidateError::into_api_error)?;
    let signature = non_empty(&request.signature)
        .ok_or(ValidateError::Validation(
            "need a signature to validate against",
        ))
        .map_err(ValidateError::into_api_error)?;

    let body = run_validation(
        &state.chain_api,
        state.contracts(Network::Eth),
        state.contracts(Network::Bsc),
        address,
        message,
        signature,
        APP_CONFIG.holding_threshold,
    )
    .await
    .map_err(|err| {
        warn!("alpha validation failed: {}", err);
        err.into_api_error()
    })?;

    cache::set_validated_flag(
        &state.redis_client,
        address,
        body.validated,
        APP_CONFIG.validated_ttl,
    )
    .await
    .map_err(|err| ValidateError::Cache(err).into_api_error())?;

    Ok(Json(body))
}

#[derive(Deserialize)]
pub struct ValidatedQuery {
    address: Option<String>,
}

#[derive(Serialize)]
pub struct ValidatedBody {
    validated: bool,
}

/// Cheap read path: only ever looks at the cache, never recomputes.
pub async fn validated(
    State(state): State<AppState>,
    Query(query): Query<ValidatedQuery>,
) -> ApiResponse<ValidatedBody> {
    let address = non_empty(&query.address)
        .ok_or_else(|| error_response(StatusCode::BAD_REQUEST, "nothing to validate"))?;

    let flag = cache::get_validated_flag(&state.redis_client, address)
        .await
        .map_err(internal_error)?;

    Ok(Json(ValidatedBody {
        validated: flag.as_deref() == Some("true"),
    }))
}

#[derive(Deserialize)]
pub struct LatestQuery {
    address: Option<String>,
    amount: Option<isize>,
}

#[derive(Serialize)]
pub struct LatestBody {
    alpha: Vec<Value>,
}

pub async fn latest(
    State(state): State<AppState>,
    Query(query): Query<LatestQuery>,
) -> ApiResponse<LatestBody> {
    let address = non_empty(&query.address)
        .ok_or_else(|| error_response(StatusCode::BAD_REQUEST, "cannot validate without address"))?;
    let amount = query.amount.unwrap_or(30);

    let flag = cache::get_validated_flag(&state.redis_client, address)
        .await
        .map_err(internal_error)?;

    // presence of the entry is the gate here, a stored "false" still passes
    if flag.is_none() {
        return Err(error_response(
            StatusCode::FORBIDDEN,
            "You have not validated yourself as having access to this service yet.",
        ));
    }

    let alpha = cache::get_alpha_entries(&state.redis_client, amount)
        .await
        .map_err(internal_error)?;

    Ok(Json(LatestBody { alpha }))
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|value| !value.is_empty())
}
