use std::str::FromStr;

use alloy_primitives::{keccak256, Address, U256};
use bigdecimal::{num_bigint::BigInt, BigDecimal};
use rand::seq::SliceRandom;
use reqwest::Url;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::env::Network;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("rpc request failed: {0}")]
    Rpc(#[from] reqwest::Error),
    #[error("contract call failed: {0}")]
    ContractCall(String),
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[allow(dead_code)]
#[derive(Deserialize)]
struct RpcResponse {
    jsonrpc: String,
    id: u32,
    result: Option<String>,
    error: Option<RpcErrorBody>,
}

fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

fn address_word(address: Address) -> U256 {
    U256::from_be_slice(address.as_slice())
}

/// Hex call data for a function signature plus 32-byte-word arguments.
fn encode_call(signature: &str, args: &[U256]) -> String {
    let mut data = selector(signature).to_vec();
    for arg in args {
        data.extend_from_slice(&arg.to_be_bytes::<32>());
    }
    format!("0x{}", hex::encode(data))
}

fn decode_u256(raw: &str) -> Result<U256, ChainError> {
    let digits = raw.trim_start_matches("0x");
    if digits.is_empty() {
        return Err(ChainError::ContractCall("empty return data".to_string()));
    }
    U256::from_str_radix(digits, 16)
        .map_err(|_| ChainError::ContractCall(format!("malformed uint256 return data: {raw}")))
}

/// Length word of an ABI-encoded dynamic array, the only part of the
/// boost NFT list the aggregation needs.
fn decode_array_len(raw: &str) -> Result<U256, ChainError> {
    let bytes = hex::decode(raw.trim_start_matches("0x"))
        .map_err(|_| ChainError::ContractCall(format!("malformed return data: {raw}")))?;
    if bytes.len() < 64 {
        return Err(ChainError::ContractCall(
            "return data too short for a dynamic array".to_string(),
        ));
    }
    Ok(U256::from_be_slice(&bytes[32..64]))
}

/// Exact scaled-decimal view of a raw token amount. Stays in decimal
/// arithmetic the whole way, no binary floats.
pub fn to_scaled_decimal(value: U256, decimals: u32) -> BigDecimal {
    let digits = BigInt::from_str(&value.to_string())
        .expect("failed to parse U256 decimal string as BigInt");
    BigDecimal::new(digits, decimals as i64)
}

#[derive(Clone)]
pub struct ChainApi {
    client: reqwest::Client,
    eth_nodes: Vec<Url>,
    bsc_nodes: Vec<Url>,
}

impl ChainApi {
    pub fn new(eth_nodes: &Vec<Url>, bsc_nodes: &Vec<Url>) -> Self {
        if eth_nodes.is_empty() || bsc_nodes.is_empty() {
            panic!("tried to instantiate ChainApi without at least one node per network");
        }
        Self {
            client: reqwest::Client::new(),
            eth_nodes: eth_nodes.clone(),
            bsc_nodes: bsc_nodes.clone(),
        }
    }

    // poor mans load balancer, get random node from list
    fn node(&self, network: Network) -> &Url {
        let nodes = match network {
            Network::Eth => &self.eth_nodes,
            Network::Bsc => &self.bsc_nodes,
        };
        nodes.choose(&mut rand::thread_rng()).unwrap()
    }

    async fn request(
        &self,
        network: Network,
        method: &str,
        params: serde_json::Value,
    ) -> Result<String, ChainError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params
        });

        let response: RpcResponse = self
            .client
            .post(self.node(network).clone())
            .json(&payload)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        match (response.result, response.error) {
            (Some(result), _) => Ok(result),
            (None, Some(err)) => Err(ChainError::ContractCall(format!(
                "{} (code {})",
                err.message, err.code
            ))),
            (None, None) => Err(ChainError::ContractCall(
                "node returned neither result nor error".to_string(),
            )),
        }
    }

    async fn call(&self, network: Network, to: Address, data: String) -> Result<String, ChainError> {
        self.request(network, "eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await
    }

    async fn estimate_gas(
        &self,
        network: Network,
        to: Address,
        data: String,
        value: U256,
    ) -> Result<(), ChainError> {
        self.request(
            network,
            "eth_estimateGas",
            json!([{ "to": to, "data": data, "value": format!("0x{value:x}") }]),
        )
        .await
        .map(|_| ())
    }

    /// balanceOf(address), shared by the fungible token and NFT contracts.
    pub async fn balance_of(
        &self,
        network: Network,
        token: Address,
        owner: Address,
    ) -> Result<U256, ChainError> {
        let data = encode_call("balanceOf(address)", &[address_word(owner)]);
        let raw = self.call(network, token, data).await?;
        decode_u256(&raw)
    }

    pub async fn total_supply(&self, network: Network, token: Address) -> Result<U256, ChainError> {
        let raw = self.call(network, token, encode_call("totalSupply()", &[])).await?;
        decode_u256(&raw)
    }

    pub async fn decimals(&self, network: Network, token: Address) -> Result<u32, ChainError> {
        let raw = self.call(network, token, encode_call("decimals()", &[])).await?;
        let decimals = decode_u256(&raw)?;
        u32::try_from(decimals)
            .map_err(|_| ChainError::ContractCall(format!("decimals out of range: {decimals}")))
    }

    pub async fn base_shares(
        &self,
        network: Network,
        rewards: Address,
        owner: Address,
    ) -> Result<U256, ChainError> {
        let data = encode_call("getBaseShares(address)", &[address_word(owner)]);
        let raw = self.call(network, rewards, data).await?;
        decode_u256(&raw)
    }

    /// Number of boost NFTs staked with the rewards distributor.
    pub async fn boost_nft_count(
        &self,
        network: Network,
        rewards: Address,
        owner: Address,
    ) -> Result<U256, ChainError> {
        let data = encode_call("getBoostNfts(address)", &[address_word(owner)]);
        let raw = self.call(network, rewards, data).await?;
        decode_array_len(&raw)
    }

    /// Raw getMainPriceViaNativePair return data. Decoding is left to the
    /// caller, which maps undecodable data to a zero price.
    pub async fn main_price_via_native_pair(
        &self,
        network: Network,
        dex_utils: Address,
        token: Address,
    ) -> Result<String, ChainError> {
        let data = encode_call("getMainPriceViaNativePair(address)", &[address_word(token)]);
        self.call(network, dex_utils, data).await
    }

    /// Gas-estimates a buyThenSellSingleSlippage round trip with 0.01 native
    /// units attached. Nothing is submitted to the chain.
    pub async fn simulate_buy_then_sell(
        &self,
        network: Network,
        checker: Address,
        token: Address,
        slippage: u64,
    ) -> Result<(), ChainError> {
        let data = encode_call(
            "buyThenSellSingleSlippage(address,uint256)",
            &[address_word(token), U256::from(slippage)],
        );
        let value = U256::from(10u64).pow(U256::from(16));
        self.estimate_gas(network, checker, data, value).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_erc20_selectors() {
        assert_eq!(selector("balanceOf(address)"), [0x70, 0xa0, 0x82, 0x31]);
        assert_eq!(selector("totalSupply()"), [0x18, 0x16, 0x0d, 0xdd]);
        assert_eq!(selector("decimals()"), [0x31, 0x3c, 0xe5, 0x67]);
    }

    #[test]
    fn test_encode_call_pads_address_to_word() {
        let owner: Address = "0x8d87c61e1dd1351fbbc0026f478416b67e660726"
            .parse()
            .unwrap();
        let data = encode_call("balanceOf(address)", &[address_word(owner)]);

        assert_eq!(
            data,
            "0x70a082310000000000000000000000008d87c61e1dd1351fbbc0026f478416b67e660726"
        );
    }

    #[test]
    fn test_decode_u256() {
        assert_eq!(decode_u256("0x5").unwrap(), U256::from(5));
        assert_eq!(
            decode_u256("0x0000000000000000000000000000000000000000000000000000000000000001")
                .unwrap(),
            U256::from(1)
        );
        assert!(decode_u256("0x").is_err());
        assert!(decode_u256("not hex").is_err());
    }

    #[test]
    fn test_decode_array_len() {
        // offset word followed by a length of 3
        let raw = format!(
            "0x{}{}",
            "0000000000000000000000000000000000000000000000000000000000000020",
            "0000000000000000000000000000000000000000000000000000000000000003"
        );
        assert_eq!(decode_array_len(&raw).unwrap(), U256::from(3));

        assert!(decode_array_len("0x20").is_err());
    }

    #[test]
    fn test_to_scaled_decimal_is_exact() {
        let one_and_a_half = U256::from(1_500_000_000_000_000_000u64);
        assert_eq!(
            to_scaled_decimal(one_and_a_half, 18).normalized().to_string(),
            "1.5"
        );

        let dust = U256::from(5u64);
        assert_eq!(
            to_scaled_decimal(dust, 18).normalized().to_string(),
            "0.000000000000000005"
        );

        // scaled arithmetic must not round through floats
        let a = to_scaled_decimal(U256::from(1_000_000_000u64), 9);
        let b = to_scaled_decimal(U256::from(2_000_000_000u64), 9);
        assert_eq!((a + b).normalized().to_string(), "3");
    }
}
