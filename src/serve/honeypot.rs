use alloy_primitives::Address;
use async_trait::async_trait;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::chain_api::{ChainApi, ChainError};
use crate::env::Network;

use super::types::{error_response, ApiResponse};
use super::AppState;

const DEFAULT_SLIPPAGE: u64 = 50;

#[async_trait]
pub trait BuySellProbe {
    async fn simulate_buy_then_sell(
        &self,
        network: Network,
        checker: Address,
        token: Address,
        slippage: u64,
    ) -> Result<(), ChainError>;
}

#[async_trait]
impl BuySellProbe for ChainApi {
    async fn simulate_buy_then_sell(
        &self,
        network: Network,
        checker: Address,
        token: Address,
        slippage: u64,
    ) -> Result<(), ChainError> {
        ChainApi::simulate_buy_then_sell(self, network, checker, token, slippage).await
    }
}

/// Probe failures are a honeypot signal, not an error: they are logged and
/// carried as `false`.
pub async fn can_buy_and_sell<P: BuySellProbe>(
    probe: &P,
    network: Network,
    checker: Address,
    token: Address,
    slippage: u64,
) -> bool {
    // first pass ignores slippage entirely
    if let Err(err) = probe.simulate_buy_then_sell(network, checker, token, 100).await {
        warn!("buy/sell simulation failed for {} on {}: {}", token, network, err);
        return false;
    }

    if slippage < 100 {
        if let Err(err) = probe
            .simulate_buy_then_sell(network, checker, token, slippage)
            .await
        {
            warn!(
                "buy/sell simulation at {}% slippage failed for {} on {}: {}",
                slippage, token, network, err
            );
            return false;
        }
    }

    true
}

#[derive(Deserialize)]
pub struct HoneypotQuery {
    slippage: Option<u64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoneypotBody {
    can_buy_and_sell: bool,
}

pub async fn check(
    State(state): State<AppState>,
    Path((network, contract)): Path<(String, String)>,
    Query(query): Query<HoneypotQuery>,
) -> ApiResponse<HoneypotBody> {
    let network = Network::from_request_param(&network);
    let token: Address = contract
        .parse()
        .map_err(|_| error_response(StatusCode::BAD_REQUEST, "no contract to validate"))?;
    let checker = state.contracts(network).honeypot;
    let slippage = query.slippage.unwrap_or(DEFAULT_SLIPPAGE);

    let can_buy_and_sell =
        can_buy_and_sell(&state.chain_api, network, checker, token, slippage).await;

    Ok(Json(HoneypotBody { can_buy_and_sell }))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Records probed slippages, fails the ones listed in `fail_on`.
    struct RecordingProbe {
        probed: Mutex<Vec<u64>>,
        fail_on: Vec<u64>,
    }

    impl RecordingProbe {
        fn new(fail_on: Vec<u64>) -> Self {
            Self {
                probed: Mutex::new(Vec::new()),
                fail_on,
            }
        }
    }

    #[async_trait]
    impl BuySellProbe for RecordingProbe {
        async fn simulate_buy_then_sell(
            &self,
            _network: Network,
            _checker: Address,
            _token: Address,
            slippage: u64,
        ) -> Result<(), ChainError> {
            self.probed.lock().unwrap().push(slippage);
            if self.fail_on.contains(&slippage) {
                Err(ChainError::ContractCall("execution reverted".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn addresses() -> (Address, Address) {
        (Address::repeat_byte(0x14), Address::repeat_byte(0x31))
    }

    #[tokio::test]
    async fn test_both_probes_succeeding_is_not_a_honeypot() {
        let (checker, token) = addresses();
        let probe = RecordingProbe::new(vec![]);

        assert!(can_buy_and_sell(&probe, Network::Bsc, checker, token, 50).await);
        assert_eq!(*probe.probed.lock().unwrap(), vec![100, 50]);
    }

    #[tokio::test]
    async fn test_slippage_at_or_above_100_probes_once() {
        let (checker, token) = addresses();
        let probe = RecordingProbe::new(vec![]);

        assert!(can_buy_and_sell(&probe, Network::Eth, checker, token, 100).await);
        assert_eq!(*probe.probed.lock().unwrap(), vec![100]);
    }

    #[tokio::test]
    async fn test_reverting_probe_reads_as_honeypot_not_error() {
        let (checker, token) = addresses();

        let probe = RecordingProbe::new(vec![100]);
        assert!(!can_buy_and_sell(&probe, Network::Bsc, checker, token, 50).await);
        // no point probing with slippage once the clean round trip reverts
        assert_eq!(*probe.probed.lock().unwrap(), vec![100]);

        let probe = RecordingProbe::new(vec![50]);
        assert!(!can_buy_and_sell(&probe, Network::Bsc, checker, token, 50).await);
        assert_eq!(*probe.probed.lock().unwrap(), vec![100, 50]);
    }
}
