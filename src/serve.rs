use axum::{
    extract::State,
    http::{Method, StatusCode},
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

mod alpha;
mod cache;
mod env;
mod honeypot;
mod supply;
mod token;
mod types;

use env::{ChainContracts, APP_CONFIG};

use crate::chain_api::ChainApi;
use crate::env::Network;

#[derive(Clone)]
pub struct AppState {
    redis_client: redis::Client,
    chain_api: ChainApi,
    eth_contracts: ChainContracts,
    bsc_contracts: ChainContracts,
}

impl AppState {
    fn contracts(&self, network: Network) -> &ChainContracts {
        match network {
            Network::Eth => &self.eth_contracts,
            Network::Bsc => &self.bsc_contracts,
        }
    }
}

pub async fn start_server() -> anyhow::Result<()> {
    crate::log::init();

    let addr = SocketAddr::from(([0, 0, 0, 0], APP_CONFIG.port));

    let redis_client = redis::Client::open(APP_CONFIG.redis_uri.clone())?;
    let chain_api = ChainApi::new(&APP_CONFIG.eth_rpc_nodes, &APP_CONFIG.bsc_rpc_nodes);

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
        .allow_origin(Any);

    let shared_state = AppState {
        redis_client,
        chain_api,
        eth_contracts: APP_CONFIG.contracts(Network::Eth),
        bsc_contracts: APP_CONFIG.contracts(Network::Bsc),
    };

    let app = Router::new()
        .route("/healthz", get(health))
        .route("/alpha/validated", get(alpha::validated))
        .route("/alpha/latest", get(alpha::latest))
        .route("/alpha/validate", post(alpha::validate))
        .route(
            "/alpha/honeypot/check/:network/:contract",
            get(honeypot::check),
        )
        .route("/total", get(supply::total))
        .route("/circulating", get(supply::circulating))
        .route("/token/price", get(token::price))
        .with_state(shared_state)
        .layer(cors);

    info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}

async fn health(State(state): State<AppState>) -> StatusCode {
    let mut conn = match state.redis_client.get_async_connection().await {
        Ok(conn) => conn,
        Err(_) => return StatusCode::INTERNAL_SERVER_ERROR,
    };
    match redis::cmd("PING").query_async::<_, String>(&mut conn).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
