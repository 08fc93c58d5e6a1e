use anyhow::Result;

#[tokio::main]
pub async fn main() -> Result<()> {
    alpha_backend::start_server().await
}
