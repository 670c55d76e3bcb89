use anyhow::Result;
use tracing::info;

use lawfirm_site::{config, server};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lawfirm_site=info".parse()?),
        )
        .init();

    info!("Starting law-firm site backend");

    let config = config::Config::from_env()?;
    server::serve(config).await
}
