use std::sync::Arc;

use clap::Parser;

use promptrelay::transport::serve;
use promptrelay::{Config, PROMPTRELAY_VERSION, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    logging::init_tracing();

    tracing::info!(
        version = PROMPTRELAY_VERSION,
        worker = %config.worker_command(),
        max_concurrency = config.max_concurrency,
        "promptrelay starting"
    );

    let service = Arc::new(config.build_service()?);
    serve(config.server_config(), service).await
}
