use loopcast::config::Config;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!("starting loopcast HLS manifest gateway");

    if let Err(e) = loopcast::server::start(config).await {
        error!("server error: {}", e);
        std::process::exit(1);
    }
}
