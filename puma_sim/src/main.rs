use puma_sim::{run, SimConfig, SimError};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), SimError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Optional config file as the first argument, defaults otherwise
    let mut config = match std::env::args().nth(1) {
        Some(path) => {
            info!("Loading simulator configuration from {}", path);
            SimConfig::load(&path)?
        }
        None => SimConfig::default(),
    };

    if let Some(port) = std::env::var("PUMA_SIM_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
    {
        config.port = port;
    }

    run(config).await
}
