use clap::Parser;
use vattu::app;
use vattu::config::Config;

/// Main entry point for the inventory web page
///
/// Reads configuration from flags and `VATTU_*` environment variables,
/// installs the logger and serves the page until interrupted.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    app::run(config).await
}
