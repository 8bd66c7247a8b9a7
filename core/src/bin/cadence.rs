/// Cadence CLI
///
/// Runs module scripts from a project directory, with either the pausable
/// engine (default) or the synchronous loader.
use cadence_core::cli::{self, Cli};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = cli::execute(cli, config).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
