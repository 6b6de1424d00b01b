//! DataQuest - a terminal client for a natural-language-to-SQL backend.

use std::sync::Arc;

use dataquest::backend::{HttpBackend, MockBackend, QueryBackend};
use dataquest::cli::Cli;
use dataquest::config::Config;
use dataquest::error::Result;
use dataquest::{logging, tui};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();

    if cli.is_headless() {
        logging::init_stderr_logging();
    } else {
        logging::init_file_logging();
    }

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("{}: {}", e.category(), e);
            eprintln!("{}: {}", e.category(), e);
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<i32> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    let backend: Arc<dyn QueryBackend> = if cli.mock_backend {
        info!("Using in-memory mock backend");
        Arc::new(MockBackend::new())
    } else {
        let backend_config = cli.backend_config(&config);
        Arc::new(HttpBackend::new(&backend_config)?)
    };
    info!("Backend: {}", backend.describe());

    if cli.is_headless() {
        return tui::headless::run_headless(&cli, backend).await;
    }

    tui::run(&config, backend).await?;
    Ok(0)
}
