#![forbid(unsafe_code)]
//! # Review Text Analytics server
//!
//! Serves the text analytics endpoints over a Yelp review dump.
//!
//! ## Example
//! ```bash
//! RUST_LOG=info cargo run --release -- --dataset yelp_academic_dataset_review.json --listen 0.0.0.0:5001
//! ```
//!
//! See `--help` for all available options.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use log::{error, info};
use review_text_analytics::{
    AnalyticsConfig, AnalyticsServer, AppState, DocumentSource, JsonLinesSource,
};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Review dump, one JSON object per line (Yelp `review.json`)
    #[arg(long, env = "REVIEW_DATASET")]
    dataset: PathBuf,

    /// Address to listen on
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:5001")]
    listen: SocketAddr,

    /// Optional TOML file with analysis settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum time a review cursor may stay open, in milliseconds
    #[arg(long)]
    max_time_ms: Option<u64>,

    /// Disable the permissive CORS layer
    #[arg(long, default_value_t = false)]
    no_cors: bool,
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match AnalyticsConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                error!("Error: {}", e);
                process::exit(1);
            }
        },
        None => AnalyticsConfig::default(),
    };

    let source = JsonLinesSource::new(&cli.dataset)
        .with_max_time(cli.max_time_ms.map(Duration::from_millis));
    // no traffic without a readable dataset
    if let Err(e) = source.ping().await {
        error!("Error: {}", e);
        process::exit(1);
    }
    info!("Serving reviews from {}", cli.dataset.display());

    let state = AppState::new(config, Arc::new(source)).with_cors(!cli.no_cors);
    if let Err(e) = AnalyticsServer::new(state).run(cli.listen).await {
        error!("Error: {}", e);
        process::exit(1);
    }
}
