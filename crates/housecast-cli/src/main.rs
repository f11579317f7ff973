mod page;
mod server;

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use housecast_ai::ModelCache;

const DEFAULT_MODEL_URL: &str =
    "https://github.com/Nas365/LondonHousesPricePrediction-/releases/download/v1.0/best_random_forest.json";

/// Cache file name, resolved next to the executable unless overridden.
const MODEL_FILE: &str = "model_cache.json";

#[derive(Parser)]
#[command(name = "housecast", version, about = "London house price prediction service")]
struct Cli {
    /// Where to download the model artifact from on first run.
    #[arg(long, env = "MODEL_URL", default_value = DEFAULT_MODEL_URL, global = true)]
    model_url: String,

    /// Local cache path for the model artifact.
    #[arg(long, env = "MODEL_PATH", global = true)]
    model_path: Option<PathBuf>,

    /// Interface to bind.
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED), global = true)]
    host: IpAddr,

    #[arg(long, env = "PORT", default_value_t = 5000, global = true)]
    port: u16,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API (the default).
    Serve,
    /// Download and validate the model artifact, then exit.
    Fetch,
}

fn default_model_path() -> anyhow::Result<PathBuf> {
    let exe = std::env::current_exe().context("locating executable")?;
    let dir = exe
        .parent()
        .ok_or_else(|| anyhow::anyhow!("executable has no parent directory: {exe:?}"))?;
    Ok(dir.join(MODEL_FILE))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    tracing::info!("housecast v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let model_path = match cli.model_path {
        Some(path) => path,
        None => default_model_path()?,
    };
    let cache = ModelCache::new(cli.model_url, model_path).context("building HTTP client")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => server::run(cache, SocketAddr::new(cli.host, cli.port)).await,
        Command::Fetch => {
            let model = cache
                .load_predictor()
                .await
                .with_context(|| format!("loading model from {}", cache.url()))?;
            eprintln!(
                "  Model ready at {} ({} trees, {} inputs)",
                cache.path().display(),
                model.tree_count(),
                model.width()
            );
            Ok(())
        }
    }
}
