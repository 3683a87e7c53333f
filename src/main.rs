use clap::Parser;
use rankx_api::{ContextConfig, DashboardContext, RestApi};
use rankx_attribution::SummaryOptions;
use rankx_core::EntityId;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Explainability dashboard server over a tabular dataset and a linear model
#[derive(Parser, Debug)]
#[command(name = "rankx")]
#[command(about = "Explainability dashboard server", long_about = None)]
struct Args {
    /// Dataset JSON file
    #[arg(short, long, default_value = "./data/dataset.json")]
    dataset: PathBuf,

    /// Model JSON file
    #[arg(short, long, default_value = "./data/model.json")]
    model: PathBuf,

    /// HTTP API port
    #[arg(long, default_value_t = 5000)]
    http_port: u16,

    /// Log level, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Entity ids kept out of similarity results, comma separated
    #[arg(long, value_delimiter = ',')]
    exclude: Vec<String>,

    /// Neighbours shown on an entity dashboard
    #[arg(long, default_value_t = 8)]
    neighbors: usize,

    /// Default result count for similarity search
    #[arg(long, default_value_t = 5)]
    similar_results: usize,

    /// Features listed in a gain ranking
    #[arg(long, default_value_t = 10)]
    gain_top_n: usize,

    /// Outcome quantile defining the reference cohort
    #[arg(long, default_value_t = 0.9)]
    reference_quantile: f64,

    /// Features shown in the attribution summary
    #[arg(long, default_value_t = 15)]
    summary_features: usize,

    /// Entities sampled for the attribution summary
    #[arg(long, default_value_t = 500)]
    summary_samples: usize,

    /// Seed of the summary sample
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

impl Args {
    fn context_config(&self) -> ContextConfig {
        ContextConfig {
            excluded: self
                .exclude
                .iter()
                .filter(|raw| !raw.trim().is_empty())
                .map(|raw| raw.trim().parse::<EntityId>().unwrap_or_else(|never| match never {}))
                .collect::<Vec<EntityId>>(),
            neighbors: self.neighbors,
            similar_results: self.similar_results,
            gain_top_n: self.gain_top_n,
            reference_quantile: self.reference_quantile,
            summary: SummaryOptions {
                top_features: self.summary_features,
                max_samples: self.summary_samples,
                seed: self.seed,
            },
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level.as_str()));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting RankX v{}", env!("CARGO_PKG_VERSION"));
    info!("Dataset: {:?}", args.dataset);
    info!("Model: {:?}", args.model);
    info!("HTTP API port: {}", args.http_port);

    let dataset = rankx_storage::load_dataset(&args.dataset, &args.model)?;
    info!(
        "Loaded {} entities over {} features",
        dataset.store.len(),
        dataset.store.schema().len()
    );

    let context = Arc::new(DashboardContext::build(
        dataset.store,
        dataset.model,
        args.context_config(),
    )?);
    info!("Dashboard context ready");

    let http_port = args.http_port;
    let http_handle = std::thread::spawn(move || {
        info!("Starting HTTP server on port {}", http_port);
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(context, http_port).await {
                error!("HTTP server error: {}", e);
            }
        })
    });

    info!("HTTP API: http://localhost:{}/api/entities", http_port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = tokio::task::spawn_blocking(move || {
            http_handle.join().ok();
        }) => {
            info!("HTTP server stopped");
        }
    }

    info!("Shutting down...");
    Ok(())
}
