use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info, Instrument};

use afiss_ingest::app::normalize_use_case::NormalizeUseCase;
use afiss_ingest::config::Config;
use afiss_ingest::infra::http_client::ReqwestSkyMapFetcher;
use afiss_ingest::infra::notice_store::InMemoryNoticeStore;
use afiss_ingest::normalize::NoticeNormalizer;
use afiss_ingest::{logging, metrics};

#[derive(Parser)]
#[command(name = "afiss_ingest")]
#[command(about = "Normalize VOEvent transient-alert notices into canonical records")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to $AFISS_CONFIG, then afiss.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize notice files and print one JSON row per notice
    Normalize {
        /// VOEvent XML files
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Pretty-print the JSON rows
        #[arg(long)]
        pretty: bool,
        /// Dump Prometheus metrics to stderr when done
        #[arg(long)]
        metrics: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Commands::Normalize {
            files,
            pretty,
            metrics: dump_metrics,
        } => {
            let handle = if dump_metrics {
                Some(metrics::init().map_err(anyhow::Error::msg)?)
            } else {
                None
            };

            let fetcher = ReqwestSkyMapFetcher::new(config.sky_map.clone())?;
            let normalizer = NoticeNormalizer::new(Arc::new(fetcher));
            let use_case = NormalizeUseCase::new(normalizer, Arc::new(InMemoryNoticeStore::new()));

            let mut failed = 0usize;
            for path in &files {
                let bytes = match std::fs::read(path) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        error!("Failed to read {}: {}", path.display(), e);
                        failed += 1;
                        continue;
                    }
                };
                let span = tracing::info_span!("notice", file = %path.display());
                match use_case.ingest(&bytes).instrument(span).await {
                    Ok(stored) => {
                        let row = stored.record.to_row()?;
                        let json = if pretty {
                            serde_json::to_string_pretty(&row)?
                        } else {
                            serde_json::to_string(&row)?
                        };
                        println!("{}", json);
                    }
                    Err(e) => {
                        error!("Failed to normalize {}: {}", path.display(), e);
                        failed += 1;
                    }
                }
            }

            info!(total = files.len(), failed, "normalization finished");
            if let Some(handle) = handle {
                eprintln!("{}", handle.render());
            }
            if failed > 0 {
                anyhow::bail!("{} of {} notices failed", failed, files.len());
            }
        }
    }
    Ok(())
}
