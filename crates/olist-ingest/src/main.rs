//! olist-ingest - bronze-layer ingestion tool

use anyhow::Result;
use clap::Parser;
use olist_common::logging::{init_logging, LogConfig, LogLevel};
use olist_ingest::config::Config;
use olist_ingest::kaggle::KaggleClient;
use olist_ingest::ledger::PgLedger;
use olist_ingest::sink::PgBronzeSink;
use olist_ingest::store::S3Store;
use olist_ingest::transfer::{list_local_files, upload_files};
use olist_ingest::{db, pipeline};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "olist-ingest")]
#[command(author, version, about = "Olist bronze-layer ingestion tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Parser, Debug)]
enum Command {
    /// Run the full pipeline: pull, upload, ingest, clean up
    Run,

    /// Drain the source prefix into bronze tables
    Ingest,

    /// Upload files from a local directory into category prefixes
    Upload {
        /// Directory holding the dataset files
        #[arg(short, long)]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env()
        .unwrap_or_default()
        .with_file_prefix("olist-ingest");
    if cli.verbose {
        log_config.level = LogLevel::Debug;
    }

    init_logging(&log_config)?;

    // Configuration errors abort here, before any file is touched.
    let config = Config::load()?;

    let pool = db::connect(&config.database).await?;
    let store = S3Store::new(&config.storage).await?;
    let ledger = PgLedger::new(pool.clone(), config.pipeline.schema.clone());
    let sink = PgBronzeSink::new(pool, config.pipeline.schema.clone());

    sink.ensure_schema().await?;
    ledger.init().await?;

    match cli.command {
        Command::Run => {
            let download_dir = PathBuf::from(&config.pipeline.scratch_dir).join("dataset");
            let source = KaggleClient::new(config.kaggle.clone(), download_dir);
            let summary = pipeline::run(&config.pipeline, &source, &store, &ledger, &sink).await?;
            info!("Run complete: {}", summary);
        }
        Command::Ingest => {
            let summary = pipeline::ingest(&config.pipeline, &store, &ledger, &sink).await?;
            info!("Ingest complete: {}", summary);
        }
        Command::Upload { path } => {
            let files = list_local_files(&path)?;
            let uploaded =
                upload_files(&store, &files, &config.pipeline.source_prefix).await?;
            info!("Uploaded {} files", uploaded);
        }
    }

    Ok(())
}
