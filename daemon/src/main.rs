//! gavel daemon — entry point for the governance indexer.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use gavel_api::{ApiServer, ApiState};
use gavel_indexer::{
    init_logging, IndexerConfig, IndexerService, LogFormat, ShutdownController, TracingObserver,
};
use gavel_ledger::StaticLedgerBackend;
use gavel_store::GovernorStore;
use gavel_store_lmdb::LmdbStore;
use gavel_store_memory::MemoryStore;

#[derive(Parser)]
#[command(name = "gavel-daemon", about = "Governance event indexer daemon")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Data directory for the LMDB store.
    #[arg(long, env = "GAVEL_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Storage backend: "lmdb" (durable) or "memory" (dev only).
    #[arg(long, env = "GAVEL_STORE_BACKEND")]
    store: Option<String>,

    /// Ledger sequence to start indexing from when no checkpoint exists.
    #[arg(long, env = "GAVEL_START_SEQ")]
    start_seq: Option<u32>,

    /// Newline-delimited JSON ledger dump to ingest.
    #[arg(long, env = "GAVEL_LEDGER_FILE")]
    ledger_file: Option<PathBuf>,

    /// Disable the read API.
    #[arg(long, env = "GAVEL_DISABLE_API")]
    no_api: bool,

    /// Read API port.
    #[arg(long, env = "GAVEL_API_PORT")]
    api_port: Option<u16>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "GAVEL_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "GAVEL_LOG_FORMAT")]
    log_format: Option<String>,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run ingestion and the read API together.
    Run,
    /// Run ingestion only.
    Index,
    /// Serve the read API only.
    Api,
}

fn merge_config(cli: &Cli) -> anyhow::Result<IndexerConfig> {
    let mut config = match &cli.config {
        Some(path) => IndexerConfig::from_toml_file(&path.display().to_string())?,
        None => IndexerConfig::default(),
    };

    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(store) = &cli.store {
        config.store_backend = store.clone();
    }
    if let Some(start_seq) = cli.start_seq {
        config.start_seq = start_seq;
    }
    if let Some(ledger_file) = &cli.ledger_file {
        config.ledger_file = Some(ledger_file.clone());
    }
    if cli.no_api {
        config.enable_api = false;
    }
    if let Some(api_port) = cli.api_port {
        config.api_port = api_port;
    }
    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone();
    }
    if let Some(log_format) = &cli.log_format {
        config.log_format = log_format.clone();
    }
    Ok(config)
}

fn open_store(config: &IndexerConfig) -> anyhow::Result<Arc<dyn GovernorStore>> {
    match config.store_backend.as_str() {
        "lmdb" => {
            let store = LmdbStore::open(&config.data_dir, config.lmdb_map_size)?;
            tracing::info!(data_dir = %config.data_dir.display(), "opened LMDB store");
            Ok(Arc::new(store))
        }
        "memory" => {
            tracing::warn!("using in-memory store; state is lost on exit");
            Ok(Arc::new(MemoryStore::new()))
        }
        other => anyhow::bail!("unknown store backend {other:?} (expected \"lmdb\" or \"memory\")"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = merge_config(&cli)?;

    init_logging(
        LogFormat::from_config(&config.log_format),
        &config.log_level,
    );

    let (ingest, serve_api) = match cli.command {
        Command::Run => (true, config.enable_api),
        Command::Index => (true, false),
        Command::Api => (false, config.enable_api),
    };

    tracing::info!(
        "starting gavel daemon (store: {}, api: {})",
        config.store_backend,
        if serve_api {
            config.api_port.to_string()
        } else {
            "off".into()
        },
    );

    let store = open_store(&config)?;
    let controller = Arc::new(ShutdownController::new());

    {
        let controller = controller.clone();
        tokio::spawn(async move { controller.wait_for_signal().await });
    }

    let api_task = if serve_api {
        let state = Arc::new(ApiState {
            store: store.clone(),
            source: config.source.clone(),
            health_staleness: Duration::from_secs(config.health_staleness_secs),
        });
        let server = ApiServer::new(config.api_port, state);
        let shutdown = controller.subscribe();
        Some(tokio::spawn(async move { server.start(shutdown).await }))
    } else {
        None
    };

    if ingest {
        let backend = match &config.ledger_file {
            Some(path) => {
                let backend = StaticLedgerBackend::from_json_file(path)?;
                tracing::info!(
                    ledgers = backend.len(),
                    file = %path.display(),
                    "loaded ledger dump"
                );
                backend
            }
            None => {
                tracing::warn!("no ledger_file configured; nothing to ingest");
                StaticLedgerBackend::default()
            }
        };

        let service = IndexerService::new(
            backend,
            store.clone(),
            Arc::new(TracingObserver),
            config.source.clone(),
            config.start_seq,
        );
        service.run(controller.subscribe()).await?;
        tracing::info!("ingestion finished");
    }

    // With the API enabled, keep serving reads until a signal arrives,
    // even after the ledger source is drained.
    if let Some(api_task) = api_task {
        api_task.await??;
    }

    tracing::info!("gavel daemon exited cleanly");
    Ok(())
}
