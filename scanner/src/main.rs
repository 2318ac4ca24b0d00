use clap::Parser;
use log::{info, warn};
use prober::network::CommandClient;
use scanner::catalog::HttpCatalog;
use scanner::config::ScanConfig;
use scanner::orchestrator::{run, CancelFlag, Collaborators};
use scanner::store::BincodeStore;
use std::path::PathBuf;
use std::sync::Arc;

/// Probe bookmarked servers for whitelist and offline-mode policy
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the JSON config file
    #[arg(short = 'c', long, default_value = "config.json")]
    config: PathBuf,

    /// Record store file, overrides storePath
    #[arg(short = 's', long)]
    store: Option<PathBuf>,

    /// Protocol catalog URL, overrides catalogUrl
    #[arg(long)]
    catalog_url: Option<String>,

    /// Protocol helper command, overrides clientCommand
    #[arg(long, num_args = 1..)]
    client_command: Option<Vec<String>>,

    /// Maximum cracked probes in flight, overrides concurrency
    #[arg(short = 'j', long)]
    concurrency: Option<usize>,

    /// Delete servers that do not answer
    #[arg(long)]
    delete_offline: bool,

    /// Scan without saving the result
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let mut config = ScanConfig::from_file(&args.config)?;
    if let Some(store) = args.store {
        config.store_path = store;
    }
    if let Some(url) = args.catalog_url {
        config.catalog_url = url;
    }
    if let Some(command) = args.client_command {
        config.client_command = command;
    }
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    config.delete_offline |= args.delete_offline;
    config.validate()?;

    let client = Arc::new(CommandClient::new(
        &config.client_command,
        config.ping_timeout(),
    )?);

    let collaborators = Collaborators {
        store: Arc::new(BincodeStore::new(&config.store_path)),
        catalog: Arc::new(HttpCatalog::new(&config.catalog_url)),
        pinger: client.clone(),
        join_client: client,
    };

    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if cancel.trigger() {
                    warn!("Received Ctrl+C, finishing running probes before saving...");
                } else {
                    info!("Already stopping");
                }
            }
        });
    }

    let summary = run(config, collaborators, cancel, args.dry_run).await?;
    println!("{}", summary);

    Ok(())
}
