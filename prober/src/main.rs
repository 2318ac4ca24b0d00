use clap::{Parser, ValueEnum};
use log::info;
use prober::classifier::{ClassifierSettings, JoinClassifier};
use prober::matcher::ReasonMatcher;
use prober::network::CommandClient;
use prober::protocol::{JoinRequest, Pinger};
use shared::{AuthMode, Endpoint};
use std::sync::Arc;
use std::time::Duration;

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Mode {
    Offline,
    Authenticated,
}

impl From<Mode> for AuthMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Offline => AuthMode::Offline,
            Mode::Authenticated => AuthMode::Authenticated,
        }
    }
}

/// Probe a single server by hand
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address, host or host:port
    #[arg(short = 's', long)]
    server: String,

    /// Client version to join with; only pings when omitted
    #[arg(short = 'v', long = "client-version")]
    client_version: Option<String>,

    /// Authentication mode of the probe
    #[arg(short = 'm', long, value_enum, default_value = "offline")]
    mode: Mode,

    /// Account or offline username
    #[arg(short = 'u', long, default_value = "Prober")]
    username: String,

    /// Protocol helper command, program first
    #[arg(short = 'c', long, num_args = 1.., required = true)]
    command: Vec<String>,

    /// Connect timeout in milliseconds
    #[arg(long, default_value = "6000")]
    connect_timeout: u64,

    /// Post-login confirmation window in milliseconds
    #[arg(long, default_value = "3000")]
    confirm_window: u64,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let endpoint = Endpoint::parse(&args.server)
        .ok_or_else(|| format!("invalid server address: {}", args.server))?;
    let client = Arc::new(CommandClient::new(&args.command, Duration::from_secs(5))?);

    let status = client.ping(&endpoint.host, endpoint.port).await?;
    info!("{} reports protocol {}", endpoint, status.protocol);

    let Some(version) = args.client_version else {
        println!("{} protocol {}", endpoint, status.protocol);
        return Ok(());
    };

    let settings = ClassifierSettings {
        connect_timeout: Duration::from_millis(args.connect_timeout),
        confirm_window: Duration::from_millis(args.confirm_window),
        ..ClassifierSettings::default()
    };
    let classifier = JoinClassifier::new(client, ReasonMatcher::default(), settings);

    let request = JoinRequest {
        username: args.username,
        auth_mode: args.mode.into(),
        host: endpoint.host.clone(),
        port: endpoint.port,
        version,
    };

    info!("Probing {} as {} ({})", endpoint, request.username, request.auth_mode);
    let outcome = classifier.classify(&request).await;
    println!("{} {} {}", endpoint, request.auth_mode, outcome);

    Ok(())
}
