//! Waves lease canceller
//!
//! Cancels every active lease of a single account: builds, signs and
//! broadcasts one lease cancel transaction per lease, or prints them with
//! `--dry-run`.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use log::{error, info, warn};
use tokio_util::sync::CancellationToken;

use lease_canceller::canceller::Canceller;
use lease_canceller::config::{CancellerConfig, DEFAULT_NODE_URL};
use lease_canceller::error::CancellerError;

/// Unclassified failure, outside the run's error taxonomy
const EXIT_UNCLASSIFIED: i32 = 1;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "lease-canceller")]
#[command(about = "Waves Leasing Canceller - cancels all active leases of an account")]
#[command(version)]
struct Args {
    /// Node's REST API URL
    #[arg(long = "node-api", default_value = DEFAULT_NODE_URL)]
    node_api: String,

    /// Base58 encoded private key of the account
    #[arg(long = "account-sk")]
    account_sk: Option<String>,

    /// Base58 encoded public key of the account
    #[arg(long = "account-pk")]
    account_pk: Option<String>,

    /// Test execution without creating real transactions on blockchain
    #[arg(long)]
    dry_run: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level)).init();

    let code = match start(args) {
        Ok(Ok(())) => 0,
        Ok(Err(e)) => {
            match &e {
                CancellerError::UserTermination => warn!("{}", e),
                _ => error!("{}", e),
            }
            if e.shows_usage() {
                eprintln!("{}", usage());
            }
            e.exit_code()
        }
        Err(e) => {
            error!("{:#}", e);
            EXIT_UNCLASSIFIED
        }
    };
    std::process::exit(code);
}

/// Usage text shown after invalid parameters
fn usage() -> String {
    Args::command().render_help().to_string()
}

/// Start the runtime and execute the run; the outer error is unclassified
fn start(args: Args) -> Result<std::result::Result<(), CancellerError>> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    Ok(runtime.block_on(run(args)))
}

async fn run(args: Args) -> std::result::Result<(), CancellerError> {
    let config = CancellerConfig::new(
        &args.node_api,
        args.account_sk.as_deref().unwrap_or_default(),
        args.account_pk.as_deref(),
        args.dry_run,
    )?;

    let cancel = interrupt_listener();
    let canceller = Canceller::connect(config, cancel)?;
    let report = canceller.run().await?;

    info!(
        "Cancelled {} leasings of '{}' at {} per transaction",
        report.lease_count,
        report.address,
        lease_canceller::utils::format_amount(report.fee)
    );
    info!("OK");
    Ok(())
}

/// Cancel the returned token on Ctrl+C or SIGTERM
fn interrupt_listener() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Interrupt received, stopping");
        token.cancel();
    });
    cancel
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
