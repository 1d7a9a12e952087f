//! Run command - drive the production controller until stopped.

use std::path::PathBuf;

use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use satforge::listener::ChannelListener;
use satforge::logging;
use satforge::provider::sim::{SimBackend, DEFAULT_SUN_ZENITH};
use satforge::{Controller, Notification};

use crate::error::CliError;

/// Arguments for the run command.
#[derive(Args)]
pub struct RunArgs {
    /// Path of the system configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: PathBuf,

    /// Constant sun zenith angle of the built-in backend, in degrees.
    #[arg(long, default_value_t = DEFAULT_SUN_ZENITH)]
    pub sun_zenith: f64,

    /// Fail areas whose definition is not registered instead of
    /// synthesising one.
    #[arg(long)]
    pub strict_areas: bool,
}

/// Run the run command.
pub fn run(args: RunArgs) -> Result<(), CliError> {
    logging::init(logging::DEFAULT_LOG_FILTER)
        .map_err(|e| CliError::Config(format!("Failed to initialize logging: {e}")))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Config(format!("Failed to start runtime: {e}")))?;

    let mut backend = SimBackend::new().with_sun_zenith(args.sun_zenith);
    if args.strict_areas {
        backend = backend.with_strict_areas();
    }

    let (_listener, sender, handle) = ChannelListener::new();
    let controller = Controller::new(&args.config, backend.build(), handle)?;

    // Print banner
    println!("Satforge Production Controller v{}", satforge::VERSION);
    println!("==================================");
    println!();
    println!("System config: {}", args.config.display());
    println!("Sun zenith:    {:.1} deg", args.sun_zenith);
    println!();
    println!("Feed JSON notifications on stdin, one per line:");
    println!("  {{\"subject\": \"/oper/NewFileArrived\", \"payload\": {{...}}}}");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    // Set up signal handler for graceful shutdown
    let shutdown = CancellationToken::new();
    let shutdown_clone = shutdown.clone();
    ctrlc::set_handler(move || {
        println!();
        println!("Received shutdown signal, stopping...");
        shutdown_clone.cancel();
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {e}")))?;

    let stats = runtime.block_on(async {
        let feeder = tokio::spawn(feed_stdin(sender));
        let stats = controller.run(shutdown).await;
        feeder.abort();
        stats
    });

    // Print final summary
    println!();
    println!("Session Summary");
    println!("───────────────");
    println!(
        "  Runs completed: {} ({} aborted)",
        stats.runs, stats.aborted_runs
    );
    println!("  Artifacts:      {}", stats.artifacts);
    println!("  Failures:       {}", stats.failures);
    println!("  Config reloads: {}", stats.config_reloads);
    Ok(())
}

/// Feeds JSON-encoded notifications from standard input into the
/// controller queue. Closing stdin shuts the controller down.
async fn feed_stdin(sender: mpsc::Sender<Notification>) {
    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match serde_json::from_str::<Notification>(line) {
                    Ok(notification) => {
                        if sender.send(notification).await.is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        warn!(error = %err, "Ignoring malformed notification line");
                    }
                }
            }
            Ok(None) => break,
            Err(err) => {
                warn!(error = %err, "Failed to read stdin");
                break;
            }
        }
    }
}
