use anyhow::{Context, Result};
use clap::Parser;
use futures::future::join_all;
use std::fs::File;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use netassist::cli::Args;
use netassist::config::{Config, clamp_ping_count};
use netassist::diag::Diagnostics;
use netassist::dns::Resolver;
use netassist::prefs::Prefs;
use netassist::sink::StdoutSink;
use netassist::tui::{Theme, run_tui};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    init_logging(&args)?;

    // Cancellation token for graceful shutdown
    let cancel = CancellationToken::new();

    // Setup Ctrl+C handler
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        cancel_clone.cancel();
    });

    if args.is_streaming_mode() {
        let config = Config::from(&args);
        let resolver = Resolver::from_config(&config);
        run_streaming_mode(&args, Diagnostics::new(config, resolver), cancel).await
    } else {
        run_interactive_mode(args, cancel).await
    }
}

/// Install a tracing subscriber. Logs go to `--log-file` when given, to
/// stderr in streaming mode, and nowhere while the TUI owns the terminal.
fn init_logging(args: &Args) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    if let Some(ref path) = args.log_file {
        let file = File::create(path)
            .with_context(|| format!("Failed to create log file: {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else if args.is_streaming_mode() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    Ok(())
}

async fn run_streaming_mode(args: &Args, diag: Diagnostics, cancel: CancellationToken) -> Result<()> {
    // Validated above
    let target = args.target.clone().unwrap_or_default();
    let (ping, traceroute, dns) = args.selected_operations();
    let multiple = [ping, traceroute, dns].iter().filter(|&&on| on).count() > 1;

    let sink = |label: &str| {
        Arc::new(if multiple {
            StdoutSink::labelled(label)
        } else {
            StdoutSink::new()
        })
    };

    let mut handles = Vec::new();
    if ping {
        handles.extend(diag.stream_ping(&target, args.count, sink("ping")));
    }
    if traceroute {
        handles.extend(diag.stream_traceroute(&target, sink("traceroute")));
    }
    if dns {
        handles.extend(diag.stream_dns(&target, sink("dns")));
    }

    tokio::select! {
        results = join_all(handles) => {
            for result in results {
                if let Err(e) = result {
                    warn!("run failed: {}", e);
                }
            }
        }
        _ = cancel.cancelled() => {
            // Dropping the runtime drops the runs, which kills their children
            debug!("interrupted, abandoning runs");
        }
    }

    Ok(())
}

async fn run_interactive_mode(args: Args, cancel: CancellationToken) -> Result<()> {
    // Load saved preferences
    let prefs = Prefs::load();

    let mut config = Config::from(&args);
    if args.count == Config::default().ping_count as i64
        && let Some(count) = prefs.ping_count
    {
        config.ping_count = clamp_ping_count(count as i64);
    }
    let resolver = Resolver::from_config(&config);
    let diag = Diagnostics::new(config, resolver);

    // Determine theme: CLI override > saved preference > default
    let theme_name = if args.theme != "default" {
        &args.theme
    } else {
        prefs.theme.as_deref().unwrap_or("default")
    };
    let theme = Theme::by_name(theme_name);

    let initial_target = args
        .target
        .clone()
        .or_else(|| prefs.last_target.clone())
        .unwrap_or_default();

    let outcome = run_tui(diag, initial_target, theme, cancel).await?;

    // Save preferences (best effort, don't fail on save error)
    let mut prefs = Prefs::load();
    prefs.theme = Some(outcome.theme);
    let target = outcome.target.trim();
    prefs.last_target = (!target.is_empty()).then(|| target.to_string());
    prefs.ping_count = Some(outcome.count);
    if let Err(e) = prefs.save() {
        warn!("failed to save preferences: {:#}", e);
    }

    Ok(())
}
