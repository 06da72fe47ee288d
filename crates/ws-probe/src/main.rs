/*
[INPUT]:  CLI arguments, optional YAML configuration file, OS shutdown signals
[OUTPUT]: Running stream sessions with periodic reports and graceful shutdown
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, startup flow, or shutdown handling
*/

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

use ws_probe::{LogLevel, Orchestrator, RunConfig};
use ws_probe_adapter::WsConnector;

#[derive(Parser, Debug, Default)]
#[command(name = "ws-probe", version, about = "Market-data WebSocket connection stability probe")]
struct Cli {
    /// YAML file with defaults; flags below override it
    #[arg(long = "config", value_name = "PATH")]
    config_path: Option<PathBuf>,
    /// Tunnel through the HTTP CONNECT proxy
    #[arg(long)]
    proxy: bool,
    /// Proxy host [default: 192.168.8.66]
    #[arg(long = "proxy-host", value_name = "HOST")]
    proxy_host: Option<String>,
    /// Proxy port [default: 6152]
    #[arg(long = "proxy-port", value_name = "PORT")]
    proxy_port: Option<u16>,
    /// Comma separated symbols [default: btcusdt,ethusdt,bnbusdt]
    #[arg(long, value_name = "LIST")]
    symbols: Option<String>,
    /// Kline interval [default: 1m]
    #[arg(long, value_name = "INTERVAL")]
    interval: Option<String>,
    /// DEBUG, INFO, WARNING or ERROR [default: INFO]
    #[arg(long = "log-level", value_name = "LEVEL")]
    log_level: Option<LogLevel>,
    /// Stream endpoint base URL
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,
    /// Also write logs to this file
    #[arg(long = "log-file", value_name = "PATH")]
    log_file: Option<PathBuf>,
    #[arg(long = "dry-run")]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let config = load_config(&args)?;
    let _guard = init_tracing(config.log_level, args.log_file.as_deref())?;

    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        warn!("rustls crypto provider already installed");
    }

    info!(
        symbols = %config.symbols.join(","),
        interval = %config.interval,
        proxy = config.proxy.enabled,
        proxy_addr = %format!("{}:{}", config.proxy.host, config.proxy.port),
        "starting ws-probe"
    );

    let connector =
        WsConnector::new(config.proxy.clone()).with_handshake_timeout(config.connect_timeout());
    let mut orchestrator =
        Orchestrator::new(config, Arc::new(connector)).context("build orchestrator")?;

    if args.dry_run {
        info!("dry-run requested; configuration validated");
        return Ok(());
    }

    let shutdown = orchestrator.shutdown_token();
    setup_signal_handlers(shutdown.clone());

    orchestrator.start().context("start sessions")?;

    shutdown.cancelled().await;
    info!("shutdown signal received");

    let states = orchestrator
        .shutdown_and_wait()
        .await
        .context("shutdown sessions")?;
    for state in &states {
        info!(
            symbol = %state.symbol,
            messages = state.message_count,
            consecutive_failures = state.consecutive_failures,
            "session final state"
        );
    }
    info!("shutdown complete");

    Ok(())
}

fn load_config(args: &Cli) -> Result<RunConfig> {
    let base = match &args.config_path {
        Some(path) => {
            let path_str = path.to_str().context("config path must be valid utf-8")?;
            RunConfig::from_file(path_str).context("load config")?
        }
        None => RunConfig::default(),
    };
    Ok(apply_overrides(base, args))
}

fn apply_overrides(mut config: RunConfig, args: &Cli) -> RunConfig {
    if args.proxy {
        config.proxy.enabled = true;
    }
    if let Some(host) = &args.proxy_host {
        config.proxy.host = host.clone();
    }
    if let Some(port) = args.proxy_port {
        config.proxy.port = port;
    }
    if let Some(symbols) = &args.symbols {
        config.symbols = symbols
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
    if let Some(interval) = &args.interval {
        config.interval = interval.clone();
    }
    if let Some(level) = args.log_level {
        config.log_level = level;
    }
    if let Some(endpoint) = &args.endpoint {
        config.endpoint = endpoint.clone();
    }
    config
}

/// `RUST_LOG` wins over the configured level when set
fn init_tracing(level: LogLevel, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level.as_filter()).context("invalid log level")?,
    };

    let Some(path) = log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .try_init()
            .map_err(|err| anyhow!(err))
            .context("initialize tracing subscriber")?;
        return Ok(None);
    };

    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path.file_name().context("log file path has no file name")?;
    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(std::io::stdout.and(file_writer))
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(Some(guard))
}

fn setup_signal_handlers(shutdown: CancellationToken) {
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to install SIGINT handler");
            return;
        }
        info!("received SIGINT");
        shutdown_clone.cancel();
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let shutdown_clone = shutdown.clone();
        tokio::spawn(async move {
            match signal(SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                    info!("received SIGTERM");
                    shutdown_clone.cancel();
                }
                Err(err) => {
                    warn!(error = %err, "failed to install SIGTERM handler");
                }
            }
        });
    }
}
