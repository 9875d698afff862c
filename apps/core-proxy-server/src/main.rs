mod config;
mod logging;
mod signals;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::{Request, Response, StatusCode};
use axum::middleware;
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tokio_util::sync::CancellationToken;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::field::Empty;

use core_proxy::{CoreProxy, problem_for_bare_errors};

use crate::config::{AppConfig, CliOverrides, DatabaseConfig, ServerConfig};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Core Proxy Server - authenticating, auditing gateway to the core service
#[derive(Parser)]
#[command(name = "core-proxy-server")]
#[command(about = "Core Proxy Server - authenticating, auditing gateway to the core service")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port override for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print effective configuration (YAML) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory SQLite database
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Validate configuration and exit
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = cli.config.as_deref()
        && !path.is_file()
    {
        anyhow::bail!("config file does not exist: {}", path.display());
    }

    // 1) defaults -> 2) YAML (if provided) -> 3) env (APP__*) -> 4) CLI overrides
    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_cli_overrides(CliOverrides {
        port: cli.port,
        verbose: cli.verbose,
        mock: cli.mock,
    });

    logging::init(&config.logging);

    if cli.print_config {
        println!("Effective configuration:\n{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(&config).await,
        Commands::Check => check_config(&config),
    }
}

fn check_config(config: &AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");
    config.server.bind_addr()?;
    config
        .core_proxy
        .validate()
        .context("invalid core_proxy section")?;
    println!("Configuration is valid");
    println!("{}", config.to_yaml()?);
    Ok(())
}

async fn connect_db(cfg: &DatabaseConfig) -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(cfg.dsn.clone());
    options
        .max_connections(cfg.max_conns.max(1))
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .context("failed to connect to database")?;
    tracing::info!("Connected to database");
    Ok(db)
}

async fn run_server(config: &AppConfig) -> Result<()> {
    tracing::info!("Core Proxy Server starting");
    let addr = config.server.bind_addr()?;

    let db = connect_db(&config.database).await?;
    let proxy = CoreProxy::init(&config.core_proxy, db).await?;
    let router = apply_middleware_stack(proxy.router(), &config.server);

    let cancel = CancellationToken::new();
    let sweeper = proxy.spawn_session_sweeper(config.server.session_sweep(), cancel.clone());
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if let Err(e) = signals::wait_for_shutdown().await {
                tracing::error!(error = %e, "Signal handling failed");
            }
            cancel.cancel();
        }
    });

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP server bound on {}", addr);

    let shutdown = {
        let cancel = cancel.clone();
        async move {
            cancel.cancelled().await;
            tracing::info!("HTTP server shutting down gracefully (cancellation)");
        }
    };
    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| anyhow::anyhow!(e));

    cancel.cancel();
    if let Err(e) = sweeper.await {
        tracing::warn!(error = %e, "Session sweeper ended abnormally");
    }
    served
}

/// Wrap the module router with the HTTP middleware stack.
///
/// Registered innermost first; requests flow `SetRequestId` ->
/// `PropagateRequestId` -> Trace -> problem rewriting -> Timeout ->
/// `BodyLimit` -> router.
fn apply_middleware_stack(router: Router, server: &ServerConfig) -> Router {
    router
        .layer(RequestBodyLimitLayer::new(server.body_limit_bytes))
        .layer(DefaultBodyLimit::max(server.body_limit_bytes))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::GATEWAY_TIMEOUT,
            server.request_timeout(),
        ))
        .layer(middleware::map_response(problem_for_bare_errors))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request<Body>| {
                    let rid = req
                        .headers()
                        .get("x-request-id")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("n/a");
                    tracing::info_span!(
                        "http_request",
                        method = %req.method(),
                        uri = %req.uri().path(),
                        request_id = %rid,
                        status = Empty,
                        latency_ms = Empty,
                    )
                })
                .on_response(
                    |res: &Response<Body>, latency: Duration, span: &tracing::Span| {
                        span.record("status", res.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                    },
                ),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}
