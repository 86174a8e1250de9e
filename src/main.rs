//! medblob - decoder for medical BLOB columns.
//!
//! This binary starts the HTTP decode API or inspects a dumped response.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use medblob::{
    config::{Cli, Command, InspectConfig, ServeConfig},
    inspect::inspect_text,
    server::{create_router, RouterConfig},
    source::MemoryCellSource,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Serve(config) => run_serve(config).await,
        Command::Inspect(config) => run_inspect(config),
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("medblob v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");

    let source = match load_source(&config) {
        Ok(source) => source,
        Err(e) => {
            error!("Failed to load snapshot: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match config.snapshot {
        Some(ref path) => info!(
            "  Snapshot: {} ({} tables, {} rows)",
            path.display(),
            source.table_count(),
            source.row_count()
        ),
        None => warn!("  Snapshot: none - image and text endpoints will return 404"),
    }
    info!("  Cache max-age: {}s", config.cache_max_age);

    let router = create_router(source, build_router_config(&config));
    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    info!(
        "    curl -X POST http://{}/api/decode -H 'content-type: application/json' -d '{{\"value\":\"0x48656c6c6f\"}}'",
        addr
    );
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Load the configured snapshot, or an empty source without one.
fn load_source(config: &ServeConfig) -> Result<MemoryCellSource, String> {
    let Some(ref path) = config.snapshot else {
        return Ok(MemoryCellSource::new());
    };

    let json = std::fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    MemoryCellSource::from_snapshot_str(&json).map_err(|e| e.to_string())
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "medblob=debug,tower_http=debug"
    } else {
        "medblob=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application ServeConfig.
fn build_router_config(config: &ServeConfig) -> RouterConfig {
    let mut router_config = RouterConfig::new().with_cache_max_age(config.cache_max_age);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config.with_tracing(!config.no_tracing)
}

// =============================================================================
// Inspect Command
// =============================================================================

fn run_inspect(config: InspectConfig) -> ExitCode {
    if config.verbose {
        init_logging(true);
    }

    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let text = match std::fs::read_to_string(&config.input) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error: {}: {}", config.input.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let reports = match inspect_text(&text, config.preview_limit) {
        Ok(reports) => reports,
        Err(e) => {
            eprintln!("Error: {}: {}", config.input.display(), e);
            return ExitCode::FAILURE;
        }
    };

    if config.json {
        match serde_json::to_string_pretty(&reports) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else if reports.is_empty() {
        println!("(no imaging rows found under data.imagingData)");
    } else {
        for report in &reports {
            print!("{}", report);
        }
    }

    ExitCode::SUCCESS
}
