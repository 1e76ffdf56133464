//! MagicStream API server binary.
//!
//! Loads `.env`, validates the signing secrets, connects to PostgreSQL (or
//! runs against in-memory stores) and serves the REST API until Ctrl-C.

use std::sync::Arc;

use clap::Parser;
use magicstream_api::AppState;
use magicstream_api::config::ApiConfig;
use magicstream_core::store::memory::{MemoryMovieStore, MemoryUserStore};
use magicstream_core::store::postgres::{PgMovieStore, PgUserStore};
use magicstream_core::store::{MovieStore, UserStore};
use sqlx::postgres::PgPoolOptions;
use tracing::{error, info, warn};

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "magicstream_server", about = "MagicStream API server")]
struct Args {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 4000)]
    port: u16,

    /// Interface to bind.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/magicstream"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 10)]
    max_connections: u32,

    /// Keep all records in memory instead of PostgreSQL. Data is lost on exit.
    #[arg(long, default_value_t = false)]
    in_memory: bool,
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {e}");
        return;
    }
    info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(
                    "info,magicstream_api=debug,magicstream_core=debug",
                )
            }),
        )
        .init();

    let args = Args::parse();

    // Missing or shared signing secrets stop the process here.
    let mut config = ApiConfig::from_env().inspect_err(|e| {
        error!("refusing to start: {e}");
    })?;
    config.bind_addr = format!("{}:{}", args.host, args.port);

    let (users, movies): (Arc<dyn UserStore>, Arc<dyn MovieStore>) = if args.in_memory {
        warn!("using in-memory stores; data will not survive a restart");
        (
            Arc::new(MemoryUserStore::new()),
            Arc::new(MemoryMovieStore::new()),
        )
    } else {
        info!(
            max_connections = args.max_connections,
            "connecting to PostgreSQL"
        );
        let pool = PgPoolOptions::new()
            .max_connections(args.max_connections)
            .acquire_timeout(config.store_timeout)
            .connect(&args.database_url)
            .await?;

        info!("running database migrations");
        magicstream_api::migrate(&pool).await?;

        (
            Arc::new(PgUserStore::new(pool.clone())),
            Arc::new(PgMovieStore::new(pool)),
        )
    };

    info!(
        access_ttl_secs = config.lifetimes.access().num_seconds(),
        refresh_ttl_secs = config.lifetimes.refresh().num_seconds(),
        store_timeout_secs = config.store_timeout.as_secs(),
        "auth configured"
    );

    let state = AppState {
        users,
        movies,
        config: config.clone(),
    };
    let app = magicstream_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}
