use std::{fs::OpenOptions, net::SocketAddr, path::PathBuf, sync::Arc};

use axum::{
    Router,
    extract::{MatchedPath, Request},
};
use axum_server::Handle;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use consumption_tracker::{AppState, Config, SqliteStore, build_router, graceful_shutdown};

/// The web server for the consumption tracker.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the YAML settings file with the database URL and key.
    #[arg(long, default_value = "consumption.yaml")]
    config: PathBuf,

    /// Use a local SQLite database at this path instead of the hosted
    /// database.
    #[arg(long)]
    sqlite_path: Option<PathBuf>,

    /// The port to serve the app from.
    #[arg(short, long, default_value_t = 3000)]
    port: u16,
}

#[tokio::main]
async fn main() {
    setup_logging();

    let args = Args::parse();

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));

    let state = match args.sqlite_path {
        Some(sqlite_path) => {
            let config = Config::read(&args.config).unwrap_or_else(|error| {
                tracing::warn!("Could not read settings, using the defaults: {error}");
                Config::default()
            });
            let store = SqliteStore::open(&sqlite_path).unwrap_or_else(|error| {
                panic!("Could not open the database {}: {error}", sqlite_path.display())
            });
            tracing::info!("Using the local database {}", sqlite_path.display());

            AppState::with_store(Arc::new(store), &config)
        }
        None => AppState::from_settings(args.config),
    };

    match state.repository() {
        Ok(repository) => {
            if let Err(error) = repository.load().await {
                tracing::error!("Initial load failed: {error}");
            }
        }
        Err(error) => tracing::warn!("Starting in setup mode: {error}"),
    }

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(build_router(state));

    tracing::info!("HTTP server listening on {}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
        .expect("The server stopped unexpectedly.");
}

fn setup_logging() {
    let stdout_log = tracing_subscriber::fmt::layer().pretty();

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
        .expect("Could not create log file");

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(
            stdout_log
                .with_filter(filter::LevelFilter::INFO)
                .and_then(debug_log)
                .with_filter(filter::LevelFilter::DEBUG),
        )
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // By default, `TraceLayer` will log 5xx responses but the handlers
        // already log their errors, so disable that.
        .on_failure(());

    router.layer(tracing_layer)
}
