//! A personal consumption tracker.
//!
//! Record what you spend (date, category, item, vendor, amount, the account
//! it came from and who paid) into a hosted relational database, browse and
//! sort the most recent transactions, and search by date range and category
//! with CSV export of the results.
//!
//! This library provides a web server that directly serves HTML pages.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod alert;
mod app_state;
mod config;
mod database_id;
mod endpoints;
mod error;
mod html;
mod internal_server_error;
mod lookup;
mod navigation;
mod not_found;
mod pagination;
mod repository;
mod routing;
mod search;
mod setup;
mod store;
mod timezone;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use config::{Config, ConfigError};
pub use error::Error;
pub use repository::Repository;
pub use routing::build_router;
pub use store::{
    Collection, Filter, FilterOp, Order, Query, RemoteStore, RestStore, Row, SqliteStore,
    StoreError,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
