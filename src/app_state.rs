//! Implements a struct that holds the state of the REST server.

use std::{
    path::PathBuf,
    sync::{Arc, RwLock},
};

use crate::{
    Error,
    config::{Config, ConfigError},
    pagination::PaginationConfig,
    repository::Repository,
    store::{RemoteStore, RestStore},
};

/// Where the server gets its store from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreSource {
    /// Build a [RestStore] from the settings file at this path and the
    /// environment. The settings are read again on every reconnect.
    Settings(PathBuf),
    /// The store was given up front, e.g. a local SQLite database, and is
    /// never replaced.
    Fixed,
}

#[derive(Debug)]
enum Connection {
    Ready(Arc<Repository>),
    Unconfigured(String),
}

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,

    /// The config that controls how to display pages of data.
    pub pagination_config: PaginationConfig,

    recent_limit: usize,
    source: StoreSource,
    connection: Arc<RwLock<Connection>>,
}

impl AppState {
    /// Create a new [AppState] that reads records through `store`.
    pub fn with_store(store: Arc<dyn RemoteStore>, config: &Config) -> Self {
        let repository = Arc::new(Repository::new(store, config.recent_limit));

        Self::new(config, StoreSource::Fixed, Connection::Ready(repository))
    }

    /// Create a new [AppState] from the settings file at `path`.
    ///
    /// Invalid or incomplete settings do not stop the server: it starts
    /// unconfigured and every page sends the user to the setup page until a
    /// reconnect succeeds. No request is made to the store in that state.
    pub fn from_settings(path: PathBuf) -> Self {
        let (config, connection) = match Config::read(&path) {
            Ok(config) => {
                let connection = connect(&config);
                (config, connection)
            }
            Err(error) => {
                tracing::error!("Could not read settings: {error}");
                (Config::default(), Connection::Unconfigured(error.to_string()))
            }
        };

        Self::new(&config, StoreSource::Settings(path), connection)
    }

    fn new(config: &Config, source: StoreSource, connection: Connection) -> Self {
        Self {
            local_timezone: config.local_timezone.clone(),
            pagination_config: PaginationConfig {
                page_size: config.page_size,
                ..Default::default()
            },
            recent_limit: config.recent_limit,
            source,
            connection: Arc::new(RwLock::new(connection)),
        }
    }

    /// The record repository.
    ///
    /// # Errors
    ///
    /// Returns [Error::Configuration] while the store is not configured.
    pub fn repository(&self) -> Result<Arc<Repository>, Error> {
        let connection = self.connection.read().map_err(|_| Error::LockError)?;

        match &*connection {
            Connection::Ready(repository) => Ok(repository.clone()),
            Connection::Unconfigured(reason) => Err(Error::Configuration(reason.clone())),
        }
    }

    /// Why the store is not configured, if it is not.
    pub fn configuration_problem(&self) -> Option<String> {
        match self.repository() {
            Err(Error::Configuration(reason)) => Some(reason),
            _ => None,
        }
    }

    /// Read the settings again and replace the repository with a fresh one.
    ///
    /// With a fixed store the existing repository is kept.
    ///
    /// # Errors
    ///
    /// Returns [Error::Configuration] if the settings are still unusable.
    pub fn reconnect(&self) -> Result<Arc<Repository>, Error> {
        let connection = match &self.source {
            StoreSource::Fixed => return self.repository(),
            StoreSource::Settings(path) => match Config::read(path) {
                Ok(config) => connect(&Config {
                    recent_limit: self.recent_limit,
                    ..config
                }),
                Err(error) => {
                    tracing::error!("Could not read settings: {error}");
                    Connection::Unconfigured(error.to_string())
                }
            },
        };

        let result = match &connection {
            Connection::Ready(repository) => Ok(repository.clone()),
            Connection::Unconfigured(reason) => Err(Error::Configuration(reason.clone())),
        };

        *self.connection.write().map_err(|_| Error::LockError)? = connection;

        result
    }
}

fn connect(config: &Config) -> Connection {
    let credentials = match config.store_credentials() {
        Ok(credentials) => credentials,
        Err(error) => return unconfigured(error),
    };

    match RestStore::new(&credentials.url, &credentials.key) {
        Ok(store) => {
            tracing::info!("Using the store at {}", credentials.url);
            Connection::Ready(Arc::new(Repository::new(
                Arc::new(store),
                config.recent_limit,
            )))
        }
        Err(error) => {
            tracing::error!("Could not create the store client: {error}");
            Connection::Unconfigured(error.to_string())
        }
    }
}

fn unconfigured(error: ConfigError) -> Connection {
    tracing::warn!("The store is not configured: {error}");
    Connection::Unconfigured(error.to_string())
}
