//! Defines the app level error type and conversions to rendered HTML pages and alerts.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_htmx::HxRedirect;

use crate::{
    alert::Alert, endpoints, internal_server_error::InternalServerError, store::StoreError,
};

/// The errors that may occur in the application.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum Error {
    /// The connection parameters for the store are missing or still hold
    /// placeholder values.
    ///
    /// No request is made to the store while this error is current. The user
    /// is sent to the setup page, which explains how to fix the configuration
    /// and offers a retry.
    #[error("the store is not configured: {0}")]
    Configuration(String),

    /// The store could not be reached, e.g. the host is down, the network is
    /// unavailable or the hosted project is paused.
    #[error("could not reach the store: {0}")]
    Network(String),

    /// The store was reached but rejected the request.
    #[error("the store rejected the request: {0}")]
    Request(String),

    /// The user's input failed validation before anything was sent to the store.
    #[error("invalid input: {0}")]
    Validation(String),

    /// A transaction is already being saved.
    ///
    /// Raised when the entry form is submitted again before the previous
    /// submission has finished.
    #[error("a transaction is already being saved")]
    InsertInProgress,

    /// A row returned by the store could not be read as a domain model.
    #[error("could not read a record from the store: {0}")]
    InvalidRecord(String),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezone(String),

    /// Could not acquire the lock on the in-memory records.
    #[error("could not acquire the lock on the cached records")]
    LockError,

    /// The CSV export could not be written.
    #[error("could not write the CSV export: {0}")]
    CsvError(String),
}

impl From<StoreError> for Error {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Network(message) => Error::Network(message),
            StoreError::Request(message) => Error::Request(message),
        }
    }
}

impl Error {
    /// A short title and a longer explanation suitable for showing to the user.
    pub fn user_message(&self) -> (&'static str, String) {
        match self {
            Error::Configuration(message) => (
                "Database not configured",
                format!("{message}. Update the configuration and try again."),
            ),
            Error::Network(_) => (
                "Could not reach the database",
                "Check your internet connection. If the database project has been paused, \
                resume it from the hosting dashboard and try again."
                    .to_owned(),
            ),
            Error::Request(message) => ("The database rejected the request", message.clone()),
            Error::Validation(message) => ("Invalid transaction", message.clone()),
            Error::InsertInProgress => (
                "Already saving",
                "Wait for the current submission to finish.".to_owned(),
            ),
            Error::InvalidTimezone(timezone) => (
                "Invalid Timezone Settings",
                format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            ),
            Error::InvalidRecord(_) | Error::LockError | Error::CsvError(_) => (
                "Something went wrong",
                "An unexpected error occurred, check the server logs for more details.".to_owned(),
            ),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Error::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Network(_) => StatusCode::BAD_GATEWAY,
            Error::Request(_) | Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::InsertInProgress => StatusCode::CONFLICT,
            Error::InvalidRecord(_)
            | Error::InvalidTimezone(_)
            | Error::LockError
            | Error::CsvError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Render the error as an alert for an htmx request.
    ///
    /// A configuration error redirects the client to the setup page instead.
    pub fn into_alert_response(self) -> Response {
        if let Error::Configuration(_) = self {
            return (
                HxRedirect(endpoints::SETUP_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response();
        }

        let status_code = self.status_code();
        let (message, details) = self.user_message();
        Alert::error(message, &details).into_response(status_code)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::Configuration(_) => Redirect::to(endpoints::SETUP_VIEW).into_response(),
            Error::InvalidTimezone(_) => {
                let (description, fix) = self.user_message();
                InternalServerError {
                    description,
                    fix: &fix,
                }
                .into_response()
            }
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}
