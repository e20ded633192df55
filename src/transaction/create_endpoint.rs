//! Defines the endpoint for recording a new transaction.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;

use crate::{AppState, Error, endpoints};

use super::{NewTransaction, form::TransactionForm};

/// A route handler for recording a new transaction, redirects to the first
/// page of the transactions view on success.
pub async fn create_transaction_endpoint(
    State(state): State<AppState>,
    Form(form): Form<TransactionForm>,
) -> Response {
    match create_transaction(&state, form).await {
        Ok(()) => (
            HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => error.into_alert_response(),
    }
}

async fn create_transaction(state: &AppState, form: TransactionForm) -> Result<(), Error> {
    let candidate = NewTransaction::try_from(form)?;
    let repository = state.repository()?;

    repository.insert(candidate).await?;

    Ok(())
}
