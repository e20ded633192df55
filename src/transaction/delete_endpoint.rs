//! Defines the endpoint for deleting a transaction.

use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Response},
};

use crate::{AppState, alert::Alert, database_id::TransactionId};

/// A route handler for deleting a transaction.
///
/// On success the response body is empty, which removes the table row, plus
/// an out-of-band success alert. The status code has to be 200 OK or htmx
/// will not swap the row.
pub async fn delete_transaction_endpoint(
    State(state): State<AppState>,
    Path(transaction_id): Path<TransactionId>,
) -> Response {
    let repository = match state.repository() {
        Ok(repository) => repository,
        Err(error) => return error.into_alert_response(),
    };

    match repository.delete(transaction_id).await {
        Ok(()) => Html(
            Alert::success("Transaction deleted", "")
                .into_oob_html()
                .into_string(),
        )
        .into_response(),
        Err(error) => error.into_alert_response(),
    }
}
