//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/transactions/{transaction_id}',
//! use [format_endpoint].

/// The root route which redirects to the transactions page.
pub const ROOT: &str = "/";
/// The page for recording and listing transactions.
pub const TRANSACTIONS_VIEW: &str = "/transactions";
/// The page for searching transactions.
pub const SEARCH_VIEW: &str = "/search";
/// The route for downloading the current search results as CSV.
pub const SEARCH_EXPORT: &str = "/search/export";
/// The page explaining how to configure the database connection.
pub const SETUP_VIEW: &str = "/setup";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route to create a transaction.
pub const TRANSACTIONS_API: &str = "/api/transactions";
/// The route to delete a single transaction.
pub const DELETE_TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route to reload the transactions from the database.
pub const RELOAD: &str = "/api/reload";
/// The route to run a search.
pub const SEARCH_API: &str = "/api/search";
/// The route to re-read the configuration and reconnect.
pub const SETUP_RETRY: &str = "/api/setup/retry";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map_or(endpoint_path.len(), |end| param_start + end + 1);

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
