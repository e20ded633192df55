//! Application router configuration.

use axum::{
    Router,
    response::Redirect,
    routing::{delete, get, post},
};
use tower_http::services::ServeDir;

use crate::{
    AppState, endpoints,
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    search::{export_search_results, get_search_page, search_endpoint},
    setup::{get_setup_page, retry_setup_endpoint},
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_transactions_page,
        reload_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let pages = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::TRANSACTIONS_VIEW, get(get_transactions_page))
        .route(endpoints::SEARCH_VIEW, get(get_search_page))
        .route(endpoints::SEARCH_EXPORT, get(export_search_results))
        .route(endpoints::SETUP_VIEW, get(get_setup_page))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    // These routes are called by htmx and redirect with the HX-Redirect header.
    let api = Router::new()
        .route(
            endpoints::TRANSACTIONS_API,
            post(create_transaction_endpoint),
        )
        .route(
            endpoints::DELETE_TRANSACTION,
            delete(delete_transaction_endpoint),
        )
        .route(endpoints::RELOAD, post(reload_endpoint))
        .route(endpoints::SEARCH_API, post(search_endpoint))
        .route(endpoints::SETUP_RETRY, post(retry_setup_endpoint));

    pages
        .merge(api)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the transactions page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::TRANSACTIONS_VIEW)
}

#[cfg(test)]
mod root_route_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::{endpoints, routing::get_index_page};

    #[tokio::test]
    async fn root_redirects_to_transactions() {
        let response = get_index_page().await.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let location = response.headers().get("location").unwrap();
        assert_eq!(location, endpoints::TRANSACTIONS_VIEW);
    }
}
