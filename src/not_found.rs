//! The page shown for routes that do not exist.
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::html::error_view;

pub async fn get_404_not_found() -> Response {
    get_404_not_found_response()
}

pub fn get_404_not_found_response() -> Response {
    let page = error_view(
        "Not Found",
        "404",
        "Page not found",
        "Check the address, or head back to your transactions.",
    );

    (StatusCode::NOT_FOUND, Html(page.into_string())).into_response()
}
