//! The page shown while the store connection is not configured.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};

use crate::{
    AppState, Error,
    alert::Alert,
    config::{STORE_KEY_VAR, STORE_URL_VAR},
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, LINK_STYLE, base, link},
};

const CODE_STYLE: &str = "px-1 rounded bg-gray-100 dark:bg-gray-700 font-mono text-sm";

fn setup_view(problem: Option<&str>) -> Markup {
    let content = html! {
        div class=(FORM_CONTAINER_STYLE)
        {
            div class="w-full space-y-4 py-8"
            {
                h1 class="text-2xl font-bold" { "Connect Your Database" }

                @match problem {
                    Some(problem) => {
                        p
                            class="p-4 text-sm text-red-800 rounded-lg bg-red-50 dark:bg-gray-800 dark:text-red-400"
                            data-configuration-problem="true"
                        {
                            (problem)
                        }
                    }
                    None => {
                        p
                        {
                            "The database is configured. "
                            (link(endpoints::TRANSACTIONS_VIEW, "Go to your transactions."))
                        }
                    }
                }

                p { "Set the project URL and access key of your hosted database in one of these ways:" }

                ol class="list-decimal list-inside space-y-2"
                {
                    li
                    {
                        "Set the environment variables "
                        code class=(CODE_STYLE) { (STORE_URL_VAR) }
                        " and "
                        code class=(CODE_STYLE) { (STORE_KEY_VAR) }
                        "."
                    }
                    li
                    {
                        "Or add "
                        code class=(CODE_STYLE) { "store_url" }
                        " and "
                        code class=(CODE_STYLE) { "store_key" }
                        " to the settings file."
                    }
                }

                p class="text-sm text-gray-500 dark:text-gray-400"
                {
                    "Replace the example values, e.g. "
                    code class=(CODE_STYLE) { "https://your-project-url.example.co" }
                    ", with your own. If the project has been paused, resume it from the "
                    "hosting dashboard first."
                }

                button
                    type="button"
                    hx-post=(endpoints::SETUP_RETRY)
                    hx-target-error="#alert-container"
                    hx-disabled-elt="this"
                    class=(BUTTON_PRIMARY_STYLE)
                {
                    "Retry"
                }

                a href=(endpoints::TRANSACTIONS_VIEW) class={ (LINK_STYLE) " block text-sm" }
                {
                    "Back to transactions"
                }
            }
        }
    };

    base("Setup", &content)
}

/// Explain how to configure the store connection.
pub async fn get_setup_page(State(state): State<AppState>) -> Response {
    setup_view(state.configuration_problem().as_deref()).into_response()
}

/// A route handler that reads the settings again, reconnects and loads the
/// transactions.
///
/// Redirects to the transactions page once the store is configured. A load
/// failure after that is shown there as the load error banner.
pub async fn retry_setup_endpoint(State(state): State<AppState>) -> Response {
    let repository = match state.reconnect() {
        Ok(repository) => repository,
        Err(Error::Configuration(reason)) => {
            return Alert::error("Database not configured", &reason)
                .into_response(StatusCode::SERVICE_UNAVAILABLE);
        }
        Err(error) => return error.into_alert_response(),
    };

    match repository.load().await {
        Ok(()) => tracing::info!("Connected to the store"),
        Err(error) => tracing::warn!("Connected but could not load transactions: {error}"),
    }

    (
        HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
