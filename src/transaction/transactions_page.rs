//! Defines the route handler for the page that records transactions and lists
//! the most recent ones.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use time::Date;

use crate::{
    AppState, Error, endpoints,
    html::{BUTTON_SECONDARY_STYLE, FORM_CONTAINER_STYLE, PAGE_CONTAINER_STYLE, base},
    lookup::{LookupItem, LookupKind},
    navigation::NavBar,
    pagination::PaginationConfig,
    timezone::local_today,
};

use super::{
    form::transaction_form,
    view::{ListPage, ListQuery, transactions_table},
};

fn load_error_banner(error: &Error) -> Markup {
    let (title, details) = error.user_message();

    html! {
        div
            class="w-full p-4 mb-4 text-sm text-red-800 rounded-lg bg-red-50 dark:bg-gray-800 dark:text-red-400"
            role="alert"
            data-load-error="true"
        {
            p class="font-medium" { (title) }
            p { (details) }

            button
                type="button"
                hx-post=(endpoints::RELOAD)
                hx-target-error="#alert-container"
                hx-disabled-elt="this"
                class={ (BUTTON_SECONDARY_STYLE) " mt-4 max-w-xs" }
            {
                "Retry"
            }
        }
    }
}

fn transactions_view(
    page: &ListPage,
    pagination_config: &PaginationConfig,
    today: Date,
    lookups: &[(LookupKind, Vec<LookupItem>)],
    load_error: Option<&Error>,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            @if let Some(error) = load_error {
                (load_error_banner(error))
            }

            div class={ (FORM_CONTAINER_STYLE) " w-full mb-8" }
            {
                (transaction_form(today, lookups))
            }

            section class="w-full max-w-screen-xl space-y-4"
            {
                h2 class="text-xl font-bold" { "Recent Transactions" }

                @if page.total == 0 {
                    p class="text-gray-500 dark:text-gray-400" data-empty-state="true"
                    {
                        "No transactions recorded yet."
                    }
                } @else {
                    (transactions_table(page, pagination_config, endpoints::TRANSACTIONS_VIEW))
                }
            }
        }
    };

    base("Transactions", &content)
}

/// Render the entry form and the most recently recorded transactions.
///
/// The list keeps recording order unless a sort is requested.
pub async fn get_transactions_page(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Response, Error> {
    let repository = state.repository()?;
    let today = local_today(&state.local_timezone)?;

    let lookups = LookupKind::ALL
        .into_iter()
        .map(|kind| repository.lookups(kind).map(|items| (kind, items)))
        .collect::<Result<Vec<_>, Error>>()?;
    let load_error = repository.load_error()?;
    let page = ListPage::build(repository.transactions()?, query, &state.pagination_config);

    Ok(transactions_view(
        &page,
        &state.pagination_config,
        today,
        &lookups,
        load_error.as_ref(),
    )
    .into_response())
}

/// A route handler for reloading the transactions from the store, redirects
/// to the transactions page.
///
/// A failed reload is shown as the load error banner on the page.
pub async fn reload_endpoint(State(state): State<AppState>) -> Response {
    let repository = match state.repository() {
        Ok(repository) => repository,
        Err(error) => return error.into_alert_response(),
    };

    if let Err(error) = repository.load().await {
        tracing::warn!("Reload requested by the user failed: {error}");
    }

    (
        HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
