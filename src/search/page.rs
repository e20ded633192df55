//! The search page and the endpoint that runs a search.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};

use crate::{
    AppState, Error, endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        LINK_STYLE, PAGE_CONTAINER_STYLE, base, loading_spinner,
    },
    lookup::{LookupItem, LookupKind},
    navigation::NavBar,
    pagination::PaginationConfig,
    transaction::{ListPage, ListQuery, transactions_table},
};

use super::query::{SearchForm, SearchSpec};

fn date_input(name: &str, label: &str, value: Option<String>) -> Markup {
    html! {
        div
        {
            label for=(name) class=(FORM_LABEL_STYLE) { (label) }

            input
                name=(name)
                id=(name)
                type="date"
                value=[value]
                class=(FORM_TEXT_INPUT_STYLE);
        }
    }
}

fn search_form(spec: &SearchSpec, categories: &[LookupItem]) -> Markup {
    let datalist_id = LookupKind::Category.datalist_id();

    html! {
        form
            hx-post=(endpoints::SEARCH_API)
            hx-target-error="#alert-container"
            hx-disabled-elt="find button[type=submit]"
            class="w-full space-y-4"
        {
            h2 class="text-xl font-bold" { "Search Transactions" }

            div class="grid gap-4 md:grid-cols-3"
            {
                (date_input("from_date", "From", spec.from_date.map(|date| date.to_string())))
                (date_input("to_date", "To", spec.to_date.map(|date| date.to_string())))

                div
                {
                    label for="category" class=(FORM_LABEL_STYLE) { "Category" }

                    input
                        name="category"
                        id="category"
                        type="text"
                        placeholder="Any category"
                        list=(datalist_id)
                        value=[spec.category.as_deref()]
                        autocomplete="off"
                        class=(FORM_TEXT_INPUT_STYLE);
                }
            }

            datalist id=(datalist_id)
            {
                @for category in categories {
                    option value=(category.name) {}
                }
            }

            button type="submit" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" { (loading_spinner()) }
                " Search"
            }
        }
    }
}

fn results_section(page: &ListPage, pagination_config: &PaginationConfig) -> Markup {
    html! {
        section class="w-full max-w-screen-xl space-y-4" data-search-results="true"
        {
            div class="flex justify-between items-center"
            {
                h2 class="text-xl font-bold" { "Results (" (page.total) ")" }

                @if page.total > 0 {
                    a
                        href=(endpoints::SEARCH_EXPORT)
                        download
                        class=(LINK_STYLE)
                        data-export-link="true"
                    {
                        "Export CSV"
                    }
                }
            }

            @if page.total == 0 {
                p class="text-gray-500 dark:text-gray-400" data-empty-state="true"
                {
                    "No transactions match this search."
                }
            } @else {
                (transactions_table(page, pagination_config, endpoints::SEARCH_VIEW))
            }
        }
    }
}

fn search_view(
    spec: &SearchSpec,
    categories: &[LookupItem],
    results: Option<&ListPage>,
    pagination_config: &PaginationConfig,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::SEARCH_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class={ (FORM_CONTAINER_STYLE) " w-full mb-8" }
            {
                (search_form(spec, categories))
            }

            @if let Some(page) = results {
                (results_section(page, pagination_config))
            }
        }
    };

    base("Search", &content)
}

/// Render the search form, prefilled with the last search, and its results.
///
/// No results section is shown until a search has run.
pub async fn get_search_page(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Response, Error> {
    let repository = state.repository()?;
    let spec = repository.last_search()?.unwrap_or_default();
    let categories = repository.lookups(LookupKind::Category)?;
    let results = repository
        .search_results()?
        .map(|results| ListPage::build(results, query, &state.pagination_config));

    Ok(search_view(&spec, &categories, results.as_ref(), &state.pagination_config).into_response())
}

/// A route handler for running a search, redirects to the first page of the
/// search results.
pub async fn search_endpoint(
    State(state): State<AppState>,
    Form(form): Form<SearchForm>,
) -> Response {
    match run_search(&state, form).await {
        Ok(()) => (
            HxRedirect(endpoints::SEARCH_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => error.into_alert_response(),
    }
}

async fn run_search(state: &AppState, form: SearchForm) -> Result<(), Error> {
    let spec = SearchSpec::try_from(form)?;
    let repository = state.repository()?;

    let results = repository.search(spec).await?;
    tracing::info!("Search found {} transactions", results.len());

    Ok(())
}
