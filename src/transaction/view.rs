//! HTML rendering for sortable, paginated transaction tables.

use maud::{Markup, html};
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::{
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_DELETE_STYLE, CATEGORY_BADGE_STYLE, LINK_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, format_currency,
    },
    pagination::{
        PaginationConfig, PaginationIndicator, clamp_page, create_pagination_indicators,
        page_count, page_slice,
    },
};

use super::{
    Transaction,
    sort::{SortConfig, SortDirection, SortField, sort_transactions},
};

/// The max number of graphemes to display in the transaction table cells before
/// truncating and displaying ellipses.
const MAX_TEXT_GRAPHEMES: usize = 32;

/// The query parameters shared by the pages that list transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<SortDirection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
}

impl ListQuery {
    /// The requested sort. A field without a direction sorts ascending.
    pub fn sort_config(self) -> Option<SortConfig> {
        self.sort.map(|field| SortConfig {
            field,
            direction: self.direction.unwrap_or(SortDirection::Ascending),
        })
    }

    fn with_sort(sort: Option<SortConfig>, page: u64) -> Self {
        Self {
            sort: sort.map(|sort| sort.field),
            direction: sort.map(|sort| sort.direction),
            page: Some(page),
        }
    }

    pub fn to_url(self, route: &str) -> String {
        match serde_urlencoded::to_string(self) {
            Ok(query) if !query.is_empty() => format!("{route}?{query}"),
            Ok(_) => route.to_owned(),
            Err(error) => {
                tracing::error!("Could not encode list query {self:?}: {error}");
                route.to_owned()
            }
        }
    }
}

/// One page of a sorted transaction list.
#[derive(Debug, Clone, PartialEq)]
pub struct ListPage {
    pub rows: Vec<Transaction>,
    pub sort: Option<SortConfig>,
    pub page: u64,
    pub page_count: u64,
    pub total: usize,
}

impl ListPage {
    /// Sort `transactions` as requested and cut out the requested page.
    ///
    /// Without a sort the given order is kept. A page past the end, e.g.
    /// after the last row of the last page was deleted, shows the last page.
    pub fn build(
        mut transactions: Vec<Transaction>,
        query: ListQuery,
        pagination_config: &PaginationConfig,
    ) -> Self {
        let sort = query.sort_config();
        if let Some(sort) = sort {
            sort_transactions(&mut transactions, sort);
        }

        let page_size = pagination_config.page_size;
        let page_count = page_count(transactions.len(), page_size);
        let page = clamp_page(query.page.unwrap_or(1), page_count);

        Self {
            rows: page_slice(&transactions, page, page_size).to_vec(),
            sort,
            page,
            page_count,
            total: transactions.len(),
        }
    }
}

/// Shorten `text` for display, returning the full text as a tooltip when it
/// was cut.
fn truncate_text(text: &str) -> (String, Option<&str>) {
    let length = text.graphemes(true).count();

    if length <= MAX_TEXT_GRAPHEMES {
        (text.to_owned(), None)
    } else {
        let truncated: String = text.graphemes(true).take(MAX_TEXT_GRAPHEMES - 3).collect();
        (truncated + "...", Some(text))
    }
}

fn text_cell(text: &str) -> Markup {
    let (text, tooltip) = truncate_text(text);

    html! {
        td class=(TABLE_CELL_STYLE) title=[tooltip] { (text) }
    }
}

fn sort_header(field: SortField, current: Option<SortConfig>, route: &str) -> Markup {
    let href = ListQuery::with_sort(Some(SortConfig::toggle(current, field)), 1).to_url(route);
    let (indicator, aria_sort) = match current {
        Some(sort) if sort.field == field => match sort.direction {
            SortDirection::Ascending => (" ▲", "ascending"),
            SortDirection::Descending => (" ▼", "descending"),
        },
        _ => ("", "none"),
    };

    html! {
        th scope="col" class="px-6 py-3" aria-sort=(aria_sort)
        {
            a href=(href) class="hover:underline" data-sort-field=(field.label())
            {
                (field.label()) (indicator)
            }
        }
    }
}

fn transaction_row(transaction: &Transaction) -> Markup {
    html! {
        tr class=(TABLE_ROW_STYLE) data-transaction-row="true"
        {
            td class=(TABLE_CELL_STYLE)
            {
                time datetime=(transaction.date) { (transaction.date) }
            }
            td class=(TABLE_CELL_STYLE)
            {
                span class=(CATEGORY_BADGE_STYLE) { (transaction.category) }
            }
            (text_cell(&transaction.item))
            (text_cell(&transaction.vendor))
            td class={ (TABLE_CELL_STYLE) " text-right" } { (format_currency(transaction.amount)) }
            (text_cell(&transaction.from_account))
            (text_cell(&transaction.paid_by))
            td class=(TABLE_CELL_STYLE)
            {
                @if let Some(id) = transaction.id {
                    button
                        hx-delete=(format_endpoint(endpoints::DELETE_TRANSACTION, id))
                        hx-confirm={
                            "Are you sure you want to delete '" (transaction.item) "' from "
                            (transaction.date) "? This cannot be undone."
                        }
                        hx-target="closest tr"
                        hx-target-error="#alert-container"
                        hx-swap="outerHTML"
                        class=(BUTTON_DELETE_STYLE)
                    {
                        "Delete"
                    }
                }
            }
        }
    }
}

fn pagination_nav(page: &ListPage, max_pages: u64, route: &str) -> Markup {
    if page.page_count <= 1 {
        return html! {};
    }

    let indicators = create_pagination_indicators(page.page, page.page_count, max_pages);
    let href = |page_number: u64| ListQuery::with_sort(page.sort, page_number).to_url(route);

    html! {
        nav class="pagination flex justify-center py-4" aria-label="Pagination"
        {
            ul class="flex items-center gap-2"
            {
                @for indicator in indicators {
                    li
                    {
                        @match indicator {
                            PaginationIndicator::Page(number) => {
                                a href=(href(number)) class=(LINK_STYLE) { (number) }
                            }
                            PaginationIndicator::CurrPage(number) => {
                                span aria-current="page" class="font-bold" { (number) }
                            }
                            PaginationIndicator::Ellipsis => {
                                span { "..." }
                            }
                            PaginationIndicator::BackButton(number) => {
                                a href=(href(number)) role="button" class=(LINK_STYLE) { "Back" }
                            }
                            PaginationIndicator::NextButton(number) => {
                                a href=(href(number)) role="button" class=(LINK_STYLE) { "Next" }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Render `page` as a table with sortable column headers and page links
/// pointing back at `route`.
pub fn transactions_table(
    page: &ListPage,
    pagination_config: &PaginationConfig,
    route: &str,
) -> Markup {
    html! {
        div class="relative overflow-x-auto shadow-md sm:rounded-lg w-full"
        {
            table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        @for field in SortField::COLUMNS {
                            (sort_header(field, page.sort, route))
                        }
                        th scope="col" class="px-6 py-3" { "Actions" }
                    }
                }

                tbody
                {
                    @for transaction in &page.rows {
                        (transaction_row(transaction))
                    }
                }
            }
        }

        (pagination_nav(page, pagination_config.max_pages, route))
    }
}
