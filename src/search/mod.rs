//! Searching transactions by date range and category, and exporting the
//! results.

mod export;
mod page;
mod query;

pub use export::export_search_results;
pub use page::{get_search_page, search_endpoint};
pub use query::{SearchSpec, build_search_query};
