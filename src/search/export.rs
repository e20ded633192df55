//! Exports search results as a CSV download.

use axum::{
    extract::State,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use time::Date;

use crate::{AppState, Error, timezone::local_today, transaction::Transaction};

const HEADER: &str = "Date,Category,Item,Vendor,Amount,Account,Paid By";

/// A rendered CSV file ready to be downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    /// The suggested file name, e.g. `consumption_records_2024-01-31.csv`.
    pub filename: String,
    /// The file contents.
    pub content: String,
}

/// Render `transactions` as CSV, in the order given.
///
/// The header row is left unquoted and every data field is quoted, with
/// embedded quotes doubled. Rows end with `\n` except the last. Returns
/// `None` when there is nothing to export.
///
/// # Errors
///
/// Returns [Error::CsvError] if a row could not be written.
pub fn export_csv(transactions: &[Transaction], today: Date) -> Result<Option<CsvExport>, Error> {
    if transactions.is_empty() {
        return Ok(None);
    }

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    for transaction in transactions {
        writer
            .write_record([
                transaction.date.to_string(),
                transaction.category.clone(),
                transaction.item.clone(),
                transaction.vendor.clone(),
                format!("{:.2}", transaction.amount),
                transaction.from_account.clone(),
                transaction.paid_by.clone(),
            ])
            .map_err(|error| Error::CsvError(error.to_string()))?;
    }

    let rows = writer
        .into_inner()
        .map_err(|error| Error::CsvError(error.to_string()))?;
    let rows = String::from_utf8(rows).map_err(|error| Error::CsvError(error.to_string()))?;

    Ok(Some(CsvExport {
        filename: format!("consumption_records_{today}.csv"),
        content: format!("{HEADER}\n{}", rows.trim_end_matches('\n')),
    }))
}

/// Download the current search results as CSV.
///
/// Responds with `204 No Content` when no search has run or the last search
/// found nothing.
pub async fn export_search_results(State(state): State<AppState>) -> Response {
    match build_export(&state) {
        Ok(Some(export)) => csv_response(export),
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error.into_response(),
    }
}

fn build_export(state: &AppState) -> Result<Option<CsvExport>, Error> {
    let repository = state.repository()?;
    let results = repository.search_results()?.unwrap_or_default();
    let today = local_today(&state.local_timezone)?;

    let export = export_csv(&results, today)?;
    if let Some(export) = &export {
        tracing::info!("Exporting {} transactions to {}", results.len(), export.filename);
    }

    Ok(export)
}

fn csv_response(export: CsvExport) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", export.filename);

    match HeaderValue::from_str(&disposition) {
        Ok(disposition) => (
            [
                (
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("text/csv; charset=utf-8"),
                ),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            export.content,
        )
            .into_response(),
        Err(error) => {
            Error::CsvError(format!("invalid file name {}: {error}", export.filename))
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{extract::State, http::StatusCode};
    use time::macros::date;

    use crate::{
        AppState,
        config::Config,
        search::SearchSpec,
        store::SqliteStore,
        test_utils::{
            assert_content_type, assert_status_ok, get_header, new_transaction, seed_transaction,
            transaction_with,
        },
    };

    use super::{CsvExport, export_csv, export_search_results};

    #[test]
    fn nothing_to_export_for_empty_results() {
        assert_eq!(export_csv(&[], date!(2024 - 01 - 31)), Ok(None));
    }

    #[test]
    fn writes_header_and_quoted_rows() {
        let mut coffee = transaction_with(date!(2024 - 01 - 15), "Food", 4.5);
        coffee.vendor = "Cafe X".to_owned();
        let rent = transaction_with(date!(2024 - 01 - 01), "Housing", 900.0);

        let got = export_csv(&[coffee, rent], date!(2024 - 01 - 31)).unwrap();

        assert_eq!(
            got,
            Some(CsvExport {
                filename: "consumption_records_2024-01-31.csv".to_owned(),
                content: "Date,Category,Item,Vendor,Amount,Account,Paid By\n\
                    \"2024-01-15\",\"Food\",\"Coffee\",\"Cafe X\",\"4.50\",\"Checking\",\"Alice\"\n\
                    \"2024-01-01\",\"Housing\",\"Coffee\",\"Cafe X\",\"900.00\",\"Checking\",\"Alice\""
                    .to_owned(),
            })
        );
    }

    #[test]
    fn doubles_embedded_quotes() {
        let mut transaction = transaction_with(date!(2024 - 01 - 15), "Food", 1.0);
        transaction.item = "12\" pizza, large".to_owned();

        let export = export_csv(&[transaction], date!(2024 - 01 - 31))
            .unwrap()
            .unwrap();

        assert!(
            export.content.contains("\"12\"\" pizza, large\""),
            "got {}",
            export.content
        );
    }

    #[test]
    fn export_is_deterministic() {
        let transactions = [
            transaction_with(date!(2024 - 01 - 15), "Food", 4.5),
            transaction_with(date!(2024 - 01 - 16), "Travel", 12.0),
        ];

        let first = export_csv(&transactions, date!(2024 - 01 - 31)).unwrap();
        let second = export_csv(&transactions, date!(2024 - 01 - 31)).unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn no_content_before_a_search() {
        let state = AppState::with_store(
            Arc::new(SqliteStore::open_in_memory().unwrap()),
            &Config::default(),
        );

        let response = export_search_results(State(state)).await;

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn downloads_search_results_as_attachment() {
        let store = SqliteStore::open_in_memory().unwrap();
        seed_transaction(&store, new_transaction(date!(2024 - 01 - 15), "Food", 4.5)).await;
        let state = AppState::with_store(Arc::new(store), &Config::default());
        state
            .repository()
            .unwrap()
            .search(SearchSpec::default())
            .await
            .unwrap();

        let response = export_search_results(State(state)).await;

        assert_status_ok(&response);
        assert_content_type(&response, "text/csv; charset=utf-8");
        let disposition = get_header(&response, "content-disposition");
        assert!(
            disposition.starts_with("attachment; filename=\"consumption_records_")
                && disposition.ends_with(".csv\""),
            "got {disposition}"
        );
    }
}
