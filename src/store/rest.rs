//! A [RemoteStore] for a hosted backend that exposes its tables through a
//! PostgREST-style HTTP API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde_json::Value;

use crate::database_id::DatabaseId;

use super::{Collection, FilterOp, Query, RemoteStore, Row, StoreError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Talks to `<endpoint>/rest/v1/<collection>` using an access key.
#[derive(Debug, Clone)]
pub struct RestStore {
    client: Client,
    base_url: String,
    access_key: String,
}

impl RestStore {
    /// Create a client for the backend at `endpoint_url`.
    ///
    /// No request is made until the first call.
    ///
    /// # Errors
    /// Returns [StoreError::Request] if the HTTP client cannot be built.
    pub fn new(endpoint_url: &str, access_key: &str) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|error| StoreError::Request(error.to_string()))?;

        Ok(Self {
            client,
            base_url: format!("{}/rest/v1", endpoint_url.trim_end_matches('/')),
            access_key: access_key.to_owned(),
        })
    }

    fn request(&self, method: Method, collection: Collection) -> RequestBuilder {
        self.client
            .request(method, format!("{}/{}", self.base_url, collection.name()))
            .header("apikey", &self.access_key)
            .bearer_auth(&self.access_key)
    }
}

#[async_trait]
impl RemoteStore for RestStore {
    async fn select(&self, collection: Collection, query: &Query) -> Result<Vec<Row>, StoreError> {
        let response = self
            .request(Method::GET, collection)
            .query(&query_params(query))
            .send()
            .await
            .map_err(transport_error)?;

        check_status(response)
            .await?
            .json::<Vec<Row>>()
            .await
            .map_err(transport_error)
    }

    async fn insert(
        &self,
        collection: Collection,
        rows: Vec<Row>,
    ) -> Result<Vec<Row>, StoreError> {
        let response = self
            .request(Method::POST, collection)
            .header("Prefer", "return=representation")
            .json(&rows)
            .send()
            .await
            .map_err(transport_error)?;

        check_status(response)
            .await?
            .json::<Vec<Row>>()
            .await
            .map_err(transport_error)
    }

    async fn delete(&self, collection: Collection, id: DatabaseId) -> Result<(), StoreError> {
        let response = self
            .request(Method::DELETE, collection)
            .query(&[("id", format!("eq.{id}"))])
            .send()
            .await
            .map_err(transport_error)?;

        check_status(response).await.map(|_| ())
    }
}

/// Encode `query` in the PostgREST query string dialect.
fn query_params(query: &Query) -> Vec<(String, String)> {
    let mut params = vec![("select".to_owned(), "*".to_owned())];

    for filter in &query.filters {
        let op = match filter.op {
            FilterOp::Gte => "gte",
            FilterOp::Lte => "lte",
            FilterOp::Eq => "eq",
        };
        params.push((filter.column.to_owned(), format!("{op}.{}", filter.value)));
    }

    if let Some(order) = query.order {
        let direction = if order.descending { "desc" } else { "asc" };
        params.push(("order".to_owned(), format!("{}.{direction}", order.column)));
    }

    if let Some(limit) = query.limit {
        params.push(("limit".to_owned(), limit.to_string()));
    }

    params
}

fn transport_error(error: reqwest::Error) -> StoreError {
    if error.is_connect() || error.is_timeout() || error.is_request() {
        tracing::error!("could not reach the store: {error}");
        StoreError::Network(error.to_string())
    } else {
        tracing::error!("store request failed: {error}");
        StoreError::Request(error.to_string())
    }
}

async fn check_status(response: Response) -> Result<Response, StoreError> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body).unwrap_or_else(|| status.to_string());

    match status {
        // A paused or restarting project sits behind a gateway that answers
        // with one of these.
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            Err(StoreError::Network(message))
        }
        _ => Err(StoreError::Request(message)),
    }
}

/// Extract the `message` field from a JSON error body.
fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()?
        .get("message")?
        .as_str()
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Json, Router,
        extract::{Query as QueryParams, State},
        http::{HeaderMap, StatusCode},
        response::IntoResponse,
        routing::get,
    };
    use serde_json::{Value, json};

    use crate::store::{Collection, Filter, Order, Query, RemoteStore, StoreError};

    use super::{RestStore, error_message, query_params};

    type Captured = Arc<Mutex<Vec<(String, String)>>>;

    async fn spawn_backend(captured: Captured) -> String {
        async fn list_transactions(
            State(captured): State<Captured>,
            headers: HeaderMap,
            QueryParams(params): QueryParams<Vec<(String, String)>>,
        ) -> impl IntoResponse {
            assert_eq!(headers.get("apikey").unwrap(), "test-key");
            assert_eq!(headers.get("authorization").unwrap(), "Bearer test-key");
            *captured.lock().unwrap() = params;

            Json(json!([{ "id": 1, "date": "2024-01-15" }]))
        }

        async fn create_transactions(Json(rows): Json<Value>) -> impl IntoResponse {
            let mut rows = rows;
            rows[0]["id"] = json!(7);
            (StatusCode::CREATED, Json(rows))
        }

        async fn rejected() -> impl IntoResponse {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "message": "column \"colour\" does not exist" })),
            )
        }

        async fn paused() -> impl IntoResponse {
            (StatusCode::SERVICE_UNAVAILABLE, "project paused")
        }

        let app = Router::new()
            .route(
                "/rest/v1/transactions",
                get(list_transactions).post(create_transactions),
            )
            .route("/rest/v1/categories", get(rejected).delete(rejected))
            .route("/rest/v1/accounts", get(paused))
            .with_state(captured);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        format!("http://{address}/")
    }

    #[test]
    fn encodes_filters_order_and_limit() {
        let query = Query::default()
            .filter(Filter::gte("date", "2024-01-01"))
            .filter(Filter::lte("date", "2024-01-31"))
            .filter(Filter::eq("category", "Food"))
            .order(Order::descending("date"))
            .limit(100);

        let got = query_params(&query);

        let want = [
            ("select", "*"),
            ("date", "gte.2024-01-01"),
            ("date", "lte.2024-01-31"),
            ("category", "eq.Food"),
            ("order", "date.desc"),
            ("limit", "100"),
        ]
        .map(|(key, value)| (key.to_owned(), value.to_owned()));
        assert_eq!(got, want);
    }

    #[test]
    fn reads_message_from_error_body() {
        assert_eq!(
            error_message(r#"{"code":"42703","message":"bad column"}"#),
            Some("bad column".to_owned())
        );
        assert_eq!(error_message("<html>Bad Gateway</html>"), None);
    }

    #[tokio::test]
    async fn select_sends_query_and_key() {
        let captured = Captured::default();
        let url = spawn_backend(captured.clone()).await;
        let store = RestStore::new(&url, "test-key").unwrap();

        let rows = store
            .select(
                Collection::Transactions,
                &Query::default().order(Order::ascending("date")).limit(5),
            )
            .await
            .expect("select should succeed");

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["date"], "2024-01-15");
        let params = captured.lock().unwrap().clone();
        assert!(params.contains(&("order".to_owned(), "date.asc".to_owned())));
        assert!(params.contains(&("limit".to_owned(), "5".to_owned())));
    }

    #[tokio::test]
    async fn insert_returns_stored_rows() {
        let url = spawn_backend(Captured::default()).await;
        let store = RestStore::new(&url, "test-key").unwrap();
        let row = json!({ "item": "Coffee" }).as_object().unwrap().clone();

        let rows = store
            .insert(Collection::Transactions, vec![row])
            .await
            .expect("insert should succeed");

        assert_eq!(rows[0]["id"], 7);
        assert_eq!(rows[0]["item"], "Coffee");
    }

    #[tokio::test]
    async fn rejected_request_is_a_request_error() {
        let url = spawn_backend(Captured::default()).await;
        let store = RestStore::new(&url, "test-key").unwrap();

        let result = store
            .select(Collection::Categories, &Query::default())
            .await;

        assert_eq!(
            result,
            Err(StoreError::Request(
                "column \"colour\" does not exist".to_owned()
            ))
        );
    }

    #[tokio::test]
    async fn rejected_delete_is_a_request_error() {
        let url = spawn_backend(Captured::default()).await;
        let store = RestStore::new(&url, "test-key").unwrap();

        let result = store.delete(Collection::Categories, 1).await;

        assert!(matches!(result, Err(StoreError::Request(_))));
    }

    #[tokio::test]
    async fn paused_project_is_a_network_error() {
        let url = spawn_backend(Captured::default()).await;
        let store = RestStore::new(&url, "test-key").unwrap();

        let result = store.select(Collection::Accounts, &Query::default()).await;

        assert!(
            matches!(result, Err(StoreError::Network(_))),
            "want network error, got {result:?}"
        );
    }

    #[tokio::test]
    async fn unreachable_host_is_a_network_error() {
        // Nothing listens on port 1.
        let store = RestStore::new("http://127.0.0.1:1", "test-key").unwrap();

        let result = store
            .select(Collection::Transactions, &Query::default())
            .await;

        assert!(
            matches!(result, Err(StoreError::Network(_))),
            "want network error, got {result:?}"
        );
    }
}
