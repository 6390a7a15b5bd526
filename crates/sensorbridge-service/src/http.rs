use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{Result, ServiceError};
use crate::store::LatestValueStore;

/// `status` field of the body returned before the first record.
pub const NO_DATA_STATUS: &str = "Not found";

/// `message` field of the body returned before the first record.
pub const NO_DATA_MESSAGE: &str = "Server is running, but no data has been received yet.";

#[derive(Debug, Serialize)]
struct NoDataBody {
    status: &'static str,
    message: &'static str,
}

/// Build the query service routes over `store`.
///
/// - `GET /data`: latest record (200) or the "no data yet" body (404)
/// - `GET /`: plain-text liveness probe
pub fn router(store: Arc<LatestValueStore>) -> Router {
    Router::new()
        .route("/", get(hello))
        .route("/data", get(latest))
        .with_state(store)
}

/// Bind the HTTP listener.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| ServiceError::Bind { addr, source })
}

/// Serve the query service on `listener` until `shutdown` is cancelled.
///
/// In-flight requests are allowed to finish after cancellation.
pub async fn serve(
    listener: TcpListener,
    store: Arc<LatestValueStore>,
    shutdown: CancellationToken,
) -> Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, "query service listening");

    axum::serve(listener, router(store))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!(%addr, "query service stopped");
    Ok(())
}

async fn hello() -> &'static str {
    "Hello World"
}

async fn latest(State(store): State<Arc<LatestValueStore>>) -> Response {
    match store.read() {
        Some(record) => Json(*record).into_response(),
        None => {
            debug!("no record published yet");
            (
                StatusCode::NOT_FOUND,
                Json(NoDataBody {
                    status: NO_DATA_STATUS,
                    message: NO_DATA_MESSAGE,
                }),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use sensorbridge_frame::SensorRecord;
    use tower::ServiceExt;

    use super::*;

    async fn call(store: Arc<LatestValueStore>, method: Method, uri: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = router(store).oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn data_is_404_before_first_record() {
        let store = Arc::new(LatestValueStore::new());
        let (status, body) = call(store, Method::GET, "/data").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "status": "Not found",
                "message": "Server is running, but no data has been received yet."
            })
        );
    }

    #[tokio::test]
    async fn data_returns_latest_record() {
        let store = Arc::new(LatestValueStore::new());
        store.publish(SensorRecord::new(22.1, 55.0));
        store.publish(SensorRecord::new(23.0, 50.0));

        let (status, body) = call(store, Method::GET, "/data").await;

        assert_eq!(status, StatusCode::OK);
        let record: SensorRecord = serde_json::from_slice(&body).unwrap();
        assert_eq!(record, SensorRecord::new(23.0, 50.0));
    }

    #[tokio::test]
    async fn data_is_served_as_json() {
        let store = Arc::new(LatestValueStore::new());
        store.publish(SensorRecord::new(21.5, 40.0));

        let request = Request::builder().uri("/data").body(Body::empty()).unwrap();
        let response = router(store).oneshot(request).await.unwrap();

        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[tokio::test]
    async fn root_says_hello() {
        let store = Arc::new(LatestValueStore::new());
        let (status, body) = call(store, Method::GET, "/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"Hello World");
    }

    #[tokio::test]
    async fn writes_are_not_routed() {
        let store = Arc::new(LatestValueStore::new());
        let (status, _) = call(Arc::clone(&store), Method::POST, "/data").await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn unknown_path_is_404() {
        let store = Arc::new(LatestValueStore::new());
        let (status, _) = call(store, Method::GET, "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
