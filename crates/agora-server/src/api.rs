use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{
        header::{CACHE_CONTROL, CONTENT_TYPE},
        Method,
    },
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use agora_shared::constants::MEDIA_CACHE_CONTROL;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::media::{MediaFetcher, MediaProxy};
use crate::metrics::{track_requests, Metrics};

const METRICS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";
const METRICS_CACHE_CONTROL: &str = "no-store, no-cache, must-revalidate";

pub struct AppState<F> {
    pub proxy: Arc<MediaProxy<F>>,
    pub metrics: Metrics,
    pub config: Arc<ServerConfig>,
}

// Derived Clone would require `F: Clone`.
impl<F> Clone for AppState<F> {
    fn clone(&self) -> Self {
        Self {
            proxy: Arc::clone(&self.proxy),
            metrics: self.metrics.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

pub fn build_router<F: MediaFetcher>(state: AppState<F>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check::<F>))
        .route("/api/media/{*path}", get(media_file::<F>))
        .route("/api/metrics", get(metrics_text::<F>))
        .layer(middleware::from_fn_with_state(
            state.metrics.clone(),
            track_requests,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    environment: &'static str,
}

async fn health_check<F: MediaFetcher>(State(state): State<AppState<F>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.environment.as_str(),
    })
}

/// Stream a media file from the first upstream candidate that has it.
async fn media_file<F: MediaFetcher>(
    State(state): State<AppState<F>>,
    Path(path): Path<String>,
) -> Result<Response, ServerError> {
    let media = state.proxy.fetch(&path).await?;
    debug!(%path, source = %media.source, "Serving media");

    Ok((
        [
            (CONTENT_TYPE, media.content_type),
            (CACHE_CONTROL, MEDIA_CACHE_CONTROL.to_string()),
        ],
        media.body,
    )
        .into_response())
}

async fn metrics_text<F: MediaFetcher>(State(state): State<AppState<F>>) -> impl IntoResponse {
    (
        [
            (CONTENT_TYPE, METRICS_CONTENT_TYPE),
            (CACHE_CONTROL, METRICS_CACHE_CONTROL),
        ],
        state.metrics.render(),
    )
}

pub async fn serve<F: MediaFetcher>(state: AppState<F>, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::{to_bytes, Body};
    use axum::http::{header::ACCESS_CONTROL_ALLOW_ORIGIN, header::ORIGIN, Request, StatusCode};
    use tower::ServiceExt;

    use crate::media::tests::FakeFetcher;

    fn app(fetcher: &FakeFetcher) -> (Router, Metrics) {
        let config = ServerConfig::default();
        let metrics = Metrics::new();
        let proxy = MediaProxy::new(
            fetcher.clone(),
            config.api_base_url.clone(),
            config.media_base_url.clone(),
            config.media_fetch_timeout(),
            metrics.clone(),
        );
        let state = AppState {
            proxy: Arc::new(proxy),
            metrics: metrics.clone(),
            config: Arc::new(config),
        };
        (build_router(state), metrics)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(ORIGIN, "https://lms.example.com")
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_media_is_proxied_with_cache_headers() {
        let fetcher = FakeFetcher::default();
        fetcher.serve(
            "http://localhost:8000/uploads/intro/video.mp4",
            Some("video/mp4"),
            b"frames",
        );
        let (app, _) = app(&fetcher);

        let response = app.oneshot(get("/api/media/intro/video.mp4")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[CONTENT_TYPE], "video/mp4");
        assert_eq!(headers[CACHE_CONTROL], MEDIA_CACHE_CONTROL);
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"frames");
    }

    #[tokio::test]
    async fn test_missing_media_is_json_404() {
        let fetcher = FakeFetcher::default();
        let (app, _) = app(&fetcher);

        let response = app.oneshot(get("/api/media/intro/video.mp4")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Not Found");
        assert_eq!(body["message"], "Media file not found");
        assert_eq!(body["status"], 404);
        assert_eq!(body["path"], "intro/video.mp4");
    }

    #[tokio::test]
    async fn test_malformed_path_is_400() {
        let fetcher = FakeFetcher::default();
        let (app, _) = app(&fetcher);

        let response = app.oneshot(get("/api/media/covers/undefined")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(fetcher.attempted().is_empty());
    }

    #[tokio::test]
    async fn test_encoded_query_in_path_is_400() {
        let fetcher = FakeFetcher::default();
        let (app, _) = app(&fetcher);

        let response = app
            .oneshot(get("/api/media/intro/video.mp4%3Fdl%3D1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(fetcher.attempted().is_empty());
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let fetcher = FakeFetcher::default();
        let (app, metrics) = app(&fetcher);
        metrics.record_request("/health", 200);

        let response = app.oneshot(get("/api/metrics")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], METRICS_CONTENT_TYPE);
        assert_eq!(response.headers()[CACHE_CONTROL], METRICS_CACHE_CONTROL);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("http_requests_total{route=\"/health\",status=\"200\"} 1"));
        assert!(text.contains("# TYPE media_proxy_requests_total counter"));
    }

    #[tokio::test]
    async fn test_requests_are_counted_by_route() {
        let fetcher = FakeFetcher::default();
        let (app, metrics) = app(&fetcher);

        let response = app.oneshot(get("/api/media/a.png")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(metrics
            .render()
            .contains("http_requests_total{route=\"/api/media/{*path}\",status=\"404\"} 1"));
    }

    #[tokio::test]
    async fn test_health() {
        let fetcher = FakeFetcher::default();
        let (app, _) = app(&fetcher);

        let response = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["environment"], "development");
    }
}
