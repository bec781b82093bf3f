//! Router assembly: HTTP endpoints, WebSocket upgrade, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws`
/// - session API under `/api/v1/sessions/...`
/// - Static SPA from the configured directory with index fallback
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.static_dir.clone();
    let static_service = ServeDir::new(&static_dir)
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new(format!("{static_dir}/index.html")));
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        // WebSocket
        .route("/ws", get(ws::ws_upgrade))
        // HTTP API
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/sessions", post(http::http_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(http::http_get_session).delete(http::http_delete_session),
        )
        .route("/api/v1/sessions/:id/upload", post(http::http_upload))
        .route("/api/v1/sessions/:id/actions", post(http::http_post_action))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_request(DefaultOnRequest::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                )
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        // Frontend fallback
        .fallback_service(static_service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlayerConfig;
    use crate::domain::sample_course;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        Json,
    };
    use tokio::net::TcpListener;
    use tower::ServiceExt;

    fn app_state(cfg: PlayerConfig) -> Arc<AppState> {
        Arc::new(AppState::new(cfg).unwrap())
    }

    async fn json_body(res: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn multipart_upload(uri: &str, file_name: &str, bytes: &[u8]) -> Request<Body> {
        let boundary = "XBOUNDARYX";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
            .body(Body::from(body))
            .unwrap()
    }

    async fn create_session(app: &Router) -> String {
        let res = app
            .clone()
            .oneshot(Request::builder().method("POST").uri("/api/v1/sessions").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let body = json_body(res).await;
        assert_eq!(body["view"]["screen"]["kind"], "welcome");
        body["sessionId"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let app = build_router(app_state(PlayerConfig::default()));
        let res = app
            .oneshot(Request::builder().uri("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json_body(res).await, serde_json::json!({ "ok": true }));
    }

    #[tokio::test]
    async fn unknown_session_is_404() {
        let app = build_router(app_state(PlayerConfig::default()));
        let res = app
            .oneshot(post_json("/api/v1/sessions/nope/actions", serde_json::json!({ "type": "next" })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn upload_then_study_over_http() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let generator = Router::new().route(
            "/test-upload",
            post(|| async { Json(serde_json::to_value(sample_course()).unwrap()) }),
        );
        tokio::spawn(async move { axum::serve(listener, generator).await.unwrap() });

        let app = build_router(app_state(PlayerConfig {
            backend_url: format!("http://{addr}"),
            ..PlayerConfig::default()
        }));
        let id = create_session(&app).await;

        let res = app
            .clone()
            .oneshot(multipart_upload(&format!("/api/v1/sessions/{id}/upload"), "ledger.pdf", b"%PDF-1.4"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let view = json_body(res).await;
        assert_eq!(view["screen"]["kind"], "course");
        assert_eq!(view["screen"]["sidebar"]["positionLabel"], "1 of 2 modules");

        let actions = format!("/api/v1/sessions/{id}/actions");
        let res = app
            .clone()
            .oneshot(post_json(&actions, serde_json::json!({ "type": "jump_to", "index": 1 })))
            .await
            .unwrap();
        let out = json_body(res).await;
        assert_eq!(out["applied"], true);
        assert_eq!(out["scrollToTop"], true);

        let res = app
            .clone()
            .oneshot(post_json(
                &actions,
                serde_json::json!({ "type": "submit_answer", "moduleIndex": 1, "optionIndex": 1 }),
            ))
            .await
            .unwrap();
        let out = json_body(res).await;
        assert_eq!(out["view"]["screen"]["completion"]["rate"], 0.5);
        assert_eq!(out["view"]["screen"]["quiz"]["correct"], true);

        let res = app
            .clone()
            .oneshot(post_json(&actions, serde_json::json!({ "type": "next" })))
            .await
            .unwrap();
        assert_eq!(json_body(res).await["applied"], false);
    }

    #[tokio::test]
    async fn failed_upload_is_bad_gateway_with_alert() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let app = build_router(app_state(PlayerConfig {
            backend_url: format!("http://{addr}"),
            ..PlayerConfig::default()
        }));
        let id = create_session(&app).await;

        let res = app
            .clone()
            .oneshot(multipart_upload(&format!("/api/v1/sessions/{id}/upload"), "a.pdf", b"%PDF"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
        let body = json_body(res).await;
        assert_eq!(body["view"]["alert"], "Backend connection failed!");
        assert_eq!(body["view"]["loading"], false);
        assert_eq!(body["view"]["screen"]["kind"], "welcome");
    }

    #[tokio::test]
    async fn non_pdf_upload_is_rejected() {
        let app = build_router(app_state(PlayerConfig::default()));
        let id = create_session(&app).await;
        let res = app
            .clone()
            .oneshot(multipart_upload(&format!("/api/v1/sessions/{id}/upload"), "notes.docx", b"PK"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn delete_session() {
        let app = build_router(app_state(PlayerConfig::default()));
        let id = create_session(&app).await;
        let delete = || Request::builder().method("DELETE").uri(format!("/api/v1/sessions/{id}")).body(Body::empty()).unwrap();
        let res = app.clone().oneshot(delete()).await.unwrap();
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        let res = app.clone().oneshot(delete()).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
