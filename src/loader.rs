//! HTTP client for the course generator backend.
//!
//! One multipart `POST` per upload, field `file`. The generator answers with
//! the course JSON on success; on internal failure it still answers 200 but
//! with `{"error": "..."}`, which we surface as `LoadFailure::Backend`.
//!
//! NOTE: we never log file contents, only names and sizes.

use std::time::{Duration, Instant};

use reqwest::header::USER_AGENT;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{error, info, instrument};

use crate::config::PlayerConfig;
use crate::domain::CourseDocument;
use crate::error::LoadFailure;
use crate::util::trunc_for_log;

#[derive(Clone)]
pub struct CourseBackend {
  pub client: reqwest::Client,
  pub upload_url: String,
}

/// Either a course or the generator's error envelope.
#[derive(Deserialize)]
#[serde(untagged)]
enum GeneratorReply {
  Failed { error: String },
  Course(CourseDocument),
}

impl CourseBackend {
  pub fn from_config(cfg: &PlayerConfig) -> Result<Self, reqwest::Error> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(cfg.request_timeout_secs))
      .build()?;
    Ok(Self { client, upload_url: cfg.upload_url() })
  }

  /// Send `bytes` as `file_name` and return the validated course.
  #[instrument(level = "info", skip(self, bytes), fields(url = %self.upload_url, size = bytes.len()))]
  pub async fn load_course(&self, file_name: &str, bytes: Vec<u8>) -> Result<CourseDocument, LoadFailure> {
    if !accepts_pdf(file_name) {
      return Err(LoadFailure::NotPdf(file_name.to_string()));
    }
    if bytes.is_empty() {
      return Err(LoadFailure::EmptyFile);
    }

    let part = Part::bytes(bytes)
      .file_name(file_name.to_string())
      .mime_str("application/pdf")?;
    let form = Form::new().part("file", part);

    let start = Instant::now();
    let res = self.client.post(&self.upload_url)
      .header(USER_AGENT, "course-player/0.1")
      .multipart(form)
      .send().await
      .map_err(|e| {
        error!(target: "course", elapsed = ?start.elapsed(), error = %e, "Course backend request failed");
        LoadFailure::Network(e)
      })?;

    let status = res.status();
    let body = res.text().await?;
    let elapsed = start.elapsed();
    if !status.is_success() {
      error!(target: "course", %status, ?elapsed, body = %trunc_for_log(&body, 200), "Course backend returned error status");
      return Err(LoadFailure::Status { status, body: trunc_for_log(&body, 200) });
    }

    let doc = parse_reply(&body)?;
    info!(target: "course", ?elapsed, title = %doc.title, modules = doc.module_count(), response_bytes = body.len(), "Course generated");
    Ok(doc)
  }
}

/// Decode and validate a generator response body.
pub fn parse_reply(body: &str) -> Result<CourseDocument, LoadFailure> {
  let doc = match serde_json::from_str::<GeneratorReply>(body) {
    Ok(GeneratorReply::Course(doc)) => doc,
    Ok(GeneratorReply::Failed { error }) => return Err(LoadFailure::Backend(error)),
    // Re-parse as the course shape so the error names the offending field.
    Err(_) => serde_json::from_str::<CourseDocument>(body)?,
  };
  doc.validate()?;
  Ok(doc)
}

/// The file picker only offers PDFs.
pub fn accepts_pdf(file_name: &str) -> bool {
  file_name.to_ascii_lowercase().ends_with(".pdf")
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum::{extract::Multipart, http::StatusCode, routing::post, Json, Router};
  use tokio::net::TcpListener;

  /// Serve `app` on an ephemeral port and return a backend pointed at it.
  async fn backend_for(app: Router) -> CourseBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    let cfg = PlayerConfig {
      backend_url: format!("http://{addr}"),
      request_timeout_secs: 5,
      ..PlayerConfig::default()
    };
    CourseBackend::from_config(&cfg).unwrap()
  }

  fn course_json() -> serde_json::Value {
    serde_json::to_value(crate::domain::sample_course()).unwrap()
  }

  #[tokio::test]
  async fn uploads_file_field_and_parses_course() {
    let app = Router::new().route(
      "/test-upload",
      post(|mut form: Multipart| async move {
        let field = form.next_field().await.unwrap().unwrap();
        assert_eq!(field.name(), Some("file"));
        assert_eq!(field.file_name(), Some("notes.pdf"));
        assert_eq!(&field.bytes().await.unwrap()[..], b"%PDF-1.4");
        Json(course_json())
      }),
    );
    let backend = backend_for(app).await;
    let doc = backend.load_course("notes.pdf", b"%PDF-1.4".to_vec()).await.unwrap();
    assert_eq!(doc, crate::domain::sample_course());
  }

  #[tokio::test]
  async fn error_status_is_a_load_failure() {
    let app = Router::new().route("/test-upload", post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }));
    let backend = backend_for(app).await;
    match backend.load_course("a.pdf", vec![1]).await {
      Err(LoadFailure::Status { status, body }) => {
        assert_eq!(status, reqwest::StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "boom");
      }
      other => panic!("unexpected: {other:?}"),
    }
  }

  #[tokio::test]
  async fn error_envelope_is_a_load_failure() {
    let app = Router::new().route(
      "/test-upload",
      post(|| async { Json(serde_json::json!({ "error": "model overloaded" })) }),
    );
    let backend = backend_for(app).await;
    let err = backend.load_course("a.pdf", vec![1]).await.unwrap_err();
    assert!(matches!(err, LoadFailure::Backend(ref m) if m == "model overloaded"));
  }

  #[tokio::test]
  async fn unreachable_backend_is_a_network_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let cfg = PlayerConfig { backend_url: format!("http://{addr}"), ..PlayerConfig::default() };
    let backend = CourseBackend::from_config(&cfg).unwrap();
    let err = backend.load_course("a.pdf", vec![1]).await.unwrap_err();
    assert!(matches!(err, LoadFailure::Network(_)));
    assert_eq!(err.alert_text(), "Backend connection failed!");
  }

  #[tokio::test]
  async fn non_pdf_and_empty_files_never_hit_the_network() {
    let cfg = PlayerConfig { backend_url: "http://127.0.0.1:9".into(), ..PlayerConfig::default() };
    let backend = CourseBackend::from_config(&cfg).unwrap();
    assert!(matches!(backend.load_course("slides.pptx", vec![1]).await, Err(LoadFailure::NotPdf(_))));
    assert!(matches!(backend.load_course("a.PDF", vec![]).await, Err(LoadFailure::EmptyFile)));
  }

  #[test]
  fn parse_reply_rejects_html_and_empty_courses() {
    assert!(matches!(parse_reply("<html>502</html>"), Err(LoadFailure::Malformed(_))));
    let empty = r##"{"course_title":"T","theme_color":"#fff","modules":[]}"##;
    assert!(matches!(parse_reply(empty), Err(LoadFailure::EmptyCourse)));
  }

  #[test]
  fn pdf_filter_is_case_insensitive() {
    assert!(accepts_pdf("Report.PDF"));
    assert!(accepts_pdf("x.pdf"));
    assert!(!accepts_pdf("x.pdf.exe"));
    assert!(!accepts_pdf("pdf"));
  }
}
