//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs the session id and basic result info.

use std::sync::Arc;
use axum::{
  extract::{multipart::MultipartError, Multipart, Path, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use thiserror::Error;
use tracing::{info, instrument};

use crate::error::LoadFailure;
use crate::logic::*;
use crate::protocol::*;
use crate::session::Action;
use crate::state::{AppState, SessionSlot};
use crate::view::SessionView;

#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unknown session {0}")]
  UnknownSession(String),
  #[error("{0}")]
  BadUpload(String),
  #[error(transparent)]
  Multipart(#[from] MultipartError),
  #[error("{failure}")]
  Load { failure: LoadFailure, view: Box<SessionView> },
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self {
      ApiError::UnknownSession(_) => StatusCode::NOT_FOUND,
      ApiError::BadUpload(_) | ApiError::Multipart(_) => StatusCode::BAD_REQUEST,
      ApiError::Load { failure, .. } => match failure {
        LoadFailure::Busy => StatusCode::CONFLICT,
        LoadFailure::NotPdf(_) | LoadFailure::EmptyFile => StatusCode::BAD_REQUEST,
        LoadFailure::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        _ => StatusCode::BAD_GATEWAY,
      },
    };
    let error = self.to_string();
    let view = match self {
      ApiError::Load { view, .. } => Some(*view),
      _ => None,
    };
    (status, Json(ErrorOut { error, view })).into_response()
  }
}

async fn session_or_404(state: &AppState, id: &str) -> Result<Arc<SessionSlot>, ApiError> {
  state.get_session(id).await.ok_or_else(|| ApiError::UnknownSession(id.to_string()))
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_create_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let slot = state.create_session().await;
  let view = render_view(&slot).await;
  (StatusCode::CREATED, Json(SessionOut { session_id: slot.id.clone(), view }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_session(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
  let slot = session_or_404(&state, &id).await?;
  Ok(Json(render_view(&slot).await))
}

#[instrument(level = "info", skip(state))]
pub async fn http_delete_session(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
  if state.remove_session(&id).await {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(ApiError::UnknownSession(id))
  }
}

#[instrument(level = "info", skip(state, multipart))]
pub async fn http_upload(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  multipart: Multipart,
) -> Result<Json<SessionView>, ApiError> {
  let slot = session_or_404(&state, &id).await?;
  let (file_name, bytes) = read_file_field(multipart).await?;
  info!(target: "course_player", session = %id, %file_name, size = bytes.len(), "HTTP upload received");

  match upload_course(&state, &slot, &file_name, bytes).await {
    Ok(view) => Ok(Json(view)),
    Err(failure) => {
      let view = Box::new(render_view(&slot).await);
      Err(ApiError::Load { failure, view })
    }
  }
}

/// Pull the `file` field out of a multipart body.
async fn read_file_field(mut multipart: Multipart) -> Result<(String, Vec<u8>), ApiError> {
  while let Some(field) = multipart.next_field().await? {
    if field.name() != Some("file") {
      continue;
    }
    let file_name = field.file_name().unwrap_or_default().to_string();
    let bytes = field.bytes().await?;
    return Ok((file_name, bytes.to_vec()));
  }
  Err(ApiError::BadUpload("multipart field `file` is missing".into()))
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_action(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  Json(action): Json<Action>,
) -> Result<Json<ActionOut>, ApiError> {
  let slot = session_or_404(&state, &id).await?;
  let (outcome, view) = apply_action(&state, &slot, action).await;
  info!(target: "course", session = %id, ?action, applied = outcome.applied, "HTTP action applied");
  Ok(Json(ActionOut { applied: outcome.applied, scroll_to_top: outcome.scroll_to_top, view }))
}
