//! Error taxonomy for course loading.
//!
//! Everything that can go wrong between picking a file and holding a valid
//! course document is a `LoadFailure`. Quiz/navigation misuse is not an error:
//! those operations simply report that they were not applied.

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadFailure {
  #[error("an upload is already in progress")]
  Busy,
  #[error("only .pdf files can be uploaded (got {0:?})")]
  NotPdf(String),
  #[error("the uploaded file is empty")]
  EmptyFile,
  #[error("the uploaded file is {size} bytes, the limit is {limit}")]
  TooLarge { size: usize, limit: usize },
  #[error("course backend unreachable: {0}")]
  Network(#[from] reqwest::Error),
  #[error("course backend returned HTTP {status}: {body}")]
  Status { status: reqwest::StatusCode, body: String },
  #[error("course backend reported an error: {0}")]
  Backend(String),
  #[error("course backend returned malformed JSON: {0}")]
  Malformed(#[from] serde_json::Error),
  #[error("generated course has no modules")]
  EmptyCourse,
  #[error("quiz in module {module} marks option {index} correct but has {options} options")]
  InvalidQuiz { module: usize, index: usize, options: usize },
}

impl LoadFailure {
  /// Short, user-facing text for the blocking alert.
  pub fn alert_text(&self) -> String {
    match self {
      LoadFailure::Network(_) => "Backend connection failed!".into(),
      other => other.to_string(),
    }
  }
}
