//! Domain models: the course document produced by the generator backend.
//!
//! Field names follow the generator's JSON contract (`course_title`,
//! `theme_color`, `course_icon`, `modules[]`). A document is immutable once
//! loaded; `validate` is the gate between a parsed response and a session.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::LoadFailure;

pub const DEFAULT_THEME_COLOR: &str = "#6366f1";
pub const DEFAULT_COURSE_ICON: &str = "📖";

/// Whole course as returned by `POST /test-upload`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CourseDocument {
  #[serde(rename = "course_title")]
  pub title: String,
  #[serde(default)] pub theme_color: Option<String>,
  #[serde(rename = "course_icon", default)]
  pub icon: Option<String>,
  pub modules: Vec<Module>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Module {
  pub title: String,
  pub summary_highlight: String,
  #[serde(default)] pub key_takeaways: Vec<String>, // markdown
  #[serde(default)] pub quiz: Option<Quiz>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Quiz {
  pub question: String,
  pub options: Vec<String>,
  pub correct_answer_index: usize,
  pub explanation: String,
}

impl CourseDocument {
  /// Accent color, falling back to the default indigo when absent or blank.
  pub fn theme_color(&self) -> &str {
    non_blank(self.theme_color.as_deref()).unwrap_or(DEFAULT_THEME_COLOR)
  }

  pub fn icon(&self) -> &str {
    non_blank(self.icon.as_deref()).unwrap_or(DEFAULT_COURSE_ICON)
  }

  pub fn module_count(&self) -> usize {
    self.modules.len()
  }

  pub fn quiz(&self, module_index: usize) -> Option<&Quiz> {
    self.modules.get(module_index).and_then(|m| m.quiz.as_ref())
  }

  /// Reject documents a session cannot drive: no modules, or a quiz whose
  /// correct answer points outside its options.
  pub fn validate(&self) -> Result<(), LoadFailure> {
    if self.modules.is_empty() {
      return Err(LoadFailure::EmptyCourse);
    }
    for (idx, m) in self.modules.iter().enumerate() {
      let Some(q) = &m.quiz else { continue };
      if q.correct_answer_index >= q.options.len() {
        return Err(LoadFailure::InvalidQuiz {
          module: idx,
          index: q.correct_answer_index,
          options: q.options.len(),
        });
      }
      if q.options.len() < 2 {
        warn!(target: "course", module = idx, options = q.options.len(), "Quiz has fewer than two options");
      }
    }
    Ok(())
  }
}

impl Quiz {
  pub fn is_correct(&self, option_index: usize) -> bool {
    option_index == self.correct_answer_index
  }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
  s.map(str::trim).filter(|s| !s.is_empty())
}

/// Two-module sample used across unit tests: module 0 has no quiz,
/// module 1 has a quiz whose correct answer is option 1.
#[cfg(test)]
pub(crate) fn sample_course() -> CourseDocument {
  CourseDocument {
    title: "Intro to Ledgers".into(),
    theme_color: Some("#0ea5e9".into()),
    icon: Some("📒".into()),
    modules: vec![
      Module {
        title: "What a ledger is".into(),
        summary_highlight: "A ledger records every transaction once.".into(),
        key_takeaways: vec!["**Debits** sit on the left.".into()],
        quiz: None,
      },
      Module {
        title: "Balancing".into(),
        summary_highlight: "Both sides must match.".into(),
        key_takeaways: vec!["Totals must agree.".into(), "Errors show as a gap.".into()],
        quiz: Some(Quiz {
          question: "What must match?".into(),
          options: vec!["Dates".into(), "Debits and credits".into(), "Page numbers".into()],
          correct_answer_index: 1,
          explanation: "Double entry keeps debits and credits equal.".into(),
        }),
      },
    ],
  }
}

/// Course where every module has a quiz, so completion can reach 100%.
#[cfg(test)]
pub(crate) fn quizzed_course(n: usize) -> CourseDocument {
  CourseDocument {
    title: "All quizzes".into(),
    theme_color: None,
    icon: None,
    modules: (0..n)
      .map(|i| Module {
        title: format!("Module {i}"),
        summary_highlight: String::new(),
        key_takeaways: vec![],
        quiz: Some(Quiz {
          question: format!("Question {i}?"),
          options: vec!["a".into(), "b".into()],
          correct_answer_index: 0,
          explanation: "a is right".into(),
        }),
      })
      .collect(),
  }
}
