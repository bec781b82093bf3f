//! Per-tab session: the course being studied plus navigation and quiz progress.
//!
//! All mutation goes through `apply` (navigation + progress actions) and the
//! `begin_load` / `finish_load` pair (course loader). The completed-module
//! set is never stored; it is derived from `quiz_answers` on demand.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::celebration::Celebration;
use crate::domain::{CourseDocument, Module, Quiz};
use crate::error::LoadFailure;

/// User actions that mutate a loaded session.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
  Next,
  Previous,
  JumpTo {
    index: usize,
  },
  SubmitAnswer {
    #[serde(rename = "moduleIndex")]
    module_index: usize,
    #[serde(rename = "optionIndex")]
    option_index: usize,
  },
  ResetAnswer {
    #[serde(rename = "moduleIndex")]
    module_index: usize,
  },
  ExitCourse,
  DismissAlert,
}

/// What an action did. `applied == false` means the control was unavailable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Outcome {
  pub applied: bool,
  pub scroll_to_top: bool,
  /// Set when this action completed the course; the caller schedules the clear.
  pub celebration: Option<u64>,
}

impl Outcome {
  fn unavailable() -> Self {
    Self::default()
  }

  fn applied() -> Self {
    Self { applied: true, ..Self::default() }
  }

  fn moved() -> Self {
    Self { applied: true, scroll_to_top: true, celebration: None }
  }
}

#[derive(Clone, Debug, Default)]
pub struct CourseSession {
  course: Option<CourseDocument>,
  active_module: usize,
  quiz_answers: BTreeMap<usize, usize>,
  loading: bool,
  alert: Option<String>,
  celebration: Celebration,
}

impl CourseSession {
  pub fn new() -> Self {
    Self::default()
  }

  // ---- read side ----

  pub fn course(&self) -> Option<&CourseDocument> {
    self.course.as_ref()
  }

  pub fn active_module_index(&self) -> usize {
    self.active_module
  }

  pub fn active_module(&self) -> Option<&Module> {
    self.course.as_ref()?.modules.get(self.active_module)
  }

  pub fn module_count(&self) -> usize {
    self.course.as_ref().map_or(0, CourseDocument::module_count)
  }

  pub fn is_loading(&self) -> bool {
    self.loading
  }

  pub fn alert(&self) -> Option<&str> {
    self.alert.as_deref()
  }

  pub fn celebration(&self) -> &Celebration {
    &self.celebration
  }

  pub fn answer(&self, module_index: usize) -> Option<usize> {
    self.quiz_answers.get(&module_index).copied()
  }

  fn quiz(&self, module_index: usize) -> Option<&Quiz> {
    self.course.as_ref()?.quiz(module_index)
  }

  /// Answered, and the answer matches the quiz's correct option.
  pub fn is_correct(&self, module_index: usize) -> bool {
    match (self.quiz(module_index), self.answer(module_index)) {
      (Some(q), Some(a)) => q.is_correct(a),
      _ => false,
    }
  }

  pub fn completed_modules(&self) -> BTreeSet<usize> {
    self
      .quiz_answers
      .keys()
      .copied()
      .filter(|&i| self.is_correct(i))
      .collect()
  }

  pub fn completed_count(&self) -> usize {
    self.quiz_answers.keys().filter(|&&i| self.is_correct(i)).count()
  }

  /// `completed / modules`, or 0.0 when no course is loaded.
  pub fn completion_rate(&self) -> f64 {
    match self.module_count() {
      0 => 0.0,
      n => self.completed_count() as f64 / n as f64,
    }
  }

  pub fn has_next(&self) -> bool {
    self.course.is_some() && self.active_module + 1 < self.module_count()
  }

  pub fn has_previous(&self) -> bool {
    self.course.is_some() && self.active_module > 0
  }

  // ---- loader ----

  /// Enter the loading state. Rejected while another upload is in flight.
  pub fn begin_load(&mut self) -> Result<(), LoadFailure> {
    if self.loading {
      return Err(LoadFailure::Busy);
    }
    self.loading = true;
    self.alert = None;
    Ok(())
  }

  /// Apply the loader's result. A valid document replaces all session state;
  /// any failure keeps the previous course and raises the alert.
  pub fn finish_load(&mut self, result: Result<CourseDocument, LoadFailure>) -> Result<(), LoadFailure> {
    self.loading = false;
    let doc = match result.and_then(|doc| doc.validate().map(|_| doc)) {
      Ok(doc) => doc,
      Err(e) => {
        warn!(target: "course", error = %e, kept_course = self.course.is_some(), "Course load failed");
        self.alert = Some(e.alert_text());
        return Err(e);
      }
    };
    info!(target: "course", title = %doc.title, modules = doc.module_count(), "Course loaded");
    self.course = Some(doc);
    self.reset_progress();
    Ok(())
  }

  fn reset_progress(&mut self) {
    self.active_module = 0;
    self.quiz_answers.clear();
    self.celebration.reset();
  }

  // ---- navigation + progress ----

  pub fn apply(&mut self, action: Action) -> Outcome {
    let outcome = match action {
      Action::Next => {
        if self.has_next() { self.move_to(self.active_module + 1) } else { Outcome::unavailable() }
      }
      Action::Previous => {
        if self.has_previous() { self.move_to(self.active_module - 1) } else { Outcome::unavailable() }
      }
      Action::JumpTo { index } => {
        if index < self.module_count() { self.move_to(index) } else { Outcome::unavailable() }
      }
      Action::SubmitAnswer { module_index, option_index } => self.submit_answer(module_index, option_index),
      Action::ResetAnswer { module_index } => self.reset_answer(module_index),
      Action::ExitCourse => self.exit_course(),
      Action::DismissAlert => {
        if self.alert.take().is_some() { Outcome::applied() } else { Outcome::unavailable() }
      }
    };
    debug!(target: "course", ?action, applied = outcome.applied, active = self.active_module, "Session action");
    outcome
  }

  fn move_to(&mut self, index: usize) -> Outcome {
    self.active_module = index;
    Outcome::moved()
  }

  fn submit_answer(&mut self, module_index: usize, option_index: usize) -> Outcome {
    let Some(quiz) = self.quiz(module_index) else { return Outcome::unavailable() };
    if option_index >= quiz.options.len() || self.quiz_answers.contains_key(&module_index) {
      return Outcome::unavailable();
    }

    let before = self.completed_count();
    self.quiz_answers.insert(module_index, option_index);
    let after = self.completed_count();

    let mut outcome = Outcome::applied();
    let total = self.module_count();
    if after == total && before != total {
      let generation = self.celebration.raise();
      info!(target: "course", modules = total, generation, "All modules complete");
      outcome.celebration = Some(generation);
    }
    outcome
  }

  fn reset_answer(&mut self, module_index: usize) -> Outcome {
    if self.quiz_answers.remove(&module_index).is_some() {
      Outcome::applied()
    } else {
      Outcome::unavailable()
    }
  }

  /// Back to the welcome screen. An in-flight upload keeps running and will
  /// land in this same session.
  fn exit_course(&mut self) -> Outcome {
    if self.course.take().is_none() {
      return Outcome::unavailable();
    }
    self.reset_progress();
    self.alert = None;
    Outcome::moved()
  }

  /// Clear the celebration raised for `generation`, if it is still current.
  pub fn clear_celebration(&mut self, generation: u64) -> bool {
    self.celebration.clear(generation)
  }

  #[cfg(test)]
  pub(crate) fn load(&mut self, doc: CourseDocument) -> Result<(), LoadFailure> {
    self.begin_load()?;
    self.finish_load(Ok(doc))
  }
}
