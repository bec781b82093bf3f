//! View model derived from a `CourseSession`.
//!
//! Everything here is a pure function of the session: progress percentages,
//! badge states, option highlighting and feedback text are recomputed on every
//! render and never stored. The page only paints what it receives.

use serde::Serialize;

use crate::celebration::ConfettiPiece;
use crate::domain::{CourseDocument, Module, Quiz};
use crate::session::CourseSession;
use crate::util::percent;

pub const ACCEPTED_UPLOADS: &str = ".pdf";
pub const CELEBRATION_BANNER: &str = "🎉";
pub const FEEDBACK_CORRECT: &str = "Perfect! You've mastered this concept! 🎉";
pub const FEEDBACK_WRONG: &str = "Good try! Let's learn from this 📚";

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
  pub loading: bool,
  /// Pending load failure, shown as a blocking alert.
  pub alert: Option<String>,
  pub screen: Screen,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Screen {
  Welcome(WelcomeView),
  Course(Box<CourseView>),
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WelcomeView {
  pub upload_label: &'static str,
  pub upload_glyph: &'static str,
  pub accept: &'static str,
  pub upload_enabled: bool,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseView {
  pub title: String,
  pub icon: String,
  pub theme_color: String,
  pub sidebar: SidebarView,
  pub module: ModuleView,
  pub quiz: Option<QuizView>,
  pub footer: FooterView,
  pub completion: CompletionView,
  pub celebration: Option<CelebrationView>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SidebarView {
  /// Position in the course, not completion: `(active + 1) / N`.
  pub position_percent: u8,
  pub position_label: String,
  pub completed_count: usize,
  pub entries: Vec<ModuleEntry>,
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModuleStatus {
  Active,
  Completed,
  Pending,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleEntry {
  pub index: usize,
  pub title: String,
  pub status: ModuleStatus,
  pub completed: bool,
  pub badge: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleView {
  pub index: usize,
  pub label: String,
  pub title: String,
  pub summary_highlight: String,
  pub takeaways: Vec<TakeawayView>,
}

#[derive(Clone, Debug, Serialize)]
pub struct TakeawayView {
  pub number: usize,
  pub markdown: String,
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OptionState {
  Selectable,
  CorrectSelected,
  Correct,
  WrongSelected,
  Dimmed,
}

#[derive(Clone, Debug, Serialize)]
pub struct OptionView {
  pub index: usize,
  pub text: String,
  pub state: OptionState,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizView {
  pub module_index: usize,
  pub question: String,
  pub options: Vec<OptionView>,
  pub answered: bool,
  pub correct: bool,
  pub can_try_again: bool,
  pub feedback: Option<FeedbackView>,
}

#[derive(Clone, Debug, Serialize)]
pub struct FeedbackView {
  pub correct: bool,
  pub headline: &'static str,
  pub explanation: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FooterView {
  pub can_previous: bool,
  pub can_next: bool,
  /// Shown in place of the next control on the last module.
  pub course_completed_badge: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct CompletionView {
  pub completed: usize,
  pub total: usize,
  pub rate: f64,
  pub percent: u8,
}

#[derive(Clone, Debug, Serialize)]
pub struct CelebrationView {
  pub banner: &'static str,
  pub confetti: Vec<ConfettiPiece>,
}

pub fn render(session: &CourseSession) -> SessionView {
  let screen = match (session.course(), session.active_module()) {
    (Some(course), Some(module)) => Screen::Course(Box::new(course_view(session, course, module))),
    _ => Screen::Welcome(welcome_view(session.is_loading())),
  };
  SessionView {
    loading: session.is_loading(),
    alert: session.alert().map(str::to_string),
    screen,
  }
}

fn welcome_view(loading: bool) -> WelcomeView {
  WelcomeView {
    upload_label: if loading { "Creating Your Course..." } else { "Upload PDF Document" },
    upload_glyph: if loading { "⚡" } else { "📄" },
    accept: ACCEPTED_UPLOADS,
    upload_enabled: !loading,
  }
}

fn course_view(session: &CourseSession, course: &CourseDocument, module: &Module) -> CourseView {
  let active = session.active_module_index();
  let total = course.module_count();
  let completed = session.completed_modules();

  let entries = course
    .modules
    .iter()
    .enumerate()
    .map(|(idx, m)| {
      let is_done = completed.contains(&idx);
      let status = if idx == active {
        ModuleStatus::Active
      } else if is_done {
        ModuleStatus::Completed
      } else {
        ModuleStatus::Pending
      };
      ModuleEntry {
        index: idx,
        title: m.title.clone(),
        status,
        completed: is_done,
        badge: if is_done { "✓".into() } else { (idx + 1).to_string() },
      }
    })
    .collect();

  let celebration = session.celebration().is_active().then(|| CelebrationView {
    banner: CELEBRATION_BANNER,
    confetti: session.celebration().confetti().to_vec(),
  });

  CourseView {
    title: course.title.clone(),
    icon: course.icon().to_string(),
    theme_color: course.theme_color().to_string(),
    sidebar: SidebarView {
      position_percent: percent(active + 1, total),
      position_label: format!("{} of {} modules", active + 1, total),
      completed_count: completed.len(),
      entries,
    },
    module: ModuleView {
      index: active,
      label: format!("Module {}", active + 1),
      title: module.title.clone(),
      summary_highlight: module.summary_highlight.clone(),
      takeaways: module
        .key_takeaways
        .iter()
        .enumerate()
        .map(|(i, md)| TakeawayView { number: i + 1, markdown: md.clone() })
        .collect(),
    },
    quiz: module.quiz.as_ref().map(|q| quiz_view(active, q, session.answer(active))),
    footer: FooterView {
      can_previous: session.has_previous(),
      can_next: session.has_next(),
      course_completed_badge: !session.has_next(),
    },
    completion: CompletionView {
      completed: completed.len(),
      total,
      rate: session.completion_rate(),
      percent: percent(completed.len(), total),
    },
    celebration,
  }
}

fn quiz_view(module_index: usize, quiz: &Quiz, answer: Option<usize>) -> QuizView {
  let correct = answer.is_some_and(|a| quiz.is_correct(a));
  let options = quiz
    .options
    .iter()
    .enumerate()
    .map(|(idx, text)| OptionView { index: idx, text: text.clone(), state: option_state(quiz, idx, answer) })
    .collect();

  QuizView {
    module_index,
    question: quiz.question.clone(),
    options,
    answered: answer.is_some(),
    correct,
    can_try_again: answer.is_some(),
    feedback: answer.map(|_| FeedbackView {
      correct,
      headline: if correct { FEEDBACK_CORRECT } else { FEEDBACK_WRONG },
      explanation: quiz.explanation.clone(),
    }),
  }
}

fn option_state(quiz: &Quiz, idx: usize, answer: Option<usize>) -> OptionState {
  let Some(selected) = answer else { return OptionState::Selectable };
  match (idx == selected, quiz.is_correct(idx)) {
    (true, true) => OptionState::CorrectSelected,
    (false, true) => OptionState::Correct,
    (true, false) => OptionState::WrongSelected,
    (false, false) => OptionState::Dimmed,
  }
}
