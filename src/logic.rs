//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Rendering a session's view model
//!   - Applying navigation/progress actions (and arming the celebration timer)
//!   - The two-phase course upload: mark loading under the lock, call the
//!     generator without it, then apply the result under the lock again

use std::{sync::Arc, time::Duration};

use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::error::LoadFailure;
use crate::loader::accepts_pdf;
use crate::session::{Action, Outcome};
use crate::state::{AppState, SessionSlot};
use crate::view::{render, SessionView};

pub async fn render_view(slot: &SessionSlot) -> SessionView {
  render(&*slot.lock().await)
}

#[instrument(level = "info", skip(state, slot), fields(session = %slot.id))]
pub async fn apply_action(state: &AppState, slot: &Arc<SessionSlot>, action: Action) -> (Outcome, SessionView) {
  let (outcome, view) = {
    let mut session = slot.lock().await;
    let outcome = session.apply(action);
    // Installed under the session lock so timers land in generation order.
    if let Some(generation) = outcome.celebration {
      let timer = schedule_celebration_clear(slot.clone(), generation, state.config.celebration_duration());
      slot.replace_celebration_timer(generation, timer).await;
    }
    (outcome, render(&session))
  };

  if outcome.applied {
    slot.notify();
  }
  (outcome, view)
}

/// Clear the celebration for `generation` once `delay` has passed.
fn schedule_celebration_clear(slot: Arc<SessionSlot>, generation: u64, delay: Duration) -> JoinHandle<()> {
  tokio::spawn(async move {
    tokio::time::sleep(delay).await;
    let cleared = slot.lock().await.clear_celebration(generation);
    if cleared {
      debug!(target: "course", session = %slot.id, generation, "Celebration cleared");
      slot.notify();
    }
  })
}

/// First phase of an upload: the picker filter, the size cap and the
/// one-upload-at-a-time rule.
#[instrument(level = "info", skip(state, slot), fields(session = %slot.id))]
pub async fn start_upload(state: &AppState, slot: &SessionSlot, file_name: &str, size: usize) -> Result<(), LoadFailure> {
  if !accepts_pdf(file_name) {
    return Err(LoadFailure::NotPdf(file_name.to_string()));
  }
  let limit = state.config.max_upload_bytes;
  if size > limit {
    return Err(LoadFailure::TooLarge { size, limit });
  }
  slot.lock().await.begin_load()?;
  slot.notify();
  info!(target: "course", session = %slot.id, %file_name, "Upload started");
  Ok(())
}

/// Second phase: call the generator (no lock held) and apply the result.
#[instrument(level = "info", skip(state, slot, bytes), fields(session = %slot.id, size = bytes.len()))]
pub async fn finish_upload(
  state: &AppState,
  slot: &SessionSlot,
  file_name: &str,
  bytes: Vec<u8>,
) -> Result<SessionView, LoadFailure> {
  let result = state.backend.load_course(file_name, bytes).await;
  let outcome = {
    let mut session = slot.lock().await;
    session.finish_load(result).map(|_| render(&session))
  };
  slot.notify();
  if let Err(e) = &outcome {
    warn!(target: "course", session = %slot.id, error = %e, "Upload failed");
  }
  outcome
}

/// Both phases in one call, for the HTTP surface.
pub async fn upload_course(
  state: &AppState,
  slot: &SessionSlot,
  file_name: &str,
  bytes: Vec<u8>,
) -> Result<SessionView, LoadFailure> {
  start_upload(state, slot, file_name, bytes.len()).await?;
  finish_upload(state, slot, file_name, bytes).await
}

/// WebSocket flavour: reject synchronously, finish in the background.
/// The connection repaints from the session's change notification.
pub async fn spawn_upload(
  state: &AppState,
  slot: &Arc<SessionSlot>,
  file_name: String,
  bytes: Vec<u8>,
) -> Result<(), LoadFailure> {
  start_upload(state, slot, &file_name, bytes.len()).await?;
  let (state, slot) = (state.clone(), slot.clone());
  tokio::spawn(async move {
    let _ = finish_upload(&state, &slot, &file_name, bytes).await;
  });
  Ok(())
}
