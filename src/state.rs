//! Application state: configuration, the generator client, and live sessions.
//!
//! This module owns:
//!   - the player configuration
//!   - the course generator client
//!   - the registry of live sessions (one per browser tab)
//!
//! Each session sits behind its own async mutex together with a change
//! counter, so WebSocket connections can repaint after background events
//! (upload completion, celebration timeout).

use std::{collections::HashMap, sync::Arc};
use tokio::sync::{watch, Mutex, MutexGuard, RwLock};
use tokio::task::JoinHandle;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::config::PlayerConfig;
use crate::loader::CourseBackend;
use crate::session::CourseSession;

pub struct SessionSlot {
    pub id: String,
    session: Mutex<CourseSession>,
    celebration_timer: Mutex<Option<(u64, JoinHandle<()>)>>,
    changes: watch::Sender<u64>,
}

impl SessionSlot {
    fn new(id: String) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            id,
            session: Mutex::new(CourseSession::new()),
            celebration_timer: Mutex::new(None),
            changes,
        }
    }

    pub async fn lock(&self) -> MutexGuard<'_, CourseSession> {
        self.session.lock().await
    }

    /// Bump the change counter; every subscriber sees a new value.
    pub fn notify(&self) {
        self.changes.send_modify(|rev| *rev += 1);
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    /// Install the timer for celebration `generation`, aborting the one it
    /// replaces. A timer for an older generation than the installed one is
    /// aborted instead of installed.
    pub async fn replace_celebration_timer(&self, generation: u64, handle: JoinHandle<()>) {
        let mut timer = self.celebration_timer.lock().await;
        match timer.as_ref() {
            Some((current, _)) if *current > generation => handle.abort(),
            _ => {
                if let Some((_, previous)) = timer.replace((generation, handle)) {
                    previous.abort();
                }
            }
        }
    }

    async fn cancel_timers(&self) {
        if let Some((_, handle)) = self.celebration_timer.lock().await.take() {
            handle.abort();
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<PlayerConfig>,
    pub backend: CourseBackend,
    pub sessions: Arc<RwLock<HashMap<String, Arc<SessionSlot>>>>,
}

impl AppState {
    /// Build state from config: generator client plus an empty session registry.
    #[instrument(level = "info", skip_all)]
    pub fn new(config: PlayerConfig) -> Result<Self, reqwest::Error> {
        let backend = CourseBackend::from_config(&config)?;
        info!(
            target: "course_player",
            upload_url = %backend.upload_url,
            timeout_secs = config.request_timeout_secs,
            celebration_ms = config.celebration_ms,
            "Course generator configured"
        );
        Ok(Self {
            config: Arc::new(config),
            backend,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn create_session(&self) -> Arc<SessionSlot> {
        let slot = Arc::new(SessionSlot::new(Uuid::new_v4().to_string()));
        let live = {
            let mut sessions = self.sessions.write().await;
            sessions.insert(slot.id.clone(), slot.clone());
            sessions.len()
        };
        info!(target: "course_player", id = %slot.id, live, "Session created");
        slot
    }

    pub async fn get_session(&self, id: &str) -> Option<Arc<SessionSlot>> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Drop a session and its pending timers. Returns false if it was unknown.
    #[instrument(level = "debug", skip(self))]
    pub async fn remove_session(&self, id: &str) -> bool {
        let removed = { self.sessions.write().await.remove(id) };
        match removed {
            Some(slot) => {
                slot.cancel_timers().await;
                info!(target: "course_player", %id, "Session removed");
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        AppState::new(PlayerConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn sessions_are_registered_and_removed() {
        let state = state();
        let slot = state.create_session().await;
        assert!(state.get_session(&slot.id).await.is_some());
        assert!(state.remove_session(&slot.id).await);
        assert!(state.get_session(&slot.id).await.is_none());
        assert!(!state.remove_session(&slot.id).await);
    }

    #[tokio::test]
    async fn notify_reaches_subscribers() {
        let state = state();
        let slot = state.create_session().await;
        let mut rx = slot.subscribe();
        slot.notify();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), 1);
    }

    #[tokio::test]
    async fn replacing_timer_aborts_previous() {
        let state = state();
        let slot = state.create_session().await;
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let first = tokio::spawn(async move {
            let _tx = tx;
            std::future::pending::<()>().await;
        });
        slot.replace_celebration_timer(1, first).await;
        slot.replace_celebration_timer(2, tokio::spawn(async {})).await;
        // The aborted task drops its sender without sending.
        assert!(rx.await.is_err());
    }

    fn parked() -> (JoinHandle<()>, tokio::sync::oneshot::Receiver<()>) {
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let _tx = tx;
            std::future::pending::<()>().await;
        });
        (handle, rx)
    }

    #[tokio::test]
    async fn older_timer_never_displaces_newer() {
        let state = state();
        let slot = state.create_session().await;
        let (newer, mut newer_rx) = parked();
        let (older, older_rx) = parked();

        slot.replace_celebration_timer(5, newer).await;
        slot.replace_celebration_timer(4, older).await;

        assert!(older_rx.await.is_err());
        assert!(matches!(newer_rx.try_recv(), Err(tokio::sync::oneshot::error::TryRecvError::Empty)));
        assert_eq!(slot.celebration_timer.lock().await.as_ref().map(|(g, _)| *g), Some(5));
    }
}
