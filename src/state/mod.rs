/// Runtime game state and its derived views.
pub mod game;
mod sse;
/// Round and countdown lifecycle rules.
pub mod state_machine;
/// Pure timer arithmetic.
pub mod timer;
/// Gated load, settle, mutate and commit cycle.
pub mod transitions;

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock, watch};

use crate::{config::AppConfig, dao::game_store::GameStore, error::ServiceError};

pub use self::sse::SseHub;

/// Application state shared by every handler.
pub type SharedState = Arc<AppState>;

const PUBLIC_SSE_CAPACITY: usize = 32;

/// Central application state holding the store handle, configuration and broadcast hub.
pub struct AppState {
    game_store: RwLock<Option<Arc<dyn GameStore>>>,
    config: AppConfig,
    public_sse: SseHub,
    degraded: watch::Sender<bool>,
    /// Serialises every read-modify-write of the game state record.
    transition_gate: Mutex<()>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            game_store: RwLock::new(None),
            config,
            public_sse: SseHub::new(PUBLIC_SSE_CAPACITY),
            degraded: degraded_tx,
            transition_gate: Mutex::new(()),
        })
    }

    /// Configuration loaded at startup.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current game store, if one is installed.
    pub async fn game_store(&self) -> Option<Arc<dyn GameStore>> {
        let guard = self.game_store.read().await;
        guard.as_ref().cloned()
    }

    /// Game store handle, or [`ServiceError::Degraded`] while none is installed.
    pub async fn require_game_store(&self) -> Result<Arc<dyn GameStore>, ServiceError> {
        self.game_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new game store implementation and leave degraded mode.
    pub async fn set_game_store(&self, store: Arc<dyn GameStore>) {
        {
            let mut guard = self.game_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Remove the current game store and enter degraded mode.
    pub async fn clear_game_store(&self) {
        {
            let mut guard = self.game_store.write().await;
            guard.take();
        }
        self.update_degraded(true).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        if self.game_store.read().await.is_none() {
            return true;
        }
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Broadcast hub used for the public SSE stream.
    pub fn public_sse(&self) -> &SseHub {
        &self.public_sse
    }

    /// Gate held for the whole load, mutate and commit sequence.
    pub(crate) fn transition_gate(&self) -> &Mutex<()> {
        &self.transition_gate
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::game_store::memory::MemoryGameStore;

    #[tokio::test]
    async fn starts_degraded_until_a_store_is_installed() {
        let state = AppState::new(AppConfig::default());
        let mut watcher = state.degraded_watcher();
        assert!(state.is_degraded().await);
        assert!(matches!(
            state.require_game_store().await,
            Err(ServiceError::Degraded)
        ));

        state.set_game_store(Arc::new(MemoryGameStore::new())).await;
        assert!(!state.is_degraded().await);
        assert!(watcher.has_changed().unwrap());
        assert!(!*watcher.borrow_and_update());

        state.clear_game_store().await;
        assert!(state.is_degraded().await);
    }
}
