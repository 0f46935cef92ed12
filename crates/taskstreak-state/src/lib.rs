//! Persistence for TaskStreak state: the versioned envelope, load/save over any
//! [`StateStore`], and the [`Tracker`] session that dispatches actions.

pub mod migrate;

use std::sync::Arc;

use serde::Serialize;
use taskstreak_core::{
    clock::{Clock, Moment},
    reducer::{reduce, Action},
    storage::{StateStore, StoreError},
    tasks::{AppState, Theme},
};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::migrate::{migrate_state, parse_envelope};

/// Key under which the state document is stored.
pub const STORAGE_KEY: &str = "taskstreak_state";
/// Envelope version written by this release.
pub const STORAGE_VERSION: i64 = 2;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to read stored state: {0}")]
    Read(#[source] StoreError),
    #[error("failed to write state: {0}")]
    Write(#[source] StoreError),
    #[error("failed to encode state: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct PersistedEnvelope<'a> {
    version: i64,
    state: &'a AppState,
}

/// Encode `state` inside the current envelope. Same state, same bytes.
pub fn serialize_state(state: &AppState) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(&PersistedEnvelope {
        version: STORAGE_VERSION,
        state,
    })
}

/// Decode stored bytes; anything unreadable becomes an empty state.
pub fn deserialize_state(raw: &[u8], fallback_theme: Theme, moment: &Moment) -> AppState {
    match parse_envelope(raw) {
        Some(envelope) => {
            debug!(version = envelope.version(), "migrating stored state");
            migrate_state(&envelope.into_state(), fallback_theme, moment)
        }
        None => {
            warn!("stored state is not a JSON object; starting empty");
            AppState::empty(fallback_theme)
        }
    }
}

/// State repository backed by a [`StateStore`].
pub struct StateRepository<S: StateStore> {
    store: Arc<S>,
}

impl<S: StateStore> Clone for StateRepository<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: StateStore> StateRepository<S> {
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    #[instrument(skip(self, moment))]
    pub async fn try_load(
        &self,
        fallback_theme: Theme,
        moment: &Moment,
    ) -> Result<AppState, PersistenceError> {
        match self.store.read(STORAGE_KEY).await {
            Ok(bytes) => Ok(deserialize_state(&bytes, fallback_theme, moment)),
            Err(StoreError::NotFound { .. }) => Ok(AppState::empty(fallback_theme)),
            Err(err) => Err(PersistenceError::Read(err)),
        }
    }

    /// Always yields a usable state; read failures fall back to an empty one.
    pub async fn load_state(&self, fallback_theme: Theme, moment: &Moment) -> AppState {
        match self.try_load(fallback_theme, moment).await {
            Ok(state) => state,
            Err(err) => {
                warn!("{err}; starting with empty state");
                AppState::empty(fallback_theme)
            }
        }
    }

    #[instrument(skip_all)]
    pub async fn try_save(&self, state: &AppState) -> Result<(), PersistenceError> {
        let bytes = serialize_state(state)?;
        self.store
            .write(STORAGE_KEY, &bytes)
            .await
            .map_err(PersistenceError::Write)
    }

    /// Best effort: failures are logged and dropped.
    pub async fn save_state(&self, state: &AppState) {
        if let Err(err) = self.try_save(state).await {
            warn!("state not saved: {err}");
        }
    }
}

/// Owns the current snapshot and persists after every dispatched action.
pub struct Tracker<S: StateStore, C: Clock> {
    state: AppState,
    repo: StateRepository<S>,
    clock: C,
}

impl<S: StateStore, C: Clock> Tracker<S, C> {
    pub async fn open(repo: StateRepository<S>, clock: C, fallback_theme: Theme) -> Self {
        let state = repo.load_state(fallback_theme, &clock.moment()).await;
        Self { state, repo, clock }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn moment(&self) -> Moment {
        self.clock.moment()
    }

    /// Apply `action`, swap in the new snapshot, then save it.
    pub async fn dispatch(&mut self, action: Action) -> &AppState {
        let moment = self.clock.moment();
        let previous = std::mem::take(&mut self.state);
        self.state = reduce(previous, action, &moment);
        self.repo.save_state(&self.state).await;
        &self.state
    }
}
