//! Boot-time loading with offline decay catch-up.
//!
//! While the process was down the companion kept (notionally) living:
//! emotions faded toward their floors and loneliness crept up. On load, the
//! gateway applies decay for the whole offline gap in one closed-form step —
//! it is never replayed tick by tick, and it never blocks startup: any
//! schema or storage problem falls back to a fresh neutral state with a
//! warning.

use ember_core::{DecayEngine, EmotionalState, PersistenceError, StateStore};

pub struct StateGateway<S: StateStore> {
    store: S,
    decay: DecayEngine,
}

impl<S: StateStore> StateGateway<S> {
    pub fn new(store: S, decay: DecayEngine) -> Self {
        Self { store, decay }
    }

    /// Load the persisted state and advance it across the offline gap.
    ///
    /// Returns `Ok(None)` when there is nothing usable: no record yet, or a
    /// record the schema validator rejected (that is logged, not fatal).
    /// Storage errors are retried once, then surfaced.
    pub async fn load(&self, now: i64) -> Result<Option<EmotionalState>, PersistenceError> {
        let record = match self.store.load_state().await {
            Ok(r) => r,
            Err(first) => {
                tracing::warn!("state load failed, retrying once: {}", first);
                self.store.load_state().await?
            }
        };
        let Some(record) = record else {
            return Ok(None);
        };

        let mut state = match EmotionalState::from_persisted(record) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("persisted state rejected ({}), starting fresh", e);
                return Ok(None);
            }
        };

        let elapsed = now - state.last_updated;
        if elapsed > 0 {
            tracing::info!("applying offline catch-up for {}s", elapsed);
            // The whole gap counts as idle — nobody interacted while down.
            self.decay.advance(&mut state, elapsed, true);
        }
        Ok(Some(state))
    }

    /// Like [`load`](Self::load) but total: any failure degrades to a fresh
    /// neutral state so startup always succeeds.
    pub async fn load_or_neutral(&self, now: i64) -> EmotionalState {
        match self.load(now).await {
            Ok(Some(state)) => state,
            Ok(None) => {
                tracing::info!("no usable persisted state, starting neutral");
                EmotionalState::neutral(now)
            }
            Err(e) => {
                tracing::warn!("state load failed twice ({}), starting neutral", e);
                EmotionalState::neutral(now)
            }
        }
    }

    /// Persist with one retry. The engine does its own retrying during
    /// normal operation; this is for explicit checkpoints (shutdown).
    pub async fn save(&self, state: &EmotionalState) -> Result<(), PersistenceError> {
        let record = state.to_persisted();
        if let Err(first) = self.store.save_state(&record).await {
            tracing::warn!("state save failed, retrying once: {}", first);
            self.store.save_state(&record).await?;
        }
        Ok(())
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
