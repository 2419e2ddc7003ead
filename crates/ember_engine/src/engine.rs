//! The coordinating emotion service.
//!
//! Exactly one `EmotionEngine` is live per process. Platform adapters from
//! any number of I/O tasks funnel their events through `record_event`; each
//! event is one atomic unit of work behind a single write lock:
//!
//! decay for the elapsed gap → apply the event's delta → persist → release.
//!
//! Reads (`snapshot`, `current_modulation`) copy the state out under a read
//! lock so nothing holds the lock across an LLM call. A failing store never
//! fails a request: after one retry the engine degrades to in-memory state
//! and keeps going.

use std::sync::Arc;

use tokio::sync::RwLock;

use ember_core::{
    ConfigError, DecayEngine, EmberConfig, EmotionalState, EmotionalStateView, EventError,
    InteractionEvent, InteractionModel, StateStore,
};

use crate::modulation::{ModulationParams, Modulator};

struct Inner {
    state: EmotionalState,
    interactions: InteractionModel,
    /// Unix timestamp of the last interaction event (not the last decay
    /// tick) — this is what decides whether the companion counts as idle.
    last_event_at: i64,
    /// Set after a save failed twice; cleared by the next successful save.
    degraded: bool,
}

pub struct EmotionEngine {
    inner: Arc<RwLock<Inner>>,
    decay: DecayEngine,
    modulator: Modulator,
    store: Arc<dyn StateStore>,
    idle_threshold_secs: i64,
}

impl EmotionEngine {
    /// Build the engine from config, an initial state (usually the gateway's
    /// catch-up result), and a store for ongoing saves.
    pub fn new(
        cfg: &EmberConfig,
        initial: EmotionalState,
        store: Arc<dyn StateStore>,
    ) -> Result<Self, ConfigError> {
        let decay = DecayEngine::from_config(&cfg.decay)?;
        let interactions = InteractionModel::from_config(&cfg.interaction)?;
        let modulator = Modulator::from_weights(&cfg.modulation)?;
        let last_event_at = initial.last_updated;

        Ok(Self {
            inner: Arc::new(RwLock::new(Inner {
                state: initial,
                interactions,
                last_event_at,
                degraded: false,
            })),
            decay,
            modulator,
            store,
            idle_threshold_secs: cfg.engine.idle_threshold_secs,
        })
    }

    /// The single mutation entry point. Applies decay for the time since the
    /// last update, then the event's delta, persists, and returns the
    /// resulting state.
    pub async fn record_event(
        &self,
        event: InteractionEvent,
    ) -> Result<EmotionalState, EventError> {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;
        let now = event.timestamp;

        let elapsed = now - inner.state.last_updated;
        let idle = now - inner.last_event_at >= self.idle_threshold_secs;
        self.decay.advance(&mut inner.state, elapsed, idle);

        inner.interactions.apply(&mut inner.state, &event)?;
        inner.last_event_at = inner.last_event_at.max(now);

        self.persist(&mut *inner).await;
        if let Err(e) = self.store.append_interaction(&event).await {
            tracing::warn!("failed to append interaction audit entry: {}", e);
        }

        tracing::debug!(kind = %event.kind, dominant = %inner.state.dominant(), "event recorded");
        Ok(inner.state.clone())
    }

    /// Save with one retry, then degrade to in-memory-only and keep serving.
    async fn persist(&self, inner: &mut Inner) {
        let record = inner.state.to_persisted();
        match self.store.save_state(&record).await {
            Ok(()) => {
                if inner.degraded {
                    tracing::info!("state persistence recovered");
                }
                inner.degraded = false;
            }
            Err(first) => {
                tracing::warn!("state save failed, retrying once: {}", first);
                if let Err(second) = self.store.save_state(&record).await {
                    if !inner.degraded {
                        tracing::warn!(
                            "state save failed twice, continuing in-memory only: {}",
                            second
                        );
                    }
                    inner.degraded = true;
                }
            }
        }
    }

    /// Apply decay up to `now` without an event. Used by the idle ticker so
    /// drift happens live rather than only at boot catch-up.
    pub async fn tick(&self, now: i64) {
        let mut inner = self.inner.write().await;
        let elapsed = now - inner.state.last_updated;
        if elapsed <= 0 {
            return;
        }
        let idle = now - inner.last_event_at >= self.idle_threshold_secs;
        self.decay.advance(&mut inner.state, elapsed, idle);
        self.persist(&mut inner).await;
    }

    /// Generation parameters derived from the current state. Total: always
    /// produces values, even while degraded.
    pub async fn current_modulation(&self) -> ModulationParams {
        let inner = self.inner.read().await;
        let now = chrono::Utc::now().timestamp();
        self.modulator.modulate(&inner.state, now)
    }

    /// Serializable read-only copy for logging and dashboards.
    pub async fn snapshot(&self) -> EmotionalStateView {
        let inner = self.inner.read().await;
        let now = chrono::Utc::now().timestamp();
        inner.state.view(now)
    }

    /// Behavioral hints for the prompt builder.
    pub async fn describe(&self) -> String {
        let inner = self.inner.read().await;
        let now = chrono::Utc::now().timestamp();
        inner.state.describe(now)
    }

    /// Whether the engine is currently running without durable saves.
    pub async fn is_degraded(&self) -> bool {
        self.inner.read().await.degraded
    }
}
