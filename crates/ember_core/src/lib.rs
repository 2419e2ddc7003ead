//! # Ember Core
//!
//! Emotional state model and dynamics for the Ember companion: nine bounded
//! emotion dimensions with per-dimension momentum, time-based decay with
//! extreme inertia and idle drift, and a declarative event → delta mapping.
//!
//! This crate is pure state machinery. Coordination (locking, ticking,
//! modulation) lives in `ember_engine`; durable storage in `ember_store`.

pub mod config;
pub mod decay;
pub mod dimension;
pub mod error;
pub mod event;
pub mod interaction;
pub mod state;

pub use config::{BlendSpec, EmberConfig, EngineConfig, GateSpec, ModulationWeights};
pub use decay::{DecayConfig, DecayEngine, DecayProfile};
pub use dimension::{Dimension, ALL_DIMENSIONS, NEUTRAL_INTENSITY};
pub use error::{ConfigError, EventError, PersistenceError};
pub use event::{EventKind, InteractionEvent, ALL_EVENT_KINDS};
pub use interaction::{InteractionConfig, InteractionModel};
pub use state::{DimensionState, EmotionalState, EmotionalStateView, PersistedState, SCHEMA_VERSION};

use async_trait::async_trait;

/// Durable storage seam for the emotional state. One record per deployment;
/// implementations must make `save_state` atomic with respect to crashes so
/// the last good record always wins.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn save_state(&self, state: &PersistedState) -> Result<(), PersistenceError>;

    async fn load_state(&self) -> Result<Option<PersistedState>, PersistenceError>;

    /// Best-effort audit trail of applied events. Default is a no-op so
    /// in-memory stores don't have to care.
    async fn append_interaction(&self, _event: &InteractionEvent) -> Result<(), PersistenceError> {
        Ok(())
    }
}
