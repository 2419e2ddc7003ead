//! # Ember Engine
//!
//! The coordinating service around the emotional core. Serializes all state
//! mutation through a single write lock (decay → event delta → persist as
//! one unit), runs the idle-decay ticker, and derives generation-control
//! parameters from the state on every request.
//!
//! Adapters see three calls: `record_event`, `current_modulation`,
//! `snapshot`. Everything else is internal discipline.

mod engine;
mod modulation;
mod ticker;

pub use engine::EmotionEngine;
pub use modulation::{ModulationParams, Modulator};
pub use ticker::{spawn_ticker, TickerConfig};
