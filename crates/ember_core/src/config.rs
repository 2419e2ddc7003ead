//! Configuration for the emotional core.
//!
//! Every tuning coefficient — decay rates, event delta vectors, dampening
//! and momentum factors, modulation weights — lives here with compiled-in
//! defaults, so a missing or partial config file still boots a fully
//! functional companion. Name validation (dimension/event names in the
//! tables) happens when the engines are built, not at parse time.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::decay::DecayConfig;
use crate::error::ConfigError;
use crate::interaction::InteractionConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmberConfig {
    pub engine: EngineConfig,
    pub decay: DecayConfig,
    pub interaction: InteractionConfig,
    pub modulation: ModulationWeights,
}

impl EmberConfig {
    /// Load config from a TOML file, falling back to defaults for missing
    /// fields. Env var overrides are applied after parsing.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let mut config: EmberConfig = toml::from_str(&content)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Try to load from path; if the file is missing or invalid, return
    /// defaults with env overrides. Never blocks startup.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path.as_ref()) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!(
                    "config file {} not usable ({}), using defaults",
                    path.as_ref().display(),
                    e
                );
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("EMBER_DB_PATH") {
            self.engine.db_path = v;
        }
        if let Ok(v) = std::env::var("EMBER_IDLE_THRESHOLD_SECS") {
            if let Ok(n) = v.parse() {
                self.engine.idle_threshold_secs = n;
            }
        }
        if let Ok(v) = std::env::var("EMBER_TICK_INTERVAL_SECS") {
            if let Ok(n) = v.parse() {
                self.engine.tick_interval_secs = n;
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// SQLite database path for the durable state record.
    pub db_path: String,
    /// Gap without interactions after which idle drift kicks in, in seconds.
    pub idle_threshold_secs: i64,
    /// How often the background ticker applies decay while the process runs.
    pub tick_interval_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            db_path: "ember.db".to_string(),
            idle_threshold_secs: 1800,
            tick_interval_secs: 60,
        }
    }
}

/// One generation-control output as a linear blend of dimensions:
/// `bias + Σ weight · intensity`, clamped to `[0, 1]` at evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendSpec {
    pub bias: f32,
    /// Dimension name → weight.
    pub terms: BTreeMap<String, f32>,
}

impl Default for BlendSpec {
    fn default() -> Self {
        Self {
            bias: 0.5,
            terms: BTreeMap::new(),
        }
    }
}

impl BlendSpec {
    fn new(bias: f32, terms: &[(&str, f32)]) -> Self {
        Self {
            bias,
            terms: terms.iter().map(|(d, w)| (d.to_string(), *w)).collect(),
        }
    }
}

/// The refusal gate: a weighted blend compared against a hard threshold.
/// Below the threshold the output is exactly zero — refusal is a discrete
/// behavior with a continuous cause, not a sliding scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateSpec {
    pub threshold: f32,
    pub terms: BTreeMap<String, f32>,
}

impl Default for GateSpec {
    fn default() -> Self {
        Self {
            threshold: 0.6,
            terms: [("frustration".to_string(), 0.6), ("vulnerability".to_string(), 0.4)]
                .into_iter()
                .collect(),
        }
    }
}

/// Weights for the state → generation-parameter mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModulationWeights {
    pub sarcasm: BlendSpec,
    pub formality: BlendSpec,
    pub warmth: BlendSpec,
    pub response_length: BlendSpec,
    pub enthusiasm: BlendSpec,
    pub vulnerability_exposure: BlendSpec,
    pub initiative: BlendSpec,
    pub humor: BlendSpec,
    /// Added to `vulnerability_exposure` while the guard-down window is open.
    pub vulnerability_window_bonus: f32,
    pub refusal: GateSpec,
}

impl Default for ModulationWeights {
    fn default() -> Self {
        Self {
            sarcasm: BlendSpec::new(
                0.15,
                &[("frustration", 0.45), ("confidence", 0.35), ("vulnerability", -0.40)],
            ),
            formality: BlendSpec::new(
                0.30,
                &[("defensiveness", 0.40), ("confidence", 0.20), ("affection", -0.30)],
            ),
            warmth: BlendSpec::new(
                0.20,
                &[("affection", 0.50), ("loneliness", 0.25), ("defensiveness", -0.35)],
            ),
            response_length: BlendSpec::new(
                0.35,
                &[("loneliness", 0.35), ("excitement", 0.35), ("frustration", -0.40)],
            ),
            enthusiasm: BlendSpec::new(
                0.15,
                &[("excitement", 0.50), ("curiosity", 0.30), ("frustration", -0.25)],
            ),
            vulnerability_exposure: BlendSpec::new(
                0.10,
                &[("vulnerability", 0.45), ("affection", 0.30), ("defensiveness", -0.40)],
            ),
            initiative: BlendSpec::new(
                0.10,
                &[
                    ("confidence", 0.40),
                    ("curiosity", 0.30),
                    ("loneliness", 0.20),
                    ("vulnerability", -0.25),
                ],
            ),
            humor: BlendSpec::new(
                0.20,
                &[("excitement", 0.40), ("confidence", 0.25), ("frustration", -0.35)],
            ),
            vulnerability_window_bonus: 0.2,
            refusal: GateSpec::default(),
        }
    }
}
