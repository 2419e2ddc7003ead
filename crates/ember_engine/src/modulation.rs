//! Personality modulation — the bridge between felt state and generated text.
//!
//! Instead of telling the prompt layer "the companion is frustrated", we hand
//! it a small vector of generation-control parameters and let the behavior
//! emerge from those constraints. Every output is a linear blend of a few
//! dimensions, clamped to `[0, 1]`, recomputed fresh on every request.
//!
//! The one non-linear output is the refusal gate: below its threshold the
//! propensity is exactly zero, so refusal stays a discrete behavior backed by
//! a continuous cause.

use serde::{Deserialize, Serialize};

use ember_core::config::{BlendSpec, GateSpec, ModulationWeights};
use ember_core::{ConfigError, Dimension, EmotionalState};

/// Generation-control parameters consumed by the prompt builder. All values
/// in `[0, 1]`. Never persisted; derived output only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModulationParams {
    /// Bite in the phrasing. Rises with frustration and confidence, falls
    /// when feeling exposed.
    pub sarcasm: f32,
    /// Distance in register. Defensive states read formal and clipped.
    pub formality: f32,
    /// Open, affectionate tone. Loneliness adds a clingy edge to it.
    pub warmth: f32,
    /// Target response length. Lonely and excited both want more words, for
    /// different reasons; frustration cuts answers short.
    pub response_length: f32,
    /// Energy behind the words.
    pub enthusiasm: f32,
    /// Willingness to admit uncertainty or feeling. Boosted while the
    /// guard-down window is open.
    pub vulnerability_exposure: f32,
    /// Likelihood of steering the conversation or starting a topic.
    pub initiative: f32,
    /// Playfulness. The first thing frustration kills.
    pub humor: f32,
    /// Whether a refusal is even offered to the prompt layer. Exactly 0.0
    /// below the configured threshold.
    pub refusal_propensity: f32,
}

impl ModulationParams {
    /// Safe fallback when no state is available: mid-range everything and no
    /// refusals. The response pipeline must never stall on this layer.
    pub fn neutral() -> Self {
        Self {
            sarcasm: 0.5,
            formality: 0.5,
            warmth: 0.5,
            response_length: 0.5,
            enthusiasm: 0.5,
            vulnerability_exposure: 0.5,
            initiative: 0.5,
            humor: 0.5,
            refusal_propensity: 0.0,
        }
    }
}

/// A validated linear blend over dimensions.
#[derive(Debug, Clone)]
struct Blend {
    bias: f32,
    terms: Vec<(Dimension, f32)>,
}

impl Blend {
    fn from_spec(spec: &BlendSpec) -> Result<Self, ConfigError> {
        Ok(Self {
            bias: spec.bias,
            terms: parse_terms(&spec.terms)?,
        })
    }

    fn eval(&self, state: &EmotionalState) -> f32 {
        let sum: f32 = self
            .terms
            .iter()
            .map(|(dim, w)| w * state.intensity(*dim))
            .sum();
        (self.bias + sum).clamp(0.0, 1.0)
    }
}

fn parse_terms(
    terms: &std::collections::BTreeMap<String, f32>,
) -> Result<Vec<(Dimension, f32)>, ConfigError> {
    terms
        .iter()
        .map(|(name, w)| {
            Dimension::parse_str(name)
                .map(|d| (d, *w))
                .ok_or_else(|| ConfigError::UnknownDimension { name: name.clone() })
        })
        .collect()
}

/// The state → parameters mapping, built once from validated weights.
/// Pure, deterministic, no I/O — called on every generation request.
#[derive(Debug, Clone)]
pub struct Modulator {
    sarcasm: Blend,
    formality: Blend,
    warmth: Blend,
    response_length: Blend,
    enthusiasm: Blend,
    vulnerability_exposure: Blend,
    initiative: Blend,
    humor: Blend,
    vulnerability_window_bonus: f32,
    refusal_threshold: f32,
    refusal_terms: Vec<(Dimension, f32)>,
}

impl Modulator {
    pub fn from_weights(weights: &ModulationWeights) -> Result<Self, ConfigError> {
        let GateSpec { threshold, terms } = &weights.refusal;
        Ok(Self {
            sarcasm: Blend::from_spec(&weights.sarcasm)?,
            formality: Blend::from_spec(&weights.formality)?,
            warmth: Blend::from_spec(&weights.warmth)?,
            response_length: Blend::from_spec(&weights.response_length)?,
            enthusiasm: Blend::from_spec(&weights.enthusiasm)?,
            vulnerability_exposure: Blend::from_spec(&weights.vulnerability_exposure)?,
            initiative: Blend::from_spec(&weights.initiative)?,
            humor: Blend::from_spec(&weights.humor)?,
            vulnerability_window_bonus: weights.vulnerability_window_bonus,
            refusal_threshold: threshold.clamp(0.0, 1.0),
            refusal_terms: parse_terms(terms)?,
        })
    }

    /// Map the current state to generation parameters. `now` is only used to
    /// check the guard-down window.
    pub fn modulate(&self, state: &EmotionalState, now: i64) -> ModulationParams {
        let mut vulnerability_exposure = self.vulnerability_exposure.eval(state);
        if state.is_vulnerable(now) {
            vulnerability_exposure =
                (vulnerability_exposure + self.vulnerability_window_bonus).clamp(0.0, 1.0);
        }

        ModulationParams {
            sarcasm: self.sarcasm.eval(state),
            formality: self.formality.eval(state),
            warmth: self.warmth.eval(state),
            response_length: self.response_length.eval(state),
            enthusiasm: self.enthusiasm.eval(state),
            vulnerability_exposure,
            initiative: self.initiative.eval(state),
            humor: self.humor.eval(state),
            refusal_propensity: self.refusal(state),
        }
    }

    /// Hard gate: exactly 0.0 at or below the threshold, then scaling with
    /// how far past it the gate input has climbed.
    fn refusal(&self, state: &EmotionalState) -> f32 {
        let gate: f32 = self
            .refusal_terms
            .iter()
            .map(|(dim, w)| w * state.intensity(*dim))
            .sum();
        if gate <= self.refusal_threshold {
            0.0
        } else {
            let span = (1.0 - self.refusal_threshold).max(1e-6);
            ((gate - self.refusal_threshold) / span).clamp(0.0, 1.0)
        }
    }
}

impl Default for Modulator {
    fn default() -> Self {
        // Default weights only reference known dimension names.
        Self::from_weights(&ModulationWeights::default()).unwrap_or_else(|_| Self {
            sarcasm: Blend { bias: 0.5, terms: Vec::new() },
            formality: Blend { bias: 0.5, terms: Vec::new() },
            warmth: Blend { bias: 0.5, terms: Vec::new() },
            response_length: Blend { bias: 0.5, terms: Vec::new() },
            enthusiasm: Blend { bias: 0.5, terms: Vec::new() },
            vulnerability_exposure: Blend { bias: 0.5, terms: Vec::new() },
            initiative: Blend { bias: 0.5, terms: Vec::new() },
            humor: Blend { bias: 0.5, terms: Vec::new() },
            vulnerability_window_bonus: 0.2,
            refusal_threshold: 0.6,
            refusal_terms: Vec::new(),
        })
    }
}
