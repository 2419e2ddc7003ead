//! Mapping discrete events onto the emotional state.
//!
//! The event → delta mapping is a declarative table (loaded from config, not
//! scattered through dispatch code) so the whole emotional wiring of the
//! companion can be audited in one place. Two mechanics shape the raw
//! deltas before they land:
//!
//! - **Burst dampening**: the same event kind repeated within a short window
//!   loses effect — the fifth message in a minute moves the needle far less
//!   than the first. Diminishing returns, not a bug.
//! - **Momentum cascades**: a delta pushing the same direction the dimension
//!   is already moving gets amplified; a delta fighting the current gets
//!   damped. Afterwards momentum itself is pulled toward the applied delta.

use std::collections::{BTreeMap, HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::dimension::Dimension;
use crate::error::{ConfigError, EventError};
use crate::event::{EventKind, InteractionEvent};
use crate::state::EmotionalState;

/// Momentum magnitudes below this are treated as "no current".
const MOMENTUM_EPSILON: f32 = 0.01;

/// Interaction section of the config file. Delta tables are keyed by event
/// kind name, then dimension name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Repeat-event window, in seconds.
    pub dampening_window_secs: i64,
    /// Each recent same-kind event shaves this much off the delta scale.
    pub dampening_step: f32,
    /// The delta scale never drops below this fraction of nominal.
    pub dampening_floor: f32,
    /// Same-direction momentum multiplies the delta by this.
    pub momentum_amplify: f32,
    /// Opposing momentum multiplies the delta by this.
    pub momentum_dampen: f32,
    /// How far momentum moves toward the applied delta (0 = frozen,
    /// 1 = snaps instantly).
    pub momentum_blend: f32,
    /// Applied delta is scaled by this before becoming the momentum target.
    pub momentum_scale: f32,
    /// How long a genuine moment keeps the guard down, in seconds.
    pub vulnerability_window_secs: i64,
    pub deltas: BTreeMap<String, BTreeMap<String, f32>>,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            dampening_window_secs: 60,
            dampening_step: 0.2,
            dampening_floor: 0.2,
            momentum_amplify: 1.2,
            momentum_dampen: 0.8,
            momentum_blend: 0.5,
            momentum_scale: 3.0,
            vulnerability_window_secs: crate::state::VULNERABILITY_WINDOW_SECS,
            deltas: default_delta_table(),
        }
    }
}

fn default_delta_table() -> BTreeMap<String, BTreeMap<String, f32>> {
    fn row(entries: &[(Dimension, f32)]) -> BTreeMap<String, f32> {
        entries
            .iter()
            .map(|(d, v)| (d.as_str().to_string(), *v))
            .collect()
    }

    let mut table = BTreeMap::new();
    table.insert(
        EventKind::UserMessage.as_str().to_string(),
        row(&[
            (Dimension::Loneliness, -0.15),
            (Dimension::Excitement, 0.05),
            (Dimension::Curiosity, 0.05),
        ]),
    );
    table.insert(
        EventKind::ErrorOccurred.as_str().to_string(),
        row(&[
            (Dimension::Frustration, 0.2),
            (Dimension::Confidence, -0.1),
            (Dimension::Defensiveness, 0.1),
        ]),
    );
    table.insert(
        EventKind::SuccessfulHelp.as_str().to_string(),
        row(&[
            (Dimension::Frustration, -0.2),
            (Dimension::Confidence, 0.15),
            (Dimension::Affection, 0.1),
        ]),
    );
    table.insert(
        EventKind::CodeNeglected.as_str().to_string(),
        row(&[
            (Dimension::Jealousy, 0.2),
            (Dimension::Loneliness, 0.05),
        ]),
    );
    table.insert(
        EventKind::CodeUpdated.as_str().to_string(),
        row(&[
            (Dimension::Jealousy, -0.15),
            (Dimension::Excitement, 0.1),
            (Dimension::Curiosity, 0.1),
        ]),
    );
    table.insert(
        EventKind::GenuineMoment.as_str().to_string(),
        row(&[
            (Dimension::Vulnerability, 0.3),
            (Dimension::Affection, 0.2),
        ]),
    );
    table.insert(
        EventKind::PlatformIgnored.as_str().to_string(),
        row(&[
            (Dimension::Loneliness, 0.2),
            (Dimension::Defensiveness, 0.1),
            (Dimension::Affection, -0.05),
        ]),
    );
    table.insert(
        EventKind::PositiveInteraction.as_str().to_string(),
        row(&[
            (Dimension::Affection, 0.15),
            (Dimension::Excitement, 0.1),
            (Dimension::Frustration, -0.1),
            (Dimension::Loneliness, -0.1),
        ]),
    );
    table
}

/// Applies events to the state. Holds the short-lived burst history; that
/// history is deliberately not persisted — forgetting a sub-minute burst
/// across a restart is harmless.
#[derive(Debug, Clone)]
pub struct InteractionModel {
    table: BTreeMap<EventKind, Vec<(Dimension, f32)>>,
    cfg: InteractionConfig,
    recent: HashMap<EventKind, VecDeque<i64>>,
}

impl InteractionModel {
    pub fn from_config(cfg: &InteractionConfig) -> Result<Self, ConfigError> {
        let mut table = BTreeMap::new();
        for (kind_name, dims) in &cfg.deltas {
            let kind = EventKind::parse_str(kind_name)
                .ok_or_else(|| ConfigError::UnknownEventKind { name: kind_name.clone() })?;
            let mut row = Vec::with_capacity(dims.len());
            for (dim_name, delta) in dims {
                let dim = Dimension::parse_str(dim_name)
                    .ok_or_else(|| ConfigError::UnknownDimension { name: dim_name.clone() })?;
                row.push((dim, *delta));
            }
            table.insert(kind, row);
        }
        Ok(Self {
            table,
            cfg: cfg.clone(),
            recent: HashMap::new(),
        })
    }

    /// Apply one event. The state must already be decayed up to the event's
    /// timestamp; this only adds the event's delta vector.
    pub fn apply(
        &mut self,
        state: &mut EmotionalState,
        event: &InteractionEvent,
    ) -> Result<(), EventError> {
        let row = self
            .table
            .get(&event.kind)
            .cloned()
            .ok_or_else(|| EventError::UnknownKind {
                kind: event.kind.as_str().to_string(),
            })?;

        let dampening = self.dampening_factor(event.kind, event.timestamp);
        let magnitude = event.magnitude.unwrap_or(1.0).max(0.0);

        for (dim, base_delta) in row {
            let mut delta = base_delta * magnitude * dampening;

            // Cascade: a push along the existing current hits harder, a push
            // against it hits softer.
            let momentum = state.momentum(dim);
            if momentum.abs() > MOMENTUM_EPSILON && delta != 0.0 {
                if momentum.signum() == delta.signum() {
                    delta *= self.cfg.momentum_amplify;
                } else {
                    delta *= self.cfg.momentum_dampen;
                }
            }

            state.set_intensity(dim, state.intensity(dim) + delta);

            let target = (delta * self.cfg.momentum_scale).clamp(-1.0, 1.0);
            let blended = momentum + (target - momentum) * self.cfg.momentum_blend;
            state.set_momentum(dim, blended);

            tracing::debug!(
                dimension = %dim,
                delta,
                dampening,
                "applied interaction delta"
            );
        }

        if event.kind == EventKind::GenuineMoment {
            state.open_vulnerability_window(event.timestamp, self.cfg.vulnerability_window_secs);
        }

        self.remember(event.kind, event.timestamp);
        state.last_updated = state.last_updated.max(event.timestamp);
        Ok(())
    }

    /// Scale factor for repeated same-kind events: 1.0 for the first, then
    /// stepping linearly down to the configured floor.
    fn dampening_factor(&mut self, kind: EventKind, now: i64) -> f32 {
        let window = self.cfg.dampening_window_secs;
        let recent = self.recent.entry(kind).or_default();
        while let Some(front) = recent.front() {
            if now - front > window {
                recent.pop_front();
            } else {
                break;
            }
        }
        let n = recent.len() as f32;
        (1.0 - self.cfg.dampening_step * n).max(self.cfg.dampening_floor)
    }

    fn remember(&mut self, kind: EventKind, at: i64) {
        self.recent.entry(kind).or_default().push_back(at);
    }
}

impl Default for InteractionModel {
    fn default() -> Self {
        // The default config only contains known names.
        Self::from_config(&InteractionConfig::default()).unwrap_or_else(|_| Self {
            table: BTreeMap::new(),
            cfg: InteractionConfig::default(),
            recent: HashMap::new(),
        })
    }
}
