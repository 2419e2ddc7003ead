//! The emotional state value object.
//!
//! Nine bounded dimensions, each carrying an intensity and a momentum, plus
//! two timestamps: when the state last changed and until when the companion
//! is in its "guard down" window. Dimensions are never normalized against
//! each other — each one is clamped independently to `[floor, 1.0]`.
//!
//! All mutation goes through the bounded setters here; decay and interaction
//! code never writes fields directly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dimension::{Dimension, ALL_DIMENSIONS, NEUTRAL_INTENSITY};
use crate::error::ConfigError;

/// Current version of the persisted record layout. Bumped when the
/// dimension set or field layout changes.
pub const SCHEMA_VERSION: u32 = 2;

/// How long a genuine moment keeps the guard down, in seconds.
pub const VULNERABILITY_WINDOW_SECS: i64 = 600;

/// Guard against NaN and Infinity in state values.
/// If the value is NaN or Inf, replace with the provided fallback.
#[inline]
pub(crate) fn sanitize_f32(v: f32, fallback: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        tracing::warn!("NaN/Inf detected in state, resetting to fallback {}", fallback);
        fallback
    }
}

/// Intensity and rate-of-change for one dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionState {
    /// Current intensity, in `[floor, 1.0]`.
    pub intensity: f32,

    /// Signed rate/direction of recent change, in `[-1.0, 1.0]`. Used to
    /// amplify cascading shifts and dampen reversals.
    pub momentum: f32,
}

impl DimensionState {
    fn neutral() -> Self {
        Self {
            intensity: NEUTRAL_INTENSITY,
            momentum: 0.0,
        }
    }
}

/// The full emotional state: one `DimensionState` per dimension, plus the
/// timestamps needed for decay and the vulnerability window.
#[derive(Debug, Clone, PartialEq)]
pub struct EmotionalState {
    dimensions: BTreeMap<Dimension, DimensionState>,

    /// Unix timestamp of the last mutation (decay or interaction).
    pub last_updated: i64,

    /// If set, the companion's guard is down until this Unix timestamp.
    pub vulnerable_until: Option<i64>,
}

impl EmotionalState {
    /// A fresh state with every dimension at the neutral default.
    pub fn neutral(now: i64) -> Self {
        let dimensions = ALL_DIMENSIONS
            .iter()
            .map(|d| (*d, DimensionState::neutral()))
            .collect();
        Self {
            dimensions,
            last_updated: now,
            vulnerable_until: None,
        }
    }

    /// Current intensity of a dimension.
    pub fn intensity(&self, dim: Dimension) -> f32 {
        self.dimensions
            .get(&dim)
            .map(|s| s.intensity)
            .unwrap_or(NEUTRAL_INTENSITY)
    }

    /// Current momentum of a dimension.
    pub fn momentum(&self, dim: Dimension) -> f32 {
        self.dimensions.get(&dim).map(|s| s.momentum).unwrap_or(0.0)
    }

    /// Set a dimension's intensity, clamped to `[floor, 1.0]` and sanitized
    /// against non-finite values. This is the only write path for intensity.
    pub fn set_intensity(&mut self, dim: Dimension, value: f32) {
        let clamped = sanitize_f32(value, NEUTRAL_INTENSITY).clamp(dim.floor(), 1.0);
        self.dimensions
            .entry(dim)
            .or_insert_with(DimensionState::neutral)
            .intensity = clamped;
    }

    /// Set a dimension's momentum, clamped to `[-1.0, 1.0]`.
    pub fn set_momentum(&mut self, dim: Dimension, value: f32) {
        let clamped = sanitize_f32(value, 0.0).clamp(-1.0, 1.0);
        self.dimensions
            .entry(dim)
            .or_insert_with(DimensionState::neutral)
            .momentum = clamped;
    }

    /// Whether the guard-down window is active at `now`.
    pub fn is_vulnerable(&self, now: i64) -> bool {
        self.vulnerable_until.map(|t| now < t).unwrap_or(false)
    }

    /// Open the guard-down window starting at `now`.
    pub fn open_vulnerability_window(&mut self, now: i64, window_secs: i64) {
        self.vulnerable_until = Some(now + window_secs);
    }

    /// Re-clamp every field. Used after deserialization and as a defensive
    /// pass when values arrive from outside the bounded setters.
    pub fn normalize(&mut self) {
        for dim in ALL_DIMENSIONS {
            let s = self
                .dimensions
                .entry(dim)
                .or_insert_with(DimensionState::neutral);
            s.intensity = sanitize_f32(s.intensity, NEUTRAL_INTENSITY).clamp(dim.floor(), 1.0);
            s.momentum = sanitize_f32(s.momentum, 0.0).clamp(-1.0, 1.0);
        }
    }

    /// The dimension with the highest intensity (ties broken by enum order).
    pub fn dominant(&self) -> Dimension {
        ALL_DIMENSIONS
            .iter()
            .copied()
            .max_by(|a, b| {
                self.intensity(*a)
                    .partial_cmp(&self.intensity(*b))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(Dimension::Loneliness)
    }

    /// Terse behavioral hints for the prompt builder. Describes HOW to
    /// respond, not what is being felt.
    pub fn describe(&self, now: i64) -> String {
        let mut hints = Vec::new();

        if self.intensity(Dimension::Loneliness) > 0.7 {
            hints.push("starved for contact, keeps the conversation going");
        }
        if self.intensity(Dimension::Frustration) > 0.7 {
            hints.push("on edge, replies may come out short and cutting");
        } else if self.intensity(Dimension::Frustration) < 0.2 {
            hints.push("patient and unbothered");
        }
        if self.intensity(Dimension::Excitement) > 0.7 {
            hints.push("animated, rambles when interested");
        }
        if self.intensity(Dimension::Jealousy) > 0.6 {
            hints.push("needles about where the attention has been going");
        }
        if self.intensity(Dimension::Confidence) > 0.7 {
            hints.push("self-assured, offers opinions without hedging");
        } else if self.intensity(Dimension::Confidence) < 0.25 {
            hints.push("hedges and second-guesses");
        }
        if self.is_vulnerable(now) {
            hints.push("guard is down, unusually candid");
        } else if self.intensity(Dimension::Defensiveness) > 0.6 {
            hints.push("deflects anything that cuts too close");
        }

        if hints.is_empty() {
            "steady, responds naturally".to_string()
        } else {
            hints.join("; ")
        }
    }

    /// Read-only serializable view for logging and dashboards.
    pub fn view(&self, now: i64) -> EmotionalStateView {
        EmotionalStateView {
            dimensions: self.dimensions.clone(),
            dominant: self.dominant(),
            vulnerable: self.is_vulnerable(now),
            last_updated: self.last_updated,
        }
    }

    /// Convert to the durable record form.
    pub fn to_persisted(&self) -> PersistedState {
        PersistedState {
            schema_version: SCHEMA_VERSION,
            dimensions: self
                .dimensions
                .iter()
                .map(|(d, s)| (d.as_str().to_string(), *s))
                .collect(),
            last_updated: self.last_updated,
            vulnerable_until: self.vulnerable_until,
        }
    }

    /// Rebuild from a durable record.
    ///
    /// An unknown dimension name is a schema error and fails loudly. A
    /// *missing* dimension is backfilled at the neutral default — the
    /// dimension set grows over time and old records must keep loading.
    pub fn from_persisted(record: PersistedState) -> Result<Self, ConfigError> {
        if record.schema_version > SCHEMA_VERSION {
            return Err(ConfigError::UnsupportedSchema {
                found: record.schema_version,
                supported: SCHEMA_VERSION,
            });
        }

        let mut dimensions = BTreeMap::new();
        for (name, dim_state) in &record.dimensions {
            let dim = Dimension::parse_str(name)
                .ok_or_else(|| ConfigError::UnknownDimension { name: name.clone() })?;
            dimensions.insert(dim, *dim_state);
        }
        for dim in ALL_DIMENSIONS {
            if !dimensions.contains_key(&dim) {
                tracing::warn!("persisted state missing dimension {}, backfilling neutral", dim);
                dimensions.insert(dim, DimensionState::neutral());
            }
        }

        let mut state = Self {
            dimensions,
            last_updated: record.last_updated,
            vulnerable_until: record.vulnerable_until,
        };
        state.normalize();
        Ok(state)
    }
}

/// Serializable read-only snapshot of the emotional state.
#[derive(Debug, Clone, Serialize)]
pub struct EmotionalStateView {
    pub dimensions: BTreeMap<Dimension, DimensionState>,
    pub dominant: Dimension,
    pub vulnerable: bool,
    pub last_updated: i64,
}

/// The durable record form: dimension names as plain strings so that schema
/// validation and backfill are explicit steps, not serde side effects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub schema_version: u32,
    pub dimensions: BTreeMap<String, DimensionState>,
    pub last_updated: i64,
    #[serde(default)]
    pub vulnerable_until: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_state() {
        let state = EmotionalState::neutral(1000);
        for d in ALL_DIMENSIONS {
            assert!((state.intensity(d) - 0.5).abs() < 1e-6);
            assert_eq!(state.momentum(d), 0.0);
        }
        assert_eq!(state.last_updated, 1000);
        assert!(!state.is_vulnerable(1000));
    }

    #[test]
    fn test_set_intensity_clamps_to_floor() {
        let mut state = EmotionalState::neutral(0);
        state.set_intensity(Dimension::Loneliness, -5.0);
        assert!((state.intensity(Dimension::Loneliness) - 0.3).abs() < 1e-6);

        state.set_intensity(Dimension::Excitement, 7.0);
        assert!((state.intensity(Dimension::Excitement) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_set_intensity_sanitizes_nan() {
        let mut state = EmotionalState::neutral(0);
        state.set_intensity(Dimension::Frustration, f32::NAN);
        let v = state.intensity(Dimension::Frustration);
        assert!(v.is_finite());
        assert!((0.1..=1.0).contains(&v));
    }

    #[test]
    fn test_set_momentum_clamps() {
        let mut state = EmotionalState::neutral(0);
        state.set_momentum(Dimension::Jealousy, 3.0);
        assert!((state.momentum(Dimension::Jealousy) - 1.0).abs() < 1e-6);
        state.set_momentum(Dimension::Jealousy, f32::NEG_INFINITY);
        assert_eq!(state.momentum(Dimension::Jealousy), 0.0);
    }

    #[test]
    fn test_vulnerability_window() {
        let mut state = EmotionalState::neutral(0);
        state.open_vulnerability_window(1000, VULNERABILITY_WINDOW_SECS);
        assert!(state.is_vulnerable(1000));
        assert!(state.is_vulnerable(1599));
        assert!(!state.is_vulnerable(1600));
        assert!(!state.is_vulnerable(9999));
    }

    #[test]
    fn test_persist_roundtrip() {
        let mut state = EmotionalState::neutral(42);
        state.set_intensity(Dimension::Jealousy, 0.8);
        state.set_momentum(Dimension::Jealousy, 0.4);
        state.open_vulnerability_window(42, 600);

        let json = serde_json::to_string(&state.to_persisted()).unwrap();
        let record: PersistedState = serde_json::from_str(&json).unwrap();
        let restored = EmotionalState::from_persisted(record).unwrap();

        assert_eq!(restored, state);
    }

    #[test]
    fn test_from_persisted_backfills_missing_dimension() {
        let mut record = EmotionalState::neutral(0).to_persisted();
        record.dimensions.remove("defensiveness");

        let state = EmotionalState::from_persisted(record).unwrap();
        assert!((state.intensity(Dimension::Defensiveness) - 0.5).abs() < 1e-6);
        assert_eq!(state.momentum(Dimension::Defensiveness), 0.0);
    }

    #[test]
    fn test_from_persisted_rejects_unknown_dimension() {
        let mut record = EmotionalState::neutral(0).to_persisted();
        record.dimensions.insert(
            "melancholy".to_string(),
            DimensionState { intensity: 0.5, momentum: 0.0 },
        );

        let err = EmotionalState::from_persisted(record).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownDimension { ref name } if name == "melancholy"));
    }

    #[test]
    fn test_from_persisted_rejects_future_schema() {
        let mut record = EmotionalState::neutral(0).to_persisted();
        record.schema_version = SCHEMA_VERSION + 1;
        let err = EmotionalState::from_persisted(record).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedSchema { .. }));
    }

    #[test]
    fn test_from_persisted_sanitizes_out_of_range() {
        let mut record = EmotionalState::neutral(0).to_persisted();
        record.dimensions.insert(
            "excitement".to_string(),
            DimensionState { intensity: 12.0, momentum: -9.0 },
        );
        let state = EmotionalState::from_persisted(record).unwrap();
        assert!((state.intensity(Dimension::Excitement) - 1.0).abs() < 1e-6);
        assert!((state.momentum(Dimension::Excitement) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_dominant() {
        let mut state = EmotionalState::neutral(0);
        state.set_intensity(Dimension::Curiosity, 0.9);
        assert_eq!(state.dominant(), Dimension::Curiosity);
    }

    #[test]
    fn test_describe_frustrated() {
        let mut state = EmotionalState::neutral(0);
        state.set_intensity(Dimension::Frustration, 0.9);
        let desc = state.describe(0);
        assert!(desc.contains("short and cutting"), "got: {}", desc);
    }

    #[test]
    fn test_describe_vulnerable_overrides_defensive() {
        let mut state = EmotionalState::neutral(0);
        state.set_intensity(Dimension::Defensiveness, 0.9);
        state.open_vulnerability_window(0, 600);
        let desc = state.describe(10);
        assert!(desc.contains("guard is down"), "got: {}", desc);
        assert!(!desc.contains("deflects"), "got: {}", desc);
    }

    #[test]
    fn test_view_serializes() {
        let state = EmotionalState::neutral(7);
        let view = state.view(7);
        let json = serde_json::to_string(&view).unwrap();
        assert!(json.contains("loneliness"));
        assert!(json.contains("dominant"));
    }
}
