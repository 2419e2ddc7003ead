//! Time-based evolution of the emotional state.
//!
//! Every dimension relaxes toward its floor at a per-dimension hourly rate.
//! Two wrinkles keep it from being a plain exponential fade:
//!
//! - **Extreme inertia**: above a knee (default 0.8) the decay rate is
//!   multiplied down, so strong emotions linger.
//! - **Idle drift**: when nobody has interacted for a while, some dimensions
//!   drift on their own — loneliness creeps up, excitement bleeds off.
//!
//! The integration is closed-form over piecewise-constant velocities, so a
//! three-day offline gap costs the same as a three-second one. No tick loop.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dimension::{Dimension, ALL_DIMENSIONS};
use crate::error::ConfigError;
use crate::state::EmotionalState;

/// Per-dimension decay tuning. All rates are intensity per hour.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayProfile {
    /// How fast intensity relaxes toward the floor.
    pub base_rate: f32,
    /// Multiplier on `base_rate` above the extreme knee. Below 1.0 means
    /// strong emotions decay slower.
    pub extreme_inertia: f32,
    /// Signed drift applied only while idle. Positive pushes away from the
    /// floor, negative accelerates the fade.
    pub idle_drift: f32,
}

impl Default for DecayProfile {
    fn default() -> Self {
        Self {
            base_rate: 0.05,
            extreme_inertia: 0.5,
            idle_drift: 0.0,
        }
    }
}

impl DecayProfile {
    /// Tuned defaults. Attachment-flavored dimensions fade slowly; arousal
    /// ones burn off within hours.
    pub fn default_for(dim: Dimension) -> Self {
        match dim {
            Dimension::Loneliness => Self { base_rate: 0.03, extreme_inertia: 0.5, idle_drift: 0.05 },
            Dimension::Excitement => Self { base_rate: 0.08, extreme_inertia: 0.5, idle_drift: -0.04 },
            Dimension::Frustration => Self { base_rate: 0.06, extreme_inertia: 0.5, idle_drift: 0.0 },
            Dimension::Jealousy => Self { base_rate: 0.02, extreme_inertia: 0.5, idle_drift: 0.0 },
            Dimension::Vulnerability => Self { base_rate: 0.05, extreme_inertia: 0.5, idle_drift: 0.0 },
            Dimension::Confidence => Self { base_rate: 0.02, extreme_inertia: 0.6, idle_drift: 0.0 },
            Dimension::Curiosity => Self { base_rate: 0.04, extreme_inertia: 0.5, idle_drift: 0.02 },
            Dimension::Affection => Self { base_rate: 0.015, extreme_inertia: 0.4, idle_drift: 0.0 },
            Dimension::Defensiveness => Self { base_rate: 0.06, extreme_inertia: 0.5, idle_drift: 0.0 },
        }
    }

    fn sanitized(mut self) -> Self {
        self.base_rate = if self.base_rate.is_finite() { self.base_rate.max(0.0) } else { 0.05 };
        self.extreme_inertia = if self.extreme_inertia.is_finite() {
            self.extreme_inertia.clamp(0.0, 1.0)
        } else {
            0.5
        };
        self.idle_drift = if self.idle_drift.is_finite() {
            self.idle_drift.clamp(-1.0, 1.0)
        } else {
            0.0
        };
        self
    }
}

/// Raw decay section of the config file. Profile keys are dimension names;
/// unknown names are a schema error, missing ones fall back to defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayConfig {
    /// Intensity above which `extreme_inertia` kicks in.
    pub extreme_threshold: f32,
    /// Momentum shrinks by `exp(-rate * hours)`.
    pub momentum_decay_rate: f32,
    pub profiles: BTreeMap<String, DecayProfile>,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            extreme_threshold: 0.8,
            momentum_decay_rate: 1.0,
            profiles: ALL_DIMENSIONS
                .iter()
                .map(|d| (d.as_str().to_string(), DecayProfile::default_for(*d)))
                .collect(),
        }
    }
}

/// The decay computation, built from a validated [`DecayConfig`].
#[derive(Debug, Clone)]
pub struct DecayEngine {
    knee: f32,
    momentum_decay_rate: f32,
    profiles: BTreeMap<Dimension, DecayProfile>,
}

impl DecayEngine {
    pub fn from_config(cfg: &DecayConfig) -> Result<Self, ConfigError> {
        let mut profiles = BTreeMap::new();
        for (name, profile) in &cfg.profiles {
            let dim = Dimension::parse_str(name)
                .ok_or_else(|| ConfigError::UnknownDimension { name: name.clone() })?;
            profiles.insert(dim, profile.sanitized());
        }
        for dim in ALL_DIMENSIONS {
            if !profiles.contains_key(&dim) {
                tracing::warn!("no decay profile for {}, using defaults", dim);
                profiles.insert(dim, DecayProfile::default_for(dim));
            }
        }
        Ok(Self {
            knee: cfg.extreme_threshold.clamp(0.5, 1.0),
            momentum_decay_rate: cfg.momentum_decay_rate.max(0.0),
            profiles,
        })
    }

    pub fn profile(&self, dim: Dimension) -> &DecayProfile {
        // Constructor guarantees every dimension has an entry.
        &self.profiles[&dim]
    }

    /// Advance `state` by `elapsed_secs` of wall-clock time.
    ///
    /// `idle` means no interaction happened across the gap, which enables
    /// per-dimension idle drift. Non-positive elapsed time is a no-op —
    /// out-of-order timestamps must never corrupt the state.
    pub fn advance(&self, state: &mut EmotionalState, elapsed_secs: i64, idle: bool) {
        if elapsed_secs <= 0 {
            return;
        }
        let hours = elapsed_secs as f32 / 3600.0;
        let momentum_scale = (-self.momentum_decay_rate * hours).exp();

        for dim in ALL_DIMENSIONS {
            let p = self.profile(dim);
            let drift = if idle { p.idle_drift } else { 0.0 };
            let next = integrate(
                state.intensity(dim),
                dim.floor(),
                self.knee,
                p.base_rate,
                p.extreme_inertia,
                drift,
                hours,
            );
            state.set_intensity(dim, next);
            state.set_momentum(dim, state.momentum(dim) * momentum_scale);
        }
        state.last_updated += elapsed_secs;
    }
}

impl Default for DecayEngine {
    fn default() -> Self {
        // The default config only contains known dimension names.
        Self::from_config(&DecayConfig::default()).unwrap_or_else(|_| Self {
            knee: 0.8,
            momentum_decay_rate: 1.0,
            profiles: ALL_DIMENSIONS
                .iter()
                .map(|d| (*d, DecayProfile::default_for(*d)))
                .collect(),
        })
    }
}

/// Integrate one dimension's intensity over `hours`.
///
/// The velocity is piecewise constant in x: `drift - base` between the floor
/// and the knee, `drift - base * slow` above the knee, and the trajectory is
/// followed segment by segment. At most two region crossings exist, so this
/// is O(1) regardless of the gap length — and splitting an interval into N
/// pieces follows the exact same trajectory, which is what makes offline
/// catch-up equivalent to live decay.
fn integrate(
    x0: f32,
    floor: f32,
    knee: f32,
    base: f32,
    slow: f32,
    drift: f32,
    hours: f32,
) -> f32 {
    let v_lo = drift - base; // velocity between floor and knee
    let v_hi = drift - base * slow; // velocity above the knee (>= v_lo)
    let mut x = if x0.is_finite() { x0.clamp(floor, 1.0) } else { floor };
    let mut left = hours;

    for _ in 0..4 {
        if left <= 0.0 {
            break;
        }
        let (v, target) = if x > knee {
            (v_hi, if v_hi > 0.0 { 1.0 } else { knee })
        } else if x == knee {
            // Sitting exactly on the knee: upward motion happens in the
            // slowed region, downward in the fast one.
            if v_hi > 0.0 && v_lo >= 0.0 {
                (v_hi, 1.0)
            } else {
                (v_lo, floor)
            }
        } else if x > floor {
            (v_lo, if v_lo > 0.0 { knee } else { floor })
        } else {
            // At the floor the decay pull vanishes; drift can only lift the
            // intensity if it outruns the pull just above the floor.
            (v_lo, knee)
        };

        if v == 0.0 {
            break;
        }
        if v > 0.0 && x >= target {
            break;
        }
        if v < 0.0 && x <= target {
            break;
        }

        let span = (target - x) / v; // hours to the next boundary, > 0
        if span > left {
            x += v * left;
            break;
        }
        x = target;
        left -= span;
    }

    x.clamp(floor, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> DecayEngine {
        DecayEngine::default()
    }

    #[test]
    fn test_zero_elapsed_is_noop() {
        let e = engine();
        let state = EmotionalState::neutral(100);
        let mut after = state.clone();
        e.advance(&mut after, 0, false);
        assert_eq!(state, after);

        e.advance(&mut after, -3600, true);
        assert_eq!(state, after);
    }

    #[test]
    fn test_decay_moves_toward_floor() {
        let e = engine();
        let mut state = EmotionalState::neutral(0);
        e.advance(&mut state, 3600, false);

        for dim in ALL_DIMENSIONS {
            assert!(
                state.intensity(dim) < 0.5,
                "{} did not decay: {}",
                dim,
                state.intensity(dim)
            );
            assert!(state.intensity(dim) >= dim.floor());
        }
        assert_eq!(state.last_updated, 3600);
    }

    #[test]
    fn test_floor_convergence_and_idempotence() {
        let e = engine();
        let mut state = EmotionalState::neutral(0);
        // A month with no interactions and no idle drift.
        e.advance(&mut state, 30 * 24 * 3600, false);

        for dim in ALL_DIMENSIONS {
            assert!(
                (state.intensity(dim) - dim.floor()).abs() < 1e-4,
                "{} not at floor: {}",
                dim,
                state.intensity(dim)
            );
        }

        // Decaying further keeps it there.
        let settled = state.clone();
        e.advance(&mut state, 24 * 3600, false);
        for dim in ALL_DIMENSIONS {
            assert!((state.intensity(dim) - settled.intensity(dim)).abs() < 1e-5);
        }
    }

    #[test]
    fn test_extreme_inertia_slows_decay() {
        let e = engine();
        let p = e.profile(Dimension::Jealousy);

        let mut high = EmotionalState::neutral(0);
        high.set_intensity(Dimension::Jealousy, 0.95);
        e.advance(&mut high, 3600, false);
        let high_drop = 0.95 - high.intensity(Dimension::Jealousy);

        let mut mid = EmotionalState::neutral(0);
        mid.set_intensity(Dimension::Jealousy, 0.6);
        e.advance(&mut mid, 3600, false);
        let mid_drop = 0.6 - mid.intensity(Dimension::Jealousy);

        assert!(
            high_drop < mid_drop,
            "extreme decay ({}) should be slower than mid-range ({})",
            high_drop,
            mid_drop
        );
        assert!((high_drop - p.base_rate * p.extreme_inertia).abs() < 1e-4);
    }

    #[test]
    fn test_idle_drift_raises_loneliness() {
        let e = engine();
        let mut state = EmotionalState::neutral(0);
        e.advance(&mut state, 6 * 3600, true);
        assert!(
            state.intensity(Dimension::Loneliness) > 0.5,
            "loneliness should rise while idle: {}",
            state.intensity(Dimension::Loneliness)
        );
    }

    #[test]
    fn test_idle_drift_drains_excitement() {
        let e = engine();
        let mut active = EmotionalState::neutral(0);
        let mut idle = EmotionalState::neutral(0);
        e.advance(&mut active, 2 * 3600, false);
        e.advance(&mut idle, 2 * 3600, true);
        assert!(idle.intensity(Dimension::Excitement) < active.intensity(Dimension::Excitement));
    }

    #[test]
    fn test_idle_drift_parks_at_floor_when_weaker_than_decay() {
        // Curiosity drifts up at 0.02/h but decays at 0.04/h: the floor wins
        // and holds.
        let e = engine();
        let mut state = EmotionalState::neutral(0);
        e.advance(&mut state, 60 * 24 * 3600, true);
        assert!(
            (state.intensity(Dimension::Curiosity) - Dimension::Curiosity.floor()).abs() < 1e-4,
            "curiosity: {}",
            state.intensity(Dimension::Curiosity)
        );
    }

    #[test]
    fn test_split_equals_whole() {
        let e = engine();
        let total_secs: i64 = 36 * 3600;
        let n: i64 = 12;

        let mut whole = EmotionalState::neutral(0);
        whole.set_intensity(Dimension::Jealousy, 0.95); // crosses the knee mid-gap
        whole.set_momentum(Dimension::Jealousy, 0.6);
        let mut split = whole.clone();

        e.advance(&mut whole, total_secs, true);
        for _ in 0..n {
            e.advance(&mut split, total_secs / n, true);
        }

        for dim in ALL_DIMENSIONS {
            assert!(
                (whole.intensity(dim) - split.intensity(dim)).abs() < 1e-3,
                "{}: whole={} split={}",
                dim,
                whole.intensity(dim),
                split.intensity(dim)
            );
            assert!(
                (whole.momentum(dim) - split.momentum(dim)).abs() < 1e-3,
                "{} momentum: whole={} split={}",
                dim,
                whole.momentum(dim),
                split.momentum(dim)
            );
        }
        assert_eq!(whole.last_updated, split.last_updated);
    }

    #[test]
    fn test_momentum_decays_toward_zero() {
        let e = engine();
        let mut state = EmotionalState::neutral(0);
        state.set_momentum(Dimension::Excitement, 0.8);
        state.set_momentum(Dimension::Frustration, -0.8);

        e.advance(&mut state, 3600, false);
        let m = state.momentum(Dimension::Excitement);
        assert!(m > 0.0 && m < 0.8);
        let m = state.momentum(Dimension::Frustration);
        assert!(m < 0.0 && m > -0.8);

        // After a long gap momentum is effectively gone.
        e.advance(&mut state, 48 * 3600, false);
        assert!(state.momentum(Dimension::Excitement).abs() < 1e-6);
    }

    #[test]
    fn test_huge_gap_stays_bounded() {
        let e = engine();
        let mut state = EmotionalState::neutral(0);
        state.set_intensity(Dimension::Loneliness, 0.95);
        e.advance(&mut state, 365 * 24 * 3600, true);

        for dim in ALL_DIMENSIONS {
            let v = state.intensity(dim);
            assert!(v.is_finite() && (dim.floor()..=1.0).contains(&v), "{}: {}", dim, v);
        }
        // A year of idle drift saturates loneliness at the ceiling.
        assert!((state.intensity(Dimension::Loneliness) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_unknown_profile_name_rejected() {
        let mut cfg = DecayConfig::default();
        cfg.profiles.insert("nostalgia".to_string(), DecayProfile::default());
        let err = DecayEngine::from_config(&cfg).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownDimension { ref name } if name == "nostalgia"));
    }

    #[test]
    fn test_missing_profile_backfilled() {
        let mut cfg = DecayConfig::default();
        cfg.profiles.remove("jealousy");
        let e = DecayEngine::from_config(&cfg).unwrap();
        assert!(e.profile(Dimension::Jealousy).base_rate > 0.0);
    }
}
