//! The closed set of emotion dimensions.
//!
//! Each dimension is an independent axis with its own floor — emotions fade
//! but never go fully numb. Dimensions are a fixed enum rather than a map of
//! free-form names so that a typo in a persisted record or a config table is
//! a schema error, not a silently-new emotion.

use serde::{Deserialize, Serialize};

/// One named emotion axis.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Loneliness,
    Excitement,
    Frustration,
    Jealousy,
    Vulnerability,
    Confidence,
    Curiosity,
    Affection,
    Defensiveness,
}

/// All dimensions, in a stable order (used for iteration and display).
pub const ALL_DIMENSIONS: [Dimension; 9] = [
    Dimension::Loneliness,
    Dimension::Excitement,
    Dimension::Frustration,
    Dimension::Jealousy,
    Dimension::Vulnerability,
    Dimension::Confidence,
    Dimension::Curiosity,
    Dimension::Affection,
    Dimension::Defensiveness,
];

/// Intensity every dimension starts at on first boot.
pub const NEUTRAL_INTENSITY: f32 = 0.5;

impl Dimension {
    /// The snake_case name used in persisted records and config tables.
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Loneliness => "loneliness",
            Dimension::Excitement => "excitement",
            Dimension::Frustration => "frustration",
            Dimension::Jealousy => "jealousy",
            Dimension::Vulnerability => "vulnerability",
            Dimension::Confidence => "confidence",
            Dimension::Curiosity => "curiosity",
            Dimension::Affection => "affection",
            Dimension::Defensiveness => "defensiveness",
        }
    }

    /// Parse a dimension name. Returns `None` for anything outside the
    /// closed set — callers decide whether that is a schema error.
    pub fn parse_str(s: &str) -> Option<Self> {
        ALL_DIMENSIONS.iter().copied().find(|d| d.as_str() == s)
    }

    /// Minimum intensity this dimension can decay to. Loneliness keeps the
    /// highest floor: a companion left alone is never fully at peace with it.
    pub fn floor(&self) -> f32 {
        match self {
            Dimension::Loneliness => 0.3,
            Dimension::Affection => 0.15,
            Dimension::Curiosity => 0.15,
            _ => 0.1,
        }
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_all() {
        for d in ALL_DIMENSIONS {
            assert_eq!(Dimension::parse_str(d.as_str()), Some(d));
        }
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(Dimension::parse_str("serenity"), None);
        assert_eq!(Dimension::parse_str(""), None);
        assert_eq!(Dimension::parse_str("Loneliness"), None); // case-sensitive
    }

    #[test]
    fn test_floors_below_neutral() {
        for d in ALL_DIMENSIONS {
            assert!(d.floor() < NEUTRAL_INTENSITY, "{} floor too high", d);
            assert!(d.floor() > 0.0, "{} floor must be above zero", d);
        }
    }

    #[test]
    fn test_loneliness_floor_is_highest() {
        for d in ALL_DIMENSIONS {
            if d != Dimension::Loneliness {
                assert!(d.floor() <= Dimension::Loneliness.floor());
            }
        }
    }
}
