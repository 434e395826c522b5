//! Timeline policy: how segment length is chosen and how placements combine

use serde::Deserialize;

/// Segment length policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DurationPolicy {
    /// Keep the resampled segment at its natural length; tail fade only
    Natural,
    /// Conform every segment to its caption window; fade both edges
    #[default]
    Fixed,
}

/// How a placement combines with what is already on the timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlacementPolicy {
    /// Incoming samples replace existing content
    Overwrite,
    /// Incoming samples are summed with existing content
    Additive,
    /// Leading window blends from existing to incoming, additive after
    #[default]
    Crossfade,
}

/// Combined duration and placement policy of one mixing engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(default)]
pub struct TimelinePolicy {
    pub duration: DurationPolicy,
    pub placement: PlacementPolicy,
}

impl TimelinePolicy {
    pub fn new(duration: DurationPolicy, placement: PlacementPolicy) -> Self {
        Self {
            duration,
            placement,
        }
    }

    /// Whether the head of each segment is faded in
    ///
    /// Natural-length segments only fade out at the tail.
    pub fn fades_head(&self) -> bool {
        self.duration == DurationPolicy::Fixed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_fixed_crossfade() {
        let policy = TimelinePolicy::default();
        assert_eq!(policy.duration, DurationPolicy::Fixed);
        assert_eq!(policy.placement, PlacementPolicy::Crossfade);
        assert!(policy.fades_head());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let policy: TimelinePolicy = toml::from_str(r#"placement = "overwrite""#).unwrap();
        assert_eq!(policy.duration, DurationPolicy::Fixed);
        assert_eq!(policy.placement, PlacementPolicy::Overwrite);
    }

    #[test]
    fn test_natural_skips_head_fade() {
        let policy = TimelinePolicy::new(DurationPolicy::Natural, PlacementPolicy::Additive);
        assert!(!policy.fades_head());
    }
}
