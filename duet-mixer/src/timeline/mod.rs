//! Timeline assembly: conforming, smoothing, placement and normalization

pub mod conform;
pub mod mixer;
pub mod normalizer;
pub mod policy;
pub mod smoothing;

pub use conform::conform;
pub use mixer::{PlacementSettings, Timeline};
pub use normalizer::normalize;
pub use policy::{DurationPolicy, PlacementPolicy, TimelinePolicy};
