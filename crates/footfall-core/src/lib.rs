//! footfall-core — streaming unique face/person counting.
//!
//! Receives descriptor vectors distilled from per-frame detections and
//! classifies each as new or duplicate against a session-scoped known set,
//! with an optional multi-frame stability gate in front of the count.

pub mod dedup;
pub mod descriptor;
pub mod extract;
pub mod gate;
pub mod types;

pub use dedup::{Classification, DedupConfig, DedupEngine, Outcome, StabilityConfig};
pub use descriptor::{Descriptor, Metric, MetricError};
pub use extract::{DescriptorExtractor, DescriptorMode, ExtractError};
pub use gate::{FrontalGate, GateConfig};
pub use types::{BoundingBox, Frame};
