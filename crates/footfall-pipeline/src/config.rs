//! Session configuration, loaded from `FOOTFALL_*` environment variables.
//!
//! Every tuned constant from the counting variants lives here as a default:
//! the distance metric and duplicate threshold, the optional stability
//! window, the front-facing gate bounds, and the descriptor shape. The
//! attendance-style profile is `FOOTFALL_METRIC=euclidean` with
//! `FOOTFALL_DUPLICATE_THRESHOLD=0.1`; the debounced profile sets
//! `FOOTFALL_STABILITY=1`.

use footfall_core::{DedupConfig, DescriptorMode, GateConfig, Metric, StabilityConfig};

pub struct Config {
    /// Distance metric for dedup comparisons.
    pub metric: Metric,
    /// Distance below which two descriptors are the same entity.
    pub duplicate_threshold: f32,
    /// Multi-frame stability confirmation; off by default.
    pub stability: Option<StabilityConfig>,
    /// Front-facing gate bounds. `None` lets every detection qualify, for
    /// detectors that emit no landmarks (whole-person counting).
    pub gate: Option<GateConfig>,
    /// How detections are distilled into descriptors.
    pub descriptor: DescriptorMode,
    /// Capacity of the frame report channel.
    pub report_buffer: usize,
}

impl Config {
    /// Load configuration from `FOOTFALL_*` environment variables with
    /// defaults.
    pub fn from_env() -> Self {
        let stability = if env_bool("FOOTFALL_STABILITY", false) {
            Some(StabilityConfig {
                match_threshold: env_f32("FOOTFALL_STABILITY_THRESHOLD", 0.25),
                window: env_u32("FOOTFALL_STABILITY_WINDOW", 5),
            })
        } else {
            None
        };

        Self {
            metric: parse_metric(std::env::var("FOOTFALL_METRIC").ok().as_deref()),
            duplicate_threshold: env_f32("FOOTFALL_DUPLICATE_THRESHOLD", 0.5),
            stability,
            gate: env_bool("FOOTFALL_GATE", true).then(|| GateConfig {
                min_separation: env_f32("FOOTFALL_GATE_MIN_SEPARATION", 15.0),
                max_separation: env_f32("FOOTFALL_GATE_MAX_SEPARATION", 200.0),
                max_vertical_drift: env_f32("FOOTFALL_GATE_MAX_VERTICAL_DRIFT", 20.0),
                max_nose_drift: env_opt_f32("FOOTFALL_GATE_MAX_NOSE_DRIFT"),
            }),
            descriptor: parse_descriptor_mode(
                std::env::var("FOOTFALL_DESCRIPTOR").ok().as_deref(),
            ),
            report_buffer: env_usize("FOOTFALL_REPORT_BUFFER", 4),
        }
    }

    /// Engine configuration slice of this config.
    pub fn dedup(&self) -> DedupConfig {
        DedupConfig {
            metric: self.metric,
            duplicate_threshold: self.duplicate_threshold,
            stability: self.stability,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            metric: Metric::Cosine,
            duplicate_threshold: 0.5,
            stability: None,
            gate: Some(GateConfig::default()),
            descriptor: DescriptorMode::default(),
            report_buffer: 4,
        }
    }
}

fn parse_metric(value: Option<&str>) -> Metric {
    match value {
        Some("euclidean") => Metric::Euclidean,
        Some("cosine") | None => Metric::Cosine,
        Some("box-overlap") => Metric::BoxOverlap,
        Some(other) => {
            tracing::warn!(metric = other, "unknown metric, falling back to cosine");
            Metric::Cosine
        }
    }
}

fn parse_descriptor_mode(value: Option<&str>) -> DescriptorMode {
    match value {
        Some("box-center") => DescriptorMode::BoxCenter,
        Some("landmarks") => DescriptorMode::Landmarks {
            points: env_usize("FOOTFALL_LANDMARK_POINTS", 3),
        },
        Some("pixel-patch") | None => DescriptorMode::PixelPatch {
            side: env_usize("FOOTFALL_PATCH_SIDE", 128),
            length: env_usize("FOOTFALL_PATCH_LENGTH", 100),
        },
        Some("box-geometry") => DescriptorMode::BoxGeometry,
        Some(other) => {
            tracing::warn!(
                descriptor = other,
                "unknown descriptor mode, falling back to pixel-patch"
            );
            DescriptorMode::default()
        }
    }
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key).map(|v| v != "0").unwrap_or(default)
}

fn env_opt_f32(key: &str) -> Option<f32> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_metric() {
        assert_eq!(parse_metric(Some("euclidean")), Metric::Euclidean);
        assert_eq!(parse_metric(Some("cosine")), Metric::Cosine);
        assert_eq!(parse_metric(Some("box-overlap")), Metric::BoxOverlap);
        assert_eq!(parse_metric(None), Metric::Cosine);
        assert_eq!(parse_metric(Some("manhattan")), Metric::Cosine);
    }

    #[test]
    fn test_parse_descriptor_mode() {
        assert_eq!(
            parse_descriptor_mode(Some("box-center")),
            DescriptorMode::BoxCenter
        );
        assert_eq!(
            parse_descriptor_mode(Some("box-geometry")),
            DescriptorMode::BoxGeometry
        );
        assert_eq!(
            parse_descriptor_mode(None),
            DescriptorMode::PixelPatch {
                side: 128,
                length: 100
            }
        );
    }

    #[test]
    fn test_default_matches_direct_cosine_profile() {
        let config = Config::default();
        assert_eq!(config.metric, Metric::Cosine);
        assert_eq!(config.duplicate_threshold, 0.5);
        assert!(config.stability.is_none());
    }
}
