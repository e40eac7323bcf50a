//! Streaming descriptor deduplication.
//!
//! The engine owns the session's append-only known set and, when stability
//! confirmation is enabled, the single in-flight candidate. All state is
//! touched from one logical per-frame loop, so the engine takes `&mut self`
//! and needs no interior locking.

use crate::descriptor::{Descriptor, Metric, MetricError};
use serde::{Deserialize, Serialize};

/// Verdict of a plain known-set scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    New,
    Duplicate,
}

/// What happened to one observed descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Appended and counted immediately (direct mode).
    New,
    /// Matched an entry already in the known set.
    Duplicate,
    /// Stability mode: candidate seen `seen` consecutive times, not yet
    /// confirmed.
    Tracking { seen: u32 },
    /// Stability mode: candidate survived the window and was counted.
    Confirmed,
}

/// Multi-frame confirmation: a candidate must match itself across
/// consecutive qualifying frames before it is counted, suppressing
/// frame-to-frame jitter from a live feed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StabilityConfig {
    /// Distance below which a detection extends the current candidate.
    pub match_threshold: f32,
    /// Consecutive sightings required before confirmation.
    pub window: u32,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            match_threshold: 0.25,
            window: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DedupConfig {
    pub metric: Metric,
    /// Distance below which two descriptors are the same entity.
    pub duplicate_threshold: f32,
    /// `None` counts new descriptors immediately.
    pub stability: Option<StabilityConfig>,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            metric: Metric::Cosine,
            duplicate_threshold: 0.5,
            stability: None,
        }
    }
}

#[derive(Debug, Clone)]
struct Candidate {
    descriptor: Descriptor,
    seen: u32,
}

/// Session-scoped dedup engine.
pub struct DedupEngine {
    config: DedupConfig,
    known: Vec<Descriptor>,
    candidate: Option<Candidate>,
}

impl DedupEngine {
    pub fn new(config: DedupConfig) -> Self {
        Self {
            config,
            known: Vec::new(),
            candidate: None,
        }
    }

    /// Scan the known set in insertion order; the first entry under the
    /// duplicate threshold wins. No closest-match search.
    pub fn classify(&self, descriptor: &Descriptor) -> Result<Classification, MetricError> {
        for entry in &self.known {
            if self.config.metric.distance(entry, descriptor)? < self.config.duplicate_threshold {
                return Ok(Classification::Duplicate);
            }
        }
        Ok(Classification::New)
    }

    /// Feed one qualifying detection's descriptor through the engine.
    ///
    /// Duplicates never touch the stability candidate. In stability mode a
    /// non-duplicate either extends the candidate, replaces it (last seen
    /// wins, no averaging), or starts it; the tracked reference descriptor
    /// is what gets appended on confirmation.
    pub fn observe(&mut self, descriptor: Descriptor) -> Result<Outcome, MetricError> {
        if self.classify(&descriptor)? == Classification::Duplicate {
            tracing::debug!("duplicate descriptor skipped");
            return Ok(Outcome::Duplicate);
        }

        let Some(stability) = self.config.stability else {
            self.known.push(descriptor);
            tracing::info!(total = self.known.len(), "new descriptor counted");
            return Ok(Outcome::New);
        };

        let extends = match &self.candidate {
            Some(cand) => {
                self.config.metric.distance(&cand.descriptor, &descriptor)?
                    < stability.match_threshold
            }
            None => false,
        };

        match self.candidate.take() {
            Some(mut cand) if extends => {
                cand.seen += 1;
                if cand.seen >= stability.window {
                    self.known.push(cand.descriptor);
                    tracing::info!(
                        seen = cand.seen,
                        total = self.known.len(),
                        "stable candidate confirmed"
                    );
                    Ok(Outcome::Confirmed)
                } else {
                    let seen = cand.seen;
                    self.candidate = Some(cand);
                    Ok(Outcome::Tracking { seen })
                }
            }
            _ => {
                self.candidate = Some(Candidate {
                    descriptor,
                    seen: 1,
                });
                Ok(Outcome::Tracking { seen: 1 })
            }
        }
    }

    /// Explicit no-detections-this-frame event. Discards the in-flight
    /// candidate; the known set is untouched.
    pub fn frame_cleared(&mut self) {
        if self.candidate.take().is_some() {
            tracing::debug!("stability candidate discarded");
        }
    }

    /// Confirmed descriptors, in insertion order. Read-only to callers.
    pub fn known(&self) -> &[Descriptor] {
        &self.known
    }

    /// Number of confirmed unique entities this session.
    pub fn confirmed_count(&self) -> usize {
        self.known.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(values: &[f32]) -> Descriptor {
        Descriptor::new(values.to_vec())
    }

    fn direct(metric: Metric, threshold: f32) -> DedupEngine {
        DedupEngine::new(DedupConfig {
            metric,
            duplicate_threshold: threshold,
            stability: None,
        })
    }

    fn stabilized() -> DedupEngine {
        DedupEngine::new(DedupConfig {
            metric: Metric::Cosine,
            duplicate_threshold: 0.5,
            stability: Some(StabilityConfig::default()),
        })
    }

    #[test]
    fn test_same_descriptor_new_then_duplicate() {
        let mut engine = direct(Metric::Cosine, 0.5);
        assert_eq!(engine.observe(d(&[1.0, 0.0, 0.0])).unwrap(), Outcome::New);
        assert_eq!(
            engine.observe(d(&[1.0, 0.0, 0.0])).unwrap(),
            Outcome::Duplicate
        );
        assert_eq!(engine.confirmed_count(), 1);
    }

    #[test]
    fn test_cosine_orthogonal_is_new() {
        // [1,0,0] then [0,1,0]: distance 1.0, well over the 0.5 threshold
        let mut engine = direct(Metric::Cosine, 0.5);
        engine.observe(d(&[1.0, 0.0, 0.0])).unwrap();
        assert_eq!(engine.observe(d(&[0.0, 1.0, 0.0])).unwrap(), Outcome::New);
        assert_eq!(engine.confirmed_count(), 2);
    }

    #[test]
    fn test_euclidean_threshold_scenarios() {
        let mut engine = direct(Metric::Euclidean, 0.5);
        engine.observe(d(&[0.0, 0.0])).unwrap();
        // distance ~0.424 -> duplicate
        assert_eq!(
            engine.observe(d(&[0.3, 0.3])).unwrap(),
            Outcome::Duplicate
        );
        // distance ~1.414 -> new
        assert_eq!(engine.observe(d(&[1.0, 1.0])).unwrap(), Outcome::New);
        assert_eq!(engine.known().len(), 2);
    }

    #[test]
    fn test_length_mismatch_propagates() {
        let mut engine = direct(Metric::Euclidean, 0.5);
        engine.observe(d(&[1.0, 2.0])).unwrap();
        let err = engine.observe(d(&[1.0, 2.0, 3.0])).unwrap_err();
        assert!(matches!(err, MetricError::InvalidDescriptor { .. }));
    }

    #[test]
    fn test_stability_confirms_after_window() {
        let mut engine = stabilized();
        let face = d(&[1.0, 0.0, 0.0]);

        for seen in 1..=4u32 {
            assert_eq!(
                engine.observe(face.clone()).unwrap(),
                Outcome::Tracking { seen }
            );
            assert_eq!(engine.confirmed_count(), 0);
        }
        // Fifth consecutive sighting promotes exactly once
        assert_eq!(engine.observe(face.clone()).unwrap(), Outcome::Confirmed);
        assert_eq!(engine.confirmed_count(), 1);

        // Now it is in the known set: further sightings are duplicates
        assert_eq!(engine.observe(face).unwrap(), Outcome::Duplicate);
        assert_eq!(engine.confirmed_count(), 1);
    }

    #[test]
    fn test_stability_reset_by_empty_frame() {
        let mut engine = stabilized();
        let face = d(&[1.0, 0.0, 0.0]);

        for _ in 0..4 {
            engine.observe(face.clone()).unwrap();
        }
        engine.frame_cleared();

        // Candidate was discarded: counting starts over
        assert_eq!(
            engine.observe(face).unwrap(),
            Outcome::Tracking { seen: 1 }
        );
        assert_eq!(engine.confirmed_count(), 0);
    }

    #[test]
    fn test_stability_mismatch_replaces_candidate() {
        let mut engine = stabilized();
        for _ in 0..3 {
            engine.observe(d(&[1.0, 0.0, 0.0])).unwrap();
        }
        // A different face takes over as the reference with a fresh count
        assert_eq!(
            engine.observe(d(&[0.0, 1.0, 0.0])).unwrap(),
            Outcome::Tracking { seen: 1 }
        );
    }

    #[test]
    fn test_duplicate_leaves_candidate_alone() {
        let mut engine = stabilized();
        let known_face = d(&[1.0, 0.0, 0.0]);
        for _ in 0..5 {
            engine.observe(known_face.clone()).unwrap();
        }
        assert_eq!(engine.confirmed_count(), 1);

        // Start tracking a second face
        let next_face = d(&[0.0, 1.0, 0.0]);
        engine.observe(next_face.clone()).unwrap();
        engine.observe(next_face.clone()).unwrap();

        // A duplicate sighting of the first face must not disturb tracking
        assert_eq!(engine.observe(known_face).unwrap(), Outcome::Duplicate);
        assert_eq!(
            engine.observe(next_face).unwrap(),
            Outcome::Tracking { seen: 3 }
        );
    }

    #[test]
    fn test_promotion_appends_reference_descriptor() {
        let mut engine = DedupEngine::new(DedupConfig {
            metric: Metric::Euclidean,
            duplicate_threshold: 0.5,
            stability: Some(StabilityConfig {
                match_threshold: 0.25,
                window: 2,
            }),
        });

        let reference = d(&[10.0, 10.0]);
        engine.observe(reference.clone()).unwrap();
        // Near-identical follow-up extends and promotes
        assert_eq!(
            engine.observe(d(&[10.1, 10.0])).unwrap(),
            Outcome::Confirmed
        );
        // The tracked reference is what landed in the known set
        assert_eq!(engine.known(), &[reference]);
    }

    #[test]
    fn test_classify_does_not_mutate() {
        let engine = stabilized();
        assert_eq!(
            engine.classify(&d(&[1.0, 0.0, 0.0])).unwrap(),
            Classification::New
        );
        assert_eq!(engine.confirmed_count(), 0);
    }
}
