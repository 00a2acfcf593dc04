//! Batch diagnostics: outcome counts, vertex reduction, Hausdorff
//! statistics, and wall-clock timing for one run over many contours.
//!
//! Timing goes through the [`Clock`] trait so this crate never touches a
//! platform clock itself; the binary supplies one backed by
//! `std::time::Instant`.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::StagedFeature;
use crate::batch::simplify_batch_staged;
use crate::network::ReferenceNetwork;
use crate::types::{FeatureStatus, PipelineError, Polyline, SimplificationResult, SimplifyConfig};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Source of wall-clock time for diagnostics.
pub trait Clock {
    /// Opaque timestamp type.
    type Instant;

    /// Current time.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Diagnostics collected from a single batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchDiagnostics {
    /// Number of input contours.
    pub feature_count: usize,
    /// Contours whose generalized line was accepted.
    pub simplified: usize,
    /// Contours kept as-is because the Hausdorff limit was exceeded.
    pub rejected: usize,
    /// Contours kept as-is because the generalized line collapsed.
    pub degenerate: usize,
    /// Contours that failed outright (e.g. fewer than 2 vertices).
    pub failed: usize,
    /// Hydrography crossings pinned across all contours.
    pub constraint_points: usize,
    /// Total vertices before generalization (successful features only).
    pub vertices_before: usize,
    /// Total vertices after generalization (successful features only).
    pub vertices_after: usize,
    /// Reduction ratio: `1.0 - (after / before)`.
    pub reduction_ratio: f64,
    /// Largest Hausdorff distance seen, including rejected candidates.
    pub max_hausdorff: f64,
    /// Mean Hausdorff distance over non-degenerate features.
    pub mean_hausdorff: f64,
    /// Total wall-clock duration of the batch (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
}

impl BatchDiagnostics {
    /// Summarize batch results, one item per input contour.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_results<'a>(
        results: impl IntoIterator<Item = Result<&'a SimplificationResult, &'a PipelineError>>,
        total_duration: Duration,
    ) -> Self {
        let mut diag = Self {
            feature_count: 0,
            simplified: 0,
            rejected: 0,
            degenerate: 0,
            failed: 0,
            constraint_points: 0,
            vertices_before: 0,
            vertices_after: 0,
            reduction_ratio: 0.0,
            max_hausdorff: 0.0,
            mean_hausdorff: 0.0,
            total_duration,
        };
        let mut hausdorff_sum = 0.0;
        let mut measured = 0usize;

        for result in results {
            diag.feature_count += 1;
            let Ok(r) = result else {
                diag.failed += 1;
                continue;
            };
            match r.status {
                FeatureStatus::Simplified => diag.simplified += 1,
                FeatureStatus::Rejected => diag.rejected += 1,
                FeatureStatus::Degenerate => diag.degenerate += 1,
            }
            diag.constraint_points += r.constraint_count;
            diag.vertices_before += r.vertices_before;
            diag.vertices_after += r.vertices_after;
            if r.status != FeatureStatus::Degenerate {
                diag.max_hausdorff = diag.max_hausdorff.max(r.hausdorff_distance);
                hausdorff_sum += r.hausdorff_distance;
                measured += 1;
            }
        }

        if diag.vertices_before > 0 {
            diag.reduction_ratio = 1.0 - diag.vertices_after as f64 / diag.vertices_before as f64;
        }
        if measured > 0 {
            diag.mean_hausdorff = hausdorff_sum / measured as f64;
        }
        diag
    }

    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Generalization Report\n{}", "=".repeat(60)));
        lines.push(format!("Contours: {}", self.feature_count));
        lines.push(format!(
            "Total duration: {:.3}ms",
            self.total_duration.as_secs_f64() * 1000.0,
        ));
        lines.push(String::new());

        lines.push(format!("{:<24} {:>10}", "Outcome", "Count"));
        lines.push("-".repeat(40));
        for (name, count) in [
            ("Simplified", self.simplified),
            ("Rejected (Hausdorff)", self.rejected),
            ("Degenerate", self.degenerate),
            ("Failed", self.failed),
        ] {
            lines.push(format!("{name:<24} {count:>10}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Vertices: {} -> {} ({:.1}% reduction)",
            self.vertices_before,
            self.vertices_after,
            self.reduction_ratio * 100.0,
        ));
        lines.push(format!("Hydrography crossings pinned: {}", self.constraint_points));
        lines.push(format!(
            "Hausdorff: max={:.3}  mean={:.3}",
            self.max_hausdorff, self.mean_hausdorff,
        ));

        lines.join("\n")
    }
}

/// Run [`simplify_batch_staged`] and collect diagnostics alongside the
/// staged results.
pub fn simplify_batch_with_diagnostics<C: Clock>(
    lines: &[Polyline],
    network: &ReferenceNetwork,
    config: &SimplifyConfig,
    clock: &C,
) -> (Vec<Result<StagedFeature, PipelineError>>, BatchDiagnostics) {
    let start = clock.now();
    let staged = simplify_batch_staged(lines, network, config);
    let diagnostics = BatchDiagnostics::from_results(
        staged.iter().map(|r| r.as_ref().map(|s| &s.result)),
        clock.elapsed(&start),
    );
    tracing::info!(
        features = diagnostics.feature_count,
        simplified = diagnostics.simplified,
        rejected = diagnostics.rejected,
        degenerate = diagnostics.degenerate,
        failed = diagnostics.failed,
        "batch complete",
    );
    (staged, diagnostics)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Point;

    /// Clock that always reports a fixed elapsed time.
    struct FixedClock(Duration);

    impl Clock for FixedClock {
        type Instant = ();

        fn now(&self) {}

        fn elapsed(&self, _since: &()) -> Duration {
            self.0
        }
    }

    fn summarize(
        results: &[Result<SimplificationResult, PipelineError>],
        total_duration: Duration,
    ) -> BatchDiagnostics {
        BatchDiagnostics::from_results(results.iter().map(Result::as_ref), total_duration)
    }

    fn result(status: FeatureStatus, before: usize, after: usize, distance: f64) -> SimplificationResult {
        SimplificationResult {
            geometry: Polyline::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)]),
            hausdorff_distance: distance,
            accepted: status == FeatureStatus::Simplified,
            status,
            vertices_before: before,
            vertices_after: after,
            constraint_count: 1,
        }
    }

    #[test]
    fn counts_each_outcome() {
        let results = vec![
            Ok(result(FeatureStatus::Simplified, 10, 4, 2.0)),
            Ok(result(FeatureStatus::Rejected, 6, 6, 12.0)),
            Ok(result(FeatureStatus::Degenerate, 4, 4, 0.0)),
            Err(PipelineError::DegenerateInput { vertex_count: 1 }),
        ];
        let diag = summarize(&results, Duration::from_millis(5));
        assert_eq!(diag.feature_count, 4);
        assert_eq!(diag.simplified, 1);
        assert_eq!(diag.rejected, 1);
        assert_eq!(diag.degenerate, 1);
        assert_eq!(diag.failed, 1);
        assert_eq!(diag.constraint_points, 3);
        assert_eq!(diag.vertices_before, 20);
        assert_eq!(diag.vertices_after, 14);
        assert!((diag.reduction_ratio - 0.3).abs() < 1e-12);
        assert!((diag.max_hausdorff - 12.0).abs() < f64::EPSILON);
        assert!((diag.mean_hausdorff - 7.0).abs() < 1e-12);
    }

    #[test]
    fn empty_batch_has_zero_ratios() {
        let diag = summarize(&[], Duration::ZERO);
        assert_eq!(diag.feature_count, 0);
        assert!(diag.reduction_ratio.abs() < f64::EPSILON);
        assert!(diag.mean_hausdorff.abs() < f64::EPSILON);
    }

    #[test]
    fn report_mentions_every_outcome() {
        let diag = summarize(
            &[Ok(result(FeatureStatus::Simplified, 10, 4, 2.0))],
            Duration::from_millis(3),
        );
        let report = diag.report();
        assert!(report.contains("Simplified"));
        assert!(report.contains("Rejected"));
        assert!(report.contains("Degenerate"));
        assert!(report.contains("60.0% reduction"));
    }

    #[test]
    fn diagnostics_serde_round_trip() {
        let diag = summarize(
            &[Ok(result(FeatureStatus::Rejected, 5, 5, 1.5))],
            Duration::from_millis(250),
        );
        let json = serde_json::to_string(&diag).unwrap();
        let deserialized: BatchDiagnostics = serde_json::from_str(&json).unwrap();
        assert_eq!(diag, deserialized);
    }

    #[test]
    fn with_diagnostics_uses_supplied_clock() {
        let lines = vec![Polyline::new(vec![
            Point::new(0.0, 0.0),
            Point::new(5.0, 0.1),
            Point::new(10.0, 0.0),
        ])];
        let network = ReferenceNetwork::new(&[]);
        let clock = FixedClock(Duration::from_millis(42));
        let (staged, diag) =
            simplify_batch_with_diagnostics(&lines, &network, &SimplifyConfig::default(), &clock);
        assert_eq!(staged.len(), 1);
        assert!(staged[0].as_ref().unwrap().constraints.is_empty());
        assert_eq!(diag.total_duration, Duration::from_millis(42));
        assert_eq!(diag.simplified, 1);
    }
}
