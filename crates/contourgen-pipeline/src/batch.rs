//! Batch processing across many contours.
//!
//! Each feature's transform is independent and reads only the shared,
//! immutable [`ReferenceNetwork`], so features are processed in parallel
//! with no locking. Results keep the input order, and a failure in one
//! feature never affects another.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::network::ReferenceNetwork;
use crate::types::{PipelineError, Polyline, SimplificationResult, SimplifyConfig};

/// Rayon when the `parallel` feature is enabled, plain iterators otherwise.
mod maybe_rayon {
    #[cfg(feature = "parallel")]
    pub use rayon::prelude::*;

    #[cfg(not(feature = "parallel"))]
    mod sequential {
        /// Sequential stand-in for `rayon::prelude::IntoParallelIterator`.
        ///
        /// Calls `into_iter()` instead of `into_par_iter()`, so the rest of
        /// the chain resolves to the standard `Iterator` methods.
        pub trait IntoParallelIterator {
            type Iter;
            type Item;
            fn into_par_iter(self) -> Self::Iter;
        }

        impl<I: IntoIterator> IntoParallelIterator for I {
            type Iter = I::IntoIter;
            type Item = I::Item;
            fn into_par_iter(self) -> Self::Iter {
                self.into_iter()
            }
        }
    }

    #[cfg(not(feature = "parallel"))]
    pub use sequential::*;
}

use maybe_rayon::*;

use crate::{StagedFeature, simplify_feature, simplify_feature_staged};

/// Generalize every line, in parallel when available.
///
/// Output element `i` belongs to `lines[i]`.
#[must_use = "returns one result per input line"]
pub fn simplify_batch(
    lines: &[Polyline],
    network: &ReferenceNetwork,
    config: &SimplifyConfig,
) -> Vec<Result<SimplificationResult, PipelineError>> {
    lines
        .into_par_iter()
        .map(|line| simplify_feature(line, network, config))
        .collect()
}

/// Like [`simplify_batch`] but keeps every intermediate, including the
/// constraint points each feature was pinned to.
#[must_use = "returns one result per input line"]
pub fn simplify_batch_staged(
    lines: &[Polyline],
    network: &ReferenceNetwork,
    config: &SimplifyConfig,
) -> Vec<Result<StagedFeature, PipelineError>> {
    lines
        .into_par_iter()
        .map(|line| simplify_feature_staged(line, network, config))
        .collect()
}

/// Like [`simplify_batch`], but stops starting new features once `cancel`
/// is set.
///
/// Features already in progress run to completion; features not yet
/// started are reported as `None`.
#[must_use = "returns one entry per input line"]
pub fn simplify_batch_cancellable(
    lines: &[Polyline],
    network: &ReferenceNetwork,
    config: &SimplifyConfig,
    cancel: &AtomicBool,
) -> Vec<Option<Result<SimplificationResult, PipelineError>>> {
    let results: Vec<_> = lines
        .into_par_iter()
        .map(|line| {
            if cancel.load(Ordering::Relaxed) {
                None
            } else {
                Some(simplify_feature(line, network, config))
            }
        })
        .collect();
    let abandoned = results.iter().filter(|r| r.is_none()).count();
    if abandoned > 0 {
        tracing::info!(abandoned, total = lines.len(), "batch cancelled");
    }
    results
}
