#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Numeric aggregation helpers used to bound display scales.
//!
//! Every function ignores non-finite values (`NaN`, infinities), so callers
//! can feed raw metric columns without pre-cleaning. Functions return `None`
//! when nothing finite is left to aggregate.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A closed `[min, max]` range over a numeric dimension.
///
/// Serializes as a two-element array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Extent {
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
}

impl Extent {
    /// Creates an extent from its bounds.
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Returns `max - min`.
    #[must_use]
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Returns `true` if `value` lies within the bounds (inclusive).
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

impl From<[f64; 2]> for Extent {
    fn from([min, max]: [f64; 2]) -> Self {
        Self { min, max }
    }
}

impl From<Extent> for [f64; 2] {
    fn from(extent: Extent) -> Self {
        [extent.min, extent.max]
    }
}

fn finite(values: impl IntoIterator<Item = f64>) -> impl Iterator<Item = f64> {
    values.into_iter().filter(|v| v.is_finite())
}

/// Smallest finite value.
#[must_use]
pub fn min(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    finite(values).reduce(f64::min)
}

/// Largest finite value.
#[must_use]
pub fn max(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    finite(values).reduce(f64::max)
}

/// `[min, max]` of the finite values.
#[must_use]
pub fn extent(values: impl IntoIterator<Item = f64>) -> Option<Extent> {
    finite(values).fold(None, |acc, v| match acc {
        None => Some(Extent::new(v, v)),
        Some(e) => Some(Extent::new(e.min.min(v), e.max.max(v))),
    })
}

/// Sum of the finite values.
#[must_use]
pub fn sum(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    finite(values).fold(None, |acc, v| Some(acc.unwrap_or(0.0) + v))
}

/// Arithmetic mean of the finite values.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (total, count) = finite(values).fold((0.0, 0_usize), |(t, n), v| (t + v, n + 1));
    (count > 0).then(|| total / count as f64)
}

/// The `p`-quantile of the finite values using the nearest-rank method.
///
/// The values are sorted ascending and the element at rank `ceil(p * n)`
/// (1-based, clamped to `[1, n]`) is returned, so the result is always one
/// of the inputs. `p` is clamped to `[0, 1]`; a `NaN` `p` yields `None`.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn quantile(values: impl IntoIterator<Item = f64>, p: f64) -> Option<f64> {
    if p.is_nan() {
        return None;
    }
    let mut sorted: Vec<f64> = finite(values).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    let rank = (p.clamp(0.0, 1.0) * n as f64).ceil() as usize;
    Some(sorted[rank.clamp(1, n) - 1])
}

/// `[0, max]` for magnitudes that must be anchored at zero.
#[must_use]
pub fn zero_to_max(values: impl IntoIterator<Item = f64>) -> Option<Extent> {
    max(values).map(|m| Extent::new(0.0, m))
}

/// `[0, p-quantile]`, capping outliers so they do not flatten the scale.
///
/// The upper bound never drops below zero.
#[must_use]
pub fn zero_to_quantile(values: impl IntoIterator<Item = f64>, p: f64) -> Option<Extent> {
    quantile(values, p).map(|q| Extent::new(0.0, q.max(0.0)))
}

/// `[min, p-quantile]` over the same values.
#[must_use]
pub fn min_to_quantile(values: impl IntoIterator<Item = f64>, p: f64) -> Option<Extent> {
    let values: Vec<f64> = finite(values).collect();
    Some(Extent::new(
        min(values.iter().copied())?,
        quantile(values, p)?,
    ))
}

/// Distinct values in first-seen order.
#[must_use]
pub fn unique<T: Ord + Clone>(values: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut seen = BTreeSet::new();
    values
        .into_iter()
        .filter(|v| seen.insert(v.clone()))
        .collect()
}
