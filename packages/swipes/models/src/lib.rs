#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Turnstile swipe record, station and rollup types.
//!
//! Raw weekly swipe observations are keyed by turnstile remote unit and
//! week. Aggregation turns them into a per-week [`Timeline`] plus a
//! [`Summary`] for each station (see [`StationStats`]).

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Calendar date identifying a reporting week.
pub type Week = NaiveDate;

/// Per-week metrics, ordered by week.
pub type Timeline = BTreeMap<Week, TimelineItem>;

/// Remote unit id -> aggregated stats for that station.
pub type StationRollup = BTreeMap<String, StationStats>;

/// One weekly observation for a single turnstile remote unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwipeRecord {
    /// Turnstile remote unit id (e.g. `"R001"`).
    #[serde(rename = "REMOTE")]
    pub remote: String,
    /// Week the observation belongs to.
    #[serde(rename = "WEEK")]
    pub week: Week,
    /// Swipes recorded this week.
    #[serde(default)]
    pub swipes: Option<f64>,
    /// Swipes recorded in the comparison week of the baseline year.
    #[serde(default)]
    pub swipes_baseline: Option<f64>,
    /// Percent change of `swipes` against `swipes_baseline`.
    #[serde(default)]
    pub swipes_pct_chg: Option<f64>,
}

impl SwipeRecord {
    /// Creates a record carrying only a percent change.
    #[must_use]
    pub fn new(remote: impl Into<String>, week: Week, swipes_pct_chg: f64) -> Self {
        Self {
            remote: remote.into(),
            week,
            swipes: None,
            swipes_baseline: None,
            swipes_pct_chg: Some(swipes_pct_chg),
        }
    }
}

/// Station metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    /// Turnstile remote unit id, matching [`SwipeRecord::remote`].
    pub unit: String,
    /// Station name.
    #[serde(alias = "station")]
    pub name: String,
    /// Borough the station is in.
    pub borough: String,
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub long: f64,
}

/// Metrics for a single week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineItem {
    /// Week these metrics belong to.
    pub date: Week,
    /// Total swipes, if any record reported them.
    pub swipes: Option<f64>,
    /// Total baseline swipes, if any record reported them.
    pub swipes_baseline: Option<f64>,
    /// Mean percent change across the week's records.
    pub swipes_pct_chg: Option<f64>,
    /// Number of records aggregated into this week.
    pub records: usize,
}

/// Metrics aggregated across every week of a timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Mean of the weekly percent changes.
    pub swipes_pct_chg: Option<f64>,
    /// Total swipes across all weeks.
    pub swipes: Option<f64>,
    /// Total baseline swipes across all weeks.
    pub swipes_baseline: Option<f64>,
    /// Number of weeks in the timeline.
    pub weeks: usize,
}

/// Summary plus per-week timeline for one station (or for all stations).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationStats {
    /// Aggregate across all weeks.
    pub summary: Summary,
    /// Week -> metrics.
    pub timeline: Timeline,
}

impl StationStats {
    /// Percent change for `week`, if the station reported that week.
    #[must_use]
    pub fn pct_chg_for(&self, week: Week) -> Option<f64> {
        self.timeline.get(&week).and_then(|item| item.swipes_pct_chg)
    }
}
