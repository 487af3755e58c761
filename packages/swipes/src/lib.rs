#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Filtering and aggregation of weekly turnstile swipes.
//!
//! Records are filtered to a start week, grouped by remote unit, and each
//! group is folded into a [`StationStats`]: a week-keyed timeline plus a
//! summary across all weeks. The same aggregation applied without grouping
//! yields the overall timeline for every station combined.

pub mod load;

use std::collections::BTreeMap;

use swipe_map_swipes_models::{
    StationRollup, StationStats, Summary, SwipeRecord, Timeline, TimelineItem, Week,
};

/// Records whose week is on or after `start`, in input order.
#[must_use]
pub fn filter_from(records: &[SwipeRecord], start: Week) -> Vec<SwipeRecord> {
    records
        .iter()
        .filter(|record| record.week >= start)
        .cloned()
        .collect()
}

/// Aggregates a group of records into a timeline and summary.
///
/// Each week's percent change is the mean over that week's records; the
/// summary percent change is the mean of the weekly values, so every week
/// weighs the same regardless of how many turnstiles reported.
#[must_use]
pub fn process_stations<'a>(records: impl IntoIterator<Item = &'a SwipeRecord>) -> StationStats {
    let mut by_week: BTreeMap<Week, Vec<&SwipeRecord>> = BTreeMap::new();
    for record in records {
        by_week.entry(record.week).or_default().push(record);
    }

    let timeline: Timeline = by_week
        .into_iter()
        .map(|(week, records)| {
            let item = TimelineItem {
                date: week,
                swipes: swipe_map_stats::sum(records.iter().filter_map(|r| r.swipes)),
                swipes_baseline: swipe_map_stats::sum(
                    records.iter().filter_map(|r| r.swipes_baseline),
                ),
                swipes_pct_chg: swipe_map_stats::mean(
                    records.iter().filter_map(|r| r.swipes_pct_chg),
                ),
                records: records.len(),
            };
            (week, item)
        })
        .collect();

    let summary = Summary {
        swipes_pct_chg: swipe_map_stats::mean(
            timeline.values().filter_map(|item| item.swipes_pct_chg),
        ),
        swipes: swipe_map_stats::sum(timeline.values().filter_map(|item| item.swipes)),
        swipes_baseline: swipe_map_stats::sum(
            timeline.values().filter_map(|item| item.swipes_baseline),
        ),
        weeks: timeline.len(),
    };

    StationStats { summary, timeline }
}

/// Groups records by remote unit and aggregates each group.
///
/// Only remotes with at least one record appear as keys.
#[must_use]
pub fn rollup_by_station(records: &[SwipeRecord]) -> StationRollup {
    let mut groups: BTreeMap<&str, Vec<&SwipeRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.remote.as_str()).or_default().push(record);
    }

    log::debug!(
        "Rolling up {} records across {} stations",
        records.len(),
        groups.len()
    );

    groups
        .into_iter()
        .map(|(remote, group)| (remote.to_string(), process_stations(group)))
        .collect()
}

/// Aggregates every record together, ignoring the station.
#[must_use]
pub fn overall_timeline(records: &[SwipeRecord]) -> StationStats {
    process_stations(records)
}
