#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Derived-state pipeline for the swipe map dashboard.
//!
//! An [`AppState`] snapshot holds the raw inputs. [`Dashboard::recompute`]
//! runs every selector in [`selectors`] against it and returns the
//! view-ready [`DerivedState`]. The dashboard owns the selector cache, so
//! recomputing after changing one input (say, the selected week) only
//! reruns the selectors downstream of that input and hands back the very
//! same `Arc`s for everything else.

pub mod config;
pub mod load;
pub mod selectors;
pub mod state;

use std::collections::BTreeMap;
use std::sync::Arc;

use geo::MultiLineString;
use serde::Serialize;
use swipe_map_geography_models::{
    BoundingBox, Dimension, LineProperties, NtaProperties, OutlineProperties, ZoomTarget,
};
use swipe_map_scale::ColorScale;
use swipe_map_selector::SelectorContext;
use swipe_map_stats::Extent;
use swipe_map_swipes_models::{StationRollup, StationStats};
use swipe_map_topology::{Feature, FeatureCollection, TopoGeometry, TopologyError};
use thiserror::Error;

pub use config::{ConfigError, DashboardConfig, RegionConfig};
pub use state::{AppState, MapObjects, MapTopology};

/// Errors raised by pipeline combiners.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A topology object could not be decoded.
    #[error(transparent)]
    Topology(#[from] TopologyError),
}

/// Display extent of one dimension.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DimensionExtent {
    /// `[min, max]` of a numeric dimension.
    Numeric(Extent),
    /// Distinct values of a categorical dimension, in first-seen order.
    Categorical(Vec<String>),
}

/// Extents keyed by dimension. Numeric dimensions with no values are absent.
pub type DemographicExtents = BTreeMap<Dimension, DimensionExtent>;

/// Focus NTAs in configuration order; `None` where the NTA is missing.
pub type SelectedRegions = Vec<Option<Feature<NtaProperties>>>;

/// Zoom target to the bounding box it frames.
pub type ZoomBoxes = BTreeMap<ZoomTarget, BoundingBox>;

/// Everything the views consume, as shared selector outputs.
#[derive(Debug, Clone)]
pub struct DerivedState {
    /// Per-station stats.
    pub station_rollup: Arc<StationRollup>,
    /// All stations combined.
    pub overall_timeline: Arc<StationStats>,
    /// City outline.
    pub map_outline: Arc<FeatureCollection<OutlineProperties>>,
    /// Subway lines.
    pub subway_lines: Arc<FeatureCollection<LineProperties>>,
    /// Filtered NTA features.
    pub nta_features: Arc<FeatureCollection<NtaProperties>>,
    /// Borders between NTAs.
    pub mesh_interior: Arc<MultiLineString<f64>>,
    /// Outer border of the filtered NTAs.
    pub mesh_exterior: Arc<MultiLineString<f64>>,
    /// Filtered NTA geometries.
    pub nta_geometries: Arc<Vec<TopoGeometry<NtaProperties>>>,
    /// Demographic extents.
    pub demographic_extents: Arc<DemographicExtents>,
    /// Extent for the selected week.
    pub weekly_extent: Arc<Option<Extent>>,
    /// Extent of station summaries; `None` without any.
    pub summary_extent: Arc<Option<Extent>>,
    /// Color scale over [`Self::summary_extent`].
    pub color_scale: Arc<Option<ColorScale>>,
    /// NTA code to properties.
    pub nta_properties: Arc<BTreeMap<String, NtaProperties>>,
    /// Focus NTAs.
    pub selected_regions: Arc<SelectedRegions>,
    /// Focus NTA bounding boxes.
    pub zoom_boxes: Arc<ZoomBoxes>,
    /// What the camera should frame.
    pub camera_target: Arc<Option<BoundingBox>>,
}

/// Owns the selector cache and recomputes derived state on demand.
#[derive(Debug, Default)]
pub struct Dashboard {
    ctx: SelectorContext,
}

impl Dashboard {
    /// Creates a dashboard with an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives the view state for `state`, reusing cached outputs for every
    /// selector whose inputs are unchanged since the previous call.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if a combiner fails. Failed selectors are
    /// not cached, so the next call retries them.
    pub fn recompute(&mut self, state: &AppState) -> Result<DerivedState, PipelineError> {
        use selectors::{
            ACS_GEOMETRIES, CAMERA_TARGET, COLOR_SCALE, DEMOGRAPHIC_EXTENTS, LINES, MAP_OUTLINE,
            MESH_EXTERIOR, MESH_INTERIOR, NTA_FEATURES, NTA_PROPERTIES, OVERALL_TIMELINE,
            SELECTED_REGIONS, STATION_ROLLUP, SUMMARY_EXTENT, WEEKLY_EXTENT, ZOOM_BOXES,
        };

        let ctx = &mut self.ctx;
        let derived = DerivedState {
            station_rollup: STATION_ROLLUP.select(ctx, state)?,
            overall_timeline: OVERALL_TIMELINE.select(ctx, state)?,
            map_outline: MAP_OUTLINE.select(ctx, state)?,
            subway_lines: LINES.select(ctx, state)?,
            nta_features: NTA_FEATURES.select(ctx, state)?,
            mesh_interior: MESH_INTERIOR.select(ctx, state)?,
            mesh_exterior: MESH_EXTERIOR.select(ctx, state)?,
            nta_geometries: ACS_GEOMETRIES.select(ctx, state)?,
            demographic_extents: DEMOGRAPHIC_EXTENTS.select(ctx, state)?,
            weekly_extent: WEEKLY_EXTENT.select(ctx, state)?,
            summary_extent: SUMMARY_EXTENT.select(ctx, state)?,
            color_scale: COLOR_SCALE.select(ctx, state)?,
            nta_properties: NTA_PROPERTIES.select(ctx, state)?,
            selected_regions: SELECTED_REGIONS.select(ctx, state)?,
            zoom_boxes: ZOOM_BOXES.select(ctx, state)?,
            camera_target: CAMERA_TARGET.select(ctx, state)?,
        };

        log::debug!(
            "Recomputed derived state: {} stations, {} NTAs",
            derived.station_rollup.len(),
            derived.nta_features.len()
        );

        Ok(derived)
    }

    /// The selector cache, for inspecting hit and miss counts.
    #[must_use]
    pub const fn context(&self) -> &SelectorContext {
        &self.ctx
    }

    /// Drops every cached output.
    pub fn reset(&mut self) {
        self.ctx.clear();
    }
}
