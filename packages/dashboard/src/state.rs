//! The raw state snapshot selectors derive from.
//!
//! Every collection is behind an [`Arc`] so that cloning a snapshot to change
//! one field keeps the identity of the others, which is what selector
//! memoization compares.

use std::sync::Arc;

use serde::Deserialize;
use swipe_map_geography_models::{LineProperties, NtaProperties, OutlineProperties, View};
use swipe_map_swipes_models::{Station, SwipeRecord, Week};
use swipe_map_topology::{TopoGeometry, Topology};

use crate::config::DashboardConfig;

/// Named objects of the map topology.
#[derive(Debug, Clone, Deserialize)]
pub struct MapObjects {
    /// City outline.
    #[serde(rename = "mapOutline")]
    pub map_outline: TopoGeometry<OutlineProperties>,
    /// Subway line paths.
    #[serde(rename = "subway-lines")]
    pub subway_lines: TopoGeometry<LineProperties>,
    /// Neighborhood tabulation areas with census attributes.
    pub acs_nta: TopoGeometry<NtaProperties>,
}

/// The map topology.
pub type MapTopology = Topology<MapObjects>;

/// Immutable input snapshot.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Pipeline settings.
    pub config: Arc<DashboardConfig>,
    /// Raw weekly swipe records.
    pub swipe_data: Arc<Vec<SwipeRecord>>,
    /// Station metadata.
    pub station_data: Arc<Vec<Station>>,
    /// Map topology.
    pub map_data: Arc<MapTopology>,
    /// Requested camera framing.
    pub view: Arc<View>,
    /// Week highlighted on the map, if any.
    pub selected_week: Option<Week>,
}

impl AppState {
    /// Creates a snapshot showing the overview with no week selected.
    #[must_use]
    pub fn new(
        config: DashboardConfig,
        swipe_data: Vec<SwipeRecord>,
        station_data: Vec<Station>,
        map_data: MapTopology,
    ) -> Self {
        Self {
            config: Arc::new(config),
            swipe_data: Arc::new(swipe_data),
            station_data: Arc::new(station_data),
            map_data: Arc::new(map_data),
            view: Arc::new(View::Overview),
            selected_week: None,
        }
    }

    /// A copy of this snapshot with a different selected week.
    #[must_use]
    pub fn with_selected_week(&self, week: Option<Week>) -> Self {
        Self {
            selected_week: week,
            ..self.clone()
        }
    }

    /// A copy of this snapshot with a different view.
    #[must_use]
    pub fn with_view(&self, view: View) -> Self {
        Self {
            view: Arc::new(view),
            ..self.clone()
        }
    }

    /// A copy of this snapshot with new swipe records.
    #[must_use]
    pub fn with_swipe_data(&self, swipe_data: Vec<SwipeRecord>) -> Self {
        Self {
            swipe_data: Arc::new(swipe_data),
            ..self.clone()
        }
    }
}
