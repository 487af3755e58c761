#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory spatial index for region attribution.
//!
//! Stations are indexed by `(long, lat)` in an R-tree. Region queries first
//! collect the stations inside the region's bounding rectangle, then keep
//! the ones strictly inside its polygon. Points exactly on a region
//! boundary are not inside.

use geo::{BoundingRect, Contains, Geometry, MultiPolygon, Point};
use rstar::{AABB, RTree, RTreeObject};
use swipe_map_geography_models::BoundingBox;
use swipe_map_swipes_models::Station;

/// A station point stored in the R-tree.
#[derive(Debug, Clone)]
struct StationEntry {
    unit: String,
    point: Point<f64>,
}

impl RTreeObject for StationEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.point.x(), self.point.y()])
    }
}

/// Pre-built R-tree over station locations.
#[derive(Debug)]
pub struct StationIndex {
    stations: RTree<StationEntry>,
}

impl StationIndex {
    /// Builds the index. Stations without finite coordinates are skipped.
    #[must_use]
    pub fn new<'a>(stations: impl IntoIterator<Item = &'a Station>) -> Self {
        let entries: Vec<StationEntry> = stations
            .into_iter()
            .filter(|s| s.long.is_finite() && s.lat.is_finite())
            .map(|s| StationEntry {
                unit: s.unit.clone(),
                point: Point::new(s.long, s.lat),
            })
            .collect();

        log::debug!("Indexed {} stations", entries.len());

        Self {
            stations: RTree::bulk_load(entries),
        }
    }

    /// Number of indexed stations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stations.size()
    }

    /// Returns `true` if no stations are indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stations.size() == 0
    }

    /// Units of the stations inside `region`, sorted.
    ///
    /// Non-polygonal geometries contain no stations.
    #[must_use]
    pub fn stations_within(&self, region: &Geometry<f64>) -> Vec<&str> {
        let Some(polygon) = polygonal(region) else {
            return Vec::new();
        };
        let Some(rect) = polygon.bounding_rect() else {
            return Vec::new();
        };
        let envelope =
            AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]);

        let mut units: Vec<&str> = self
            .stations
            .locate_in_envelope(&envelope)
            .filter(|entry| polygon.contains(&entry.point))
            .map(|entry| entry.unit.as_str())
            .collect();
        units.sort_unstable();
        units
    }

    /// Mean of `value` over the stations inside `region`. Stations for which
    /// `value` returns `None` are skipped; `None` if nothing is left.
    #[must_use]
    pub fn mean_within(
        &self,
        region: &Geometry<f64>,
        value: impl Fn(&str) -> Option<f64>,
    ) -> Option<f64> {
        swipe_map_stats::mean(
            self.stations_within(region)
                .into_iter()
                .filter_map(value),
        )
    }
}

/// Views a polygon or multipolygon as a [`MultiPolygon`].
fn polygonal(geometry: &Geometry<f64>) -> Option<MultiPolygon<f64>> {
    match geometry {
        Geometry::MultiPolygon(mp) => Some(mp.clone()),
        Geometry::Polygon(p) => Some(MultiPolygon(vec![p.clone()])),
        _ => None,
    }
}

/// Bounding box of a geometry; `None` for empty geometries.
#[must_use]
pub fn bounding_box(geometry: &Geometry<f64>) -> Option<BoundingBox> {
    geometry
        .bounding_rect()
        .map(|rect| BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y))
}

/// Smallest box covering every geometry; `None` if none has a box.
#[must_use]
pub fn bounding_box_all<'a>(
    geometries: impl IntoIterator<Item = &'a Geometry<f64>>,
) -> Option<BoundingBox> {
    geometries
        .into_iter()
        .filter_map(bounding_box)
        .reduce(|acc, b| acc.union(&b))
}
