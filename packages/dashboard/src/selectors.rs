//! The selector graph.
//!
//! Each selector names its upstream inputs (raw [`AppState`] fields or other
//! selectors) and a pure combiner. Shared collections are passed as `Arc`s
//! so a selector recomputes only when an upstream allocation changes.

use std::collections::BTreeMap;
use std::sync::Arc;

use geo::MultiLineString;
use swipe_map_geography_models::{
    BoundingBox, Dimension, LineProperties, NtaProperties, OutlineProperties, View,
};
use swipe_map_scale::ColorScale;
use swipe_map_selector::{Selector, SelectorContext};
use swipe_map_spatial::{StationIndex, bounding_box, bounding_box_all};
use swipe_map_stats::{Extent, extent, min_to_quantile, unique, zero_to_max, zero_to_quantile};
use swipe_map_swipes::{filter_from, overall_timeline, rollup_by_station};
use swipe_map_swipes_models::{Station, StationRollup, StationStats, SwipeRecord, Week};
use swipe_map_topology::{FeatureCollection, TopoGeometry, exterior, feature, interior, mesh};

use crate::config::DashboardConfig;
use crate::state::{AppState, MapTopology};
use crate::{DemographicExtents, DimensionExtent, PipelineError, SelectedRegions, ZoomBoxes};

type AppSelector<I, O> = Selector<AppState, I, O, PipelineError>;

/// Swipe records on or after the configured start week.
pub const FILTERED_SWIPE_DATA: AppSelector<(Arc<Vec<SwipeRecord>>, Week), Vec<SwipeRecord>> =
    Selector::new(
        "filtered_swipe_data",
        |_, state| Ok((Arc::clone(&state.swipe_data), state.config.start_week)),
        |(records, start)| Ok(filter_from(records, *start)),
    );

/// Every station aggregated together.
pub const OVERALL_TIMELINE: AppSelector<Arc<Vec<SwipeRecord>>, StationStats> = Selector::new(
    "overall_timeline",
    |ctx, state| FILTERED_SWIPE_DATA.select(ctx, state),
    |records| Ok(overall_timeline(records)),
);

/// Per-station stats keyed by remote unit.
pub const STATION_ROLLUP: AppSelector<Arc<Vec<SwipeRecord>>, StationRollup> = Selector::new(
    "station_rollup",
    |ctx, state| FILTERED_SWIPE_DATA.select(ctx, state),
    |records| Ok(rollup_by_station(records)),
);

/// City outline features.
pub const MAP_OUTLINE: AppSelector<Arc<MapTopology>, FeatureCollection<OutlineProperties>> =
    Selector::new(
        "map_outline",
        |_, state| Ok(Arc::clone(&state.map_data)),
        |map| Ok(feature(map, &map.objects.map_outline)?),
    );

/// Subway line features.
pub const LINES: AppSelector<Arc<MapTopology>, FeatureCollection<LineProperties>> =
    Selector::new(
        "lines",
        |_, state| Ok(Arc::clone(&state.map_data)),
        |map| Ok(feature(map, &map.objects.subway_lines)?),
    );

/// The NTA object without geometries in the excluded borough. This is the
/// only upstream of every NTA-derived selector.
pub const FILTERED_ACS: AppSelector<(Arc<MapTopology>, u8), TopoGeometry<NtaProperties>> =
    Selector::new(
        "filtered_acs",
        |_, state| {
            Ok((
                Arc::clone(&state.map_data),
                state.config.excluded_boro_code,
            ))
        },
        |(map, excluded)| {
            Ok(map.objects.acs_nta.retain_members(|geometry| {
                geometry
                    .properties
                    .as_ref()
                    .is_some_and(|p| p.boro_code != *excluded)
            }))
        },
    );

/// The filtered NTA geometries.
pub const ACS_GEOMETRIES: AppSelector<
    Arc<TopoGeometry<NtaProperties>>,
    Vec<TopoGeometry<NtaProperties>>,
> = Selector::new(
    "acs_geometries",
    |ctx, state| FILTERED_ACS.select(ctx, state),
    |acs| Ok(acs.members().into_iter().cloned().collect()),
);

type FilteredMap = (Arc<MapTopology>, Arc<TopoGeometry<NtaProperties>>);

fn filtered_map(
    ctx: &mut SelectorContext,
    state: &AppState,
) -> Result<FilteredMap, PipelineError> {
    Ok((
        Arc::clone(&state.map_data),
        FILTERED_ACS.select(ctx, state)?,
    ))
}

/// Filtered NTA features.
pub const NTA_FEATURES: AppSelector<FilteredMap, FeatureCollection<NtaProperties>> =
    Selector::new("nta_features", filtered_map, |(map, acs)| {
        Ok(feature(map, acs)?)
    });

/// Borders shared by two NTAs.
pub const MESH_INTERIOR: AppSelector<FilteredMap, MultiLineString<f64>> =
    Selector::new("mesh_interior", filtered_map, |(map, acs)| {
        Ok(mesh(map, acs, interior)?)
    });

/// Borders of a single NTA (the outer edge of the filtered city).
pub const MESH_EXTERIOR: AppSelector<FilteredMap, MultiLineString<f64>> =
    Selector::new("mesh_exterior", filtered_map, |(map, acs)| {
        Ok(mesh(map, acs, exterior)?)
    });

/// Display extents per demographic dimension.
pub const DEMOGRAPHIC_EXTENTS: AppSelector<
    (
        Arc<Vec<Station>>,
        Arc<Vec<TopoGeometry<NtaProperties>>>,
        Arc<DashboardConfig>,
    ),
    DemographicExtents,
> = Selector::new(
    "demographic_extents",
    |ctx, state| {
        Ok((
            Arc::clone(&state.station_data),
            ACS_GEOMETRIES.select(ctx, state)?,
            Arc::clone(&state.config),
        ))
    },
    |(stations, acs, config)| Ok(demographic_extents(stations, acs, config.percentile_cap)),
);

fn demographic_extents(
    stations: &[Station],
    acs: &[TopoGeometry<NtaProperties>],
    cap: f64,
) -> DemographicExtents {
    let metric = move |dimension: Dimension| {
        acs.iter()
            .filter_map(move |g| g.properties.as_ref()?.metric(dimension))
    };

    let numeric = [
        (Dimension::EdHealthPct, extent(metric(Dimension::EdHealthPct))),
        (Dimension::IncomePc, zero_to_max(metric(Dimension::IncomePc))),
        (
            Dimension::Uninsured,
            zero_to_quantile(metric(Dimension::Uninsured), cap),
        ),
        (
            Dimension::SnapPct,
            zero_to_quantile(metric(Dimension::SnapPct), cap),
        ),
        (
            Dimension::WhitePct,
            zero_to_quantile(metric(Dimension::WhitePct), cap),
        ),
    ];

    let mut extents = BTreeMap::new();
    extents.insert(
        Dimension::Borough,
        DimensionExtent::Categorical(unique(stations.iter().map(|s| s.borough.clone()))),
    );
    for (dimension, value) in numeric {
        match value {
            Some(e) => {
                extents.insert(dimension, DimensionExtent::Numeric(e));
            }
            None => log::debug!("No values for {dimension}, leaving its extent out"),
        }
    }
    extents
}

/// Extent of station percent changes for the selected week. Stations that
/// did not report that week are left out.
pub const WEEKLY_EXTENT: AppSelector<(Option<Week>, Arc<StationRollup>), Option<Extent>> =
    Selector::new(
        "weekly_extent",
        |ctx, state| Ok((state.selected_week, STATION_ROLLUP.select(ctx, state)?)),
        |(week, rollup)| {
            Ok(week.and_then(|week| extent(rollup.values().filter_map(|s| s.pct_chg_for(week)))))
        },
    );

/// `[min, p-quantile]` of station summary percent changes. `None` when no
/// station has a summary, e.g. when every record predates the start week.
pub const SUMMARY_EXTENT: AppSelector<
    (Arc<StationRollup>, Arc<DashboardConfig>),
    Option<Extent>,
> = Selector::new(
    "summary_extent",
    |ctx, state| {
        Ok((
            STATION_ROLLUP.select(ctx, state)?,
            Arc::clone(&state.config),
        ))
    },
    |(rollup, config)| {
        let extent = min_to_quantile(
            rollup.values().filter_map(|s| s.summary.swipes_pct_chg),
            config.percentile_cap,
        );
        if extent.is_none() {
            log::warn!("No station summaries, leaving the color domain empty");
        }
        Ok(extent)
    },
);

/// Color scale over the summary extent. Independent of the selected week, so
/// colors stay stable while scrubbing through the timeline. `None` without a
/// summary extent.
pub const COLOR_SCALE: AppSelector<
    (Arc<Option<Extent>>, Arc<DashboardConfig>),
    Option<ColorScale>,
> = Selector::new(
    "color_scale",
    |ctx, state| {
        Ok((
            SUMMARY_EXTENT.select(ctx, state)?,
            Arc::clone(&state.config),
        ))
    },
    |(domain, config)| Ok((**domain).map(|domain| ColorScale::new(domain, config.color_ramp))),
);

/// NTA code to census properties.
pub const NTA_PROPERTIES: AppSelector<
    Arc<Vec<TopoGeometry<NtaProperties>>>,
    BTreeMap<String, NtaProperties>,
> = Selector::new(
    "nta_properties",
    |ctx, state| ACS_GEOMETRIES.select(ctx, state),
    |acs| {
        Ok(acs
            .iter()
            .filter_map(|g| g.properties.as_ref())
            .map(|p| (p.nta_code.clone(), p.clone()))
            .collect())
    },
);

/// R-tree over station locations.
pub const STATION_INDEX: AppSelector<Arc<Vec<Station>>, StationIndex> = Selector::new(
    "station_index",
    |_, state| Ok(Arc::clone(&state.station_data)),
    |stations| Ok(StationIndex::new(stations.iter())),
);

/// Configured focus NTAs, in configuration order, each with the mean
/// summary percent change of the stations inside it. `None` where the NTA is
/// not on the map.
pub const SELECTED_REGIONS: AppSelector<
    (
        Arc<StationIndex>,
        Arc<StationRollup>,
        Arc<FeatureCollection<NtaProperties>>,
        Arc<DashboardConfig>,
    ),
    SelectedRegions,
> = Selector::new(
    "selected_regions",
    |ctx, state| {
        Ok((
            STATION_INDEX.select(ctx, state)?,
            STATION_ROLLUP.select(ctx, state)?,
            NTA_FEATURES.select(ctx, state)?,
            Arc::clone(&state.config),
        ))
    },
    |(index, rollup, ntas, config)| {
        Ok(config
            .regions
            .iter()
            .map(|region| {
                let Some(nta) = ntas.find(|p| p.nta_code == region.code) else {
                    log::warn!("Region {} is not on the map", region.code);
                    return None;
                };
                let mean = nta.geometry.as_ref().and_then(|g| {
                    index.mean_within(g, |unit| rollup.get(unit)?.summary.swipes_pct_chg)
                });
                let mut selected = nta.clone();
                if let Some(properties) = selected.properties.as_mut() {
                    properties.swipes_pct_chg = mean;
                }
                Some(selected)
            })
            .collect())
    },
);

/// Bounding box of each present focus region, keyed by its zoom target.
pub const ZOOM_BOXES: AppSelector<(Arc<SelectedRegions>, Arc<DashboardConfig>), ZoomBoxes> =
    Selector::new(
        "zoom_boxes",
        |ctx, state| {
            Ok((
                SELECTED_REGIONS.select(ctx, state)?,
                Arc::clone(&state.config),
            ))
        },
        |(selected, config)| {
            Ok(config
                .regions
                .iter()
                .zip(selected.iter())
                .filter_map(|(region, nta)| {
                    let bbox = bounding_box(nta.as_ref()?.geometry.as_ref()?)?;
                    Some((region.zoom_target.clone(), bbox))
                })
                .collect())
        },
    );

/// Box the camera should frame for the current view.
pub const CAMERA_TARGET: AppSelector<
    (
        Arc<View>,
        Arc<FeatureCollection<NtaProperties>>,
        Arc<ZoomBoxes>,
    ),
    Option<BoundingBox>,
> = Selector::new(
    "camera_target",
    |ctx, state| {
        Ok((
            Arc::clone(&state.view),
            NTA_FEATURES.select(ctx, state)?,
            ZOOM_BOXES.select(ctx, state)?,
        ))
    },
    |(view, ntas, boxes)| {
        Ok(match &**view {
            View::Overview => {
                bounding_box_all(ntas.features.iter().filter_map(|f| f.geometry.as_ref()))
            }
            View::Zoom(target) => boxes.get(target).copied(),
        })
    },
);
