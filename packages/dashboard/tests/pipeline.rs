use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::{Value, json};
use swipe_map_dashboard::{
    AppState, Dashboard, DashboardConfig, DerivedState, DimensionExtent, MapTopology,
    RegionConfig, load::read_map, selectors,
};
use swipe_map_geography_models::{BoundingBox, Dimension, View, ZoomTarget};
use swipe_map_stats::Extent;
use swipe_map_swipes_models::{Station, SwipeRecord, Week};

fn week(month: u32, day: u32) -> Week {
    NaiveDate::from_ymd_opt(2020, month, day).unwrap()
}

fn station(unit: &str, borough: &str, long: f64, lat: f64) -> Station {
    Station {
        unit: unit.to_string(),
        name: format!("{unit} St"),
        borough: borough.to_string(),
        lat,
        long,
    }
}

fn map(acs_geometries: Value) -> MapTopology {
    let data = json!({
        "type": "Topology",
        "arcs": [
            [[1.0, 0.0], [1.0, 1.0]],
            [[1.0, 1.0], [0.0, 1.0], [0.0, 0.0], [1.0, 0.0]],
            [[1.0, 0.0], [2.0, 0.0], [2.0, 1.0], [1.0, 1.0]],
            [[5.0, 0.0], [6.0, 0.0], [6.0, 1.0], [5.0, 1.0], [5.0, 0.0]],
            [[0.5, 0.5], [1.5, 0.5]]
        ],
        "objects": {
            "mapOutline": {
                "type": "GeometryCollection",
                "geometries": [{ "type": "Polygon", "arcs": [[1, 2]] }]
            },
            "subway-lines": {
                "type": "GeometryCollection",
                "geometries": [{
                    "type": "LineString",
                    "arcs": [4],
                    "properties": { "rt_symbol": "L", "name": "L line" }
                }]
            },
            "acs_nta": { "type": "GeometryCollection", "geometries": acs_geometries }
        }
    });
    read_map(data.to_string().as_bytes()).unwrap()
}

/// SoHo and Brownsville side by side, plus a Staten Island NTA off to the
/// east.
fn city_map() -> MapTopology {
    map(json!([
        {
            "type": "Polygon",
            "arcs": [[0, 1]],
            "properties": {
                "NTACode": "MN24", "BoroCode": 1, "ed_health_pct": 20,
                "income_pc": "50000", "uninsured": 10, "snap_pct": 5, "white_pct": 60
            }
        },
        {
            "type": "Polygon",
            "arcs": [[2, -1]],
            "properties": {
                "NTACode": "BK81", "BoroCode": "3", "ed_health_pct": 30,
                "income_pc": 20000, "uninsured": 30, "snap_pct": 40, "white_pct": 10
            }
        },
        {
            "type": "Polygon",
            "arcs": [[3]],
            "properties": {
                "NTACode": "SI01", "BoroCode": 5, "ed_health_pct": 90,
                "income_pc": 90000, "uninsured": 99, "snap_pct": 99, "white_pct": 99
            }
        }
    ]))
}

fn stations() -> Vec<Station> {
    vec![
        station("R1", "Manhattan", 0.5, 0.5),
        station("R2", "Manhattan", 0.25, 0.75),
        station("R3", "Brooklyn", 1.5, 0.5),
        station("R4", "Staten Island", 5.5, 0.5),
        station("R5", "Brooklyn", 1.5, 0.25),
    ]
}

fn records() -> Vec<SwipeRecord> {
    vec![
        SwipeRecord::new("R1", NaiveDate::from_ymd_opt(2019, 12, 28).unwrap(), 500.0),
        SwipeRecord::new("R1", week(3, 7), -10.0),
        SwipeRecord::new("R1", week(3, 14), -30.0),
        SwipeRecord::new("R2", week(3, 7), -50.0),
        SwipeRecord::new("R2", week(3, 14), -70.0),
        SwipeRecord::new("R3", week(3, 7), -20.0),
        SwipeRecord::new("R4", week(3, 7), -80.0),
        SwipeRecord::new("R4", week(3, 14), -90.0),
    ]
}

fn city_state() -> AppState {
    AppState::new(DashboardConfig::default(), records(), stations(), city_map())
        .with_selected_week(Some(week(3, 7)))
}

fn soho() -> ZoomTarget {
    ZoomTarget::from("ZOOM_SOHO")
}

fn brownsville() -> ZoomTarget {
    ZoomTarget::from("ZOOM_BROWNSVILLE")
}

#[test]
fn derives_rollups_from_weeks_after_start() {
    let derived = Dashboard::new().recompute(&city_state()).unwrap();

    let r1 = &derived.station_rollup["R1"];
    assert_eq!(r1.timeline.len(), 2);
    assert_eq!(r1.summary.swipes_pct_chg, Some(-20.0));
    assert_eq!(derived.station_rollup["R3"].timeline.len(), 1);
    assert!(!derived.station_rollup.contains_key("R5"));
    assert_eq!(derived.overall_timeline.timeline.len(), 2);
}

#[test]
fn excludes_staten_island_from_nta_outputs() {
    let derived = Dashboard::new().recompute(&city_state()).unwrap();

    assert_eq!(derived.nta_features.len(), 2);
    assert_eq!(derived.nta_geometries.len(), 2);
    assert_eq!(
        derived.nta_properties.keys().collect::<Vec<_>>(),
        vec!["BK81", "MN24"]
    );
    assert_eq!(derived.mesh_interior.0.len(), 1);
    assert_eq!(derived.mesh_exterior.0.len(), 1);
    assert_eq!(derived.mesh_exterior.0[0].0.len(), 7);
    assert_eq!(derived.map_outline.len(), 1);
    assert_eq!(
        derived.subway_lines.features[0]
            .properties
            .as_ref()
            .unwrap()
            .route
            .as_deref(),
        Some("L")
    );
}

#[test]
fn computes_demographic_extents() {
    let derived = Dashboard::new().recompute(&city_state()).unwrap();
    let extents = &derived.demographic_extents;

    assert_eq!(
        extents[&Dimension::Borough],
        DimensionExtent::Categorical(vec![
            "Manhattan".to_string(),
            "Brooklyn".to_string(),
            "Staten Island".to_string()
        ])
    );
    assert_eq!(
        extents[&Dimension::EdHealthPct],
        DimensionExtent::Numeric(Extent::new(20.0, 30.0))
    );
    assert_eq!(
        extents[&Dimension::IncomePc],
        DimensionExtent::Numeric(Extent::new(0.0, 50000.0))
    );
    assert_eq!(
        extents[&Dimension::Uninsured],
        DimensionExtent::Numeric(Extent::new(0.0, 30.0))
    );
}

#[test]
fn weekly_and_summary_extents() {
    let derived = Dashboard::new().recompute(&city_state()).unwrap();

    assert_eq!(*derived.weekly_extent, Some(Extent::new(-80.0, -10.0)));
    assert_eq!(*derived.summary_extent, Some(Extent::new(-85.0, -20.0)));
    assert_eq!(
        (*derived.color_scale).map(|scale| scale.domain),
        Some(Extent::new(-85.0, -20.0))
    );
}

#[test]
fn weekly_extent_skips_stations_without_the_week() {
    let mut dashboard = Dashboard::new();
    let derived = dashboard
        .recompute(&city_state().with_selected_week(Some(week(3, 14))))
        .unwrap();
    assert_eq!(*derived.weekly_extent, Some(Extent::new(-90.0, -30.0)));

    let none = dashboard
        .recompute(&city_state().with_selected_week(None))
        .unwrap();
    assert_eq!(*none.weekly_extent, None);
}

#[test]
fn color_scale_is_stable_across_week_changes() {
    let mut dashboard = Dashboard::new();
    let state = city_state();
    let first = dashboard.recompute(&state).unwrap();
    let second = dashboard
        .recompute(&state.with_selected_week(Some(week(3, 14))))
        .unwrap();

    assert!(Arc::ptr_eq(&first.color_scale, &second.color_scale));
    assert!(Arc::ptr_eq(&first.summary_extent, &second.summary_extent));
    assert!(Arc::ptr_eq(&first.station_rollup, &second.station_rollup));
    assert_ne!(first.weekly_extent, second.weekly_extent);

    let ctx = dashboard.context();
    assert_eq!(ctx.stats(selectors::COLOR_SCALE.name()).misses, 1);
    assert_eq!(ctx.stats(selectors::WEEKLY_EXTENT.name()).misses, 2);
}

#[test]
fn identical_snapshot_reuses_every_output() {
    let mut dashboard = Dashboard::new();
    let state = city_state();
    let first = dashboard.recompute(&state).unwrap();
    let second = dashboard.recompute(&state.clone()).unwrap();

    assert!(Arc::ptr_eq(&first.nta_features, &second.nta_features));
    assert!(Arc::ptr_eq(&first.mesh_interior, &second.mesh_interior));
    assert!(Arc::ptr_eq(&first.selected_regions, &second.selected_regions));
    assert!(Arc::ptr_eq(&first.camera_target, &second.camera_target));
    assert_eq!(
        dashboard
            .context()
            .stats(selectors::FILTERED_SWIPE_DATA.name())
            .misses,
        1
    );
}

#[test]
fn new_swipe_data_recomputes_rollups_but_not_geography() {
    let mut dashboard = Dashboard::new();
    let state = city_state();
    let first = dashboard.recompute(&state).unwrap();

    let mut more = records();
    more.push(SwipeRecord::new("R5", week(3, 7), -5.0));
    let second = dashboard.recompute(&state.with_swipe_data(more)).unwrap();

    assert!(!Arc::ptr_eq(&first.station_rollup, &second.station_rollup));
    assert!(second.station_rollup.contains_key("R5"));
    assert!(Arc::ptr_eq(&first.nta_features, &second.nta_features));
    assert!(Arc::ptr_eq(&first.demographic_extents, &second.demographic_extents));
}

#[test]
fn selected_regions_carry_station_means() {
    let derived = Dashboard::new().recompute(&city_state()).unwrap();
    let regions = &derived.selected_regions;

    assert_eq!(regions.len(), 2);
    let soho = regions[0].as_ref().unwrap().properties.as_ref().unwrap();
    assert_eq!(soho.nta_code, "MN24");
    assert_eq!(soho.swipes_pct_chg, Some(-40.0));

    // R5 lies in BK81 but has no swipes, so only R3 counts
    let brownsville = regions[1].as_ref().unwrap().properties.as_ref().unwrap();
    assert_eq!(brownsville.swipes_pct_chg, Some(-20.0));

    assert_eq!(derived.nta_properties["MN24"].swipes_pct_chg, None);
}

#[test]
fn zoom_boxes_and_camera_targets() {
    let mut dashboard = Dashboard::new();
    let state = city_state();
    let overview = dashboard.recompute(&state).unwrap();

    assert_eq!(
        overview.zoom_boxes.get(&soho()),
        Some(&BoundingBox::new(0.0, 0.0, 1.0, 1.0))
    );
    assert_eq!(
        overview.zoom_boxes.get(&brownsville()),
        Some(&BoundingBox::new(1.0, 0.0, 2.0, 1.0))
    );
    assert_eq!(
        *overview.camera_target,
        Some(BoundingBox::new(0.0, 0.0, 2.0, 1.0))
    );

    let zoomed = dashboard
        .recompute(&state.with_view(View::Zoom(brownsville())))
        .unwrap();
    assert_eq!(
        *zoomed.camera_target,
        Some(BoundingBox::new(1.0, 0.0, 2.0, 1.0))
    );
    assert!(Arc::ptr_eq(&overview.zoom_boxes, &zoomed.zoom_boxes));

    let unknown = dashboard
        .recompute(&state.with_view(View::Zoom(ZoomTarget::from("ZOOM_NOWHERE"))))
        .unwrap();
    assert_eq!(*unknown.camera_target, None);
}

#[test]
fn missing_region_does_not_block_the_others() {
    let config = DashboardConfig {
        regions: vec![
            RegionConfig {
                code: "QN99".to_string(),
                name: None,
                zoom_target: ZoomTarget::from("ZOOM_NOWHERE"),
            },
            RegionConfig {
                code: "MN24".to_string(),
                name: None,
                zoom_target: soho(),
            },
        ],
        ..DashboardConfig::default()
    };
    let state = AppState::new(config, records(), stations(), city_map());
    let derived = Dashboard::new().recompute(&state).unwrap();

    assert!(derived.selected_regions[0].is_none());
    assert!(derived.selected_regions[1].is_some());
    assert_eq!(derived.zoom_boxes.len(), 1);
    assert!(derived.zoom_boxes.contains_key(&soho()));
}

#[test]
fn capped_extent_uses_the_99th_percentile() {
    let geometries: Vec<Value> = (1..=100)
        .map(|i| {
            json!({
                "type": null,
                "properties": { "NTACode": format!("QN{i:03}"), "BoroCode": 1, "uninsured": i }
            })
        })
        .collect();
    let state = AppState::new(
        DashboardConfig::default(),
        records(),
        stations(),
        map(Value::Array(geometries)),
    );
    let derived = Dashboard::new().recompute(&state).unwrap();

    assert_eq!(
        derived.demographic_extents[&Dimension::Uninsured],
        DimensionExtent::Numeric(Extent::new(0.0, 99.0))
    );
    assert!(!derived.demographic_extents.contains_key(&Dimension::SnapPct));
    assert_eq!(derived.nta_features.len(), 100);
    assert!(derived.selected_regions.iter().all(Option::is_none));
    assert!(derived.zoom_boxes.is_empty());
    assert_eq!(*derived.camera_target, None);
}

fn assert_geography_intact(derived: &DerivedState) {
    assert_eq!(derived.map_outline.len(), 1);
    assert_eq!(derived.subway_lines.len(), 1);
    assert_eq!(derived.nta_features.len(), 2);
    assert_eq!(derived.mesh_interior.0.len(), 1);
    assert_eq!(derived.mesh_exterior.0.len(), 1);
    assert!(derived.demographic_extents.contains_key(&Dimension::Uninsured));
    assert_eq!(derived.zoom_boxes.len(), 2);
    assert_eq!(
        *derived.camera_target,
        Some(BoundingBox::new(0.0, 0.0, 2.0, 1.0))
    );
}

#[test]
fn empty_swipes_leave_color_domain_empty_but_keep_geography() {
    let derived = Dashboard::new()
        .recompute(&city_state().with_swipe_data(Vec::new()))
        .unwrap();

    assert!(derived.station_rollup.is_empty());
    assert_eq!(*derived.weekly_extent, None);
    assert_eq!(*derived.summary_extent, None);
    assert!(derived.color_scale.is_none());
    assert_geography_intact(&derived);

    let soho = derived.selected_regions[0].as_ref().unwrap();
    assert_eq!(soho.properties.as_ref().unwrap().swipes_pct_chg, None);
}

#[test]
fn records_before_start_week_leave_color_domain_empty() {
    let early = vec![SwipeRecord::new(
        "R1",
        NaiveDate::from_ymd_opt(2019, 6, 1).unwrap(),
        -15.0,
    )];
    let derived = Dashboard::new()
        .recompute(&city_state().with_swipe_data(early))
        .unwrap();

    assert!(derived.overall_timeline.timeline.is_empty());
    assert!(derived.color_scale.is_none());
    assert_geography_intact(&derived);
}

#[test]
fn color_domain_appears_once_swipes_arrive() {
    let mut dashboard = Dashboard::new();
    let empty = city_state().with_swipe_data(Vec::new());
    let before = dashboard.recompute(&empty).unwrap();
    assert!(before.color_scale.is_none());

    let after = dashboard
        .recompute(&empty.with_swipe_data(records()))
        .unwrap();
    assert_eq!(*after.summary_extent, Some(Extent::new(-85.0, -20.0)));
    assert!(after.color_scale.is_some());
    assert!(Arc::ptr_eq(&before.nta_features, &after.nta_features));
    assert_eq!(
        dashboard
            .context()
            .stats(selectors::SUMMARY_EXTENT.name())
            .misses,
        2
    );
}
