//! Subcommand implementations. Each prints its result to stdout.

use std::io::Write as _;
use std::sync::Arc;

use serde::Serialize;
use swipe_map_dashboard::{AppState, DerivedState};
use swipe_map_slider::{Slider, SliderProps};
use swipe_map_topology::mesh_geojson;

use crate::Layer;

/// Number of legend stops printed with the color scale.
const LEGEND_STOPS: usize = 5;

fn print_json(value: &impl Serialize) -> Result<(), Box<dyn std::error::Error>> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Prints the extents, color scale, zoom boxes and camera target.
pub fn summary(state: &AppState, derived: &DerivedState) -> Result<(), Box<dyn std::error::Error>> {
    let summary = serde_json::json!({
        "stations": derived.station_rollup.len(),
        "weeks": derived.overall_timeline.timeline.len(),
        "overall": derived.overall_timeline.summary,
        "selected_week": state.selected_week,
        "weekly_extent": *derived.weekly_extent,
        "summary_extent": *derived.summary_extent,
        "demographic_extents": *derived.demographic_extents,
        "color_scale": *derived.color_scale,
        "legend": (*derived.color_scale).map(|scale| scale.legend_stops(LEGEND_STOPS)),
        "zoom_boxes": *derived.zoom_boxes,
        "camera_target": *derived.camera_target,
    });
    print_json(&summary)
}

/// Prints one layer as `GeoJSON`.
pub fn export(layer: Layer, derived: &DerivedState) -> Result<(), Box<dyn std::error::Error>> {
    log::info!("Exporting {layer:?}");

    match layer {
        Layer::Outline => print_json(&derived.map_outline.to_geojson()?),
        Layer::Lines => print_json(&derived.subway_lines.to_geojson()?),
        Layer::Ntas => print_json(&derived.nta_features.to_geojson()?),
        Layer::MeshInterior => print_json(&mesh_geojson(&derived.mesh_interior)),
        Layer::MeshExterior => print_json(&mesh_geojson(&derived.mesh_exterior)),
        Layer::Regions => {
            let features = derived
                .selected_regions
                .iter()
                .flatten()
                .map(swipe_map_topology::Feature::to_geojson)
                .collect::<Result<Vec<_>, _>>()?;
            print_json(&geojson::FeatureCollection {
                bbox: None,
                features,
                foreign_members: None,
            })
        }
    }
}

/// Mounts the week slider over the overall timeline and prints its markup.
///
/// The slider starts at the selected week, or the last week if none is
/// selected. `set` is applied as a change event after mounting.
pub fn slider(
    state: &AppState,
    derived: &DerivedState,
    set: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let weeks: Vec<_> = derived.overall_timeline.timeline.keys().copied().collect();
    let initial_index = state
        .selected_week
        .and_then(|week| weeks.iter().position(|w| *w == week))
        .unwrap_or_else(|| weeks.len().saturating_sub(1));

    let mut container = String::new();
    let mut slider = Slider::mount(
        &mut container,
        SliderProps {
            values: weeks,
            initial_index,
            on_change: Box::new(|index| log::info!("Selected week index {index}")),
            name: "week".to_string(),
            description: Some("Week of <b>swipes</b>".to_string()),
            color_scale: (*derived.color_scale).map(Arc::new),
        },
    )?;

    if let Some(raw) = set {
        slider.handle_change(raw)?;
        log::info!("Selected week {}", slider.selected());
        slider.refresh(&mut container);
    }

    println!("{container}");
    Ok(())
}
