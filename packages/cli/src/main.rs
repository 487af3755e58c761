#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the swipe map pipeline.
//!
//! Loads the swipe, station and map files, runs the derived-state pipeline
//! once and prints one of its outputs: a JSON summary of the extents and
//! color scale, a map layer as `GeoJSON`, or the week slider markup.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use swipe_map_dashboard::Dashboard;
use swipe_map_dashboard::load::{InputPaths, load_state};
use swipe_map_geography_models::View;
use swipe_map_swipes_models::Week;

#[derive(Parser)]
#[command(name = "swipe_map", about = "Subway ridership map pipeline")]
struct Cli {
    /// Weekly swipe records CSV
    #[arg(long, default_value = "data/swipes.csv")]
    swipes: PathBuf,

    /// Station metadata CSV
    #[arg(long, default_value = "data/stations.csv")]
    stations: PathBuf,

    /// Map `TopoJSON`
    #[arg(long, default_value = "data/map.topojson")]
    map: PathBuf,

    /// Configuration TOML (defaults to the built-in configuration)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Week to highlight (YYYY-MM-DD)
    #[arg(long)]
    week: Option<Week>,

    /// Camera view: `overview` or a zoom target such as `ZOOM_SOHO`
    #[arg(long, default_value = "overview")]
    view: View,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print extents, color scale and camera framing as JSON
    Summary,
    /// Print one map layer as `GeoJSON`
    Export {
        /// Layer to export
        layer: Layer,
    },
    /// Print the week slider markup
    Slider {
        /// Raw input value to apply after mounting, as a change event would
        #[arg(long)]
        set: Option<String>,
    },
}

/// Map layers that can be exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Layer {
    /// City outline
    Outline,
    /// Subway lines
    Lines,
    /// Filtered NTA polygons
    Ntas,
    /// Borders shared by two NTAs
    MeshInterior,
    /// Outer border of the filtered NTAs
    MeshExterior,
    /// Configured focus NTAs with their station means
    Regions,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let paths = InputPaths {
        swipes: cli.swipes,
        stations: cli.stations,
        map: cli.map,
        config: cli.config,
    };
    let state = load_state(&paths)?
        .with_selected_week(cli.week)
        .with_view(cli.view);

    let mut dashboard = Dashboard::new();
    let derived = dashboard.recompute(&state)?;

    match cli.command {
        Commands::Summary => commands::summary(&state, &derived)?,
        Commands::Export { layer } => commands::export(layer, &derived)?,
        Commands::Slider { set } => commands::slider(&state, &derived, set.as_deref())?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_export_with_defaults() {
        let cli = Cli::try_parse_from(["swipe_map", "export", "mesh-interior"]).unwrap();

        assert_eq!(cli.swipes, PathBuf::from("data/swipes.csv"));
        assert_eq!(cli.view, View::Overview);
        assert!(cli.week.is_none());
        assert!(matches!(
            cli.command,
            Commands::Export {
                layer: Layer::MeshInterior
            }
        ));
    }

    #[test]
    fn parses_week_and_zoom_view() {
        let cli = Cli::try_parse_from([
            "swipe_map",
            "--week",
            "2020-03-07",
            "--view",
            "ZOOM_SOHO",
            "slider",
            "--set",
            "3",
        ])
        .unwrap();

        assert_eq!(cli.week, Week::from_ymd_opt(2020, 3, 7));
        assert_eq!(cli.view, "ZOOM_SOHO".parse().unwrap());
        assert!(matches!(cli.command, Commands::Slider { set: Some(ref s) } if s == "3"));
    }

    #[test]
    fn rejects_unknown_layer() {
        assert!(Cli::try_parse_from(["swipe_map", "export", "stations"]).is_err());
    }
}
