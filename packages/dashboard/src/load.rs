//! Loading an [`AppState`] from files on disk.

use std::io::Read;
use std::path::{Path, PathBuf};

use swipe_map_topology::TopologyError;
use thiserror::Error;

use crate::config::{ConfigError, DashboardConfig};
use crate::state::{AppState, MapTopology};

/// Errors that can occur while loading inputs.
#[derive(Debug, Error)]
pub enum LoadError {
    /// I/O failure reading an input file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The map file is not a valid topology.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Swipe or station CSV failed to load.
    #[error(transparent)]
    Swipes(#[from] swipe_map_swipes::load::LoadError),

    /// The topology parsed but failed validation.
    #[error(transparent)]
    Topology(#[from] TopologyError),

    /// The configuration failed to load.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Locations of the input files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPaths {
    /// Swipe records CSV.
    pub swipes: PathBuf,
    /// Station metadata CSV.
    pub stations: PathBuf,
    /// Map `TopoJSON`.
    pub map: PathBuf,
    /// Optional configuration TOML; the embedded default is used if absent.
    pub config: Option<PathBuf>,
}

/// Reads and validates a map topology.
///
/// # Errors
///
/// Returns [`LoadError`] if the JSON is malformed or an NTA geometry has no
/// properties.
pub fn read_map(reader: impl Read) -> Result<MapTopology, LoadError> {
    let map: MapTopology = serde_json::from_reader(reader)?;
    validate_map(&map)?;
    Ok(map)
}

/// Checks that every NTA geometry carries properties.
///
/// # Errors
///
/// Returns [`TopologyError::MissingProperties`] for the first geometry
/// without properties.
pub fn validate_map(map: &MapTopology) -> Result<(), TopologyError> {
    match map
        .objects
        .acs_nta
        .members()
        .iter()
        .position(|g| g.properties.is_none())
    {
        Some(index) => Err(TopologyError::MissingProperties {
            object: "acs_nta".to_string(),
            index,
        }),
        None => Ok(()),
    }
}

/// Loads a map topology from a file.
///
/// # Errors
///
/// See [`read_map`].
pub fn load_map(path: &Path) -> Result<MapTopology, LoadError> {
    let map = read_map(std::io::BufReader::new(std::fs::File::open(path)?))?;
    log::info!(
        "Loaded map with {} arcs and {} NTAs from {}",
        map.arcs.len(),
        map.objects.acs_nta.members().len(),
        path.display()
    );
    Ok(map)
}

/// Loads every input and builds the initial snapshot.
///
/// # Errors
///
/// Returns [`LoadError`] if any input fails to load.
pub fn load_state(paths: &InputPaths) -> Result<AppState, LoadError> {
    let config = match &paths.config {
        Some(path) => DashboardConfig::load(path)?,
        None => DashboardConfig::embedded(),
    };

    Ok(AppState::new(
        config,
        swipe_map_swipes::load::load_records(&paths.swipes)?,
        swipe_map_swipes::load::load_stations(&paths.stations)?,
        load_map(&paths.map)?,
    ))
}
