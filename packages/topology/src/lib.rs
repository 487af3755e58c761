#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! TopoJSON decoding.
//!
//! A topology stores every shared boundary once, as an *arc*, and geometries
//! reference arcs by index (negative indices mean "this arc reversed",
//! encoded as the bitwise complement). This crate turns topology objects
//! into standard [`geo`] features ([`feature`]) and into meshes that keep
//! only the arcs selected by a predicate over the geometries on either side
//! of each arc ([`mesh`]), which is how shared interior borders are told
//! apart from the outer coastline.

mod export;
mod feature;
mod mesh;
mod types;

pub use export::mesh_geojson;
pub use feature::{Feature, FeatureCollection, feature};
pub use mesh::{exterior, interior, mesh, mesh_all};
pub use types::{ArcIndex, GeometryKind, Position, TopoGeometry, Topology, Transform};

use thiserror::Error;

/// Errors that can occur while decoding a topology.
#[derive(Debug, Error)]
pub enum TopologyError {
    /// A geometry referenced an arc the topology does not have.
    #[error("Arc index {index} out of range ({len} arcs)")]
    ArcOutOfRange {
        /// The referenced (possibly complemented) arc index.
        index: ArcIndex,
        /// Number of arcs in the topology.
        len: usize,
    },

    /// An arc has no positions.
    #[error("Arc {index} is empty")]
    EmptyArc {
        /// Arc index.
        index: usize,
    },

    /// A geometry object could not be interpreted.
    #[error("Invalid geometry: {message}")]
    InvalidGeometry {
        /// Description of what went wrong.
        message: String,
    },

    /// A geometry that must carry properties has none.
    #[error("Geometry {index} of object '{object}' has no properties")]
    MissingProperties {
        /// Topology object name.
        object: String,
        /// Position of the geometry within the object.
        index: usize,
    },

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
