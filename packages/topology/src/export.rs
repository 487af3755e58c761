//! GeoJSON output for decoded features and meshes.

use geo::MultiLineString;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{Feature, FeatureCollection, TopologyError};

impl<P: Serialize> Feature<P> {
    /// Converts this feature into a GeoJSON feature.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError`] if the properties do not serialize to a
    /// JSON object.
    pub fn to_geojson(&self) -> Result<geojson::Feature, TopologyError> {
        Ok(geojson::Feature {
            bbox: None,
            geometry: self
                .geometry
                .as_ref()
                .map(|g| geojson::Geometry::new(geojson::Value::from(g))),
            id: self.id.as_ref().and_then(feature_id),
            properties: self.properties.as_ref().map(properties).transpose()?,
            foreign_members: None,
        })
    }
}

impl<P: Serialize> FeatureCollection<P> {
    /// Converts every feature into a GeoJSON feature collection.
    ///
    /// # Errors
    ///
    /// See [`Feature::to_geojson`].
    pub fn to_geojson(&self) -> Result<geojson::FeatureCollection, TopologyError> {
        Ok(geojson::FeatureCollection {
            bbox: None,
            features: self
                .features
                .iter()
                .map(Feature::to_geojson)
                .collect::<Result<_, _>>()?,
            foreign_members: None,
        })
    }
}

/// Converts a mesh into a GeoJSON `MultiLineString` geometry.
#[must_use]
pub fn mesh_geojson(mesh: &MultiLineString<f64>) -> geojson::Geometry {
    geojson::Geometry::new(geojson::Value::from(mesh))
}

fn feature_id(id: &Value) -> Option<geojson::feature::Id> {
    match id {
        Value::String(s) => Some(geojson::feature::Id::String(s.clone())),
        Value::Number(n) => Some(geojson::feature::Id::Number(n.clone())),
        _ => None,
    }
}

fn properties<P: Serialize>(properties: &P) -> Result<Map<String, Value>, TopologyError> {
    match serde_json::to_value(properties)? {
        Value::Object(map) => Ok(map),
        other => Err(TopologyError::InvalidGeometry {
            message: format!("properties must be an object, got {other}"),
        }),
    }
}
