//! Conversion of topology objects into standard features.

use geo::{
    Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon,
    Point, Polygon,
};
use serde_json::Value;

use crate::{ArcIndex, GeometryKind, TopoGeometry, Topology, TopologyError};

/// A decoded geometry with its properties.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature<P> {
    /// Feature id carried over from the topology.
    pub id: Option<Value>,
    /// Typed properties.
    pub properties: Option<P>,
    /// Decoded geometry; `None` for null geometries.
    pub geometry: Option<Geometry<f64>>,
}

/// An ordered list of features.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureCollection<P> {
    /// Features in object order.
    pub features: Vec<Feature<P>>,
}

impl<P> FeatureCollection<P> {
    /// Returns the first feature whose properties match `predicate`.
    pub fn find(&self, mut predicate: impl FnMut(&P) -> bool) -> Option<&Feature<P>> {
        self.features
            .iter()
            .find(|f| f.properties.as_ref().is_some_and(&mut predicate))
    }

    /// Number of features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Returns `true` if there are no features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Converts a topology object into features: one per member of a
/// `GeometryCollection`, or a single feature for any other geometry.
///
/// # Errors
///
/// Returns [`TopologyError`] if a geometry references a missing arc.
pub fn feature<O, P: Clone>(
    topology: &Topology<O>,
    object: &TopoGeometry<P>,
) -> Result<FeatureCollection<P>, TopologyError> {
    let features = object
        .members()
        .into_iter()
        .map(|member| {
            Ok(Feature {
                id: member.id.clone(),
                properties: member.properties.clone(),
                geometry: geometry(topology, member)?,
            })
        })
        .collect::<Result<Vec<_>, TopologyError>>()?;

    log::trace!("Decoded {} features", features.len());

    Ok(FeatureCollection { features })
}

/// Decodes a single geometry.
///
/// # Errors
///
/// Returns [`TopologyError`] if the geometry references a missing arc.
pub(crate) fn geometry<O, P>(
    topology: &Topology<O>,
    object: &TopoGeometry<P>,
) -> Result<Option<Geometry<f64>>, TopologyError> {
    let geometry = match &object.kind {
        GeometryKind::Null => return Ok(None),
        GeometryKind::Point(p) => Geometry::Point(Point(topology.point(*p))),
        GeometryKind::MultiPoint(points) => Geometry::MultiPoint(MultiPoint(
            points.iter().map(|p| Point(topology.point(*p))).collect(),
        )),
        GeometryKind::LineString(arcs) => Geometry::LineString(line(topology, arcs)?),
        GeometryKind::MultiLineString(lines) => Geometry::MultiLineString(MultiLineString(
            lines
                .iter()
                .map(|arcs| line(topology, arcs))
                .collect::<Result<_, _>>()?,
        )),
        GeometryKind::Polygon(rings) => Geometry::Polygon(polygon(topology, rings)?),
        GeometryKind::MultiPolygon(polygons) => Geometry::MultiPolygon(MultiPolygon(
            polygons
                .iter()
                .map(|rings| polygon(topology, rings))
                .collect::<Result<_, _>>()?,
        )),
        GeometryKind::GeometryCollection(members) => {
            Geometry::GeometryCollection(GeometryCollection(
                members
                    .iter()
                    .filter_map(|m| geometry(topology, m).transpose())
                    .collect::<Result<_, _>>()?,
            ))
        }
    };
    Ok(Some(geometry))
}

/// Joins consecutive arcs into one line, dropping the point each arc
/// shares with the previous one. Lines are padded to at least 2 points.
pub(crate) fn line<O>(
    topology: &Topology<O>,
    arcs: &[ArcIndex],
) -> Result<LineString<f64>, TopologyError> {
    let mut points: Vec<Coord<f64>> = Vec::new();
    for &index in arcs {
        let coords = topology.arc(index)?;
        points.pop();
        points.extend(coords);
    }
    if points.len() == 1 {
        points.push(points[0]);
    }
    Ok(LineString(points))
}

/// Like [`line`], padded to at least 4 points so the ring is valid.
fn ring<O>(topology: &Topology<O>, arcs: &[ArcIndex]) -> Result<LineString<f64>, TopologyError> {
    let LineString(mut points) = line(topology, arcs)?;
    if let Some(&first) = points.first() {
        while points.len() < 4 {
            points.push(first);
        }
    }
    Ok(LineString(points))
}

fn polygon<O>(
    topology: &Topology<O>,
    rings: &[Vec<ArcIndex>],
) -> Result<Polygon<f64>, TopologyError> {
    let mut rings = rings
        .iter()
        .map(|arcs| ring(topology, arcs))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter();
    let exterior = rings.next().unwrap_or_else(|| LineString(Vec::new()));
    Ok(Polygon::new(exterior, rings.collect()))
}
