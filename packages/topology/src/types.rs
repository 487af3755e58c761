//! Serde model of a TopoJSON topology and arc decoding.

use geo::Coord;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::TopologyError;

/// Arc reference as stored in geometries. Negative values are the bitwise
/// complement of a reversed arc (`!0 == -1` is arc 0 reversed).
pub type ArcIndex = i64;

/// Quantization transform: `x = qx * scale[0] + translate[0]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Per-axis scale.
    pub scale: [f64; 2],
    /// Per-axis translation.
    pub translate: [f64; 2],
}

/// A position as stored in the topology. Extra dimensions are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "[f64; 2]")]
pub struct Position(pub [f64; 2]);

impl Position {
    /// First coordinate.
    #[must_use]
    pub const fn x(&self) -> f64 {
        self.0[0]
    }

    /// Second coordinate.
    #[must_use]
    pub const fn y(&self) -> f64 {
        self.0[1]
    }
}

impl TryFrom<Vec<f64>> for Position {
    type Error = String;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        match values.as_slice() {
            [x, y, ..] => Ok(Self([*x, *y])),
            _ => Err(format!(
                "position needs at least 2 coordinates, got {}",
                values.len()
            )),
        }
    }
}

impl From<Position> for [f64; 2] {
    fn from(p: Position) -> Self {
        p.0
    }
}

/// A topology with typed `objects`.
#[derive(Debug, Clone, Deserialize)]
pub struct Topology<O> {
    /// Optional bounding box of the whole topology.
    #[serde(default)]
    pub bbox: Option<Vec<f64>>,
    /// Quantization transform; absent for unquantized topologies.
    #[serde(default)]
    pub transform: Option<Transform>,
    /// Shared arcs. Delta-encoded when `transform` is present.
    pub arcs: Vec<Vec<Position>>,
    /// Named geometry objects.
    pub objects: O,
}

impl<O> Topology<O> {
    /// Resolves a possibly complemented arc reference to an index into
    /// [`Self::arcs`].
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::ArcOutOfRange`] if the arc does not exist.
    pub fn arc_slot(&self, index: ArcIndex) -> Result<usize, TopologyError> {
        let slot = if index < 0 { !index } else { index };
        usize::try_from(slot)
            .ok()
            .filter(|&slot| slot < self.arcs.len())
            .ok_or(TopologyError::ArcOutOfRange {
                index,
                len: self.arcs.len(),
            })
    }

    /// Raw (still quantized and delta-encoded) positions of an arc.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::ArcOutOfRange`] if the arc does not exist.
    pub fn raw_arc(&self, index: ArcIndex) -> Result<&[Position], TopologyError> {
        Ok(&self.arcs[self.arc_slot(index)?])
    }

    /// Decoded coordinates of an arc, reversed for negative references.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::ArcOutOfRange`] if the arc does not exist.
    pub fn arc(&self, index: ArcIndex) -> Result<Vec<Coord<f64>>, TopologyError> {
        let raw = self.raw_arc(index)?;
        let mut coords: Vec<Coord<f64>> = match self.transform {
            Some(t) => {
                let (mut x, mut y) = (0.0, 0.0);
                raw.iter()
                    .map(|p| {
                        x += p.x();
                        y += p.y();
                        Coord {
                            x: x.mul_add(t.scale[0], t.translate[0]),
                            y: y.mul_add(t.scale[1], t.translate[1]),
                        }
                    })
                    .collect()
            }
            None => raw.iter().map(|p| Coord { x: p.x(), y: p.y() }).collect(),
        };
        if index < 0 {
            coords.reverse();
        }
        Ok(coords)
    }

    /// Decodes a standalone position (points are quantized but never
    /// delta-encoded).
    #[must_use]
    pub fn point(&self, position: Position) -> Coord<f64> {
        match self.transform {
            Some(t) => Coord {
                x: position.x().mul_add(t.scale[0], t.translate[0]),
                y: position.y().mul_add(t.scale[1], t.translate[1]),
            },
            None => Coord {
                x: position.x(),
                y: position.y(),
            },
        }
    }

    /// Absolute quantized endpoints of an arc in reference direction, used to
    /// join arcs end to end.
    ///
    /// # Errors
    ///
    /// Returns an error if the arc does not exist or is empty.
    pub(crate) fn raw_ends(&self, index: ArcIndex) -> Result<([f64; 2], [f64; 2]), TopologyError> {
        let raw = self.raw_arc(index)?;
        let (first, last) = match (raw.first(), raw.last()) {
            (Some(first), Some(last)) => (first.0, last.0),
            _ => {
                return Err(TopologyError::EmptyArc {
                    index: self.arc_slot(index)?,
                });
            }
        };
        let end = if self.transform.is_some() {
            raw.iter()
                .fold([0.0, 0.0], |acc, p| [acc[0] + p.x(), acc[1] + p.y()])
        } else {
            last
        };
        Ok(if index < 0 { (end, first) } else { (first, end) })
    }
}

/// A geometry object inside a topology.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(
    try_from = "RawGeometry<P>",
    bound(deserialize = "P: Deserialize<'de>")
)]
pub struct TopoGeometry<P> {
    /// Shape and arc references.
    pub kind: GeometryKind<P>,
    /// Optional feature id.
    pub id: Option<Value>,
    /// Typed properties, if present.
    pub properties: Option<P>,
}

/// Shape of a [`TopoGeometry`].
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryKind<P> {
    /// A single quantized position.
    Point(Position),
    /// Several quantized positions.
    MultiPoint(Vec<Position>),
    /// A line made of consecutive arcs.
    LineString(Vec<ArcIndex>),
    /// Several lines.
    MultiLineString(Vec<Vec<ArcIndex>>),
    /// Rings (exterior first) made of arcs.
    Polygon(Vec<Vec<ArcIndex>>),
    /// Several polygons.
    MultiPolygon(Vec<Vec<Vec<ArcIndex>>>),
    /// Nested geometries.
    GeometryCollection(Vec<TopoGeometry<P>>),
    /// A geometry with `"type": null`.
    Null,
}

impl<P> TopoGeometry<P> {
    /// Member geometries if this is a collection, otherwise just `self`.
    #[must_use]
    pub fn members(&self) -> Vec<&Self> {
        match &self.kind {
            GeometryKind::GeometryCollection(members) => members.iter().collect(),
            _ => vec![self],
        }
    }

    /// Keeps only the collection members matching `keep`. Non-collection
    /// geometries are returned unchanged.
    #[must_use]
    pub fn retain_members(&self, mut keep: impl FnMut(&Self) -> bool) -> Self
    where
        P: Clone,
    {
        match &self.kind {
            GeometryKind::GeometryCollection(members) => Self {
                kind: GeometryKind::GeometryCollection(
                    members.iter().filter(|m| keep(m)).cloned().collect(),
                ),
                id: self.id.clone(),
                properties: self.properties.clone(),
            },
            _ => self.clone(),
        }
    }
}

/// Wire form of a geometry before validation.
#[derive(Deserialize)]
#[serde(bound(deserialize = "P: Deserialize<'de>"))]
struct RawGeometry<P> {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    arcs: Option<Value>,
    #[serde(default)]
    coordinates: Option<Value>,
    #[serde(default)]
    geometries: Option<Vec<TopoGeometry<P>>>,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    properties: Option<P>,
}

fn field<T: serde::de::DeserializeOwned>(
    value: Option<Value>,
    name: &str,
    kind: &str,
) -> Result<T, String> {
    let value = value.ok_or_else(|| format!("{kind} is missing '{name}'"))?;
    serde_json::from_value(value).map_err(|e| format!("{kind} has invalid '{name}': {e}"))
}

impl<P> TryFrom<RawGeometry<P>> for TopoGeometry<P> {
    type Error = String;

    fn try_from(raw: RawGeometry<P>) -> Result<Self, Self::Error> {
        let kind = match raw.kind.as_deref() {
            None => GeometryKind::Null,
            Some(kind @ "Point") => GeometryKind::Point(field(raw.coordinates, "coordinates", kind)?),
            Some(kind @ "MultiPoint") => {
                GeometryKind::MultiPoint(field(raw.coordinates, "coordinates", kind)?)
            }
            Some(kind @ "LineString") => GeometryKind::LineString(field(raw.arcs, "arcs", kind)?),
            Some(kind @ "MultiLineString") => {
                GeometryKind::MultiLineString(field(raw.arcs, "arcs", kind)?)
            }
            Some(kind @ "Polygon") => GeometryKind::Polygon(field(raw.arcs, "arcs", kind)?),
            Some(kind @ "MultiPolygon") => {
                GeometryKind::MultiPolygon(field(raw.arcs, "arcs", kind)?)
            }
            Some("GeometryCollection") => GeometryKind::GeometryCollection(
                raw.geometries
                    .ok_or("GeometryCollection is missing 'geometries'")?,
            ),
            Some(other) => return Err(format!("unknown geometry type '{other}'")),
        };

        Ok(Self {
            kind,
            id: raw.id,
            properties: raw.properties,
        })
    }
}
