#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Neighborhood, subway line and bounding box types.
//!
//! Properties attached to map geometries are typed here so that the
//! pipeline reads named fields instead of probing untyped property bags.
//! Census-derived numeric columns are frequently exported as strings, so
//! they accept either JSON numbers or numeric strings.

use serde::{Deserialize, Deserializer, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Numeric dimensions (and the one categorical dimension) the dashboard
/// computes display extents for.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Dimension {
    /// Station borough (categorical).
    Borough,
    /// Share of workers in education and health services.
    EdHealthPct,
    /// Per-capita income.
    IncomePc,
    /// Share of residents without health insurance.
    Uninsured,
    /// Share of households receiving SNAP benefits.
    SnapPct,
    /// Share of white residents.
    WhitePct,
    /// Percent change in weekly swipes.
    SwipesPctChg,
}

/// Properties of a neighborhood tabulation area (NTA) polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NtaProperties {
    /// NTA code (e.g. `"MN24"`).
    #[serde(rename = "NTACode")]
    pub nta_code: String,
    /// NTA name (e.g. `"SoHo-TriBeCa-Civic Center-Little Italy"`).
    #[serde(rename = "NTAName", default)]
    pub nta_name: Option<String>,
    /// Borough code (1 Manhattan, 2 Bronx, 3 Brooklyn, 4 Queens, 5 Staten Island).
    #[serde(rename = "BoroCode", deserialize_with = "de::code")]
    pub boro_code: u8,
    /// Borough name.
    #[serde(rename = "BoroName", default)]
    pub boro_name: Option<String>,
    /// Share of workers in education and health services.
    #[serde(default, deserialize_with = "de::metric")]
    pub ed_health_pct: Option<f64>,
    /// Per-capita income.
    #[serde(default, deserialize_with = "de::metric")]
    pub income_pc: Option<f64>,
    /// Share of residents without health insurance.
    #[serde(default, deserialize_with = "de::metric")]
    pub uninsured: Option<f64>,
    /// Share of households receiving SNAP benefits.
    #[serde(default, deserialize_with = "de::metric")]
    pub snap_pct: Option<f64>,
    /// Share of white residents.
    #[serde(default, deserialize_with = "de::metric")]
    pub white_pct: Option<f64>,
    /// Mean swipe percent change of the stations inside this NTA. Only set
    /// on selected regions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swipes_pct_chg: Option<f64>,
}

impl NtaProperties {
    /// Returns the numeric value for `dimension`, if this NTA carries it.
    #[must_use]
    pub const fn metric(&self, dimension: Dimension) -> Option<f64> {
        match dimension {
            Dimension::Borough => None,
            Dimension::EdHealthPct => self.ed_health_pct,
            Dimension::IncomePc => self.income_pc,
            Dimension::Uninsured => self.uninsured,
            Dimension::SnapPct => self.snap_pct,
            Dimension::WhitePct => self.white_pct,
            Dimension::SwipesPctChg => self.swipes_pct_chg,
        }
    }
}

/// Properties of a subway line geometry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineProperties {
    /// Route symbol (e.g. `"A"`, `"4"`).
    #[serde(default, alias = "rt_symbol")]
    pub route: Option<String>,
    /// Line name.
    #[serde(default)]
    pub name: Option<String>,
}

/// Properties of the city outline. Any source properties are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineProperties {}

/// Identifier of a named camera framing (e.g. `"ZOOM_SOHO"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoomTarget(pub String);

impl ZoomTarget {
    /// Returns the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ZoomTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ZoomTarget {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// What the map camera should frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    /// The whole (filtered) city.
    #[default]
    Overview,
    /// A configured focus neighborhood.
    Zoom(ZoomTarget),
}

impl std::str::FromStr for View {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s.eq_ignore_ascii_case("overview") {
            Self::Overview
        } else {
            Self::Zoom(ZoomTarget(s.to_string()))
        })
    }
}

/// Axis-aligned bounding box, serialized as `[min_x, min_y, max_x, max_y]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    /// Western edge (longitude).
    pub min_x: f64,
    /// Southern edge (latitude).
    pub min_y: f64,
    /// Eastern edge (longitude).
    pub max_x: f64,
    /// Northern edge (latitude).
    pub max_y: f64,
}

impl BoundingBox {
    /// Creates a bounding box from its edges.
    #[must_use]
    pub const fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Smallest box covering both `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Center point as `(x, y)`.
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Returns `true` if `(x, y)` lies inside or on the edge of the box.
    #[must_use]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_y..=self.max_y).contains(&y)
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from([min_x, min_y, max_x, max_y]: [f64; 4]) -> Self {
        Self::new(min_x, min_y, max_x, max_y)
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.min_x, b.min_y, b.max_x, b.max_y]
    }
}

mod de {
    use super::{Deserialize, Deserializer};
    use serde::de::Error as _;
    use serde_json::Value;

    pub fn metric<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(None),
            Value::Number(n) => Ok(n.as_f64()),
            Value::String(s) if s.trim().is_empty() => Ok(None),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("expected a number, got {s:?}"))),
            other => Err(D::Error::custom(format!("expected a number, got {other}"))),
        }
    }

    pub fn code<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Number(n) => n
                .as_u64()
                .and_then(|v| u8::try_from(v).ok())
                .ok_or_else(|| D::Error::custom(format!("invalid code {n}"))),
            Value::String(s) => s
                .trim()
                .parse::<u8>()
                .map_err(|_| D::Error::custom(format!("invalid code {s:?}"))),
            other => Err(D::Error::custom(format!("invalid code {other}"))),
        }
    }
}
