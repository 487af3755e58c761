#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Sequential color scales.
//!
//! A [`ColorScale`] maps a number inside its domain [`Extent`] to a color on
//! a named [`ColorRamp`]. Values are normalized to `t` in `[0, 1]` and the
//! ramp's stops are interpolated linearly in RGB space.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use swipe_map_stats::Extent;

/// An sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// Creates a color from its channels.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Creates a color from a `0xRRGGBB` literal.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn hex(value: u32) -> Self {
        Self {
            r: (value >> 16) as u8,
            g: (value >> 8) as u8,
            b: value as u8,
        }
    }

    /// Linear interpolation towards `other`; `f` is clamped to `[0, 1]`.
    #[must_use]
    pub fn lerp(self, other: Self, f: f64) -> Self {
        let f = f.clamp(0.0, 1.0);
        Self {
            r: channel(self.r, other.r, f),
            g: channel(self.g, other.g, f),
            b: channel(self.b, other.b, f),
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn channel(a: u8, b: u8, f: f64) -> u8 {
    let (a, b) = (f64::from(a), f64::from(b));
    (b - a).mul_add(f, a).round().clamp(0.0, 255.0) as u8
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Named sequential and diverging color ramps.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
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
pub enum ColorRamp {
    /// Red, yellow, green (diverging).
    #[default]
    RdYlGn,
    /// Red, white, blue (diverging).
    RdBu,
    /// Light to dark blue (sequential).
    Blues,
}

const RD_YL_GN: [Rgb; 11] = [
    Rgb::hex(0x00a5_0026),
    Rgb::hex(0x00d7_3027),
    Rgb::hex(0x00f4_6d43),
    Rgb::hex(0x00fd_ae61),
    Rgb::hex(0x00fe_e08b),
    Rgb::hex(0x00ff_ffbf),
    Rgb::hex(0x00d9_ef8b),
    Rgb::hex(0x00a6_d96a),
    Rgb::hex(0x0066_bd63),
    Rgb::hex(0x001a_9850),
    Rgb::hex(0x0000_6837),
];

const RD_BU: [Rgb; 11] = [
    Rgb::hex(0x0067_001f),
    Rgb::hex(0x00b2_182b),
    Rgb::hex(0x00d6_604d),
    Rgb::hex(0x00f4_a582),
    Rgb::hex(0x00fd_dbc7),
    Rgb::hex(0x00f7_f7f7),
    Rgb::hex(0x00d1_e5f0),
    Rgb::hex(0x0092_c5de),
    Rgb::hex(0x0043_93c3),
    Rgb::hex(0x0021_66ac),
    Rgb::hex(0x0005_3061),
];

const BLUES: [Rgb; 9] = [
    Rgb::hex(0x00f7_fbff),
    Rgb::hex(0x00de_ebf7),
    Rgb::hex(0x00c6_dbef),
    Rgb::hex(0x009e_cae1),
    Rgb::hex(0x006b_aed6),
    Rgb::hex(0x0042_92c6),
    Rgb::hex(0x0021_71b5),
    Rgb::hex(0x0008_519c),
    Rgb::hex(0x0008_306b),
];

impl ColorRamp {
    /// Evenly spaced color stops, low end first.
    #[must_use]
    pub const fn stops(self) -> &'static [Rgb] {
        match self {
            Self::RdYlGn => &RD_YL_GN,
            Self::RdBu => &RD_BU,
            Self::Blues => &BLUES,
        }
    }

    /// Color at `t` in `[0, 1]` (clamped).
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn at(self, t: f64) -> Rgb {
        let stops = self.stops();
        let segments = stops.len() - 1;
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let scaled = t * segments as f64;
        let i = (scaled.floor() as usize).min(segments - 1);
        stops[i].lerp(stops[i + 1], scaled - i as f64)
    }
}

/// A continuous scale from a numeric domain onto a color ramp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColorScale {
    /// Input domain `[d0, d1]`.
    pub domain: Extent,
    /// Output ramp.
    pub ramp: ColorRamp,
}

impl ColorScale {
    /// Creates a scale over `domain`.
    #[must_use]
    pub fn new(domain: Extent, ramp: ColorRamp) -> Self {
        log::debug!(
            "Building {ramp} color scale over [{}, {}]",
            domain.min,
            domain.max
        );
        Self { domain, ramp }
    }

    /// Position of `value` within the domain, clamped to `[0, 1]`. A
    /// degenerate domain maps everything to `0`.
    #[must_use]
    pub fn normalize(&self, value: f64) -> f64 {
        let span = self.domain.span();
        if span > 0.0 && span.is_finite() {
            ((value - self.domain.min) / span).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Color for `value`; `None` for non-finite values.
    #[must_use]
    pub fn color(&self, value: f64) -> Option<Rgb> {
        value
            .is_finite()
            .then(|| self.ramp.at(self.normalize(value)))
    }

    /// `n` evenly spaced `(value, color)` pairs from `d0` to `d1`, for
    /// drawing a legend.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn legend_stops(&self, n: usize) -> Vec<(f64, Rgb)> {
        match n {
            0 => Vec::new(),
            1 => vec![(self.domain.min, self.ramp.at(0.0))],
            _ => (0..n)
                .map(|i| {
                    let t = i as f64 / (n - 1) as f64;
                    let value = self.domain.span().mul_add(t, self.domain.min);
                    (value, self.ramp.at(t))
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator as _;

    #[test]
    fn hex_round_trips_through_display() {
        assert_eq!(Rgb::hex(0x00a5_0026).to_string(), "#a50026");
        assert_eq!(Rgb::new(0, 0, 0).to_string(), "#000000");
    }

    #[test]
    fn ramp_endpoints_are_first_and_last_stops() {
        for ramp in ColorRamp::iter() {
            let stops = ramp.stops();
            assert_eq!(ramp.at(0.0), stops[0]);
            assert_eq!(ramp.at(1.0), stops[stops.len() - 1]);
            assert_eq!(ramp.at(-3.0), stops[0]);
            assert_eq!(ramp.at(f64::NAN), stops[0]);
        }
    }

    #[test]
    fn midpoint_of_rd_yl_gn_is_the_middle_stop() {
        assert_eq!(ColorRamp::RdYlGn.at(0.5), Rgb::hex(0x00ff_ffbf));
    }

    #[test]
    fn interpolates_between_stops() {
        let mid = Rgb::new(0, 100, 200).lerp(Rgb::new(100, 100, 0), 0.5);
        assert_eq!(mid, Rgb::new(50, 100, 100));
    }

    #[test]
    fn scale_clamps_outside_domain() {
        let scale = ColorScale::new(Extent::new(-50.0, 50.0), ColorRamp::RdYlGn);

        assert!((scale.normalize(0.0) - 0.5).abs() < f64::EPSILON);
        assert_eq!(scale.color(-80.0), scale.color(-50.0));
        assert_eq!(scale.color(1e9), Some(Rgb::hex(0x0000_6837)));
        assert_eq!(scale.color(f64::NAN), None);
    }

    #[test]
    fn degenerate_domain_maps_to_start() {
        let scale = ColorScale::new(Extent::new(3.0, 3.0), ColorRamp::Blues);
        assert!(scale.normalize(10.0).abs() < f64::EPSILON);
        assert_eq!(scale.color(10.0), Some(Rgb::hex(0x00f7_fbff)));
    }

    #[test]
    fn legend_stops_span_the_domain() {
        let scale = ColorScale::new(Extent::new(0.0, 100.0), ColorRamp::RdBu);
        let stops = scale.legend_stops(5);

        let values: Vec<f64> = stops.iter().map(|(v, _)| *v).collect();
        assert_eq!(values, vec![0.0, 25.0, 50.0, 75.0, 100.0]);
        assert_eq!(stops[2].1, Rgb::hex(0x00f7_f7f7));
        assert!(scale.legend_stops(0).is_empty());
        assert_eq!(scale.legend_stops(1).len(), 1);
    }

    #[test]
    fn ramp_names_parse() {
        assert_eq!("rd_yl_gn".parse::<ColorRamp>().unwrap(), ColorRamp::RdYlGn);
        assert_eq!(ColorRamp::Blues.to_string(), "blues");
        assert_eq!(
            serde_json::to_value(Rgb::hex(0x0012_3456)).unwrap(),
            serde_json::json!("#123456")
        );
    }
}
