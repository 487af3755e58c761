#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Headless slider control.
//!
//! A [`Slider`] models a range input over an ordered list of labeled values
//! (typically timeline weeks). Mounting appends its markup to a
//! [`Container`]; user input arrives as raw text through
//! [`Slider::handle_change`], which parses it and reports the new index to
//! the `on_change` callback. [`Slider::update`] repositions the control
//! without calling back.
//!
//! Both only change the slider's state. [`Slider::refresh`] swaps the
//! markup emitted at mount for a fresh render, so the container shows the
//! new position.

use std::sync::Arc;

use chrono::NaiveDate;
use swipe_map_scale::ColorScale;
use swipe_map_swipes_models::TimelineItem;
use thiserror::Error;

/// Number of color stops rendered in the track gradient.
const TRACK_STOPS: usize = 5;

/// Errors produced by the slider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SliderError {
    /// The slider was given no values to select from.
    #[error("Slider has no values")]
    NoValues,

    /// The initial index does not address a value.
    #[error("Initial index {index} out of range ({len} values)")]
    InitialIndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of values.
        len: usize,
    },

    /// Input text is not a whole number.
    #[error("Invalid slider input {input:?}")]
    InvalidInput {
        /// The raw text received.
        input: String,
    },

    /// The index is past the last value.
    #[error("Slider index {index} out of range (max {max})")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Largest valid index.
        max: usize,
    },
}

/// A value the slider can select, shown by its label.
pub trait SliderValue {
    /// Human-readable label.
    fn label(&self) -> String;
}

impl SliderValue for NaiveDate {
    fn label(&self) -> String {
        self.format("%b %Y").to_string()
    }
}

impl SliderValue for TimelineItem {
    fn label(&self) -> String {
        self.date.label()
    }
}

impl SliderValue for String {
    fn label(&self) -> String {
        self.clone()
    }
}

/// Something slider markup can be appended to.
pub trait Container {
    /// Appends rendered markup.
    fn append(&mut self, markup: &str);

    /// Replaces the last occurrence of `previous` with `markup`, appending
    /// `markup` if `previous` is gone.
    fn replace(&mut self, previous: &str, markup: &str);
}

impl Container for String {
    fn append(&mut self, markup: &str) {
        self.push_str(markup);
    }

    fn replace(&mut self, previous: &str, markup: &str) {
        match self.rfind(previous) {
            Some(start) => self.replace_range(start..start + previous.len(), markup),
            None => self.push_str(markup),
        }
    }
}

impl Container for Vec<String> {
    fn append(&mut self, markup: &str) {
        self.push(markup.to_string());
    }

    fn replace(&mut self, previous: &str, markup: &str) {
        match self.iter_mut().rev().find(|m| m.as_str() == previous) {
            Some(slot) => *slot = markup.to_string(),
            None => self.push(markup.to_string()),
        }
    }
}

/// Slider configuration.
pub struct SliderProps<T> {
    /// Ordered values; the control selects an index into them.
    pub values: Vec<T>,
    /// Index selected when mounted.
    pub initial_index: usize,
    /// Called with the new index after a user change.
    pub on_change: Box<dyn FnMut(usize)>,
    /// Form control name.
    pub name: String,
    /// Optional description markup shown below the control.
    pub description: Option<String>,
    /// Optional scale used to color the track.
    pub color_scale: Option<Arc<ColorScale>>,
}

impl<T: std::fmt::Debug> std::fmt::Debug for SliderProps<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SliderProps")
            .field("values", &self.values)
            .field("initial_index", &self.initial_index)
            .field("name", &self.name)
            .field("description", &self.description)
            .field("color_scale", &self.color_scale)
            .finish_non_exhaustive()
    }
}

/// State of the underlying range input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeInput {
    /// Always `0`.
    pub min: usize,
    /// `values.len() - 1`.
    pub max: usize,
    /// Always `1`.
    pub step: usize,
    /// Selected index.
    pub value: usize,
}

/// A mounted slider.
#[derive(Debug)]
pub struct Slider<T> {
    props: SliderProps<T>,
    input: RangeInput,
    dates: [String; 2],
    markup: String,
}

impl<T: SliderValue> Slider<T> {
    /// Validates `props`, appends the slider markup to `container` and
    /// returns the mounted slider.
    ///
    /// # Errors
    ///
    /// Returns [`SliderError`] if there are no values or the initial index
    /// is out of range.
    pub fn mount(
        container: &mut impl Container,
        props: SliderProps<T>,
    ) -> Result<Self, SliderError> {
        let (Some(first), Some(last)) = (props.values.first(), props.values.last()) else {
            return Err(SliderError::NoValues);
        };
        if props.initial_index >= props.values.len() {
            return Err(SliderError::InitialIndexOutOfRange {
                index: props.initial_index,
                len: props.values.len(),
            });
        }

        let mut slider = Self {
            dates: [first.label(), last.label()],
            input: RangeInput {
                min: 0,
                max: props.values.len() - 1,
                step: 1,
                value: props.initial_index,
            },
            props,
            markup: String::new(),
        };
        slider.markup = slider.render();
        container.append(&slider.markup);

        log::debug!(
            "Mounted slider '{}' at {}/{}",
            slider.props.name,
            slider.input.value,
            slider.input.max
        );

        Ok(slider)
    }

    /// Handles a change event carrying the input's raw text value: parses
    /// it, repositions the control and calls `on_change` with the index.
    /// Call [`Self::refresh`] to update the mounted markup.
    ///
    /// # Errors
    ///
    /// Returns [`SliderError`] if `raw` is not a whole number or is out of
    /// range; the callback is not called and the position is unchanged.
    pub fn handle_change(&mut self, raw: &str) -> Result<usize, SliderError> {
        let index = raw
            .trim()
            .parse::<usize>()
            .map_err(|_| SliderError::InvalidInput {
                input: raw.to_string(),
            })?;
        self.update(index)?;
        log::trace!("Slider '{}' changed to {index}", self.props.name);
        (self.props.on_change)(index);
        Ok(index)
    }

    /// Repositions the control without calling `on_change`. Call
    /// [`Self::refresh`] to update the mounted markup.
    ///
    /// # Errors
    ///
    /// Returns [`SliderError::IndexOutOfRange`] if `index` is past the end.
    pub const fn update(&mut self, index: usize) -> Result<(), SliderError> {
        if index > self.input.max {
            return Err(SliderError::IndexOutOfRange {
                index,
                max: self.input.max,
            });
        }
        self.input.value = index;
        Ok(())
    }

    /// Replaces the markup last emitted into `container` with a render of
    /// the current state.
    pub fn refresh(&mut self, container: &mut impl Container) {
        let markup = self.render();
        container.replace(&self.markup, &markup);
        self.markup = markup;
    }

    /// Current range input state.
    #[must_use]
    pub const fn input(&self) -> &RangeInput {
        &self.input
    }

    /// Currently selected value.
    #[must_use]
    pub fn selected(&self) -> &T {
        &self.props.values[self.input.value]
    }

    /// Labels of the first and last values.
    #[must_use]
    pub const fn dates(&self) -> &[String; 2] {
        &self.dates
    }

    /// Renders the slider as HTML markup.
    #[must_use]
    pub fn render(&self) -> String {
        let mut html = String::from(r#"<div class="Slider"><div class="dates">"#);
        for date in &self.dates {
            html.push_str(&format!(r#"<div class="date">{}</div>"#, escape(date)));
        }
        html.push_str("</div>");

        html.push_str(&format!(
            r#"<input type="range" name="{}" min="{}" max="{}" value="{}" step="{}""#,
            escape(&self.props.name),
            self.input.min,
            self.input.max,
            self.input.value,
            self.input.step,
        ));
        if let Some(scale) = &self.props.color_scale {
            let stops: Vec<String> = scale
                .legend_stops(TRACK_STOPS)
                .iter()
                .map(|(_, color)| color.to_string())
                .collect();
            html.push_str(&format!(
                r#" style="background: linear-gradient(to right, {})""#,
                stops.join(", ")
            ));
        }
        html.push_str(" />");

        if let Some(description) = &self.props.description {
            html.push_str(&format!(r#"<div class="description">{description}</div>"#));
        }
        html.push_str("</div>");
        html
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
