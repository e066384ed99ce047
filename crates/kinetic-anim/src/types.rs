//! Core animation types.
//!
//! - `TimelineId`: unique identifier for a timeline registered with the animator
//! - `Property`: the element properties tweens can drive
//! - `Transform`: per-element transform components composed into a CSS transform

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Unique identifier for a timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimelineId(pub u64);

impl TimelineId {
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for TimelineId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TimelineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tl{}", self.0)
    }
}

/// Animatable element property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Property {
    /// Horizontal translation in em.
    X,
    /// Vertical translation in em.
    Y,
    /// Horizontal translation in percent of the element's width.
    XPercent,
    /// Vertical translation in percent of the element's height.
    YPercent,
    /// Rotation in degrees.
    Rotate,
    Opacity,
    /// Opacity that also hides the element (`visibility: hidden`) at zero.
    AutoAlpha,
}

impl Property {
    pub fn is_transform(self) -> bool {
        matches!(
            self,
            Self::X | Self::Y | Self::XPercent | Self::YPercent | Self::Rotate
        )
    }

    /// Inline style keys written when this property renders.
    pub fn style_keys(self) -> &'static [&'static str] {
        match self {
            Self::X | Self::Y | Self::XPercent | Self::YPercent | Self::Rotate => &["transform"],
            Self::Opacity => &["opacity"],
            Self::AutoAlpha => &["opacity", "visibility"],
        }
    }
}

/// Transform components of one element.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Transform {
    pub x: f64,
    pub y: f64,
    pub x_percent: f64,
    pub y_percent: f64,
    pub rotate: f64,
}

impl Transform {
    pub fn get(&self, property: Property) -> Option<f64> {
        match property {
            Property::X => Some(self.x),
            Property::Y => Some(self.y),
            Property::XPercent => Some(self.x_percent),
            Property::YPercent => Some(self.y_percent),
            Property::Rotate => Some(self.rotate),
            Property::Opacity | Property::AutoAlpha => None,
        }
    }

    pub fn set(&mut self, property: Property, value: f64) {
        match property {
            Property::X => self.x = value,
            Property::Y => self.y = value,
            Property::XPercent => self.x_percent = value,
            Property::YPercent => self.y_percent = value,
            Property::Rotate => self.rotate = value,
            Property::Opacity | Property::AutoAlpha => {}
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    /// CSS `transform` value.
    pub fn to_css(&self) -> String {
        format!(
            "translate({}%, {}%) translate3d({}em, {}em, 0) rotate({}deg)",
            self.x_percent, self.y_percent, self.x, self.y, self.rotate
        )
    }
}
