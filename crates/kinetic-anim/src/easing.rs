//! Easing functions for tween timing.
//!
//! Eases are named the way animation authors write them in markup:
//! - `none` / `linear`
//! - `power1` .. `power4` with `.in`, `.out` (default) or `.inOut`
//! - `expo.out`
//! - `elastic.out(amplitude, period)`
//! - `cubic-bezier(x1, y1, x2, y2)`
//!
//! # Usage
//!
//! ```ignore
//! use kinetic_anim::Ease;
//!
//! let ease = Ease::parse("power4.out")?;
//! let progress = ease.evaluate(0.5);
//!
//! let release = Ease::parse("elastic.out(1, 0.3)")?;
//! ```

use std::f64::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
#[error("unknown ease '{0}'")]
pub struct EaseParseError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EaseDirection {
    In,
    Out,
    InOut,
}

/// Easing function for tween timing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Ease {
    /// Linear progress.
    None,

    /// Polynomial ease of degree `power + 1`.
    Power { power: u8, direction: EaseDirection },

    /// Exponential deceleration.
    ExpoOut,

    /// Overshoot-and-settle deceleration. `amplitude` is at least 1.
    ElasticOut { amplitude: f64, period: f64 },

    /// Custom cubic bezier curve with control points (x1, y1) and (x2, y2).
    CubicBezier { x1: f64, y1: f64, x2: f64, y2: f64 },
}

impl Default for Ease {
    fn default() -> Self {
        Self::Power {
            power: 1,
            direction: EaseDirection::Out,
        }
    }
}

impl Ease {
    pub const fn power(power: u8, direction: EaseDirection) -> Self {
        Self::Power { power, direction }
    }

    pub const fn elastic_out(amplitude: f64, period: f64) -> Self {
        Self::ElasticOut { amplitude, period }
    }

    /// Evaluate the ease at `t` (clamped to [0, 1]).
    ///
    /// Elastic eases overshoot, so the result may leave [0, 1] in between.
    pub fn evaluate(&self, t: f64) -> f64 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match *self {
            Self::None => t,
            Self::Power { power, direction } => {
                let exponent = i32::from(power) + 1;
                match direction {
                    EaseDirection::In => t.powi(exponent),
                    EaseDirection::Out => 1.0 - (1.0 - t).powi(exponent),
                    EaseDirection::InOut => {
                        if t < 0.5 {
                            (2.0 * t).powi(exponent) / 2.0
                        } else {
                            1.0 - (2.0 * (1.0 - t)).powi(exponent) / 2.0
                        }
                    }
                }
            }
            Self::ExpoOut => {
                if t >= 1.0 {
                    1.0
                } else {
                    1.0 - 2f64.powf(-10.0 * t)
                }
            }
            Self::ElasticOut { amplitude, period } => elastic_out(amplitude, period, t),
            Self::CubicBezier { x1, y1, x2, y2 } => cubic_bezier(x1, y1, x2, y2, t),
        }
    }

    /// Parse an ease name.
    pub fn parse(source: &str) -> Result<Self, EaseParseError> {
        let compact: String = source.chars().filter(|c| !c.is_whitespace()).collect();
        let error = || EaseParseError(source.to_string());

        let (name, args) = match compact.split_once('(') {
            Some((name, rest)) => {
                let inner = rest.strip_suffix(')').ok_or_else(error)?;
                let args = inner
                    .split(',')
                    .filter(|part| !part.is_empty())
                    .map(|part| part.parse::<f64>().map_err(|_| error()))
                    .collect::<Result<Vec<_>, _>>()?;
                (name.to_string(), args)
            }
            None => (compact, Vec::new()),
        };

        match name.as_str() {
            "none" | "linear" => return Ok(Self::None),
            "expo" | "expo.out" => return Ok(Self::ExpoOut),
            "elastic" | "elastic.out" => {
                let amplitude = args.first().copied().unwrap_or(1.0);
                let period = args.get(1).copied().unwrap_or(0.3);
                return Ok(Self::ElasticOut {
                    amplitude: amplitude.max(1.0),
                    period: if period > 0.0 { period } else { 0.3 },
                });
            }
            "cubic-bezier" => {
                let [x1, y1, x2, y2] = args[..] else {
                    return Err(error());
                };
                if !(0.0..=1.0).contains(&x1) || !(0.0..=1.0).contains(&x2) {
                    return Err(error());
                }
                return Ok(Self::CubicBezier { x1, y1, x2, y2 });
            }
            _ => {}
        }

        let (family, direction) = match name.split_once('.') {
            Some((family, "in")) => (family, EaseDirection::In),
            Some((family, "out")) => (family, EaseDirection::Out),
            Some((family, "inOut")) => (family, EaseDirection::InOut),
            Some(_) => return Err(error()),
            None => (name.as_str(), EaseDirection::Out),
        };
        let power = match family {
            "power0" => return Ok(Self::None),
            "power1" | "quad" => 1,
            "power2" | "cubic" => 2,
            "power3" | "quart" => 3,
            "power4" | "quint" | "strong" => 4,
            _ => return Err(error()),
        };
        Ok(Self::Power { power, direction })
    }
}

impl fmt::Display for Ease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Power { power, direction } => {
                let suffix = match direction {
                    EaseDirection::In => "in",
                    EaseDirection::Out => "out",
                    EaseDirection::InOut => "inOut",
                };
                write!(f, "power{power}.{suffix}")
            }
            Self::ExpoOut => write!(f, "expo.out"),
            Self::ElasticOut { amplitude, period } => {
                write!(f, "elastic.out({amplitude}, {period})")
            }
            Self::CubicBezier { x1, y1, x2, y2 } => {
                write!(f, "cubic-bezier({x1}, {y1}, {x2}, {y2})")
            }
        }
    }
}

fn elastic_out(amplitude: f64, period: f64, t: f64) -> f64 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }
    let amplitude = amplitude.max(1.0);
    let phase = period / (2.0 * PI) * (1.0 / amplitude).asin();
    amplitude * 2f64.powf(-10.0 * t) * ((t - phase) * (2.0 * PI / period)).sin() + 1.0
}

/// Evaluate a cubic bezier curve at time t.
///
/// Newton-Raphson finds the curve parameter whose x matches the progress,
/// then the y coordinate at that parameter is returned.
fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64, progress: f64) -> f64 {
    if progress <= 0.0 {
        return 0.0;
    }
    if progress >= 1.0 {
        return 1.0;
    }
    let t = solve_bezier_x(x1, x2, progress);
    bezier_component(y1, y2, t)
}

fn solve_bezier_x(x1: f64, x2: f64, target_x: f64) -> f64 {
    let mut t = target_x;
    for _ in 0..8 {
        let x = bezier_component(x1, x2, t) - target_x;
        if x.abs() < 1e-7 {
            break;
        }
        let dx = bezier_derivative(x1, x2, t);
        if dx.abs() < 1e-7 {
            break;
        }
        t = (t - x / dx).clamp(0.0, 1.0);
    }
    t
}

/// 3(1-t)²t·p1 + 3(1-t)t²·p2 + t³
#[inline]
fn bezier_component(p1: f64, p2: f64, t: f64) -> f64 {
    let mt = 1.0 - t;
    3.0 * mt * mt * t * p1 + 3.0 * mt * t * t * p2 + t * t * t
}

#[inline]
fn bezier_derivative(p1: f64, p2: f64, t: f64) -> f64 {
    let mt = 1.0 - t;
    3.0 * mt * mt * p1 + 6.0 * mt * t * (p2 - p1) + 3.0 * t * t * (1.0 - p2)
}
