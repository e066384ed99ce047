//! Named viewport conditions.
//!
//! [`MatchMedia`] evaluates an ordered set of named media queries against a
//! viewport. Supported features are `min-width`, `max-width`, `min-height`,
//! `max-height` (px) and `orientation`, joined with `and`.

use std::fmt;

use kinetic_dom::Viewport;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
#[error("invalid media query '{query}': {reason}")]
pub struct MediaQueryError {
    pub query: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Feature {
    MinWidth(f64),
    MaxWidth(f64),
    MinHeight(f64),
    MaxHeight(f64),
    Landscape,
    Portrait,
}

impl Feature {
    fn matches(&self, viewport: &Viewport) -> bool {
        match *self {
            Self::MinWidth(px) => viewport.width >= px,
            Self::MaxWidth(px) => viewport.width <= px,
            Self::MinHeight(px) => viewport.height >= px,
            Self::MaxHeight(px) => viewport.height <= px,
            Self::Landscape => viewport.is_landscape(),
            Self::Portrait => !viewport.is_landscape(),
        }
    }
}

/// A parsed conjunction of media features.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaQuery {
    source: String,
    features: Vec<Feature>,
}

impl MediaQuery {
    pub fn parse(source: &str) -> Result<Self, MediaQueryError> {
        let error = |reason: &str| MediaQueryError {
            query: source.to_string(),
            reason: reason.to_string(),
        };
        let mut features = Vec::new();
        for part in source.split(" and ") {
            let part = part.trim();
            if matches!(part, "screen" | "all" | "only screen") {
                continue;
            }
            let inner = part
                .strip_prefix('(')
                .and_then(|rest| rest.strip_suffix(')'))
                .ok_or_else(|| error("expected '(feature: value)'"))?;
            let (name, value) = inner
                .split_once(':')
                .ok_or_else(|| error("missing ':' in feature"))?;
            let name = name.trim();
            let value = value.trim();
            let feature = match name {
                "orientation" => match value {
                    "landscape" => Feature::Landscape,
                    "portrait" => Feature::Portrait,
                    _ => return Err(error("unknown orientation")),
                },
                _ => {
                    let px = value
                        .strip_suffix("px")
                        .unwrap_or(value)
                        .trim()
                        .parse::<f64>()
                        .map_err(|_| error("expected a pixel length"))?;
                    match name {
                        "min-width" => Feature::MinWidth(px),
                        "max-width" => Feature::MaxWidth(px),
                        "min-height" => Feature::MinHeight(px),
                        "max-height" => Feature::MaxHeight(px),
                        _ => return Err(error("unsupported feature")),
                    }
                }
            };
            features.push(feature);
        }
        if features.is_empty() {
            return Err(error("no features"));
        }
        Ok(Self {
            source: source.to_string(),
            features,
        })
    }

    pub fn matches(&self, viewport: &Viewport) -> bool {
        self.features.iter().all(|feature| feature.matches(viewport))
    }
}

impl fmt::Display for MediaQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Result of evaluating every named condition, in registration order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Conditions {
    entries: Vec<(String, bool)>,
}

impl Conditions {
    pub fn get(&self, name: &str) -> bool {
        self.entries
            .iter()
            .any(|(entry, active)| entry == name && *active)
    }

    /// Names of the conditions that currently hold.
    pub fn active(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, active)| *active)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.entries.iter().map(|(name, active)| (name.as_str(), *active))
    }
}

#[derive(Debug, Clone, Default)]
pub struct MatchMedia {
    queries: Vec<(String, MediaQuery)>,
    current: Option<Conditions>,
}

impl MatchMedia {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, query: MediaQuery) {
        let name = name.into();
        self.queries.retain(|(existing, _)| *existing != name);
        self.queries.push((name, query));
        self.current = None;
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    pub fn evaluate(&self, viewport: &Viewport) -> Conditions {
        Conditions {
            entries: self
                .queries
                .iter()
                .map(|(name, query)| (name.clone(), query.matches(viewport)))
                .collect(),
        }
    }

    /// Whether evaluating at `viewport` would differ from the last recorded
    /// evaluation.
    pub fn changed(&self, viewport: &Viewport) -> bool {
        self.current.as_ref() != Some(&self.evaluate(viewport))
    }

    /// Evaluate and record; returns the new conditions only when they differ
    /// from the previous evaluation.
    pub fn update(&mut self, viewport: &Viewport) -> Option<Conditions> {
        let conditions = self.evaluate(viewport);
        if self.current.as_ref() == Some(&conditions) {
            return None;
        }
        self.current = Some(conditions.clone());
        Some(conditions)
    }

    pub fn current(&self) -> Option<&Conditions> {
        self.current.as_ref()
    }

    /// Forget the recorded evaluation.
    pub fn reset(&mut self) {
        self.current = None;
    }
}
