//! Scroll-bound triggers.
//!
//! A trigger maps a scroll range, computed from an element's layout box and
//! the viewport, onto a progress value in [0, 1]. Positions are written as
//! `"<element anchor> <viewport anchor>"`, e.g. `"top bottom"` means "when the
//! element's top edge meets the viewport's bottom edge". Anchors are `top`,
//! `center`, `bottom`, a percentage, or a pixel length, optionally followed by
//! a `+=`/`-=` pixel offset. Wrapping a position in `clamp(...)` pins the
//! computed scroll offset into the document's scrollable extent.
//!
//! # Usage
//!
//! ```ignore
//! let spec = TriggerSpec::new(section)
//!     .start(TriggerPosition::parse("clamp(top bottom)")?)
//!     .end(TriggerPosition::parse("clamp(bottom top)")?)
//!     .scrub()
//!     .animation(timeline);
//! let id = observer.register(&doc, spec);
//! for update in observer.update(scroll_y) {
//!     // feed progress into the timeline
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;

use kinetic_dom::{Document, NodeId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

use crate::types::TimelineId;

#[derive(Debug, Error, Clone, PartialEq)]
#[error("invalid trigger position '{position}': {reason}")]
pub struct TriggerParseError {
    pub position: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TriggerId(pub u64);

impl fmt::Display for TriggerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "st{}", self.0)
    }
}

/// A point along an edge: a fraction of the length plus a pixel offset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub ratio: f64,
    pub pixels: f64,
}

impl Anchor {
    fn resolve(&self, length: f64) -> f64 {
        self.ratio * length + self.pixels
    }

    fn parse(token: &str) -> Option<Self> {
        let (base, offset) = match token.find("+=").or_else(|| token.find("-=")) {
            Some(index) => {
                let sign = if token[index..].starts_with('+') { 1.0 } else { -1.0 };
                let offset = parse_pixels(&token[index + 2..])?;
                (&token[..index], sign * offset)
            }
            None => (token, 0.0),
        };
        let mut anchor = match base {
            "top" | "left" => Self { ratio: 0.0, pixels: 0.0 },
            "center" => Self { ratio: 0.5, pixels: 0.0 },
            "bottom" | "right" => Self { ratio: 1.0, pixels: 0.0 },
            other => match other.strip_suffix('%') {
                Some(percent) => Self {
                    ratio: percent.trim().parse::<f64>().ok()? / 100.0,
                    pixels: 0.0,
                },
                None => Self {
                    ratio: 0.0,
                    pixels: parse_pixels(other)?,
                },
            },
        };
        anchor.pixels += offset;
        Some(anchor)
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ratio {
            r if r == 0.0 && self.pixels != 0.0 => return write!(f, "{}px", self.pixels),
            r if r == 0.0 => write!(f, "top")?,
            r if r == 0.5 => write!(f, "center")?,
            r if r == 1.0 => write!(f, "bottom")?,
            r => write!(f, "{}%", r * 100.0)?,
        }
        if self.pixels > 0.0 {
            write!(f, "+={}px", self.pixels)?;
        } else if self.pixels < 0.0 {
            write!(f, "-={}px", -self.pixels)?;
        }
        Ok(())
    }
}

fn parse_pixels(value: &str) -> Option<f64> {
    let value = value.trim();
    let number = value.strip_suffix("px").unwrap_or(value);
    number.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Where a trigger starts or ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriggerPosition {
    pub element: Anchor,
    pub viewport: Anchor,
    pub clamp: bool,
}

impl TriggerPosition {
    pub fn parse(source: &str) -> Result<Self, TriggerParseError> {
        let error = |reason: &str| TriggerParseError {
            position: source.to_string(),
            reason: reason.to_string(),
        };
        let trimmed = source.trim();
        let (inner, clamp) = match trimmed.strip_prefix("clamp(") {
            Some(rest) => (
                rest.strip_suffix(')').ok_or_else(|| error("unterminated clamp("))?,
                true,
            ),
            None => (trimmed, false),
        };
        let tokens: Vec<&str> = inner.split_whitespace().collect();
        let [element, viewport] = tokens[..] else {
            return Err(error("expected '<element anchor> <viewport anchor>'"));
        };
        Ok(Self {
            element: Anchor::parse(element).ok_or_else(|| error("bad element anchor"))?,
            viewport: Anchor::parse(viewport).ok_or_else(|| error("bad viewport anchor"))?,
            clamp,
        })
    }

    /// Scroll offset at which this position is reached for `trigger`.
    pub fn resolve(&self, doc: &Document, trigger: NodeId) -> f64 {
        let rect = doc.rect(trigger);
        let viewport = doc.viewport();
        let offset = rect.top() + self.element.resolve(rect.height)
            - self.viewport.resolve(viewport.height);
        if self.clamp {
            offset.clamp(0.0, doc.max_scroll())
        } else {
            offset
        }
    }
}

impl fmt::Display for TriggerPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.clamp {
            write!(f, "clamp({} {})", self.element, self.viewport)
        } else {
            write!(f, "{} {}", self.element, self.viewport)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TriggerSpec {
    pub trigger: NodeId,
    pub start: TriggerPosition,
    pub end: TriggerPosition,
    /// Progress follows the scroll position directly.
    pub scrub: bool,
    /// Fire a single `Enter` when the start is reached, then self-destruct.
    pub once: bool,
    pub animation: Option<TimelineId>,
}

impl TriggerSpec {
    pub fn new(trigger: NodeId) -> Self {
        let top_bottom = TriggerPosition {
            element: Anchor { ratio: 0.0, pixels: 0.0 },
            viewport: Anchor { ratio: 1.0, pixels: 0.0 },
            clamp: false,
        };
        let bottom_top = TriggerPosition {
            element: Anchor { ratio: 1.0, pixels: 0.0 },
            viewport: Anchor { ratio: 0.0, pixels: 0.0 },
            clamp: false,
        };
        Self {
            trigger,
            start: top_bottom,
            end: bottom_top,
            scrub: false,
            once: false,
            animation: None,
        }
    }

    pub fn start(mut self, position: TriggerPosition) -> Self {
        self.start = position;
        self
    }

    pub fn end(mut self, position: TriggerPosition) -> Self {
        self.end = position;
        self
    }

    pub fn scrub(mut self) -> Self {
        self.scrub = true;
        self
    }

    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }

    pub fn animation(mut self, timeline: TimelineId) -> Self {
        self.animation = Some(timeline);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TriggerUpdate {
    Progress {
        trigger: TriggerId,
        animation: Option<TimelineId>,
        progress: f64,
    },
    Enter {
        trigger: TriggerId,
        animation: Option<TimelineId>,
    },
}

#[derive(Debug)]
struct ActiveTrigger {
    spec: TriggerSpec,
    start_px: f64,
    end_px: f64,
    progress: Option<f64>,
}

impl ActiveTrigger {
    fn progress_at(&self, scroll: f64) -> f64 {
        let span = self.end_px - self.start_px;
        if span <= 0.0 {
            return if scroll >= self.start_px { 1.0 } else { 0.0 };
        }
        ((scroll - self.start_px) / span).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Default)]
pub struct ScrollObserver {
    triggers: BTreeMap<TriggerId, ActiveTrigger>,
    next_id: u64,
    scroll: f64,
}

impl ScrollObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    pub fn ids(&self) -> Vec<TriggerId> {
        self.triggers.keys().copied().collect()
    }

    pub fn scroll(&self) -> f64 {
        self.scroll
    }

    pub fn spec(&self, id: TriggerId) -> Option<&TriggerSpec> {
        self.triggers.get(&id).map(|t| &t.spec)
    }

    /// Computed `(start, end)` scroll offsets.
    pub fn range(&self, id: TriggerId) -> Option<(f64, f64)> {
        self.triggers.get(&id).map(|t| (t.start_px, t.end_px))
    }

    pub fn progress(&self, id: TriggerId) -> Option<f64> {
        let trigger = self.triggers.get(&id)?;
        Some(trigger.progress.unwrap_or_else(|| trigger.progress_at(self.scroll)))
    }

    pub fn register(&mut self, doc: &Document, spec: TriggerSpec) -> TriggerId {
        self.next_id += 1;
        let id = TriggerId(self.next_id);
        let start_px = spec.start.resolve(doc, spec.trigger);
        let end_px = spec.end.resolve(doc, spec.trigger);
        debug!(
            trigger = %id,
            element = %spec.trigger,
            start = %spec.start,
            end = %spec.end,
            start_px,
            end_px,
            "scroll trigger registered"
        );
        self.triggers.insert(
            id,
            ActiveTrigger {
                spec,
                start_px,
                end_px,
                progress: None,
            },
        );
        id
    }

    /// Recompute every trigger's pixel range from current layout.
    pub fn refresh(&mut self, doc: &Document) {
        for trigger in self.triggers.values_mut() {
            trigger.start_px = trigger.spec.start.resolve(doc, trigger.spec.trigger);
            trigger.end_px = trigger.spec.end.resolve(doc, trigger.spec.trigger);
            trigger.progress = None;
        }
        trace!(count = self.triggers.len(), "scroll triggers refreshed");
    }

    /// Evaluate every trigger at `scroll`.
    ///
    /// Scrubbed triggers report progress whenever it changes; `once`
    /// triggers report `Enter` when first reached and are then removed.
    pub fn update(&mut self, scroll: f64) -> Vec<TriggerUpdate> {
        self.scroll = scroll;
        let mut updates = Vec::new();
        let mut finished = Vec::new();
        for (id, trigger) in self.triggers.iter_mut() {
            if trigger.spec.once {
                if scroll >= trigger.start_px {
                    updates.push(TriggerUpdate::Enter {
                        trigger: *id,
                        animation: trigger.spec.animation,
                    });
                    finished.push(*id);
                }
                continue;
            }
            let progress = trigger.progress_at(scroll);
            if trigger.progress != Some(progress) {
                trigger.progress = Some(progress);
                updates.push(TriggerUpdate::Progress {
                    trigger: *id,
                    animation: trigger.spec.animation,
                    progress,
                });
            }
        }
        for id in finished {
            self.triggers.remove(&id);
        }
        updates
    }

    pub fn kill(&mut self, id: TriggerId) -> Option<TriggerSpec> {
        self.triggers.remove(&id).map(|t| t.spec)
    }

    /// Remove every trigger bound to `element`, returning their specs.
    pub fn kill_by_element(&mut self, element: NodeId) -> Vec<TriggerSpec> {
        let ids = self.triggers_of(element);
        ids.into_iter().filter_map(|id| self.kill(id)).collect()
    }

    pub fn triggers_of(&self, element: NodeId) -> Vec<TriggerId> {
        self.triggers
            .iter()
            .filter(|(_, t)| t.spec.trigger == element)
            .map(|(id, _)| *id)
            .collect()
    }
}
