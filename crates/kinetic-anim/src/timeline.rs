//! Timeline and tween builders.
//!
//! A [`Timeline`] is an ordered list of [`Tween`]s placed on a shared time
//! axis. Each tween animates one or more targets, optionally staggering the
//! start of each successive target.
//!
//! # Usage
//!
//! ```ignore
//! use kinetic_anim::{Ease, Property, Timeline, Tween};
//!
//! let timeline = Timeline::new()
//!     .label("footer-parallax")
//!     .scrubbed()
//!     .add(Tween::from(vec![inner]).prop(Property::YPercent, -25.0).ease(Ease::None))
//!     .add(Tween::from(vec![dark]).prop(Property::Opacity, 0.5).ease(Ease::None).with_previous());
//! let id = animator.add(&mut doc, timeline);
//! ```

use kinetic_dom::NodeId;
use kinetic_text::Alphabet;

use crate::easing::Ease;
use crate::types::Property;

/// Placement of a tween on its timeline.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Position {
    /// After everything placed so far.
    #[default]
    Sequence,
    /// At an absolute time in seconds.
    At(f64),
    /// At the start of the previously placed tween (`"<"`).
    WithPrevious,
}

/// Inline style cleanup applied when a clock-driven timeline completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearProps {
    /// Remove the style keys written by the timeline's tweens.
    Animated,
    /// Remove every inline style of each target.
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TweenKind {
    To,
    From,
    FromTo,
    Set,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PropertyTween {
    pub(crate) property: Property,
    pub(crate) from: Option<f64>,
    pub(crate) to: Option<f64>,
}

/// Text substitution animated alongside a tween.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrambleTrack {
    /// Destination text; empty means the target's current text.
    pub text: String,
    pub alphabet: Alphabet,
    pub speed: f64,
}

impl ScrambleTrack {
    pub fn new(text: impl Into<String>, alphabet: Alphabet, speed: f64) -> Self {
        Self {
            text: text.into(),
            alphabet,
            speed,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tween {
    pub(crate) kind: TweenKind,
    pub(crate) targets: Vec<NodeId>,
    pub(crate) properties: Vec<PropertyTween>,
    pub(crate) duration: f64,
    pub(crate) ease: Ease,
    pub(crate) stagger: f64,
    pub(crate) position: Position,
    pub(crate) scramble: Option<ScrambleTrack>,
}

impl Tween {
    fn new(kind: TweenKind, targets: Vec<NodeId>) -> Self {
        Self {
            kind,
            targets,
            properties: Vec::new(),
            duration: if kind == TweenKind::Set { 0.0 } else { 0.5 },
            ease: Ease::default(),
            stagger: 0.0,
            position: Position::Sequence,
            scramble: None,
        }
    }

    /// Animate from the current values to the given ones.
    pub fn to(targets: Vec<NodeId>) -> Self {
        Self::new(TweenKind::To, targets)
    }

    /// Animate from the given values to the current ones. The given values
    /// render as soon as the timeline is added.
    pub fn from(targets: Vec<NodeId>) -> Self {
        Self::new(TweenKind::From, targets)
    }

    /// Animate between explicit start and end values.
    pub fn from_to(targets: Vec<NodeId>) -> Self {
        Self::new(TweenKind::FromTo, targets)
    }

    /// Jump to the given values at the tween's position.
    pub fn set(targets: Vec<NodeId>) -> Self {
        Self::new(TweenKind::Set, targets)
    }

    /// Add a property with its single given value (the destination for
    /// `to`/`set`, the origin for `from`).
    pub fn prop(mut self, property: Property, value: f64) -> Self {
        let (from, to) = match self.kind {
            TweenKind::From => (Some(value), None),
            TweenKind::To | TweenKind::Set => (None, Some(value)),
            TweenKind::FromTo => (Some(value), Some(value)),
        };
        self.properties.push(PropertyTween { property, from, to });
        self
    }

    /// Add a property with explicit start and end values.
    pub fn range(mut self, property: Property, from: f64, to: f64) -> Self {
        self.properties.push(PropertyTween {
            property,
            from: Some(from),
            to: Some(to),
        });
        self
    }

    pub fn duration(mut self, seconds: f64) -> Self {
        self.duration = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
        self
    }

    pub fn ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    /// Delay between successive targets, in seconds.
    pub fn stagger(mut self, seconds: f64) -> Self {
        self.stagger = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
        self
    }

    pub fn at(mut self, seconds: f64) -> Self {
        self.position = Position::At(seconds.max(0.0));
        self
    }

    pub fn with_previous(mut self) -> Self {
        self.position = Position::WithPrevious;
        self
    }

    pub fn scramble(mut self, track: ScrambleTrack) -> Self {
        self.scramble = Some(track);
        self
    }

    pub fn targets(&self) -> &[NodeId] {
        &self.targets
    }

    /// Time from the first target's start to the last target's end.
    pub fn span(&self) -> f64 {
        let staggered = self.targets.len().saturating_sub(1) as f64 * self.stagger;
        self.duration + staggered
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Timeline {
    pub(crate) tweens: Vec<Tween>,
    pub(crate) label: Option<String>,
    pub(crate) scrubbed: bool,
    pub(crate) paused: bool,
    pub(crate) clear_props: Option<ClearProps>,
    pub(crate) overwrite: bool,
    pub(crate) retain: bool,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// A timeline holding a single tween.
    pub fn tween(tween: Tween) -> Self {
        Self::new().add(tween)
    }

    pub fn add(mut self, tween: Tween) -> Self {
        self.tweens.push(tween);
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Drive the timeline from an external progress value instead of the
    /// clock.
    pub fn scrubbed(mut self) -> Self {
        self.scrubbed = true;
        self
    }

    pub fn paused(mut self) -> Self {
        self.paused = true;
        self
    }

    pub fn clear_props(mut self, clear: ClearProps) -> Self {
        self.clear_props = Some(clear);
        self
    }

    /// Kill other clock-driven timelines animating any of the same targets
    /// when this one is added.
    pub fn overwrite(mut self) -> Self {
        self.overwrite = true;
        self
    }

    /// Keep the timeline registered after it completes so it can still be
    /// reverted.
    pub fn retain(mut self) -> Self {
        self.retain = true;
        self
    }

    pub fn is_scrubbed(&self) -> bool {
        self.scrubbed
    }

    pub fn tweens(&self) -> &[Tween] {
        &self.tweens
    }

    /// Every distinct target in first-appearance order.
    pub fn targets(&self) -> Vec<NodeId> {
        let mut targets = Vec::new();
        for tween in &self.tweens {
            for target in &tween.targets {
                if !targets.contains(target) {
                    targets.push(*target);
                }
            }
        }
        targets
    }

    /// Start time of every tween and the total duration.
    pub(crate) fn layout(&self) -> (Vec<f64>, f64) {
        let mut starts = Vec::with_capacity(self.tweens.len());
        let mut end: f64 = 0.0;
        let mut previous_start = 0.0;
        for tween in &self.tweens {
            let start = match tween.position {
                Position::Sequence => end,
                Position::At(seconds) => seconds,
                Position::WithPrevious => previous_start,
            };
            starts.push(start);
            previous_start = start;
            end = end.max(start + tween.span());
        }
        (starts, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinetic_dom::Document;

    fn nodes(count: usize) -> Vec<NodeId> {
        let mut doc = Document::new();
        (0..count).map(|_| doc.create_element("div")).collect()
    }

    #[test]
    fn test_span_includes_stagger() {
        let targets = nodes(5);
        let tween = Tween::from(targets).prop(Property::AutoAlpha, 0.2).duration(0.5).stagger(0.1);
        assert!((tween.span() - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_layout_sequence_and_with_previous() {
        let targets = nodes(2);
        let timeline = Timeline::new()
            .add(Tween::to(vec![targets[0]]).prop(Property::X, 1.0).duration(1.0))
            .add(Tween::to(vec![targets[1]]).prop(Property::X, 1.0).duration(2.0))
            .add(Tween::to(vec![targets[1]]).prop(Property::Y, 1.0).duration(0.5).with_previous())
            .add(Tween::set(vec![targets[0]]).prop(Property::Opacity, 0.0).at(0.25));
        let (starts, duration) = timeline.layout();
        assert_eq!(starts, vec![0.0, 1.0, 1.0, 0.25]);
        assert_eq!(duration, 3.0);
    }

    #[test]
    fn test_targets_are_distinct() {
        let targets = nodes(2);
        let timeline = Timeline::new()
            .add(Tween::to(targets.clone()).prop(Property::X, 1.0))
            .add(Tween::to(vec![targets[1]]).prop(Property::Y, 1.0));
        assert_eq!(timeline.targets(), targets);
    }

    #[test]
    fn test_prop_assigns_side_by_kind() {
        let targets = nodes(1);
        let from = Tween::from(targets.clone()).prop(Property::Opacity, 0.5);
        assert_eq!(from.properties[0].from, Some(0.5));
        assert_eq!(from.properties[0].to, None);
        let to = Tween::to(targets).prop(Property::Opacity, 0.5);
        assert_eq!(to.properties[0].to, Some(0.5));
    }
}
