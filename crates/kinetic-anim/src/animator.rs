//! Timeline runtime.
//!
//! The `Animator` owns every registered timeline and writes animated values
//! into the document's inline styles. It handles:
//! - clock-driven timelines advanced by [`Animator::tick`]
//! - scrubbed timelines positioned by [`Animator::set_progress`]
//! - killing (stop, keep current styles) and reverting (stop, restore the
//!   styles and text each target had before the timeline touched it)
//! - `overwrite`, `clear_props` and `retain` semantics
//!
//! Tween start values are captured lazily: a `to` tween reads the current
//! value of each target the first time that target's tween is reached, while
//! `from`, `from_to` and `set` tweens are resolved as soon as the timeline is
//! added so their start values render immediately.
//!
//! # Usage
//!
//! ```ignore
//! let mut animator = Animator::new();
//! let id = animator.add(
//!     &mut doc,
//!     Timeline::tween(Tween::to(vec![button]).prop(Property::X, 1.5).duration(1.6)),
//! );
//! animator.tick(&mut doc, 1.0 / 60.0);
//! let x = animator.value(&doc, button, Property::X);
//! ```

use std::collections::{BTreeMap, HashMap};

use kinetic_dom::{Document, DomError, NodeId};
use kinetic_text::Scrambler;
use tracing::{debug, trace};

use crate::events::{AnimationEvent, EventQueue};
use crate::timeline::{ClearProps, Timeline, TweenKind};
use crate::types::{Property, TimelineId, Transform};

/// Inline state of a target before a timeline first touched it.
#[derive(Debug, Clone)]
struct Snapshot {
    styles: BTreeMap<String, String>,
    transform: Option<Transform>,
    text: Option<String>,
}

#[derive(Debug)]
struct ResolvedTarget {
    values: Vec<(Property, f64, f64)>,
    scrambler: Option<Scrambler>,
    last_progress: Option<f64>,
    last_time: f64,
}

#[derive(Debug)]
struct ActiveTimeline {
    timeline: Timeline,
    starts: Vec<f64>,
    duration: f64,
    time: f64,
    paused: bool,
    started: bool,
    completed: bool,
    /// Per tween, per target.
    resolved: Vec<Vec<Option<ResolvedTarget>>>,
    snapshots: BTreeMap<NodeId, Snapshot>,
}

impl ActiveTimeline {
    fn touches(&self, target: NodeId) -> bool {
        self.timeline
            .tweens
            .iter()
            .any(|tween| tween.targets.contains(&target))
    }
}

/// Registry and renderer of all live timelines.
#[derive(Debug, Default)]
pub struct Animator {
    timelines: BTreeMap<TimelineId, ActiveTimeline>,
    /// Transform components per element, composed into its `transform` style.
    transforms: HashMap<NodeId, Transform>,
    events: EventQueue,
    seed: u64,
    scramblers_created: u64,
}

impl Animator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Animator whose scramble noise is derived from `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.timelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timelines.is_empty()
    }

    pub fn is_active(&self, id: TimelineId) -> bool {
        self.timelines.contains_key(&id)
    }

    pub fn is_completed(&self, id: TimelineId) -> bool {
        self.timelines.get(&id).is_some_and(|state| state.completed)
    }

    pub fn ids(&self) -> Vec<TimelineId> {
        self.timelines.keys().copied().collect()
    }

    pub fn label(&self, id: TimelineId) -> Option<&str> {
        self.timelines.get(&id)?.timeline.label.as_deref()
    }

    pub fn progress(&self, id: TimelineId) -> Option<f64> {
        let state = self.timelines.get(&id)?;
        if state.duration <= 0.0 {
            return Some(if state.completed || state.started { 1.0 } else { 0.0 });
        }
        Some((state.time / state.duration).clamp(0.0, 1.0))
    }

    /// Timelines animating `target`.
    pub fn timelines_of(&self, target: NodeId) -> Vec<TimelineId> {
        self.timelines
            .iter()
            .filter(|(_, state)| state.touches(target))
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn drain_events(&mut self) -> Vec<AnimationEvent> {
        self.events.drain().collect()
    }

    /// Register a timeline and render its first frame.
    pub fn add(&mut self, doc: &mut Document, timeline: Timeline) -> TimelineId {
        let id = TimelineId::new();

        if timeline.overwrite && !timeline.scrubbed {
            let targets = timeline.targets();
            let overwritten: Vec<TimelineId> = self
                .timelines
                .iter()
                .filter(|(_, state)| !state.timeline.scrubbed)
                .filter(|(_, state)| targets.iter().any(|target| state.touches(*target)))
                .map(|(id, _)| *id)
                .collect();
            for other in overwritten {
                self.kill(other);
            }
        }

        let (starts, duration) = timeline.layout();
        let resolved = timeline
            .tweens
            .iter()
            .map(|tween| tween.targets.iter().map(|_| None).collect())
            .collect();
        let paused = timeline.paused;
        let mut state = ActiveTimeline {
            timeline,
            starts,
            duration,
            time: 0.0,
            paused,
            started: false,
            completed: false,
            resolved,
            snapshots: BTreeMap::new(),
        };

        for tween_index in 0..state.timeline.tweens.len() {
            if state.timeline.tweens[tween_index].kind == TweenKind::To {
                continue;
            }
            for target_index in 0..state.timeline.tweens[tween_index].targets.len() {
                self.resolve(doc, &mut state, tween_index, target_index);
            }
        }
        let finishes_now = !state.timeline.scrubbed && !state.paused && state.duration <= 0.0;
        // Only `to` tweens of an instantly finished timeline render now; the
        // rest wait for their first frame.
        self.render(doc, &mut state, 0.0, finishes_now);

        debug!(
            timeline = %id,
            label = state.timeline.label.as_deref().unwrap_or(""),
            duration = state.duration,
            scrubbed = state.timeline.scrubbed,
            "timeline added"
        );

        self.timelines.insert(id, state);
        if finishes_now {
            self.complete(doc, id);
        }
        id
    }

    /// Advance every playing clock-driven timeline by `dt` seconds.
    pub fn tick(&mut self, doc: &mut Document, dt: f64) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let ids: Vec<TimelineId> = self
            .timelines
            .iter()
            .filter(|(_, state)| !state.timeline.scrubbed && !state.paused && !state.completed)
            .map(|(id, _)| *id)
            .collect();

        for id in ids {
            let Some(mut state) = self.timelines.remove(&id) else {
                continue;
            };
            let time = (state.time + dt).min(state.duration);
            if !state.started && time > 0.0 {
                state.started = true;
                self.events.push(AnimationEvent::Started {
                    timeline: id,
                    label: state.timeline.label.clone(),
                });
            }
            self.render(doc, &mut state, time, true);
            let done = state.time >= state.duration;
            self.timelines.insert(id, state);
            if done {
                self.complete(doc, id);
            }
        }
    }

    /// Position a timeline at `progress` ∈ [0, 1] of its duration.
    pub fn set_progress(&mut self, doc: &mut Document, id: TimelineId, progress: f64) -> bool {
        let Some(mut state) = self.timelines.remove(&id) else {
            return false;
        };
        let progress = if progress.is_nan() { 0.0 } else { progress.clamp(0.0, 1.0) };
        let time = progress * state.duration;
        self.render(doc, &mut state, time, true);
        self.timelines.insert(id, state);
        true
    }

    pub fn pause(&mut self, id: TimelineId) -> bool {
        match self.timelines.get_mut(&id) {
            Some(state) => {
                state.paused = true;
                true
            }
            None => false,
        }
    }

    pub fn play(&mut self, id: TimelineId) -> bool {
        match self.timelines.get_mut(&id) {
            Some(state) => {
                state.paused = false;
                true
            }
            None => false,
        }
    }

    /// Remove a timeline, leaving its targets as currently rendered.
    pub fn kill(&mut self, id: TimelineId) -> bool {
        match self.timelines.remove(&id) {
            Some(state) => {
                trace!(timeline = %id, "timeline killed");
                self.events.push(AnimationEvent::Killed {
                    timeline: id,
                    label: state.timeline.label,
                });
                true
            }
            None => false,
        }
    }

    /// Remove a timeline and restore every target it touched.
    pub fn revert(&mut self, doc: &mut Document, id: TimelineId) -> bool {
        let Some(state) = self.timelines.remove(&id) else {
            return false;
        };
        for (target, snapshot) in state.snapshots {
            self.restore(doc, target, snapshot);
        }
        trace!(timeline = %id, "timeline reverted");
        self.events.push(AnimationEvent::Reverted {
            timeline: id,
            label: state.timeline.label,
        });
        true
    }

    /// Kill every clock-driven timeline animating `target`.
    ///
    /// Scrubbed timelines belong to scroll triggers and are left alone.
    pub fn kill_tweens_of(&mut self, target: NodeId) -> usize {
        let ids: Vec<TimelineId> = self
            .timelines
            .iter()
            .filter(|(_, state)| !state.timeline.scrubbed && state.touches(target))
            .map(|(id, _)| *id)
            .collect();
        for id in &ids {
            self.kill(*id);
        }
        ids.len()
    }

    /// Kill timelines whose targets have all been removed from the document.
    pub fn prune_detached(&mut self, doc: &Document) -> usize {
        let ids: Vec<TimelineId> = self
            .timelines
            .iter()
            .filter(|(_, state)| {
                let targets = state.timeline.targets();
                !targets.is_empty() && targets.iter().all(|target| !doc.contains(*target))
            })
            .map(|(id, _)| *id)
            .collect();
        for id in &ids {
            self.kill(*id);
        }
        self.transforms.retain(|target, _| doc.is_alive(*target));
        ids.len()
    }

    /// Remove inline styles from `target` immediately.
    pub fn clear_props(&mut self, doc: &mut Document, target: NodeId, clear: ClearProps) {
        if !doc.is_alive(target) {
            self.transforms.remove(&target);
            return;
        }
        match clear {
            ClearProps::All => {
                log_dom_error(target, "clear props", doc.clear_style(target));
            }
            ClearProps::Animated => {
                for key in ["transform", "opacity", "visibility"] {
                    log_dom_error(target, "clear props", doc.remove_style(target, key));
                }
            }
        }
        self.transforms.remove(&target);
    }

    /// Current rendered value of `property` on `target`.
    pub fn value(&self, doc: &Document, target: NodeId, property: Property) -> f64 {
        if property.is_transform() {
            return self
                .transforms
                .get(&target)
                .and_then(|transform| transform.get(property))
                .unwrap_or(0.0);
        }
        if property == Property::AutoAlpha && doc.style(target, "visibility") == Some("hidden") {
            return 0.0;
        }
        doc.style(target, "opacity")
            .and_then(|value| value.trim().parse::<f64>().ok())
            .unwrap_or(1.0)
    }

    fn complete(&mut self, doc: &mut Document, id: TimelineId) {
        let Some(mut state) = self.timelines.remove(&id) else {
            return;
        };
        state.completed = true;
        state.started = true;
        if let Some(clear) = state.timeline.clear_props {
            for target in state.timeline.targets() {
                self.clear_props(doc, target, clear);
            }
        }
        debug!(timeline = %id, label = state.timeline.label.as_deref().unwrap_or(""), "timeline completed");
        self.events.push(AnimationEvent::Completed {
            timeline: id,
            label: state.timeline.label.clone(),
        });
        if state.timeline.retain {
            self.timelines.insert(id, state);
        }
    }

    fn snapshot(&self, doc: &Document, target: NodeId, with_text: bool) -> Snapshot {
        Snapshot {
            styles: doc.styles(target).cloned().unwrap_or_default(),
            transform: self.transforms.get(&target).copied(),
            text: with_text.then(|| doc.text_content(target)),
        }
    }

    fn restore(&mut self, doc: &mut Document, target: NodeId, snapshot: Snapshot) {
        if !doc.is_alive(target) {
            self.transforms.remove(&target);
            return;
        }
        log_dom_error(target, "restore", doc.clear_style(target));
        for (name, value) in &snapshot.styles {
            log_dom_error(target, "restore", doc.set_style(target, name, value));
        }
        match snapshot.transform {
            Some(transform) => {
                self.transforms.insert(target, transform);
            }
            None => {
                self.transforms.remove(&target);
            }
        }
        if let Some(text) = snapshot.text {
            if doc.text_content(target) != text {
                log_dom_error(target, "restore", doc.set_text_content(target, &text));
            }
        }
    }

    fn resolve(
        &mut self,
        doc: &Document,
        state: &mut ActiveTimeline,
        tween_index: usize,
        target_index: usize,
    ) {
        if state.resolved[tween_index][target_index].is_some() {
            return;
        }
        let tween = &state.timeline.tweens[tween_index];
        let target = tween.targets[target_index];

        if !state.snapshots.contains_key(&target) {
            let with_text = state
                .timeline
                .tweens
                .iter()
                .any(|t| t.scramble.is_some() && t.targets.contains(&target));
            let snapshot = self.snapshot(doc, target, with_text);
            state.snapshots.insert(target, snapshot);
        }

        let values = tween
            .properties
            .iter()
            .map(|prop| {
                let current = self.value(doc, target, prop.property);
                let (from, to) = match tween.kind {
                    TweenKind::To | TweenKind::Set => (current, prop.to.unwrap_or(current)),
                    TweenKind::From => (prop.from.unwrap_or(current), current),
                    TweenKind::FromTo => (
                        prop.from.unwrap_or(current),
                        prop.to.unwrap_or(current),
                    ),
                };
                let from = if tween.kind == TweenKind::Set { to } else { from };
                (prop.property, from, to)
            })
            .collect();

        let scrambler = tween.scramble.as_ref().map(|track| {
            let current = doc.text_content(target);
            let destination = if track.text.is_empty() {
                current.clone()
            } else {
                track.text.clone()
            };
            self.scramblers_created += 1;
            let seed = self.seed.wrapping_add(self.scramblers_created);
            Scrambler::new(&current, &destination, &track.alphabet, track.speed, seed)
        });

        state.resolved[tween_index][target_index] = Some(ResolvedTarget {
            values,
            scrambler,
            last_progress: None,
            last_time: 0.0,
        });
    }

    /// Render every target at `time`. Unresolved tweens are skipped unless
    /// `resolve_pending` is set.
    fn render(
        &mut self,
        doc: &mut Document,
        state: &mut ActiveTimeline,
        time: f64,
        resolve_pending: bool,
    ) {
        state.time = time;
        for tween_index in 0..state.timeline.tweens.len() {
            let start = state.starts[tween_index];
            let (duration, stagger, ease, target_count) = {
                let tween = &state.timeline.tweens[tween_index];
                (tween.duration, tween.stagger, tween.ease, tween.targets.len())
            };
            for target_index in 0..target_count {
                let local = time - (start + target_index as f64 * stagger);
                let pending = state.resolved[tween_index][target_index].is_none();
                if pending && (local < 0.0 || !resolve_pending) {
                    continue;
                }
                self.resolve(doc, state, tween_index, target_index);

                let target = state.timeline.tweens[tween_index].targets[target_index];
                let linear = if duration <= 0.0 {
                    if local >= 0.0 { 1.0 } else { 0.0 }
                } else {
                    (local / duration).clamp(0.0, 1.0)
                };
                let eased = if linear >= 1.0 { 1.0 } else { ease.evaluate(linear) };

                let Some(resolved) = state.resolved[tween_index][target_index].as_mut() else {
                    continue;
                };
                if resolved.last_progress == Some(linear) {
                    continue;
                }
                resolved.last_progress = Some(linear);
                let dt = (time - resolved.last_time).abs();
                resolved.last_time = time;

                if !doc.is_alive(target) {
                    continue;
                }
                let values = resolved.values.clone();
                let text = resolved
                    .scrambler
                    .as_mut()
                    .map(|scrambler| scrambler.render(eased, dt));
                for (property, from, to) in values {
                    self.apply(doc, target, property, from + (to - from) * eased);
                }
                if let Some(text) = text {
                    if doc.text_content(target) != text {
                        log_dom_error(target, "scramble", doc.set_text_content(target, &text));
                    }
                }
            }
        }
    }

    fn apply(&mut self, doc: &mut Document, target: NodeId, property: Property, value: f64) {
        let value = round(value);
        if property.is_transform() {
            let transform = self.transforms.entry(target).or_default();
            transform.set(property, value);
            let css = transform.to_css();
            log_dom_error(target, "apply", doc.set_style(target, "transform", &css));
            return;
        }
        log_dom_error(target, "apply", doc.set_style(target, "opacity", &value.to_string()));
        if property == Property::AutoAlpha {
            let visibility = if value <= 0.0 { "hidden" } else { "inherit" };
            log_dom_error(target, "apply", doc.set_style(target, "visibility", visibility));
        }
    }
}

/// Style and text writes only fail on targets that left the document
/// mid-frame; the frame goes on without them.
fn log_dom_error<T>(target: NodeId, step: &'static str, result: Result<T, DomError>) {
    if let Err(err) = result {
        debug!(%target, step, error = %err, "document write skipped");
    }
}

fn round(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::Ease;
    use crate::timeline::{ScrambleTrack, Tween};
    use kinetic_text::Alphabet;

    fn doc_with(count: usize) -> (Document, Vec<NodeId>) {
        let mut doc = Document::new();
        let nodes = (0..count)
            .map(|_| {
                let el = doc.create_element("div");
                doc.append_child(doc.root(), el).unwrap();
                el
            })
            .collect();
        (doc, nodes)
    }

    #[test]
    fn test_to_tween_reaches_destination_and_completes() {
        let (mut doc, nodes) = doc_with(1);
        let mut animator = Animator::new();
        let id = animator.add(
            &mut doc,
            Timeline::tween(Tween::to(nodes.clone()).prop(Property::X, 2.0).duration(1.0).ease(Ease::None)),
        );

        animator.tick(&mut doc, 0.5);
        assert!((animator.value(&doc, nodes[0], Property::X) - 1.0).abs() < 1e-6);
        animator.tick(&mut doc, 0.6);
        assert_eq!(animator.value(&doc, nodes[0], Property::X), 2.0);
        assert!(!animator.is_active(id));

        let events = animator.drain_events();
        assert!(matches!(events[0], AnimationEvent::Started { .. }));
        assert!(matches!(events[1], AnimationEvent::Completed { .. }));
    }

    #[test]
    fn test_from_renders_immediately() {
        let (mut doc, nodes) = doc_with(3);
        let mut animator = Animator::new();
        animator.add(
            &mut doc,
            Timeline::tween(
                Tween::from(nodes.clone())
                    .prop(Property::AutoAlpha, 0.2)
                    .stagger(0.1)
                    .ease(Ease::None),
            )
            .scrubbed(),
        );
        for node in &nodes {
            assert_eq!(doc.style(*node, "opacity"), Some("0.2"));
            assert_eq!(doc.style(*node, "visibility"), Some("inherit"));
        }
    }

    #[test]
    fn test_scrubbed_progress_is_exact() {
        let (mut doc, nodes) = doc_with(1);
        let mut animator = Animator::new();
        let id = animator.add(
            &mut doc,
            Timeline::tween(
                Tween::from_to(nodes.clone())
                    .range(Property::YPercent, 20.0, -20.0)
                    .ease(Ease::None),
            )
            .scrubbed(),
        );
        assert_eq!(animator.value(&doc, nodes[0], Property::YPercent), 20.0);

        animator.tick(&mut doc, 10.0);
        assert_eq!(animator.value(&doc, nodes[0], Property::YPercent), 20.0);

        animator.set_progress(&mut doc, id, 0.5);
        assert_eq!(animator.value(&doc, nodes[0], Property::YPercent), 0.0);
        animator.set_progress(&mut doc, id, 1.0);
        assert_eq!(animator.value(&doc, nodes[0], Property::YPercent), -20.0);
        animator.set_progress(&mut doc, id, 0.0);
        assert_eq!(animator.value(&doc, nodes[0], Property::YPercent), 20.0);
    }

    #[test]
    fn test_revert_restores_styles() {
        let (mut doc, nodes) = doc_with(1);
        doc.set_style(nodes[0], "color", "red").unwrap();
        let mut animator = Animator::new();
        let id = animator.add(
            &mut doc,
            Timeline::tween(Tween::from(nodes.clone()).prop(Property::Opacity, 0.0)).scrubbed(),
        );
        assert_eq!(doc.style(nodes[0], "opacity"), Some("0"));

        assert!(animator.revert(&mut doc, id));
        assert_eq!(doc.style(nodes[0], "opacity"), None);
        assert_eq!(doc.style(nodes[0], "color"), Some("red"));
        assert!(!animator.revert(&mut doc, id));
    }

    #[test]
    fn test_overwrite_kills_previous_tweens() {
        let (mut doc, nodes) = doc_with(1);
        let mut animator = Animator::new();
        let first = animator.add(
            &mut doc,
            Timeline::tween(Tween::to(nodes.clone()).prop(Property::X, 1.0).duration(1.0)),
        );
        let second = animator.add(
            &mut doc,
            Timeline::tween(Tween::to(nodes.clone()).prop(Property::X, 2.0).duration(1.0))
                .overwrite(),
        );
        assert!(!animator.is_active(first));
        assert!(animator.is_active(second));
    }

    #[test]
    fn test_clear_props_on_complete() {
        let (mut doc, nodes) = doc_with(1);
        let mut animator = Animator::new();
        animator.add(
            &mut doc,
            Timeline::tween(
                Tween::to(nodes.clone())
                    .prop(Property::X, 0.0)
                    .prop(Property::Y, 0.0)
                    .duration(0.5),
            )
            .clear_props(ClearProps::All),
        );
        animator.tick(&mut doc, 0.25);
        assert!(doc.style(nodes[0], "transform").is_some());
        animator.tick(&mut doc, 0.5);
        assert_eq!(doc.style(nodes[0], "transform"), None);
        assert_eq!(animator.value(&doc, nodes[0], Property::X), 0.0);
    }

    #[test]
    fn test_kill_tweens_of_spares_scrubbed() {
        let (mut doc, nodes) = doc_with(1);
        let mut animator = Animator::new();
        let scrubbed = animator.add(
            &mut doc,
            Timeline::tween(Tween::from_to(nodes.clone()).range(Property::YPercent, 10.0, -10.0))
                .scrubbed(),
        );
        animator.add(
            &mut doc,
            Timeline::tween(Tween::to(nodes.clone()).prop(Property::X, 1.0)),
        );
        assert_eq!(animator.kill_tweens_of(nodes[0]), 1);
        assert!(animator.is_active(scrubbed));
    }

    #[test]
    fn test_scramble_track_settles_on_text() {
        let (mut doc, nodes) = doc_with(1);
        doc.set_text_content(nodes[0], "Kinetic").unwrap();
        let mut animator = Animator::with_seed(5);
        animator.add(
            &mut doc,
            Timeline::tween(
                Tween::to(nodes.clone())
                    .duration(1.0)
                    .scramble(ScrambleTrack::new("", Alphabet::UpperCase, 0.85)),
            ),
        );
        animator.tick(&mut doc, 0.3);
        assert_eq!(doc.text_content(nodes[0]).chars().count(), 7);
        animator.tick(&mut doc, 1.0);
        assert_eq!(doc.text_content(nodes[0]), "Kinetic");
    }

    #[test]
    fn test_paused_timeline_does_not_advance() {
        let (mut doc, nodes) = doc_with(1);
        let mut animator = Animator::new();
        let id = animator.add(
            &mut doc,
            Timeline::tween(Tween::to(nodes.clone()).prop(Property::X, 1.0).duration(1.0)).paused(),
        );
        animator.tick(&mut doc, 0.5);
        assert_eq!(animator.progress(id), Some(0.0));
        animator.play(id);
        animator.tick(&mut doc, 0.5);
        assert_eq!(animator.progress(id), Some(0.5));
    }

    #[test]
    fn test_to_tween_waits_for_first_frame() {
        let (mut doc, nodes) = doc_with(1);
        doc.set_text_content(nodes[0], "Hello").unwrap();
        let mut animator = Animator::new();
        let id = animator.add(
            &mut doc,
            Timeline::tween(
                Tween::to(nodes.clone())
                    .duration(1.0)
                    .scramble(ScrambleTrack::new("", Alphabet::UpperCase, 0.95)),
            )
            .paused(),
        );
        assert_eq!(doc.text_content(nodes[0]), "Hello");
        animator.tick(&mut doc, 0.5);
        assert_eq!(doc.text_content(nodes[0]), "Hello");

        animator.play(id);
        animator.tick(&mut doc, 2.0);
        assert_eq!(doc.text_content(nodes[0]), "Hello");
        assert!(!animator.is_active(id));
    }

    #[test]
    fn test_prune_detached() {
        let (mut doc, nodes) = doc_with(2);
        let mut animator = Animator::new();
        let gone = animator.add(
            &mut doc,
            Timeline::tween(Tween::from(vec![nodes[0]]).prop(Property::Opacity, 0.0)).scrubbed(),
        );
        let kept = animator.add(
            &mut doc,
            Timeline::tween(Tween::from(vec![nodes[1]]).prop(Property::Opacity, 0.0)).scrubbed(),
        );
        doc.remove(nodes[0]).unwrap();
        assert_eq!(animator.prune_detached(&doc), 1);
        assert!(!animator.is_active(gone));
        assert!(animator.is_active(kept));
    }

    #[test]
    fn test_unstylable_target_does_not_stop_the_frame() {
        let (mut doc, nodes) = doc_with(1);
        let text = doc.create_text("loose");
        doc.append_child(doc.root(), text).unwrap();
        let mut animator = Animator::new();
        let id = animator.add(
            &mut doc,
            Timeline::tween(
                Tween::to(vec![text, nodes[0]])
                    .prop(Property::Opacity, 0.0)
                    .duration(1.0)
                    .ease(Ease::None),
            ),
        );
        animator.tick(&mut doc, 0.5);
        assert_eq!(doc.style(nodes[0], "opacity"), Some("0.5"));
        assert!(animator.revert(&mut doc, id));
        assert_eq!(doc.style(nodes[0], "opacity"), None);
        assert_eq!(doc.text_content(text), "loose");
    }
}
