//! Scramble-text reveals.
//!
//! Three variants share the `data-scramble-initialized` marker:
//! - `[data-scramble="load"]`: words scramble into place as soon as the
//!   builder runs
//! - `[data-scramble="scroll"]`: the same, held paused until the element's
//!   top crosses the viewport bottom, once; `data-scramble-alt` swaps the
//!   noise alphabet for block glyphs
//! - `[data-scramble-hover="link"]`: while the pointer is over the link, its
//!   `[data-scramble-hover="target"]` child shows a scrambling overlay that
//!   settles on `data-scramble-text` (or the original text)
//!
//! Load and scroll registrations settle once their timeline completes: the
//! split is reverted but the marker stays, so the element is never wired
//! twice.
//!
//! Load and scroll reveals take `data-scramble-chars` (`upperCase`,
//! `lowerCase` or the literal glyphs to draw noise from) and a positive
//! `data-scramble-speed` in place of their defaults.

use kinetic_anim::{Property, ScrambleTrack, Timeline, TimelineId, TriggerPosition, TriggerSpec, Tween};
use kinetic_dom::{Document, NodeId, PointerEvent, PointerKind, Selector};
use kinetic_text::{Alphabet, DEFAULT_HOVER_ALPHABET, SplitOptions, SplitText};
use tracing::{debug, trace};

use super::{BuildContext, Effect, EffectKind, PointerBinding};
use crate::attrs::AttrReader;
use crate::error::{Collaborator, EffectError};
use crate::registry::{Registration, Resource};
use crate::runtime::Runtime;
use crate::scanner::scan_untracked;
use crate::tracker::{InitTracker, MarkerAttribute};

pub const MARKER: &str = "data-scramble-initialized";

const LOAD_DURATION: f64 = 1.2;
const LOAD_STAGGER: f64 = 0.01;
const LOAD_SPEED: f64 = 0.85;

const SCROLL_DURATION: f64 = 1.4;
const SCROLL_STAGGER: f64 = 0.015;
const SCROLL_SPEED: f64 = 0.95;
const SCROLL_START: &str = "top bottom";
const ALT_ALPHABET: &str = "▯|";

const HOVER_DURATION: f64 = 1.0;
const HOVER_SPEED: f64 = 0.1;

/// Tags rendered inline by default.
const INLINE_TAGS: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "cite", "code", "em", "i", "kbd", "label", "mark", "q", "s",
    "small", "span", "strong", "sub", "sup", "time", "u",
];

#[derive(Debug)]
pub struct Scramble {
    load: Selector,
    scroll: Selector,
    links: Selector,
    targets: Selector,
    marker: MarkerAttribute,
}

impl Scramble {
    pub fn new() -> Self {
        Self {
            load: Selector::attribute_eq("data-scramble", "load"),
            scroll: Selector::attribute_eq("data-scramble", "scroll"),
            links: Selector::attribute_eq("data-scramble-hover", "link"),
            targets: Selector::attribute_eq("data-scramble-hover", "target"),
            marker: MarkerAttribute::new(MARKER),
        }
    }

    /// Mark `element` and start its registration with the marker resource.
    fn claim(
        &mut self,
        cx: &mut BuildContext<'_>,
        element: NodeId,
        variant: &'static str,
    ) -> Option<Registration> {
        if let Err(err) = self.marker.mark(cx.doc, element) {
            cx.report(EffectKind::Scramble, Some(element), &err.into());
            return None;
        }
        let mut registration = Registration::new(EffectKind::Scramble, element).variant(variant);
        registration.push(Resource::Marker {
            element,
            name: MARKER,
        });
        Some(registration)
    }

    fn finish(
        cx: &mut BuildContext<'_>,
        element: NodeId,
        mut registration: Registration,
        result: Result<(), EffectError>,
        binding: Option<PointerBinding>,
    ) -> bool {
        match result {
            Ok(()) => {
                registration.binding = binding;
                cx.registrations.add(registration);
                true
            }
            Err(err) => {
                cx.report(EffectKind::Scramble, Some(element), &err);
                registration.settle(cx.runtime, cx.doc);
                false
            }
        }
    }

    fn attach_load(
        &self,
        cx: &mut BuildContext<'_>,
        element: NodeId,
        registration: &mut Registration,
    ) -> Result<(), EffectError> {
        let track = noise_track(cx, element, Alphabet::UpperCase, LOAD_SPEED);
        let words = split_words(cx, element, registration)?;
        let timeline = Timeline::tween(
            Tween::to(words)
                .duration(LOAD_DURATION)
                .stagger(LOAD_STAGGER)
                .scramble(track),
        )
        .label("scramble-load");
        let timeline = cx.runtime.animator()?.add(cx.doc, timeline);
        registration.push(Resource::Timeline(timeline));
        Ok(())
    }

    fn attach_scroll(
        &self,
        cx: &mut BuildContext<'_>,
        element: NodeId,
        registration: &mut Registration,
    ) -> Result<(), EffectError> {
        let alphabet = if cx.doc.has_attr(element, "data-scramble-alt") {
            Alphabet::Custom(ALT_ALPHABET.to_string())
        } else {
            Alphabet::UpperCase
        };
        let start = TriggerPosition::parse(SCROLL_START).map_err(|err| {
            EffectError::MalformedAttribute {
                element,
                attribute: "data-scramble".to_string(),
                value: err.position,
                reason: err.reason,
            }
        })?;

        let track = noise_track(cx, element, alphabet, SCROLL_SPEED);
        let words = split_words(cx, element, registration)?;
        let timeline = Timeline::tween(
            Tween::to(words)
                .duration(SCROLL_DURATION)
                .stagger(SCROLL_STAGGER)
                .scramble(track),
        )
        .label("scramble-scroll")
        .paused();
        let timeline = cx.runtime.animator()?.add(cx.doc, timeline);
        registration.push(Resource::Timeline(timeline));

        let spec = TriggerSpec::new(element)
            .start(start)
            .once()
            .animation(timeline);
        let trigger = cx.runtime.observer()?.register(cx.doc, spec);
        registration.push(Resource::Trigger(trigger));
        Ok(())
    }

    fn attach_hover(
        &self,
        cx: &mut BuildContext<'_>,
        link: NodeId,
        registration: &mut Registration,
    ) -> Result<HoverBinding, EffectError> {
        let target = cx
            .doc
            .query_first_within(link, &self.targets)
            .ok_or_else(|| EffectError::MissingTarget {
                element: link,
                selector: self.targets.to_string(),
            })?;

        let original = cx.doc.text_content(target);
        let text = match cx.doc.attr(link, "data-scramble-text") {
            Some(custom) if !custom.is_empty() => custom.to_string(),
            _ => original.clone(),
        };

        if matches!(cx.doc.style(target, "position"), None | Some("static")) {
            override_style(cx.doc, registration, target, "position", "relative")?;
        }
        if is_inline(cx.doc, target) {
            override_style(cx.doc, registration, target, "display", "inline-block")?;
        }

        registration.push(Resource::Text {
            element: target,
            text: original.clone(),
        });
        cx.doc.set_text_content(target, "")?;

        let original_span = cx.doc.create_element("span");
        cx.doc.set_attr(original_span, "class", "anim-text-original")?;
        cx.doc.set_style(original_span, "display", "inline-block")?;
        cx.doc.set_text_content(original_span, &original)?;
        cx.doc.append_child(target, original_span)?;

        let overlay_span = cx.doc.create_element("span");
        cx.doc.set_attr(overlay_span, "class", "anim-text")?;
        for (name, value) in [
            ("position", "absolute"),
            ("top", "0"),
            ("left", "0"),
            ("display", "inline-block"),
            ("pointer-events", "none"),
            ("opacity", "0"),
        ] {
            cx.doc.set_style(overlay_span, name, value)?;
        }
        cx.doc.append_child(target, overlay_span)?;

        for kind in [PointerKind::Enter, PointerKind::Leave] {
            let listener = cx.doc.listen(link, kind)?;
            registration.push(Resource::Listener(listener));
        }

        Ok(HoverBinding {
            original: original_span,
            overlay: overlay_span,
            text,
            timeline: None,
        })
    }
}

impl Default for Scramble {
    fn default() -> Self {
        Self::new()
    }
}

/// Scramble track for a load or scroll reveal, with the element's
/// `data-scramble-chars` and `data-scramble-speed` over the defaults.
fn noise_track(
    cx: &mut BuildContext<'_>,
    element: NodeId,
    alphabet: Alphabet,
    speed: f64,
) -> ScrambleTrack {
    let mut reader = AttrReader::new(cx.doc, element);
    let alphabet = reader
        .string("data-scramble-chars")
        .map(Alphabet::parse)
        .unwrap_or(alphabet);
    let speed = reader
        .optional_number("data-scramble-speed")
        .filter(|speed| *speed > 0.0)
        .unwrap_or(speed);
    let errors = reader.finish();
    cx.report_all(EffectKind::Scramble, element, errors);
    trace!(%element, ?alphabet, speed, "scramble noise");
    ScrambleTrack::new("", alphabet, speed)
}

fn split_words(
    cx: &mut BuildContext<'_>,
    element: NodeId,
    registration: &mut Registration,
) -> Result<Vec<NodeId>, EffectError> {
    let splitter = cx.runtime.splitter()?;
    let words_only = SplitText::new(SplitOptions {
        chars: false,
        ..splitter.options().clone()
    });
    let split = words_only.split(cx.doc, element)?;
    let words = split.words().to_vec();
    registration.push(Resource::Split(split));
    Ok(words)
}

fn override_style(
    doc: &mut Document,
    registration: &mut Registration,
    element: NodeId,
    name: &'static str,
    value: &str,
) -> Result<(), EffectError> {
    let previous = doc.style(element, name).map(str::to_string);
    doc.set_style(element, name, value)?;
    registration.push(Resource::Style {
        element,
        name,
        previous,
    });
    Ok(())
}

fn is_inline(doc: &Document, element: NodeId) -> bool {
    match doc.style(element, "display") {
        Some(display) => display == "inline",
        None => doc
            .tag(element)
            .is_some_and(|tag| INLINE_TAGS.contains(&tag)),
    }
}

impl Effect for Scramble {
    fn kind(&self) -> EffectKind {
        EffectKind::Scramble
    }

    fn requires(&self) -> &'static [Collaborator] {
        &[Collaborator::TextSegmentation, Collaborator::Animator]
    }

    fn build(&mut self, cx: &mut BuildContext<'_>) -> usize {
        let mut created = 0;

        for element in scan_untracked(cx.doc, &self.load, &self.marker) {
            let Some(mut registration) = self.claim(cx, element, "load") else {
                continue;
            };
            let result = self.attach_load(cx, element, &mut registration);
            created += usize::from(Self::finish(cx, element, registration, result, None));
        }

        let scroll = scan_untracked(cx.doc, &self.scroll, &self.marker);
        if !scroll.is_empty() {
            match cx.runtime.require(&[Collaborator::ScrollObserver]) {
                Ok(()) => {
                    for element in scroll {
                        let Some(mut registration) = self.claim(cx, element, "scroll") else {
                            continue;
                        };
                        let result = self.attach_scroll(cx, element, &mut registration);
                        created +=
                            usize::from(Self::finish(cx, element, registration, result, None));
                    }
                }
                Err(err) => {
                    debug!(count = scroll.len(), "skipping scroll scrambles");
                    cx.report(EffectKind::Scramble, None, &err);
                }
            }
        }

        for link in scan_untracked(cx.doc, &self.links, &self.marker) {
            let Some(mut registration) = self.claim(cx, link, "hover") else {
                continue;
            };
            let (result, binding) = match self.attach_hover(cx, link, &mut registration) {
                Ok(binding) => (Ok(()), Some(PointerBinding::Hover(binding))),
                Err(err) => (Err(err), None),
            };
            created += usize::from(Self::finish(cx, link, registration, result, binding));
        }

        created
    }
}

/// Pointer state of one hover-scramble link.
#[derive(Debug)]
pub struct HoverBinding {
    original: NodeId,
    overlay: NodeId,
    text: String,
    timeline: Option<TimelineId>,
}

impl HoverBinding {
    pub fn timeline(&self) -> Option<TimelineId> {
        self.timeline
    }

    pub fn handle(
        &mut self,
        runtime: &mut Runtime,
        doc: &mut Document,
        event: &PointerEvent,
    ) -> Result<(), EffectError> {
        let animator = runtime.animator()?;
        match event.kind {
            PointerKind::Enter => {
                if let Some(previous) = self.timeline.take() {
                    animator.revert(doc, previous);
                }
                let timeline = Timeline::new()
                    .label("scramble-hover")
                    .retain()
                    .add(Tween::set(vec![self.original]).prop(Property::Opacity, 0.0).at(0.0))
                    .add(Tween::set(vec![self.overlay]).prop(Property::Opacity, 1.0).at(0.0))
                    .add(
                        Tween::to(vec![self.overlay])
                            .duration(HOVER_DURATION)
                            .scramble(ScrambleTrack::new(
                                self.text.clone(),
                                Alphabet::Custom(DEFAULT_HOVER_ALPHABET.to_string()),
                                HOVER_SPEED,
                            ))
                            .at(0.0),
                    );
                self.timeline = Some(animator.add(doc, timeline));
                trace!(overlay = %self.overlay, "hover scramble started");
            }
            PointerKind::Leave => {
                if let Some(timeline) = self.timeline.take() {
                    animator.revert(doc, timeline);
                }
            }
            PointerKind::Move => {}
        }
        Ok(())
    }

    pub fn release(mut self, runtime: &mut Runtime, doc: &mut Document) {
        if let (Some(timeline), Ok(animator)) = (self.timeline.take(), runtime.animator()) {
            animator.revert(doc, timeline);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::harness::Harness;
    use crate::error::DiagnosticKind;

    fn words(harness: &Harness, element: NodeId) -> Vec<NodeId> {
        harness
            .doc
            .query_all_within(element, &Selector::parse("div[class=\"word\"]").unwrap())
    }

    fn take_binding(harness: &mut Harness, link: NodeId) -> PointerBinding {
        let (listener, _) = harness.doc.listeners_of(link)[0];
        let registration = harness.registrations.by_listener_mut(listener).unwrap();
        registration.binding.take().unwrap()
    }

    fn hover_timeline(binding: &PointerBinding) -> Option<TimelineId> {
        match binding {
            PointerBinding::Hover(hover) => hover.timeline(),
            other => panic!("unexpected binding {other:?}"),
        }
    }

    #[test]
    fn test_load_splits_words_and_plays() {
        let mut harness = Harness::new(r#"<body><p data-scramble="load">Hello there</p></body>"#);
        let p = harness.first("p");
        assert_eq!(harness.run(&mut Scramble::new()), 1);
        assert_eq!(harness.doc.attr(p, MARKER), Some("true"));
        assert_eq!(words(&harness, p).len(), 2);

        let registration = harness.registrations.of_element(p)[0];
        assert_eq!(registration.variant, "load");
        let timeline = registration.timelines().next().unwrap();
        let animator = harness.runtime.animator().unwrap();
        animator.tick(&mut harness.doc, 5.0);
        assert!(animator.is_completed(timeline) || !animator.is_active(timeline));
        assert_eq!(harness.doc.text_content(p), "Hello there");
    }

    #[test]
    fn test_load_draws_noise_from_element_chars() {
        let mut harness = Harness::new(
            r##"<body><p data-scramble="load" data-scramble-chars="#" data-scramble-speed="2">Hello there</p></body>"##,
        );
        let p = harness.first("p");
        assert_eq!(harness.run(&mut Scramble::new()), 1);
        assert!(harness.diagnostics.is_empty());

        let animator = harness.runtime.animator().unwrap();
        animator.tick(&mut harness.doc, 0.1);
        let frame = harness.doc.text_content(p);
        assert!(frame.contains('#'), "{frame}");
        assert!(frame.chars().all(|c| "Hello there#".contains(c)), "{frame}");

        animator.tick(&mut harness.doc, 5.0);
        assert_eq!(harness.doc.text_content(p), "Hello there");
    }

    #[test]
    fn test_malformed_speed_keeps_default() {
        let mut harness = Harness::new(
            r#"<body><p data-scramble="load" data-scramble-speed="fast">Hi</p></body>"#,
        );
        assert_eq!(harness.run(&mut Scramble::new()), 1);
        assert_eq!(harness.diagnostics.count(DiagnosticKind::MalformedAttribute), 1);
    }

    #[test]
    fn test_scroll_waits_for_trigger() {
        let mut harness = Harness::new(
            r#"<body><h3 data-scramble="scroll" data-scramble-alt style="top: 2000px; height: 80px">Scroll me</h3></body>"#,
        );
        let h3 = harness.first("h3");
        assert_eq!(harness.run(&mut Scramble::new()), 1);

        let animator = harness.runtime.animator().unwrap();
        animator.tick(&mut harness.doc, 0.5);
        assert_eq!(harness.doc.text_content(h3), "Scroll me");

        let observer = harness.runtime.observer().unwrap();
        let id = observer.ids()[0];
        assert!(observer.spec(id).unwrap().once);
        assert!(!observer.spec(id).unwrap().scrub);
    }

    #[test]
    fn test_scroll_without_observer_is_skipped_unmarked() {
        let mut harness = Harness::new(
            r#"<body><p data-scramble="load">One</p><h3 data-scramble="scroll">Two</h3></body>"#,
        );
        harness.runtime = Runtime::new(&harness.config).without_scroll_observer();
        let h3 = harness.first("h3");
        assert_eq!(harness.run(&mut Scramble::new()), 1);
        assert!(!harness.doc.has_attr(h3, MARKER));
        assert_eq!(harness.doc.text_content(h3), "Two");
        assert_eq!(harness.diagnostics.count(DiagnosticKind::CollaboratorUnavailable), 1);
    }

    #[test]
    fn test_hover_builds_overlay() {
        let mut harness = Harness::new(
            r#"<body><a data-scramble-hover="link" data-scramble-text="Go!"><span data-scramble-hover="target">Home</span></a></body>"#,
        );
        let link = harness.first("a");
        let target = harness.first("[data-scramble-hover=\"target\"]");
        assert_eq!(harness.run(&mut Scramble::new()), 1);

        assert_eq!(harness.doc.style(target, "position"), Some("relative"));
        assert_eq!(harness.doc.style(target, "display"), Some("inline-block"));
        let spans = harness.doc.children(target).to_vec();
        assert_eq!(spans.len(), 2);
        assert_eq!(harness.doc.attr(spans[1], "class"), Some("anim-text"));
        assert_eq!(harness.doc.style(spans[1], "opacity"), Some("0"));
        assert_eq!(harness.doc.text_content(spans[0]), "Home");
        assert_eq!(harness.doc.text_content(spans[1]), "");
        assert_eq!(harness.doc.text_content(target), "Home");
        assert_eq!(harness.doc.listeners_of(link).len(), 2);
    }

    #[test]
    fn test_hover_enter_then_leave_restores() {
        let mut harness = Harness::new(
            r#"<body><a data-scramble-hover="link"><span data-scramble-hover="target">Home</span></a></body>"#,
        );
        let link = harness.first("a");
        let target = harness.first("[data-scramble-hover=\"target\"]");
        harness.run(&mut Scramble::new());
        let spans = harness.doc.children(target).to_vec();

        let mut binding = take_binding(&mut harness, link);
        binding
            .handle(&mut harness.runtime, &mut harness.doc, &PointerEvent::enter(0.0, 0.0), 0.0)
            .unwrap();
        assert!(hover_timeline(&binding).is_some());
        assert_eq!(harness.doc.style(spans[0], "opacity"), Some("0"));
        assert_eq!(harness.doc.style(spans[1], "opacity"), Some("1"));

        binding
            .handle(&mut harness.runtime, &mut harness.doc, &PointerEvent::leave(0.0, 0.0), 0.0)
            .unwrap();
        assert!(hover_timeline(&binding).is_none());
        assert_eq!(harness.doc.style(spans[0], "opacity"), None);
        assert_eq!(harness.doc.style(spans[1], "opacity"), Some("0"));
        assert_eq!(harness.doc.text_content(spans[1]), "");
        assert_eq!(harness.doc.text_content(target), "Home");
        assert!(harness.runtime.animator().unwrap().is_empty());
    }

    #[test]
    fn test_hover_release_restores_text() {
        let mut harness = Harness::new(
            r#"<body><a data-scramble-hover="link"><span data-scramble-hover="target">Home</span></a></body>"#,
        );
        let link = harness.first("a");
        let target = harness.first("[data-scramble-hover=\"target\"]");
        harness.run(&mut Scramble::new());

        harness
            .registrations
            .release_all(&mut harness.runtime, &mut harness.doc);
        assert_eq!(harness.doc.text_content(target), "Home");
        assert_eq!(harness.doc.children(target).len(), 1);
        assert_eq!(harness.doc.style(target, "position"), None);
        assert_eq!(harness.doc.style(target, "display"), None);
        assert!(harness.doc.listeners_of(link).is_empty());
        assert!(!harness.doc.has_attr(link, MARKER));
    }

    #[test]
    fn test_hover_missing_target_keeps_marker() {
        let mut harness = Harness::new(r#"<body><a data-scramble-hover="link">Home</a></body>"#);
        let link = harness.first("a");
        let mut scramble = Scramble::new();
        assert_eq!(harness.run(&mut scramble), 0);
        assert_eq!(harness.diagnostics.count(DiagnosticKind::MissingTarget), 1);
        assert_eq!(harness.doc.attr(link, MARKER), Some("true"));
        assert_eq!(harness.run(&mut scramble), 0);
        assert_eq!(harness.diagnostics.count(DiagnosticKind::MissingTarget), 1);
    }
}
