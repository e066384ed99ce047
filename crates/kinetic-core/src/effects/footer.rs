//! Footer reveal parallax.
//!
//! `[data-footer-parallax]` elements slide their required
//! `[data-footer-parallax-inner]` child in from `-25%` while the footer's top
//! edge travels from the viewport bottom to the viewport top. An optional
//! `[data-footer-parallax-dark]` overlay fades in from `0.5` alongside.

use kinetic_anim::{Ease, Property, Timeline, TriggerPosition, TriggerSpec, Tween};
use kinetic_dom::{Document, NodeId, Selector};
use tracing::debug;

use super::{BuildContext, Effect, EffectKind};
use crate::error::{Collaborator, EffectError};
use crate::registry::{Registration, Resource};
use crate::scanner::scan_untracked;
use crate::tracker::{InitTracker, WeakElementSet};

pub const INNER_FROM_Y_PERCENT: f64 = -25.0;
pub const DARK_FROM_OPACITY: f64 = 0.5;

#[derive(Debug)]
pub struct FooterParallax {
    footers: Selector,
    inner: Selector,
    dark: Selector,
    tracker: WeakElementSet,
}

impl FooterParallax {
    pub fn new() -> Self {
        Self {
            footers: Selector::attribute("data-footer-parallax"),
            inner: Selector::attribute("data-footer-parallax-inner"),
            dark: Selector::attribute("data-footer-parallax-dark"),
            tracker: WeakElementSet::new(),
        }
    }

    pub fn tracked(&self) -> usize {
        self.tracker.len()
    }

    fn wire(&mut self, cx: &mut BuildContext<'_>, footer: NodeId) -> Result<(), EffectError> {
        let inner = cx
            .doc
            .query_first_within(footer, &self.inner)
            .ok_or_else(|| EffectError::MissingTarget {
                element: footer,
                selector: self.inner.to_string(),
            })?;
        let dark = cx.doc.query_first_within(footer, &self.dark);

        let stale = cx.runtime.observer()?.kill_by_element(footer);
        if !stale.is_empty() {
            debug!(element = %footer, count = stale.len(), "killed existing footer triggers");
        }

        let mut timeline = Timeline::new().label("footer-parallax").scrubbed().add(
            Tween::from(vec![inner])
                .prop(Property::YPercent, INNER_FROM_Y_PERCENT)
                .ease(Ease::None),
        );
        if let Some(dark) = dark {
            timeline = timeline.add(
                Tween::from(vec![dark])
                    .prop(Property::Opacity, DARK_FROM_OPACITY)
                    .ease(Ease::None)
                    .with_previous(),
            );
        }
        let timeline = cx.runtime.animator()?.add(cx.doc, timeline);
        let spec = TriggerSpec::new(footer)
            .start(position(footer, "clamp(top bottom)")?)
            .end(position(footer, "clamp(top top)")?)
            .scrub()
            .animation(timeline);
        let trigger = cx.runtime.observer()?.register(cx.doc, spec);

        let mut registration = Registration::new(EffectKind::FooterParallax, footer);
        registration.push(Resource::Timeline(timeline));
        registration.push(Resource::Trigger(trigger));
        cx.registrations.add(registration);
        self.tracker.mark(cx.doc, footer)?;
        Ok(())
    }
}

impl Default for FooterParallax {
    fn default() -> Self {
        Self::new()
    }
}

fn position(footer: NodeId, source: &str) -> Result<TriggerPosition, EffectError> {
    TriggerPosition::parse(source).map_err(|err| EffectError::MalformedAttribute {
        element: footer,
        attribute: "data-footer-parallax".to_string(),
        value: err.position,
        reason: err.reason,
    })
}

impl Effect for FooterParallax {
    fn kind(&self) -> EffectKind {
        EffectKind::FooterParallax
    }

    fn requires(&self) -> &'static [Collaborator] {
        &[Collaborator::Animator, Collaborator::ScrollObserver]
    }

    fn build(&mut self, cx: &mut BuildContext<'_>) -> usize {
        let candidates = scan_untracked(cx.doc, &self.footers, &self.tracker);
        if candidates.is_empty() {
            return 0;
        }
        let mut created = 0;
        for footer in candidates {
            match self.wire(cx, footer) {
                Ok(()) => created += 1,
                Err(err) => cx.report(EffectKind::FooterParallax, Some(footer), &err),
            }
        }
        if let Ok(observer) = cx.runtime.observer() {
            observer.refresh(cx.doc);
        }
        created
    }

    fn prune(&mut self, doc: &Document) {
        self.tracker.prune(doc);
    }

    fn reset(&mut self) {
        self.tracker.clear();
    }
}
