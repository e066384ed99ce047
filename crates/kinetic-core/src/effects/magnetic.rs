//! Magnetic pointer pull.
//!
//! `[data-magnetic-strength]` elements lean toward the pointer while it moves
//! over them and spring back when it leaves. An optional nested
//! `[data-magnetic-inner-target]` follows with its own strength
//! (`data-magnetic-strength-inner`) and a slower settle. The effect is only
//! wired on viewports at least `magnetic.min_viewport_width` wide.
//!
//! # Usage
//!
//! ```ignore
//! // the engine routes pointer events to the registration's binding
//! binding.handle(&mut runtime, &mut doc, &PointerEvent::moved(640.0, 300.0), scroll)?;
//! ```

use kinetic_anim::{ClearProps, Ease, EaseDirection, Property, Timeline, Tween};
use kinetic_dom::{Document, NodeId, PointerEvent, PointerKind, Selector};
use tracing::debug;

use super::{BuildContext, Effect, EffectKind, PointerBinding};
use crate::attrs::parse_leading_float;
use crate::error::{Collaborator, EffectError};
use crate::registry::{Registration, Resource};
use crate::runtime::Runtime;
use crate::scanner::scan_untracked;
use crate::tracker::{InitTracker, WeakElementSet};

pub const DEFAULT_STRENGTH: f64 = 25.0;

const FOLLOW_DURATION: f64 = 1.6;
const INNER_FOLLOW_DURATION: f64 = 2.0;
const FOLLOW_EASE: Ease = Ease::power(4, EaseDirection::Out);
const RELEASE_EASE: Ease = Ease::elastic_out(1.0, 0.3);
/// Keeps the transform on its own compositing layer.
const ROTATE_NUDGE: f64 = 0.001;

#[derive(Debug)]
pub struct Magnetic {
    selector: Selector,
    inner: Selector,
    tracker: WeakElementSet,
}

impl Magnetic {
    pub fn new() -> Self {
        Self {
            selector: Selector::attribute("data-magnetic-strength"),
            inner: Selector::attribute("data-magnetic-inner-target"),
            tracker: WeakElementSet::new(),
        }
    }

    pub fn tracked(&self) -> usize {
        self.tracker.len()
    }

    fn wire(&mut self, cx: &mut BuildContext<'_>, magnet: NodeId) -> Result<(), EffectError> {
        let inner = cx.doc.query_first_within(magnet, &self.inner);
        let mut registration = Registration::new(EffectKind::Magnetic, magnet);
        registration.push(Resource::Tweens(magnet));
        if let Some(inner) = inner {
            registration.push(Resource::Tweens(inner));
        }
        for kind in [PointerKind::Enter, PointerKind::Move, PointerKind::Leave] {
            match cx.doc.listen(magnet, kind) {
                Ok(listener) => registration.push(Resource::Listener(listener)),
                Err(err) => {
                    registration.release(cx.runtime, cx.doc);
                    return Err(err.into());
                }
            }
        }
        registration.binding = Some(PointerBinding::Magnetic(MagneticBinding { magnet, inner }));
        cx.registrations.add(registration);
        self.tracker.mark(cx.doc, magnet)?;
        Ok(())
    }
}

impl Default for Magnetic {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for Magnetic {
    fn kind(&self) -> EffectKind {
        EffectKind::Magnetic
    }

    fn requires(&self) -> &'static [Collaborator] {
        &[Collaborator::Animator]
    }

    fn build(&mut self, cx: &mut BuildContext<'_>) -> usize {
        let width = cx.doc.viewport().width;
        if width < cx.config.magnetic.min_viewport_width {
            debug!(width, "viewport too narrow for magnetic effect");
            return 0;
        }
        let mut created = 0;
        for magnet in scan_untracked(cx.doc, &self.selector, &self.tracker) {
            match self.wire(cx, magnet) {
                Ok(()) => created += 1,
                Err(err) => cx.report(EffectKind::Magnetic, Some(magnet), &err),
            }
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

/// Pointer state of one magnetic element.
#[derive(Debug, Clone, Copy)]
pub struct MagneticBinding {
    magnet: NodeId,
    inner: Option<NodeId>,
}

impl MagneticBinding {
    pub fn magnet(&self) -> NodeId {
        self.magnet
    }

    pub fn inner(&self) -> Option<NodeId> {
        self.inner
    }

    /// React to a pointer event. `scroll` converts the magnet's document
    /// rect to client coordinates.
    pub fn handle(
        &self,
        runtime: &mut Runtime,
        doc: &mut Document,
        event: &PointerEvent,
        scroll: f64,
    ) -> Result<(), EffectError> {
        let animator = runtime.animator()?;
        match event.kind {
            PointerKind::Enter => {
                for target in self.targets() {
                    animator.kill_tweens_of(target);
                    animator.clear_props(doc, target, ClearProps::All);
                }
            }
            PointerKind::Move => {
                let outer = strength(doc.attr(self.magnet, "data-magnetic-strength"))
                    .unwrap_or(DEFAULT_STRENGTH);
                let inner_strength =
                    strength(doc.attr(self.magnet, "data-magnetic-strength-inner")).unwrap_or(outer);

                let rect = doc.rect(self.magnet);
                let rel_x = relative(event.client_x - rect.x, rect.width);
                let rel_y = relative(event.client_y - (rect.y - scroll), rect.height);

                animator.add(
                    doc,
                    follow(self.magnet, rel_x, rel_y, outer, FOLLOW_DURATION),
                );
                if let Some(inner) = self.inner {
                    animator.add(
                        doc,
                        follow(inner, rel_x, rel_y, inner_strength, INNER_FOLLOW_DURATION),
                    );
                }
            }
            PointerKind::Leave => {
                animator.add(doc, release(self.magnet, FOLLOW_DURATION));
                if let Some(inner) = self.inner {
                    animator.add(doc, release(inner, INNER_FOLLOW_DURATION));
                }
            }
        }
        Ok(())
    }

    fn targets(&self) -> impl Iterator<Item = NodeId> {
        std::iter::once(self.magnet).chain(self.inner)
    }
}

/// Zero and unparsable strengths fall back to the default.
fn strength(raw: Option<&str>) -> Option<f64> {
    raw.and_then(parse_leading_float).filter(|value| *value != 0.0)
}

fn relative(offset: f64, extent: f64) -> f64 {
    if extent <= 0.0 {
        return 0.5;
    }
    (offset / extent).clamp(0.0, 1.0)
}

fn follow(target: NodeId, rel_x: f64, rel_y: f64, strength: f64, duration: f64) -> Timeline {
    Timeline::tween(
        Tween::to(vec![target])
            .prop(Property::X, (rel_x - 0.5) * strength / 16.0)
            .prop(Property::Y, (rel_y - 0.5) * strength / 16.0)
            .prop(Property::Rotate, ROTATE_NUDGE)
            .duration(duration)
            .ease(FOLLOW_EASE),
    )
    .label("magnetic-follow")
    .overwrite()
}

fn release(target: NodeId, duration: f64) -> Timeline {
    Timeline::tween(
        Tween::to(vec![target])
            .prop(Property::X, 0.0)
            .prop(Property::Y, 0.0)
            .duration(duration)
            .ease(RELEASE_EASE),
    )
    .label("magnetic-release")
    .clear_props(ClearProps::All)
    .overwrite()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::harness::Harness;

    const PAGE: &str = r#"<body>
        <a data-magnetic-strength="32" data-magnetic-strength-inner="16"
           style="top: 1000px; left: 100px; width: 200px; height: 100px">
            <span data-magnetic-inner-target>Contact</span>
        </a>
    </body>"#;

    fn binding(harness: &Harness, magnet: NodeId) -> MagneticBinding {
        let registration = harness.registrations.of_element(magnet)[0];
        match registration.binding.as_ref() {
            Some(PointerBinding::Magnetic(binding)) => *binding,
            other => panic!("unexpected binding {other:?}"),
        }
    }

    #[test]
    fn test_wires_on_desktop_only() {
        let mut narrow = Harness::new(PAGE).with_viewport(800.0, 900.0);
        assert_eq!(narrow.run(&mut Magnetic::new()), 0);
        assert_eq!(narrow.doc.listener_count(), 0);

        let mut wide = Harness::new(PAGE).with_viewport(1440.0, 900.0);
        let mut magnetic = Magnetic::new();
        assert_eq!(wide.run(&mut magnetic), 1);
        assert_eq!(wide.doc.listener_count(), 3);
        assert_eq!(wide.run(&mut magnetic), 0);
        assert_eq!(magnetic.tracked(), 1);
    }

    #[test]
    fn test_move_pulls_toward_pointer() {
        let mut harness = Harness::new(PAGE);
        let magnet = harness.first("a");
        let inner = harness.first("span");
        harness.run(&mut Magnetic::new());
        let binding = binding(&harness, magnet);

        // scrolled 900px: the magnet's client top is 100; pointer at its right edge, bottom quarter
        binding
            .handle(
                &mut harness.runtime,
                &mut harness.doc,
                &PointerEvent::moved(300.0, 175.0),
                900.0,
            )
            .unwrap();
        let animator = harness.runtime.animator().unwrap();
        animator.tick(&mut harness.doc, 5.0);
        assert!((animator.value(&harness.doc, magnet, Property::X) - 1.0).abs() < 1e-6);
        assert!((animator.value(&harness.doc, magnet, Property::Y) - 0.5).abs() < 1e-6);
        assert!((animator.value(&harness.doc, inner, Property::X) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_inner_strength_defaults_to_outer() {
        let mut harness = Harness::new(
            r#"<body>
                <a data-magnetic-strength="32" style="top: 0px; left: 0px; width: 200px; height: 100px">
                    <span data-magnetic-inner-target>Go</span>
                </a>
            </body>"#,
        );
        let magnet = harness.first("a");
        let inner = harness.first("span");
        harness.run(&mut Magnetic::new());
        let binding = binding(&harness, magnet);

        binding
            .handle(
                &mut harness.runtime,
                &mut harness.doc,
                &PointerEvent::moved(200.0, 50.0),
                0.0,
            )
            .unwrap();
        let animator = harness.runtime.animator().unwrap();
        animator.tick(&mut harness.doc, 5.0);
        assert!((animator.value(&harness.doc, magnet, Property::X) - 1.0).abs() < 1e-6);
        assert!((animator.value(&harness.doc, inner, Property::X) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_new_move_overwrites_previous() {
        let mut harness = Harness::new(PAGE);
        let magnet = harness.first("a");
        harness.run(&mut Magnetic::new());
        let binding = binding(&harness, magnet);

        for x in [120.0, 280.0] {
            binding
                .handle(
                    &mut harness.runtime,
                    &mut harness.doc,
                    &PointerEvent::moved(x, 1050.0),
                    0.0,
                )
                .unwrap();
        }
        let animator = harness.runtime.animator().unwrap();
        assert_eq!(animator.timelines_of(magnet).len(), 1);
    }

    #[test]
    fn test_leave_springs_back_and_clears() {
        let mut harness = Harness::new(PAGE);
        let magnet = harness.first("a");
        harness.run(&mut Magnetic::new());
        let binding = binding(&harness, magnet);

        for event in [
            PointerEvent::enter(200.0, 1050.0),
            PointerEvent::moved(290.0, 1090.0),
        ] {
            binding
                .handle(&mut harness.runtime, &mut harness.doc, &event, 0.0)
                .unwrap();
        }
        harness.runtime.animator().unwrap().tick(&mut harness.doc, 0.4);
        assert!(harness.doc.style(magnet, "transform").is_some());

        binding
            .handle(
                &mut harness.runtime,
                &mut harness.doc,
                &PointerEvent::leave(400.0, 1090.0),
                0.0,
            )
            .unwrap();
        let animator = harness.runtime.animator().unwrap();
        animator.tick(&mut harness.doc, 3.0);
        assert_eq!(harness.doc.style(magnet, "transform"), None);
        assert_eq!(animator.value(&harness.doc, magnet, Property::X), 0.0);
    }

    #[test]
    fn test_zero_strength_uses_default() {
        assert_eq!(strength(Some("0")), None);
        assert_eq!(strength(Some("abc")), None);
        assert_eq!(strength(Some("40px")), Some(40.0));
        assert_eq!(strength(None), None);
    }
}
