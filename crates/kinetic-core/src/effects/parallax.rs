//! Scroll-scrubbed parallax.
//!
//! Every `[data-parallax="trigger"]` element gets one scrubbed timeline moving
//! its target (the trigger itself, or a nested `[data-parallax="target"]`)
//! between two percentage offsets while the trigger crosses the viewport.
//! Builds always happen inside the breakpoint context, which reverts the
//! previous build first, so the builder itself keeps no tracker state.
//!
//! Attributes (all optional):
//! - `data-parallax-disable`: `mobile`, `mobileLandscape` or `tablet`
//! - `data-parallax-direction`: `vertical` (default) or `horizontal`
//! - `data-parallax-start` / `data-parallax-end`: percent, default `20` / `-20`
//! - `data-parallax-scroll-start` / `-scroll-end`: trigger positions, default
//!   `top bottom` / `bottom top`, always clamped to the scrollable extent
//! - `data-parallax-opacity-start` / `-opacity-end`: animate opacity too; a
//!   missing side defaults to `1`

use kinetic_anim::{Conditions, Ease, Property, Timeline, TriggerPosition, TriggerSpec, Tween};
use kinetic_dom::{Document, NodeId, Selector};
use tracing::debug;

use super::{BuildContext, Effect, EffectKind};
use crate::attrs::AttrReader;
use crate::error::{Collaborator, EffectError};
use crate::registry::{Registration, Resource};
use crate::scanner::scan;

pub const DEFAULT_START: f64 = 20.0;
pub const DEFAULT_END: f64 = -20.0;
pub const DEFAULT_SCROLL_START: &str = "top bottom";
pub const DEFAULT_SCROLL_END: &str = "bottom top";

/// Disable values and the breakpoint condition each one names.
const DISABLE_CONDITIONS: [(&str, &str); 3] = [
    ("mobile", "mobile"),
    ("mobileLandscape", "mobileLandscape"),
    ("tablet", "tablet"),
];

#[derive(Debug)]
pub struct Parallax {
    triggers: Selector,
    targets: Selector,
}

#[derive(Debug, Clone, PartialEq)]
struct Params {
    disable: Option<String>,
    target: NodeId,
    property: Property,
    start: f64,
    end: f64,
    scroll_start: TriggerPosition,
    scroll_end: TriggerPosition,
    opacity: Option<(f64, f64)>,
}

impl Parallax {
    pub fn new() -> Self {
        Self {
            triggers: Selector::attribute_eq("data-parallax", "trigger"),
            targets: Selector::attribute_eq("data-parallax", "target"),
        }
    }

    fn read(&self, doc: &Document, trigger: NodeId) -> Result<(Params, Vec<EffectError>), EffectError> {
        let mut reader = AttrReader::new(doc, trigger);
        let property = match reader.string("data-parallax-direction") {
            Some("horizontal") => Property::XPercent,
            _ => Property::YPercent,
        };
        let start = reader.number("data-parallax-start", DEFAULT_START);
        let end = reader.number("data-parallax-end", DEFAULT_END);
        let scroll_start = reader.position("data-parallax-scroll-start", DEFAULT_SCROLL_START, true)?;
        let scroll_end = reader.position("data-parallax-scroll-end", DEFAULT_SCROLL_END, true)?;
        let opacity = if reader.has("data-parallax-opacity-start")
            || reader.has("data-parallax-opacity-end")
        {
            Some((
                reader.number("data-parallax-opacity-start", 1.0),
                reader.number("data-parallax-opacity-end", 1.0),
            ))
        } else {
            None
        };
        let params = Params {
            disable: reader.string("data-parallax-disable").map(str::to_string),
            target: doc
                .query_first_within(trigger, &self.targets)
                .unwrap_or(trigger),
            property,
            start,
            end,
            scroll_start,
            scroll_end,
            opacity,
        };
        Ok((params, reader.finish()))
    }

    fn wire(&self, cx: &mut BuildContext<'_>, trigger: NodeId) -> Result<bool, EffectError> {
        let (params, errors) = self.read(cx.doc, trigger)?;
        cx.report_all(EffectKind::Parallax, trigger, errors);

        if is_disabled(params.disable.as_deref(), cx.conditions) {
            debug!(element = %trigger, disable = ?params.disable, "parallax disabled at this breakpoint");
            return Ok(false);
        }

        cx.registrations
            .release_element(cx.runtime, cx.doc, EffectKind::Parallax, trigger);

        let mut tween = Tween::from_to(vec![params.target])
            .range(params.property, params.start, params.end)
            .ease(Ease::None);
        if let Some((from, to)) = params.opacity {
            tween = tween.range(Property::Opacity, from, to);
        }
        let timeline = cx
            .runtime
            .animator()?
            .add(cx.doc, Timeline::tween(tween).label("parallax").scrubbed());
        let spec = TriggerSpec::new(trigger)
            .start(params.scroll_start)
            .end(params.scroll_end)
            .scrub()
            .animation(timeline);
        let observer = cx.runtime.observer()?;
        let id = observer.register(cx.doc, spec);

        let mut registration = Registration::new(EffectKind::Parallax, trigger);
        registration.push(Resource::Timeline(timeline));
        registration.push(Resource::Trigger(id));
        cx.registrations.add(registration);
        Ok(true)
    }
}

impl Default for Parallax {
    fn default() -> Self {
        Self::new()
    }
}

fn is_disabled(disable: Option<&str>, conditions: Option<&Conditions>) -> bool {
    let (Some(disable), Some(conditions)) = (disable, conditions) else {
        return false;
    };
    DISABLE_CONDITIONS
        .iter()
        .any(|(value, condition)| *value == disable && conditions.get(condition))
}

impl Effect for Parallax {
    fn kind(&self) -> EffectKind {
        EffectKind::Parallax
    }

    fn requires(&self) -> &'static [Collaborator] {
        &[Collaborator::Animator, Collaborator::ScrollObserver]
    }

    fn build(&mut self, cx: &mut BuildContext<'_>) -> usize {
        let mut created = 0;
        for trigger in scan(cx.doc, &self.triggers, None) {
            match self.wire(cx, trigger) {
                Ok(true) => created += 1,
                Ok(false) => {}
                Err(err) => cx.report(EffectKind::Parallax, Some(trigger), &err),
            }
        }
        created
    }
}
