//! Declarative effect builders.
//!
//! Each builder scans the document for its marker attribute, skips elements
//! its idempotency tracker has already seen, and wires the rest into the
//! shared runtime. Everything a builder acquires for an element goes into a
//! [`Registration`](crate::registry::Registration) so it can be released
//! symmetrically.
//!
//! | Effect | Marker | Tracker |
//! |---|---|---|
//! | [`Parallax`] | `data-parallax="trigger"` | breakpoint context rebuild |
//! | [`FooterParallax`] | `data-footer-parallax` | weak element set |
//! | [`Highlight`] | `data-highlight-text` | `data-highlight-initialized` |
//! | [`Scramble`] | `data-scramble`, `data-scramble-hover="link"` | `data-scramble-initialized` |
//! | [`Magnetic`] | `data-magnetic-strength` | weak element set |

use std::fmt;

use kinetic_anim::Conditions;
use kinetic_config::KineticConfig;
use kinetic_dom::{Document, NodeId, PointerEvent};
use serde::Serialize;

use crate::error::{Collaborator, Diagnostics, EffectError};
use crate::registry::Registrations;
use crate::runtime::Runtime;

mod footer;
mod highlight;
mod magnetic;
mod parallax;
mod scramble;

pub use footer::FooterParallax;
pub use highlight::Highlight;
pub use magnetic::{Magnetic, MagneticBinding};
pub use parallax::Parallax;
pub use scramble::{HoverBinding, Scramble};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    Parallax,
    FooterParallax,
    Highlight,
    Scramble,
    Magnetic,
}

impl EffectKind {
    pub const ALL: [EffectKind; 5] = [
        EffectKind::Parallax,
        EffectKind::FooterParallax,
        EffectKind::Highlight,
        EffectKind::Scramble,
        EffectKind::Magnetic,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Parallax => "parallax",
            Self::FooterParallax => "footer-parallax",
            Self::Highlight => "highlight",
            Self::Scramble => "scramble",
            Self::Magnetic => "magnetic",
        }
    }

    /// Builders bound to scroll ranges; they wait for layout to settle.
    pub fn is_scroll_linked(self) -> bool {
        matches!(self, Self::Parallax | Self::FooterParallax)
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything a builder may touch while wiring.
pub struct BuildContext<'a> {
    pub doc: &'a mut Document,
    pub runtime: &'a mut Runtime,
    pub registrations: &'a mut Registrations,
    pub diagnostics: &'a mut Diagnostics,
    pub config: &'a KineticConfig,
    /// Breakpoint conditions, for builders run inside the breakpoint context.
    pub conditions: Option<&'a Conditions>,
}

impl BuildContext<'_> {
    pub fn report(&mut self, effect: EffectKind, element: Option<NodeId>, error: &EffectError) {
        self.diagnostics.report(effect, element, error);
    }

    pub fn report_all(&mut self, effect: EffectKind, element: NodeId, errors: Vec<EffectError>) {
        for error in errors {
            self.diagnostics.report(effect, Some(element), &error);
        }
    }
}

pub trait Effect {
    fn kind(&self) -> EffectKind;

    /// Collaborators without which the effect is skipped entirely.
    fn requires(&self) -> &'static [Collaborator];

    /// Wire every eligible element; returns how many registrations were added.
    fn build(&mut self, cx: &mut BuildContext<'_>) -> usize;

    /// Forget tracker state for elements that left the document.
    fn prune(&mut self, _doc: &Document) {}

    /// Forget all tracker state.
    fn reset(&mut self) {}
}

/// Run one builder pass, honouring server rendering and collaborator
/// availability.
pub fn run(effect: &mut dyn Effect, cx: &mut BuildContext<'_>) -> usize {
    if cx.doc.is_server() {
        return 0;
    }
    if let Err(err) = cx.runtime.require(effect.requires()) {
        cx.report(effect.kind(), None, &err);
        return 0;
    }
    effect.build(cx)
}

/// Pointer handler state owned by a registration.
#[derive(Debug)]
pub enum PointerBinding {
    Magnetic(MagneticBinding),
    Hover(HoverBinding),
}

impl PointerBinding {
    pub fn handle(
        &mut self,
        runtime: &mut Runtime,
        doc: &mut Document,
        event: &PointerEvent,
        scroll: f64,
    ) -> Result<(), EffectError> {
        match self {
            Self::Magnetic(binding) => binding.handle(runtime, doc, event, scroll),
            Self::Hover(binding) => binding.handle(runtime, doc, event),
        }
    }

    pub fn release(self, runtime: &mut Runtime, doc: &mut Document) {
        match self {
            Self::Magnetic(_) => {}
            Self::Hover(binding) => binding.release(runtime, doc),
        }
    }
}

/// One instance of every builder.
#[derive(Debug)]
pub struct Effects {
    pub parallax: Parallax,
    pub footer: FooterParallax,
    pub highlight: Highlight,
    pub scramble: Scramble,
    pub magnetic: Magnetic,
}

impl Effects {
    pub fn new() -> Self {
        Self {
            parallax: Parallax::new(),
            footer: FooterParallax::new(),
            highlight: Highlight::new(),
            scramble: Scramble::new(),
            magnetic: Magnetic::new(),
        }
    }

    pub fn get_mut(&mut self, kind: EffectKind) -> &mut dyn Effect {
        match kind {
            EffectKind::Parallax => &mut self.parallax,
            EffectKind::FooterParallax => &mut self.footer,
            EffectKind::Highlight => &mut self.highlight,
            EffectKind::Scramble => &mut self.scramble,
            EffectKind::Magnetic => &mut self.magnetic,
        }
    }

    pub fn prune(&mut self, doc: &Document) {
        for kind in EffectKind::ALL {
            self.get_mut(kind).prune(doc);
        }
    }

    pub fn reset(&mut self) {
        for kind in EffectKind::ALL {
            self.get_mut(kind).reset();
        }
    }
}

impl Default for Effects {
    fn default() -> Self {
        Self::new()
    }
}
