//! Breakpoint-scoped registration context.
//!
//! Effects that depend on the active breakpoint are built inside a
//! [`BreakpointContext`]. Every (re)build first reverts whatever the previous
//! build created, so no two generations of the same effect ever coexist.

use kinetic_anim::Conditions;
use kinetic_dom::Document;
use tracing::{debug, info};

use crate::registry::Registrations;
use crate::runtime::Runtime;

#[derive(Debug, Default)]
pub enum BreakpointContext {
    #[default]
    Uninitialized,
    Active {
        conditions: Conditions,
        registrations: Registrations,
    },
}

impl BreakpointContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }

    pub fn conditions(&self) -> Option<&Conditions> {
        match self {
            Self::Active { conditions, .. } => Some(conditions),
            Self::Uninitialized => None,
        }
    }

    pub fn registrations(&self) -> Option<&Registrations> {
        match self {
            Self::Active { registrations, .. } => Some(registrations),
            Self::Uninitialized => None,
        }
    }

    /// Release everything the context owns. Calling it again is a no-op.
    pub fn revert(&mut self, runtime: &mut Runtime, doc: &mut Document) -> usize {
        match std::mem::take(self) {
            Self::Active {
                mut registrations, ..
            } => {
                let released = registrations.release_all(runtime, doc);
                debug!(released, "breakpoint context reverted");
                released
            }
            Self::Uninitialized => 0,
        }
    }

    /// Revert the previous build, then run `build` against a fresh
    /// registration set under `conditions`. Returns how many registrations
    /// the new build produced.
    pub fn replace<F>(
        &mut self,
        runtime: &mut Runtime,
        doc: &mut Document,
        conditions: Conditions,
        build: F,
    ) -> usize
    where
        F: FnOnce(&mut Runtime, &mut Document, &Conditions, &mut Registrations),
    {
        self.revert(runtime, doc);
        let mut registrations = Registrations::new();
        build(runtime, doc, &conditions, &mut registrations);
        let created = registrations.len();
        info!(active = ?conditions.active(), created, "breakpoint context built");
        *self = Self::Active {
            conditions,
            registrations,
        };
        created
    }

    /// Release registrations whose elements left the document.
    pub fn prune_detached(&mut self, runtime: &mut Runtime, doc: &mut Document) -> usize {
        match self {
            Self::Active { registrations, .. } => registrations.prune_detached(runtime, doc),
            Self::Uninitialized => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::EffectKind;
    use crate::registry::{Registration, Resource};
    use kinetic_anim::{Property, Timeline, Tween};
    use kinetic_config::KineticConfig;
    use kinetic_dom::{NodeId, Viewport};

    fn setup() -> (Runtime, Document, NodeId) {
        let mut doc = Document::new();
        let el = doc.create_element("section");
        doc.append_child(doc.root(), el).unwrap();
        (Runtime::new(&KineticConfig::default()), doc, el)
    }

    fn build_one(
        el: NodeId,
    ) -> impl FnOnce(&mut Runtime, &mut Document, &Conditions, &mut Registrations) {
        move |runtime, doc, _conditions, registrations| {
            let timeline = runtime.animator().unwrap().add(
                doc,
                Timeline::tween(Tween::from(vec![el]).prop(Property::YPercent, 20.0)).scrubbed(),
            );
            let mut registration = Registration::new(EffectKind::Parallax, el);
            registration.push(Resource::Timeline(timeline));
            registrations.add(registration);
        }
    }

    #[test]
    fn test_replace_reverts_previous_build() {
        let (mut runtime, mut doc, el) = setup();
        let mut context = BreakpointContext::new();
        assert!(!context.is_active());

        let desktop = runtime.media.evaluate(&Viewport::new(1440.0, 900.0));
        assert_eq!(context.replace(&mut runtime, &mut doc, desktop, build_one(el)), 1);
        assert_eq!(runtime.animator().unwrap().len(), 1);

        let mobile = runtime.media.evaluate(&Viewport::new(375.0, 700.0));
        assert_eq!(context.replace(&mut runtime, &mut doc, mobile, build_one(el)), 1);
        assert_eq!(runtime.animator().unwrap().len(), 1);
        assert!(context.conditions().unwrap().get("mobile"));
    }

    #[test]
    fn test_revert_is_idempotent() {
        let (mut runtime, mut doc, el) = setup();
        let mut context = BreakpointContext::new();
        let conditions = runtime.media.evaluate(&doc.viewport());
        context.replace(&mut runtime, &mut doc, conditions, build_one(el));

        assert_eq!(context.revert(&mut runtime, &mut doc), 1);
        assert_eq!(context.revert(&mut runtime, &mut doc), 0);
        assert!(!context.is_active());
        assert!(runtime.animator().unwrap().is_empty());
        assert_eq!(doc.style(el, "transform"), None);
    }

    #[test]
    fn test_prune_detached() {
        let (mut runtime, mut doc, el) = setup();
        let mut context = BreakpointContext::new();
        let conditions = runtime.media.evaluate(&doc.viewport());
        context.replace(&mut runtime, &mut doc, conditions, build_one(el));

        doc.remove(el).unwrap();
        assert_eq!(context.prune_detached(&mut runtime, &mut doc), 1);
        assert!(context.registrations().unwrap().is_empty());
        assert!(context.is_active());
    }
}
