//! Ownership of everything an effect acquires.
//!
//! A [`Registration`] records, in acquisition order, every resource wired for
//! one element: timelines, scroll triggers, pointer listeners, text splits,
//! marker attributes and inline style or text it overwrote. Releasing it
//! undoes them in reverse order, so teardown is always symmetric with setup.

use kinetic_anim::{ClearProps, TimelineId, TriggerId};
use kinetic_dom::{Document, ListenerId, NodeId};
use kinetic_text::SplitHandle;
use tracing::{debug, trace};

use crate::effects::{EffectKind, PointerBinding};
use crate::runtime::Runtime;

#[derive(Debug)]
pub enum Resource {
    Timeline(TimelineId),
    Trigger(TriggerId),
    Listener(ListenerId),
    Split(SplitHandle),
    /// Marker attribute written by a marker-attribute tracker.
    Marker { element: NodeId, name: &'static str },
    /// Text content to put back.
    Text { element: NodeId, text: String },
    /// Inline style to put back (`None` removes it).
    Style {
        element: NodeId,
        name: &'static str,
        previous: Option<String>,
    },
    /// Element animated by short-lived tweens not tracked individually.
    Tweens(NodeId),
}

#[derive(Debug)]
pub struct Registration {
    pub effect: EffectKind,
    pub variant: &'static str,
    pub element: NodeId,
    resources: Vec<Resource>,
    pub binding: Option<PointerBinding>,
}

impl Registration {
    pub fn new(effect: EffectKind, element: NodeId) -> Self {
        Self {
            effect,
            variant: effect.name(),
            element,
            resources: Vec::new(),
            binding: None,
        }
    }

    pub fn variant(mut self, variant: &'static str) -> Self {
        self.variant = variant;
        self
    }

    pub fn push(&mut self, resource: Resource) {
        self.resources.push(resource);
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn timelines(&self) -> impl Iterator<Item = TimelineId> + '_ {
        self.resources.iter().filter_map(|resource| match resource {
            Resource::Timeline(id) => Some(*id),
            _ => None,
        })
    }

    pub fn triggers(&self) -> impl Iterator<Item = TriggerId> + '_ {
        self.resources.iter().filter_map(|resource| match resource {
            Resource::Trigger(id) => Some(*id),
            _ => None,
        })
    }

    pub fn listeners(&self) -> impl Iterator<Item = ListenerId> + '_ {
        self.resources.iter().filter_map(|resource| match resource {
            Resource::Listener(id) => Some(*id),
            _ => None,
        })
    }

    pub fn split_count(&self) -> usize {
        self.resources
            .iter()
            .filter(|resource| matches!(resource, Resource::Split(_)))
            .count()
    }

    pub fn owns_timeline(&self, id: TimelineId) -> bool {
        self.timelines().any(|timeline| timeline == id)
    }

    pub fn owns_listener(&self, id: ListenerId) -> bool {
        self.listeners().any(|listener| listener == id)
    }

    /// Undo every resource, newest first.
    pub fn release(self, runtime: &mut Runtime, doc: &mut Document) {
        self.unwind(runtime, doc, true);
    }

    /// Undo everything except marker attributes, which keep the element
    /// from being wired again. Used once a one-shot animation has finished.
    pub fn settle(self, runtime: &mut Runtime, doc: &mut Document) {
        self.unwind(runtime, doc, false);
    }

    fn unwind(mut self, runtime: &mut Runtime, doc: &mut Document, remove_markers: bool) {
        trace!(effect = %self.effect, element = %self.element, "releasing registration");
        if let Some(binding) = self.binding.take() {
            binding.release(runtime, doc);
        }
        while let Some(resource) = self.resources.pop() {
            match resource {
                Resource::Timeline(id) => {
                    if let Ok(animator) = runtime.animator() {
                        animator.revert(doc, id);
                    }
                }
                Resource::Trigger(id) => {
                    if let Ok(observer) = runtime.observer() {
                        observer.kill(id);
                    }
                }
                Resource::Listener(id) => {
                    doc.unlisten(id);
                }
                Resource::Split(handle) => {
                    if let Err(err) = handle.revert(doc) {
                        debug!(element = %self.element, error = %err, "split revert failed");
                    }
                }
                Resource::Marker { element, name } => {
                    if remove_markers && doc.is_alive(element) {
                        if let Err(err) = doc.remove_attr(element, name) {
                            debug!(%element, name, error = %err, "marker removal failed");
                        }
                    }
                }
                Resource::Text { element, text } => {
                    if doc.is_alive(element) {
                        if let Err(err) = doc.set_text_content(element, &text) {
                            debug!(%element, error = %err, "text restore failed");
                        }
                    }
                }
                Resource::Style {
                    element,
                    name,
                    previous,
                } => {
                    if doc.is_alive(element) {
                        let restored = match previous {
                            Some(value) => doc.set_style(element, name, &value),
                            None => doc.remove_style(element, name).map(|_| ()),
                        };
                        if let Err(err) = restored {
                            debug!(%element, name, error = %err, "style restore failed");
                        }
                    }
                }
                Resource::Tweens(element) => {
                    if let Ok(animator) = runtime.animator() {
                        animator.kill_tweens_of(element);
                        animator.clear_props(doc, element, ClearProps::Animated);
                    }
                }
            }
        }
    }
}

/// Registrations owned by one context, in creation order.
#[derive(Debug, Default)]
pub struct Registrations {
    entries: Vec<Registration>,
}

impl Registrations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, registration: Registration) {
        debug!(
            effect = %registration.effect,
            variant = registration.variant,
            element = %registration.element,
            resources = registration.resources.len(),
            "registered"
        );
        self.entries.push(registration);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Registration> {
        self.entries.iter()
    }

    pub fn count(&self, effect: EffectKind) -> usize {
        self.entries.iter().filter(|r| r.effect == effect).count()
    }

    pub fn of_element(&self, element: NodeId) -> Vec<&Registration> {
        self.entries.iter().filter(|r| r.element == element).collect()
    }

    /// Release `effect`'s registrations for `element`.
    pub fn release_element(
        &mut self,
        runtime: &mut Runtime,
        doc: &mut Document,
        effect: EffectKind,
        element: NodeId,
    ) -> usize {
        self.release_where(runtime, doc, |r| r.effect == effect && r.element == element)
    }

    /// Release registrations whose element is no longer in the document.
    pub fn prune_detached(&mut self, runtime: &mut Runtime, doc: &mut Document) -> usize {
        let detached: Vec<NodeId> = self
            .entries
            .iter()
            .map(|r| r.element)
            .filter(|element| !doc.contains(*element))
            .collect();
        self.release_where(runtime, doc, |r| detached.contains(&r.element))
    }

    /// Release everything, newest first.
    pub fn release_all(&mut self, runtime: &mut Runtime, doc: &mut Document) -> usize {
        let count = self.entries.len();
        while let Some(registration) = self.entries.pop() {
            registration.release(runtime, doc);
        }
        count
    }

    /// Remove and return the registration owning `timeline`.
    pub fn take_by_timeline(&mut self, timeline: TimelineId) -> Option<Registration> {
        let index = self
            .entries
            .iter()
            .position(|r| r.owns_timeline(timeline))?;
        Some(self.entries.remove(index))
    }

    pub fn by_listener_mut(&mut self, listener: ListenerId) -> Option<&mut Registration> {
        self.entries.iter_mut().find(|r| r.owns_listener(listener))
    }

    fn release_where(
        &mut self,
        runtime: &mut Runtime,
        doc: &mut Document,
        predicate: impl Fn(&Registration) -> bool,
    ) -> usize {
        let mut released = Vec::new();
        let mut index = self.entries.len();
        while index > 0 {
            index -= 1;
            if predicate(&self.entries[index]) {
                released.push(self.entries.remove(index));
            }
        }
        let count = released.len();
        for registration in released {
            registration.release(runtime, doc);
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinetic_anim::{Property, Timeline, TriggerSpec, Tween};
    use kinetic_config::KineticConfig;
    use kinetic_dom::PointerKind;

    fn setup() -> (Runtime, Document, NodeId) {
        let mut doc = Document::new();
        let el = doc.create_element("section");
        doc.append_child(doc.root(), el).unwrap();
        (Runtime::new(&KineticConfig::default()), doc, el)
    }

    #[test]
    fn test_release_undoes_every_resource() {
        let (mut runtime, mut doc, el) = setup();
        doc.set_attr(el, "data-highlight-initialized", "true").unwrap();
        let timeline = runtime.animator().unwrap().add(
            &mut doc,
            Timeline::tween(Tween::from(vec![el]).prop(Property::YPercent, 20.0)).scrubbed(),
        );
        let trigger = runtime
            .observer()
            .unwrap()
            .register(&doc, TriggerSpec::new(el).scrub().animation(timeline));
        let listener = doc.listen(el, PointerKind::Enter).unwrap();

        let mut registration = Registration::new(EffectKind::Highlight, el);
        registration.push(Resource::Marker {
            element: el,
            name: "data-highlight-initialized",
        });
        registration.push(Resource::Timeline(timeline));
        registration.push(Resource::Trigger(trigger));
        registration.push(Resource::Listener(listener));

        let mut registrations = Registrations::new();
        registrations.add(registration);
        assert!(doc.style(el, "transform").is_some());

        assert_eq!(registrations.release_all(&mut runtime, &mut doc), 1);
        assert!(registrations.is_empty());
        assert!(runtime.animator().unwrap().is_empty());
        assert!(runtime.observer().unwrap().is_empty());
        assert_eq!(doc.listener_count(), 0);
        assert!(!doc.has_attr(el, "data-highlight-initialized"));
        assert_eq!(doc.style(el, "transform"), None);
    }

    #[test]
    fn test_settle_keeps_marker() {
        let (mut runtime, mut doc, el) = setup();
        doc.set_attr(el, "data-scramble-initialized", "true").unwrap();
        let mut registration = Registration::new(EffectKind::Scramble, el);
        registration.push(Resource::Marker {
            element: el,
            name: "data-scramble-initialized",
        });
        registration.settle(&mut runtime, &mut doc);
        assert_eq!(doc.attr(el, "data-scramble-initialized"), Some("true"));
    }

    #[test]
    fn test_prune_detached_only_releases_removed_elements() {
        let (mut runtime, mut doc, el) = setup();
        let other = doc.create_element("footer");
        doc.append_child(doc.root(), other).unwrap();

        let mut registrations = Registrations::new();
        registrations.add(Registration::new(EffectKind::FooterParallax, el));
        registrations.add(Registration::new(EffectKind::FooterParallax, other));

        doc.remove(el).unwrap();
        assert_eq!(registrations.prune_detached(&mut runtime, &mut doc), 1);
        assert_eq!(registrations.len(), 1);
        assert_eq!(registrations.of_element(other).len(), 1);
    }

    #[test]
    fn test_release_continues_past_failed_restores() {
        let (mut runtime, mut doc, el) = setup();
        let text = doc.create_text("label");
        doc.append_child(el, text).unwrap();
        doc.set_style(el, "position", "relative").unwrap();

        let mut registration = Registration::new(EffectKind::Scramble, el);
        registration.push(Resource::Style {
            element: el,
            name: "position",
            previous: None,
        });
        registration.push(Resource::Marker {
            element: text,
            name: "data-scramble-initialized",
        });
        registration.push(Resource::Style {
            element: text,
            name: "display",
            previous: Some("inline".to_string()),
        });
        registration.release(&mut runtime, &mut doc);

        assert_eq!(doc.style(el, "position"), None);
        assert_eq!(doc.text(text), Some("label"));
    }
}
