//! Idempotency trackers.
//!
//! Two strategies keep re-scans from wiring an element twice:
//! - [`WeakElementSet`] remembers element handles. Handles never keep a node
//!   alive, and a removed node's handle can never match a new node, so a
//!   replacement element is always seen as new.
//! - [`MarkerAttribute`] writes a `"true"` attribute onto the element and
//!   excludes it from the scan query. State survives in the markup itself.

use std::collections::HashSet;

use kinetic_dom::{Document, DomError, NodeId, Selector};

pub trait InitTracker {
    fn is_initialized(&self, doc: &Document, element: NodeId) -> bool;

    fn mark(&mut self, doc: &mut Document, element: NodeId) -> Result<(), DomError>;

    /// Restrict a scan selector to candidates this tracker has not marked.
    fn narrow(&self, selector: Selector) -> Selector {
        selector
    }
}

#[derive(Debug, Default)]
pub struct WeakElementSet {
    elements: HashSet<NodeId>,
}

impl WeakElementSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, element: NodeId) -> bool {
        self.elements.insert(element)
    }

    pub fn contains(&self, element: NodeId) -> bool {
        self.elements.contains(&element)
    }

    pub fn remove(&mut self, element: NodeId) -> bool {
        self.elements.remove(&element)
    }

    /// Drop handles whose element no longer exists.
    pub fn prune(&mut self, doc: &Document) -> usize {
        let before = self.elements.len();
        self.elements.retain(|element| doc.is_alive(*element));
        before - self.elements.len()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn clear(&mut self) {
        self.elements.clear();
    }
}

impl InitTracker for WeakElementSet {
    fn is_initialized(&self, doc: &Document, element: NodeId) -> bool {
        doc.is_alive(element) && self.contains(element)
    }

    fn mark(&mut self, _doc: &mut Document, element: NodeId) -> Result<(), DomError> {
        self.insert(element);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct MarkerAttribute {
    name: &'static str,
}

impl MarkerAttribute {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl InitTracker for MarkerAttribute {
    fn is_initialized(&self, doc: &Document, element: NodeId) -> bool {
        doc.has_attr(element, self.name)
    }

    fn mark(&mut self, doc: &mut Document, element: NodeId) -> Result<(), DomError> {
        doc.set_attr(element, self.name, "true")
    }

    fn narrow(&self, selector: Selector) -> Selector {
        selector.excluding(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replacement_element_is_not_initialized() {
        let mut doc = Document::new();
        let first = doc.create_element("footer");
        doc.append_child(doc.root(), first).unwrap();

        let mut set = WeakElementSet::new();
        set.mark(&mut doc, first).unwrap();
        assert!(set.is_initialized(&doc, first));

        doc.remove(first).unwrap();
        let second = doc.create_element("footer");
        doc.append_child(doc.root(), second).unwrap();
        assert!(!set.is_initialized(&doc, second));
        assert!(!set.is_initialized(&doc, first));
        assert_eq!(set.prune(&doc), 1);
        assert!(set.is_empty());
    }

    #[test]
    fn test_marker_attribute_round_trip() {
        let mut doc = Document::new();
        let el = doc.create_element("h2");
        doc.append_child(doc.root(), el).unwrap();

        let mut marker = MarkerAttribute::new("data-highlight-initialized");
        assert!(!marker.is_initialized(&doc, el));
        marker.mark(&mut doc, el).unwrap();
        assert_eq!(doc.attr(el, "data-highlight-initialized"), Some("true"));

        let narrowed = marker.narrow(Selector::attribute("data-highlight-text"));
        assert_eq!(
            narrowed.to_string(),
            "[data-highlight-text]:not([data-highlight-initialized])"
        );
    }
}
