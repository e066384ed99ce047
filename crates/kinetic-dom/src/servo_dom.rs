//! [`selectors::Element`] over the arena document.

use selectors::attr::{AttrSelectorOperation, CaseSensitivity, NamespaceConstraint};
use selectors::matching::{ElementSelectorFlags, MatchingContext};
use selectors::parser::SelectorImpl;
use selectors::{Element as ServoElement, OpaqueElement};

use crate::document::{Document, ElementData, NodeId};
use crate::selector::KineticSelectors;

/// Borrowed view of one element, as the selector matcher walks the tree.
#[derive(Clone)]
pub(crate) struct DomElement<'a> {
    doc: &'a Document,
    id: NodeId,
    data: &'a ElementData,
}

impl<'a> DomElement<'a> {
    /// `None` for text nodes and stale handles.
    pub(crate) fn new(doc: &'a Document, id: NodeId) -> Option<Self> {
        doc.element(id).map(|data| Self { doc, id, data })
    }

    fn tag(&self) -> &str {
        self.doc.tag(self.id).unwrap_or_default()
    }

    fn sibling(&self, step: isize) -> Option<Self> {
        let parent = self.doc.parent(self.id)?;
        let siblings = self.doc.children(parent);
        let position = siblings.iter().position(|id| *id == self.id)?;
        let mut index = position as isize + step;
        while index >= 0 && (index as usize) < siblings.len() {
            if let Some(element) = Self::new(self.doc, siblings[index as usize]) {
                return Some(element);
            }
            index += step;
        }
        None
    }
}

impl std::fmt::Debug for DomElement<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{} {}>", self.tag(), self.id)
    }
}

impl<'a> ServoElement for DomElement<'a> {
    type Impl = KineticSelectors;

    fn opaque(&self) -> OpaqueElement {
        OpaqueElement::new(self.data)
    }

    fn parent_element(&self) -> Option<Self> {
        self.doc
            .parent(self.id)
            .and_then(|parent| Self::new(self.doc, parent))
    }

    fn parent_node_is_shadow_root(&self) -> bool {
        false
    }

    fn containing_shadow_host(&self) -> Option<Self> {
        None
    }

    fn is_pseudo_element(&self) -> bool {
        false
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        self.sibling(-1)
    }

    fn next_sibling_element(&self) -> Option<Self> {
        self.sibling(1)
    }

    fn first_element_child(&self) -> Option<Self> {
        self.doc
            .children(self.id)
            .iter()
            .find_map(|child| Self::new(self.doc, *child))
    }

    fn is_html_element_in_html_document(&self) -> bool {
        true
    }

    fn has_local_name(
        &self,
        name: &<KineticSelectors as SelectorImpl>::BorrowedLocalName,
    ) -> bool {
        self.tag().eq_ignore_ascii_case(name)
    }

    fn has_namespace(
        &self,
        _ns: &<KineticSelectors as SelectorImpl>::BorrowedNamespaceUrl,
    ) -> bool {
        true
    }

    fn is_same_type(&self, other: &Self) -> bool {
        self.tag().eq_ignore_ascii_case(other.tag())
    }

    fn attr_matches(
        &self,
        _ns: &NamespaceConstraint<&<KineticSelectors as SelectorImpl>::NamespaceUrl>,
        local_name: &<KineticSelectors as SelectorImpl>::LocalName,
        operation: &AttrSelectorOperation<&<KineticSelectors as SelectorImpl>::AttrValue>,
    ) -> bool {
        self.doc
            .attr(self.id, local_name.as_ref())
            .is_some_and(|value| operation.eval_str(value))
    }

    fn match_non_ts_pseudo_class(
        &self,
        _pc: &<KineticSelectors as SelectorImpl>::NonTSPseudoClass,
        _context: &mut MatchingContext<KineticSelectors>,
    ) -> bool {
        false
    }

    fn match_pseudo_element(
        &self,
        _pe: &<KineticSelectors as SelectorImpl>::PseudoElement,
        _context: &mut MatchingContext<KineticSelectors>,
    ) -> bool {
        false
    }

    fn apply_selector_flags(&self, _flags: ElementSelectorFlags) {}

    fn is_link(&self) -> bool {
        self.tag() == "a" && self.doc.has_attr(self.id, "href")
    }

    fn is_html_slot_element(&self) -> bool {
        false
    }

    fn has_id(
        &self,
        id: &<KineticSelectors as SelectorImpl>::Identifier,
        case: CaseSensitivity,
    ) -> bool {
        self.doc
            .attr(self.id, "id")
            .is_some_and(|value| case.eq(value.as_bytes(), id.as_ref().as_bytes()))
    }

    fn has_class(
        &self,
        name: &<KineticSelectors as SelectorImpl>::Identifier,
        case: CaseSensitivity,
    ) -> bool {
        self.doc.attr(self.id, "class").is_some_and(|classes| {
            classes
                .split_ascii_whitespace()
                .any(|class| case.eq(class.as_bytes(), name.as_ref().as_bytes()))
        })
    }

    fn imported_part(
        &self,
        _name: &<KineticSelectors as SelectorImpl>::Identifier,
    ) -> Option<<KineticSelectors as SelectorImpl>::Identifier> {
        None
    }

    fn is_part(&self, _name: &<KineticSelectors as SelectorImpl>::Identifier) -> bool {
        false
    }

    fn is_empty(&self) -> bool {
        self.doc.children(self.id).iter().all(|child| {
            !self.doc.is_element(*child)
                && self.doc.text(*child).map_or(true, |text| text.is_empty())
        })
    }

    fn is_root(&self) -> bool {
        self.id == self.doc.root()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_siblings_skip_text_nodes() {
        let mut doc = Document::new();
        let first = doc.create_element("span");
        let text = doc.create_text("between");
        let second = doc.create_element("em");
        for child in [first, text, second] {
            doc.append_child(doc.root(), child).unwrap();
        }

        let em = DomElement::new(&doc, second).unwrap();
        assert_eq!(em.prev_sibling_element().map(|el| el.id), Some(first));
        assert!(em.next_sibling_element().is_none());
        assert!(DomElement::new(&doc, text).is_none());

        let body = DomElement::new(&doc, doc.root()).unwrap();
        assert!(body.is_root());
        assert!(!body.is_empty());
        assert_eq!(body.first_element_child().map(|el| el.id), Some(first));
    }

    #[test]
    fn test_opaque_identity_follows_node() {
        let mut doc = Document::new();
        let a = doc.create_element("div");
        let b = doc.create_element("div");
        doc.append_child(doc.root(), a).unwrap();
        doc.append_child(doc.root(), b).unwrap();
        let first = DomElement::new(&doc, a).unwrap();
        assert_eq!(first.opaque(), DomElement::new(&doc, a).unwrap().opaque());
        assert_ne!(first.opaque(), DomElement::new(&doc, b).unwrap().opaque());
    }
}
