//! Marker-attribute selectors, parsed and matched by Servo's `selectors`.
//!
//! Any selector list the `selectors` crate understands is accepted except
//! pseudo-classes and pseudo-elements that depend on user state (`:hover`,
//! `::before`), which have no meaning in a headless document.

use std::fmt;

use cssparser::{
    serialize_identifier, serialize_string, CssStringWriter, Parser as CssParser, ParserInput,
    ToCss,
};
use selectors::context::QuirksMode;
use selectors::matching::{
    matches_selector_list, IgnoreNthChildForInvalidation, MatchingContext, MatchingMode,
    NeedsSelectorFlags,
};
use selectors::parser::{ParseRelative, SelectorImpl, SelectorList, SelectorParseErrorKind};
use selectors::NthIndexCache;
use tracing::warn;

use crate::document::{Document, DomError, NodeId};
use crate::servo_dom::DomElement;

#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct CssIdent(pub String);

impl AsRef<str> for CssIdent {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for CssIdent {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl<'a> From<&'a str> for CssIdent {
    fn from(s: &'a str) -> Self {
        Self(s.to_owned())
    }
}

impl ToCss for CssIdent {
    fn to_css<W>(&self, dest: &mut W) -> fmt::Result
    where
        W: fmt::Write,
    {
        serialize_identifier(&self.0, dest)
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct CssAttrValue(pub String);

impl AsRef<str> for CssAttrValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'a> From<&'a str> for CssAttrValue {
    fn from(s: &'a str) -> Self {
        Self(s.to_owned())
    }
}

impl ToCss for CssAttrValue {
    fn to_css<W>(&self, dest: &mut W) -> fmt::Result
    where
        W: fmt::Write,
    {
        use std::fmt::Write;
        write!(CssStringWriter::new(dest), "{}", &self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KineticSelectors {}

impl SelectorImpl for KineticSelectors {
    type ExtraMatchingData<'a> = ();
    type AttrValue = CssAttrValue;
    type Identifier = CssIdent;
    type LocalName = CssIdent;
    type NamespaceUrl = CssIdent;
    type NamespacePrefix = CssIdent;
    type BorrowedNamespaceUrl = str;
    type BorrowedLocalName = str;
    type NonTSPseudoClass = Never;
    type PseudoElement = Never;
}

/// No user-state pseudo-classes or pseudo-elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Never {}

impl ToCss for Never {
    fn to_css<W>(&self, _dest: &mut W) -> fmt::Result
    where
        W: fmt::Write,
    {
        match *self {}
    }
}

impl selectors::parser::NonTSPseudoClass for Never {
    type Impl = KineticSelectors;

    fn is_active_or_hover(&self) -> bool {
        match *self {}
    }

    fn is_user_action_state(&self) -> bool {
        match *self {}
    }
}

impl selectors::parser::PseudoElement for Never {
    type Impl = KineticSelectors;
}

struct KineticParser;

impl<'i> selectors::parser::Parser<'i> for KineticParser {
    type Impl = KineticSelectors;
    type Error = SelectorParseErrorKind<'i>;
}

/// A parsed selector list.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    list: SelectorList<KineticSelectors>,
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self, DomError> {
        let mut input = ParserInput::new(source);
        let mut parser = CssParser::new(&mut input);
        SelectorList::parse(&KineticParser, &mut parser, ParseRelative::No)
            .map(|list| Self { list })
            .map_err(|err| DomError::InvalidSelector {
                selector: source.to_string(),
                reason: format!(
                    "{:?} at line {}, column {}",
                    err.kind, err.location.line, err.location.column
                ),
            })
    }

    /// `[name]`; an empty name matches nothing.
    pub fn attribute(name: &str) -> Self {
        Self::parse_or_empty(attribute_css(name, None))
    }

    /// `[name="value"]`
    pub fn attribute_eq(name: &str, value: &str) -> Self {
        Self::parse_or_empty(attribute_css(name, Some(value)))
    }

    /// Append `:not([marker])` to every selector in the list.
    pub fn excluding(self, marker: &str) -> Self {
        let exclusion = match attribute_css(marker, None) {
            Ok(attribute) => format!(":not({attribute})"),
            Err(_) => return self,
        };
        let css = self
            .list
            .0
            .iter()
            .map(|selector| format!("{}{exclusion}", selector.to_css_string()))
            .collect::<Vec<_>>()
            .join(", ");
        match Self::parse(&css) {
            Ok(selector) => selector,
            Err(err) => {
                warn!(error = %err, "marker exclusion dropped");
                self
            }
        }
    }

    pub fn matches(&self, doc: &Document, id: NodeId) -> bool {
        let Some(element) = DomElement::new(doc, id) else {
            return false;
        };
        let mut cache = NthIndexCache::default();
        let mut context = MatchingContext::new(
            MatchingMode::Normal,
            None,
            &mut cache,
            QuirksMode::NoQuirks,
            NeedsSelectorFlags::No,
            IgnoreNthChildForInvalidation::No,
        );
        matches_selector_list(&self.list, &element, &mut context)
    }

    /// Matches nothing.
    fn empty() -> Self {
        Self {
            list: SelectorList(Default::default()),
        }
    }

    fn parse_or_empty(css: Result<String, fmt::Error>) -> Self {
        let parsed = css
            .map_err(|_| "unserializable attribute".to_string())
            .and_then(|css| Self::parse(&css).map_err(|err| err.to_string()));
        parsed.unwrap_or_else(|error| {
            warn!(%error, "selector matches nothing");
            Self::empty()
        })
    }
}

fn attribute_css(name: &str, value: Option<&str>) -> Result<String, fmt::Error> {
    let mut css = String::from("[");
    serialize_identifier(name, &mut css)?;
    if let Some(value) = value {
        css.push('=');
        serialize_string(value, &mut css)?;
    }
    css.push(']');
    Ok(css)
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.list.to_css(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let trigger = doc.create_element("div");
        doc.set_attr(trigger, "data-parallax", "trigger").unwrap();
        let target = doc.create_element("img");
        doc.set_attr(target, "data-parallax", "target").unwrap();
        let done = doc.create_element("h2");
        doc.set_attr(done, "data-scramble", "load").unwrap();
        doc.set_attr(done, "data-scramble-initialized", "true")
            .unwrap();
        doc.append_child(doc.root(), trigger).unwrap();
        doc.append_child(trigger, target).unwrap();
        doc.append_child(doc.root(), done).unwrap();
        (doc, trigger, target, done)
    }

    #[test]
    fn test_attribute_value_match() {
        let (doc, trigger, target, _) = fixture();
        let selector = Selector::parse(r#"[data-parallax="trigger"]"#).unwrap();
        assert!(selector.matches(&doc, trigger));
        assert!(!selector.matches(&doc, target));
        assert_eq!(selector, Selector::attribute_eq("data-parallax", "trigger"));
    }

    #[test]
    fn test_not_excludes_marked_elements() {
        let (doc, _, _, done) = fixture();
        let selector =
            Selector::parse("[data-scramble='load']:not([data-scramble-initialized])").unwrap();
        assert!(!selector.matches(&doc, done));

        let built = Selector::attribute_eq("data-scramble", "load")
            .excluding("data-scramble-initialized");
        assert_eq!(built, selector);
    }

    #[test]
    fn test_excluding_applies_to_each_alternative() {
        let (mut doc, trigger, _, done) = fixture();
        doc.set_attr(trigger, "data-seen", "").unwrap();
        let selector = Selector::parse("div, h2").unwrap().excluding("data-seen");
        assert_eq!(doc.query_all(&selector), vec![done]);
    }

    #[test]
    fn test_selector_list_and_tag() {
        let (doc, trigger, target, done) = fixture();
        let selector = Selector::parse("img[data-parallax], h2").unwrap();
        assert!(selector.matches(&doc, target));
        assert!(selector.matches(&doc, done));
        assert!(!selector.matches(&doc, trigger));
    }

    #[test]
    fn test_descendant_combinator_walks_ancestors() {
        let (doc, trigger, target, _) = fixture();
        let selector = Selector::parse(r#"[data-parallax="trigger"] img"#).unwrap();
        assert!(selector.matches(&doc, target));
        assert!(!selector.matches(&doc, trigger));
    }

    #[test]
    fn test_query_all_in_document_order() {
        let (doc, trigger, target, _) = fixture();
        let selector = Selector::attribute("data-parallax");
        assert_eq!(doc.query_all(&selector), vec![trigger, target]);
    }

    #[test]
    fn test_text_nodes_never_match() {
        let mut doc = Document::new();
        let text = doc.create_text("plain");
        doc.append_child(doc.root(), text).unwrap();
        assert!(!Selector::parse("*").unwrap().matches(&doc, text));
    }

    #[test]
    fn test_rejects_user_state_and_garbage() {
        assert!(Selector::parse("[data-x").is_err());
        assert!(Selector::parse(":hover").is_err());
        assert!(Selector::parse("a::before").is_err());
        assert!(Selector::parse("").is_err());
        let err = Selector::parse("div >").unwrap_err();
        assert!(matches!(err, DomError::InvalidSelector { .. }));
    }

    #[test]
    fn test_empty_attribute_name_matches_nothing() {
        let (doc, trigger, _, _) = fixture();
        let selector = Selector::attribute("");
        assert!(!selector.matches(&doc, trigger));
        assert!(doc.query_all(&selector).is_empty());
    }

    #[test]
    fn test_display_is_parseable() {
        let selector = Selector::parse("a[data-scramble-hover=link]:not([x])").unwrap();
        let reparsed = Selector::parse(&selector.to_string()).unwrap();
        assert_eq!(selector, reparsed);
    }
}
