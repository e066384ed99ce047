//! Defensive parsing of effect parameters from marker attributes.
//!
//! Absent attributes fall back to their documented default silently. Present
//! but unparsable values also fall back, and additionally record a
//! `MalformedAttribute` error the caller turns into a diagnostic.

use kinetic_anim::TriggerPosition;
use kinetic_dom::{Document, NodeId};

use crate::error::EffectError;

pub struct AttrReader<'a> {
    doc: &'a Document,
    element: NodeId,
    errors: Vec<EffectError>,
}

impl<'a> AttrReader<'a> {
    pub fn new(doc: &'a Document, element: NodeId) -> Self {
        Self {
            doc,
            element,
            errors: Vec::new(),
        }
    }

    /// Attribute value, treating an empty value as absent.
    pub fn string(&self, name: &str) -> Option<&'a str> {
        self.doc
            .attr(self.element, name)
            .filter(|value| !value.trim().is_empty())
    }

    pub fn string_or(&self, name: &str, default: &'a str) -> &'a str {
        self.string(name).unwrap_or(default)
    }

    pub fn has(&self, name: &str) -> bool {
        self.doc.has_attr(self.element, name)
    }

    /// Numeric attribute; `None` when absent or malformed.
    pub fn optional_number(&mut self, name: &str) -> Option<f64> {
        let raw = self.string(name)?;
        match parse_leading_float(raw) {
            Some(value) => Some(value),
            None => {
                self.malformed(name, raw, "expected a number");
                None
            }
        }
    }

    pub fn number(&mut self, name: &str, default: f64) -> f64 {
        self.optional_number(name).unwrap_or(default)
    }

    /// Trigger position from `name`, or `default`. When `clamp` is set the
    /// value is wrapped in `clamp(...)` before parsing.
    pub fn position(
        &mut self,
        name: &str,
        default: &str,
        clamp: bool,
    ) -> Result<TriggerPosition, EffectError> {
        let wrap = |raw: &str| {
            if clamp {
                format!("clamp({raw})")
            } else {
                raw.to_string()
            }
        };
        if let Some(raw) = self.string(name) {
            match TriggerPosition::parse(&wrap(raw)) {
                Ok(position) => return Ok(position),
                Err(err) => self.malformed(name, raw, &err.reason),
            }
        }
        TriggerPosition::parse(&wrap(default)).map_err(|err| EffectError::MalformedAttribute {
            element: self.element,
            attribute: name.to_string(),
            value: default.to_string(),
            reason: err.reason,
        })
    }

    fn malformed(&mut self, name: &str, value: &str, reason: &str) {
        self.errors.push(EffectError::MalformedAttribute {
            element: self.element,
            attribute: name.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        });
    }

    /// Errors recorded while reading.
    pub fn finish(self) -> Vec<EffectError> {
        self.errors
    }
}

/// Parse the longest numeric prefix of `raw`, so `"20%"` reads as `20`.
pub fn parse_leading_float(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let end = raw
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E')))
        .map_or(raw.len(), |(index, _)| index);
    (1..=end)
        .rev()
        .find_map(|len| raw[..len].parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(attrs: &[(&str, &str)]) -> (Document, NodeId) {
        let mut doc = Document::new();
        let el = doc.create_element("div");
        doc.append_child(doc.root(), el).unwrap();
        for (name, value) in attrs {
            doc.set_attr(el, name, value).unwrap();
        }
        (doc, el)
    }

    #[test]
    fn test_parse_leading_float() {
        assert_eq!(parse_leading_float("20"), Some(20.0));
        assert_eq!(parse_leading_float(" -12.5 "), Some(-12.5));
        assert_eq!(parse_leading_float("30%"), Some(30.0));
        assert_eq!(parse_leading_float("1e2px"), Some(100.0));
        assert_eq!(parse_leading_float("abc"), None);
        assert_eq!(parse_leading_float("-"), None);
    }

    #[test]
    fn test_malformed_number_falls_back_with_error() {
        let (doc, el) = element(&[("data-parallax-start", "lots")]);
        let mut reader = AttrReader::new(&doc, el);
        assert_eq!(reader.number("data-parallax-start", 20.0), 20.0);
        assert_eq!(reader.number("data-parallax-end", -20.0), -20.0);
        let errors = reader.finish();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], EffectError::MalformedAttribute { .. }));
    }

    #[test]
    fn test_position_wraps_in_clamp() {
        let (doc, el) = element(&[("data-parallax-scroll-start", "top center")]);
        let mut reader = AttrReader::new(&doc, el);
        let start = reader
            .position("data-parallax-scroll-start", "top bottom", true)
            .unwrap();
        assert!(start.clamp);
        assert_eq!(start, TriggerPosition::parse("clamp(top center)").unwrap());
        assert!(reader.finish().is_empty());
    }

    #[test]
    fn test_bad_position_uses_default() {
        let (doc, el) = element(&[("data-highlight-scroll-start", "sideways")]);
        let mut reader = AttrReader::new(&doc, el);
        let start = reader
            .position("data-highlight-scroll-start", "top 90%", false)
            .unwrap();
        assert_eq!(start, TriggerPosition::parse("top 90%").unwrap());
        assert_eq!(reader.finish().len(), 1);
    }

    #[test]
    fn test_empty_string_is_absent() {
        let (doc, el) = element(&[("data-scramble-text", "")]);
        let reader = AttrReader::new(&doc, el);
        assert_eq!(reader.string("data-scramble-text"), None);
        assert!(reader.has("data-scramble-text"));
    }
}
