//! HTML markup to [`Document`] translation.
//!
//! The `<body>` subtree is copied node by node into the arena. Non-visual
//! tags are skipped. Inline `style` declarations are kept as the element's
//! inline style, and `top`/`left`/`width`/`height` lengths become its layout
//! box, which is how fixtures describe geometry without a layout engine.

use std::ops::Deref;

use ego_tree::NodeRef;
use scraper::{Html, Node, Selector as HtmlSelector};
use tracing::debug;

use crate::document::{Document, DomError, NodeId};
use crate::layout::Rect;

const SKIPPED_TAGS: &[&str] = &["script", "style", "meta", "link", "head", "template", "noscript"];

impl Document {
    /// Parse an HTML page into a client-side document.
    pub fn parse_html(html: &str) -> Result<Self, DomError> {
        let parsed = Html::parse_document(html);
        let body = find_body(&parsed).ok_or(DomError::MissingBody)?;

        let mut doc = Document::new();
        let root = doc.root();
        if let Node::Element(element) = body.value() {
            copy_attributes(&mut doc, root, element)?;
        }
        for child in body.children() {
            convert_node(&mut doc, root, child)?;
        }
        debug!(
            nodes = doc.descendants(root).len(),
            scroll_height = doc.scroll_height(),
            "parsed HTML document"
        );
        Ok(doc)
    }
}

fn find_body(document: &Html) -> Option<NodeRef<'_, Node>> {
    let selector = HtmlSelector::parse("body").ok()?;
    document
        .select(&selector)
        .next()
        .map(|body| *body.deref())
}

fn convert_node(doc: &mut Document, parent: NodeId, node: NodeRef<Node>) -> Result<(), DomError> {
    match node.value() {
        Node::Element(element) => {
            let tag = element.name().to_ascii_lowercase();
            if SKIPPED_TAGS.contains(&tag.as_str()) {
                return Ok(());
            }
            let id = doc.create_element(&tag);
            copy_attributes(doc, id, element)?;
            doc.append_child(parent, id)?;
            for child in node.children() {
                convert_node(doc, id, child)?;
            }
        }
        Node::Text(text) => {
            let id = doc.create_text(text.deref());
            doc.append_child(parent, id)?;
        }
        _ => {}
    }
    Ok(())
}

fn copy_attributes(
    doc: &mut Document,
    id: NodeId,
    element: &scraper::node::Element,
) -> Result<(), DomError> {
    for (name, value) in element.attrs() {
        doc.set_attr(id, name, value)?;
    }
    if let Some(inline) = element.attr("style") {
        let mut rect = Rect::default();
        for (name, value) in parse_declarations(inline) {
            match name.as_str() {
                "top" => rect.y = parse_length(&value).unwrap_or(rect.y),
                "left" => rect.x = parse_length(&value).unwrap_or(rect.x),
                "width" => rect.width = parse_length(&value).unwrap_or(rect.width),
                "height" => rect.height = parse_length(&value).unwrap_or(rect.height),
                _ => {}
            }
            doc.set_style(id, &name, &value)?;
        }
        doc.set_rect(id, rect)?;
    }
    Ok(())
}

fn parse_declarations(source: &str) -> Vec<(String, String)> {
    source
        .split(';')
        .filter_map(|declaration| {
            let (name, value) = declaration.split_once(':')?;
            let name = name.trim().to_ascii_lowercase();
            let value = value.trim();
            if name.is_empty() || value.is_empty() {
                return None;
            }
            Some((name, value.to_string()))
        })
        .collect()
}

fn parse_length(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(stripped) = trimmed.strip_suffix("px") {
        return stripped.trim().parse().ok();
    }
    trimmed.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::Selector;

    #[test]
    fn test_parses_body_subtree() {
        let doc = Document::parse_html(
            r#"
            <html>
                <head><title>Ignored</title><style>p { color: red }</style></head>
                <body>
                    <h1 data-highlight-text>Hello <em>kinetic</em></h1>
                    <script>console.log("skip")</script>
                </body>
            </html>
            "#,
        )
        .unwrap();

        let headings = doc.query_all(&Selector::attribute("data-highlight-text"));
        assert_eq!(headings.len(), 1);
        assert_eq!(doc.text_content(headings[0]), "Hello kinetic");
        assert!(!doc.text_content(doc.root()).contains("skip"));
    }

    #[test]
    fn test_inline_style_becomes_rect() {
        let doc = Document::parse_html(
            r#"<body><section data-parallax="trigger" style="top: 1200px; height:400px; width: 800px; opacity: 0.5"></section></body>"#,
        )
        .unwrap();
        let section = doc.query_all(&Selector::attribute("data-parallax"))[0];
        let rect = doc.rect(section);
        assert_eq!(rect.top(), 1200.0);
        assert_eq!(rect.height, 400.0);
        assert_eq!(rect.width, 800.0);
        assert_eq!(doc.style(section, "opacity"), Some("0.5"));
    }

    #[test]
    fn test_parse_length_variants() {
        assert_eq!(parse_length("12px"), Some(12.0));
        assert_eq!(parse_length(" 7.5 "), Some(7.5));
        assert_eq!(parse_length("auto"), None);
    }
}
