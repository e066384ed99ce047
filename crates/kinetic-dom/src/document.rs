//! Arena-backed document tree.
//!
//! # Usage
//!
//! ```ignore
//! use kinetic_dom::{Document, Selector};
//!
//! let mut doc = Document::new();
//! let heading = doc.create_element("h1");
//! doc.set_attr(heading, "data-highlight-text", "")?;
//! doc.set_text_content(heading, "Hello")?;
//! doc.append_child(doc.root(), heading)?;
//!
//! let selector = Selector::parse("[data-highlight-text]")?;
//! assert_eq!(doc.query_all(&selector), vec![heading]);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::events::{ListenerId, Listeners, PointerKind};
use crate::layout::{Rect, Viewport};
use crate::selector::Selector;

/// Generational handle to a node in a [`Document`].
///
/// Handles are cheap to copy and never keep a node alive: once the node is
/// removed the handle goes stale and every lookup through it fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

#[derive(Debug, Error)]
pub enum DomError {
    #[error("node {0} is no longer part of the document")]
    StaleNode(NodeId),
    #[error("node {0} is not an element")]
    NotAnElement(NodeId),
    #[error("cannot insert {child} under {parent}: the child is an ancestor of the parent")]
    Cycle { parent: NodeId, child: NodeId },
    #[error("the document root cannot be removed")]
    RootRemoval,
    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },
    #[error("HTML document has no body element")]
    MissingBody,
}

/// Loading state of the page, mirroring `document.readyState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadyState {
    #[default]
    Loading,
    Complete,
}

/// Whether the document runs in a client with a live DOM or is being
/// rendered on a server where no DOM work may happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    #[default]
    Client,
    Server,
}

#[derive(Debug, Clone)]
pub(crate) struct ElementData {
    tag: String,
    attributes: Vec<(String, String)>,
    style: BTreeMap<String, String>,
    rect: Rect,
}

impl ElementData {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
            style: BTreeMap::new(),
            rect: Rect::default(),
        }
    }
}

#[derive(Debug, Clone)]
enum NodeKind {
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// A mutable document tree with viewport and lifecycle state.
#[derive(Debug)]
pub struct Document {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
    viewport: Viewport,
    scroll_height: Option<f64>,
    ready_state: ReadyState,
    mode: RenderMode,
    listeners: Listeners,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty client-side document with a `body` root.
    pub fn new() -> Self {
        let mut doc = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
            viewport: Viewport::default(),
            scroll_height: None,
            ready_state: ReadyState::Loading,
            mode: RenderMode::Client,
            listeners: Listeners::default(),
        };
        doc.root = doc.alloc(Node {
            parent: None,
            children: Vec::new(),
            kind: NodeKind::Element(ElementData::new("body")),
        });
        doc
    }

    /// Create a document in server render mode.
    pub fn server() -> Self {
        let mut doc = Self::new();
        doc.mode = RenderMode::Server;
        doc
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId {
            index,
            generation: 0,
        }
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    pub(crate) fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.node(id)?.kind {
            NodeKind::Element(data) => Some(data),
            NodeKind::Text(_) => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut ElementData, DomError> {
        let node = self.node_mut(id).ok_or(DomError::StaleNode(id))?;
        match &mut node.kind {
            NodeKind::Element(data) => Ok(data),
            NodeKind::Text(_) => Err(DomError::NotAnElement(id)),
        }
    }

    // ========================================================================
    // Document state
    // ========================================================================

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn is_server(&self) -> bool {
        self.mode == RenderMode::Server
    }

    pub fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    pub fn set_ready_state(&mut self, state: ReadyState) {
        self.ready_state = state;
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Total scrollable height of the document.
    ///
    /// Unless overridden, this is the lowest bottom edge of any connected
    /// element, and never less than the viewport height.
    pub fn scroll_height(&self) -> f64 {
        let height = match self.scroll_height {
            Some(height) => height,
            None => self
                .descendants(self.root)
                .into_iter()
                .filter_map(|id| self.element(id).map(|data| data.rect.bottom()))
                .fold(self.rect(self.root).bottom(), f64::max),
        };
        height.max(self.viewport.height)
    }

    pub fn set_scroll_height(&mut self, height: Option<f64>) {
        self.scroll_height = height;
    }

    /// Largest reachable scroll offset.
    pub fn max_scroll(&self) -> f64 {
        (self.scroll_height() - self.viewport.height).max(0.0)
    }

    // ========================================================================
    // Tree structure
    // ========================================================================

    /// Whether the handle still refers to a live node (connected or not).
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Whether the node is alive and attached under the document root.
    pub fn contains(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return self.is_alive(current);
            }
            match self.node(current).and_then(|node| node.parent) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(Node {
            parent: None,
            children: Vec::new(),
            kind: NodeKind::Element(ElementData::new(tag)),
        })
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(Node {
            parent: None,
            children: Vec::new(),
            kind: NodeKind::Text(text.to_string()),
        })
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        let index = self.children(parent).len();
        self.insert_child(parent, index, child)
    }

    /// Insert `child` under `parent` at `index` (clamped to the child count),
    /// detaching it from its previous parent first.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<(), DomError> {
        if self.element(parent).is_none() {
            return Err(if self.is_alive(parent) {
                DomError::NotAnElement(parent)
            } else {
                DomError::StaleNode(parent)
            });
        }
        if !self.is_alive(child) {
            return Err(DomError::StaleNode(child));
        }
        let mut ancestor = Some(parent);
        while let Some(current) = ancestor {
            if current == child {
                return Err(DomError::Cycle { parent, child });
            }
            ancestor = self.node(current).and_then(|node| node.parent);
        }

        self.detach(child)?;
        let parent_node = self.node_mut(parent).ok_or(DomError::StaleNode(parent))?;
        let index = index.min(parent_node.children.len());
        parent_node.children.insert(index, child);
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
        Ok(())
    }

    /// Detach a node from its parent, keeping it (and its subtree) alive.
    ///
    /// Returns the previous `(parent, index)` position, if any.
    pub fn detach(&mut self, id: NodeId) -> Result<Option<(NodeId, usize)>, DomError> {
        let parent = self.node(id).ok_or(DomError::StaleNode(id))?.parent;
        let Some(parent) = parent else {
            return Ok(None);
        };
        let mut position = None;
        if let Some(parent_node) = self.node_mut(parent) {
            if let Some(index) = parent_node.children.iter().position(|c| *c == id) {
                parent_node.children.remove(index);
                position = Some((parent, index));
            }
        }
        if let Some(node) = self.node_mut(id) {
            node.parent = None;
        }
        Ok(position)
    }

    /// Remove a node and its whole subtree from the document.
    ///
    /// Every handle into the subtree goes stale and its pointer listeners are
    /// dropped.
    pub fn remove(&mut self, id: NodeId) -> Result<(), DomError> {
        if id == self.root {
            return Err(DomError::RootRemoval);
        }
        self.detach(id)?;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let slot = &mut self.slots[current.index as usize];
            if slot.generation != current.generation {
                continue;
            }
            if let Some(node) = slot.node.take() {
                slot.generation = slot.generation.wrapping_add(1);
                stack.extend(node.children);
                self.free.push(current.index);
                self.listeners.remove_node(current);
            }
        }
        Ok(())
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|node| node.parent)
    }

    /// All descendants of `id` in document (pre-)order, excluding `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.node(id).map(|n| &n.kind), Some(NodeKind::Text(_)))
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|data| data.tag.as_str())
    }

    // ========================================================================
    // Text
    // ========================================================================

    /// Raw text of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id)?.kind {
            NodeKind::Text(text) => Some(text.as_str()),
            NodeKind::Element(_) => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, value: &str) -> Result<(), DomError> {
        let node = self.node_mut(id).ok_or(DomError::StaleNode(id))?;
        match &mut node.kind {
            NodeKind::Text(text) => {
                *text = value.to_string();
                Ok(())
            }
            NodeKind::Element(_) => Err(DomError::NotAnElement(id)),
        }
    }

    /// Concatenated text of the node and all its descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        match self.node(id).map(|node| &node.kind) {
            Some(NodeKind::Text(text)) => text.clone(),
            Some(NodeKind::Element(_)) => {
                let mut content = String::new();
                for child in self.children(id) {
                    content.push_str(&self.text_content(*child));
                }
                content
            }
            None => String::new(),
        }
    }

    /// Replace every child of an element with a single text node.
    pub fn set_text_content(&mut self, id: NodeId, value: &str) -> Result<(), DomError> {
        if self.is_text(id) {
            return self.set_text(id, value);
        }
        self.element_mut(id)?;
        for child in self.children(id).to_vec() {
            self.remove(child)?;
        }
        if !value.is_empty() {
            let text = self.create_text(value);
            self.append_child(id, text)?;
        }
        Ok(())
    }

    // ========================================================================
    // Attributes
    // ========================================================================

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?
            .attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    pub fn attributes(&self, id: NodeId) -> &[(String, String)] {
        self.element(id)
            .map(|data| data.attributes.as_slice())
            .unwrap_or(&[])
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let data = self.element_mut(id)?;
        match data.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => data
                .attributes
                .push((name.to_string(), value.to_string())),
        }
        Ok(())
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Result<Option<String>, DomError> {
        let data = self.element_mut(id)?;
        let index = data.attributes.iter().position(|(key, _)| key == name);
        Ok(index.map(|index| data.attributes.remove(index).1))
    }

    // ========================================================================
    // Inline style
    // ========================================================================

    pub fn style(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.style.get(name).map(String::as_str)
    }

    pub fn styles(&self, id: NodeId) -> Option<&BTreeMap<String, String>> {
        self.element(id).map(|data| &data.style)
    }

    pub fn set_style(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        self.element_mut(id)?
            .style
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    pub fn remove_style(&mut self, id: NodeId, name: &str) -> Result<Option<String>, DomError> {
        Ok(self.element_mut(id)?.style.remove(name))
    }

    /// Drop every inline style property of the element.
    pub fn clear_style(&mut self, id: NodeId) -> Result<(), DomError> {
        self.element_mut(id)?.style.clear();
        Ok(())
    }

    // ========================================================================
    // Layout
    // ========================================================================

    /// Layout box in document coordinates (zero for text nodes and stale handles).
    pub fn rect(&self, id: NodeId) -> Rect {
        self.element(id).map(|data| data.rect).unwrap_or_default()
    }

    pub fn set_rect(&mut self, id: NodeId, rect: Rect) -> Result<(), DomError> {
        self.element_mut(id)?.rect = rect;
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Every connected element matching `selector`, in document order,
    /// including the root.
    pub fn query_all(&self, selector: &Selector) -> Vec<NodeId> {
        std::iter::once(self.root)
            .chain(self.descendants(self.root))
            .filter(|id| selector.matches(self, *id))
            .collect()
    }

    /// Matching descendants of `scope` in document order.
    pub fn query_all_within(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|id| selector.matches(self, *id))
            .collect()
    }

    /// First matching descendant of `scope`.
    pub fn query_first_within(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|id| selector.matches(self, *id))
    }

    // ========================================================================
    // Pointer listeners
    // ========================================================================

    pub fn listen(&mut self, id: NodeId, kind: PointerKind) -> Result<ListenerId, DomError> {
        self.element_mut(id)?;
        Ok(self.listeners.add(id, kind))
    }

    pub fn unlisten(&mut self, listener: ListenerId) -> bool {
        self.listeners.remove(listener)
    }

    pub fn listeners_of(&self, id: NodeId) -> Vec<(ListenerId, PointerKind)> {
        self.listeners.of(id)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}
