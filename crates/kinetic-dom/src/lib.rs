//! Headless document model for the kinetic runtime.
//!
//! The document is an arena of element and text nodes addressed by
//! generational [`NodeId`] handles. Removing a node bumps the generation of its
//! slot, so a handle held by a tracker or registration never aliases a node
//! inserted later at the same position.
//!
//! # Architecture
//!
//! ```text
//! HTML markup ──► html::parse ──► Document
//!                                   ├── nodes (tag, attributes, inline style, rect)
//!                                   ├── viewport / ready state / render mode
//!                                   └── pointer listener registry
//!
//! Selector::parse("[data-x]:not([data-y])") ──► Document::query_all
//!   (selectors + cssparser, matched through servo_dom::DomElement)
//! ```

mod document;
mod events;
mod html;
mod layout;
mod selector;
mod servo_dom;

pub use document::{Document, DomError, NodeId, ReadyState, RenderMode};
pub use events::{ListenerId, PointerEvent, PointerKind};
pub use layout::{Rect, Viewport};
pub use selector::Selector;
