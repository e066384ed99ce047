//! Marker-attribute scanning.
//!
//! Scanning is a pure query: it never marks anything. Builders mark an
//! element through its [`InitTracker`] once wiring succeeded (or, for the
//! marker-attribute strategy, right before wiring).

use kinetic_dom::{Document, NodeId, Selector};
use tracing::trace;

use crate::tracker::InitTracker;

/// Elements under `scope` (the whole document when `None`) matching
/// `selector`, in document order. Empty during server rendering.
pub fn scan(doc: &Document, selector: &Selector, scope: Option<NodeId>) -> Vec<NodeId> {
    if doc.is_server() {
        trace!(selector = %selector, "skipping scan during server rendering");
        return Vec::new();
    }
    match scope {
        Some(scope) => doc.query_all_within(scope, selector),
        None => doc.query_all(selector),
    }
}

/// Matching elements the tracker has not seen yet.
pub fn scan_untracked<T: InitTracker>(
    doc: &Document,
    selector: &Selector,
    tracker: &T,
) -> Vec<NodeId> {
    let selector = tracker.narrow(selector.clone());
    let found: Vec<NodeId> = scan(doc, &selector, None)
        .into_iter()
        .filter(|element| !tracker.is_initialized(doc, *element))
        .collect();
    trace!(selector = %selector, count = found.len(), "scanned");
    found
}
