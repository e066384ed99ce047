//! Pointer listener registry.
//!
//! Listeners are plain subscriptions: the document only records which element
//! listens for which pointer kind. The host dispatches events and the owner of
//! the [`ListenerId`] decides what the event does. Releasing a subscription is
//! always explicit (`Document::unlisten`) or implicit when the element is
//! removed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::document::NodeId;

/// Identifier of a pointer listener subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListenerId(pub u64);

/// Pointer event kinds the runtime reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerKind {
    Enter,
    Move,
    Leave,
}

/// A pointer event in client (viewport) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub client_x: f64,
    pub client_y: f64,
}

impl PointerEvent {
    pub fn enter(client_x: f64, client_y: f64) -> Self {
        Self {
            kind: PointerKind::Enter,
            client_x,
            client_y,
        }
    }

    pub fn moved(client_x: f64, client_y: f64) -> Self {
        Self {
            kind: PointerKind::Move,
            client_x,
            client_y,
        }
    }

    pub fn leave(client_x: f64, client_y: f64) -> Self {
        Self {
            kind: PointerKind::Leave,
            client_x,
            client_y,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct Listeners {
    next_id: u64,
    entries: BTreeMap<ListenerId, (NodeId, PointerKind)>,
}

impl Listeners {
    pub(crate) fn add(&mut self, node: NodeId, kind: PointerKind) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.entries.insert(id, (node, kind));
        id
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        self.entries.remove(&id).is_some()
    }

    pub(crate) fn remove_node(&mut self, node: NodeId) {
        self.entries.retain(|_, (owner, _)| *owner != node);
    }

    pub(crate) fn of(&self, node: NodeId) -> Vec<(ListenerId, PointerKind)> {
        self.entries
            .iter()
            .filter(|(_, (owner, _))| *owner == node)
            .map(|(id, (_, kind))| (*id, *kind))
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
