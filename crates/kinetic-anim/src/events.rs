//! Timeline lifecycle events.
//!
//! The animator records state changes in an [`EventQueue`] which callers
//! drain after each update.
//!
//! # Usage
//!
//! ```ignore
//! animator.tick(&mut doc, 1.0 / 60.0);
//! for event in animator.drain_events() {
//!     if let AnimationEvent::Completed { timeline, .. } = event {
//!         // release resources owned by the timeline
//!     }
//! }
//! ```

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::types::TimelineId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnimationEvent {
    /// A clock-driven timeline rendered its first frame past time zero.
    Started {
        timeline: TimelineId,
        label: Option<String>,
    },
    /// A clock-driven timeline reached its end.
    Completed {
        timeline: TimelineId,
        label: Option<String>,
    },
    /// A timeline was removed without restoring its targets.
    Killed {
        timeline: TimelineId,
        label: Option<String>,
    },
    /// A timeline was removed and its targets restored.
    Reverted {
        timeline: TimelineId,
        label: Option<String>,
    },
}

impl AnimationEvent {
    pub fn timeline(&self) -> TimelineId {
        match self {
            Self::Started { timeline, .. }
            | Self::Completed { timeline, .. }
            | Self::Killed { timeline, .. }
            | Self::Reverted { timeline, .. } => *timeline,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Started { label, .. }
            | Self::Completed { label, .. }
            | Self::Killed { label, .. }
            | Self::Reverted { label, .. } => label.as_deref(),
        }
    }
}

/// Queue of pending animation events.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<AnimationEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: AnimationEvent) {
        self.events.push_back(event);
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn pop(&mut self) -> Option<AnimationEvent> {
        self.events.pop_front()
    }

    pub fn drain(&mut self) -> impl Iterator<Item = AnimationEvent> + '_ {
        self.events.drain(..)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_is_fifo() {
        let mut queue = EventQueue::new();
        let first = TimelineId(1);
        let second = TimelineId(2);
        queue.push(AnimationEvent::Started {
            timeline: first,
            label: None,
        });
        queue.push(AnimationEvent::Completed {
            timeline: second,
            label: Some("scramble".to_string()),
        });

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop().map(|e| e.timeline()), Some(first));
        let last = queue.pop().unwrap();
        assert_eq!(last.label(), Some("scramble"));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_drain_empties_queue() {
        let mut queue = EventQueue::new();
        queue.push(AnimationEvent::Killed {
            timeline: TimelineId(3),
            label: None,
        });
        assert_eq!(queue.drain().count(), 1);
        assert!(queue.is_empty());
    }
}
