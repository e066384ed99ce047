//! Deferred builder passes.
//!
//! Lifecycle signals do not build effects directly: they queue a pass for
//! the next frame, or after the settle delay for scroll-linked effects. A
//! pass already waiting for an effect absorbs any further requests, so a
//! burst of signals builds once.

use tracing::trace;

use crate::effects::EffectKind;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Job {
    effect: EffectKind,
    delay_ms: f64,
    /// Set on the first frame after the job was queued.
    due_ms: Option<f64>,
}

#[derive(Debug, Default)]
pub struct Schedule {
    pending: Vec<Job>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a pass for `effect`; `false` if one is already waiting.
    pub fn defer(&mut self, effect: EffectKind, delay_ms: f64) -> bool {
        if self.is_pending(effect) {
            trace!(%effect, "pass already pending");
            return false;
        }
        self.pending.push(Job {
            effect,
            delay_ms: delay_ms.max(0.0),
            due_ms: None,
        });
        true
    }

    pub fn is_pending(&self, effect: EffectKind) -> bool {
        self.pending.iter().any(|job| job.effect == effect)
    }

    /// Remove and return the passes due at `now_ms`, in queue order.
    ///
    /// A job's delay starts counting at the first frame that sees it, so a
    /// zero-delay job runs on that frame.
    pub fn due(&mut self, now_ms: f64) -> Vec<EffectKind> {
        let mut due = Vec::new();
        self.pending.retain_mut(|job| {
            let due_ms = *job.due_ms.get_or_insert(now_ms + job.delay_ms);
            if due_ms <= now_ms {
                due.push(job.effect);
                false
            } else {
                true
            }
        });
        due
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
