//! Collaborators shared by every effect.
//!
//! The animator, scroll observer and text segmentation engine are optional:
//! a host that does not ship one leaves it out, and every effect depending
//! on it reports `CollaboratorUnavailable` instead of wiring anything.
//!
//! # Usage
//!
//! ```ignore
//! let config = KineticConfig::default();
//! let runtime = Runtime::new(&config).without_text_segmentation();
//! assert!(runtime.splitter().is_err());
//! ```

use kinetic_anim::{Animator, MatchMedia, MediaQuery, ScrollObserver, Ticker};
use kinetic_config::KineticConfig;
use kinetic_text::SplitText;
use tracing::warn;

use crate::error::{Collaborator, EffectError};

#[derive(Debug)]
pub struct Runtime {
    animator: Option<Animator>,
    observer: Option<ScrollObserver>,
    splitter: Option<SplitText>,
    pub ticker: Ticker,
    pub media: MatchMedia,
}

impl Runtime {
    /// Full runtime with breakpoint conditions registered from `config`.
    pub fn new(config: &KineticConfig) -> Self {
        let mut media = MatchMedia::new();
        for (name, query) in config.breakpoints.named() {
            match MediaQuery::parse(query) {
                Ok(query) => media.add(name, query),
                Err(err) => warn!(condition = name, error = %err, "skipping breakpoint condition"),
            }
        }
        Self {
            animator: Some(Animator::with_seed(config.scramble.seed)),
            observer: Some(ScrollObserver::new()),
            splitter: Some(SplitText::default()),
            ticker: Ticker::new(),
            media,
        }
    }

    pub fn without_animator(mut self) -> Self {
        self.animator = None;
        self
    }

    pub fn without_scroll_observer(mut self) -> Self {
        self.observer = None;
        self
    }

    pub fn without_text_segmentation(mut self) -> Self {
        self.splitter = None;
        self
    }

    pub fn has(&self, collaborator: Collaborator) -> bool {
        match collaborator {
            Collaborator::Animator => self.animator.is_some(),
            Collaborator::ScrollObserver => self.observer.is_some(),
            Collaborator::TextSegmentation => self.splitter.is_some(),
        }
    }

    /// First missing collaborator out of `required`.
    pub fn require(&self, required: &[Collaborator]) -> Result<(), EffectError> {
        match required.iter().find(|collaborator| !self.has(**collaborator)) {
            Some(missing) => Err(EffectError::CollaboratorUnavailable(*missing)),
            None => Ok(()),
        }
    }

    pub fn animator(&mut self) -> Result<&mut Animator, EffectError> {
        self.animator
            .as_mut()
            .ok_or(EffectError::CollaboratorUnavailable(Collaborator::Animator))
    }

    pub fn observer(&mut self) -> Result<&mut ScrollObserver, EffectError> {
        self.observer
            .as_mut()
            .ok_or(EffectError::CollaboratorUnavailable(Collaborator::ScrollObserver))
    }

    pub fn splitter(&self) -> Result<&SplitText, EffectError> {
        self.splitter
            .as_ref()
            .ok_or(EffectError::CollaboratorUnavailable(Collaborator::TextSegmentation))
    }

    /// Both scroll collaborators at once, for code that feeds observer
    /// updates into timelines.
    pub fn scroll_parts(&mut self) -> Option<(&mut ScrollObserver, &mut Animator)> {
        match (self.observer.as_mut(), self.animator.as_mut()) {
            (Some(observer), Some(animator)) => Some((observer, animator)),
            _ => None,
        }
    }

    pub fn animator_ref(&self) -> Option<&Animator> {
        self.animator.as_ref()
    }

    pub fn observer_ref(&self) -> Option<&ScrollObserver> {
        self.observer.as_ref()
    }
}
