//! Effect errors and the diagnostics channel.
//!
//! Every failure while wiring an effect is non-fatal: the builder skips the
//! element (or the whole pass when a collaborator is missing) and the error
//! lands in [`Diagnostics`], which logs it and keeps it for inspection.

use std::fmt;

use kinetic_dom::{DomError, NodeId};
use kinetic_text::SplitError;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::effects::EffectKind;

/// Runtime capability an effect depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Collaborator {
    Animator,
    ScrollObserver,
    TextSegmentation,
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Animator => "animator",
            Self::ScrollObserver => "scroll observer",
            Self::TextSegmentation => "text segmentation",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum EffectError {
    #[error("{0} is not available")]
    CollaboratorUnavailable(Collaborator),

    #[error("malformed {attribute}=\"{value}\" on {element}: {reason}")]
    MalformedAttribute {
        element: NodeId,
        attribute: String,
        value: String,
        reason: String,
    },

    #[error("{element} has no {selector} element")]
    MissingTarget { element: NodeId, selector: String },

    #[error(transparent)]
    Dom(#[from] DomError),

    #[error(transparent)]
    Split(#[from] SplitError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    CollaboratorUnavailable,
    MalformedAttribute,
    MissingTarget,
    Document,
}

impl EffectError {
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Self::CollaboratorUnavailable(_) => DiagnosticKind::CollaboratorUnavailable,
            Self::MalformedAttribute { .. } => DiagnosticKind::MalformedAttribute,
            Self::MissingTarget { .. } => DiagnosticKind::MissingTarget,
            Self::Dom(_) | Self::Split(_) => DiagnosticKind::Document,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub effect: EffectKind,
    pub element: Option<NodeId>,
    pub kind: DiagnosticKind,
    pub message: String,
}

/// Operator-visible record of skipped work.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, effect: EffectKind, element: Option<NodeId>, error: &EffectError) {
        match element {
            Some(element) => warn!(effect = %effect, element = %element, "{error}"),
            None => warn!(effect = %effect, "{error}"),
        }
        self.entries.push(Diagnostic {
            effect,
            element,
            kind: error.kind(),
            message: error.to_string(),
        });
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_records_kind_and_message() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.report(
            EffectKind::Highlight,
            None,
            &EffectError::CollaboratorUnavailable(Collaborator::TextSegmentation),
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics.count(DiagnosticKind::CollaboratorUnavailable), 1);
        assert_eq!(diagnostics.entries()[0].message, "text segmentation is not available");
    }

    #[test]
    fn test_dom_errors_are_document_kind() {
        let err = EffectError::from(DomError::RootRemoval);
        assert_eq!(err.kind(), DiagnosticKind::Document);
    }
}
