//! Reversible word/character segmentation.
//!
//! # Usage
//!
//! ```ignore
//! let splitter = SplitText::new(SplitOptions::default());
//! let handle = splitter.split(&mut doc, heading)?;
//! for ch in handle.chars() {
//!     // animate each character element
//! }
//! handle.revert(&mut doc)?;
//! ```

use kinetic_dom::{Document, DomError, NodeId};
use thiserror::Error;
use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Error)]
pub enum SplitError {
    #[error("cannot split {0}: not an element")]
    NotAnElement(NodeId),
    #[error(transparent)]
    Dom(#[from] DomError),
}

/// Which units to produce and how to label them.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitOptions {
    /// Also split every word into character elements.
    pub chars: bool,
    pub word_class: String,
    pub char_class: String,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            chars: true,
            word_class: "word".to_string(),
            char_class: "char".to_string(),
        }
    }
}

/// Text segmentation engine.
#[derive(Debug, Clone, Default)]
pub struct SplitText {
    options: SplitOptions,
}

#[derive(Debug)]
struct ReplacedText {
    original: NodeId,
    parent: NodeId,
    index: usize,
    inserted: Vec<NodeId>,
}

/// Record of one split; the only way to undo it.
#[derive(Debug)]
#[must_use = "a split must be reverted to restore the original text nodes"]
pub struct SplitHandle {
    target: NodeId,
    words: Vec<NodeId>,
    chars: Vec<NodeId>,
    replaced: Vec<ReplacedText>,
}

impl SplitText {
    pub fn new(options: SplitOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SplitOptions {
        &self.options
    }

    /// Replace every descendant text node of `target` with word (and
    /// character) elements, in place.
    pub fn split(&self, doc: &mut Document, target: NodeId) -> Result<SplitHandle, SplitError> {
        if !doc.is_alive(target) {
            return Err(DomError::StaleNode(target).into());
        }
        if !doc.is_element(target) {
            return Err(SplitError::NotAnElement(target));
        }

        let text_nodes: Vec<NodeId> = doc
            .descendants(target)
            .into_iter()
            .filter(|id| doc.is_text(*id))
            .collect();

        let mut handle = SplitHandle {
            target,
            words: Vec::new(),
            chars: Vec::new(),
            replaced: Vec::new(),
        };

        for text_node in text_nodes {
            let text = doc.text(text_node).unwrap_or_default().to_string();
            if text.is_empty() {
                continue;
            }
            let Some((parent, index)) = doc.detach(text_node)? else {
                continue;
            };

            let mut inserted = Vec::new();
            for run in word_runs(&text) {
                let node = if run.trim().is_empty() {
                    doc.create_text(run)
                } else {
                    self.build_word(doc, run, &mut handle)?
                };
                doc.insert_child(parent, index + inserted.len(), node)?;
                inserted.push(node);
            }

            handle.replaced.push(ReplacedText {
                original: text_node,
                parent,
                index,
                inserted,
            });
        }

        debug!(
            target = %target,
            words = handle.words.len(),
            chars = handle.chars.len(),
            "split text"
        );
        Ok(handle)
    }

    fn build_word(
        &self,
        doc: &mut Document,
        word: &str,
        handle: &mut SplitHandle,
    ) -> Result<NodeId, SplitError> {
        let element = doc.create_element("div");
        doc.set_attr(element, "class", &self.options.word_class)?;
        doc.set_style(element, "display", "inline-block")?;
        doc.set_style(element, "position", "relative")?;

        if self.options.chars {
            for grapheme in graphemes(word) {
                let ch = doc.create_element("div");
                doc.set_attr(ch, "class", &self.options.char_class)?;
                doc.set_style(ch, "display", "inline-block")?;
                doc.set_style(ch, "position", "relative")?;
                let text = doc.create_text(grapheme);
                doc.append_child(ch, text)?;
                doc.append_child(element, ch)?;
                handle.chars.push(ch);
            }
        } else {
            let text = doc.create_text(word);
            doc.append_child(element, text)?;
        }

        handle.words.push(element);
        Ok(element)
    }
}

impl SplitHandle {
    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn words(&self) -> &[NodeId] {
        &self.words
    }

    pub fn chars(&self) -> &[NodeId] {
        &self.chars
    }

    /// Remove the generated units and put the original text nodes back at
    /// their original positions.
    ///
    /// When the split element has since been removed from the document the
    /// detached originals are released instead.
    pub fn revert(self, doc: &mut Document) -> Result<(), SplitError> {
        for replaced in self.replaced.into_iter().rev() {
            for node in replaced.inserted {
                if doc.is_alive(node) {
                    doc.remove(node)?;
                }
            }
            if !doc.is_alive(replaced.original) {
                continue;
            }
            if doc.is_alive(replaced.parent) {
                doc.insert_child(replaced.parent, replaced.index, replaced.original)?;
            } else {
                doc.remove(replaced.original)?;
            }
        }
        debug!(target = %self.target, "reverted split");
        Ok(())
    }
}

/// Split text into alternating whitespace and non-whitespace runs,
/// keeping grapheme clusters intact.
pub fn word_runs(text: &str) -> Vec<&str> {
    let mut runs = Vec::new();
    let mut start = 0;
    let mut in_space: Option<bool> = None;
    for (offset, grapheme) in text.grapheme_indices(true) {
        let is_space = grapheme.chars().all(char::is_whitespace);
        match in_space {
            Some(previous) if previous != is_space => {
                runs.push(&text[start..offset]);
                start = offset;
            }
            _ => {}
        }
        in_space = Some(is_space);
    }
    if start < text.len() {
        runs.push(&text[start..]);
    }
    runs
}

/// Extended grapheme clusters of `text` in order.
pub fn graphemes(text: &str) -> Vec<&str> {
    text.graphemes(true).collect()
}
