//! Text segmentation and scramble-text generation.
//!
//! - [`SplitText`] replaces the text nodes of an element with word and
//!   character elements and hands back a [`SplitHandle`] that restores the
//!   original nodes exactly.
//! - [`Scrambler`] renders the intermediate frames of a character
//!   substitution effect that settles on a destination string.

pub mod scramble;
pub mod segment;

pub use scramble::{Alphabet, DEFAULT_HOVER_ALPHABET, Scrambler};
pub use segment::{SplitError, SplitHandle, SplitOptions, SplitText, graphemes, word_runs};
