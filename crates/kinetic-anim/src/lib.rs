//! Headless animation runtime.
//!
//! This crate provides the runtime pieces effects are built on:
//! - [`Animator`]: timelines of tweens over document elements, driven either
//!   by a clock or directly by a progress value
//! - [`Ease`]: the easing library used by tweens
//! - [`Ticker`]: the shared frame driver
//! - [`ScrollObserver`]: scroll-bound triggers and their progress
//! - [`MatchMedia`]: named viewport conditions
//! - [`SmoothScroll`]: a damped virtual scroll position

pub mod animator;
pub mod easing;
pub mod events;
pub mod media;
pub mod scroll;
pub mod smooth;
pub mod ticker;
pub mod timeline;
pub mod types;

pub use animator::Animator;
pub use easing::{Ease, EaseDirection, EaseParseError};
pub use events::{AnimationEvent, EventQueue};
pub use media::{Conditions, MatchMedia, MediaQuery, MediaQueryError};
pub use scroll::{
    ScrollObserver, TriggerId, TriggerParseError, TriggerPosition, TriggerSpec, TriggerUpdate,
};
pub use smooth::{Orientation, SmoothScroll, SmoothScrollOptions};
pub use ticker::{Frame, Ticker, TickerId};
pub use timeline::{ClearProps, Position, ScrambleTrack, Timeline, Tween};
pub use types::{Property, TimelineId, Transform};
