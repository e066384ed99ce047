//! Declarative animation orchestration.
//!
//! Pages opt elements into effects with marker attributes; this crate finds
//! them, wires each one into the animation runtime exactly once, and tears
//! everything down symmetrically when the page, the breakpoint or the
//! element goes away.
//!
//! - [`Engine`]: lifecycle coordinator and the host-facing entry point
//! - [`effects`]: parallax, footer parallax, highlight, scramble and magnetic
//!   builders
//! - [`BreakpointContext`]: revert-then-build context for breakpoint-gated
//!   effects
//! - [`SmoothScrollBridge`]: feeds the smooth scroller's offset to the scroll
//!   observer each frame
//! - [`Registrations`]: ownership of everything a builder acquired
//!
//! # Usage
//!
//! ```ignore
//! use kinetic_core::{Engine, LifecycleEvent};
//!
//! let mut doc = Document::parse_html(&html)?;
//! let mut engine = Engine::new(KineticConfig::load_or_default());
//! engine.handle(&mut doc, LifecycleEvent::AppMounted);
//! engine.frame(&mut doc, 16.0);
//! for diagnostic in engine.diagnostics().entries() {
//!     eprintln!("{}: {}", diagnostic.effect, diagnostic.message);
//! }
//! ```

pub mod attrs;
pub mod breakpoints;
pub mod bridge;
pub mod effects;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod registry;
pub mod runtime;
pub mod scanner;
pub mod schedule;
pub mod tracker;

pub use breakpoints::BreakpointContext;
pub use bridge::SmoothScrollBridge;
pub use effects::{Effect, EffectKind, Effects, PointerBinding};
pub use engine::{Engine, EngineStats};
pub use error::{Collaborator, Diagnostic, DiagnosticKind, Diagnostics, EffectError};
pub use lifecycle::LifecycleEvent;
pub use registry::{Registration, Registrations, Resource};
pub use runtime::Runtime;
pub use schedule::Schedule;
pub use tracker::{InitTracker, MarkerAttribute, WeakElementSet};
