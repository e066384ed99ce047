//! The orchestration engine.
//!
//! [`Engine`] owns the collaborator runtime and every registration, and is
//! the only thing a host talks to: it forwards lifecycle signals, frame
//! timestamps, pointer events, scroll input and viewport changes. Nothing
//! returned from these entry points is an error; per-element failures land
//! in [`Engine::diagnostics`].
//!
//! # Usage
//!
//! ```ignore
//! let mut engine = Engine::new(KineticConfig::load_or_default());
//! engine.bind(&doc);
//! engine.handle(&mut doc, LifecycleEvent::AppMounted);
//! let mut now = 0.0;
//! loop {
//!     now += 16.0;
//!     engine.frame(&mut doc, now);
//! }
//! ```

use std::collections::BTreeMap;

use kinetic_anim::{AnimationEvent, Conditions};
use kinetic_config::KineticConfig;
use kinetic_dom::{Document, NodeId, PointerEvent, ReadyState, Viewport};
use serde::Serialize;
use tracing::{debug, info, trace};

use crate::breakpoints::BreakpointContext;
use crate::bridge::{SmoothScrollBridge, options_from_config};
use crate::effects::{self, BuildContext, EffectKind, Effects};
use crate::error::Diagnostics;
use crate::lifecycle::LifecycleEvent;
use crate::registry::Registrations;
use crate::runtime::Runtime;
use crate::schedule::Schedule;

/// Snapshot of the engine's live state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineStats {
    pub registrations: BTreeMap<EffectKind, usize>,
    pub timelines: usize,
    pub triggers: usize,
    pub listeners: usize,
    pub pending_passes: usize,
    pub diagnostics: usize,
    pub scroll: f64,
    pub conditions: Vec<String>,
}

#[derive(Debug)]
pub struct Engine {
    config: KineticConfig,
    runtime: Runtime,
    bridge: Option<SmoothScrollBridge>,
    breakpoints: BreakpointContext,
    registrations: Registrations,
    effects: Effects,
    schedule: Schedule,
    diagnostics: Diagnostics,
    bound: bool,
    load_handled: bool,
}

impl Engine {
    pub fn new(config: KineticConfig) -> Self {
        let runtime = Runtime::new(&config);
        Self::with_runtime(config, runtime)
    }

    /// Engine over a runtime that may lack some collaborators.
    pub fn with_runtime(config: KineticConfig, runtime: Runtime) -> Self {
        Self {
            config,
            runtime,
            bridge: None,
            breakpoints: BreakpointContext::new(),
            registrations: Registrations::new(),
            effects: Effects::new(),
            schedule: Schedule::new(),
            diagnostics: Diagnostics::new(),
            bound: false,
            load_handled: false,
        }
    }

    pub fn config(&self) -> &KineticConfig {
        &self.config
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn runtime_mut(&mut self) -> &mut Runtime {
        &mut self.runtime
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn registrations(&self) -> &Registrations {
        &self.registrations
    }

    pub fn breakpoints(&self) -> &BreakpointContext {
        &self.breakpoints
    }

    pub fn effects(&self) -> &Effects {
        &self.effects
    }

    pub fn is_bound(&self) -> bool {
        self.bound
    }

    pub fn pending_passes(&self) -> usize {
        self.schedule.len()
    }

    /// Live registrations across the global and breakpoint contexts.
    pub fn registration_count(&self) -> usize {
        self.registrations.len() + self.breakpoints.registrations().map_or(0, Registrations::len)
    }

    pub fn count(&self, effect: EffectKind) -> usize {
        self.registrations.count(effect)
            + self
                .breakpoints
                .registrations()
                .map_or(0, |registrations| registrations.count(effect))
    }

    pub fn scroll(&self) -> f64 {
        self.bridge.as_ref().map_or(0.0, SmoothScrollBridge::scroll)
    }

    /// Attach to a document: install the smooth scroll bridge and, if the
    /// window has already loaded, treat the load signal as delivered.
    /// Binding twice is a no-op; binding a server-rendered document does
    /// nothing.
    pub fn bind(&mut self, doc: &Document) {
        if doc.is_server() {
            debug!("server render, engine stays unbound");
            return;
        }
        if self.bound {
            return;
        }
        let mut bridge =
            SmoothScrollBridge::install(&mut self.runtime, options_from_config(&self.config.smooth_scroll));
        bridge.set_limit(doc.max_scroll());
        self.bridge = Some(bridge);
        self.bound = true;
        info!(
            viewport_width = doc.viewport().width,
            ready = ?doc.ready_state(),
            "engine bound"
        );
        if doc.ready_state() == ReadyState::Complete {
            self.load_handled = true;
            self.schedule_for(LifecycleEvent::WindowLoaded);
        }
    }

    /// Deliver a lifecycle signal. Builders run on later frames.
    pub fn handle(&mut self, doc: &mut Document, event: LifecycleEvent) {
        if doc.is_server() {
            return;
        }
        if !self.bound {
            self.bind(doc);
        }
        match event {
            LifecycleEvent::WindowLoaded if self.load_handled => {
                debug!("window load already handled");
                return;
            }
            LifecycleEvent::WindowLoaded => self.load_handled = true,
            LifecycleEvent::PageFinished => self.prune(doc),
            LifecycleEvent::AppMounted => {}
        }
        info!(%event, "lifecycle signal");
        self.schedule_for(event);
    }

    fn schedule_for(&mut self, event: LifecycleEvent) {
        for &effect in event.effects() {
            let delay_ms = if effect.is_scroll_linked() {
                self.config.lifecycle.settle_delay_ms
            } else {
                0.0
            };
            self.schedule.defer(effect, delay_ms);
        }
    }

    /// Release everything owned by elements that left the document.
    fn prune(&mut self, doc: &mut Document) {
        let released = self.registrations.prune_detached(&mut self.runtime, doc)
            + self.breakpoints.prune_detached(&mut self.runtime, doc);
        self.effects.prune(doc);
        let killed = self
            .runtime
            .animator()
            .map_or(0, |animator| animator.prune_detached(doc));
        if released > 0 || killed > 0 {
            debug!(released, killed, "pruned detached elements");
        }
    }

    /// Advance one frame at host time `now_ms`: run due builder passes, move
    /// the smooth scroller and recompute triggers, then advance clock-driven
    /// timelines. Returns how many registrations were created.
    pub fn frame(&mut self, doc: &mut Document, now_ms: f64) -> usize {
        if !self.bound {
            return 0;
        }
        let frame = self.runtime.ticker.tick(now_ms);

        let mut created = 0;
        let due = self.schedule.due(now_ms);
        for effect in &due {
            created += self.run_pass(doc, *effect);
        }

        if let Some(bridge) = self.bridge.as_mut() {
            if frame.is_due(bridge.ticker_id()) {
                bridge.set_limit(doc.max_scroll());
                bridge.on_frame(&mut self.runtime, doc, now_ms, !due.is_empty());
            }
        }

        if let Ok(animator) = self.runtime.animator() {
            animator.tick(doc, frame.delta_seconds());
        }
        self.settle_completed(doc);
        trace!(frame = self.runtime.ticker.frame_count(), created, "frame");
        created
    }

    /// One-shot registrations are settled once their timeline completes.
    fn settle_completed(&mut self, doc: &mut Document) {
        let Ok(animator) = self.runtime.animator() else {
            return;
        };
        for event in animator.drain_events() {
            if let AnimationEvent::Completed { timeline, .. } = event {
                if let Some(registration) = self.registrations.take_by_timeline(timeline) {
                    debug!(
                        effect = %registration.effect,
                        variant = registration.variant,
                        element = %registration.element,
                        "one-shot animation finished"
                    );
                    registration.settle(&mut self.runtime, doc);
                }
            }
        }
    }

    fn run_pass(&mut self, doc: &mut Document, effect: EffectKind) -> usize {
        let created = match effect {
            EffectKind::Parallax => self.rebuild_breakpoint_context(doc),
            other => {
                let mut cx = BuildContext {
                    doc,
                    runtime: &mut self.runtime,
                    registrations: &mut self.registrations,
                    diagnostics: &mut self.diagnostics,
                    config: &self.config,
                    conditions: None,
                };
                effects::run(self.effects.get_mut(other), &mut cx)
            }
        };
        debug!(%effect, created, "builder pass");
        created
    }

    fn current_conditions(&mut self, viewport: &Viewport) -> Conditions {
        let media = &mut self.runtime.media;
        media.update(viewport);
        media
            .current()
            .cloned()
            .unwrap_or_else(|| media.evaluate(viewport))
    }

    /// Revert the breakpoint context and rebuild its effects.
    fn rebuild_breakpoint_context(&mut self, doc: &mut Document) -> usize {
        let conditions = self.current_conditions(&doc.viewport());
        let parallax = &mut self.effects.parallax;
        let diagnostics = &mut self.diagnostics;
        let config = &self.config;
        self.breakpoints.replace(
            &mut self.runtime,
            doc,
            conditions,
            |runtime, doc, conditions, registrations| {
                let mut cx = BuildContext {
                    doc,
                    runtime,
                    registrations,
                    diagnostics,
                    config,
                    conditions: Some(conditions),
                };
                effects::run(parallax, &mut cx);
            },
        )
    }

    /// Route a pointer event on `element` to the registrations listening
    /// for it.
    pub fn pointer(&mut self, doc: &mut Document, element: NodeId, event: PointerEvent) {
        if !self.bound {
            return;
        }
        let scroll = self.scroll();
        for (listener, kind) in doc.listeners_of(element) {
            if kind != event.kind {
                continue;
            }
            let Some(registration) = self.registrations.by_listener_mut(listener) else {
                continue;
            };
            let effect = registration.effect;
            let Some(binding) = registration.binding.as_mut() else {
                continue;
            };
            if let Err(err) = binding.handle(&mut self.runtime, doc, &event, scroll) {
                self.diagnostics.report(effect, Some(element), &err);
            }
        }
    }

    pub fn wheel(&mut self, delta: f64) {
        if let Some(bridge) = self.bridge.as_mut() {
            bridge.wheel(delta);
        }
    }

    pub fn touch(&mut self, delta: f64) {
        if let Some(bridge) = self.bridge.as_mut() {
            bridge.touch(delta);
        }
    }

    pub fn scroll_to(&mut self, target: f64, immediate: bool) {
        if let Some(bridge) = self.bridge.as_mut() {
            bridge.scroll_to(target, immediate);
        }
    }

    /// Recompute trigger ranges from current layout and re-sync.
    pub fn refresh(&mut self, doc: &mut Document) {
        if let Ok(observer) = self.runtime.observer() {
            observer.refresh(doc);
        }
        if let Some(bridge) = self.bridge.as_mut() {
            bridge.set_limit(doc.max_scroll());
            bridge.sync(&mut self.runtime, doc);
        }
    }

    /// Apply a new viewport. A change in breakpoint conditions replaces the
    /// breakpoint context.
    pub fn resize(&mut self, doc: &mut Document, viewport: Viewport) {
        doc.set_viewport(viewport);
        if !self.bound {
            return;
        }
        let changed = self.runtime.media.update(&viewport);
        if let Some(conditions) = changed {
            info!(active = ?conditions.active(), "breakpoint conditions changed");
            if self.breakpoints.is_active() {
                self.rebuild_breakpoint_context(doc);
            }
        }
        self.refresh(doc);
    }

    /// Release every registration and detach from the frame driver. The
    /// engine can be bound again afterwards.
    pub fn teardown(&mut self, doc: &mut Document) {
        let released = self.breakpoints.revert(&mut self.runtime, doc)
            + self.registrations.release_all(&mut self.runtime, doc);
        if let Some(bridge) = self.bridge.take() {
            bridge.uninstall(&mut self.runtime);
        }
        self.schedule.clear();
        self.effects.reset();
        self.runtime.media.reset();
        self.bound = false;
        self.load_handled = false;
        info!(released, "engine torn down");
    }

    pub fn stats(&self) -> EngineStats {
        let mut registrations = BTreeMap::new();
        for effect in EffectKind::ALL {
            registrations.insert(effect, self.count(effect));
        }
        EngineStats {
            registrations,
            timelines: self.runtime.animator_ref().map_or(0, |animator| animator.len()),
            triggers: self.runtime.observer_ref().map_or(0, |observer| observer.len()),
            listeners: self
                .registrations
                .iter()
                .map(|registration| registration.listeners().count())
                .sum(),
            pending_passes: self.schedule.len(),
            diagnostics: self.diagnostics.len(),
            scroll: self.scroll(),
            conditions: self
                .breakpoints
                .conditions()
                .map(|conditions| conditions.active().into_iter().map(str::to_string).collect())
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<body>
        <section data-parallax="trigger" style="top: 900px; height: 600px"></section>
        <h2 data-highlight-text style="top: 1600px; height: 100px">Hello world</h2>
        <div style="top: 2000px; height: 1000px"></div>
    </body>"#;

    fn run_frames(engine: &mut Engine, doc: &mut Document, from_ms: f64, count: usize) -> f64 {
        let mut now = from_ms;
        for _ in 0..count {
            now += 16.0;
            engine.frame(doc, now);
        }
        now
    }

    #[test]
    fn test_text_effects_wait_one_frame() {
        let mut doc = Document::parse_html(PAGE).unwrap();
        let mut engine = Engine::new(KineticConfig::default());
        engine.handle(&mut doc, LifecycleEvent::AppMounted);
        assert_eq!(engine.registration_count(), 0);

        engine.frame(&mut doc, 0.0);
        assert_eq!(engine.count(EffectKind::Highlight), 1);
        assert_eq!(engine.count(EffectKind::Parallax), 0);

        run_frames(&mut engine, &mut doc, 0.0, 8);
        assert_eq!(engine.count(EffectKind::Parallax), 1);
        assert_eq!(engine.pending_passes(), 0);
    }

    #[test]
    fn test_burst_of_signals_builds_once() {
        let mut doc = Document::parse_html(PAGE).unwrap();
        let mut engine = Engine::new(KineticConfig::default());
        engine.handle(&mut doc, LifecycleEvent::AppMounted);
        engine.handle(&mut doc, LifecycleEvent::WindowLoaded);
        engine.handle(&mut doc, LifecycleEvent::PageFinished);
        assert_eq!(engine.pending_passes(), 5);
    }

    #[test]
    fn test_load_at_bind_ignores_later_load() {
        let mut doc = Document::parse_html(PAGE).unwrap();
        doc.set_ready_state(ReadyState::Complete);
        let mut engine = Engine::new(KineticConfig::default());
        engine.bind(&doc);
        assert_eq!(engine.pending_passes(), 2);

        run_frames(&mut engine, &mut doc, 0.0, 10);
        engine.handle(&mut doc, LifecycleEvent::WindowLoaded);
        assert_eq!(engine.pending_passes(), 0);
    }

    #[test]
    fn test_server_render_is_noop() {
        let mut doc = Document::server();
        assert!(doc.is_server());
        let mut engine = Engine::new(KineticConfig::default());
        engine.handle(&mut doc, LifecycleEvent::AppMounted);
        assert_eq!(engine.frame(&mut doc, 16.0), 0);
        assert!(!engine.is_bound());
        assert!(engine.diagnostics().is_empty());
    }

    #[test]
    fn test_scroller_only_runs_while_subscribed() {
        let mut doc = Document::parse_html(PAGE).unwrap();
        let mut engine = Engine::new(KineticConfig::default());
        engine.handle(&mut doc, LifecycleEvent::AppMounted);
        let now = run_frames(&mut engine, &mut doc, 0.0, 2);

        let id = engine.bridge.as_ref().unwrap().ticker_id();
        assert!(engine.runtime_mut().ticker.remove(id));
        engine.wheel(300.0);
        run_frames(&mut engine, &mut doc, now, 30);
        assert_eq!(engine.scroll(), 0.0);

        engine.scroll_to(500.0, true);
        run_frames(&mut engine, &mut doc, now + 480.0, 4);
        let observer = engine.runtime().observer_ref().unwrap();
        assert_eq!(observer.scroll(), 0.0);
    }

    #[test]
    fn test_teardown_releases_everything() {
        let mut doc = Document::parse_html(PAGE).unwrap();
        let heading = doc.query_all(&kinetic_dom::Selector::parse("h2").unwrap())[0];
        let mut engine = Engine::new(KineticConfig::default());
        engine.handle(&mut doc, LifecycleEvent::AppMounted);
        run_frames(&mut engine, &mut doc, 0.0, 10);
        assert_eq!(engine.registration_count(), 2);

        engine.teardown(&mut doc);
        let stats = engine.stats();
        assert_eq!(engine.registration_count(), 0);
        assert_eq!(stats.timelines, 0);
        assert_eq!(stats.triggers, 0);
        assert!(engine.runtime().ticker.subscribers().is_empty());
        assert_eq!(doc.text_content(heading), "Hello world");
        assert_eq!(doc.children(heading).len(), 1);
    }
}
