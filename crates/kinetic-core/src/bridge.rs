//! Smooth scroll to scroll observer bridge.
//!
//! The smooth scroller owns the scroll offset; the observer only ever sees
//! the offset the scroller reports. Each frame the scroller advances first,
//! then triggers are recomputed from its new position and scrubbed timelines
//! are seeked to the resulting progress. Lag smoothing on the shared ticker is
//! switched off at install so the scroller's damping is the only smoothing
//! applied.
//!
//! # Usage
//!
//! ```ignore
//! let mut bridge = SmoothScrollBridge::install(&mut runtime, options);
//! bridge.wheel(120.0);
//! bridge.on_frame(&mut runtime, &mut doc, now_ms, false);
//! ```

use kinetic_anim::{Orientation, SmoothScroll, SmoothScrollOptions, TickerId, TriggerUpdate};
use kinetic_config::SmoothScrollConfig;
use kinetic_dom::Document;
use tracing::{debug, trace, warn};

use crate::runtime::Runtime;

/// Scroller options from the config file.
pub fn options_from_config(config: &SmoothScrollConfig) -> SmoothScrollOptions {
    let orientation = match config.orientation.as_str() {
        "vertical" => Orientation::Vertical,
        "horizontal" => Orientation::Horizontal,
        other => {
            warn!(orientation = other, "unknown scroll orientation, using vertical");
            Orientation::Vertical
        }
    };
    SmoothScrollOptions {
        duration: config.duration,
        orientation,
        gesture_orientation: orientation,
        smooth_wheel: config.smooth_wheel,
        wheel_multiplier: config.wheel_multiplier,
        touch_multiplier: config.touch_multiplier,
        infinite: config.infinite,
    }
}

#[derive(Debug)]
pub struct SmoothScrollBridge {
    smooth: SmoothScroll,
    ticker_id: TickerId,
}

impl SmoothScrollBridge {
    /// Subscribe to the shared ticker and disable its lag smoothing.
    pub fn install(runtime: &mut Runtime, options: SmoothScrollOptions) -> Self {
        runtime.ticker.lag_smoothing(0.0, 0.0);
        let ticker_id = runtime.ticker.add();
        debug!(ticker = ticker_id.0, "smooth scroll bridge installed");
        Self {
            smooth: SmoothScroll::new(options),
            ticker_id,
        }
    }

    pub fn uninstall(self, runtime: &mut Runtime) {
        runtime.ticker.remove(self.ticker_id);
        debug!(ticker = self.ticker_id.0, "smooth scroll bridge removed");
    }

    pub fn ticker_id(&self) -> TickerId {
        self.ticker_id
    }

    pub fn scroller(&self) -> &SmoothScroll {
        &self.smooth
    }

    pub fn scroll(&self) -> f64 {
        self.smooth.scroll()
    }

    pub fn wheel(&mut self, delta: f64) {
        self.smooth.wheel(delta);
    }

    pub fn touch(&mut self, delta: f64) {
        self.smooth.touch(delta);
    }

    pub fn scroll_to(&mut self, target: f64, immediate: bool) {
        self.smooth.scroll_to(target, immediate);
    }

    pub fn set_limit(&mut self, limit: f64) {
        self.smooth.set_limit(limit);
    }

    /// Advance the scroller, then recompute the observer if the offset
    /// moved or `force` is set. Returns whether the observer was updated.
    pub fn on_frame(
        &mut self,
        runtime: &mut Runtime,
        doc: &mut Document,
        now_ms: f64,
        force: bool,
    ) -> bool {
        let moved = self.smooth.raf(now_ms);
        if !moved && !force {
            return false;
        }
        self.sync(runtime, doc);
        true
    }

    /// Push the current offset to the observer and apply its updates.
    pub fn sync(&self, runtime: &mut Runtime, doc: &mut Document) {
        let Some((observer, animator)) = runtime.scroll_parts() else {
            return;
        };
        let updates = observer.update(self.smooth.scroll());
        trace!(scroll = self.smooth.scroll(), updates = updates.len(), "observer synced");
        for update in updates {
            match update {
                TriggerUpdate::Progress {
                    animation: Some(timeline),
                    progress,
                    ..
                } => {
                    animator.set_progress(doc, timeline, progress);
                }
                TriggerUpdate::Enter {
                    animation: Some(timeline),
                    ..
                } => {
                    animator.play(timeline);
                }
                _ => {}
            }
        }
    }
}
