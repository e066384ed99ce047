//! Host lifecycle signals and the builders each one schedules.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::effects::EffectKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// The application finished mounting.
    AppMounted,
    /// The window finished loading every resource.
    WindowLoaded,
    /// A client-side navigation finished rendering the new page.
    PageFinished,
}

impl LifecycleEvent {
    pub fn name(self) -> &'static str {
        match self {
            Self::AppMounted => "app:mounted",
            Self::WindowLoaded => "window:load",
            Self::PageFinished => "page:finish",
        }
    }

    /// Builders that re-scan when this signal arrives.
    ///
    /// Only scroll-linked builders wait for the window load, since their
    /// ranges depend on final layout.
    pub fn effects(self) -> &'static [EffectKind] {
        match self {
            Self::AppMounted | Self::PageFinished => &EffectKind::ALL,
            Self::WindowLoaded => &[EffectKind::Parallax, EffectKind::FooterParallax],
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
