//! Scroll-scrubbed character highlight.
//!
//! `[data-highlight-text]` elements are split into words and characters; the
//! characters start faded and reach full opacity one after another as the
//! element scrolls through its range.
//!
//! Attributes: `data-highlight-scroll-start` (`top 90%`),
//! `data-highlight-scroll-end` (`center 40%`), `data-highlight-fade` (`0.2`),
//! `data-highlight-stagger` (`0.1`).

use kinetic_anim::{Ease, Property, Timeline, TriggerSpec, Tween};
use kinetic_dom::{NodeId, Selector};

use super::{BuildContext, Effect, EffectKind};
use crate::attrs::AttrReader;
use crate::error::{Collaborator, EffectError};
use crate::registry::{Registration, Resource};
use crate::scanner::scan_untracked;
use crate::tracker::{InitTracker, MarkerAttribute};

pub const MARKER: &str = "data-highlight-initialized";
pub const DEFAULT_SCROLL_START: &str = "top 90%";
pub const DEFAULT_SCROLL_END: &str = "center 40%";
pub const DEFAULT_FADE: f64 = 0.2;
pub const DEFAULT_STAGGER: f64 = 0.1;

#[derive(Debug)]
pub struct Highlight {
    selector: Selector,
    marker: MarkerAttribute,
}

impl Highlight {
    pub fn new() -> Self {
        Self {
            selector: Selector::attribute("data-highlight-text"),
            marker: MarkerAttribute::new(MARKER),
        }
    }

    fn attach(
        &self,
        cx: &mut BuildContext<'_>,
        heading: NodeId,
        registration: &mut Registration,
    ) -> Result<(), EffectError> {
        let mut reader = AttrReader::new(cx.doc, heading);
        let start = reader.position("data-highlight-scroll-start", DEFAULT_SCROLL_START, false)?;
        let end = reader.position("data-highlight-scroll-end", DEFAULT_SCROLL_END, false)?;
        let fade = reader.number("data-highlight-fade", DEFAULT_FADE);
        let stagger = reader.number("data-highlight-stagger", DEFAULT_STAGGER);
        let errors = reader.finish();
        cx.report_all(EffectKind::Highlight, heading, errors);

        let split = cx.runtime.splitter()?.split(cx.doc, heading)?;
        let chars = split.chars().to_vec();
        registration.push(Resource::Split(split));

        let timeline = Timeline::tween(
            Tween::from(chars)
                .prop(Property::AutoAlpha, fade)
                .stagger(stagger)
                .ease(Ease::None),
        )
        .label("highlight")
        .scrubbed();
        let timeline = cx.runtime.animator()?.add(cx.doc, timeline);
        registration.push(Resource::Timeline(timeline));

        let spec = TriggerSpec::new(heading)
            .start(start)
            .end(end)
            .scrub()
            .animation(timeline);
        let trigger = cx.runtime.observer()?.register(cx.doc, spec);
        registration.push(Resource::Trigger(trigger));
        Ok(())
    }
}

impl Default for Highlight {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for Highlight {
    fn kind(&self) -> EffectKind {
        EffectKind::Highlight
    }

    fn requires(&self) -> &'static [Collaborator] {
        &[
            Collaborator::TextSegmentation,
            Collaborator::ScrollObserver,
            Collaborator::Animator,
        ]
    }

    fn build(&mut self, cx: &mut BuildContext<'_>) -> usize {
        let mut created = 0;
        for heading in scan_untracked(cx.doc, &self.selector, &self.marker) {
            if let Err(err) = self.marker.mark(cx.doc, heading) {
                cx.report(EffectKind::Highlight, Some(heading), &err.into());
                continue;
            }
            let mut registration = Registration::new(EffectKind::Highlight, heading);
            registration.push(Resource::Marker {
                element: heading,
                name: MARKER,
            });
            match self.attach(cx, heading, &mut registration) {
                Ok(()) => {
                    cx.registrations.add(registration);
                    created += 1;
                }
                Err(err) => {
                    cx.report(EffectKind::Highlight, Some(heading), &err);
                    registration.settle(cx.runtime, cx.doc);
                }
            }
        }
        created
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::harness::Harness;
    use crate::error::DiagnosticKind;
    use crate::runtime::Runtime;

    const PAGE: &str = r#"<body>
        <h2 data-highlight-text data-highlight-fade="0.3" style="top: 1800px; height: 120px">Make it move</h2>
    </body>"#;

    #[test]
    fn test_splits_and_fades_characters() {
        let mut harness = Harness::new(PAGE);
        let heading = harness.first("h2");
        assert_eq!(harness.run(&mut Highlight::new()), 1);

        assert_eq!(harness.doc.attr(heading, MARKER), Some("true"));
        let chars = harness
            .doc
            .query_all_within(heading, &Selector::parse("div[class=\"char\"]").unwrap());
        assert_eq!(chars.len(), 10);
        assert_eq!(harness.doc.style(chars[0], "opacity"), Some("0.3"));
        assert_eq!(harness.doc.text_content(heading), "Make it move");

        let observer = harness.runtime.observer().unwrap();
        let id = observer.ids()[0];
        let spec = observer.spec(id).unwrap();
        assert!(spec.scrub);
        assert!(!spec.start.clamp);
    }

    #[test]
    fn test_marker_prevents_second_split() {
        let mut harness = Harness::new(PAGE);
        let mut highlight = Highlight::new();
        assert_eq!(harness.run(&mut highlight), 1);
        assert_eq!(harness.run(&mut highlight), 0);
        assert_eq!(harness.runtime.observer().unwrap().len(), 1);
    }

    #[test]
    fn test_teardown_restores_text_nodes() {
        let mut harness = Harness::new(PAGE);
        let heading = harness.first("h2");
        let original = harness.doc.children(heading).to_vec();
        harness.run(&mut Highlight::new());

        harness
            .registrations
            .release_all(&mut harness.runtime, &mut harness.doc);
        assert_eq!(harness.doc.children(heading), original.as_slice());
        assert!(!harness.doc.has_attr(heading, MARKER));
        assert!(harness.runtime.observer().unwrap().is_empty());
    }

    #[test]
    fn test_without_segmentation_leaves_text_alone() {
        let mut harness = Harness::new(PAGE);
        harness.runtime = Runtime::new(&harness.config).without_text_segmentation();
        let heading = harness.first("h2");
        let before = harness.doc.children(heading).to_vec();

        assert_eq!(harness.run(&mut Highlight::new()), 0);
        assert_eq!(harness.doc.children(heading), before.as_slice());
        assert!(!harness.doc.has_attr(heading, MARKER));
        assert_eq!(harness.diagnostics.count(DiagnosticKind::CollaboratorUnavailable), 1);
    }
}
