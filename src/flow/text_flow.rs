use crate::{
    cache::{Cached, Validity},
    error::{self, Result},
    flow::{
        layout::{self, FlowConfig, FlowEntity, FlowLine, FlowOutput, TextAnchor},
        part::{ChildKind, FlowChild, Ownership, RealizeContext, SharedRun, TextPart},
    },
    geometry::{FlowSize, RunToFlow},
    glyph::GlyphSource,
    locale::{LocalisableText, LocaleNotifier, LocaleSubscription, Localiser},
    text::{StyleOverride, TextStyle},
};

/// Handle of a part added to a [`TextFlow`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartId(u64);

struct PartEntry {
    id: PartId,
    part: TextPart,
    realized: Cached<Vec<FlowChild>>,
}

/// Paragraph container that turns text parts into positioned glyph runs.
///
/// Work is split across three validity gates, checked in order by
/// [`TextFlow::update`]:
/// 1. the parts cache: which runs exist (parts added or removed, locale or
///    default style changed);
/// 2. each run's own glyph cache;
/// 3. the flow layout cache: where runs go (indents, spacing, anchor, width,
///    or any run whose size changed).
///
/// Editing a single run only reopens gates 2 and 3; the other runs keep both
/// their identity and their glyphs.
pub struct TextFlow {
    parts: Vec<PartEntry>,
    next_part_id: u64,
    default_style: TextStyle,
    new_line_is_paragraph: bool,
    config: FlowConfig,
    width: Option<f32>,
    locale: Option<LocaleSubscription>,

    children: Vec<FlowChild>,
    parts_cache: Validity,
    layout: Cached<FlowOutput>,
}

impl Default for TextFlow {
    fn default() -> Self {
        Self::new(TextStyle::default())
    }
}

impl TextFlow {
    pub fn new(default_style: TextStyle) -> Self {
        Self {
            parts: Vec::new(),
            next_part_id: 0,
            default_style,
            new_line_is_paragraph: true,
            config: FlowConfig::default(),
            width: None,
            locale: None,
            children: Vec::new(),
            parts_cache: Validity::new(),
            layout: Cached::new(),
        }
    }

    /// Re-realizes parts matching `predicate` on the next update.
    fn invalidate_parts_where(&mut self, predicate: impl Fn(&TextPart) -> bool) {
        let mut any = false;
        for entry in self.parts.iter_mut().filter(|entry| predicate(&entry.part)) {
            entry.realized.invalidate();
            any = true;
        }
        if any {
            self.parts_cache.invalidate();
        }
    }
}

/// Parts.
impl TextFlow {
    pub fn add_part(&mut self, part: TextPart) -> Result<PartId> {
        if let TextPart::Words { style, .. } = &part {
            style.validate()?;
        }
        Ok(self.push_part(part))
    }

    fn push_part(&mut self, part: TextPart) -> PartId {
        let id = PartId(self.next_part_id);
        self.next_part_id += 1;
        self.parts.push(PartEntry {
            id,
            part,
            realized: Cached::new(),
        });
        self.parts_cache.invalidate();
        id
    }

    /// Appends text in the default style.
    pub fn add_text(&mut self, text: impl Into<LocalisableText>) -> PartId {
        self.push_part(TextPart::words(text))
    }

    /// Appends text with per-part style overrides.
    pub fn add_text_with(
        &mut self,
        text: impl Into<LocalisableText>,
        style: StyleOverride,
    ) -> Result<PartId> {
        self.add_part(TextPart::Words {
            text: text.into(),
            style,
        })
    }

    /// Starts a new paragraph (unless the flow is empty) and appends text to it.
    pub fn add_paragraph(&mut self, text: impl Into<LocalisableText>) -> PartId {
        if !self.parts.is_empty() {
            self.new_paragraph();
        }
        self.add_text(text)
    }

    pub fn new_line(&mut self) -> PartId {
        self.push_part(TextPart::LineBreak { paragraph: false })
    }

    pub fn new_paragraph(&mut self) -> PartId {
        self.push_part(TextPart::LineBreak { paragraph: true })
    }

    /// Places externally owned runs. The flow keeps only weak references in the part.
    pub fn add_manual<'a>(&mut self, runs: impl IntoIterator<Item = &'a SharedRun>) -> PartId {
        self.push_part(TextPart::manual(runs))
    }

    pub fn remove_part(&mut self, id: PartId) -> bool {
        let Some(index) = self.parts.iter().position(|entry| entry.id == id) else {
            return false;
        };
        self.parts.remove(index);
        self.parts_cache.invalidate();
        true
    }

    pub fn parts(&self) -> impl Iterator<Item = (PartId, &TextPart)> {
        self.parts.iter().map(|entry| (entry.id, &entry.part))
    }

    /// Removes every part.
    ///
    /// Externally owned runs are detached first; they stay alive and untouched
    /// for their owners.
    pub fn clear(&mut self) {
        let detached = self.detach_external();
        if detached > 0 {
            log::debug!("detached {} external runs before clearing", detached);
        }

        self.children.clear();
        self.parts.clear();
        self.parts_cache.invalidate();
        self.layout.invalidate();
    }

    fn detach_external(&mut self) -> usize {
        let before = self.children.len();
        self.children
            .retain(|child| child.ownership() != Ownership::External);
        for entry in &mut self.parts {
            if let TextPart::Manual { .. } = entry.part {
                entry.realized.take();
            }
        }
        before - self.children.len()
    }

    /// Replaces all content with `text`.
    pub fn set_text(&mut self, text: impl Into<LocalisableText>) {
        self.clear();
        self.add_text(text);
    }
}

/// Settings.
impl TextFlow {
    pub fn default_style(&self) -> &TextStyle {
        &self.default_style
    }

    pub fn set_default_style(&mut self, style: TextStyle) -> Result<()> {
        style.validate()?;
        if self.default_style != style {
            self.default_style = style;
            self.invalidate_parts_where(TextPart::uses_default_style);
        }
        Ok(())
    }

    pub fn set_new_line_is_paragraph(&mut self, value: bool) {
        if self.new_line_is_paragraph != value {
            self.new_line_is_paragraph = value;
            self.invalidate_parts_where(TextPart::uses_default_style);
        }
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: FlowConfig) -> Result<()> {
        config.validate()?;
        if self.config != config {
            self.config = config;
            self.layout.invalidate();
        }
        Ok(())
    }

    pub fn set_first_line_indent(&mut self, indent: f32) -> Result<()> {
        let first_line_indent = error::finite("first_line_indent", indent)?;
        self.set_config(FlowConfig {
            first_line_indent,
            ..self.config
        })
    }

    pub fn set_content_indent(&mut self, indent: f32) -> Result<()> {
        let content_indent = error::finite("content_indent", indent)?;
        self.set_config(FlowConfig {
            content_indent,
            ..self.config
        })
    }

    pub fn set_paragraph_spacing(&mut self, spacing: f32) -> Result<()> {
        let paragraph_spacing = error::finite("paragraph_spacing", spacing)?;
        self.set_config(FlowConfig {
            paragraph_spacing,
            ..self.config
        })
    }

    pub fn set_line_spacing(&mut self, spacing: f32) -> Result<()> {
        let line_spacing = error::finite("line_spacing", spacing)?;
        self.set_config(FlowConfig {
            line_spacing,
            ..self.config
        })
    }

    pub fn set_text_anchor(&mut self, anchor: TextAnchor) {
        if self.config.anchor != anchor {
            self.config.anchor = anchor;
            self.layout.invalidate();
        }
    }

    /// Container width lines wrap at. `None` never wraps.
    pub fn set_width(&mut self, width: Option<f32>) -> Result<()> {
        if let Some(value) = width {
            error::extent(value)?;
        }
        if self.width != width {
            self.width = width;
            self.layout.invalidate();
        }
        Ok(())
    }

    /// Re-realizes localisable parts whenever `notifier` reports a locale switch.
    pub fn subscribe_locale(&mut self, notifier: &LocaleNotifier) {
        self.locale = Some(notifier.subscribe());
    }
}

/// Update pass and results.
impl TextFlow {
    pub fn is_parts_valid(&self) -> bool {
        self.parts_cache.is_valid()
    }

    pub fn is_layout_valid(&self) -> bool {
        self.layout.is_valid()
    }

    /// Brings every cache up to date. Returns whether the flow layout was recomputed.
    pub fn update(&mut self, source: &mut dyn GlyphSource, localiser: &dyn Localiser) -> bool {
        if self
            .locale
            .as_mut()
            .is_some_and(LocaleSubscription::take_changed)
        {
            self.invalidate_parts_where(TextPart::is_localisable);
        }

        if !self.parts_cache.is_valid() {
            self.rebuild_children(localiser);
        }

        if self.update_runs(source) {
            self.layout.invalidate();
        }

        if self.layout.is_valid() {
            return false;
        }
        self.compute_layout();
        true
    }

    fn rebuild_children(&mut self, localiser: &dyn Localiser) {
        let context = RealizeContext {
            default_style: &self.default_style,
            new_line_is_paragraph: self.new_line_is_paragraph,
            localiser,
        };

        let mut realized = 0;
        for entry in &mut self.parts {
            if !entry.realized.is_valid() {
                entry.realized.set(entry.part.realize(&context));
                realized += 1;
            }
        }

        self.children = self
            .parts
            .iter()
            .flat_map(|entry| entry.realized.value().iter().cloned())
            .collect();

        log::debug!(
            "realized {} of {} parts into {} children",
            realized,
            self.parts.len(),
            self.children.len()
        );

        self.parts_cache.validate();
        self.layout.invalidate();
    }

    /// Validates every run. Returns whether any run's size may have moved.
    fn update_runs(&mut self, source: &mut dyn GlyphSource) -> bool {
        let mut changed = false;
        for child in &self.children {
            let ChildKind::Run(run) = child.kind() else {
                continue;
            };
            let mut run = run.lock();
            let recomputed = run.update(source);
            let size: FlowSize = run.size().cast_unit();
            changed |= recomputed || size != child.size;
        }
        changed
    }

    fn compute_layout(&mut self) {
        let entities: Vec<FlowEntity> = self
            .children
            .iter()
            .map(|child| match child.kind() {
                ChildKind::Run(run) => {
                    let run = run.lock();
                    FlowEntity::Content {
                        size: run.size().cast_unit(),
                        base_height: run.cached_layout().and_then(|layout| layout.line_base_height),
                    }
                }
                ChildKind::Break { paragraph } => FlowEntity::Break {
                    paragraph: *paragraph,
                },
            })
            .collect();

        let output = layout::compute(&self.config, &entities, self.width);

        for (child, placement) in self.children.iter_mut().zip(&output.placements) {
            child.position = placement.position;
            child.size = placement.size;
            if let Some(run) = child.run() {
                run.lock().set_transform(RunToFlow::translation(
                    placement.position.x,
                    placement.position.y,
                ));
            }
        }

        log::debug!(
            "flowed {} children into {} lines, size {:?}",
            self.children.len(),
            output.lines.len(),
            output.size
        );
        self.layout.set(output);
    }

    /// Realized children in document order, positioned by the last update.
    pub fn children(&self) -> &[FlowChild] {
        &self.children
    }

    /// Lines of the last layout, or `None` while it is stale.
    pub fn lines(&self) -> Option<&[FlowLine]> {
        self.layout.get().map(|output| output.lines.as_slice())
    }

    /// Size of the last layout, or `None` while it is stale.
    pub fn size(&self) -> Option<FlowSize> {
        self.layout.get().map(|output| output.size)
    }

    /// Text of every run, for external indexing.
    ///
    /// Each run is locked only while its own terms are read.
    pub fn filter_terms(&self) -> impl Iterator<Item = String> + '_ {
        self.children
            .iter()
            .filter_map(FlowChild::run)
            .flat_map(|run| {
                let run = run.lock();
                run.filter_terms().map(str::to_owned).collect::<Vec<_>>()
            })
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::geometry::{FlowPoint, FlowRect};
    use crate::glyph::test_source::TableSource;
    use crate::locale::{MapLocaliser, NoLocalisation};
    use crate::text::GlyphRun;

    // default text size 20: letters are 10px wide, spaces 5px
    fn flow() -> TextFlow {
        TextFlow::default()
    }

    fn positions(flow: &TextFlow) -> Vec<FlowPoint> {
        flow.children().iter().map(FlowChild::position).collect()
    }

    fn shared(text: &str) -> SharedRun {
        Arc::new(Mutex::new(GlyphRun::new(text, TextStyle::default())))
    }

    #[test]
    fn test_words_flow_left_to_right() {
        let mut source = TableSource::new();
        let mut flow = flow();
        flow.add_text("ab cd");

        assert!(flow.update(&mut source, &NoLocalisation));
        assert_eq!(
            positions(&flow),
            vec![FlowPoint::new(0.0, 0.0), FlowPoint::new(25.0, 0.0)]
        );
        assert_eq!(flow.size(), Some(FlowSize::new(45.0, 20.0)));
        assert!(!flow.update(&mut source, &NoLocalisation));
    }

    #[test]
    fn test_overflowing_word_moves_to_next_line() {
        let mut source = TableSource::new();
        let mut flow = flow();
        flow.set_width(Some(40.0)).unwrap();
        flow.add_text("ab cd");
        flow.update(&mut source, &NoLocalisation);

        assert_eq!(flow.children()[1].position(), FlowPoint::new(0.0, 20.0));
        assert_eq!(flow.lines().unwrap().len(), 2);
    }

    #[test]
    fn test_paragraph_break_spacing() {
        let mut source = TableSource::new();
        let mut flow = flow();
        flow.set_paragraph_spacing(0.5).unwrap();
        flow.add_text("ab");
        flow.new_paragraph();
        flow.add_text("cd");
        flow.update(&mut source, &NoLocalisation);

        let children = flow.children();
        assert!(children[1].is_paragraph_break());
        assert_eq!(children[1].size().height, 10.0);
        assert_eq!(children[2].position(), FlowPoint::new(0.0, 30.0));
    }

    #[test]
    fn test_add_paragraph_inserts_break_between_paragraphs() {
        let mut flow = flow();
        flow.add_paragraph("first");
        flow.add_paragraph("second");

        let kinds: Vec<_> = flow
            .parts()
            .map(|(_, part)| matches!(part, TextPart::LineBreak { paragraph: true }))
            .collect();
        assert_eq!(kinds, vec![false, true, false]);
    }

    #[test]
    fn test_content_indent_after_explicit_break() {
        let mut source = TableSource::new();
        let mut flow = flow();
        flow.set_content_indent(4.0).unwrap();
        flow.add_text("ab");
        flow.new_line();
        flow.add_text("cd");
        flow.update(&mut source, &NoLocalisation);

        assert_eq!(flow.children()[0].position().x, 0.0);
        assert_eq!(flow.children()[2].position(), FlowPoint::new(4.0, 20.0));
        assert_eq!(flow.lines().unwrap()[1].entities, 2..3);
    }

    #[test]
    fn test_right_anchor_keeps_document_order() {
        let mut source = TableSource::new();
        let mut flow = flow();
        flow.set_width(Some(100.0)).unwrap();
        flow.set_text_anchor(TextAnchor::Right);
        flow.add_text("abc defg");
        flow.update(&mut source, &NoLocalisation);

        // "abc " is 35 wide, "defg" 40: 25 left over
        assert_eq!(flow.lines().unwrap()[0].offset_from_right, 25.0);
        assert_eq!(
            positions(&flow),
            vec![FlowPoint::new(25.0, 0.0), FlowPoint::new(60.0, 0.0)]
        );
    }

    #[test]
    fn test_layout_settings_do_not_touch_runs() {
        let mut source = TableSource::new();
        let mut flow = flow();
        flow.add_text("ab cd");
        flow.update(&mut source, &NoLocalisation);
        let lookups = source.lookups;
        let first = Arc::clone(flow.children()[0].run().unwrap());

        flow.set_first_line_indent(7.0).unwrap();
        assert!(flow.is_parts_valid());
        assert!(!flow.is_layout_valid());
        assert!(flow.update(&mut source, &NoLocalisation));

        assert_eq!(source.lookups, lookups);
        assert!(Arc::ptr_eq(&first, flow.children()[0].run().unwrap()));
        assert_eq!(flow.children()[0].position().x, 7.0);
    }

    #[test]
    fn test_unchanged_settings_keep_layout_valid() {
        let mut source = TableSource::new();
        let mut flow = flow();
        flow.add_text("ab");
        flow.update(&mut source, &NoLocalisation);

        flow.set_width(None).unwrap();
        flow.set_text_anchor(TextAnchor::Left);
        flow.set_line_spacing(0.0).unwrap();
        flow.set_new_line_is_paragraph(true);
        flow.set_default_style(TextStyle::default()).unwrap();

        assert!(flow.is_layout_valid());
        assert!(flow.is_parts_valid());
    }

    #[test]
    fn test_manual_run_edit_only_recomputes_that_run() {
        let mut source = TableSource::new();
        let manual = shared("xy");
        let mut flow = flow();
        flow.add_text("ab cd");
        flow.add_manual([&manual]);
        flow.update(&mut source, &NoLocalisation);

        let owned = Arc::clone(flow.children()[0].run().unwrap());
        let lookups = source.lookups;

        manual.lock().set_text("xyz");
        assert!(flow.update(&mut source, &NoLocalisation));

        // one space advance lookup plus three glyphs
        assert_eq!(source.lookups - lookups, 4);
        assert!(Arc::ptr_eq(&owned, flow.children()[0].run().unwrap()));
        assert_eq!(flow.children()[2].size(), FlowSize::new(30.0, 20.0));
    }

    #[test]
    fn test_manual_run_updated_elsewhere_is_noticed() {
        let mut source = TableSource::new();
        let manual = shared("x");
        let mut flow = flow();
        flow.add_manual([&manual]);
        flow.update(&mut source, &NoLocalisation);

        {
            let mut run = manual.lock();
            run.set_text("xx");
            run.update(&mut source);
        }
        assert!(flow.update(&mut source, &NoLocalisation));
        assert_eq!(flow.size().unwrap().width, 20.0);
    }

    #[test]
    fn test_clear_leaves_manual_runs_to_their_owner() {
        let mut source = TableSource::new();
        let manual = shared("mine");
        let mut flow = flow();
        flow.add_text("ours");
        flow.add_manual([&manual]);
        flow.update(&mut source, &NoLocalisation);
        assert_eq!(Arc::strong_count(&manual), 3);

        flow.clear();

        assert_eq!(Arc::strong_count(&manual), 1);
        assert_eq!(manual.lock().text(), "mine");
        assert!(manual.lock().is_layout_valid());
        assert!(flow.children().is_empty());
        assert_eq!(flow.parts().count(), 0);
    }

    #[test]
    fn test_remove_part_drops_its_children() {
        let mut source = TableSource::new();
        let mut flow = flow();
        let first = flow.add_text("ab");
        flow.add_text("cd");
        flow.update(&mut source, &NoLocalisation);

        assert!(flow.remove_part(first));
        assert!(!flow.remove_part(first));
        flow.update(&mut source, &NoLocalisation);

        assert_eq!(flow.filter_terms().collect::<Vec<_>>(), vec!["cd".to_owned()]);
        assert_eq!(flow.children()[0].position(), FlowPoint::zero());
    }

    #[test]
    fn test_locale_change_rerealizes_localised_parts() {
        let mut source = TableSource::new();
        let mut localiser = MapLocaliser::new("en");
        localiser.insert("en", "hi", "hello");
        localiser.insert("ja", "hi", "konnichiwa");

        let mut flow = flow();
        flow.subscribe_locale(localiser.notifier());
        flow.add_text(LocalisableText::key("hi", "hi"));
        flow.add_text("plain");
        flow.update(&mut source, &localiser);
        let plain = Arc::clone(flow.children()[1].run().unwrap());
        assert_eq!(flow.filter_terms().collect::<Vec<_>>(), vec!["hello", "plain"]);

        localiser.set_locale("ja");
        assert!(flow.update(&mut source, &localiser));

        assert_eq!(flow.filter_terms().collect::<Vec<_>>(), vec!["konnichiwa", "plain"]);
        assert!(Arc::ptr_eq(&plain, flow.children()[1].run().unwrap()));
    }

    #[test]
    fn test_default_style_change_rebuilds_word_runs() {
        let mut source = TableSource::new();
        let manual = shared("m");
        let mut flow = flow();
        flow.add_text("ab");
        flow.add_manual([&manual]);
        flow.update(&mut source, &NoLocalisation);

        flow.set_default_style(TextStyle {
            text_size: 40.0,
            ..Default::default()
        })
        .unwrap();
        assert!(!flow.is_parts_valid());
        flow.update(&mut source, &NoLocalisation);

        assert_eq!(flow.children()[0].size(), FlowSize::new(40.0, 40.0));
        // manual runs keep their own style
        assert_eq!(manual.lock().style().text_size, 20.0);
    }

    #[test]
    fn test_runs_are_moved_into_flow_space() {
        let mut source = TableSource::new();
        let mut flow = flow();
        flow.add_text("ab cd");
        flow.update(&mut source, &NoLocalisation);

        let run = Arc::clone(flow.children()[1].run().unwrap());
        let mut run = run.lock();
        let rects = run.screen_layout(&mut source).rects.clone();
        assert_eq!(
            rects[0],
            FlowRect::new(FlowPoint::new(25.0, 0.0), FlowSize::new(10.0, 20.0))
        );
    }

    #[test]
    fn test_rejected_settings_leave_flow_untouched() {
        let mut source = TableSource::new();
        let mut flow = flow();
        flow.add_text("ab");
        flow.update(&mut source, &NoLocalisation);

        assert!(flow.set_content_indent(f32::NAN).is_err());
        assert!(flow.set_width(Some(-5.0)).is_err());
        assert!(
            flow.add_text_with(
                "x",
                StyleOverride {
                    text_size: Some(0.0),
                    ..Default::default()
                }
            )
            .is_err()
        );

        assert_eq!(flow.config(), &FlowConfig::default());
        assert!(flow.is_layout_valid());
        assert_eq!(flow.parts().count(), 1);
    }

    #[test]
    fn test_set_text_replaces_content() {
        let mut source = TableSource::new();
        let mut flow = flow();
        flow.add_text("old words");
        flow.update(&mut source, &NoLocalisation);

        flow.set_text("new");
        flow.update(&mut source, &NoLocalisation);
        assert_eq!(flow.filter_terms().collect::<Vec<_>>(), vec!["new".to_owned()]);
    }
}
