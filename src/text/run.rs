use std::collections::HashSet;

use crate::{
    cache::Cached,
    error::{self, Result},
    geometry::{FlowRect, FlowVector, Padding, RunSize, RunToFlow, RunVector},
    glyph::GlyphSource,
    text::{
        TextStyle,
        layout::{self, Extent, GlyphLayout, LayoutBounds},
        style,
    },
};

/// Glyph rectangles mapped into the parent's space.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScreenLayout {
    pub rects: Vec<FlowRect>,
    pub shadow_offset: FlowVector,
}

/// A span of uniformly styled text and its cached layout.
///
/// Two caches front the computation. The glyph cache holds placements in the
/// run's own space and depends on text, style and extents. The screen cache
/// holds those placements mapped through the parent transform and depends on
/// the glyph cache plus the transform and shadow offset, so moving a run
/// never re-lays its glyphs.
#[derive(Debug)]
pub struct GlyphRun {
    text: String,
    style: TextStyle,
    width: Extent,
    height: Extent,
    max_width: Option<f32>,
    transform: RunToFlow,
    shadow_offset: RunVector,

    glyphs: Cached<GlyphLayout>,
    reference_width: Cached<f32>,
    screen: Cached<ScreenLayout>,
}

impl Default for GlyphRun {
    fn default() -> Self {
        Self::new("", TextStyle::default())
    }
}

impl GlyphRun {
    pub fn new(text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            text: text.into(),
            style,
            width: Extent::Auto,
            height: Extent::Auto,
            max_width: None,
            transform: RunToFlow::identity(),
            shadow_offset: RunVector::zero(),
            glyphs: Cached::new(),
            reference_width: Cached::new(),
            screen: Cached::new(),
        }
    }

    /// Like [`Self::new`], but rejects a style no layout can honor.
    pub fn try_new(text: impl Into<String>, style: TextStyle) -> Result<Self> {
        style.validate()?;
        Ok(Self::new(text, style))
    }

    fn invalidate_glyphs(&mut self) {
        self.glyphs.invalidate();
        self.screen.invalidate();
    }

    fn invalidate_metrics(&mut self) {
        self.reference_width.invalidate();
        self.invalidate_glyphs();
    }
}

/// Layout-affecting properties.
impl GlyphRun {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if self.text != text {
            self.text = text;
            self.invalidate_glyphs();
        }
    }

    pub fn style(&self) -> &TextStyle {
        &self.style
    }

    /// Replaces the whole style.
    pub fn set_style(&mut self, new_style: TextStyle) -> Result<()> {
        new_style.validate()?;
        if self.style != new_style {
            let metrics_changed =
                self.style.font != new_style.font || self.style.text_size != new_style.text_size;
            self.style = new_style;
            if metrics_changed {
                self.invalidate_metrics();
            } else {
                self.invalidate_glyphs();
            }
        }
        Ok(())
    }

    pub fn set_text_size(&mut self, text_size: f32) -> Result<()> {
        let text_size = style::validate_text_size(text_size)?;
        if self.style.text_size != text_size {
            self.style.text_size = text_size;
            self.invalidate_metrics();
        }
        Ok(())
    }

    pub fn set_font(&mut self, font: Option<fontdb::ID>) {
        if self.style.font != font {
            self.style.font = font;
            self.invalidate_metrics();
        }
    }

    pub fn set_spacing(&mut self, spacing: RunVector) -> Result<()> {
        let spacing = style::validate_spacing(spacing)?;
        if self.style.spacing != spacing {
            self.style.spacing = spacing;
            self.invalidate_glyphs();
        }
        Ok(())
    }

    pub fn set_padding(&mut self, padding: Padding) -> Result<()> {
        let padding = style::validate_padding(padding)?;
        if self.style.padding != padding {
            self.style.padding = padding;
            self.invalidate_glyphs();
        }
        Ok(())
    }

    pub fn set_allow_multiline(&mut self, allow: bool) {
        if self.style.allow_multiline != allow {
            self.style.allow_multiline = allow;
            self.invalidate_glyphs();
        }
    }

    pub fn set_fixed_width(&mut self, fixed_width: bool) {
        if self.style.fixed_width != fixed_width {
            self.style.fixed_width = fixed_width;
            self.invalidate_glyphs();
        }
    }

    pub fn set_use_full_glyph_height(&mut self, full: bool) {
        if self.style.use_full_glyph_height != full {
            self.style.use_full_glyph_height = full;
            self.invalidate_glyphs();
        }
    }

    pub fn set_fixed_width_exceptions(
        &mut self,
        exceptions: HashSet<char, fxhash::FxBuildHasher>,
    ) {
        if self.style.fixed_width_exceptions != exceptions {
            self.style.fixed_width_exceptions = exceptions;
            self.invalidate_glyphs();
        }
    }

    /// Fixes the width; `None` derives it from content again.
    pub fn set_width(&mut self, width: Option<f32>) -> Result<()> {
        let width = match width {
            Some(value) => Extent::Fixed(error::extent(value)?),
            None => Extent::Auto,
        };
        if self.width != width {
            self.width = width;
            self.invalidate_glyphs();
        }
        Ok(())
    }

    /// Fixes the height; `None` derives it from content again.
    pub fn set_height(&mut self, height: Option<f32>) -> Result<()> {
        let height = match height {
            Some(value) => Extent::Fixed(error::extent(value)?),
            None => Extent::Auto,
        };
        if self.height != height {
            self.height = height;
            self.invalidate_glyphs();
        }
        Ok(())
    }

    /// Wrap limit used while the width is derived from content.
    pub fn set_max_width(&mut self, max_width: Option<f32>) -> Result<()> {
        if let Some(value) = max_width {
            error::extent(value)?;
        }
        if self.max_width != max_width {
            self.max_width = max_width;
            self.invalidate_glyphs();
        }
        Ok(())
    }

    fn bounds(&self) -> LayoutBounds {
        let available_width = match self.width {
            Extent::Fixed(width) => width,
            Extent::Auto => self.max_width.unwrap_or(f32::INFINITY),
        };
        LayoutBounds {
            available_width,
            width: self.width,
            height: self.height,
        }
    }
}

/// Parent-space properties. These only touch the screen cache.
impl GlyphRun {
    pub fn transform(&self) -> &RunToFlow {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: RunToFlow) {
        if self.transform != transform {
            self.transform = transform;
            self.screen.invalidate();
        }
    }

    pub fn set_shadow_offset(&mut self, offset: RunVector) {
        if self.shadow_offset != offset {
            self.shadow_offset = offset;
            self.screen.invalidate();
        }
    }
}

/// Cache validation and reads.
impl GlyphRun {
    pub fn is_layout_valid(&self) -> bool {
        self.glyphs.is_valid()
    }

    pub fn is_screen_layout_valid(&self) -> bool {
        self.screen.is_valid()
    }

    /// Recomputes the glyph layout if it is stale. Returns whether it did.
    pub fn update(&mut self, source: &mut dyn GlyphSource) -> bool {
        if self.glyphs.is_valid() {
            return false;
        }

        let style = &self.style;
        let reference_width = *self
            .reference_width
            .get_or_compute(|| layout::reference_width(style, source));

        // Laid out in place: if the source unwinds, the guard's size stays on
        // the run while the cache stays invalid.
        let bounds = self.bounds();
        layout::layout_glyphs(
            &self.text,
            &self.style,
            bounds,
            reference_width,
            source,
            self.glyphs.slot(),
        );
        let line_base_height = self.compute_line_base_height(source);

        let glyph_layout = self.glyphs.slot();
        glyph_layout.line_base_height = line_base_height;
        log::debug!(
            "laid out {} glyphs for {:?}: {:?}",
            glyph_layout.placements.len(),
            self.text,
            glyph_layout.size
        );

        self.glyphs.validate();
        self.screen.invalidate();
        true
    }

    /// Bounding size of the last layout pass, even one that did not complete.
    ///
    /// Zero before any pass has run.
    pub fn size(&self) -> RunSize {
        self.glyphs
            .stale()
            .map(|layout| layout.size)
            .unwrap_or_else(RunSize::zero)
    }

    /// Returns the glyph layout, recomputing it first if needed.
    pub fn layout(&mut self, source: &mut dyn GlyphSource) -> &GlyphLayout {
        self.update(source);
        self.glyphs.value()
    }

    /// Returns the glyph layout, or `None` while it is stale.
    pub fn cached_layout(&self) -> Option<&GlyphLayout> {
        self.glyphs.get()
    }

    /// Validates the glyph cache, then the screen cache, and returns the latter.
    pub fn screen_layout(&mut self, source: &mut dyn GlyphSource) -> &ScreenLayout {
        self.update(source);

        let glyphs = self.glyphs.value();
        let transform = &self.transform;
        let shadow_offset = self.shadow_offset;
        self.screen.get_or_compute(|| ScreenLayout {
            rects: glyphs
                .placements
                .iter()
                .map(|placement| transform.outer_transformed_rect(&placement.rect))
                .collect(),
            shadow_offset: transform.transform_vector(shadow_offset),
        })
    }

    fn compute_line_base_height(&self, source: &mut dyn GlyphSource) -> Option<f32> {
        let unscaled = source.font_base_height(self.style.font).or_else(|| {
            self.text
                .chars()
                .next()
                .and_then(|ch| source.char_base_height(ch))
        })?;
        Some(unscaled * self.style.text_size)
    }

    /// Terms external indexing can match this run by.
    pub fn filter_terms(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.text.as_str())
    }
}
