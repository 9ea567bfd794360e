use crate::{
    geometry::{Padding, RunPoint, RunRect, RunSize},
    glyph::{GlyphId, GlyphSource},
    text::TextStyle,
};

/// Full-width space; advances twice as far as an ordinary space.
const IDEOGRAPHIC_SPACE: char = '\u{3000}';

/// Advance used for whitespace when the font has no space glyph, in ems.
const FALLBACK_SPACE_ADVANCE: f32 = 0.25;

/// Glyph whose advance is the fixed-width reference.
pub const REFERENCE_GLYPH: char = 'M';

/// A glyph placed inside its run.
#[derive(Clone, Debug, PartialEq)]
pub struct GlyphPlacement {
    pub character: char,
    /// `None` when the glyph could not be resolved; the rect is then zero-sized.
    pub texture: Option<GlyphId>,
    pub rect: RunRect,
}

/// Result of a glyph layout pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GlyphLayout {
    pub placements: Vec<GlyphPlacement>,
    pub size: RunSize,
    /// Distance from a row's top to the baseline, already scaled.
    pub line_base_height: Option<f32>,
}

/// How one axis of a run's bounding box is determined.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Extent {
    /// Derived from the laid out content.
    #[default]
    Auto,
    /// Set from outside; content never changes it.
    Fixed(f32),
}

impl Extent {
    fn resolve(self, content: f32) -> f32 {
        match self {
            Extent::Auto => content,
            Extent::Fixed(value) => value,
        }
    }
}

/// Parameters of a glyph layout pass that do not come from the style.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutBounds {
    /// Wrap limit in run space. `f32::INFINITY` disables wrapping.
    pub available_width: f32,
    pub width: Extent,
    pub height: Extent,
}

impl Default for LayoutBounds {
    fn default() -> Self {
        Self {
            available_width: f32::INFINITY,
            width: Extent::Auto,
            height: Extent::Auto,
        }
    }
}

/// Scaled advance of the fixed-width reference glyph.
pub fn reference_width(style: &TextStyle, source: &mut dyn GlyphSource) -> f32 {
    source
        .resolve(REFERENCE_GLYPH, style.font)
        .map(|glyph| glyph.display_width * style.text_size)
        .unwrap_or(style.text_size)
}

/// Writes the bounding size when dropped.
///
/// Living on the stack of [`layout_glyphs`], it keeps the size consistent with
/// whatever was placed even if the glyph source unwinds mid-pass.
struct BoundsGuard<'a> {
    cursor: RunPoint,
    row_height: f32,
    widest_row: f32,
    is_empty: bool,
    padding: Padding,
    spacing_x: f32,
    bounds: LayoutBounds,
    size: &'a mut RunSize,
}

impl BoundsGuard<'_> {
    /// Right edge of the current row without its trailing spacing.
    fn row_end(&self) -> f32 {
        self.cursor.x - self.spacing_x
    }

    fn wrap(&mut self, spacing_y: f32) {
        self.widest_row = self.widest_row.max(self.row_end());
        self.cursor.x = self.padding.left;
        self.cursor.y += self.row_height + spacing_y;
        self.row_height = 0.0;
    }
}

impl Drop for BoundsGuard<'_> {
    fn drop(&mut self) {
        let content = if self.is_empty {
            RunSize::zero()
        } else {
            let width = self.widest_row.max(self.row_end()) + self.padding.right;
            let height = self.cursor.y + self.row_height + self.padding.bottom;
            RunSize::new(width, height)
        };

        *self.size = RunSize::new(
            self.bounds.width.resolve(content.width),
            self.bounds.height.resolve(content.height),
        );
    }
}

/// Places every glyph of `text` and computes the run's bounding size.
///
/// Characters are walked one scalar value at a time. Whitespace only moves the
/// cursor. When multiline is allowed, a glyph that would reach
/// `available_width` starts a new row unless it is the first thing on its row.
///
/// `out` is overwritten; its previous content is discarded.
pub fn layout_glyphs(
    text: &str,
    style: &TextStyle,
    bounds: LayoutBounds,
    reference_width: f32,
    source: &mut dyn GlyphSource,
    out: &mut GlyphLayout,
) {
    let GlyphLayout {
        placements, size, ..
    } = out;
    placements.clear();

    let padding = style.padding;
    let spacing = style.spacing;
    let text_size = style.text_size;

    let mut guard = BoundsGuard {
        cursor: RunPoint::new(padding.left, padding.top),
        row_height: 0.0,
        widest_row: 0.0,
        is_empty: text.is_empty(),
        padding,
        spacing_x: spacing.x,
        bounds,
        size,
    };

    if text.is_empty() {
        return;
    }

    let space_width = source
        .space_advance(style.font)
        .unwrap_or(FALLBACK_SPACE_ADVANCE)
        * text_size;

    for ch in text.chars() {
        if ch.is_whitespace() {
            let mut width = if style.is_fixed_width(ch) {
                reference_width
            } else {
                space_width
            };
            if ch == IDEOGRAPHIC_SPACE {
                width *= 2.0;
            }
            guard.cursor.x += width + spacing.x;
            continue;
        }

        let texture = source.resolve(ch, style.font);
        if texture.is_none() {
            log::trace!("no glyph for {:?}, placing it with zero size", ch);
        }

        let natural = texture
            .map(|glyph| RunSize::new(glyph.display_width, glyph.display_height) * text_size)
            .unwrap_or_else(RunSize::zero);

        let (advance, offset_x) = if style.is_fixed_width(ch) {
            (reference_width, (reference_width - natural.width) / 2.0)
        } else {
            (natural.width, 0.0)
        };
        let height = if style.use_full_glyph_height {
            text_size
        } else {
            natural.height
        };

        let row_has_content = guard.cursor.x > padding.left;
        if style.allow_multiline
            && row_has_content
            && guard.cursor.x + advance >= bounds.available_width
        {
            guard.wrap(spacing.y);
        }

        guard.row_height = guard.row_height.max(height);

        placements.push(GlyphPlacement {
            character: ch,
            texture: texture.and_then(|glyph| glyph.id),
            rect: RunRect::new(
                RunPoint::new(guard.cursor.x + offset_x, guard.cursor.y),
                RunSize::new(natural.width, height),
            ),
        });

        guard.cursor.x += advance + spacing.x;
    }
}
