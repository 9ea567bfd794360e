/// Texture reference of a glyph inside a loaded font.
///
/// The same glyph is not guaranteed to receive the same `GlyphId` across program runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GlyphId {
    font_id: fontdb::ID,
    glyph_index: u16,
}

impl GlyphId {
    pub fn new(font_id: fontdb::ID, glyph_index: u16) -> Self {
        Self {
            font_id,
            glyph_index,
        }
    }

    pub fn font_id(&self) -> fontdb::ID {
        self.font_id
    }

    pub fn glyph_index(&self) -> u16 {
        self.glyph_index
    }
}

/// Unscaled glyph metrics, in ems. Multiplying by the text size gives pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphTexture {
    pub display_width: f32,
    pub display_height: f32,
    /// `None` for sources that do not hand out texture references.
    pub id: Option<GlyphId>,
}

/// Where glyph metrics come from.
///
/// Layout only ever needs sizes; rasterization and atlases live elsewhere.
pub trait GlyphSource {
    /// Looks a glyph up in exactly the given font (`None` = the source's default lookup).
    fn lookup(&mut self, ch: char, font: Option<fontdb::ID>) -> Option<GlyphTexture>;

    /// Unscaled advance of an ordinary space, if the font defines one.
    fn space_advance(&mut self, font: Option<fontdb::ID>) -> Option<f32> {
        self.resolve(' ', font).map(|glyph| glyph.display_width)
    }

    /// Unscaled distance from the top of a line to the baseline for a font.
    fn font_base_height(&mut self, _font: Option<fontdb::ID>) -> Option<f32> {
        None
    }

    /// Unscaled distance from the top of a line to the baseline for whichever font holds `ch`.
    fn char_base_height(&mut self, _ch: char) -> Option<f32> {
        None
    }

    /// Font-qualified lookup falling back to the unqualified one.
    fn resolve(&mut self, ch: char, font: Option<fontdb::ID>) -> Option<GlyphTexture> {
        match font {
            Some(font) => self.lookup(ch, Some(font)).or_else(|| self.lookup(ch, None)),
            None => self.lookup(ch, None),
        }
    }
}

impl<S: GlyphSource + ?Sized> GlyphSource for &mut S {
    fn lookup(&mut self, ch: char, font: Option<fontdb::ID>) -> Option<GlyphTexture> {
        (**self).lookup(ch, font)
    }

    fn space_advance(&mut self, font: Option<fontdb::ID>) -> Option<f32> {
        (**self).space_advance(font)
    }

    fn font_base_height(&mut self, font: Option<fontdb::ID>) -> Option<f32> {
        (**self).font_base_height(font)
    }

    fn char_base_height(&mut self, ch: char) -> Option<f32> {
        (**self).char_base_height(ch)
    }

    fn resolve(&mut self, ch: char, font: Option<fontdb::ID>) -> Option<GlyphTexture> {
        (**self).resolve(ch, font)
    }
}
