use std::{collections::HashMap, path::PathBuf, sync::Arc};

use crate::glyph::{GlyphId, GlyphSource, GlyphTexture};

/// Pixel size metrics are sampled at before being normalized to ems.
const REFERENCE_PX: f32 = 64.0;

/// Manages font loading and retrieval using `fontdb` and `fontdue`.
///
/// This struct combines a database of available fonts (`fontdb`) with a cache of loaded
/// font instances (`fontdue`). It lazily loads the actual font data when requested and
/// serves normalized glyph metrics to the layout engine through [`GlyphSource`].
pub struct FontStorage {
    /// This is the font set that has been loaded by fontdb.
    font_db: fontdb::Database,
    /// This is the font that has been loaded by fontdue.
    /// Not all fonts in fontdb are necessarily loaded here.
    loaded_font: HashMap<fontdb::ID, Arc<fontdue::Font>, fxhash::FxBuildHasher>,
    /// Font used for unqualified lookups. Falls back to the sans-serif family.
    default_font: Option<fontdb::ID>,
    glyph_metrics: HashMap<(fontdb::ID, char), Option<GlyphTexture>, fxhash::FxBuildHasher>,
}

impl Default for FontStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl FontStorage {
    /// Creates a new empty font storage.
    pub fn new() -> Self {
        Self {
            font_db: fontdb::Database::new(),
            loaded_font: HashMap::with_hasher(fxhash::FxBuildHasher::default()),
            default_font: None,
            glyph_metrics: HashMap::with_hasher(fxhash::FxBuildHasher::default()),
        }
    }
}

/// Loading fonts into fontdb and setting up fontdb.
impl FontStorage {
    /// Loads a font from binary data.
    pub fn load_font_binary(&mut self, data: impl Into<Vec<u8>>) {
        self.font_db.load_font_data(data.into());
    }

    /// Loads a font from a file path.
    pub fn load_font_file(&mut self, path: PathBuf) -> Result<(), std::io::Error> {
        self.font_db.load_font_file(path)
    }

    /// Loads the system fonts.
    pub fn load_system_fonts(&mut self) {
        self.font_db.load_system_fonts();
    }

    /// Removes a face by ID.
    pub fn remove_face(&mut self, id: fontdb::ID) {
        self.font_db.remove_face(id);
        self.loaded_font.remove(&id);
        self.glyph_metrics.retain(|(font_id, _), _| *font_id != id);
        if self.default_font == Some(id) {
            self.default_font = None;
        }
    }

    /// Checks if the storage is empty.
    pub fn is_empty(&self) -> bool {
        self.font_db.is_empty()
    }

    /// Returns the number of loaded faces.
    pub fn len(&self) -> usize {
        self.font_db.len()
    }

    /// Sets the font used when a style does not name one.
    pub fn set_default_font(&mut self, id: Option<fontdb::ID>) {
        self.default_font = id;
    }

    /// Queries for a font matching the description.
    pub fn query(&mut self, query: &fontdb::Query) -> Option<(fontdb::ID, Arc<fontdue::Font>)> {
        let id = self.font_db.query(query)?;
        self.font(id).map(|font| (id, font))
    }

    /// Retrieves a loaded font by ID, loading it if necessary.
    pub fn font(&mut self, id: fontdb::ID) -> Option<Arc<fontdue::Font>> {
        use std::collections::hash_map::Entry;

        match self.loaded_font.entry(id) {
            Entry::Occupied(entry) => Some(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let font_result = self.font_db.with_face_data(id, |data, index| {
                    fontdue::Font::from_bytes(
                        data,
                        fontdue::FontSettings {
                            collection_index: index,
                            scale: 40.0,
                            load_substitutions: true,
                        },
                    )
                })?;

                match font_result {
                    Ok(font) => {
                        let r: &mut Arc<fontdue::Font> = entry.insert(Arc::new(font));
                        Some(Arc::clone(r))
                    }
                    Err(e) => {
                        log::error!("Failed to load font (id: {:?}): {}", id, e);
                        None
                    }
                }
            }
        }
    }

    /// Returns face info for an ID.
    pub fn face(&self, id: fontdb::ID) -> Option<&fontdb::FaceInfo> {
        self.font_db.face(id)
    }

    fn resolve_font_id(&self, font: Option<fontdb::ID>) -> Option<fontdb::ID> {
        font.or(self.default_font).or_else(|| {
            self.font_db.query(&fontdb::Query {
                families: &[fontdb::Family::SansSerif],
                ..Default::default()
            })
        })
    }
}

/// Glyph metrics for layout.
impl GlyphSource for FontStorage {
    fn lookup(&mut self, ch: char, font: Option<fontdb::ID>) -> Option<GlyphTexture> {
        let id = self.resolve_font_id(font)?;
        if let Some(cached) = self.glyph_metrics.get(&(id, ch)) {
            return *cached;
        }

        let font = self.font(id)?;
        let glyph_index = font.lookup_glyph_index(ch);
        // index 0 is .notdef, treat it as missing so the caller can fall back
        let texture = (glyph_index != 0).then(|| {
            let metrics = font.metrics_indexed(glyph_index, REFERENCE_PX);
            GlyphTexture {
                display_width: metrics.advance_width / REFERENCE_PX,
                display_height: metrics.height as f32 / REFERENCE_PX,
                id: Some(GlyphId::new(id, glyph_index)),
            }
        });

        self.glyph_metrics.insert((id, ch), texture);
        texture
    }

    fn font_base_height(&mut self, font: Option<fontdb::ID>) -> Option<f32> {
        let id = self.resolve_font_id(font)?;
        let metrics = self.font(id)?.horizontal_line_metrics(REFERENCE_PX)?;
        Some(metrics.ascent / REFERENCE_PX)
    }

    fn char_base_height(&mut self, ch: char) -> Option<f32> {
        let id = self.resolve_font_id(None)?;
        let font = self.font(id)?;
        if font.lookup_glyph_index(ch) == 0 {
            return None;
        }
        let metrics = font.horizontal_line_metrics(REFERENCE_PX)?;
        Some(metrics.ascent / REFERENCE_PX)
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_storage_resolves_nothing() {
        let mut storage = FontStorage::new();
        assert!(storage.is_empty());
        assert_eq!(storage.len(), 0);
        assert!(storage.resolve('a', None).is_none());
        assert!(storage.font_base_height(None).is_none());
        assert!(storage.space_advance(None).is_none());
    }

    #[test]
    fn test_default_font_is_forgotten_on_removal() {
        let mut storage = FontStorage::new();
        let id = fontdb::ID::dummy();
        storage.set_default_font(Some(id));
        storage.remove_face(id);
        assert!(storage.default_font.is_none());
    }
}
