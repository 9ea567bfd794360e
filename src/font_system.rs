use std::{path::PathBuf, sync::Arc};

use parking_lot::Mutex;

use crate::{
    flow::TextFlow,
    font_storage::FontStorage,
    locale::Localiser,
    text::{GlyphLayout, GlyphRun, ScreenLayout},
};

/// High-level entry point for layout.
///
/// Owns the [`FontStorage`] behind a `Mutex` so runs and flows can be updated
/// from wherever a shared reference to the system is available, which is
/// common in UI frameworks.
///
/// The field is public to allow direct access to the storage when necessary
/// (e.g. to update many runs under a single lock).
pub struct FontSystem {
    /// The underlying font storage.
    pub font_storage: Mutex<FontStorage>,
}

impl Default for FontSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FontSystem {
    /// Creates a new font system with an empty storage.
    pub fn new() -> Self {
        Self {
            font_storage: Mutex::new(FontStorage::new()),
        }
    }
}

/// font storage initialization
impl FontSystem {
    /// Loads the system fonts into the storage.
    pub fn load_system_fonts(&self) {
        self.font_storage.lock().load_system_fonts();
    }

    /// Loads a font from binary data.
    pub fn load_font_binary(&self, data: impl Into<Vec<u8>>) {
        self.font_storage.lock().load_font_binary(data);
    }

    /// Loads a font from a file path.
    pub fn load_font_file(&self, path: PathBuf) -> Result<(), std::io::Error> {
        self.font_storage.lock().load_font_file(path)
    }

    /// Removes a face by ID.
    pub fn remove_face(&self, id: fontdb::ID) {
        self.font_storage.lock().remove_face(id);
    }

    /// Sets the font used when a style does not name one.
    pub fn set_default_font(&self, id: Option<fontdb::ID>) {
        self.font_storage.lock().set_default_font(id);
    }

    /// Checks if the storage is empty.
    pub fn is_empty(&self) -> bool {
        self.font_storage.lock().is_empty()
    }

    /// Returns the number of loaded faces.
    pub fn len(&self) -> usize {
        self.font_storage.lock().len()
    }
}

/// font querying
impl FontSystem {
    /// Queries for a font matching the description.
    pub fn query(&self, query: &fontdb::Query) -> Option<(fontdb::ID, Arc<fontdue::Font>)> {
        self.font_storage.lock().query(query)
    }

    /// Retrieves a loaded font by ID.
    pub fn font(&self, id: fontdb::ID) -> Option<Arc<fontdue::Font>> {
        self.font_storage.lock().font(id)
    }

    /// Returns face info for an ID.
    ///
    /// # Performance
    /// This method clones the face info to avoid holding a lock on the storage.
    /// If you need reference access, lock `font_storage` directly.
    pub fn face(&self, id: fontdb::ID) -> Option<fontdb::FaceInfo> {
        self.font_storage.lock().face(id).cloned()
    }
}

/// text layout
impl FontSystem {
    /// Brings the run's glyph cache up to date. Returns whether it was recomputed.
    pub fn update_run(&self, run: &mut GlyphRun) -> bool {
        run.update(&mut *self.font_storage.lock())
    }

    /// Returns a copy of the run's glyph layout, computing it first if needed.
    ///
    /// # Performance
    /// This method clones the layout so the storage lock is released on return.
    /// Use [`GlyphRun::layout`] with a locked `font_storage` to borrow it instead.
    pub fn layout_run(&self, run: &mut GlyphRun) -> GlyphLayout {
        run.layout(&mut *self.font_storage.lock()).clone()
    }

    /// Returns a copy of the run's parent-space layout, computing it first if needed.
    pub fn screen_layout(&self, run: &mut GlyphRun) -> ScreenLayout {
        run.screen_layout(&mut *self.font_storage.lock()).clone()
    }

    /// Brings every cache of the flow up to date. Returns whether the flow was re-laid out.
    pub fn update_flow(&self, flow: &mut TextFlow, localiser: &dyn Localiser) -> bool {
        flow.update(&mut *self.font_storage.lock(), localiser)
    }
}
