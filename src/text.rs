/// Glyph placement for a single run of text.
pub mod layout;
/// The glyph run entity and its caches.
pub mod run;
/// Per-run styling.
pub mod style;

pub use layout::{Extent, GlyphLayout, GlyphPlacement, LayoutBounds};
pub use run::{GlyphRun, ScreenLayout};
pub use style::{StyleOverride, TextStyle};
