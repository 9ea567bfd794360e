//! # Sumi
//!
//! Incremental text layout for Rust.
//!
//! ## Overview
//!
//! `Sumi` lays out glyph runs and flows them into wrapped, anchored
//! paragraphs. Every stage sits behind its own cache, so editing one run of a
//! long paragraph re-lays only that run's glyphs and then repositions the rest.
//! The [`FontSystem`] owns the fonts and drives runs and flows through their
//! update passes.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sumi::{FontSystem, TextFlow, flow::TextAnchor, locale::NoLocalisation};
//!
//! // 1. Create a FontSystem
//! let font_system = FontSystem::new();
//! font_system.load_system_fonts();
//!
//! // 2. Build a flow
//! let mut flow = TextFlow::default();
//! flow.set_width(Some(320.0)).unwrap();
//! flow.set_text_anchor(TextAnchor::Center);
//! flow.add_paragraph("The quick brown fox");
//! flow.add_paragraph("jumps over the lazy dog.");
//!
//! // 3. Update, then read positions
//! font_system.update_flow(&mut flow, &NoLocalisation);
//! for child in flow.children() {
//!     println!("{:?}", child.position());
//! }
//! ```
//!
//! ## Features
//!
//! *   **Glyph Runs**: Wrapping, padding, letter spacing and fixed-width layout per run.
//! *   **Text Flow**: Word wrapping, indents, paragraph and line spacing, baseline matching.
//! *   **Localisation**: Keyed text re-resolved when the locale changes.
//! *   **Font Management**: Easy loading of system fonts and custom font files.

pub mod cache;
pub mod error;
pub mod flow;
pub mod font_storage;
pub mod font_system;
pub mod geometry;
pub mod glyph;
pub mod locale;
pub mod text;

// common re-exports
pub use error::{LayoutError, Result};
pub use flow::TextFlow;
pub use font_storage::FontStorage;
pub use font_system::FontSystem;
pub use glyph::{GlyphId, GlyphSource};
pub use text::{GlyphRun, TextStyle};

// re-export dependencies
pub use euclid;
pub use fontdb;
pub use fontdue;
pub use parking_lot;
