use std::collections::HashSet;

use crate::{
    error::{LayoutError, Result},
    geometry::{Padding, RunVector},
};

/// Characters that keep their natural advance in fixed-width mode by default.
const DEFAULT_FIXED_WIDTH_EXCEPTIONS: [char; 4] = ['.', ',', ':', ' '];

/// Styling knobs of a single glyph run.
///
/// A style is read, never mutated, during a layout pass. Every field affects
/// glyph placement, so changing any of them invalidates the run's glyph cache.
#[derive(Clone, Debug, PartialEq)]
pub struct TextStyle {
    pub text_size: f32,
    pub font: Option<fontdb::ID>,
    pub spacing: RunVector,
    pub padding: Padding,
    pub allow_multiline: bool,
    pub fixed_width: bool,
    pub use_full_glyph_height: bool,
    pub fixed_width_exceptions: HashSet<char, fxhash::FxBuildHasher>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            text_size: 20.0,
            font: None,
            spacing: RunVector::zero(),
            padding: Padding::zero(),
            allow_multiline: true,
            fixed_width: false,
            use_full_glyph_height: true,
            fixed_width_exceptions: DEFAULT_FIXED_WIDTH_EXCEPTIONS.into_iter().collect(),
        }
    }
}

impl TextStyle {
    /// Rejects values no layout pass can honor.
    pub fn validate(&self) -> Result<()> {
        validate_text_size(self.text_size)?;
        validate_spacing(self.spacing)?;
        validate_padding(self.padding)?;
        Ok(())
    }

    /// Whether `ch` advances by the fixed reference width.
    pub fn is_fixed_width(&self, ch: char) -> bool {
        self.fixed_width && !self.fixed_width_exceptions.contains(&ch)
    }
}

pub(crate) fn validate_text_size(text_size: f32) -> Result<f32> {
    if text_size.is_finite() && text_size > 0.0 {
        Ok(text_size)
    } else {
        Err(LayoutError::InvalidTextSize(text_size))
    }
}

pub(crate) fn validate_spacing(spacing: RunVector) -> Result<RunVector> {
    let ok = |v: f32| v.is_finite() && v >= 0.0;
    if ok(spacing.x) && ok(spacing.y) {
        Ok(spacing)
    } else {
        Err(LayoutError::InvalidSpacing {
            x: spacing.x,
            y: spacing.y,
        })
    }
}

pub(crate) fn validate_padding(padding: Padding) -> Result<Padding> {
    let finite = [padding.top, padding.right, padding.bottom, padding.left]
        .iter()
        .all(|v| v.is_finite());
    if finite {
        Ok(padding)
    } else {
        Err(LayoutError::NonFinitePadding(padding))
    }
}

/// Partial style applied on top of a flow's default style.
///
/// `None` keeps the default's value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StyleOverride {
    pub text_size: Option<f32>,
    pub font: Option<fontdb::ID>,
    pub spacing: Option<RunVector>,
    pub padding: Option<Padding>,
    pub fixed_width: Option<bool>,
    pub use_full_glyph_height: Option<bool>,
}

impl StyleOverride {
    pub fn apply(&self, base: &TextStyle) -> TextStyle {
        let mut style = base.clone();
        if let Some(text_size) = self.text_size {
            style.text_size = text_size;
        }
        if self.font.is_some() {
            style.font = self.font;
        }
        if let Some(spacing) = self.spacing {
            style.spacing = spacing;
        }
        if let Some(padding) = self.padding {
            style.padding = padding;
        }
        if let Some(fixed_width) = self.fixed_width {
            style.fixed_width = fixed_width;
        }
        if let Some(full) = self.use_full_glyph_height {
            style.use_full_glyph_height = full;
        }
        style
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(text_size) = self.text_size {
            validate_text_size(text_size)?;
        }
        if let Some(spacing) = self.spacing {
            validate_spacing(spacing)?;
        }
        if let Some(padding) = self.padding {
            validate_padding(padding)?;
        }
        Ok(())
    }
}
