use crate::geometry::Padding;

/// Rejections raised by mutators when a value can never produce a valid layout.
///
/// The mutator that returns one of these leaves its target untouched.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum LayoutError {
    #[error("padding must be finite, got {0:?}")]
    NonFinitePadding(Padding),

    #[error("text size must be positive and finite, got {0}")]
    InvalidTextSize(f32),

    #[error("spacing must be finite and non-negative, got ({x}, {y})")]
    InvalidSpacing { x: f32, y: f32 },

    #[error("explicit extent must be finite and non-negative, got {0}")]
    InvalidExtent(f32),

    #[error("{name} must be finite, got {value}")]
    NonFiniteParameter { name: &'static str, value: f32 },
}

pub type Result<T, E = LayoutError> = std::result::Result<T, E>;

/// Checks a float parameter that only has to be finite.
pub(crate) fn finite(name: &'static str, value: f32) -> Result<f32> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(LayoutError::NonFiniteParameter { name, value })
    }
}

/// Checks an explicit width/height.
pub(crate) fn extent(value: f32) -> Result<f32> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(LayoutError::InvalidExtent(value))
    }
}
