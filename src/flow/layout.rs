use std::ops::Range;

use crate::{
    error::{self, Result},
    flow::positioner::{PackItem, RowPacker},
    geometry::{FlowPoint, FlowSize},
};

/// Horizontal anchor of every line inside the flow.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextAnchor {
    #[default]
    Left,
    Center,
    Right,
}

/// Paragraph-level layout settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlowConfig {
    /// Left margin of the first entity of the first line.
    pub first_line_indent: f32,
    /// Left margin of the first entity of every other line.
    pub content_indent: f32,
    /// Height of a paragraph break, as a multiple of the line it closes.
    pub paragraph_spacing: f32,
    /// Gap above every line, as a multiple of the previous line's height.
    pub line_spacing: f32,
    pub anchor: TextAnchor,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            first_line_indent: 0.0,
            content_indent: 0.0,
            paragraph_spacing: 0.5,
            line_spacing: 0.0,
            anchor: TextAnchor::Left,
        }
    }
}

impl FlowConfig {
    pub fn validate(&self) -> Result<()> {
        error::finite("first_line_indent", self.first_line_indent)?;
        error::finite("content_indent", self.content_indent)?;
        error::finite("paragraph_spacing", self.paragraph_spacing)?;
        error::finite("line_spacing", self.line_spacing)?;
        Ok(())
    }
}

/// What the flow layout needs to know about one realized child.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FlowEntity {
    Content {
        size: FlowSize,
        /// `None` when the child cannot report a baseline.
        base_height: Option<f32>,
    },
    Break {
        paragraph: bool,
    },
}

/// Where one entity ended up.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EntityPlacement {
    pub position: FlowPoint,
    /// For breaks, the width is zero and the height is the computed spacer height.
    pub size: FlowSize,
    pub margin_top: f32,
    pub margin_left: f32,
}

/// A visual row of the flow. Rebuilt on every pass.
#[derive(Clone, Debug, PartialEq)]
pub struct FlowLine {
    pub entities: Range<usize>,
    pub y: f32,
    /// Vertical advance of the row, margins and break spacer included.
    pub height: f32,
    /// Tallest content entity, margins excluded. Zero for break-only rows.
    pub content_height: f32,
    pub base_height: f32,
    pub offset_from_right: f32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FlowOutput {
    pub placements: Vec<EntityPlacement>,
    pub lines: Vec<FlowLine>,
    pub size: FlowSize,
}

/// Arranges entities into lines, then aligns them.
///
/// `width` is the container width; `None` lets lines grow without wrapping
/// and anchors against the widest line.
pub fn compute(config: &FlowConfig, entities: &[FlowEntity], width: Option<f32>) -> FlowOutput {
    let packer = RowPacker {
        width: width.unwrap_or(f32::INFINITY),
        first_row_inset: config.first_line_indent,
        row_inset: config.content_indent,
    };
    let items: Vec<PackItem> = entities
        .iter()
        .map(|entity| match entity {
            FlowEntity::Content { size, .. } => PackItem {
                width: size.width,
                forced_break: false,
            },
            FlowEntity::Break { .. } => PackItem {
                width: 0.0,
                forced_break: true,
            },
        })
        .collect();
    let packing = packer.pack(&items);

    let right_extent = |range: &Range<usize>| {
        range
            .clone()
            .rev()
            .find_map(|index| match entities[index] {
                FlowEntity::Content { size, .. } => Some(packing.x[index] + size.width),
                FlowEntity::Break { .. } => None,
            })
    };

    let container_width = width.unwrap_or_else(|| {
        packing
            .rows
            .iter()
            .filter_map(|row| right_extent(&row.items))
            .fold(0.0, f32::max)
    });

    let mut output = FlowOutput {
        placements: vec![EntityPlacement::default(); entities.len()],
        lines: Vec::with_capacity(packing.rows.len()),
        size: FlowSize::zero(),
    };

    let mut y = 0.0;
    let mut last_line_height: f32 = 0.0;

    for row in &packing.rows {
        let range = row.items.clone();
        let contents = || {
            range.clone().filter_map(move |index| match entities[index] {
                FlowEntity::Content { size, base_height } => Some((index, size, base_height)),
                FlowEntity::Break { .. } => None,
            })
        };

        let base_height = contents()
            .filter_map(|(_, _, base)| base)
            .fold(0.0, f32::max);
        let content_height = contents()
            .map(|(_, size, _)| size.height)
            .fold(0.0, f32::max);
        let line_gap = last_line_height * config.line_spacing;

        let offset_from_right = right_extent(&range)
            .map(|right| container_width - right)
            .unwrap_or(0.0);
        let shift = match config.anchor {
            TextAnchor::Left => 0.0,
            TextAnchor::Center => offset_from_right / 2.0,
            TextAnchor::Right => offset_from_right,
        };

        let mut content_bottom = y;
        for (index, size, own_base) in contents() {
            let baseline_offset = own_base.map(|own| base_height - own).unwrap_or(0.0);
            let margin_top = baseline_offset + line_gap;
            let margin_left = if index == range.start { row.inset } else { 0.0 };

            output.placements[index] = EntityPlacement {
                position: FlowPoint::new(packing.x[index] + shift, y + margin_top),
                size,
                margin_top,
                margin_left,
            };
            content_bottom = content_bottom.max(y + margin_top + size.height);
        }

        let mut break_height = 0.0;
        for index in range.clone() {
            if let FlowEntity::Break { paragraph } = entities[index] {
                let height = if paragraph {
                    let line_height = if content_height == 0.0 {
                        last_line_height
                    } else {
                        content_height
                    };
                    line_height * config.paragraph_spacing
                } else {
                    0.0
                };
                output.placements[index] = EntityPlacement {
                    position: FlowPoint::new(packing.x[index] + shift, content_bottom),
                    size: FlowSize::new(0.0, height),
                    margin_top: 0.0,
                    margin_left: if index == range.start { row.inset } else { 0.0 },
                };
                break_height += height;
            }
        }

        let next_y = content_bottom + break_height;
        output.lines.push(FlowLine {
            entities: range,
            y,
            height: next_y - y,
            content_height,
            base_height,
            offset_from_right,
        });

        if content_height > 0.0 {
            last_line_height = content_height;
        }
        y = next_y;
    }

    output.size = FlowSize::new(container_width, y);
    output
}
