use std::ops::Range;

/// A box handed to the [`RowPacker`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PackItem {
    pub width: f32,
    /// Closes the row it lands in. Such items never wrap themselves.
    pub forced_break: bool,
}

/// One row produced by the packer.
#[derive(Clone, Debug, PartialEq)]
pub struct PackedRow {
    pub items: Range<usize>,
    /// Horizontal offset the row starts at.
    pub inset: f32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Packing {
    pub rows: Vec<PackedRow>,
    /// Left edge of every item, indexed like the input.
    pub x: Vec<f32>,
}

/// Packs boxes into rows left to right, wrapping at `width`.
///
/// Rows are reported explicitly so consumers never have to infer row starts
/// from positions. A box wider than a row still gets a row of its own; it is
/// never split.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RowPacker {
    pub width: f32,
    pub first_row_inset: f32,
    pub row_inset: f32,
}

impl Default for RowPacker {
    fn default() -> Self {
        Self {
            width: f32::INFINITY,
            first_row_inset: 0.0,
            row_inset: 0.0,
        }
    }
}

impl RowPacker {
    fn inset(&self, row: usize) -> f32 {
        if row == 0 {
            self.first_row_inset
        } else {
            self.row_inset
        }
    }

    pub fn pack(&self, items: &[PackItem]) -> Packing {
        let mut packing = Packing {
            rows: Vec::new(),
            x: Vec::with_capacity(items.len()),
        };

        let mut row_start = 0;
        let mut x = self.inset(0);

        for (index, item) in items.iter().enumerate() {
            let row_has_items = index > row_start;
            if !item.forced_break && row_has_items && x + item.width > self.width {
                let inset = self.inset(packing.rows.len());
                packing.rows.push(PackedRow {
                    items: row_start..index,
                    inset,
                });
                row_start = index;
                x = self.inset(packing.rows.len());
            }

            packing.x.push(x);
            x += item.width;

            if item.forced_break {
                let inset = self.inset(packing.rows.len());
                packing.rows.push(PackedRow {
                    items: row_start..index + 1,
                    inset,
                });
                row_start = index + 1;
                x = self.inset(packing.rows.len());
            }
        }

        if row_start < items.len() {
            let inset = self.inset(packing.rows.len());
            packing.rows.push(PackedRow {
                items: row_start..items.len(),
                inset,
            });
        }

        packing
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn word(width: f32) -> PackItem {
        PackItem {
            width,
            forced_break: false,
        }
    }

    const BREAK: PackItem = PackItem {
        width: 0.0,
        forced_break: true,
    };

    #[test]
    fn test_wraps_when_row_is_full() {
        let packer = RowPacker {
            width: 25.0,
            ..Default::default()
        };
        let packing = packer.pack(&[word(10.0), word(10.0), word(10.0)]);

        assert_eq!(packing.rows.len(), 2);
        assert_eq!(packing.rows[0].items, 0..2);
        assert_eq!(packing.rows[1].items, 2..3);
        assert_eq!(packing.x, vec![0.0, 10.0, 0.0]);
    }

    #[test]
    fn test_forced_break_closes_row() {
        let packing = RowPacker::default().pack(&[word(10.0), BREAK, BREAK, word(5.0)]);

        let rows: Vec<_> = packing.rows.iter().map(|row| row.items.clone()).collect();
        assert_eq!(rows, vec![0..2, 2..3, 3..4]);
        assert_eq!(packing.x[3], 0.0);
    }

    #[test]
    fn test_oversized_box_gets_its_own_row() {
        let packer = RowPacker {
            width: 10.0,
            ..Default::default()
        };
        let packing = packer.pack(&[word(50.0), word(5.0)]);

        assert_eq!(packing.rows.len(), 2);
        assert_eq!(packing.x, vec![0.0, 0.0]);
    }

    #[test]
    fn test_insets_apply_per_row() {
        let packer = RowPacker {
            width: 30.0,
            first_row_inset: 8.0,
            row_inset: 4.0,
        };
        let packing = packer.pack(&[word(10.0), word(10.0), word(10.0), word(10.0)]);

        assert_eq!(packing.rows[0].inset, 8.0);
        assert_eq!(packing.rows[1].inset, 4.0);
        assert_eq!(packing.x, vec![8.0, 18.0, 4.0, 14.0]);
    }

    #[test]
    fn test_empty_input_has_no_rows() {
        assert_eq!(RowPacker::default().pack(&[]), Packing::default());
    }
}
