//! Fixed geometry of the blank DD1750 template.
//!
//! Every value here is calibrated against one specific template file
//! (`blank_1750.pdf`, letter size). Swapping the template means
//! recalibrating these numbers; nothing in this module is measured at
//! runtime. Coordinates are PDF points with a bottom-left origin.

// Letter size in points
pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;

/// Item rows printed on one form.
pub const ROWS_PER_PAGE: usize = 18;

/// Horizontal extent of one table column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Column {
    pub left: f32,
    pub right: f32,
}

impl Column {
    pub const fn new(left: f32, right: f32) -> Self {
        Column { left, right }
    }

    pub fn center(&self) -> f32 {
        (self.left + self.right) / 2.0
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }
}

pub const BOX_COLUMN: Column = Column::new(44.0, 88.0);
pub const CONTENT_COLUMN: Column = Column::new(88.0, 365.0);
pub const UNIT_OF_ISSUE_COLUMN: Column = Column::new(365.0, 408.5);
pub const INITIAL_QTY_COLUMN: Column = Column::new(408.5, 453.5);
pub const SPARES_QTY_COLUMN: Column = Column::new(453.5, 514.5);
pub const TOTAL_QTY_COLUMN: Column = Column::new(514.5, 566.0);

// Ruled lines bounding the item table
pub const TABLE_TOP: f32 = 616.0;
pub const TABLE_BOTTOM: f32 = 89.5;

pub const ROW_HEIGHT: f32 = (TABLE_TOP - TABLE_BOTTOM) / ROWS_PER_PAGE as f32;

/// Gap between the table's top rule and the first row anchor.
pub const FIRST_ROW_INSET: f32 = 5.0;
/// Baseline of the main text line, relative to the row anchor.
pub const MAIN_LINE_OFFSET: f32 = 7.0;
/// Baseline of the NSN line under the description.
pub const NSN_LINE_OFFSET: f32 = 17.0;
/// Left padding inside the content column.
pub const CONTENT_PAD_X: f32 = 3.0;

pub const DESCRIPTION_MAX_CHARS: usize = 50;
pub const END_ITEM_MAX_CHARS: usize = 60;

/// Anchor y of a row, 0-indexed within its page.
pub fn row_anchor(row: usize) -> f32 {
    (TABLE_TOP - FIRST_ROW_INSET) - row as f32 * ROW_HEIGHT
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

const fn at(x: f32, y: f32) -> Point {
    Point { x, y }
}

pub const PACKED_BY: Point = at(95.0, 735.0);
pub const NO_BOXES: Point = at(240.0, 735.0);
pub const REQUISITION_NO: Point = at(370.0, 735.0);
pub const ORDER_NO: Point = at(370.0, 710.0);
pub const END_ITEM: Point = at(95.0, 685.0);
pub const DATE: Point = at(500.0, 685.0);
pub const PAGE_NUMBER: Point = at(500.0, 660.0);
pub const PAGE_TOTAL: Point = at(545.0, 660.0);
pub const CERTIFIER_NAME: Point = at(95.0, 55.0);
pub const CERTIFIER_TITLE: Point = at(280.0, 55.0);

pub mod font_size {
    pub const HEADER: f32 = 10.0;
    pub const END_ITEM: f32 = 8.0;
    pub const CERTIFIER: f32 = 9.0;
    pub const BOX_NUMBER: f32 = 8.0;
    pub const DESCRIPTION: f32 = 7.0;
    pub const NSN: f32 = 6.0;
    pub const QUANTITY: f32 = 8.0;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_height_divides_table() {
        assert!((ROW_HEIGHT - 29.25).abs() < 1e-4);
        assert!((row_anchor(0) - 611.0).abs() < 1e-4);
        assert!((row_anchor(1) - (611.0 - 29.25)).abs() < 1e-4);
    }

    #[test]
    fn nsn_line_stays_inside_its_row() {
        assert!(ROW_HEIGHT > NSN_LINE_OFFSET + font_size::NSN / 2.0);
        // Last row's NSN baseline still sits above the table's bottom rule
        let last = row_anchor(ROWS_PER_PAGE - 1) - NSN_LINE_OFFSET;
        assert!(last > TABLE_BOTTOM);
    }

    #[test]
    fn columns_are_contiguous() {
        let cols = [
            BOX_COLUMN,
            CONTENT_COLUMN,
            UNIT_OF_ISSUE_COLUMN,
            INITIAL_QTY_COLUMN,
            SPARES_QTY_COLUMN,
            TOTAL_QTY_COLUMN,
        ];
        for pair in cols.windows(2) {
            assert_eq!(pair[0].right, pair[1].left);
        }
        assert!(cols.iter().all(|c| c.width() > 0.0));
        assert!(TOTAL_QTY_COLUMN.right < PAGE_WIDTH);
        assert_eq!(BOX_COLUMN.center(), 66.0);
    }
}
