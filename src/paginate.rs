use crate::layout::ROWS_PER_PAGE;
use crate::model::LineItem;

/// A contiguous run of items that fills (at most) one form.
#[derive(Debug, Clone, Copy)]
pub struct Page<'a> {
    pub items: &'a [LineItem],
    /// 0-based position of this page in the output.
    pub index: usize,
    pub total: usize,
}

impl Page<'_> {
    /// 1-based number printed in the page field.
    pub fn number(&self) -> usize {
        self.index + 1
    }
}

/// Splits items into pages of `ROWS_PER_PAGE`, preserving order.
///
/// Empty input yields no pages; the renderer emits the bare template then.
pub fn paginate(items: &[LineItem]) -> Vec<Page<'_>> {
    let total = items.len().div_ceil(ROWS_PER_PAGE);
    items
        .chunks(ROWS_PER_PAGE)
        .enumerate()
        .map(|(index, items)| Page {
            items,
            index,
            total,
        })
        .collect()
}

/// Pages in the output document for `item_count` items.
pub fn page_count(item_count: usize) -> usize {
    item_count.div_ceil(ROWS_PER_PAGE).max(1)
}
