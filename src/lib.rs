//! Renders Bill-of-Materials line items onto the DD1750 packing-list form.
//!
//! Items are split into pages of 18 rows. Each page's text is composed as a
//! vector overlay and merged onto a fresh copy of the blank template. The
//! pages are then assembled into one PDF.

mod assemble;
mod compose;
mod error;
mod input;
pub mod layout;
mod model;
mod paginate;
mod template;
mod text;

pub use assemble::{assemble, to_bytes};
pub use compose::{Align, DrawInstruction, FONT_RESOURCE, compose_page, merge_overlay};
pub use error::{Error, Result};
pub use input::FormRequest;
pub use layout::ROWS_PER_PAGE;
pub use model::{FormHeader, LineItem, RenderedForm};
pub use paginate::{Page, page_count, paginate};
pub use template::Template;

use std::path::Path;
use std::time::Instant;

use log::{debug, info};

/// Renders `items` onto `template`.
///
/// With no items the output is the bare template page, with nothing drawn.
/// Any failure aborts the whole render; no partial document is returned.
pub fn render(
    items: &[LineItem],
    header: Option<&FormHeader>,
    template: &Template,
) -> Result<RenderedForm> {
    let t0 = Instant::now();

    let pages = paginate(items);
    let mut composed = Vec::with_capacity(pages.len().max(1));
    if pages.is_empty() {
        composed.push(template.page_copy()?);
    }
    for page in &pages {
        let instructions = compose_page(page, header);
        debug!(
            "Page {}/{}: {} items, {} draw instructions",
            page.number(),
            page.total,
            page.items.len(),
            instructions.len()
        );
        let mut doc = template.page_copy()?;
        merge_overlay(&mut doc, &instructions)?;
        composed.push(doc);
    }
    let page_count = composed.len();
    let t_compose = t0.elapsed();

    let bytes = to_bytes(assemble(composed)?)?;
    let t_total = t0.elapsed();

    info!(
        "Rendered {} items on {} pages from {}: compose={:.1}ms, assemble={:.1}ms (output {} bytes)",
        items.len(),
        page_count,
        template.source(),
        t_compose.as_secs_f64() * 1000.0,
        (t_total - t_compose).as_secs_f64() * 1000.0,
        bytes.len(),
    );

    Ok(RenderedForm {
        bytes,
        page_count,
        item_count: items.len(),
    })
}

/// Renders and writes the document to `output`.
pub fn render_to_path(
    items: &[LineItem],
    header: Option<&FormHeader>,
    template: &Template,
    output: &Path,
) -> Result<RenderedForm> {
    let form = render(items, header, template)?;
    std::fs::write(output, &form.bytes).map_err(|e| Error::io(output, e))?;
    Ok(form)
}
