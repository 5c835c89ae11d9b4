//! Page composition: what to draw on one form, and the overlay merge.
//!
//! Composition is split in two. `compose_page` is pure and turns a page of
//! items into positioned [`DrawInstruction`]s. `merge_overlay` encodes those
//! as a content stream layered over the template page.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};
use log::warn;

use crate::error::{Error, Result};
use crate::layout::{self, Column, Point, font_size};
use crate::model::{FormHeader, LineItem, present};
use crate::paginate::Page;
use crate::text::{encode_winansi, string_width, truncate_chars};

/// Resource name of the overlay font on every composed page.
pub const FONT_RESOURCE: &str = "FDD1750";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    /// `x` is the centre of the text.
    Centered,
}

/// One positioned run of text.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawInstruction {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub font_size: f32,
    pub align: Align,
}

impl DrawInstruction {
    fn left(text: impl Into<String>, at: Point, font_size: f32) -> Self {
        DrawInstruction {
            text: text.into(),
            x: at.x,
            y: at.y,
            font_size,
            align: Align::Left,
        }
    }

    fn centered(text: impl Into<String>, column: Column, y: f32, font_size: f32) -> Self {
        DrawInstruction {
            text: text.into(),
            x: column.center(),
            y,
            font_size,
            align: Align::Centered,
        }
    }

    /// x of the text's left edge, after alignment.
    pub fn origin_x(&self) -> f32 {
        match self.align {
            Align::Left => self.x,
            Align::Centered => self.x - string_width(&self.text, self.font_size) / 2.0,
        }
    }
}

/// Draw instructions for one page: header block, page numbering, item rows.
pub fn compose_page(page: &Page<'_>, header: Option<&FormHeader>) -> Vec<DrawInstruction> {
    let mut out = Vec::with_capacity(4 + page.items.len() * 7);

    if let Some(header) = header {
        header_fields(&mut out, header);
    }

    out.push(DrawInstruction::left(
        page.number().to_string(),
        layout::PAGE_NUMBER,
        font_size::HEADER,
    ));
    out.push(DrawInstruction::left(
        page.total.to_string(),
        layout::PAGE_TOTAL,
        font_size::HEADER,
    ));

    if let Some(header) = header {
        certifier(&mut out, header);
    }

    for (row, item) in page.items.iter().enumerate() {
        item_row(&mut out, row, item);
    }
    out
}

fn header_fields(out: &mut Vec<DrawInstruction>, header: &FormHeader) {
    let fields = [
        (&header.packed_by, layout::PACKED_BY),
        (&header.no_boxes, layout::NO_BOXES),
        (&header.requisition_no, layout::REQUISITION_NO),
        (&header.order_no, layout::ORDER_NO),
    ];
    for (value, at) in fields {
        if let Some(text) = present(value) {
            out.push(DrawInstruction::left(text, at, font_size::HEADER));
        }
    }

    if let Some(end_item) = present(&header.end_item) {
        out.push(DrawInstruction::left(
            truncate_chars(end_item, layout::END_ITEM_MAX_CHARS),
            layout::END_ITEM,
            font_size::END_ITEM,
        ));
    }
    if let Some(date) = present(&header.date) {
        out.push(DrawInstruction::left(date, layout::DATE, font_size::HEADER));
    }
}

fn certifier(out: &mut Vec<DrawInstruction>, header: &FormHeader) {
    if let Some(name) = present(&header.certifier_name) {
        out.push(DrawInstruction::left(name, layout::CERTIFIER_NAME, font_size::CERTIFIER));
    }
    if let Some(title) = present(&header.certifier_title) {
        out.push(DrawInstruction::left(title, layout::CERTIFIER_TITLE, font_size::CERTIFIER));
    }
}

fn item_row(out: &mut Vec<DrawInstruction>, row: usize, item: &LineItem) {
    let anchor = layout::row_anchor(row);
    let y = anchor - layout::MAIN_LINE_OFFSET;
    let content_x = layout::CONTENT_COLUMN.left + layout::CONTENT_PAD_X;

    out.push(DrawInstruction::centered(
        item.line_no.to_string(),
        layout::BOX_COLUMN,
        y,
        font_size::BOX_NUMBER,
    ));
    out.push(DrawInstruction::left(
        truncate_chars(&item.description, layout::DESCRIPTION_MAX_CHARS),
        Point { x: content_x, y },
        font_size::DESCRIPTION,
    ));
    if let Some(nsn) = item.nsn() {
        out.push(DrawInstruction::left(
            format!("NSN: {nsn}"),
            Point {
                x: content_x,
                y: anchor - layout::NSN_LINE_OFFSET,
            },
            font_size::NSN,
        ));
    }

    let columns = [
        (item.unit_of_issue.clone(), layout::UNIT_OF_ISSUE_COLUMN),
        (item.initial_qty.to_string(), layout::INITIAL_QTY_COLUMN),
        (item.spares_qty.to_string(), layout::SPARES_QTY_COLUMN),
        (item.total_qty.to_string(), layout::TOTAL_QTY_COLUMN),
    ];
    for (text, column) in columns {
        out.push(DrawInstruction::centered(text, column, y, font_size::QUANTITY));
    }
}

/// Encodes instructions as a text-only content stream.
///
/// The stream opens with `Q` to close the `q` that wraps the template's own
/// content, so the overlay starts from the default graphics state.
pub(crate) fn overlay_content(instructions: &[DrawInstruction]) -> Content {
    let mut operations = Vec::with_capacity(3 + instructions.len() * 5);
    operations.push(Operation::new("Q", vec![]));
    operations.push(Operation::new("q", vec![]));
    operations.push(Operation::new("g", vec![0.into()]));

    for ins in instructions {
        let encoded = encode_winansi(&ins.text);
        if encoded.replaced > 0 {
            warn!(
                "{} character(s) in {:?} have no WinAnsi mapping; drawn as '?'",
                encoded.replaced, ins.text
            );
        }
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new(
            "Tf",
            vec![FONT_RESOURCE.into(), ins.font_size.into()],
        ));
        operations.push(Operation::new(
            "Td",
            vec![ins.origin_x().into(), ins.y.into()],
        ));
        operations.push(Operation::new(
            "Tj",
            vec![Object::String(encoded.bytes, StringFormat::Literal)],
        ));
        operations.push(Operation::new("ET", vec![]));
    }

    operations.push(Operation::new("Q", vec![]));
    Content { operations }
}

/// Layers `instructions` over the single page of `doc`.
pub fn merge_overlay(doc: &mut Document, instructions: &[DrawInstruction]) -> Result<()> {
    let page_id = *doc
        .get_pages()
        .values()
        .next()
        .ok_or_else(|| Error::InvalidTemplate {
            detail: "template page is missing".to_string(),
        })?;

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let open_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    // Template streams may end without an EOL; keep the overlay's first
    // operator from fusing with the template's last one.
    let mut overlay = b"\n".to_vec();
    overlay.extend(overlay_content(instructions).encode()?);
    let overlay_id = doc.add_object(Stream::new(Dictionary::new(), overlay));

    let resources = merged_resources(doc, page_id, font_id)?;
    let mut contents = vec![Object::Reference(open_id)];
    contents.extend(existing_contents(doc, page_id)?);
    contents.push(Object::Reference(overlay_id));

    let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
    page.set("Contents", contents);
    page.set("Resources", resources);
    Ok(())
}

fn existing_contents(doc: &Document, page_id: ObjectId) -> Result<Vec<Object>> {
    let page = doc.get_object(page_id)?.as_dict()?;
    let contents = match page.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id)? {
            Object::Array(parts) => parts.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(parts)) => parts.clone(),
        _ => Vec::new(),
    };
    Ok(contents)
}

/// Page resources with the overlay font added, resolved to an inline
/// dictionary so the page stays self-contained.
fn merged_resources(doc: &Document, page_id: ObjectId, font_id: ObjectId) -> Result<Dictionary> {
    let page = doc.get_object(page_id)?.as_dict()?;
    let mut resources = match page.get(b"Resources") {
        Ok(Object::Reference(id)) => doc.get_object(*id)?.as_dict()?.clone(),
        Ok(Object::Dictionary(dict)) => dict.clone(),
        _ => Dictionary::new(),
    };
    let mut fonts = match resources.get(b"Font") {
        Ok(Object::Reference(id)) => doc.get_object(*id)?.as_dict()?.clone(),
        Ok(Object::Dictionary(dict)) => dict.clone(),
        _ => Dictionary::new(),
    };
    fonts.set(FONT_RESOURCE, font_id);
    resources.set("Font", fonts);
    Ok(resources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paginate::paginate;

    fn wrench() -> LineItem {
        LineItem::new(1, "WRENCH, ADJUSTABLE: 12 IN.")
            .with_nsn("123456789")
            .with_quantities(2, 0)
    }

    fn texts(instructions: &[DrawInstruction]) -> Vec<&str> {
        instructions.iter().map(|i| i.text.as_str()).collect()
    }

    #[test]
    fn single_item_without_header() {
        let items = [wrench()];
        let pages = paginate(&items);
        let out = compose_page(&pages[0], None);
        assert_eq!(
            texts(&out),
            [
                "1",
                "1",
                "1",
                "WRENCH, ADJUSTABLE: 12 IN.",
                "NSN: 123456789",
                "EA",
                "2",
                "0",
                "2"
            ]
        );

        let line_no = &out[2];
        assert_eq!(line_no.align, Align::Centered);
        assert_eq!(line_no.x, 66.0);
        assert!((line_no.y - 604.0).abs() < 1e-4);

        let desc = &out[3];
        assert_eq!((desc.x, desc.align, desc.font_size), (91.0, Align::Left, 7.0));

        let nsn = &out[4];
        assert!((nsn.y - 594.0).abs() < 1e-4);
        assert_eq!(nsn.font_size, 6.0);
    }

    #[test]
    fn description_truncated_to_fifty_chars() {
        let fifty = "D".repeat(50);
        let items = [
            LineItem::new(1, fifty.clone()),
            LineItem::new(2, format!("{fifty}X")),
        ];
        let pages = paginate(&items);
        let out = compose_page(&pages[0], None);
        let descriptions: Vec<&str> = out
            .iter()
            .filter(|i| i.font_size == font_size::DESCRIPTION)
            .map(|i| i.text.as_str())
            .collect();
        assert_eq!(descriptions, [fifty.as_str(), fifty.as_str()]);
    }

    #[test]
    fn missing_nsn_draws_no_second_line() {
        let items = [LineItem::new(1, "TAPE, DUCT")];
        let pages = paginate(&items);
        let out = compose_page(&pages[0], None);
        assert!(out.iter().all(|i| !i.text.starts_with("NSN:")));
        assert_eq!(out.len(), 2 + 6);
    }

    #[test]
    fn nsn_is_drawn_untrimmed() {
        let items = [LineItem::new(1, "BOLT").with_nsn(" 12 ")];
        let pages = paginate(&items);
        let out = compose_page(&pages[0], None);
        assert!(out.iter().any(|i| i.text == "NSN:  12 "));
    }

    #[test]
    fn rows_step_down_by_row_height() {
        let items: Vec<LineItem> = (1..=3).map(|i| LineItem::new(i, "X")).collect();
        let pages = paginate(&items);
        let out = compose_page(&pages[0], None);
        let ys: Vec<f32> = out
            .iter()
            .filter(|i| i.font_size == font_size::BOX_NUMBER && i.align == Align::Centered)
            .filter(|i| i.x == layout::BOX_COLUMN.center())
            .map(|i| i.y)
            .collect();
        assert_eq!(ys.len(), 3);
        assert!((ys[0] - ys[1] - layout::ROW_HEIGHT).abs() < 1e-4);
        assert!((ys[1] - ys[2] - layout::ROW_HEIGHT).abs() < 1e-4);
    }

    #[test]
    fn header_fields_and_certifier() {
        let header = FormHeader {
            packed_by: Some("SGT SMITH".into()),
            no_boxes: Some("3".into()),
            requisition_no: Some(String::new()),
            end_item: Some("E".repeat(70)),
            date: Some("2024-05-01".into()),
            certifier_title: Some("SUPPLY SGT".into()),
            ..FormHeader::default()
        };
        let items = [wrench()];
        let pages = paginate(&items);
        let out = compose_page(&pages[0], Some(&header));

        let find = |text: &str| out.iter().find(|i| i.text == text);
        assert_eq!(find("SGT SMITH").map(|i| (i.x, i.y)), Some((95.0, 735.0)));
        assert_eq!(find("3").map(|i| (i.x, i.y)), Some((240.0, 735.0)));
        assert_eq!(find("2024-05-01").map(|i| (i.x, i.y)), Some((500.0, 685.0)));
        assert_eq!(
            find("SUPPLY SGT").map(|i| (i.x, i.y, i.font_size)),
            Some((280.0, 55.0, 9.0))
        );

        let end_item = out.iter().find(|i| i.y == 685.0 && i.x == 95.0).unwrap();
        assert_eq!(end_item.text.chars().count(), 60);
        assert_eq!(end_item.font_size, 8.0);

        // Empty requisition number is not drawn
        assert!(!out.iter().any(|i| i.x == 370.0 && i.y == 735.0));
        // No certifier name given
        assert!(!out.iter().any(|i| i.x == 95.0 && i.y == 55.0));
    }

    #[test]
    fn page_numbers_on_every_page() {
        let items: Vec<LineItem> = (1..=40).map(|i| LineItem::new(i, "X")).collect();
        let pages = paginate(&items);
        for page in &pages {
            let out = compose_page(page, Some(&FormHeader::default()));
            let number = out.iter().find(|i| i.x == 500.0 && i.y == 660.0).unwrap();
            let total = out.iter().find(|i| i.x == 545.0 && i.y == 660.0).unwrap();
            assert_eq!(number.text, page.number().to_string());
            assert_eq!(total.text, "3");
        }
    }

    #[test]
    fn centered_origin_uses_string_width() {
        let ins = DrawInstruction::centered("EA", layout::UNIT_OF_ISSUE_COLUMN, 100.0, 8.0);
        let width = string_width("EA", 8.0);
        assert!((ins.origin_x() + width / 2.0 - 386.75).abs() < 1e-4);
    }

    #[test]
    fn overlay_stream_wraps_text_objects() {
        let ins = [DrawInstruction::left("A(B)", layout::DATE, 10.0)];
        let ops = overlay_content(&ins).operations;
        let names: Vec<&str> = ops.iter().map(|o| o.operator.as_str()).collect();
        assert_eq!(names, ["Q", "q", "g", "BT", "Tf", "Td", "Tj", "ET", "Q"]);
        assert!(matches!(
            &ops[6].operands[0],
            Object::String(bytes, _) if bytes == b"A(B)"
        ));
    }
}
