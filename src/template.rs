//! The blank form every page is drawn on.
//!
//! A template is validated and reduced to a single self-contained page once,
//! at load time. Each composed page then starts from a fresh parse of those
//! bytes, so the stored template is never mutated and can be shared across
//! renders.

use std::path::Path;

use image::DynamicImage;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use log::{debug, warn};

use crate::error::{Error, Result};
use crate::layout::{PAGE_HEIGHT, PAGE_WIDTH};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Depth limit when walking `/Parent` links of malformed page trees.
const MAX_TREE_DEPTH: usize = 16;

const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "tif", "tiff", "bmp"];

#[derive(Debug, Clone)]
pub struct Template {
    /// Single-page PDF, normalized.
    bytes: Vec<u8>,
    source: String,
}

impl Template {
    /// Loads a template PDF, or a raster scan of the blank form.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::TemplateNotFound {
                path: path.to_path_buf(),
            });
        }

        let is_image = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false);

        let mut template = if is_image {
            Self::from_image(&image::open(path)?)?
        } else {
            let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
            Self::from_pdf_bytes(&bytes)?
        };
        template.source = path.display().to_string();
        Ok(template)
    }

    pub fn from_pdf_bytes(bytes: &[u8]) -> Result<Self> {
        let doc = Document::load_mem(bytes).map_err(|e| Error::InvalidTemplate {
            detail: format!("cannot parse PDF: {e}"),
        })?;
        Ok(Template {
            bytes: normalize(doc)?,
            source: "<memory>".to_string(),
        })
    }

    /// Places a scanned blank form full-bleed on a letter page.
    pub fn from_image(image: &DynamicImage) -> Result<Self> {
        let doc = image_page(image)?;
        Ok(Template {
            bytes: normalize(doc)?,
            source: "<image>".to_string(),
        })
    }

    /// Fresh single-page document to draw on.
    pub fn page_copy(&self) -> Result<Document> {
        Ok(Document::load_mem(&self.bytes)?)
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Reduces a document to its first page with all inherited attributes
/// copied onto the page itself.
fn normalize(mut doc: Document) -> Result<Vec<u8>> {
    if doc.is_encrypted() {
        return Err(Error::InvalidTemplate {
            detail: "template is encrypted".to_string(),
        });
    }

    let pages = doc.get_pages();
    let first = *pages.values().next().ok_or_else(|| Error::InvalidTemplate {
        detail: "template has no pages".to_string(),
    })?;
    if pages.len() > 1 {
        warn!("Template has {} pages; only the first is used", pages.len());
    }

    materialize_inherited(&mut doc, first)?;
    keep_single_page(&mut doc, first)?;
    let pruned = doc.prune_objects();
    debug!("Template normalized: pruned {} objects", pruned.len());

    let mut out = Vec::new();
    doc.save_to(&mut out).map_err(|e| Error::InvalidTemplate {
        detail: format!("cannot re-serialize template: {e}"),
    })?;
    Ok(out)
}

fn materialize_inherited(doc: &mut Document, page_id: ObjectId) -> Result<()> {
    let mut inherited = Vec::new();
    {
        let page = doc.get_object(page_id)?.as_dict()?;
        for key in INHERITABLE {
            if page.has(key) {
                continue;
            }
            if let Some(value) = find_inherited(doc, page, key, MAX_TREE_DEPTH) {
                inherited.push((key, value));
            }
        }
    }

    let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
    for (key, value) in inherited {
        page.set(key, value);
    }
    if !page.has(b"MediaBox") {
        page.set(
            "MediaBox",
            vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        );
    }
    Ok(())
}

fn find_inherited(doc: &Document, node: &Dictionary, key: &[u8], depth: usize) -> Option<Object> {
    if depth == 0 {
        return None;
    }
    let parent_id = node.get(b"Parent").and_then(Object::as_reference).ok()?;
    let parent = doc.get_object(parent_id).and_then(Object::as_dict).ok()?;
    match parent.get(key) {
        Ok(value) => Some(value.clone()),
        Err(_) => find_inherited(doc, parent, key, depth - 1),
    }
}

/// Points the page tree at `page_id` alone.
fn keep_single_page(doc: &mut Document, page_id: ObjectId) -> Result<()> {
    let catalog_id = doc.trailer.get(b"Root")?.as_reference()?;
    let pages_id = doc
        .get_object(catalog_id)?
        .as_dict()?
        .get(b"Pages")?
        .as_reference()?;

    let pages = doc.get_object_mut(pages_id)?.as_dict_mut()?;
    pages.set("Kids", vec![Object::Reference(page_id)]);
    pages.set("Count", 1);

    let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
    page.set("Parent", pages_id);
    Ok(())
}

fn image_page(image: &DynamicImage) -> Result<Document> {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width as i64,
        "Height" => height as i64,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
    };
    let image_id = doc.add_object(Stream::new(image_dict, rgb.into_raw()));

    // Scale the unit image square to the full page
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    PAGE_WIDTH.into(),
                    0.into(),
                    0.into(),
                    PAGE_HEIGHT.into(),
                    0.into(),
                    0.into(),
                ],
            ),
            Operation::new("Do", vec!["Im0".into()]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode()?));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Im0" => image_id },
        },
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_page_pdf_with_inherited_box() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let kids: Vec<Object> = (0..2)
            .map(|_| {
                doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                })
                .into()
            })
            .collect();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => 2,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Resources" => dictionary! {},
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn multi_page_template_keeps_first_page_only() {
        let template = Template::from_pdf_bytes(&two_page_pdf_with_inherited_box()).unwrap();
        let doc = template.page_copy().unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 1);

        let page_id = *pages.values().next().unwrap();
        let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
        assert!(page.has(b"MediaBox"));
        assert!(page.has(b"Resources"));
    }

    #[test]
    fn garbage_bytes_are_an_invalid_template() {
        let err = Template::from_pdf_bytes(b"not a pdf at all").unwrap_err();
        assert!(matches!(err, Error::InvalidTemplate { .. }), "got: {err}");
    }

    #[test]
    fn missing_file_is_reported_by_path() {
        let err = Template::open("/nonexistent/blank_1750.pdf").unwrap_err();
        assert!(matches!(err, Error::TemplateNotFound { .. }), "got: {err}");
    }

    #[test]
    fn raster_template_becomes_letter_page_with_image() {
        let scan = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            17,
            22,
            image::Rgb([255, 255, 255]),
        ));
        let template = Template::from_image(&scan).unwrap();
        let doc = template.page_copy().unwrap();
        let page_id = *doc.get_pages().values().next().unwrap();
        let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
        let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
        assert!(resources.get(b"XObject").unwrap().as_dict().unwrap().has(b"Im0"));
    }
}
