use lopdf::{Document, Object, dictionary};

use crate::error::{Error, Result};

/// Joins single-page documents into one, in the given order.
///
/// Each input is renumbered into a shared id space; its page tree and
/// catalog are dropped and rebuilt so `Kids` follows the input order.
pub fn assemble(pages: Vec<Document>) -> Result<Document> {
    let mut document = Document::with_version("1.5");
    let mut next_id = 1;
    let mut page_objects = Vec::with_capacity(pages.len());

    for (index, mut page_doc) in pages.into_iter().enumerate() {
        page_doc.renumber_objects_with(next_id);
        next_id = page_doc.max_id + 1;

        let page_id = *page_doc
            .get_pages()
            .values()
            .next()
            .ok_or_else(|| Error::InvalidTemplate {
                detail: format!("composed page {} has no page object", index + 1),
            })?;
        let page = page_doc.get_object(page_id)?.as_dict()?.clone();
        page_objects.push((page_id, page));

        for (id, object) in page_doc.objects {
            match object.type_name().unwrap_or("") {
                "Catalog" | "Pages" | "Page" | "Outlines" | "Outline" => {}
                _ => {
                    document.objects.insert(id, object);
                }
            }
        }
    }

    document.max_id = next_id - 1;
    let pages_id = document.new_object_id();

    let mut kids = Vec::with_capacity(page_objects.len());
    for (id, mut page) in page_objects {
        page.set("Parent", pages_id);
        document.objects.insert(id, Object::Dictionary(page));
        kids.push(Object::Reference(id));
    }

    let count = kids.len() as i64;
    document.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = document.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    document.trailer.set("Root", catalog_id);

    Ok(document)
}

/// Serializes an assembled document.
pub fn to_bytes(mut document: Document) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    document.save_to(&mut out).map_err(|e| Error::Serialize {
        detail: e.to_string(),
    })?;
    Ok(out)
}
