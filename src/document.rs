use lopdf::{Document, Object, ObjectId};

use crate::error::{FlipbookError, FlipbookResult};
use crate::placement::PageSize;

/// US Letter, used when a page carries no resolvable MediaBox.
pub const DEFAULT_PAGE_SIZE: PageSize = PageSize {
    width_pts: 612.0,
    height_pts: 792.0,
};

/// Reject bytes whose media kind is not PDF. Recoverable: the caller clears
/// the input and re-prompts.
pub fn check_pdf_kind(bytes: &[u8]) -> FlipbookResult<()> {
    if bytes.starts_with(b"%PDF-") {
        Ok(())
    } else {
        Err(FlipbookError::input_rejected(
            "expected a PDF document (missing %PDF header)",
        ))
    }
}

/// Reject bytes whose media kind is not GIF.
pub fn check_gif_kind(bytes: &[u8]) -> FlipbookResult<()> {
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Ok(())
    } else {
        Err(FlipbookError::input_rejected(
            "expected a GIF image (missing GIF87a/GIF89a header)",
        ))
    }
}

/// Immutable handle to a decoded paged document. Lives from a successful
/// decode until the session loads a new document or resets.
#[derive(Debug)]
pub struct SourceDocument {
    doc: Document,
    page_ids: Vec<ObjectId>,
}

impl SourceDocument {
    pub fn from_bytes(bytes: &[u8]) -> FlipbookResult<Self> {
        check_pdf_kind(bytes)?;
        let doc = Document::load_mem(bytes)
            .map_err(|e| FlipbookError::decode(format!("load pdf: {e}")))?;
        let page_ids = doc.get_pages().into_values().collect();
        Ok(Self { doc, page_ids })
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Object id of a 0-based page, for composition.
    pub(crate) fn page_id(&self, index: usize) -> FlipbookResult<ObjectId> {
        self.page_ids.get(index).copied().ok_or_else(|| {
            FlipbookError::state(format!(
                "page index {index} out of range (document has {} pages)",
                self.page_ids.len()
            ))
        })
    }

    pub(crate) fn inner(&self) -> &Document {
        &self.doc
    }

    /// Natural (un-scaled) size of a 0-based page from its MediaBox,
    /// falling back to US Letter when none is resolvable.
    pub fn page_size(&self, index: usize) -> FlipbookResult<PageSize> {
        let page_id = self.page_id(index)?;
        let Some(coords) = self.inherited_media_box(page_id) else {
            return Ok(DEFAULT_PAGE_SIZE);
        };
        let nums: Vec<f64> = coords
            .iter()
            .filter_map(|obj| as_number(self.resolve(obj)))
            .collect();
        if nums.len() != 4 {
            return Ok(DEFAULT_PAGE_SIZE);
        }
        Ok(PageSize {
            width_pts: (nums[2] - nums[0]).abs(),
            height_pts: (nums[3] - nums[1]).abs(),
        })
    }

    /// MediaBox is inheritable: a page without one takes its nearest
    /// ancestor's. The walk is depth-capped so a malformed Parent cycle
    /// cannot loop.
    fn inherited_media_box(&self, page_id: ObjectId) -> Option<Vec<Object>> {
        let mut id = page_id;
        for _ in 0..32 {
            let dict = self.doc.get_dictionary(id).ok()?;
            if let Ok(obj) = dict.get(b"MediaBox") {
                return self.resolve(obj).as_array().ok().cloned();
            }
            match dict.get(b"Parent") {
                Ok(Object::Reference(rid)) => id = *rid,
                _ => return None,
            }
        }
        None
    }

    fn resolve<'a>(&'a self, obj: &'a Object) -> &'a Object {
        match obj {
            Object::Reference(id) => self.doc.get_object(*id).unwrap_or(obj),
            other => other,
        }
    }
}

fn as_number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

/// Build an in-memory PDF with the given page sizes. Test support only.
#[cfg(test)]
pub(crate) fn minimal_pdf(page_sizes: &[(f64, f64)]) -> Vec<u8> {
    use lopdf::dictionary;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let kids: Vec<Object> = page_sizes
        .iter()
        .map(|&(w, h)| {
            let content_id = doc.add_object(Object::Stream(lopdf::Stream::new(
                dictionary! {},
                Vec::new(),
            )));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), (w as f32).into(), (h as f32).into()],
                "Contents" => content_id,
            });
            Object::Reference(page_id)
        })
        .collect();

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
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
