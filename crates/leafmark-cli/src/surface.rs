//! Headless render surface
//!
//! The CLI has nothing to draw on, so "loading" a document means parsing it
//! with lopdf and walking its page tree. Results are reported through the
//! same callback slots a graphical surface would use.

use std::fs;

use lopdf::Document;
use tracing::debug;

use leafmark_core::access::resolve_path;
use leafmark_core::{RenderCallbacks, RenderSurface};

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Render surface that parses documents without drawing them
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    callbacks: Option<RenderCallbacks>,
    page_count: u32,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pages in the document behind `reference`
    fn page_count(reference: &str) -> Result<u32, String> {
        let path = resolve_path(reference)
            .ok_or_else(|| format!("cannot read '{}' from the command line", reference))?;
        let bytes = fs::read(&path).map_err(|e| e.to_string())?;

        if !bytes.starts_with(PDF_MAGIC) {
            return Err("not a PDF file".to_string());
        }
        let doc = Document::load_mem(&bytes).map_err(|e| e.to_string())?;
        match doc.get_pages().len() {
            0 => Err("no pages found".to_string()),
            n => Ok(n as u32),
        }
    }
}

impl RenderSurface for HeadlessSurface {
    fn load(&mut self, reference: &str, start_page: u32, mut callbacks: RenderCallbacks) {
        self.recycle();

        match Self::page_count(reference) {
            Ok(page_count) => {
                debug!("Parsed {}: {} pages", reference, page_count);
                self.page_count = page_count;
                (callbacks.on_load)(page_count);
                if start_page > 0 {
                    (callbacks.on_page_change)(start_page.min(page_count - 1), page_count);
                }
                self.callbacks = Some(callbacks);
            }
            Err(message) => (callbacks.on_error)(message),
        }
    }

    fn jump_to(&mut self, page: u32) {
        if let Some(callbacks) = self.callbacks.as_mut() {
            (callbacks.on_page_change)(page, self.page_count);
        }
    }

    fn recycle(&mut self) {
        self.callbacks = None;
        self.page_count = 0;
    }
}

/// Document with `pages` blank A4 pages
#[cfg(test)]
pub(crate) fn fake_pdf(pages: usize) -> Vec<u8> {
    use lopdf::{dictionary, Object};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let kids: Vec<Object> = (0..pages)
        .map(|_| {
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            })
            .into()
        })
        .collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}
