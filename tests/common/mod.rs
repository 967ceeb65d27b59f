#![allow(dead_code)]

use lopdf::{Document, ObjectId};
use origin_stamp::process_pages::{count_text_draws, effective_mediabox};
use origin_stamp::{InputFile, PDF_MIME, STAMP_TEXT};
use pdf_writer::{Content, Finish, Pdf, Rect, Ref};

pub const LETTER: (f32, f32) = (612.0, 792.0);

/// In-memory PDF with one filled square per page, one page per entry of `sizes`.
pub fn sample_pdf(sizes: &[(f32, f32)]) -> Vec<u8> {
    let mut alloc = Ref::new(1);
    let catalog_id = alloc.bump();
    let page_tree_id = alloc.bump();
    let page_ids: Vec<Ref> = sizes.iter().map(|_| alloc.bump()).collect();

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(page_tree_id);
    pdf.pages(page_tree_id)
        .kids(page_ids.iter().copied())
        .count(page_ids.len() as i32);

    for (&(w, h), &page_id) in sizes.iter().zip(&page_ids) {
        let content_id = alloc.bump();
        let mut page = pdf.page(page_id);
        page.media_box(Rect::new(0.0, 0.0, w, h));
        page.parent(page_tree_id);
        page.contents(content_id);
        page.finish();

        let mut content = Content::new();
        content
            .set_fill_rgb(0.2, 0.2, 0.2)
            .rect(20.0, 20.0, 40.0, 40.0)
            .fill_nonzero();
        pdf.stream(content_id, &content.finish());
    }
    pdf.finish()
}

pub fn pdf_file(name: &str, pages: usize) -> InputFile {
    InputFile::from_bytes(name, PDF_MIME, sample_pdf(&vec![LETTER; pages]))
}

pub fn pages_in_order(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().values().copied().collect()
}

/// Stamp occurrences per page, in page order.
pub fn stamps_per_page(bytes: &[u8]) -> Vec<usize> {
    let doc = Document::load_mem(bytes).expect("output must decode");
    pages_in_order(&doc)
        .into_iter()
        .map(|pid| count_text_draws(&doc, pid, STAMP_TEXT).expect("content must decode"))
        .collect()
}

pub fn page_widths(bytes: &[u8]) -> Vec<f64> {
    let doc = Document::load_mem(bytes).expect("output must decode");
    pages_in_order(&doc)
        .into_iter()
        .map(|pid| effective_mediabox(&doc, pid).expect("mediabox").width())
        .collect()
}
