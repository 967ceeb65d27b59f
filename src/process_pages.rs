use lopdf::content::Content as DecodedContent;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use pdf_writer::{Content, Name, Str};
use tracing::{debug, trace};

use crate::error::{Result, StampError};
use crate::stamp_params::{PageBox, Placement, STAMP_TEXT, StampParams};

const FONT_NAME_PREFIX: &str = "FStamp";

// ========== small helpers ==========
#[inline]
fn dict_get<'a>(dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    dict.get(key).ok()
}

#[inline]
fn obj_as_dict_owned(obj: &Object, doc: &Document) -> Option<Dictionary> {
    match obj {
        Object::Dictionary(d) => Some(d.clone()),
        Object::Reference(idref) => {
            let d = doc.get_object(*idref).ok()?.as_dict().ok()?;
            Some(d.clone())
        }
        _ => None,
    }
}

fn as_f64(n: &Object) -> Option<f64> {
    match n {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

// ========== public entry ==========

/// Register the standard Helvetica font once per document.
///
/// Type1 base-14 fonts need no font program, so nothing beyond the font
/// dictionary is written.
pub fn embed_helvetica(doc: &mut Document) -> ObjectId {
    let mut d = Dictionary::new();
    d.set("Type", "Font");
    d.set("Subtype", "Type1");
    d.set("BaseFont", "Helvetica");
    d.set("Encoding", "WinAnsiEncoding");
    let id = doc.new_object_id();
    doc.objects.insert(id, Object::Dictionary(d));
    id
}

/// Stamp every page in page order, calling `on_page(done, total)` after each.
///
/// Returns the number of pages stamped.
pub fn stamp_all_pages<F>(
    doc: &mut Document,
    font_id: ObjectId,
    params: &StampParams,
    mut on_page: F,
) -> Result<usize>
where
    F: FnMut(usize, usize),
{
    // get_pages() is keyed by 1-based page number, so values() is page order
    let pages: Vec<(u32, ObjectId)> = doc.get_pages().into_iter().collect();
    let total = pages.len();
    for (done, (page_no, pid)) in pages.into_iter().enumerate() {
        let placement = stamp_page(doc, page_no, pid, font_id, params)?;
        trace!(page = page_no, x = placement.x, y = placement.y, "page stamped");
        on_page(done + 1, total);
    }
    Ok(total)
}

/// Draw the stamp on one page.
///
/// Existing content is wrapped in `q ... Q` so whatever graphics state it
/// leaves behind does not leak into the stamp.
pub fn stamp_page(
    doc: &mut Document,
    page_no: u32,
    page_id: ObjectId,
    font_id: ObjectId,
    params: &StampParams,
) -> Result<Placement> {
    let page_box =
        effective_mediabox(doc, page_id).ok_or(StampError::MissingMediaBox { page: page_no })?;
    let placement = params.placement(&page_box);
    if placement.x < page_box.llx {
        debug!(
            page = page_no,
            width = page_box.width(),
            text_width = placement.text_width,
            "page narrower than stamp, text overflows"
        );
    }

    // --- 리소스 사본 + 폰트 등록 ---
    let mut resources = effective_resources(doc, page_id).unwrap_or_else(Dictionary::new);
    let mut fonts = if let Some(o) = resources.get(b"Font").ok() {
        obj_as_dict_owned(o, doc).unwrap_or_else(Dictionary::new)
    } else {
        Dictionary::new()
    };
    let font_name = unused_font_name(&fonts);
    fonts.set(font_name.clone(), Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));

    // --- 기존 컨텐츠 참조 ---
    let mut contents_refs = take_content_refs(doc, page_id)?;
    let wrap_old = !contents_refs.is_empty();

    if wrap_old {
        let mut open = Content::new();
        open.save_state();
        let open_id = doc.add_object(Stream::new(Dictionary::new(), open.finish().to_vec()));
        contents_refs.insert(0, Object::Reference(open_id));
    }

    let mut overlay = Content::new();
    if wrap_old {
        overlay.restore_state();
    }
    overlay.save_state();
    overlay.set_fill_rgb(0.0, 0.0, 0.0);
    overlay.begin_text();
    overlay.set_font(Name(font_name.as_bytes()), params.font_size as f32);
    overlay.next_line(placement.x as f32, placement.y as f32);
    overlay.show(Str(STAMP_TEXT.as_bytes()));
    overlay.end_text();
    overlay.restore_state();
    let overlay_id = doc.add_object(Stream::new(Dictionary::new(), overlay.finish().to_vec()));
    contents_refs.push(Object::Reference(overlay_id));

    // 페이지에 적용(가변 대여 한 번)
    {
        let pd = doc.get_object_mut(page_id)?.as_dict_mut()?;
        pd.set("Resources", Object::Dictionary(resources));
        if contents_refs.len() == 1 {
            pd.set("Contents", contents_refs.remove(0));
        } else {
            pd.set("Contents", Object::Array(contents_refs));
        }
    }

    Ok(placement)
}

/// Count `Tj` operations on the page that show exactly `text`.
pub fn count_text_draws(doc: &Document, page_id: ObjectId, text: &str) -> Result<usize> {
    let mut count = 0;
    for s in page_content_streams(doc, page_id)? {
        let bytes = s.decompressed_content().unwrap_or_else(|_| s.content.clone());
        let content = DecodedContent::decode(&bytes)?;
        count += content
            .operations
            .iter()
            .filter(|op| op.operator == "Tj")
            .filter(|op| {
                matches!(op.operands.first(), Some(Object::String(shown, _)) if shown.as_slice() == text.as_bytes())
            })
            .count();
    }
    Ok(count)
}

/// Effective page box, following `/Parent` when the page inherits it.
pub fn effective_mediabox(doc: &Document, page_id: ObjectId) -> Option<PageBox> {
    // 페이지에서 시작해 Parent 체인을 올라가며 /MediaBox 탐색
    let mut cur = doc.get_object(page_id).ok()?.as_dict().ok()?;
    loop {
        if let Some(b) = dict_get(cur, b"MediaBox").and_then(|o| parse_box(doc, o)) {
            return Some(b);
        }
        match dict_get(cur, b"Parent") {
            Some(Object::Reference(pid)) => {
                cur = doc.get_object(*pid).ok()?.as_dict().ok()?;
            }
            _ => break,
        }
    }
    None
}

/// `[llx lly urx ury]`, where the array and each number may be indirect.
fn parse_box(doc: &Document, obj: &Object) -> Option<PageBox> {
    let Object::Array(a) = resolve(doc, obj)? else {
        return None;
    };
    if a.len() != 4 {
        return None;
    }
    let mut n = [0.0; 4];
    for (slot, o) in n.iter_mut().zip(a) {
        *slot = as_f64(resolve(doc, o)?)?;
    }
    let [llx, lly, urx, ury] = n;
    // normalize boxes written with swapped corners
    Some(PageBox {
        llx: llx.min(urx),
        lly: lly.min(ury),
        urx: llx.max(urx),
        ury: lly.max(ury),
    })
}

/// Follow references until a direct object; gives up on long or cyclic chains.
fn resolve<'a>(doc: &'a Document, mut obj: &'a Object) -> Option<&'a Object> {
    for _ in 0..8 {
        match obj {
            Object::Reference(id) => obj = doc.get_object(*id).ok()?,
            direct => return Some(direct),
        }
    }
    None
}

fn unused_font_name(fonts: &Dictionary) -> String {
    if !fonts.has(FONT_NAME_PREFIX.as_bytes()) {
        return FONT_NAME_PREFIX.to_string();
    }
    (1..)
        .map(|n| format!("{FONT_NAME_PREFIX}{n}"))
        .find(|name| !fonts.has(name.as_bytes()))
        .unwrap_or_else(|| FONT_NAME_PREFIX.to_string())
}

/// Existing `/Contents` as a list of references.
///
/// A stream stored directly in the page dictionary is moved into its own
/// object so it can sit in the array next to the new streams.
fn take_content_refs(doc: &mut Document, page_id: ObjectId) -> Result<Vec<Object>> {
    let contents = {
        let page = doc.get_object(page_id)?.as_dict()?;
        dict_get(page, b"Contents").cloned()
    };
    let refs = match contents {
        Some(Object::Reference(cid)) => match doc.get_object(cid)? {
            // an indirect array of streams
            Object::Array(arr) => arr
                .iter()
                .filter(|o| matches!(o, Object::Reference(_)))
                .cloned()
                .collect(),
            _ => vec![Object::Reference(cid)],
        },
        Some(Object::Array(arr)) => arr
            .into_iter()
            .filter(|o| matches!(o, Object::Reference(_)))
            .collect(),
        Some(Object::Stream(s)) => vec![Object::Reference(doc.add_object(s))],
        _ => Vec::new(),
    };
    Ok(refs)
}

fn page_content_streams(doc: &Document, page_id: ObjectId) -> lopdf::Result<Vec<Stream>> {
    let page = doc.get_object(page_id)?.as_dict()?;
    let mut out = Vec::new();

    if let Some(obj) = page.get(b"Contents").ok() {
        match obj {
            Object::Reference(cid) => match doc.get_object(*cid)? {
                Object::Array(arr) => {
                    for o in arr {
                        if let Object::Reference(id) = o {
                            out.push(doc.get_object(*id)?.as_stream()?.clone());
                        }
                    }
                }
                other => out.push(other.as_stream()?.clone()),
            },
            Object::Array(arr) => {
                for o in arr {
                    if let Object::Reference(id) = o {
                        out.push(doc.get_object(*id)?.as_stream()?.clone());
                    }
                }
            }
            Object::Stream(s) => out.push(s.clone()),
            _ => {}
        }
    }
    Ok(out)
}

fn effective_resources(doc: &Document, page_id: ObjectId) -> Option<Dictionary> {
    // 페이지에 직접 있으면 사용
    let page = doc.get_object(page_id).ok()?.as_dict().ok()?;
    if let Some(obj) = page.get(b"Resources").ok() {
        return obj_as_dict_owned(obj, doc);
    }

    // Parent 사슬 따라 상속 탐색
    let mut cur = page;
    loop {
        match dict_get(cur, b"Parent") {
            Some(Object::Reference(pid)) => {
                let parent = doc.get_object(*pid).ok()?.as_dict().ok()?;
                if let Some(obj) = parent.get(b"Resources").ok() {
                    return obj_as_dict_owned(obj, doc);
                }
                cur = parent;
            }
            _ => break,
        }
    }
    None
}
