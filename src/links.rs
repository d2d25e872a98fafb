//! Link-annotation extraction from a page's `/Annots` array.
//!
//! Only URI-bearing Link annotations are reported; internal jumps (`GoTo`
//! destinations) and malformed entries are filtered out by content checks,
//! not by error handling.

use log::debug;
use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};

use crate::document::PdfDocument;
use crate::model::Rect;

/// A hyperlink annotation: target URI and the active page rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkAnnotation {
    pub uri: String,
    pub rect: Rect,
}

/// Extract the URI link annotations of a page, in `/Annots` order.
///
/// A page without annotations yields an empty list. Entries that are not
/// Link annotations, carry no URI action, or lack a usable `/Rect` are
/// skipped silently.
pub fn extract_page_links(doc: &PdfDocument, page_id: ObjectId) -> Vec<LinkAnnotation> {
    let raw = doc.raw();
    let page_dict = match raw.get_dictionary(page_id) {
        Ok(dict) => dict,
        Err(_) => return Vec::new(),
    };

    let annots = match page_dict.get(b"Annots").map(|obj| resolve(raw, obj)) {
        Ok(Object::Array(arr)) => arr,
        _ => return Vec::new(),
    };

    let mut links = Vec::new();
    for entry in annots {
        let annot_dict = match resolve(raw, entry).as_dict() {
            Ok(dict) => dict,
            Err(_) => continue,
        };

        match annot_dict.get(b"Subtype") {
            Ok(Object::Name(name)) if name == b"Link" => {}
            _ => continue,
        }

        let rect = match annot_dict.get(b"Rect").map(|obj| resolve(raw, obj)) {
            Ok(Object::Array(arr)) => match rect_from_array(arr) {
                Some(rect) => rect,
                None => continue,
            },
            _ => continue,
        };

        // Internal page jumps and other non-URI actions are skipped.
        if let Some(uri) = resolve_uri(raw, annot_dict) {
            if !uri.is_empty() {
                links.push(LinkAnnotation { uri, rect });
            }
        }
    }

    debug!("page object {:?}: {} uri links", page_id, links.len());
    links
}

/// Follow an indirect reference to its target object.
fn resolve<'a>(doc: &'a LopdfDocument, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        other => other,
    }
}

/// Resolve the `/A` action dictionary to a URI, if the action is a URI one.
fn resolve_uri(doc: &LopdfDocument, annot_dict: &Dictionary) -> Option<String> {
    let action = annot_dict.get(b"A").ok().map(|obj| resolve(doc, obj))?;
    let action_dict = action.as_dict().ok()?;

    match action_dict.get(b"S") {
        Ok(Object::Name(kind)) if kind == b"URI" => {}
        _ => return None,
    }

    let uri = resolve(doc, action_dict.get(b"URI").ok()?);
    match uri {
        Object::String(bytes, _) => Some(String::from_utf8_lossy(bytes).into_owned()),
        _ => None,
    }
}

fn rect_from_array(arr: &[Object]) -> Option<Rect> {
    if arr.len() != 4 {
        return None;
    }
    let mut coords = [0.0f32; 4];
    for (slot, obj) in coords.iter_mut().zip(arr) {
        *slot = match obj {
            Object::Integer(i) => *i as f32,
            Object::Real(r) => *r,
            _ => return None,
        };
    }
    Some(Rect::new(coords[0], coords[1], coords[2], coords[3]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_from_array() {
        let arr = vec![
            Object::Integer(10),
            Object::Real(20.5),
            Object::Integer(110),
            Object::Real(40.5),
        ];
        let rect = rect_from_array(&arr).unwrap();
        assert_eq!(rect, Rect::new(10.0, 20.5, 110.0, 40.5));
    }

    #[test]
    fn test_rect_from_array_rejects_bad_shapes() {
        assert!(rect_from_array(&[Object::Integer(1)]).is_none());
        let arr = vec![
            Object::Integer(1),
            Object::Integer(2),
            Object::Name(b"x".to_vec()),
            Object::Integer(4),
        ];
        assert!(rect_from_array(&arr).is_none());
    }
}
