// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Small accessors over `lopdf` objects that follow indirect references.

use lopdf::{Dictionary, Document, Object, Stream};

/// Follow `obj` through any chain of indirect references. Dangling
/// references resolve to `Object::Null`.
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    const NULL: &Object = &Object::Null;

    let mut current = obj;
    // Reference chains longer than this are treated as cycles.
    for _ in 0..16 {
        match current {
            Object::Reference(id) => match doc.get_object(*id) {
                Ok(next) => current = next,
                Err(_) => return NULL,
            },
            other => return other,
        }
    }
    NULL
}

pub(crate) fn get<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    dict.get(key).ok().map(|obj| resolve(doc, obj))
}

/// Dictionary under `key`; a stream's dictionary also qualifies.
pub(crate) fn get_dict<'a>(
    doc: &'a Document,
    dict: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Dictionary> {
    match get(doc, dict, key)? {
        Object::Dictionary(inner) => Some(inner),
        Object::Stream(stream) => Some(&stream.dict),
        _ => None,
    }
}

pub(crate) fn get_stream<'a>(
    doc: &'a Document,
    dict: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Stream> {
    match get(doc, dict, key)? {
        Object::Stream(stream) => Some(stream),
        _ => None,
    }
}

pub(crate) fn get_array<'a>(
    doc: &'a Document,
    dict: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Vec<Object>> {
    match get(doc, dict, key)? {
        Object::Array(items) => Some(items),
        _ => None,
    }
}

pub(crate) fn get_name<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a [u8]> {
    match get(doc, dict, key)? {
        Object::Name(name) => Some(name.as_slice()),
        _ => None,
    }
}

pub(crate) fn get_number(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<f32> {
    get(doc, dict, key).and_then(number)
}

/// Numeric value of an integer or real object.
pub(crate) fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value as f32),
        _ => None,
    }
}

/// Stream data with its filters removed, or the raw bytes when the stream
/// has no filter lopdf understands.
pub(crate) fn stream_data(stream: &Stream) -> Vec<u8> {
    stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone())
}

/// Names in a stream's `/Filter` entry, in application order.
pub(crate) fn filter_names(doc: &Document, stream: &Stream) -> Vec<Vec<u8>> {
    match get(doc, &stream.dict, b"Filter") {
        Some(Object::Name(name)) => vec![name.clone()],
        Some(Object::Array(items)) => items
            .iter()
            .filter_map(|item| match resolve(doc, item) {
                Object::Name(name) => Some(name.clone()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Look `key` up on `dict` and then on each `/Parent` in turn, for the
/// page attributes PDF lets pages inherit.
pub(crate) fn get_inherited<'a>(
    doc: &'a Document,
    dict: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Object> {
    let mut node = dict;
    // Page trees deeper than this are treated as cyclic.
    for _ in 0..32 {
        if let Some(value) = get(doc, node, key) {
            return Some(value);
        }
        node = get_dict(doc, node, b"Parent")?;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    #[test]
    fn references_are_followed() {
        let mut doc = Document::with_version("1.5");
        let target = doc.add_object(Object::Integer(42));
        let hop = doc.add_object(Object::Reference(target));
        let dict = dictionary! { "Value" => Object::Reference(hop) };
        assert_eq!(get_number(&doc, &dict, b"Value"), Some(42.0));
    }

    #[test]
    fn dangling_reference_is_null() {
        let doc = Document::with_version("1.5");
        let dangling = Object::Reference((99, 0));
        assert!(matches!(resolve(&doc, &dangling), Object::Null));
    }

    #[test]
    fn inherited_attributes_come_from_the_parent() {
        let mut doc = Document::with_version("1.5");
        let parent = doc.add_object(dictionary! {
            "Type" => "Pages",
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        let page = dictionary! { "Type" => "Page", "Parent" => parent };
        let media_box = get_inherited(&doc, &page, b"MediaBox");
        assert!(matches!(media_box, Some(Object::Array(items)) if items.len() == 4));
        assert!(get_inherited(&doc, &page, b"Resources").is_none());
    }
}
