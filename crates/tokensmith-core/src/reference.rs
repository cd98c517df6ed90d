//! `{path.to.token}` reference syntax.

use std::ops::Range;

/// A reference found inside a string value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Target path with any trailing `.value`/`.$value` removed.
    pub path: String,
    /// Byte range of the braces in the source string.
    pub span: Range<usize>,
}

/// Find every reference in `text`, left to right.
///
/// A reference is a `{` followed by a non-empty run of characters other
/// than braces and whitespace, then `}`.
pub fn find_references(text: &str) -> Vec<Reference> {
    let bytes = text.as_bytes();
    let mut refs = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'{' {
            i += 1;
            continue;
        }
        let start = i;
        let mut j = i + 1;
        while j < bytes.len() && !matches!(bytes[j], b'{' | b'}') && !bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        if j < bytes.len() && bytes[j] == b'}' && j > start + 1 {
            let path = strip_value_suffix(&text[start + 1..j]);
            if !path.is_empty() {
                refs.push(Reference {
                    path: path.to_string(),
                    span: start..j + 1,
                });
            }
            i = j + 1;
        } else {
            i = j.max(i + 1);
        }
    }
    refs
}

/// The reference if `text` is exactly one reference and nothing else.
pub fn whole_reference(text: &str) -> Option<Reference> {
    let trimmed = text.trim();
    let offset = text.len() - text.trim_start().len();
    let refs = find_references(trimmed);
    match refs.as_slice() {
        [only] if only.span == (0..trimmed.len()) => Some(Reference {
            path: only.path.clone(),
            span: only.span.start + offset..only.span.end + offset,
        }),
        _ => None,
    }
}

fn strip_value_suffix(path: &str) -> &str {
    path.strip_suffix(".$value")
        .or_else(|| path.strip_suffix(".value"))
        .unwrap_or(path)
}
