//! Key case transforms.

use tokensmith_common_config::NameCase;

/// Split a key into lowercase words on separators and case boundaries.
fn words(key: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev: Option<char> = None;

    for c in key.chars() {
        if matches!(c, '-' | '_' | ' ' | '.' | '/') {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev = None;
            continue;
        }
        let boundary = match prev {
            Some(p) => c.is_uppercase() && (p.is_lowercase() || p.is_ascii_digit()),
            None => false,
        };
        if boundary && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.extend(c.to_lowercase());
        prev = Some(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

pub fn to_kebab(key: &str) -> String {
    words(key).join("-")
}

pub fn to_snake(key: &str) -> String {
    words(key).join("_")
}

pub fn to_camel(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for (i, word) in words(key).iter().enumerate() {
        if i == 0 {
            out.push_str(word);
            continue;
        }
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

/// Apply a configured case to one key.
pub fn apply_case(key: &str, case: NameCase) -> String {
    match case {
        NameCase::Keep => key.to_string(),
        NameCase::Kebab => to_kebab(key),
        NameCase::Camel => to_camel(key),
        NameCase::Snake => to_snake(key),
    }
}

/// A JavaScript identifier for a group path, e.g. `color.brand` -> `colorBrand`.
pub fn identifier(segments: &[String]) -> String {
    let ident = to_camel(&segments.join("-"));
    let ident: String = ident
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '$')
        .collect();
    match ident.chars().next() {
        None => "tokens".to_string(),
        Some(c) if c.is_ascii_digit() => format!("_{ident}"),
        Some(_) => ident,
    }
}
