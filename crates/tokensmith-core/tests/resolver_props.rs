//! Property tests for reference resolution.

use proptest::prelude::*;
use serde_json::{json, Map, Value};
use tokensmith_core::{resolve_forest, resolve_theme, TokenForest, TokenNode, TokenSource};

/// How a generated token spells its value.
#[derive(Debug, Clone, Copy)]
enum Shape {
    Literal,
    Whole,
    Qualified,
    ColorFn,
    List,
}

fn shape() -> impl Strategy<Value = Shape> {
    prop_oneof![
        Just(Shape::Literal),
        Just(Shape::Whole),
        Just(Shape::Qualified),
        Just(Shape::ColorFn),
        Just(Shape::List),
    ]
}

/// Token `tN` lives in file `gK.json` with `K = N % files`.
fn file_of(i: usize, files: usize) -> usize {
    i % files
}

/// Value for token `i`. References only point at `tM` with `M < i`, so the
/// set stays acyclic.
fn value_for(i: usize, shape: Shape, target: usize, literal: &str, files: usize) -> Value {
    if i == 0 {
        return Value::String(literal.to_string());
    }
    let m = target % i;
    match shape {
        Shape::Literal => Value::String(literal.to_string()),
        Shape::Whole => Value::String(format!("{{t{m}}}")),
        Shape::Qualified => Value::String(format!("{{g{}.t{m}}}", file_of(m, files))),
        Shape::ColorFn => Value::String(format!("rgba({{t{m}}}, 0.5)")),
        Shape::List => json!([format!("{{t{m}}}"), literal]),
    }
}

/// An acyclic token set spread over one to three files.
fn acyclic_forest() -> impl Strategy<Value = Vec<(String, Value)>> {
    (
        1usize..4,
        prop::collection::vec((shape(), 0usize..100, "#[0-9a-f]{6}|[a-z]{1,6}"), 1..24),
    )
        .prop_map(|(files, specs)| {
            let mut maps = vec![Map::new(); files];
            for (i, (shape, target, literal)) in specs.into_iter().enumerate() {
                maps[file_of(i, files)].insert(format!("t{i}"), value_for(i, shape, target, &literal, files));
            }
            maps.into_iter()
                .enumerate()
                .filter(|(_, map)| !map.is_empty())
                .map(|(k, map)| (format!("g{k}.json"), Value::Object(map)))
                .collect()
        })
}

/// A forest plus theme overrides of some of its tokens, each either a
/// literal or a reference to a lower-numbered token.
fn forest_with_theme() -> impl Strategy<Value = (Vec<(String, Value)>, Value)> {
    acyclic_forest().prop_flat_map(|files| {
        let count: usize = files
            .iter()
            .map(|(_, v)| v.as_object().map_or(0, Map::len))
            .sum();
        let overrides = prop::collection::vec((any::<bool>(), 0usize..100), count);
        (Just(files), overrides).prop_map(|(files, picks)| {
            let mut theme = Map::new();
            for (i, (is_ref, target)) in picks.into_iter().enumerate() {
                if i % 2 == 1 {
                    continue;
                }
                let value = if is_ref && i > 0 {
                    format!("{{t{}}}", target % i)
                } else {
                    "#000000".to_string()
                };
                theme.insert(format!("t{i}"), Value::String(value));
            }
            theme.insert("extra".to_string(), Value::String("{g0.t0}".to_string()));
            (files, Value::Object(theme))
        })
    })
}

fn forest_of(files: &[(String, Value)]) -> TokenForest {
    TokenForest::new(
        files
            .iter()
            .map(|(rel, value)| TokenSource::new("/tokens", rel, TokenNode::from_json(value).unwrap()))
            .collect(),
    )
}

proptest! {
    #[test]
    fn test_resolution_is_idempotent(files in acyclic_forest()) {
        let once = resolve_forest(&forest_of(&files)).unwrap();
        let twice = resolve_forest(&once).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn test_resolved_values_have_no_references(files in acyclic_forest()) {
        let resolved = resolve_forest(&forest_of(&files)).unwrap();
        for source in &resolved.sources {
            for (path, token) in source.tree.leaves() {
                prop_assert!(!token.value.has_reference(), "{} kept a reference", path.join("."));
            }
        }
    }

    #[test]
    fn test_input_forest_untouched(files in acyclic_forest()) {
        let forest = forest_of(&files);
        let copy = forest.clone();
        let _ = resolve_forest(&forest).unwrap();
        prop_assert_eq!(forest, copy);
    }

    #[test]
    fn test_themes_resolve_completely((files, theme) in forest_with_theme()) {
        let forest = forest_of(&files);
        let overrides = TokenNode::from_json(&theme).unwrap();
        let themed = resolve_theme(&forest, &overrides).unwrap();

        prop_assert_eq!(themed.leaf_count(), forest.token_count() + 1);
        for (path, token) in themed.leaves() {
            prop_assert!(!token.value.has_reference(), "{} kept a reference", path.join("."));
        }
    }
}
