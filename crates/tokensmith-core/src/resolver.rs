//! Reference resolution across a whole forest.
//!
//! Every leaf is addressable by its content path (path inside its file) and
//! by its group-qualified path (`<group>.<content path>`). Resolution is a
//! depth-first walk with per-leaf memoization; a leaf revisited while still
//! on the stack is a cycle.

use crate::error::{TokenError, TokenResult};
use crate::forest::{TokenForest, TokenSource};
use crate::reference::{find_references, whole_reference};
use crate::token::{Token, TokenNode, TokenValue};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone)]
enum State {
    Pending,
    InProgress,
    Done(Token),
}

struct Leaf {
    path: String,
    token: Token,
}

/// Resolves `{path}` references over a fixed set of trees.
pub struct Resolver {
    leaves: Vec<Leaf>,
    content_index: HashMap<String, usize>,
    qualified_index: HashMap<String, usize>,
    state: Vec<State>,
    stack: Vec<usize>,
}

impl Resolver {
    /// Index every leaf of `trees`, each paired with its group path.
    pub fn new<'a, I>(trees: I) -> Self
    where
        I: IntoIterator<Item = (&'a [String], &'a TokenNode)>,
    {
        let mut leaves = Vec::new();
        let mut content_index = HashMap::new();
        let mut qualified_index = HashMap::new();

        for (group, tree) in trees {
            for (path, token) in tree.leaves() {
                let id = leaves.len();
                let content = path.join(".");
                if let Some(previous) = content_index.insert(content.clone(), id) {
                    debug!(path = %content, previous, id, "token path defined more than once, later source wins");
                }
                if !group.is_empty() {
                    let qualified = format!("{}.{}", group.join("."), content);
                    qualified_index.insert(qualified, id);
                }
                leaves.push(Leaf {
                    path: content,
                    token: token.clone(),
                });
            }
        }

        let state = vec![State::Pending; leaves.len()];
        Self {
            leaves,
            content_index,
            qualified_index,
            state,
            stack: Vec::new(),
        }
    }

    fn lookup(&self, path: &str) -> Option<usize> {
        self.content_index
            .get(path)
            .or_else(|| self.qualified_index.get(path))
            .copied()
    }

    /// Resolve every leaf, in index order.
    pub fn resolve_all(&mut self) -> TokenResult<Vec<Token>> {
        (0..self.leaves.len()).map(|id| self.resolve(id)).collect()
    }

    fn resolve(&mut self, id: usize) -> TokenResult<Token> {
        match &self.state[id] {
            State::Done(token) => return Ok(token.clone()),
            State::InProgress => {
                let start = self.stack.iter().position(|&s| s == id).unwrap_or(0);
                let mut chain: Vec<String> = self.stack[start..]
                    .iter()
                    .map(|&s| self.leaves[s].path.clone())
                    .collect();
                chain.push(self.leaves[id].path.clone());
                return Err(TokenError::CyclicReference { chain });
            }
            State::Pending => {}
        }

        self.state[id] = State::InProgress;
        self.stack.push(id);

        let mut token = self.leaves[id].token.clone();
        let referrer = self.leaves[id].path.clone();
        let result = self.resolve_value(&token.value, &referrer);

        self.stack.pop();
        let (value, inherited) = match result {
            Ok(resolved) => resolved,
            Err(e) => {
                self.state[id] = State::Pending;
                return Err(e);
            }
        };

        if let Some(target) = inherited {
            if token.unit.is_none() {
                token.unit = target.unit;
            }
            if token.token_type.is_none() {
                token.token_type = target.token_type;
            }
        }
        token.value = value;
        self.state[id] = State::Done(token.clone());
        Ok(token)
    }

    /// Resolve one value. A whole-value reference also returns the target
    /// token so the caller can inherit its unit and type.
    fn resolve_value(
        &mut self,
        value: &TokenValue,
        referrer: &str,
    ) -> TokenResult<(TokenValue, Option<Token>)> {
        match value {
            // Color functions such as `rgba({black}, 0.5)` carry references too
            TokenValue::String(text) | TokenValue::Color(text) => {
                if let Some(reference) = whole_reference(text) {
                    let target = self.resolve_path(&reference.path, referrer)?;
                    return Ok((target.value.clone(), Some(target)));
                }

                let refs = find_references(text);
                if refs.is_empty() {
                    return Ok((value.clone(), None));
                }

                let mut out = String::with_capacity(text.len());
                let mut last = 0;
                for reference in refs {
                    let target = self.resolve_path(&reference.path, referrer)?;
                    out.push_str(&text[last..reference.span.start]);
                    out.push_str(&rendered(&target));
                    last = reference.span.end;
                }
                out.push_str(&text[last..]);
                Ok((TokenValue::from_text(out), None))
            }
            TokenValue::List(items) => {
                let mut resolved = Vec::with_capacity(items.len());
                for item in items {
                    resolved.push(self.resolve_value(item, referrer)?.0);
                }
                Ok((TokenValue::List(resolved), None))
            }
            other => Ok((other.clone(), None)),
        }
    }

    fn resolve_path(&mut self, path: &str, referrer: &str) -> TokenResult<Token> {
        let id = self
            .lookup(path)
            .ok_or_else(|| TokenError::UnresolvedReference {
                path: path.to_string(),
                referrer: referrer.to_string(),
            })?;
        self.resolve(id)
    }
}

/// Text a token contributes when interpolated into a longer string.
fn rendered(token: &Token) -> String {
    match (&token.value, &token.unit) {
        (TokenValue::Number(n), Some(unit)) => format!("{n}{unit}"),
        (value, _) => value.to_string(),
    }
}

/// Rebuild `tree` with the resolved leaves consumed in document order.
fn rebuild(tree: &TokenNode, resolved: &mut std::vec::IntoIter<Token>) -> TokenResult<TokenNode> {
    tree.try_map_leaves(&mut |path, _| {
        resolved.next().ok_or_else(|| TokenError::InvalidToken {
            file: Default::default(),
            path: path.join("."),
            message: "leaf missing from resolution index".to_string(),
        })
    })
}

/// Resolve every reference in `forest`, returning a new forest.
pub fn resolve_forest(forest: &TokenForest) -> TokenResult<TokenForest> {
    let mut resolver = Resolver::new(
        forest
            .sources
            .iter()
            .map(|s| (s.group.as_slice(), &s.tree)),
    );
    let mut resolved = resolver.resolve_all()?.into_iter();

    let sources = forest
        .sources
        .iter()
        .map(|source| {
            Ok(TokenSource {
                tree: rebuild(&source.tree, &mut resolved)?,
                ..source.clone()
            })
        })
        .collect::<TokenResult<Vec<_>>>()?;
    Ok(TokenForest::new(sources))
}

/// Resolve a theme: leaves in `overrides` replace the matching leaves of
/// every source, so both content and group-qualified references see the
/// themed values. Returns the merged, resolved tree.
pub fn resolve_theme(forest: &TokenForest, overrides: &TokenNode) -> TokenResult<TokenNode> {
    let themed = forest
        .sources
        .iter()
        .map(|source| {
            let tree = source.tree.try_map_leaves(&mut |path, token| -> TokenResult<Token> {
                Ok(match overrides.get(path) {
                    Some(TokenNode::Leaf(over)) => over.clone(),
                    _ => token.clone(),
                })
            })?;
            Ok(TokenSource {
                tree,
                ..source.clone()
            })
        })
        .collect::<TokenResult<Vec<_>>>()?;

    // Overrides go last so new theme-only tokens are addressable too
    let mut resolver = Resolver::new(
        themed
            .iter()
            .map(|s| (s.group.as_slice(), &s.tree))
            .chain(std::iter::once((&[][..], overrides))),
    );
    let mut resolved = resolver.resolve_all()?.into_iter();

    let mut merged = TokenNode::default();
    for source in &themed {
        merged.merge_from(&rebuild(&source.tree, &mut resolved)?);
    }
    merged.merge_from(&rebuild(overrides, &mut resolved)?);
    Ok(merged)
}
