//! Path manipulation utilities.

use std::path::{Component, Path, PathBuf};

/// Normalize a path by resolving `.` and `..` without hitting the filesystem.
pub fn normalize(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::Prefix(p) => components.push(Component::Prefix(p)),
            Component::RootDir => {
                components.clear();
                components.push(Component::RootDir);
            }
            Component::CurDir => {}
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                Some(Component::ParentDir) | None => components.push(Component::ParentDir),
                _ => {} // Don't pop prefix or root dir
            },
            Component::Normal(c) => components.push(Component::Normal(c)),
        }
    }

    if components.is_empty() {
        PathBuf::from(".")
    } else {
        components.iter().collect()
    }
}

/// Make a path relative to a base path.
pub fn relative_to(path: impl AsRef<Path>, base: impl AsRef<Path>) -> PathBuf {
    let path = normalize(path);
    let base = normalize(base);

    let mut path_components = path.components().peekable();
    let mut base_components = base.components().peekable();

    while let (Some(p), Some(b)) = (path_components.peek(), base_components.peek()) {
        if p != b {
            break;
        }
        path_components.next();
        base_components.next();
    }

    let mut result = PathBuf::new();
    for component in base_components {
        if component != Component::CurDir {
            result.push("..");
        }
    }
    for component in path_components {
        result.push(component);
    }

    if result.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        result
    }
}

/// Resolve `path` against `base` unless it is already absolute.
pub fn resolve_against(base: impl AsRef<Path>, path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.is_absolute() {
        normalize(path)
    } else {
        normalize(base.as_ref().join(path))
    }
}

/// Convert a path to a forward-slash string.
pub fn to_slash(path: impl AsRef<Path>) -> String {
    path.as_ref()
        .components()
        .filter(|c| *c != Component::CurDir)
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// ES module import specifier for `target` as seen from a file in `from_dir`.
pub fn import_specifier(from_dir: impl AsRef<Path>, target: impl AsRef<Path>) -> String {
    let rel = to_slash(relative_to(target, from_dir));
    if rel.starts_with("../") {
        rel
    } else {
        format!("./{rel}")
    }
}
