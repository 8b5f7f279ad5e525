use std::fs;
use std::path::{Component, Path, PathBuf};

/// An absolute path proven, at validation time, to be lexically contained
/// within the data root. The value lives for one request only; callers
/// revalidate on every use because the filesystem can change between check
/// and use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedPath(PathBuf);

impl AuthorizedPath {
    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

/// Resolves `path` and `root` to canonical absolute forms and returns the
/// resolved path when it equals the root or sits strictly below it. The
/// comparison is component-wise, so a sibling sharing a string prefix
/// (`/data-evil` against root `/data`) never matches.
pub fn authorize_path(path: &Path, root: &Path) -> Option<AuthorizedPath> {
    let resolved_root = resolve(root)?;
    let resolved = resolve(path)?;
    if resolved.starts_with(&resolved_root) {
        Some(AuthorizedPath(resolved))
    } else {
        None
    }
}

pub fn is_authorized(path: &Path, root: &Path) -> bool {
    authorize_path(path, root).is_some()
}

/// Canonical absolute form of `path`: symlink-resolving when the path
/// exists, lexical normalization otherwise. Unresolvable input yields
/// `None`, which the caller treats as outside every root.
fn resolve(path: &Path) -> Option<PathBuf> {
    match fs::canonicalize(path) {
        Ok(canonical) => Some(canonical),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            let absolute = if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir().ok()?.join(path)
            };
            normalize_lexically(&absolute)
        }
        Err(_) => None,
    }
}

fn normalize_lexically(path: &Path) -> Option<PathBuf> {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::RootDir => normalized.push(component.as_os_str()),
            Component::Prefix(prefix) => normalized.push(prefix.as_os_str()),
            Component::Normal(segment) => normalized.push(segment),
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    return None;
                }
            }
        }
    }
    Some(normalized)
}
