//! File-system binding: the base directory relative paths resolve against.

use std::path::{Component, Path, PathBuf};

/// Base directory for resolving relative paths within a (nested) chain.
///
/// Rebinding produces a new value; the binding seen by an enclosing chain
/// never changes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileSystemBinding {
    root: PathBuf,
}

impl FileSystemBinding {
    /// Bind to `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Bind to the process working directory (falls back to `.`).
    pub fn current_dir() -> Self {
        Self::new(std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }

    /// The base directory.
    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `relative` against the root.
    ///
    /// Resolution is lexical: `..`, `.`, root and drive prefixes are dropped,
    /// so the result always lies under the root.
    pub fn file(&self, relative: impl AsRef<Path>) -> PathBuf {
        let mut resolved = self.root.clone();
        for component in relative.as_ref().components() {
            if let Component::Normal(part) = component {
                resolved.push(part);
            }
        }
        resolved
    }

    /// Resolve a percent-encoded request path (e.g. a path remainder).
    pub fn file_for_uri_path(&self, uri_path: &str) -> PathBuf {
        let decoded = percent_encoding::percent_decode_str(uri_path).decode_utf8_lossy();
        self.file(decoded.as_ref())
    }

    /// A nested binding rooted at `relative` under this one.
    pub fn binding(&self, relative: impl AsRef<Path>) -> Self {
        Self::new(self.file(relative))
    }
}

impl Default for FileSystemBinding {
    fn default() -> Self {
        Self::current_dir()
    }
}
