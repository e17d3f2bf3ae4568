//! Type definitions for concern paths.

/// A step in a concern path.
///
/// Object keys and array indices are both carried as strings; array steps are
/// parsed on the fly during navigation.
pub type PathStep = String;

/// A concern path, already split into steps.
pub type Path = Vec<PathStep>;

/// The outcome of resolving a concern path against a document.
///
/// Resolution walks the document step by step and remembers the deepest
/// `(parent path, key)` pair it visited, called the *anchor*. The anchor is
/// kept even when the walk stopped early at a missing step, so a replacement
/// value produced later can still be written back into the document.
///
/// When the anchor is `None` the path resolved to the document root itself
/// (empty concern, or a root the walk refused to enter).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// Path of the container holding the target slot, plus the key of the
    /// slot inside it. `None` when the target is the root.
    pub anchor: Option<(Path, PathStep)>,
}

impl Resolved {
    /// Path of the target slot itself: anchor path extended with the anchor
    /// key, or the empty (root) path when there is no anchor.
    pub fn target_path(&self) -> Path {
        match &self.anchor {
            Some((parent, key)) => {
                let mut path = parent.clone();
                path.push(key.clone());
                path
            }
            None => Vec::new(),
        }
    }

    /// Whether the target is the document root.
    pub fn is_root(&self) -> bool {
        self.anchor.is_none()
    }
}
