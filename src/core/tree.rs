//! core::tree
//!
//! In-memory virtual file tree with a staged action log.
//!
//! # Design
//!
//! A [`Tree`] is a value: rules receive it by move, stage changes on their
//! own copy, and hand back the result. Nothing is written to real storage;
//! the recorded [`TreeAction`]s describe what a committing layer would do.
//!
//! Every tree carries a [`TreeId`]. Clones share the id (they are the same
//! snapshot), while [`Tree::branch`] produces an independent copy with a fresh
//! id.
//!
//! # Example
//!
//! ```
//! use schematics::core::tree::Tree;
//!
//! let mut tree = Tree::new();
//! tree.create("src/lib.rs", "pub fn hello() {}").unwrap();
//! tree.overwrite("/src/lib.rs", "pub fn hello() -> u8 { 1 }").unwrap();
//!
//! assert!(tree.exists("src/lib.rs"));
//! assert_eq!(tree.actions().len(), 2);
//! assert!(tree.create("src/lib.rs", "").is_err());
//! ```

use std::collections::BTreeMap;

use thiserror::Error;
use uuid::Uuid;

use super::types::Fingerprint;

/// Errors from tree operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("path already exists: {0}")]
    AlreadyExists(TreePath),

    #[error("path does not exist: {0}")]
    NotFound(TreePath),
}

/// Identity of a tree snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TreeId(Uuid);

impl TreeId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for TreeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A normalized, absolute path inside a tree.
///
/// Paths are `/`-separated. Empty and `.` segments are dropped; `..`
/// segments, NUL bytes and backslashes are rejected, as is the root itself.
///
/// # Example
///
/// ```
/// use schematics::core::tree::TreePath;
///
/// let path = TreePath::new("src//./app.ts").unwrap();
/// assert_eq!(path.as_str(), "/src/app.ts");
/// assert!(TreePath::new("../escape").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TreePath(String);

impl TreePath {
    /// Parse and normalize a path.
    pub fn new(path: impl AsRef<str>) -> Result<Self, TreeError> {
        let raw = path.as_ref();
        let invalid = |reason: &str| TreeError::InvalidPath {
            path: raw.to_string(),
            reason: reason.to_string(),
        };

        if raw.contains('\0') {
            return Err(invalid("contains NUL"));
        }
        if raw.contains('\\') {
            return Err(invalid("contains '\\'"));
        }

        let mut segments = Vec::new();
        for segment in raw.split('/') {
            match segment {
                "" | "." => continue,
                ".." => return Err(invalid("contains '..'")),
                s => segments.push(s),
            }
        }

        if segments.is_empty() {
            return Err(invalid("names no file"));
        }

        Ok(Self(format!("/{}", segments.join("/"))))
    }

    /// Get the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TreePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A staged change recorded by a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeAction {
    Create { path: TreePath, content: Vec<u8> },
    Overwrite { path: TreePath, content: Vec<u8> },
    Delete { path: TreePath },
    Rename { from: TreePath, to: TreePath },
}

impl TreeAction {
    /// The path this action targets (the destination for renames).
    pub fn path(&self) -> &TreePath {
        match self {
            TreeAction::Create { path, .. }
            | TreeAction::Overwrite { path, .. }
            | TreeAction::Delete { path } => path,
            TreeAction::Rename { to, .. } => to,
        }
    }
}

/// A hierarchical file namespace snapshot with staged mutations.
#[derive(Debug, Clone)]
pub struct Tree {
    id: TreeId,
    files: BTreeMap<TreePath, Vec<u8>>,
    actions: Vec<TreeAction>,
}

impl Tree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            id: TreeId::new(),
            files: BTreeMap::new(),
            actions: Vec::new(),
        }
    }

    /// Create a tree pre-populated with files.
    ///
    /// Seed files are the baseline of the tree and are not recorded as
    /// staged actions.
    pub fn from_files<I, P, C>(files: I) -> Result<Self, TreeError>
    where
        I: IntoIterator<Item = (P, C)>,
        P: AsRef<str>,
        C: Into<Vec<u8>>,
    {
        let mut tree = Self::new();
        for (path, content) in files {
            let path = TreePath::new(path)?;
            if tree.files.contains_key(&path) {
                return Err(TreeError::AlreadyExists(path));
            }
            tree.files.insert(path, content.into());
        }
        Ok(tree)
    }

    /// Identity of this snapshot.
    pub fn id(&self) -> TreeId {
        self.id
    }

    /// Create an independent copy with a fresh identity.
    pub fn branch(&self) -> Self {
        Self {
            id: TreeId::new(),
            files: self.files.clone(),
            actions: self.actions.clone(),
        }
    }

    /// Read a file's content. Invalid or missing paths read as `None`.
    pub fn read(&self, path: impl AsRef<str>) -> Option<&[u8]> {
        let path = TreePath::new(path).ok()?;
        self.files.get(&path).map(Vec::as_slice)
    }

    /// Read a file as UTF-8 text.
    pub fn read_to_string(&self, path: impl AsRef<str>) -> Option<String> {
        self.read(path)
            .and_then(|bytes| String::from_utf8(bytes.to_vec()).ok())
    }

    /// Check whether a file exists.
    pub fn exists(&self, path: impl AsRef<str>) -> bool {
        self.read(path).is_some()
    }

    /// Stage creation of a new file.
    pub fn create(
        &mut self,
        path: impl AsRef<str>,
        content: impl Into<Vec<u8>>,
    ) -> Result<(), TreeError> {
        let path = TreePath::new(path)?;
        if self.files.contains_key(&path) {
            return Err(TreeError::AlreadyExists(path));
        }
        let content = content.into();
        self.files.insert(path.clone(), content.clone());
        self.actions.push(TreeAction::Create { path, content });
        Ok(())
    }

    /// Stage replacement of an existing file's content.
    pub fn overwrite(
        &mut self,
        path: impl AsRef<str>,
        content: impl Into<Vec<u8>>,
    ) -> Result<(), TreeError> {
        let path = TreePath::new(path)?;
        let content = content.into();
        match self.files.get_mut(&path) {
            Some(existing) => *existing = content.clone(),
            None => return Err(TreeError::NotFound(path)),
        }
        self.actions.push(TreeAction::Overwrite { path, content });
        Ok(())
    }

    /// Stage deletion of a file.
    pub fn delete(&mut self, path: impl AsRef<str>) -> Result<(), TreeError> {
        let path = TreePath::new(path)?;
        if self.files.remove(&path).is_none() {
            return Err(TreeError::NotFound(path));
        }
        self.actions.push(TreeAction::Delete { path });
        Ok(())
    }

    /// Stage a move of a file to a new, unused path.
    pub fn rename(&mut self, from: impl AsRef<str>, to: impl AsRef<str>) -> Result<(), TreeError> {
        let from = TreePath::new(from)?;
        let to = TreePath::new(to)?;
        if self.files.contains_key(&to) {
            return Err(TreeError::AlreadyExists(to));
        }
        let content = self
            .files
            .remove(&from)
            .ok_or_else(|| TreeError::NotFound(from.clone()))?;
        self.files.insert(to.clone(), content);
        self.actions.push(TreeAction::Rename { from, to });
        Ok(())
    }

    /// All file paths, sorted.
    pub fn files(&self) -> impl Iterator<Item = &TreePath> {
        self.files.keys()
    }

    /// Number of files in the tree.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the tree holds no files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Staged actions, in the order they were applied.
    pub fn actions(&self) -> &[TreeAction] {
        &self.actions
    }

    /// Content hash of the current files.
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::compute(
            self.files
                .iter()
                .map(|(path, content)| (path.as_str(), content.as_slice())),
        )
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}
