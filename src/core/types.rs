//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`SchematicName`] - Validated schematic identifier
//! - [`CollectionName`] - Validated collection identifier
//! - [`UtcTimestamp`] - RFC3339 timestamp
//! - [`Fingerprint`] - Content hash of a virtual tree
//!
//! # Validation
//!
//! Names enforce validity at construction time. A schematic with an invalid
//! name cannot be represented, so misregistration is caught when a
//! collection is assembled rather than on first use.
//!
//! # Examples
//!
//! ```
//! use schematics::core::types::{CollectionName, SchematicName};
//!
//! let name = SchematicName::new("component").unwrap();
//! let collection = CollectionName::new("@acme/schematics").unwrap();
//!
//! assert!(SchematicName::new("has space").is_err());
//! assert_eq!(collection.as_str(), "@acme/schematics");
//! # let _ = name;
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("schematic has invalid name: \"{0}\"")]
    InvalidSchematicName(String),

    #[error("collection has invalid name: \"{0}\"")]
    InvalidCollectionName(String),
}

/// Check a name against the identifier alphabet `[-@/_.A-Za-z0-9]+`.
fn is_valid_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '@' | '/' | '_' | '.'))
}

/// A validated schematic name.
///
/// Schematic names consist of one or more ASCII letters, digits, or one of
/// `-`, `@`, `/`, `_`, `.`. Nothing else is accepted, including whitespace.
///
/// # Example
///
/// ```
/// use schematics::core::types::SchematicName;
///
/// let name = SchematicName::new("my-schem@tic_v2").unwrap();
/// assert_eq!(name.as_str(), "my-schem@tic_v2");
///
/// assert!(SchematicName::new("").is_err());
/// assert!(SchematicName::new("bad name!").is_err());
/// assert!(SchematicName::new("glob*").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SchematicName(String);

impl SchematicName {
    /// Create a new validated schematic name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidSchematicName` carrying the offending name.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if !is_valid_identifier(&name) {
            return Err(TypeError::InvalidSchematicName(name));
        }
        Ok(Self(name))
    }

    /// Get the schematic name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SchematicName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<SchematicName> for String {
    fn from(name: SchematicName) -> Self {
        name.0
    }
}

impl AsRef<str> for SchematicName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SchematicName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated collection name.
///
/// Collections follow the same alphabet as schematics, which admits scoped
/// package-style names such as `@acme/schematics`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CollectionName(String);

impl CollectionName {
    /// Create a new validated collection name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidCollectionName` carrying the offending name.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if !is_valid_identifier(&name) {
            return Err(TypeError::InvalidCollectionName(name));
        }
        Ok(Self(name))
    }

    /// Get the collection name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CollectionName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<CollectionName> for String {
    fn from(name: CollectionName) -> Self {
        name.0
    }
}

impl AsRef<str> for CollectionName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CollectionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A UTC timestamp in RFC3339 format.
///
/// # Example
///
/// ```
/// use schematics::core::types::UtcTimestamp;
///
/// let now = UtcTimestamp::now();
/// println!("Current time: {}", now);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtcTimestamp(chrono::DateTime<chrono::Utc>);

impl UtcTimestamp {
    /// Create a timestamp for the current moment.
    pub fn now() -> Self {
        Self(chrono::Utc::now())
    }

    /// Get the underlying datetime.
    pub fn as_datetime(&self) -> &chrono::DateTime<chrono::Utc> {
        &self.0
    }
}

impl std::fmt::Display for UtcTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

/// A stable hash over the contents of a virtual tree.
///
/// Entries are sorted by path before hashing, so two trees holding the same
/// files produce the same fingerprint regardless of insertion order.
///
/// # Example
///
/// ```
/// use schematics::core::types::Fingerprint;
///
/// let entries = [("/a.txt", b"one".as_slice()), ("/b.txt", b"two".as_slice())];
/// let fp = Fingerprint::compute(entries);
///
/// let reversed = [("/b.txt", b"two".as_slice()), ("/a.txt", b"one".as_slice())];
/// assert_eq!(fp, Fingerprint::compute(reversed));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute a fingerprint from a set of (path, content) pairs.
    pub fn compute<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a [u8])>,
    {
        let mut sorted: Vec<_> = entries.into_iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));

        let mut hasher = Sha256::new();
        for (path, content) in sorted {
            hasher.update(path.as_bytes());
            hasher.update(b"\0");
            hasher.update((content.len() as u64).to_le_bytes());
            hasher.update(content);
            hasher.update(b"\n");
        }

        let result = hasher.finalize();
        Self(hex::encode(result))
    }

    /// Get the fingerprint as a hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
