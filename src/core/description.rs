//! core::description
//!
//! Descriptive metadata for collections and schematics.
//!
//! # Design
//!
//! A [`SchematicDescription`] is the identity record a collection registers.
//! Its `name` is kept as raw text here, exactly as it was declared; it is
//! validated when a [`Schematic`](crate::schematic::Schematic) is constructed
//! from it, so a bad declaration fails at registration time.
//!
//! An optional [`OptionsSchema`] describes the options the schematic's rule
//! factory expects. The engine uses it to fill defaults and coerce values.
//!
//! # Example
//!
//! ```
//! use schematics::core::description::{CollectionDescription, OptionsSchema, SchematicDescription};
//!
//! let collection = CollectionDescription::new("@acme/schematics").unwrap();
//! let schema: OptionsSchema = serde_json::from_value(serde_json::json!({
//!     "properties": {
//!         "name": { "type": "string" },
//!         "flat": { "type": "boolean", "default": false }
//!     },
//!     "required": ["name"]
//! })).unwrap();
//!
//! let description = SchematicDescription::new("component", collection)
//!     .with_description("Generate a component")
//!     .with_schema(schema);
//!
//! assert_eq!(description.name, "component");
//! assert_eq!(description.collection.name.as_str(), "@acme/schematics");
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::types::{CollectionName, TypeError};

/// Identity of a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionDescription {
    /// Validated collection name.
    pub name: CollectionName,
    /// Human-readable summary.
    pub description: Option<String>,
}

impl CollectionDescription {
    /// Create a collection description.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidCollectionName` if the name is not a valid identifier.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        Ok(Self {
            name: CollectionName::new(name)?,
            description: None,
        })
    }

    /// Attach a human-readable summary.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Identity record of a schematic.
#[derive(Debug, Clone, PartialEq)]
pub struct SchematicDescription {
    /// Declared name (validated at schematic construction).
    pub name: String,
    /// Owning collection.
    pub collection: CollectionDescription,
    /// Human-readable summary, for listings and help text.
    pub description: Option<String>,
    /// Shape of the options the rule factory expects.
    pub schema: Option<OptionsSchema>,
}

impl SchematicDescription {
    /// Create a description with no summary and no schema.
    pub fn new(name: impl Into<String>, collection: CollectionDescription) -> Self {
        Self {
            name: name.into(),
            collection,
            description: None,
            schema: None,
        }
    }

    /// Attach a human-readable summary.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attach an options schema.
    pub fn with_schema(mut self, schema: OptionsSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// The `collection:schematic` key used by configuration defaults.
    pub fn qualified_name(&self) -> String {
        format!("{}:{}", self.collection.name, self.name)
    }
}

/// Declared options of a schematic.
///
/// A small, JSON-schema-shaped subset: typed properties with optional
/// defaults, and a list of required property names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptionsSchema {
    /// Known properties by name.
    pub properties: BTreeMap<String, PropertySchema>,
    /// Properties that must be present after defaults are applied.
    pub required: Vec<String>,
}

/// A single declared option.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PropertySchema {
    /// Expected value type. `None` accepts anything.
    #[serde(rename = "type")]
    pub kind: Option<PropertyKind>,
    /// Value used when the caller supplies none.
    pub default: Option<serde_json::Value>,
    /// Help text.
    pub description: Option<String>,
}

/// Value types an option can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl std::fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PropertyKind::String => "string",
            PropertyKind::Number => "number",
            PropertyKind::Integer => "integer",
            PropertyKind::Boolean => "boolean",
            PropertyKind::Array => "array",
            PropertyKind::Object => "object",
        };
        write!(f, "{}", name)
    }
}
