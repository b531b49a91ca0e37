//! collection
//!
//! Named registries of schematics.
//!
//! A [`Collection`] is assembled once through [`CollectionBuilder`] and is
//! immutable afterwards. Names are validated at registration, so a
//! registered schematic can always be constructed.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use crate::core::description::{CollectionDescription, SchematicDescription};
use crate::core::types::{CollectionName, SchematicName, TypeError};
use crate::engine::Engine;
use crate::rules::RuleFactory;
use crate::schematic::{Schematic, SchematicError};

/// Errors from collection registration and lookup.
#[derive(Debug, Error)]
pub enum CollectionError {
    /// A name is not a valid identifier.
    #[error(transparent)]
    InvalidName(#[from] TypeError),

    /// The schematic is already registered.
    #[error("schematic '{name}' is already registered in '{collection}'")]
    Duplicate {
        name: SchematicName,
        collection: CollectionName,
    },

    /// The description names a different collection.
    #[error("schematic '{name}' belongs to '{found}', not '{expected}'")]
    ForeignSchematic {
        name: String,
        expected: CollectionName,
        found: CollectionName,
    },

    /// No schematic with this name is registered.
    #[error("schematic '{name}' not found in collection '{collection}'")]
    UnknownSchematic {
        name: String,
        collection: CollectionName,
    },

    /// The schematic could not be constructed.
    #[error(transparent)]
    Schematic(#[from] SchematicError),
}

struct Entry {
    description: SchematicDescription,
    factory: RuleFactory,
}

struct CollectionInner {
    description: CollectionDescription,
    entries: BTreeMap<SchematicName, Entry>,
}

/// A named set of schematics.
///
/// Cloning is cheap; clones share the registry.
#[derive(Clone)]
pub struct Collection {
    inner: Arc<CollectionInner>,
}

impl Collection {
    /// Start building a collection.
    pub fn builder(description: CollectionDescription) -> CollectionBuilder {
        CollectionBuilder {
            description,
            entries: BTreeMap::new(),
        }
    }

    pub fn description(&self) -> &CollectionDescription {
        &self.inner.description
    }

    pub fn name(&self) -> &CollectionName {
        &self.inner.description.name
    }

    /// Registered schematic names, sorted.
    pub fn list_schematics(&self) -> Vec<&SchematicName> {
        self.inner.entries.keys().collect()
    }

    /// Description of a registered schematic.
    pub fn describe(&self, name: &str) -> Option<&SchematicDescription> {
        let name = SchematicName::new(name).ok()?;
        self.inner.entries.get(&name).map(|e| &e.description)
    }

    /// Construct the schematic `name`, bound to `engine`.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::UnknownSchematic`] if nothing is
    /// registered under `name`.
    pub fn create_schematic(
        &self,
        name: &str,
        engine: Arc<dyn Engine>,
    ) -> Result<Schematic, CollectionError> {
        let entry = SchematicName::new(name)
            .ok()
            .and_then(|key| self.inner.entries.get(&key))
            .ok_or_else(|| CollectionError::UnknownSchematic {
                name: name.to_string(),
                collection: self.name().clone(),
            })?;

        tracing::trace!(collection = %self.name(), schematic = name, engine = engine.name(), "creating schematic");

        Ok(Schematic::new(
            entry.description.clone(),
            Arc::clone(&entry.factory),
            self.clone(),
            engine,
        )?)
    }
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("name", self.name())
            .field("schematics", &self.list_schematics())
            .finish()
    }
}

/// Builder for [`Collection`].
pub struct CollectionBuilder {
    description: CollectionDescription,
    entries: BTreeMap<SchematicName, Entry>,
}

impl std::fmt::Debug for CollectionBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionBuilder")
            .field("name", &self.description.name)
            .field("schematics", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl CollectionBuilder {
    /// Register a schematic.
    ///
    /// # Errors
    ///
    /// - [`CollectionError::InvalidName`] if the name is not a valid identifier
    /// - [`CollectionError::ForeignSchematic`] if the description names another collection
    /// - [`CollectionError::Duplicate`] if the name is taken
    pub fn register(
        mut self,
        description: SchematicDescription,
        factory: RuleFactory,
    ) -> Result<Self, CollectionError> {
        let name = SchematicName::new(description.name.as_str())?;

        if description.collection.name != self.description.name {
            return Err(CollectionError::ForeignSchematic {
                name: description.name,
                expected: self.description.name.clone(),
                found: description.collection.name,
            });
        }

        if self.entries.contains_key(&name) {
            return Err(CollectionError::Duplicate {
                name,
                collection: self.description.name.clone(),
            });
        }

        self.entries.insert(name, Entry { description, factory });
        Ok(self)
    }

    /// Register a schematic with no summary or schema.
    pub fn register_named(self, name: &str, factory: RuleFactory) -> Result<Self, CollectionError> {
        let description = SchematicDescription::new(name, self.description.clone());
        self.register(description, factory)
    }

    pub fn build(self) -> Collection {
        Collection {
            inner: Arc::new(CollectionInner {
                description: self.description,
                entries: self.entries,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::mock::MockEngine;
    use crate::rules::{factory, rule, RuleOutput};

    fn noop() -> RuleFactory {
        factory(|_| rule(|tree, _| Ok(RuleOutput::Tree(tree))))
    }

    fn kit() -> CollectionDescription {
        CollectionDescription::new("kit").unwrap()
    }

    mod registration {
        use super::*;

        #[test]
        fn lists_sorted() {
            let collection = Collection::builder(kit())
                .register_named("service", noop())
                .unwrap()
                .register_named("component", noop())
                .unwrap()
                .build();

            let names: Vec<_> = collection.list_schematics().iter().map(|n| n.as_str()).collect();
            assert_eq!(names, vec!["component", "service"]);
        }

        #[test]
        fn duplicate_rejected() {
            let err = Collection::builder(kit())
                .register_named("component", noop())
                .unwrap()
                .register_named("component", noop())
                .unwrap_err();
            assert!(matches!(err, CollectionError::Duplicate { .. }));
        }

        #[test]
        fn invalid_name_rejected() {
            let err = Collection::builder(kit())
                .register_named("bad name!", noop())
                .unwrap_err();
            assert!(matches!(
                err,
                CollectionError::InvalidName(TypeError::InvalidSchematicName(_))
            ));
        }

        #[test]
        fn foreign_description_rejected() {
            let other = CollectionDescription::new("other").unwrap();
            let err = Collection::builder(kit())
                .register(SchematicDescription::new("component", other), noop())
                .unwrap_err();
            assert!(matches!(err, CollectionError::ForeignSchematic { .. }));
        }

        #[test]
        fn describe() {
            let collection = Collection::builder(kit())
                .register(
                    SchematicDescription::new("component", kit()).with_description("A component"),
                    noop(),
                )
                .unwrap()
                .build();

            let description = collection.describe("component").unwrap();
            assert_eq!(description.description.as_deref(), Some("A component"));
            assert!(collection.describe("missing").is_none());
            assert!(collection.describe("bad name!").is_none());
        }
    }

    mod create_schematic {
        use super::*;

        #[test]
        fn binds_collection() {
            let collection = Collection::builder(kit())
                .register_named("component", noop())
                .unwrap()
                .build();

            let schematic = collection
                .create_schematic("component", Arc::new(MockEngine::new()))
                .unwrap();
            assert_eq!(schematic.collection().name(), collection.name());
            assert_eq!(schematic.name().as_str(), "component");
        }

        #[test]
        fn unknown_name() {
            let collection = Collection::builder(kit()).build();
            let err = collection
                .create_schematic("component", Arc::new(MockEngine::new()))
                .unwrap_err();
            assert_eq!(
                err.to_string(),
                "schematic 'component' not found in collection 'kit'"
            );
        }
    }
}
