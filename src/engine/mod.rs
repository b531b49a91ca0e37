//! engine
//!
//! Cross-invocation services used by every schematic: context creation and
//! option transformation.
//!
//! # Architecture
//!
//! A [`Schematic`](crate::schematic::Schematic) never interprets options
//! itself and never decides how contexts nest. It calls exactly two
//! operations on its [`Engine`]:
//!
//! 1. **create_context**: build a fresh [`SchematicContext`] for one
//!    invocation, optionally inheriting from a parent
//! 2. **transform_options**: turn raw caller options into the shape the rule
//!    factory expects (defaults, coercion, validation)
//!
//! # Modules
//!
//! - [`context`] - Per-invocation context and parent linkage
//! - [`options`] - Option transform pipeline and bundled transforms
//! - [`host`] - [`SchematicEngine`], the configuration-backed engine
//! - [`mock`] - Recording engine for deterministic tests
//!
//! # Invariants
//!
//! - `create_context` is infallible and side-effect free beyond the context it returns
//! - `transform_options` yields exactly one value or one error
//! - The engine never mutates a parent context
//!
//! # Example
//!
//! ```ignore
//! use schematics::engine::{Engine, SchematicEngine};
//!
//! let engine: Arc<dyn Engine> = Arc::new(SchematicEngine::default());
//! let context = engine.create_context(&schematic, None);
//! let options = engine.transform_options(&schematic, json!({ "name": "x" })).await?;
//! ```

pub mod context;
pub mod host;
pub mod mock;
pub mod options;

pub use context::{ContextId, PartialContext, SchematicContext};
pub use host::SchematicEngine;
pub use options::{ConfigDefaults, ObjectOptions, OptionTransform, Options, SchemaOptions};

use async_trait::async_trait;
use thiserror::Error;

use crate::core::description::PropertyKind;
use crate::schematic::Schematic;

/// Errors from engine operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    /// Options are not a JSON object.
    #[error("options for '{schematic}' must be an object, got {found}")]
    InvalidOptions {
        /// Qualified schematic name
        schematic: String,
        /// JSON type that was supplied
        found: String,
    },

    /// A required option is absent after defaults were applied.
    #[error("option '{option}' is required by '{schematic}'")]
    MissingOption {
        /// Qualified schematic name
        schematic: String,
        /// Option name
        option: String,
    },

    /// An option could not be coerced to its declared type.
    #[error("option '{option}' of '{schematic}' expects {expected}, got {value}")]
    TypeMismatch {
        /// Qualified schematic name
        schematic: String,
        /// Option name
        option: String,
        /// Declared type
        expected: PropertyKind,
        /// Value that was supplied
        value: serde_json::Value,
    },

    /// A custom transform failed.
    #[error("options transform '{transform}' failed: {message}")]
    Transform {
        /// Transform name
        transform: String,
        /// Failure description
        message: String,
    },
}

/// The engine contract a schematic relies on.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`: one engine is shared by every
/// schematic of a session and by concurrent invocations.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Short identifier, used in logs.
    fn name(&self) -> &'static str;

    /// Create the context for one invocation of `schematic`.
    ///
    /// When `parent` carries a parent context, the new context must record
    /// it so nested invocations stay traceable.
    fn create_context(
        &self,
        schematic: &Schematic,
        parent: Option<PartialContext>,
    ) -> SchematicContext;

    /// Transform raw options into the shape the rule factory expects.
    async fn transform_options(
        &self,
        schematic: &Schematic,
        options: Options,
    ) -> Result<Options, EngineError>;
}
