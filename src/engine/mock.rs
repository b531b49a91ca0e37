//! engine::mock
//!
//! Recording engine for deterministic testing.
//!
//! # Design
//!
//! The mock engine implements [`Engine`] without configuration. It records
//! every call in order, can fill option defaults, and can be told to fail
//! option transformation.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use futures::{stream, StreamExt};
//! use serde_json::json;
//! use schematics::collection::Collection;
//! use schematics::core::description::CollectionDescription;
//! use schematics::core::tree::Tree;
//! use schematics::engine::mock::{MockEngine, MockOperation};
//! use schematics::rules::{factory, rule, RuleOutput};
//!
//! # tokio_test::block_on(async {
//! let engine = MockEngine::new().with_defaults(json!({ "style": "css" }));
//! let collection = Collection::builder(CollectionDescription::new("kit").unwrap())
//!     .register_named("noop", factory(|_| rule(|tree, _| Ok(RuleOutput::Tree(tree)))))
//!     .unwrap()
//!     .build();
//! let noop = collection.create_schematic("noop", Arc::new(engine.clone())).unwrap();
//!
//! let _: Vec<_> = noop.call(json!({}), stream::iter(vec![Tree::new()]), None).collect().await;
//!
//! let ops = engine.operations();
//! assert!(matches!(ops[0], MockOperation::CreateContext { .. }));
//! assert!(matches!(ops[1], MockOperation::TransformOptions { .. }));
//! # });
//! ```

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use super::{ContextId, Engine, EngineError, Options, PartialContext, SchematicContext};
use crate::schematic::Schematic;

/// Mock engine for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone)]
pub struct MockEngine {
    inner: Arc<Mutex<MockEngineInner>>,
}

#[derive(Debug)]
struct MockEngineInner {
    /// Keys filled into object options when absent.
    defaults: serde_json::Map<String, Value>,
    /// Error returned by every transform_options call.
    fail_transform: Option<EngineError>,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq)]
pub enum MockOperation {
    CreateContext {
        schematic: String,
        context: ContextId,
        parent: Option<ContextId>,
    },
    TransformOptions {
        schematic: String,
        options: Value,
    },
}

impl MockEngine {
    /// Create a mock engine that passes options through unchanged.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockEngineInner {
                defaults: serde_json::Map::new(),
                fail_transform: None,
                operations: Vec::new(),
            })),
        }
    }

    /// Fill these keys into object options when absent.
    ///
    /// Non-object `defaults` are ignored.
    pub fn with_defaults(self, defaults: Value) -> Self {
        if let Value::Object(map) = defaults {
            self.inner.lock().unwrap().defaults = map;
        }
        self
    }

    /// Make every subsequent transform_options call fail with `error`.
    pub fn fail_transform(&self, error: EngineError) {
        self.inner.lock().unwrap().fail_transform = Some(error);
    }

    /// Clear the failure configuration.
    pub fn clear_fail_transform(&self) {
        self.inner.lock().unwrap().fail_transform = None;
    }

    /// Get all recorded operations, in call order.
    pub fn operations(&self) -> Vec<MockOperation> {
        let inner = self.inner.lock().unwrap();
        inner.operations.clone()
    }

    /// Clear recorded operations.
    pub fn clear_operations(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.clear();
    }

    /// Number of contexts created.
    pub fn context_count(&self) -> usize {
        self.count(|op| matches!(op, MockOperation::CreateContext { .. }))
    }

    /// Number of transform_options calls.
    pub fn transform_count(&self) -> usize {
        self.count(|op| matches!(op, MockOperation::TransformOptions { .. }))
    }

    fn count(&self, pred: impl Fn(&MockOperation) -> bool) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.operations.iter().filter(|op| pred(op)).count()
    }

    fn record(&self, op: MockOperation) {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(op);
    }
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Engine for MockEngine {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn create_context(
        &self,
        schematic: &Schematic,
        parent: Option<PartialContext>,
    ) -> SchematicContext {
        let context = SchematicContext::new(schematic.clone(), parent, false, false);
        self.record(MockOperation::CreateContext {
            schematic: schematic.description().qualified_name(),
            context: context.id(),
            parent: context.parent().map(|p| p.id()),
        });
        context
    }

    async fn transform_options(
        &self,
        schematic: &Schematic,
        options: Options,
    ) -> Result<Options, EngineError> {
        self.record(MockOperation::TransformOptions {
            schematic: schematic.description().qualified_name(),
            options: options.clone(),
        });

        let inner = self.inner.lock().unwrap();
        if let Some(e) = &inner.fail_transform {
            return Err(e.clone());
        }

        match options {
            Value::Object(mut map) => {
                for (key, value) in &inner.defaults {
                    map.entry(key.clone()).or_insert_with(|| value.clone());
                }
                Ok(Value::Object(map))
            }
            other => Ok(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::Collection;
    use crate::core::description::CollectionDescription;
    use crate::rules::{factory, rule, RuleOutput};
    use serde_json::json;

    fn schematic(engine: &MockEngine) -> Schematic {
        Collection::builder(CollectionDescription::new("kit").unwrap())
            .register_named("noop", factory(|_| rule(|tree, _| Ok(RuleOutput::Tree(tree)))))
            .unwrap()
            .build()
            .create_schematic("noop", Arc::new(engine.clone()))
            .unwrap()
    }

    #[test]
    fn records_context_parentage() {
        let engine = MockEngine::new();
        let s = schematic(&engine);

        let root = Arc::new(engine.create_context(&s, None));
        let child = engine.create_context(&s, Some(PartialContext::child_of(&root)));

        assert_eq!(
            engine.operations(),
            vec![
                MockOperation::CreateContext {
                    schematic: "kit:noop".into(),
                    context: root.id(),
                    parent: None,
                },
                MockOperation::CreateContext {
                    schematic: "kit:noop".into(),
                    context: child.id(),
                    parent: Some(root.id()),
                },
            ]
        );
    }

    #[tokio::test]
    async fn fills_defaults_without_overriding() {
        let engine = MockEngine::new().with_defaults(json!({ "a": 1, "b": 2 }));
        let s = schematic(&engine);

        let options = engine.transform_options(&s, json!({ "a": 5 })).await.unwrap();
        assert_eq!(options, json!({ "a": 5, "b": 2 }));
    }

    #[tokio::test]
    async fn non_object_passes_through() {
        let engine = MockEngine::new().with_defaults(json!({ "a": 1 }));
        let s = schematic(&engine);

        let options = engine.transform_options(&s, json!(null)).await.unwrap();
        assert_eq!(options, json!(null));
    }

    #[tokio::test]
    async fn configured_failure() {
        let engine = MockEngine::new();
        let s = schematic(&engine);
        let err = EngineError::Transform {
            transform: "mock".into(),
            message: "boom".into(),
        };
        engine.fail_transform(err.clone());

        assert_eq!(engine.transform_options(&s, json!({})).await, Err(err));
        assert_eq!(engine.transform_count(), 1);

        engine.clear_fail_transform();
        assert!(engine.transform_options(&s, json!({})).await.is_ok());
    }

    #[test]
    fn clear_operations() {
        let engine = MockEngine::new();
        let s = schematic(&engine);
        let _ = engine.create_context(&s, None);
        assert_eq!(engine.context_count(), 1);

        engine.clear_operations();
        assert!(engine.operations().is_empty());
    }
}
