//! schematic
//!
//! A named, invocable tree transformation bound to its collection and engine.
//!
//! # Invocation
//!
//! [`Schematic::call`] wires one invocation together:
//!
//! ```text
//! create_context ─► first host tree ─► transform_options ─► factory ─► call_rule
//!     (eager)            (lazy, everything from here on runs when polled)
//! ```
//!
//! - The context is created when `call` is invoked, before anything else.
//! - Only the first tree of the host source is used; the source is dropped
//!   right after it.
//! - Options are transformed only once a tree is available; the factory is
//!   invoked exactly once, with the transformed options.
//! - Failures end the stream with a single [`CallError`]; no tree follows.
//!
//! Invocations share nothing but the schematic itself, which is immutable.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future;
use futures::stream::{self, BoxStream, Stream, StreamExt, TryStreamExt};
use thiserror::Error;

use crate::collection::Collection;
use crate::core::description::SchematicDescription;
use crate::core::tree::Tree;
use crate::core::types::SchematicName;
use crate::engine::{Engine, EngineError, Options, PartialContext, SchematicContext};
use crate::rules::call::until_error;
use crate::rules::{call_rule, RuleError, RuleFactory};

/// Errors constructing a schematic.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchematicError {
    /// The description's name contains characters outside `[-@/_.a-zA-Z0-9]`.
    #[error("schematic has invalid name: \"{0}\"")]
    InvalidName(String),
}

/// Errors delivered by an invocation stream.
#[derive(Debug, Error)]
pub enum CallError {
    /// The engine rejected the options.
    #[error(transparent)]
    Options(#[from] EngineError),

    /// The rule failed.
    #[error(transparent)]
    Rule(#[from] RuleError),
}

/// Progress of one invocation, reported as the `stage` field of its
/// tracing events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationStage {
    /// Context created; nothing else has run.
    ContextCreated,
    /// First tree taken from the host source.
    TreeAcquired,
    /// Host source completed without a tree.
    HostEmpty,
    /// Engine accepted and transformed the options.
    OptionsTransformed,
    /// Factory built the rule.
    RuleCreated,
    /// Rule output fully delivered.
    Completed,
    /// Invocation ended with an error.
    Failed,
}

impl std::fmt::Display for InvocationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            InvocationStage::ContextCreated => "context-created",
            InvocationStage::TreeAcquired => "tree-acquired",
            InvocationStage::HostEmpty => "host-empty",
            InvocationStage::OptionsTransformed => "options-transformed",
            InvocationStage::RuleCreated => "rule-created",
            InvocationStage::Completed => "completed",
            InvocationStage::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Trees produced by one invocation.
pub type InvocationStream = BoxStream<'static, Result<Tree, CallError>>;

/// A schematic: description, rule factory, owning collection and engine.
///
/// Cloning is cheap and clones refer to the same schematic.
#[derive(Clone)]
pub struct Schematic {
    inner: Arc<SchematicInner>,
}

struct SchematicInner {
    name: SchematicName,
    description: SchematicDescription,
    factory: RuleFactory,
    collection: Collection,
    engine: Arc<dyn Engine>,
}

impl Schematic {
    /// Bind a description and factory to a collection and engine.
    ///
    /// # Errors
    ///
    /// Returns [`SchematicError::InvalidName`] if the description's name is
    /// empty or contains characters outside `[-@/_.a-zA-Z0-9]`.
    pub fn new(
        description: SchematicDescription,
        factory: RuleFactory,
        collection: Collection,
        engine: Arc<dyn Engine>,
    ) -> Result<Self, SchematicError> {
        let name = SchematicName::new(description.name.as_str())
            .map_err(|_| SchematicError::InvalidName(description.name.clone()))?;

        Ok(Self {
            inner: Arc::new(SchematicInner {
                name,
                description,
                factory,
                collection,
                engine,
            }),
        })
    }

    pub fn name(&self) -> &SchematicName {
        &self.inner.name
    }

    pub fn description(&self) -> &SchematicDescription {
        &self.inner.description
    }

    /// The collection this schematic belongs to.
    pub fn collection(&self) -> &Collection {
        &self.inner.collection
    }

    pub(crate) fn engine(&self) -> &Arc<dyn Engine> {
        &self.inner.engine
    }

    /// Invoke the schematic.
    ///
    /// The context is created immediately. Everything else runs when the
    /// returned stream is polled: the first tree is taken from `host`, the
    /// engine transforms `options`, the factory builds the rule, and the
    /// rule is applied to that tree.
    ///
    /// If `host` completes without a tree the stream completes empty. If it
    /// never yields, the stream stays pending.
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use futures::{stream, StreamExt};
    /// use serde_json::json;
    /// use schematics::collection::Collection;
    /// use schematics::core::description::CollectionDescription;
    /// use schematics::core::tree::Tree;
    /// use schematics::engine::SchematicEngine;
    /// use schematics::rules::{factory, rule, RuleOutput};
    ///
    /// # tokio_test::block_on(async {
    /// let collection = Collection::builder(CollectionDescription::new("kit").unwrap())
    ///     .register_named(
    ///         "readme",
    ///         factory(|options| {
    ///             let title = options["title"].as_str().unwrap_or("").to_string();
    ///             rule(move |mut tree, _| {
    ///                 tree.create("README.md", title.clone())?;
    ///                 Ok(RuleOutput::Tree(tree))
    ///             })
    ///         }),
    ///     )
    ///     .unwrap()
    ///     .build();
    ///
    /// let readme = collection
    ///     .create_schematic("readme", Arc::new(SchematicEngine::default()))
    ///     .unwrap();
    ///
    /// let mut out = readme.call(json!({ "title": "Hello" }), stream::iter(vec![Tree::new()]), None);
    /// let tree = out.next().await.unwrap().unwrap();
    /// assert_eq!(tree.read_to_string("README.md").as_deref(), Some("Hello"));
    /// # });
    /// ```
    pub fn call<S>(
        &self,
        options: Options,
        host: S,
        parent: Option<PartialContext>,
    ) -> InvocationStream
    where
        S: Stream<Item = Tree> + Send + 'static,
    {
        let context = Arc::new(self.inner.engine.create_context(self, parent));
        trace_stage(&context, InvocationStage::ContextCreated);

        let schematic = self.clone();
        let pipeline_context = Arc::clone(&context);
        let pipeline = async move {
            let context = pipeline_context;

            let first = {
                let mut host = Box::pin(host);
                host.next().await
            };
            let Some(tree) = first else {
                trace_stage(&context, InvocationStage::HostEmpty);
                return stream::empty::<Result<Tree, CallError>>().boxed();
            };
            trace_stage(&context, InvocationStage::TreeAcquired);

            let options = match schematic.inner.engine.transform_options(&schematic, options).await {
                Ok(options) => options,
                Err(e) => return stream::once(future::ready(Err(CallError::Options(e)))).boxed(),
            };
            trace_stage(&context, InvocationStage::OptionsTransformed);

            let rule = (schematic.inner.factory)(options);
            trace_stage(&context, InvocationStage::RuleCreated);

            call_rule(rule, stream::once(future::ready(tree)), context)
                .map_err(CallError::Rule)
                .boxed()
        };

        observe(stream::once(pipeline).flatten(), context)
    }
}

impl std::fmt::Debug for Schematic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schematic")
            .field("name", &self.inner.name)
            .field("collection", self.inner.collection.name())
            .field("engine", &self.inner.engine.name())
            .finish()
    }
}

fn trace_stage(context: &SchematicContext, stage: InvocationStage) {
    tracing::debug!(
        schematic = %context.schematic().description().qualified_name(),
        context = %context.id(),
        depth = context.depth(),
        %stage,
        "schematic invocation"
    );
}

/// Log the terminal stage of an invocation and end it at the first error.
fn observe<S>(items: S, context: Arc<SchematicContext>) -> InvocationStream
where
    S: Stream<Item = Result<Tree, CallError>> + Send + 'static,
{
    let failed = Arc::new(AtomicBool::new(false));
    let on_item = Arc::clone(&failed);
    let on_item_context = Arc::clone(&context);

    until_error(items)
        .inspect(move |item| {
            if let Err(e) = item {
                on_item.store(true, Ordering::Relaxed);
                tracing::debug!(
                    schematic = %on_item_context.schematic().description().qualified_name(),
                    context = %on_item_context.id(),
                    depth = on_item_context.depth(),
                    stage = %InvocationStage::Failed,
                    error = %e,
                    "schematic invocation"
                );
            }
        })
        .map(Some)
        .chain(stream::once(async move {
            if !failed.load(Ordering::Relaxed) {
                trace_stage(&context, InvocationStage::Completed);
            }
            None
        }))
        .filter_map(future::ready)
        .boxed()
}
