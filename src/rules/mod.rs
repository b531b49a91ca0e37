//! rules
//!
//! Rules, rule factories, and the rule-application primitive.
//!
//! # Design
//!
//! A [`Rule`] is a single capability: given a tree and the invocation
//! context, produce output tree(s). Rules are trait objects; closures become
//! rules through [`rule`], and a [`RuleFactory`] turns final options into a
//! rule.
//!
//! Every rule is applied through [`call_rule`], which guarantees the output
//! stream delivers at least one tree or fails.
//!
//! # Modules
//!
//! - [`call`] - The rule-application primitive
//! - [`nested`] - Rules that invoke another schematic
//!
//! # Example
//!
//! ```
//! use schematics::rules::{factory, rule, RuleOutput};
//!
//! let add_readme = factory(|options| {
//!     let title = options["title"].as_str().unwrap_or("Untitled").to_string();
//!     rule(move |mut tree, _context| {
//!         tree.create("README.md", format!("# {}\n", title))?;
//!         Ok(RuleOutput::Tree(tree))
//!     })
//! });
//! # let _ = add_readme;
//! ```

pub mod call;
pub mod nested;

pub use call::call_rule;
pub use nested::{call_schematic, schematic};

use std::future::Future;
use std::sync::Arc;

use futures::stream::{self, BoxStream, StreamExt};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::core::tree::{Tree, TreeError};
use crate::engine::{Options, SchematicContext};
use crate::schematic::CallError;

/// Asynchronous stream of trees produced by a rule.
pub type TreeStream = BoxStream<'static, Result<Tree, RuleError>>;

/// Errors raised while applying a rule.
#[derive(Debug, Error)]
pub enum RuleError {
    /// A tree operation failed.
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// The final options do not fit the rule's expected shape.
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    /// A rule stream ended without delivering a tree.
    #[error("rule completed without producing a tree")]
    NoOutput,

    /// A nested schematic invocation failed.
    #[error("nested schematic failed: {0}")]
    Nested(#[source] Box<CallError>),

    /// User-authored rule logic failed.
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

/// What a rule hands back for one input tree.
pub enum RuleOutput {
    /// A single, already computed tree.
    Tree(Tree),
    /// Trees delivered asynchronously.
    Stream(TreeStream),
}

impl RuleOutput {
    /// Output delivered by a future.
    pub fn future<F>(future: F) -> Self
    where
        F: Future<Output = Result<Tree, RuleError>> + Send + 'static,
    {
        RuleOutput::Stream(stream::once(future).boxed())
    }

    pub(crate) fn into_stream(self) -> TreeStream {
        match self {
            RuleOutput::Tree(tree) => stream::once(futures::future::ready(Ok(tree))).boxed(),
            RuleOutput::Stream(stream) => stream,
        }
    }
}

impl From<Tree> for RuleOutput {
    fn from(tree: Tree) -> Self {
        RuleOutput::Tree(tree)
    }
}

impl std::fmt::Debug for RuleOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleOutput::Tree(tree) => f.debug_tuple("Tree").field(&tree.id()).finish(),
            RuleOutput::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// A tree transformation.
pub trait Rule: Send + Sync {
    /// Transform `tree` within `context`.
    ///
    /// Synchronous failures are returned directly; asynchronous ones travel
    /// inside the returned stream.
    fn apply(&self, tree: Tree, context: Arc<SchematicContext>) -> Result<RuleOutput, RuleError>;
}

impl<F> Rule for F
where
    F: Fn(Tree, Arc<SchematicContext>) -> Result<RuleOutput, RuleError> + Send + Sync,
{
    fn apply(&self, tree: Tree, context: Arc<SchematicContext>) -> Result<RuleOutput, RuleError> {
        self(tree, context)
    }
}

/// Turn a closure into a rule.
///
/// Exists so closure argument types are inferred at the call site.
pub fn rule<F>(f: F) -> F
where
    F: Fn(Tree, Arc<SchematicContext>) -> Result<RuleOutput, RuleError> + Send + Sync + 'static,
{
    f
}

/// Builds a rule from final, transformed options.
pub type RuleFactory = Arc<dyn Fn(Options) -> Arc<dyn Rule> + Send + Sync>;

/// Wrap a closure as a [`RuleFactory`].
pub fn factory<F, R>(f: F) -> RuleFactory
where
    F: Fn(Options) -> R + Send + Sync + 'static,
    R: Rule + 'static,
{
    Arc::new(move |options| Arc::new(f(options)) as Arc<dyn Rule>)
}

/// Wrap a closure taking typed options as a [`RuleFactory`].
///
/// Options that fail to deserialize into `T` produce a rule that fails with
/// [`RuleError::InvalidOptions`] when applied.
///
/// ```
/// use schematics::rules::{rule, typed_factory, RuleOutput};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct ComponentOptions {
///     name: String,
/// }
///
/// let component = typed_factory(|options: ComponentOptions| {
///     rule(move |mut tree, _| {
///         tree.create(format!("src/{}.rs", options.name), "")?;
///         Ok(RuleOutput::Tree(tree))
///     })
/// });
/// # let _ = component;
/// ```
pub fn typed_factory<T, F, R>(f: F) -> RuleFactory
where
    T: DeserializeOwned,
    F: Fn(T) -> R + Send + Sync + 'static,
    R: Rule + 'static,
{
    Arc::new(move |options| match serde_json::from_value::<T>(options) {
        Ok(typed) => Arc::new(f(typed)) as Arc<dyn Rule>,
        Err(e) => {
            let message = e.to_string();
            Arc::new(rule(move |_, _| Err(RuleError::InvalidOptions(message.clone()))))
        }
    })
}
