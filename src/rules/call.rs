//! rules::call
//!
//! Applying a rule to a stream of trees.
//!
//! # Guarantees
//!
//! For every input tree, [`call_rule`] delivers the rule's trees, or the
//! rule's error, or [`RuleError::NoOutput`] when the rule finished without
//! delivering anything. Output ends at the first error.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future;
use futures::stream::{self, Stream, StreamExt};

use super::{Rule, RuleError, TreeStream};
use crate::core::tree::Tree;
use crate::engine::SchematicContext;

/// Apply `rule` to every tree of `input` within `context`.
///
/// The rule is not touched until the returned stream is polled.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use futures::{stream, StreamExt};
/// use schematics::core::tree::Tree;
/// # use schematics::collection::Collection;
/// # use schematics::core::description::CollectionDescription;
/// # use schematics::engine::{mock::MockEngine, Engine};
/// use schematics::rules::{call_rule, factory, rule, Rule, RuleOutput};
///
/// # tokio_test::block_on(async {
/// # let noop = factory(|_| rule(|tree, _| Ok(RuleOutput::Tree(tree))));
/// # let collection = Collection::builder(CollectionDescription::new("kit").unwrap())
/// #     .register_named("noop", noop).unwrap().build();
/// # let engine = Arc::new(MockEngine::new());
/// # let schematic = collection.create_schematic("noop", engine.clone()).unwrap();
/// # let context = Arc::new(engine.create_context(&schematic, None));
/// let touch: Arc<dyn Rule> = Arc::new(rule(|mut tree, _| {
///     tree.create("TOUCHED", "")?;
///     Ok(RuleOutput::Tree(tree))
/// }));
///
/// let mut out = call_rule(touch, stream::iter(vec![Tree::new()]), context);
/// let tree = out.next().await.unwrap().unwrap();
/// assert!(tree.exists("TOUCHED"));
/// # });
/// ```
pub fn call_rule<S>(rule: Arc<dyn Rule>, input: S, context: Arc<SchematicContext>) -> TreeStream
where
    S: Stream<Item = Tree> + Send + 'static,
{
    let outputs = input.flat_map(move |tree| apply_one(&rule, tree, Arc::clone(&context)));
    until_error(outputs).boxed()
}

fn apply_one(rule: &Arc<dyn Rule>, tree: Tree, context: Arc<SchematicContext>) -> TreeStream {
    match rule.apply(tree, context) {
        Ok(output) => require_output(output.into_stream()),
        Err(e) => stream::once(future::ready(Err(e))).boxed(),
    }
}

/// Append [`RuleError::NoOutput`] to a stream that ends without any item.
fn require_output(outputs: TreeStream) -> TreeStream {
    let produced = Arc::new(AtomicBool::new(false));
    let seen = Arc::clone(&produced);

    outputs
        .inspect(move |_| seen.store(true, Ordering::Relaxed))
        .map(Some)
        .chain(stream::once(async move {
            if produced.load(Ordering::Relaxed) {
                None
            } else {
                Some(Err(RuleError::NoOutput))
            }
        }))
        .filter_map(future::ready)
        .boxed()
}

/// End `items` right after the first error.
pub(crate) fn until_error<S, T, E>(items: S) -> impl Stream<Item = Result<T, E>> + Send
where
    S: Stream<Item = Result<T, E>> + Send,
    T: Send,
    E: Send,
{
    items.scan(false, |failed, item| {
        if *failed {
            return future::ready(None);
        }
        *failed = item.is_err();
        future::ready(Some(item))
    })
}
