//! rules::nested
//!
//! Rules that run another schematic on their input tree.
//!
//! The nested invocation gets a fresh context whose parent is the context
//! the rule was applied in, so the whole chain stays traceable.

use std::sync::Arc;

use futures::future;
use futures::stream::{self, StreamExt, TryStreamExt};

use super::{rule, Rule, RuleError, RuleOutput};
use crate::engine::{Options, PartialContext};
use crate::schematic::Schematic;

/// A rule invoking `schematic` with `options` on its input tree.
pub fn call_schematic(schematic: Schematic, options: Options) -> impl Rule {
    rule(move |tree, context| {
        let outputs = schematic
            .call(
                options.clone(),
                stream::once(future::ready(tree)),
                Some(PartialContext::child_of(&context)),
            )
            .map_err(|e| RuleError::Nested(Box::new(e)));
        Ok(RuleOutput::Stream(outputs.boxed()))
    })
}

/// A rule invoking the schematic `name` from the current schematic's own
/// collection, through the same engine.
///
/// The name is resolved when the rule is applied.
pub fn schematic(name: &str, options: Options) -> impl Rule {
    let name = name.to_string();
    rule(move |tree, context| {
        let current = context.schematic();
        let target = current
            .collection()
            .create_schematic(&name, Arc::clone(current.engine()))
            .map_err(anyhow::Error::from)?;
        call_schematic(target, options.clone()).apply(tree, context)
    })
}
