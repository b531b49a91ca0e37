//! engine::context
//!
//! Per-invocation context records.
//!
//! # Design
//!
//! A [`SchematicContext`] is created fresh for every `call` and never reused.
//! Nesting is an explicit chain: a child context holds an `Arc` to its
//! parent, and its depth is one more than the parent's. Nothing about the
//! chain is global; it is passed through every call boundary.
//!
//! A [`PartialContext`] is what a caller hands to `call`: the parent to
//! inherit from plus optional flag overrides.

use std::sync::Arc;

use uuid::Uuid;

use crate::core::types::UtcTimestamp;
use crate::schematic::Schematic;

/// Unique identity of one invocation context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(Uuid);

impl ContextId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for ContextId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Context inherited by a new invocation.
///
/// Unset flags fall back to the engine's own defaults.
#[derive(Debug, Clone, Default)]
pub struct PartialContext {
    /// Invocation this one is nested in.
    pub parent: Option<Arc<SchematicContext>>,
    /// Debug flag override.
    pub debug: Option<bool>,
    /// Interactive flag override.
    pub interactive: Option<bool>,
}

impl PartialContext {
    /// Inherit parentage and flags from an existing context.
    pub fn child_of(parent: &Arc<SchematicContext>) -> Self {
        Self {
            parent: Some(Arc::clone(parent)),
            debug: Some(parent.is_debug()),
            interactive: Some(parent.is_interactive()),
        }
    }
}

impl From<Arc<SchematicContext>> for PartialContext {
    fn from(parent: Arc<SchematicContext>) -> Self {
        Self::child_of(&parent)
    }
}

/// Metadata for one schematic invocation.
#[derive(Debug, Clone)]
pub struct SchematicContext {
    id: ContextId,
    schematic: Schematic,
    parent: Option<Arc<SchematicContext>>,
    depth: usize,
    debug: bool,
    interactive: bool,
    created_at: UtcTimestamp,
}

impl SchematicContext {
    /// Create a context for `schematic`.
    ///
    /// `debug` and `interactive` are the engine's defaults; values set on
    /// `inherited` take precedence.
    pub fn new(
        schematic: Schematic,
        inherited: Option<PartialContext>,
        debug: bool,
        interactive: bool,
    ) -> Self {
        let inherited = inherited.unwrap_or_default();
        let depth = inherited.parent.as_ref().map_or(0, |p| p.depth + 1);

        Self {
            id: ContextId::new(),
            schematic,
            parent: inherited.parent,
            depth,
            debug: inherited.debug.unwrap_or(debug),
            interactive: inherited.interactive.unwrap_or(interactive),
            created_at: UtcTimestamp::now(),
        }
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    /// The schematic being invoked.
    pub fn schematic(&self) -> &Schematic {
        &self.schematic
    }

    /// The invocation this one is nested in, if any.
    pub fn parent(&self) -> Option<&Arc<SchematicContext>> {
        self.parent.as_ref()
    }

    /// Nesting depth; top-level invocations are 0.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn created_at(&self) -> &UtcTimestamp {
        &self.created_at
    }

    /// Parent contexts, nearest first.
    pub fn ancestors(&self) -> impl Iterator<Item = &SchematicContext> {
        std::iter::successors(self.parent.as_deref(), |ctx| ctx.parent.as_deref())
    }

    /// Qualified schematic names from the outermost invocation down to this one.
    ///
    /// ```text
    /// ["kit:app", "kit:module", "kit:component"]
    /// ```
    pub fn trace(&self) -> Vec<String> {
        let mut names: Vec<String> = std::iter::once(self)
            .chain(self.ancestors())
            .map(|ctx| ctx.schematic.description().qualified_name())
            .collect();
        names.reverse();
        names
    }
}
