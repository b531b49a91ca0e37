//! Schematics - Invocation of named, reusable tree transformations
//!
//! A schematic is a named transformation over a virtual file tree. Callers
//! supply raw options and a source of trees; the schematic asks its engine for
//! a fresh invocation context, waits for the first tree, has the engine
//! transform the options, builds a rule from its factory, and applies that
//! rule. Results are delivered as an asynchronous stream.
//!
//! # Architecture
//!
//! - [`schematic`] - The invocation pipeline
//! - [`collection`] - Registries that own and construct schematics
//! - [`rules`] - Rules, rule factories, and nested invocation
//! - [`engine`] - Context creation and option transformation
//! - [`core`] - Domain types, trees, descriptions, and configuration
//!
//! # Correctness Invariants
//!
//! 1. Schematic names are validated before a schematic exists
//! 2. Every invocation gets its own context, linked to its parent when nested
//! 3. Only the first tree of a host source is consumed
//! 4. The rule factory runs at most once per invocation, after options are final
//! 5. Failures end the invocation stream; no tree follows an error

pub mod collection;
pub mod core;
pub mod engine;
pub mod rules;
pub mod schematic;
