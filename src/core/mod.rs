//! core
//!
//! Domain types, descriptions, and configuration for schematics.
//!
//! # Modules
//!
//! - [`types`] - Strong types: SchematicName, CollectionName, Fingerprint, etc.
//! - [`tree`] - In-memory file tree that rules transform
//! - [`description`] - Schematic and collection descriptions, options schemas
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Names are validated once, at construction
//! - Schemas are strict and self-describing

pub mod config;
pub mod description;
pub mod tree;
pub mod types;
