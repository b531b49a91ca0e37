//! Property-based tests for core domain types.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated inputs.

use std::sync::Arc;

use proptest::prelude::*;

use schematics::collection::Collection;
use schematics::core::description::{CollectionDescription, SchematicDescription};
use schematics::core::tree::{Tree, TreePath};
use schematics::core::types::{Fingerprint, SchematicName};
use schematics::engine::mock::MockEngine;
use schematics::rules::{factory, rule, RuleOutput};
use schematics::schematic::{Schematic, SchematicError};

/// Strategy for generating valid name characters.
fn name_char() -> impl Strategy<Value = char> {
    prop_oneof![
        prop::char::range('a', 'z'),
        prop::char::range('A', 'Z'),
        prop::char::range('0', '9'),
        Just('-'),
        Just('@'),
        Just('/'),
        Just('_'),
        Just('.'),
    ]
}

/// Strategy for generating valid schematic names.
fn valid_name() -> impl Strategy<Value = String> {
    prop::collection::vec(name_char(), 1..40).prop_map(|chars| chars.into_iter().collect())
}

/// Strategy for generating a name with at least one disallowed character.
fn invalid_name() -> impl Strategy<Value = String> {
    (
        valid_name(),
        any::<char>().prop_filter("must be disallowed", |c| {
            !(c.is_ascii_alphanumeric() || "-@/_.".contains(*c))
        }),
        valid_name(),
    )
        .prop_map(|(head, bad, tail)| format!("{}{}{}", head, bad, tail))
}

fn build(name: &str) -> Result<Schematic, SchematicError> {
    let kit = CollectionDescription::new("kit").unwrap();
    let collection = Collection::builder(kit.clone()).build();
    Schematic::new(
        SchematicDescription::new(name, kit),
        factory(|_| rule(|tree, _| Ok(RuleOutput::Tree(tree)))),
        collection,
        Arc::new(MockEngine::new()),
    )
}

proptest! {
    #[test]
    fn valid_names_construct(name in valid_name()) {
        let schematic = build(&name).unwrap();
        prop_assert_eq!(schematic.name().as_str(), name.as_str());
        prop_assert!(SchematicName::new(name.as_str()).is_ok());
    }

    #[test]
    fn invalid_names_fail(name in invalid_name()) {
        let err = build(&name).unwrap_err();
        prop_assert_eq!(err, SchematicError::InvalidName(name.clone()));
        prop_assert!(SchematicName::new(name.as_str()).is_err());
    }

    #[test]
    fn fingerprint_ignores_insertion_order(
        files in prop::collection::btree_map("[a-z]{1,8}", prop::collection::vec(any::<u8>(), 0..32), 1..8)
    ) {
        let forward = Tree::from_files(files.iter().map(|(p, c)| (p.as_str(), c.clone()))).unwrap();
        let reverse = Tree::from_files(files.iter().rev().map(|(p, c)| (p.as_str(), c.clone()))).unwrap();
        prop_assert_eq!(forward.fingerprint(), reverse.fingerprint());
    }

    #[test]
    fn fingerprint_changes_with_content(content in prop::collection::vec(any::<u8>(), 0..32)) {
        let a = Fingerprint::compute([("/f", content.as_slice())]);
        let mut changed = content.clone();
        changed.push(0);
        let b = Fingerprint::compute([("/f", changed.as_slice())]);
        prop_assert_ne!(a, b);
    }

    #[test]
    fn tree_paths_normalize(segments in prop::collection::vec("[a-z0-9_]{1,6}", 1..5)) {
        let relative = segments.join("/");
        let absolute = format!("/{}", relative);
        let trailing = format!("{}/", relative);

        let a = TreePath::new(&relative).unwrap();
        prop_assert_eq!(&a, &TreePath::new(&absolute).unwrap());
        prop_assert_eq!(&a, &TreePath::new(&trailing).unwrap());
        prop_assert_eq!(a.as_str(), absolute.as_str());
    }
}
