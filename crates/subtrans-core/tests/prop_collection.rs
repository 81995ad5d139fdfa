//! Property-based tests for subtree collection
//!
//! Random trees are generated as parent vectors: node `i` hangs below a
//! node with a smaller index, so every vector describes a valid tree rooted
//! at node 0.


use proptest::prelude::*;
use subtrans_core::{LocationService, NoopObserver, SubtreeCollector, SubtreeTranslator, TranslationOptions};
use test_support::{DocumentBuilder, ScriptedRepository};

const BASE_ID: u64 = 1000;

/// Strategy for a tree of up to `max` nodes, with a flag per node telling
/// whether it exists in the reference language
fn tree_strategy(max: usize) -> impl Strategy<Value = (Vec<usize>, Vec<bool>)> {
    (1..=max).prop_flat_map(|len| {
        let parents = (0..len)
            .map(|index| if index == 0 { Just(0).boxed() } else { (0..index).boxed() })
            .collect::<Vec<_>>();
        let translated = proptest::collection::vec(proptest::bool::weighted(0.8), len);
        (parents, translated)
    })
}

fn build(parents: &[usize], translated: &[bool]) -> ScriptedRepository {
    let mut builder = DocumentBuilder::new();
    for (index, parent) in parents.iter().enumerate() {
        let id = BASE_ID + index as u64;
        let parent_id = (index > 0).then(|| BASE_ID + *parent as u64);
        // The root always exists in the reference language
        let languages: &[&str] = if index == 0 || translated[index] {
            &["eng-GB"]
        } else {
            &["ger-DE"]
        };
        builder = builder.node(id, parent_id, id, languages);
    }
    ScriptedRepository::new(builder.repository())
}

/// Pre-order ids of the nodes reachable through reference-language nodes
fn expected_ids(parents: &[usize], translated: &[bool]) -> Vec<u64> {
    let mut children = vec![Vec::new(); parents.len()];
    for (index, parent) in parents.iter().enumerate().skip(1) {
        children[*parent].push(index);
    }

    let mut ids = Vec::new();
    let mut stack = vec![0];
    while let Some(index) = stack.pop() {
        ids.push(BASE_ID + index as u64);
        stack.extend(
            children[index]
                .iter()
                .rev()
                .filter(|child| translated[**child]),
        );
    }
    ids
}

proptest! {
    #[test]
    fn prop_one_node_per_location_in_listing_order(
        (parents, _) in tree_strategy(40)
    ) {
        let translated = vec![true; parents.len()];
        let repository = build(&parents, &translated);
        let root = repository.load_location(BASE_ID).unwrap();

        let tree = SubtreeCollector::new(&repository, "eng-GB").collect(&root).unwrap();

        prop_assert_eq!(tree.len(), parents.len());
        prop_assert_eq!(tree.ids(), expected_ids(&parents, &translated));
    }

    #[test]
    fn prop_missing_reference_drops_whole_subtree(
        (parents, translated) in tree_strategy(40)
    ) {
        let repository = build(&parents, &translated);
        let root = repository.load_location(BASE_ID).unwrap();

        let tree = SubtreeCollector::new(&repository, "eng-GB").collect(&root).unwrap();

        prop_assert_eq!(tree.ids(), expected_ids(&parents, &translated));
    }

    #[test]
    fn prop_every_collected_node_is_translated_once(
        (parents, translated) in tree_strategy(25)
    ) {
        let repository = build(&parents, &translated);
        let root = repository.load_location(BASE_ID).unwrap();
        let tree = SubtreeCollector::new(&repository, "eng-GB").collect(&root).unwrap();
        let collected = tree.ids();

        let summary = SubtreeTranslator::new(&repository, TranslationOptions::new("eng-GB", "fre-FR"))
            .translate(tree, &mut NoopObserver);

        prop_assert_eq!(summary.translated, collected.len());
        prop_assert_eq!(repository.published(), collected);
    }
}
