//! Tests for forests of layered trees

use keytree::util::testing::{init_test_setup, tree, value};
use keytree::{combine, Forest, KeyTreeError, Path, Tree, Value, Wood};

fn layers(sources: &[&str]) -> Forest {
    sources.iter().map(|source| tree(source)).collect()
}

// ============================================================
// Construction and indexing
// ============================================================

#[test]
fn given_nothing_when_creating_forest_then_is_empty() {
    let forest = Forest::new();

    assert!(forest.is_empty());
    assert_eq!(forest.trees().count(), 0);
    assert_eq!(forest.lookup("a"), None);
}

#[test]
fn given_trees_and_forests_when_indexing_then_addresses_top_level_entries() {
    let inner = layers(&["a = 1"]);
    let mut forest = Forest::new();
    forest.push(inner.clone()).push(tree("[a]\nb = 2\n"));

    assert_eq!(forest.len(), 2);
    assert_eq!(forest[0], Wood::Forest(inner.clone()));
    assert!(matches!(forest.get(1), Some(Wood::Tree(_))));
    assert!(forest.get(2).is_none());
    assert!(forest.contains(&Wood::Forest(inner)));
}

#[test]
fn given_list_of_tables_and_lists_when_building_then_nests_forests() {
    let list = vec![value("{ a = 1 }"), value("[{ b = 2 }, [{ c = 3 }]]")];

    let forest = Forest::from_list(list).unwrap();

    assert!(matches!(forest[0], Wood::Tree(_)));
    assert!(matches!(forest[1], Wood::Forest(_)));
    assert_eq!(forest.trees().count(), 3);
}

#[test]
fn given_scalar_element_when_building_from_list_then_invalid_argument() {
    let result = Forest::from_list(vec![value("{ a = 1 }"), Value::Integer(3)]);

    assert!(matches!(result, Err(KeyTreeError::InvalidArgument(_))));
}

// ============================================================
// Traversal order
// ============================================================

#[test]
fn given_nested_forests_when_listing_trees_then_level_order() {
    let deepest = layers(&["n = 4"]);
    let mut middle = layers(&["n = 2"]);
    middle.push(deepest);
    let mut forest = Forest::new();
    forest.push(middle).push(tree("n = 1")).push(layers(&["n = 3"]));

    let order: Vec<i64> = forest
        .trees()
        .filter_map(|t| t.fetch("n").ok().and_then(Value::as_integer))
        .collect();

    assert_eq!(order, vec![1, 2, 3, 4]);
}

// ============================================================
// Lookup, precedence and shadowing
// ============================================================

#[test]
fn given_layers_when_looking_up_then_closest_value_wins() {
    let forest = layers(&["a = 1", "a = 2\nb = 3"]);

    assert_eq!(forest.lookup("a"), Some(Value::Integer(1)));
    assert_eq!(forest.lookup("b"), Some(Value::Integer(3)));
    assert_eq!(forest.lookup("c"), None);
}

#[test]
fn given_leaf_above_subtree_when_looking_up_leaf_then_returns_leaf() {
    let forest = layers(&["a = 1", "[a]\nb = 2\n"]);

    assert_eq!(forest.lookup(["a"]), Some(Value::Integer(1)));
}

#[test]
fn given_structural_claim_when_looking_up_below_it_then_shadows_lower_layers() {
    init_test_setup();
    let forest = layers(&["[a]\n", "[a]\nb = 2\n"]);

    assert_eq!(forest.lookup(["a", "b"]), None);
    assert!(forest.contains_key("a.b"), "the value still exists in the lower layer");
}

#[test]
fn given_leaf_above_deeper_key_when_looking_up_then_falls_through_to_lower_layer() {
    let high = tree("a = 1");
    let forest = Forest::from_iter([high.clone(), tree("[a]\nb = 2\n")]);

    assert!(!high.has_prefix("a.b"));
    assert_eq!(forest.lookup("a.b"), Some(Value::Integer(2)));
    assert_eq!(forest.lookup("a"), Some(Value::Integer(1)));
}

#[test]
fn given_partial_override_when_looking_up_sibling_then_falls_through() {
    let forest = layers(&["[a]\nc = 1\n", "[a]\nb = 2\n"]);

    assert_eq!(forest.lookup("a.b"), Some(Value::Integer(2)));
    assert_eq!(forest.lookup("a.c"), Some(Value::Integer(1)));
}

#[test]
fn given_forest_behind_tree_when_looking_up_then_tree_hides_forest() {
    let tree1 = tree("a = 1");
    let tree2 = tree("[a]\nb = 2\n");
    let forest1 = Forest::from_iter([tree1]);
    let mut forest = Forest::new();
    forest.push(forest1).push(tree2.clone());

    assert_eq!(forest.lookup("a.b"), Some(Value::Integer(2)));
    assert_eq!(forest.lookup("a"), tree2.get("a").ok());
    assert_eq!(forest.lookup("b"), None);
}

#[test]
fn given_layer_with_default_when_looking_up_then_default_applies_but_fetch_fails() {
    let forest = Forest::from_iter([Tree::new().with_default_fn(|_, _| Value::Boolean(true))]);

    assert_eq!(forest.lookup("a"), Some(Value::Boolean(true)));
    assert_eq!(forest.fetch("a"), Err(KeyTreeError::KeyNotFound(Path::from("a"))));
}

// ============================================================
// Fetch
// ============================================================

#[test]
fn given_layers_when_fetching_then_first_resolving_layer_wins() {
    let forest = layers(&["[a]\n", "[a]\nb = 2\n", "[a]\nb = 3\n"]);

    assert_eq!(forest.fetch("a.b"), Ok(&Value::Integer(2)));
    assert_eq!(
        forest.fetch_or_else("x", |path| Value::String(path.join())),
        Value::from("x")
    );
}

#[test]
fn given_combiner_when_fetching_then_folds_from_lowest_priority() {
    let forest = layers(&["list = [\"high\"]", "other = 1", "list = [\"low\"]"]);

    let combined = forest.fetch_with("list", combine::concat_arrays).unwrap();

    assert_eq!(combined, value("[\"low\", \"high\"]"));
}

#[test]
fn given_combiner_when_fetching_then_receives_accumulated_then_next() {
    let forest = layers(&["n = 3", "n = 2", "n = 1"]);
    let mut calls = Vec::new();

    let result = forest
        .fetch_with("n", |_, acc, next| {
            calls.push((acc.clone(), next.clone()));
            Value::Integer(acc.as_integer().unwrap_or(0) * 10 + next.as_integer().unwrap_or(0))
        })
        .unwrap();

    assert_eq!(result, Value::Integer(123));
    assert_eq!(calls.len(), 2);
}

#[test]
fn given_owner_without_leaf_when_fetching_with_combiner_then_errors() {
    let forest = layers(&["[a]\nb = 1\n", "a = 2"]);

    let result = forest.fetch_with("a", combine::concat_arrays);

    assert_eq!(result, Err(KeyTreeError::KeyNotFound(Path::from("a"))));
}

#[test]
fn given_no_owner_when_fetching_with_combiner_then_key_not_found() {
    let forest = layers(&["a = 1"]);

    let result = forest.fetch_with("b", combine::concat_arrays);

    assert_eq!(result, Err(KeyTreeError::KeyNotFound(Path::from("b"))));
}

// ============================================================
// Existential tests
// ============================================================

#[test]
fn given_layers_when_testing_keys_and_prefixes_then_any_layer_counts() {
    let mut forest = Forest::new();
    forest.push(layers(&["a = 1"])).push(tree("[a]\nb = 2\n"));

    assert!(forest.contains_key("a.b"));
    assert!(!forest.contains_key("b.a"));
    assert!(forest.has_prefix("a"));
    assert!(!forest.has_prefix("b"));
}

// ============================================================
// Flatten and key paths
// ============================================================

#[test]
fn given_high_and_low_when_flattening_then_equals_low_merged_with_high() {
    let high = tree("a = 1\n[b]\nc = 2\n");
    let low = tree("a = 9\nd = 4\n[b]\nc = 8\ne = 5\n");
    let forest = Forest::from_iter([high.clone(), low.clone()]);

    let flat = forest.flatten();

    assert_eq!(flat, low.merge(&high));
    assert_eq!(flat.get("a").unwrap(), Value::Integer(1));
    assert_eq!(flat.get("b.e").unwrap(), Value::Integer(5));
}

#[test]
fn given_flattened_forest_when_looking_up_then_agrees_with_forest() {
    let forest = layers(&["a = 1\n[x]\ny = 2\n", "[a]\nb = 2\n[x]\nz = 3\n", "q = 4"]);

    let flat = forest.flatten();

    for path in ["a", "x.y", "x.z", "q"] {
        assert_eq!(flat.get(path).ok(), forest.lookup(path), "{path}");
    }
    assert!(flat.get("a.b").is_err(), "the closer leaf replaces the subtree when flattened");
    assert_eq!(forest.lookup("a.b"), Some(Value::Integer(2)));
}

#[test]
fn given_combiner_when_flattening_then_layers_compose() {
    let forest = layers(&["tags = [\"high\"]", "tags = [\"mid\"]", "tags = [\"low\"]"]);

    let flat = forest.flatten_with(combine::concat_arrays);

    assert_eq!(flat.get("tags").unwrap(), value("[\"low\", \"mid\", \"high\"]"));
}

#[test]
fn given_nested_forest_when_listing_key_paths_then_unions_all_layers() {
    let inner = layers(&["a = 1\n[b]\nc = 3\n"]);
    let forest = Forest::from_iter([Wood::Forest(inner.clone()), Wood::Tree(tree("a = 2\n[d]\ne = 1\n"))]);

    let paths = forest.key_paths();

    assert_eq!(paths.len(), 3);
    assert_eq!(paths.iter().filter(|p| **p == Path::from("a")).count(), 1);
    assert!(inner.key_paths().iter().all(|p| paths.contains(p)));
    assert!(paths.contains(&Path::from("d.e")));
}
