use pretty_assertions::assert_eq;
use tree_data::tree::prelude::*;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn ids<'a>(nodes: impl IntoIterator<Item = &'a Node>) -> Vec<&'a str> {
    nodes.into_iter().map(|node| node.id.as_str()).collect()
}

fn sample() -> Dataset {
    // R -> [A -> [A1], B], S
    Dataset::new(vec![
        Node::branch("R", "Root")
            .with_child(Node::branch("A", "Alpha").with_child(Node::leaf("A1", "Alpha one")))
            .with_child(Node::leaf("B", "Beta")),
        Node::leaf("S", "Sibling"),
    ])
}

#[test]
fn test_exists() {
    assert!(sample().exists());
    assert!(!Dataset::default().exists());
}

#[test]
fn test_find_is_preorder_and_short_circuits() {
    let dataset = sample();
    let mut visited = Vec::new();
    let found = dataset.find(|node| {
        visited.push(node.id.clone());
        node.is_leaf()
    });

    assert_eq!(found.map(|node| node.id.as_str()), Some("A1"));
    assert_eq!(visited, vec!["R", "A", "A1"]);
    assert!(dataset.find(|node| node.id == "missing").is_none());
}

#[test]
fn test_filter_is_flat_preorder() {
    let dataset = sample();
    let leaves = dataset.filter(|node| node.is_leaf());
    assert_eq!(ids(leaves), vec!["A1", "B", "S"]);

    // Matches are independent of their ancestors
    let alphas = dataset.filter(|node| node.label().starts_with("Alpha"));
    assert_eq!(ids(alphas), vec!["A", "A1"]);
}

#[test]
fn test_traverse_visible_prunes_children_only() {
    let dataset = Dataset::new(vec![Node::branch("R", "Root")
        .with_child(Node::branch("A", "A").with_child(Node::leaf("A1", "A1")))
        .with_child(Node::leaf("B", "B"))]);

    let visible = dataset.traverse_visible(|node| node.id != "A");
    assert_eq!(ids(visible), vec!["R", "A", "B"]);
}

#[test]
fn test_traverse_visible_with_expansion_state() {
    let dataset = sample();
    let expanded = ["R"];
    let visible = dataset.traverse_visible(|node| expanded.contains(&node.id.as_str()));
    assert_eq!(ids(visible), vec!["R", "A", "B", "S"]);
}

#[test]
fn test_get_parent() {
    let dataset = Dataset::from_json(
        r#"{ "nodes": [{ "id": "0", "children": [{ "id": "0.0" }, { "id": "0.1" }] }] }"#,
    )
    .unwrap();

    assert_eq!(dataset.get_parent("0.1").map(|node| node.id.as_str()), Some("0"));
    assert!(dataset.get_parent("0").is_none());
    assert!(dataset.get_parent("missing").is_none());
}

#[test]
fn test_pop_nested_and_root() {
    init_logging();
    let mut dataset = sample();

    assert!(dataset.pop("A1"));
    assert_eq!(ids(dataset.to_stream()), vec!["R", "A", "B", "S"]);

    assert!(dataset.pop("S"));
    assert_eq!(ids(dataset.to_stream()), vec!["R", "A", "B"]);

    assert!(!dataset.pop("missing"));
    assert_eq!(dataset.node_count(), 3);
}

#[test]
fn test_pop_last_child_keeps_empty_children() {
    let mut dataset = sample();
    assert!(dataset.pop("A1"));

    let parent = dataset.find_by_id("A").unwrap();
    assert_eq!(parent.children, Some(Vec::new()));
    assert!(parent.is_branch());
}

#[test]
fn test_pop_on_plain_node_vector() {
    let mut nodes = vec![Node::new("a", "A"), Node::new("b", "B")];
    // Vec::pop shadows the trait method
    assert!(ForestTraversal::pop(&mut nodes, "a"));
    assert_eq!(ids(&nodes), vec!["b"]);
}

#[test]
fn test_pop_round_trip_by_reinsertion() {
    let original = sample();
    let mut dataset = original.clone();

    let removed = dataset.find_by_id("A").cloned().unwrap();
    let parent = dataset.get_parent("A").map(|node| node.id.clone());
    assert!(dataset.pop("A"));
    assert!(dataset.find_by_id("A1").is_none());

    // Re-insert the original structure at the same position
    let parent = dataset
        .find_mut(|node| Some(&node.id) == parent.as_ref())
        .unwrap();
    parent.children.get_or_insert_with(Vec::new).insert(0, removed);

    assert_eq!(dataset.find_by_id("A"), original.find_by_id("A"));
    assert_eq!(dataset, original);
}

#[test]
fn test_take_and_restore_root() {
    let original = sample();
    let mut dataset = original.clone();

    let detached = dataset.take("R").unwrap();
    assert_eq!(detached.parent_id, None);
    assert_eq!(detached.index, 0);
    assert_eq!(ids(dataset.to_stream()), vec!["S"]);

    assert!(dataset.restore(detached));
    assert_eq!(dataset, original);
}

#[test]
fn test_restore_into_missing_parent_fails() {
    let mut dataset = sample();
    let detached = dataset.take("A1").unwrap();
    assert!(dataset.pop("A"));
    assert!(!dataset.restore(detached));
}

#[test]
fn test_sanitize_duplicate_ids() {
    init_logging();
    let mut dataset = Dataset::from_json(
        r#"{ "nodes": [{ "id": "x", "value": "A" }, { "id": "x", "value": "B" }] }"#,
    )
    .unwrap();

    let remap = sanitize_ids(&mut dataset, Vec::<String>::new(), &SanitizeOptions::default());

    assert_eq!(remap.len(), 1);
    let change = &remap.changes()[0];
    assert_eq!(change.old, "x");
    assert_ne!(change.new, "x");
    assert_eq!(dataset.nodes[1].id, change.new);

    let matches = dataset.filter(|node| node.id == "x");
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].label(), "A");
}

#[test]
fn test_sanitize_is_idempotent() {
    let mut dataset = Dataset::new(vec![
        Node::new("", "Empty"),
        Node::branch("dup", "One").with_child(Node::new("dup", "Two")),
        Node::new("dup", "Three"),
    ]);
    let options = SanitizeOptions::default();

    let first = sanitize_ids(&mut dataset, Vec::<String>::new(), &options);
    assert_eq!(first.len(), 3);
    assert!(dataset.duplicate_ids().is_empty());

    let second = sanitize_ids(&mut dataset, Vec::<String>::new(), &options);
    assert!(second.is_empty());
}

#[test]
fn test_sanitize_avoids_candidate_ids() {
    let mut dataset = Dataset::new(vec![Node::new("row", "Row"), Node::new("row", "Row")]);
    let selection = vec!["row-1".to_string()];

    let remap = sanitize_ids(&mut dataset, &selection, &SanitizeOptions::default());
    assert_eq!(remap.get("row"), Some("row-2"));
}

#[test]
fn test_fix_ids_on_nodes() {
    let mut nodes = vec![Node::new("", "First"), Node::new("", "First")];
    let remap = fix_ids(&mut nodes);
    assert_eq!(ids(&nodes), vec!["first-1", "first-2"]);
    assert_eq!(remap.to_map().get(""), Some(&"first-1".to_string()));
}

#[test]
fn test_resolve_targets() {
    let dataset = sample();

    assert!(dataset.resolve_targets(Target::None).is_empty());
    assert!(dataset.resolve_targets(None::<&str>).is_empty());
    assert!(dataset.resolve_targets("nonexistent-id").is_empty());

    assert_eq!(ids(dataset.resolve_targets("A1")), vec!["A1"]);
    assert_eq!(
        ids(dataset.resolve_targets(vec!["B", "bad", "A"])),
        vec!["B", "A"]
    );
}

#[test]
fn test_resolve_targets_with_nodes() {
    let dataset = sample();
    let copy = Node::leaf("B", "Stale copy");
    let gone = Node::leaf("gone", "Gone");

    let resolved = dataset.resolve_targets(Target::many([
        Target::from(&copy),
        Target::from(&gone),
        Target::from("S"),
    ]));

    assert_eq!(ids(resolved.iter().copied()), vec!["B", "S"]);
    // The forest's own node comes back, not the caller's copy
    assert_eq!(resolved[0].label(), "Beta");
}

#[test]
fn test_resolve_nested_targets_flatten() {
    let dataset = sample();
    let target = Target::many([
        Target::from(vec!["R", "A"]),
        Target::from(Some("S")),
        Target::None,
    ]);
    assert_eq!(ids(dataset.resolve_targets(target)), vec!["R", "A", "S"]);
}

#[test]
fn test_to_stream_is_single_pass() {
    let dataset = sample();
    let mut stream = dataset.to_stream();
    assert_eq!(stream.by_ref().take(2).count(), 2);
    assert_eq!(ids(stream), vec!["A1", "B", "S"]);

    // A fresh call starts over
    assert_eq!(dataset.to_stream().count(), 5);
}
