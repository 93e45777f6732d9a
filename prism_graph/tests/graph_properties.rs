//! Graph invariant tests.

mod common;

use common::*;
use prism_graph::schema::{EdgeKind, Position};
use prism_graph::{Graph, GraphError, Node, NodeId};
use rustc_hash::FxHashMap;

#[test]
fn test_back_edges_follow_every_mutation() {
    let mut g = new_graph();
    let a = g.add(constant(1)).unwrap();
    let b = g.add(constant(2)).unwrap();
    let m = g.add(mul(a, b)).unwrap();
    let check = g.add(guard(m)).unwrap();
    let merge = g.add(Node::of::<MergeNode>()).unwrap();
    g.set_edge(g.root(), Position::successor(0), Some(check))
        .unwrap();
    g.set_edge(check, Position::successor(0), Some(merge))
        .unwrap();
    g.push_edge(merge, EdgeKind::Input, 0, a).unwrap();
    g.push_edge(merge, EdgeKind::Input, 0, m).unwrap();
    assert_back_edges_symmetric(&g);

    g.replace_first_input(m, a, Some(b)).unwrap();
    g.set_edge(merge, Position::input_at(0, 0), None).unwrap();
    assert_back_edges_symmetric(&g);

    g.clear_inputs(merge).unwrap();
    g.clear_successors(check).unwrap();
    assert_back_edges_symmetric(&g);
    assert_eq!(g.node(merge).predecessor(), None);
}

#[test]
fn test_set_then_clear_input_leaves_usages_unchanged() {
    let mut g = new_graph();
    let a = g.add(constant(1)).unwrap();
    let b = g.add(constant(2)).unwrap();
    let m = g.add(mul(b, b)).unwrap();
    let before = g.node(a).usage_count();

    g.set_edge(m, Position::input(0), Some(a)).unwrap();
    assert_eq!(g.node(a).usage_count(), before + 1);
    g.set_edge(m, Position::input(0), None).unwrap();
    assert_eq!(g.node(a).usage_count(), before);
    assert_eq!(g.node(b).usages(), &[m]);
}

#[test]
fn test_unique_edgeless_adds_once() {
    let mut g = new_graph();
    let count = g.node_count();
    let first = g.unique(constant(42)).unwrap();
    let second = g.unique(constant(42)).unwrap();
    assert_eq!(first, second);
    assert_eq!(g.node_count(), count + 1);
}

#[test]
fn test_unique_edge_bearing_returns_existing() {
    let mut g = new_graph();
    let x = g.add(constant(3)).unwrap();
    let y = g.add(constant(4)).unwrap();
    let a = g.add(mul(x, y)).unwrap();
    let count = g.node_count();
    let ids = g.node_id_count();

    assert_eq!(g.unique(mul(x, y)), Ok(a));
    assert_eq!(g.node_count(), count);
    assert_eq!(g.node_id_count(), ids);
    assert_eq!(g.node(x).usages(), &[a]);
}

#[test]
fn test_unique_rejects_types_without_value_numbering() {
    let mut g = new_graph();
    let c = g.add(constant(1)).unwrap();
    assert_eq!(
        g.unique(guard(c)),
        Err(GraphError::NotValueNumberable("GuardNode"))
    );
}

#[test]
fn test_delete_with_usages_fails() {
    let mut g = new_graph();
    let a = g.add(constant(1)).unwrap();
    let user = g.add(Node::of::<ReturnNode>().with_input(0, a).unwrap()).unwrap();
    let count = g.node_count();
    let deleted = g.deleted_count();

    match g.delete(a) {
        Err(GraphError::HasUsages { node, usages }) => {
            assert_eq!(node, a);
            assert_eq!(usages, vec![user]);
        }
        other => panic!("unexpected result {:?}", other),
    }
    assert_eq!(g.node_count(), count);
    assert_eq!(g.deleted_count(), deleted);
    assert!(g.is_alive(a));
}

#[test]
fn test_replace_and_delete_rewires_usages_and_predecessor() {
    let mut g = new_graph();
    let root = g.root();
    let cond = g.add(constant(1)).unwrap();
    let a = g.add(guard(cond)).unwrap();
    g.set_edge(root, Position::successor(0), Some(a)).unwrap();
    let u1 = g.add(Node::of::<ReturnNode>().with_input(0, a).unwrap()).unwrap();
    let u2 = g.add(mul(cond, a)).unwrap();
    let c = g.add(guard(cond)).unwrap();
    let deleted = g.deleted_count();

    g.replace_and_delete(a, Some(c)).unwrap();

    assert_eq!(g.node(u1).input(0), Some(c));
    assert_eq!(g.node(u2).input(1), Some(c));
    assert!(g.node(c).usages().contains(&u1));
    assert!(g.node(c).usages().contains(&u2));
    assert_eq!(g.node(root).successor(0), Some(c));
    assert_eq!(g.node(c).predecessor(), Some(root));
    assert!(!g.is_alive(a));
    assert_eq!(g.deleted_count(), deleted + 1);
    assert_back_edges_symmetric(&g);
}

#[test]
fn test_replace_and_delete_with_null() {
    let mut g = new_graph();
    let root = g.root();
    let cond = g.add(constant(1)).unwrap();
    let a = g.add(guard(cond)).unwrap();
    g.set_edge(root, Position::successor(0), Some(a)).unwrap();
    let user = g.add(Node::of::<ReturnNode>().with_input(0, a).unwrap()).unwrap();

    g.replace_and_delete(a, None).unwrap();
    assert_eq!(g.node(user).input(0), None);
    assert_eq!(g.node(root).successor(0), None);
    assert!(g.node(cond).usages().is_empty());
    assert_back_edges_symmetric(&g);
}

#[test]
fn test_nodes_of_type_skips_deleted() {
    let mut g = new_graph();
    let first = g.add(constant(0)).unwrap();
    let second = g.add(constant(1)).unwrap();
    let third = g.add(constant(2)).unwrap();
    g.delete(second).unwrap();

    let ids: Vec<NodeId> = g
        .nodes_of_type::<ConstantNode>()
        .unwrap()
        .map(Node::id)
        .collect();
    assert_eq!(ids, vec![first, third]);
}

#[test]
fn test_root_of_iterable_type_is_id_zero() {
    let mut g = Graph::new(constant(0)).unwrap();
    let one = g.add(constant(1)).unwrap();
    let two = g.add(constant(2)).unwrap();
    assert_eq!((g.root().index(), one.index(), two.index()), (0, 1, 2));

    g.delete(one).unwrap();
    let seen: Vec<_> = g
        .nodes_of_type::<ConstantNode>()
        .unwrap()
        .map(|n| n.id().index())
        .collect();
    assert_eq!(seen, vec![0, 2]);
}

#[test]
fn test_add_duplicate_isomorphic_copy() {
    let mut g = new_graph();
    let a = g.add(constant(7)).unwrap();
    let b = g.add(mul(a, a)).unwrap();
    let c = g.add(Node::of::<ReturnNode>().with_input(0, b).unwrap()).unwrap();
    let count = g.node_count();
    let snapshot: Vec<_> = [a, b, c]
        .iter()
        .map(|&id| (g.node(id).inputs().collect::<Vec<_>>(), g.node(id).usages().to_vec()))
        .collect();

    let map = g.add_duplicate(&[a, b, c], &FxHashMap::default()).unwrap();
    assert_eq!(g.node_count(), count + 3);
    for original in [a, b, c] {
        assert_ne!(map[&original], original);
    }
    assert_eq!(g.node(map[&b]).inputs().collect::<Vec<_>>(), vec![map[&a], map[&a]]);
    assert_eq!(g.node(map[&c]).input(0), Some(map[&b]));
    assert_eq!(g.node(map[&a]).data("value"), g.node(a).data("value"));

    let after: Vec<_> = [a, b, c]
        .iter()
        .map(|&id| (g.node(id).inputs().collect::<Vec<_>>(), g.node(id).usages().to_vec()))
        .collect();
    assert_eq!(snapshot, after);
    assert_back_edges_symmetric(&g);
}

#[test]
fn test_add_duplicate_into_other_graph() {
    let mut source = new_graph();
    let a = source.add(constant(7)).unwrap();
    let b = source.add(mul(a, a)).unwrap();
    let c = source.add(Node::of::<ReturnNode>().with_input(0, b).unwrap()).unwrap();

    let mut target = new_graph();
    let map = target
        .add_duplicate_from(&source, &[a, b, c], &FxHashMap::default())
        .unwrap();
    assert_eq!(target.node_count(), 4);
    assert_eq!(target.node(map[&c]).input(0), Some(map[&b]));
    assert_eq!(source.node_count(), 4);
    assert_back_edges_symmetric(&source);
    assert_back_edges_symmetric(&target);
}

#[test]
fn test_mark_and_new_nodes() {
    let mut g = new_graph();
    g.add(constant(0)).unwrap();
    g.mark();
    let added: Vec<_> = (1..=3).map(|i| g.add(constant(i)).unwrap()).collect();
    let seen: Vec<_> = g.new_nodes().map(Node::id).collect();
    assert_eq!(seen, added);

    g.mark();
    assert_eq!(g.new_nodes().count(), 0);
    let late = g.add(constant(9)).unwrap();
    assert_eq!(g.new_nodes().map(Node::id).collect::<Vec<_>>(), vec![late]);
}

#[test]
fn test_new_nodes_cursor_tolerates_deletion() {
    let mut g = new_graph();
    g.mark();
    let added: Vec<_> = (0..3).map(|i| g.add(constant(i)).unwrap()).collect();
    let mut cursor = g.new_nodes_cursor();
    let mut seen = Vec::new();
    while let Some(id) = cursor.next(&g) {
        seen.push(id);
        if id == added[0] {
            g.delete(added[1]).unwrap();
        }
    }
    assert_eq!(seen, vec![added[0], added[2]]);
}

#[test]
fn test_edge_cursor_fails_loudly_on_mutation() {
    let mut g = new_graph();
    let a = g.add(constant(1)).unwrap();
    let m = g.add(mul(a, a)).unwrap();
    let mut cursor = g.input_cursor(m).unwrap();
    assert_eq!(cursor.next(&g), Ok(Some(a)));
    g.replace_first_input(m, a, None).unwrap();
    assert_eq!(
        cursor.next(&g),
        Err(GraphError::ConcurrentModification(m))
    );
}
