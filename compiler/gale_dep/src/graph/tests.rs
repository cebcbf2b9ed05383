use super::*;
use smallvec::smallvec;

fn graph(adjacency: &[&[usize]]) -> Vec<Edges> {
    adjacency.iter().map(|targets| targets.iter().copied().collect()).collect()
}

#[test]
fn acyclic_components_come_dependencies_first() {
    // 0 -> 1 -> 2
    let edges = graph(&[&[1], &[2], &[]]);
    assert_eq!(strongly_connected(&edges), vec![vec![2], vec![1], vec![0]]);
}

#[test]
fn independent_roots_keep_index_order() {
    let edges = graph(&[&[], &[], &[]]);
    assert_eq!(strongly_connected(&edges), vec![vec![0], vec![1], vec![2]]);
}

#[test]
fn cycles_form_one_sorted_component() {
    // 0 -> 2 -> 1 -> 0, and 3 -> 0
    let edges = graph(&[&[2], &[0], &[1], &[0]]);
    let components = strongly_connected(&edges);
    assert_eq!(components, vec![vec![0, 1, 2], vec![3]]);
    assert!(is_cyclic(&components[0], &edges));
    assert!(!is_cyclic(&components[1], &edges));
}

#[test]
fn self_loop_is_cyclic() {
    let edges: Vec<Edges> = vec![smallvec![0]];
    assert!(is_cyclic(&[0], &edges));
    assert_eq!(cycle_through(0, &[0], &edges), vec![0, 0]);
}

#[test]
fn cycle_path_follows_edges() {
    // 0 -> 1 -> 2 -> 0
    let edges = graph(&[&[1], &[2], &[0]]);
    assert_eq!(cycle_through(0, &[0, 1, 2], &edges), vec![0, 1, 2, 0]);
    assert_eq!(cycle_through(1, &[0, 1, 2], &edges), vec![1, 2, 0, 1]);
}

#[test]
fn deep_chains_do_not_recurse() {
    let n = 100_000;
    let edges: Vec<Edges> = (0..n)
        .map(|i| if i + 1 < n { smallvec![i + 1] } else { SmallVec::new() })
        .collect();
    let components = strongly_connected(&edges);
    assert_eq!(components.len(), n);
    assert_eq!(components[0], vec![n - 1]);
}
