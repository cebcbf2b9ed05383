//! Strongly connected components over declaration indices.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::collections::VecDeque;

pub(crate) type Edges = SmallVec<[usize; 4]>;

/// Tarjan's algorithm with an explicit call stack.
///
/// Roots are visited in index order and successors in edge order.
/// Components are returned dependencies-first (a component comes after
/// every component it has edges into), each sorted by index.
pub(crate) fn strongly_connected(edges: &[Edges]) -> Vec<Vec<usize>> {
    let n = edges.len();
    let mut index: Vec<Option<usize>> = vec![None; n];
    let mut lowlink = vec![0usize; n];
    let mut on_stack = vec![false; n];
    let mut stack: Vec<usize> = Vec::new();
    let mut components = Vec::new();
    let mut next_index = 0;

    for root in 0..n {
        if index[root].is_some() {
            continue;
        }

        // Call stack entries: (node, next edge to follow).
        let mut calls: Vec<(usize, usize)> = vec![(root, 0)];
        index[root] = Some(next_index);
        lowlink[root] = next_index;
        next_index += 1;
        stack.push(root);
        on_stack[root] = true;

        while let Some(&(v, edge)) = calls.last() {
            if let Some(&w) = edges[v].get(edge) {
                if let Some(top) = calls.last_mut() {
                    top.1 += 1;
                }
                match index[w] {
                    None => {
                        index[w] = Some(next_index);
                        lowlink[w] = next_index;
                        next_index += 1;
                        stack.push(w);
                        on_stack[w] = true;
                        calls.push((w, 0));
                    }
                    Some(w_index) if on_stack[w] => {
                        lowlink[v] = lowlink[v].min(w_index);
                    }
                    Some(_) => {}
                }
                continue;
            }

            calls.pop();
            if let Some(&(parent, _)) = calls.last() {
                lowlink[parent] = lowlink[parent].min(lowlink[v]);
            }
            if Some(lowlink[v]) == index[v] {
                let mut component = Vec::new();
                while let Some(w) = stack.pop() {
                    on_stack[w] = false;
                    component.push(w);
                    if w == v {
                        break;
                    }
                }
                component.sort_unstable();
                components.push(component);
            }
        }
    }

    components
}

/// True if the component has an internal edge (two or more members, or a self-loop).
pub(crate) fn is_cyclic(component: &[usize], edges: &[Edges]) -> bool {
    match component {
        [single] => edges[*single].contains(single),
        _ => component.len() > 1,
    }
}

/// Shortest path `start -> ... -> start` through members of `component`
/// (sorted). Returns just `[start, start]` if `start` has a self-loop.
pub(crate) fn cycle_through(start: usize, component: &[usize], edges: &[Edges]) -> Vec<usize> {
    let mut parent: FxHashMap<usize, usize> = FxHashMap::default();
    let mut queue = VecDeque::from([start]);

    while let Some(v) = queue.pop_front() {
        for &w in &edges[v] {
            if component.binary_search(&w).is_err() {
                continue;
            }
            if w == start {
                let mut path = vec![start];
                let mut at = v;
                while at != start {
                    path.push(at);
                    match parent.get(&at) {
                        Some(&p) => at = p,
                        None => break,
                    }
                }
                path.push(start);
                // path is [start, v, ..., first hop, start]; flip the middle.
                let last = path.len() - 1;
                path[1..last].reverse();
                return path;
            }
            if let std::collections::hash_map::Entry::Vacant(slot) = parent.entry(w) {
                slot.insert(v);
                queue.push_back(w);
            }
        }
    }

    vec![start, start]
}

#[cfg(test)]
mod tests;
