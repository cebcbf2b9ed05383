//! Emission order for the declarations of a scope.
//!
//! Dependencies come first. Cycles among functions, methods, macros and
//! types are legal: their members form one batch, and every type in such a
//! cycle is preceded by a synthetic forward declaration. Once edges into
//! forward-declared types are dropped, a cycle still running through a
//! constant or variable is an initialization cycle.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::decl::Decl;
use crate::error::SortError;
use crate::graph::{cycle_through, is_cyclic, strongly_connected, Edges};
use crate::kind::Kind;
use crate::scope::Scope;

/// Declarations emitted together.
pub type Batch = Vec<Arc<Decl>>;

/// Sorted emission batches of a scope.
///
/// Built eagerly by [`Sorter::new`]; [`some`](Sorter::some) hands out one
/// batch at a time and [`all`](Sorter::all) the remaining order flattened.
#[derive(Debug)]
pub struct Sorter {
    batches: VecDeque<Batch>,
}

impl Sorter {
    pub fn new(scope: &Scope) -> Result<Self, SortError> {
        let decls = scope.decls();
        let edges = build_edges(scope);
        let mut batches: Vec<Batch> = Vec::with_capacity(decls.len());
        // Batch position of every real declaration, for group reassembly.
        let mut slots: Vec<Slot> = Vec::with_capacity(decls.len());

        for component in strongly_connected(&edges) {
            if !is_cyclic(&component, &edges) {
                slots.push(Slot::Single(component[0]));
                batches.push(vec![Arc::clone(&decls[component[0]])]);
                continue;
            }

            for &member in &component {
                if decls[member].kind() == Kind::Type {
                    tracing::debug!(
                        name = scope.interner().lookup(decls[member].name()),
                        "forward declaring type in cycle"
                    );
                    slots.push(Slot::Forward);
                    batches.push(vec![Arc::new(Decl::forward(&decls[member]))]);
                }
            }

            if component.iter().any(|&m| decls[m].kind().is_value()) {
                for part in split_value_cycle(scope, &component, &edges)? {
                    slots.push(if part.len() == 1 {
                        Slot::Single(part[0])
                    } else {
                        Slot::Cycle
                    });
                    batches.push(part.iter().map(|&m| Arc::clone(&decls[m])).collect());
                }
            } else {
                slots.push(Slot::Cycle);
                batches.push(component.iter().map(|&m| Arc::clone(&decls[m])).collect());
            }
        }

        reassemble_groups(decls, &edges, &mut slots, &mut batches);

        for batch in &batches {
            tracing::debug!(
                size = batch.len(),
                first = scope.interner().lookup(batch[0].name()),
                kind = %batch[0].kind(),
                "sorted batch"
            );
        }

        Ok(Sorter {
            batches: batches.into(),
        })
    }

    /// Next batch to emit, or `None` when done.
    pub fn some(&mut self) -> Option<Batch> {
        self.batches.pop_front()
    }

    /// The remaining declarations in emission order.
    pub fn all(self) -> Vec<Arc<Decl>> {
        self.batches.into_iter().flatten().collect()
    }

    /// Number of batches not yet handed out.
    pub fn remaining(&self) -> usize {
        self.batches.len()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Slot {
    /// Acyclic declaration (index into the scope).
    Single(usize),
    Forward,
    Cycle,
}

/// Edges from each declaration to the in-scope declarations it uses:
/// referenced names plus every method named by one of its selectors.
fn build_edges(scope: &Scope) -> Vec<Edges> {
    scope
        .decls()
        .iter()
        .map(|decl| {
            let mut out: Edges = SmallVec::new();
            let mut push = |target: usize| {
                if !out.contains(&target) {
                    out.push(target);
                }
            };
            for &name in decl.deps() {
                if let Some(target) = scope.index_of(name) {
                    push(target);
                }
            }
            for &method in decl.method_deps() {
                for &target in scope.method_indices(method) {
                    push(target);
                }
            }
            out
        })
        .collect()
}

/// Re-run the component search with edges into types removed. Any cycle
/// left that holds a constant or variable is an error.
fn split_value_cycle(
    scope: &Scope,
    component: &[usize],
    edges: &[Edges],
) -> Result<Vec<Vec<usize>>, SortError> {
    let decls = scope.decls();
    let local: FxHashMap<usize, usize> = component
        .iter()
        .enumerate()
        .map(|(local, &global)| (global, local))
        .collect();
    let sub_edges: Vec<Edges> = component
        .iter()
        .map(|&v| {
            edges[v]
                .iter()
                .filter(|&&w| decls[w].kind() != Kind::Type)
                .filter_map(|w| local.get(w).copied())
                .collect()
        })
        .collect();

    let mut parts = Vec::new();
    for sub in strongly_connected(&sub_edges) {
        let has_value = sub
            .iter()
            .any(|&l| decls[component[l]].kind().is_value());
        if has_value && is_cyclic(&sub, &sub_edges) {
            let start = sub
                .iter()
                .copied()
                .find(|&l| decls[component[l]].kind().is_value())
                .unwrap_or(sub[0]);
            let path = cycle_through(start, &sub, &sub_edges);
            let start_decl = &decls[component[start]];
            return Err(SortError::Cycle {
                names: path
                    .iter()
                    .map(|&l| scope.interner().lookup(decls[component[l]].name()).to_owned())
                    .collect(),
                span: start_decl.span(),
            });
        }
        parts.push(sub.into_iter().map(|l| component[l]).collect());
    }
    Ok(parts)
}

/// Put the members of each const/var block back in source order across
/// the slots they occupy, when that breaks no dependency the sorted order
/// satisfied.
fn reassemble_groups(
    decls: &[Arc<Decl>],
    edges: &[Edges],
    slots: &mut [Slot],
    batches: &mut [Batch],
) {
    let mut groups: FxHashMap<u32, Vec<usize>> = FxHashMap::default();
    for (pos, slot) in slots.iter().enumerate() {
        if let Slot::Single(decl) = *slot {
            if let Some(group) = decls[decl].group() {
                groups.entry(group).or_default().push(pos);
            }
        }
    }

    let mut group_ids: Vec<u32> = groups.keys().copied().collect();
    group_ids.sort_unstable();

    for group in group_ids {
        let positions = &groups[&group];
        if positions.len() < 2 {
            continue;
        }
        let mut members: Vec<usize> = positions
            .iter()
            .filter_map(|&pos| match slots[pos] {
                Slot::Single(decl) => Some(decl),
                Slot::Forward | Slot::Cycle => None,
            })
            .collect();
        members.sort_by_key(|&m| decls[m].seq());

        let mut candidate = slots.to_vec();
        for (&pos, &member) in positions.iter().zip(&members) {
            candidate[pos] = Slot::Single(member);
        }
        if candidate == slots {
            continue;
        }

        let before = violations(decls.len(), edges, slots, batches);
        let after = violations(decls.len(), edges, &candidate, batches);
        if after.is_subset(&before) {
            let reordered: Vec<Batch> = positions
                .iter()
                .map(|&pos| match candidate[pos] {
                    Slot::Single(decl) => vec![Arc::clone(&decls[decl])],
                    Slot::Forward | Slot::Cycle => batches[pos].clone(),
                })
                .collect();
            for (&pos, batch) in positions.iter().zip(reordered) {
                batches[pos] = batch;
            }
            slots.copy_from_slice(&candidate);
        }
    }
}

/// Edges whose target is emitted strictly after their source.
fn violations(
    n: usize,
    edges: &[Edges],
    slots: &[Slot],
    batches: &[Batch],
) -> FxHashSet<(usize, usize)> {
    let mut position = vec![usize::MAX; n];
    for (pos, slot) in slots.iter().enumerate() {
        match *slot {
            Slot::Single(decl) => position[decl] = pos,
            Slot::Cycle => {
                for decl in &batches[pos] {
                    let seq = decl.seq() as usize;
                    if seq < n {
                        position[seq] = pos;
                    }
                }
            }
            Slot::Forward => {}
        }
    }

    let mut out = FxHashSet::default();
    for (from, targets) in edges.iter().enumerate() {
        for &to in targets {
            if position[to] > position[from] {
                out.insert((from, to));
            }
        }
    }
    out
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests;
