//! Property tests for declaration ordering.
//!
//! Random acyclic variable graphs, declared in shuffled order, must come out
//! with every dependency ahead of its dependents and nothing lost.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use gale_dep::{Scope, Sorter};
use gale_ir::{AstBuilder, BinaryOp, Item};
use proptest::prelude::*;

/// `(declaration order, deps[i])`; variable `vi` only uses `vj` with `j < i`.
fn dag_strategy() -> impl Strategy<Value = (Vec<usize>, Vec<Vec<usize>>)> {
    (1usize..24).prop_flat_map(|n| {
        let order = Just((0..n).collect::<Vec<_>>()).prop_shuffle();
        let deps = (0..n)
            .map(|i| prop::collection::vec(0..i.max(1), 0..=i.min(3)))
            .collect::<Vec<_>>();
        (order, deps).prop_map(|(order, deps)| {
            let deps = deps
                .into_iter()
                .enumerate()
                .map(|(i, mut d)| {
                    d.retain(|&j| j < i);
                    d.dedup();
                    d
                })
                .collect();
            (order, deps)
        })
    })
}

fn build(order: &[usize], deps: &[Vec<usize>]) -> Scope {
    let mut b = AstBuilder::default();
    let items: Vec<Item> = order
        .iter()
        .map(|&i| {
            let mut value = b.int(1);
            for &j in &deps[i] {
                let dep = b.ident(&format!("v{j}"));
                value = b.binary(BinaryOp::Add, value, dep);
            }
            b.var_decl(&format!("v{i}"), None, Some(value))
        })
        .collect();
    let interner = b.interner().clone();
    let mut scope = Scope::new(interner, b.finish());
    scope.load_all(&items).unwrap();
    scope
}

proptest! {
    #[test]
    fn dependencies_precede_dependents((order, deps) in dag_strategy()) {
        let scope = build(&order, &deps);
        let sorted = Sorter::new(&scope).unwrap().all();
        prop_assert_eq!(sorted.len(), order.len());

        let position: Vec<usize> = {
            let mut position = vec![usize::MAX; order.len()];
            for (pos, decl) in sorted.iter().enumerate() {
                let name = scope.interner().lookup(decl.name());
                let index: usize = name[1..].parse().unwrap();
                position[index] = pos;
            }
            position
        };
        for (i, used) in deps.iter().enumerate() {
            for &j in used {
                prop_assert!(position[j] < position[i], "v{} emitted after v{}", j, i);
            }
        }
    }

    #[test]
    fn independent_declarations_keep_declaration_order(n in 1usize..32) {
        let order: Vec<usize> = (0..n).rev().collect();
        let deps = vec![Vec::new(); n];
        let scope = build(&order, &deps);
        let sorted = Sorter::new(&scope).unwrap().all();
        let names: Vec<&str> = sorted.iter().map(|d| scope.interner().lookup(d.name())).collect();
        let expected: Vec<String> = order.iter().map(|i| format!("v{i}")).collect();
        prop_assert_eq!(names, expected);
    }
}
