//! Property tests for the pricing oracle: the returned cut disconnects
//! `init` from `⊥` and is never heavier than any other disconnecting set.

use gelpp_core::gel::{KnowledgeBase, IS_A_IRI};
use gelpp_sat::max_sat;
use proptest::prelude::*;
use std::collections::BTreeSet;

const NODES: [&str; 6] = ["a0", "a1", "C0", "C1", "C2", "bot"];

#[derive(Debug, Clone)]
struct RawEdge {
    sub: usize,
    sup: usize,
    role_arrow: bool,
    uncertain: bool,
    weight: f64,
}

fn raw_edges() -> impl Strategy<Value = Vec<RawEdge>> {
    prop::collection::vec(
        (0..5usize, 0..6usize, any::<bool>(), any::<bool>(), 0.0..1.0f64).prop_map(
            |(sub, sup, role_arrow, uncertain, weight)| RawEdge {
                sub,
                sup,
                role_arrow,
                uncertain,
                weight,
            },
        ),
        0..12,
    )
}

fn build(raw: &[RawEdge]) -> (KnowledgeBase, Vec<f64>) {
    let mut kb = KnowledgeBase::new("bot", "top");
    kb.add_individual("a0");
    kb.add_individual("a1");
    for iri in ["C0", "C1", "C2"] {
        kb.add_concept(iri);
    }
    kb.add_role("r");
    let mut weights = Vec::new();
    for edge in raw {
        if edge.sub == edge.sup {
            continue;
        }
        let role = if edge.role_arrow { "r" } else { IS_A_IRI };
        if edge.uncertain {
            // A duplicate arrow registers nothing; its pbox id stays free.
            if kb
                .add_axiom(NODES[edge.sub], NODES[edge.sup], role, Some(weights.len()))
                .unwrap()
            {
                weights.push(edge.weight);
            }
        } else {
            kb.add_axiom(NODES[edge.sub], NODES[edge.sup], role, None)
                .unwrap();
        }
    }
    kb.complete();
    (kb, weights)
}

/// Whether dropping the given uncertain axioms disconnects `init` from `⊥`
/// in the non-derived arrow graph.
fn disconnects(kb: &KnowledgeBase, dropped: &BTreeSet<usize>) -> bool {
    let mut visited = vec![false; kb.concept_count()];
    let mut stack = vec![kb.init()];
    while let Some(id) = stack.pop() {
        if visited[id.index()] {
            continue;
        }
        visited[id.index()] = true;
        for arrow in kb.concept(id).sup_arrows() {
            if arrow.derived {
                continue;
            }
            if let Some(p) = arrow.pbox_id {
                if dropped.contains(&p) {
                    continue;
                }
            }
            stack.push(arrow.target);
        }
    }
    !visited[kb.bottom().index()]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn oracle_cut_disconnects_and_is_minimal(raw in raw_edges()) {
        let (kb, weights) = build(&raw);
        let n = weights.len();
        let outcome = max_sat::solve(&kb, &weights).unwrap();

        let mut best: Option<f64> = None;
        for mask in 0..(1u32 << n) {
            let dropped: BTreeSet<usize> =
                (0..n).filter(|i| mask & (1 << i) != 0).collect();
            if disconnects(&kb, &dropped) {
                let weight: f64 = dropped.iter().map(|&i| weights[i]).sum();
                best = Some(best.map_or(weight, |b: f64| b.min(weight)));
            }
        }

        match best {
            None => prop_assert!(!outcome.success),
            Some(min_weight) => {
                prop_assert!(outcome.success);
                prop_assert!(disconnects(&kb, &outcome.prob_axiom_indexes));
                let cut_weight: f64 =
                    outcome.prob_axiom_indexes.iter().map(|&i| weights[i]).sum();
                prop_assert!(cut_weight <= min_weight + 1e-9);
            }
        }
    }
}
