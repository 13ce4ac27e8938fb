//! Property tests for the completion engine: idempotence, closure
//! soundness and monotone inconsistency over random small ontologies.

use gelpp_core::gel::{ConceptId, KnowledgeBase, IS_A_IRI};
use proptest::prelude::*;

const CONCEPTS: usize = 5;
const ROLES: usize = 3;

#[derive(Debug, Clone)]
struct RawAxiom {
    sub: usize,
    sup: usize,
    role: usize,
    uncertain: bool,
}

fn raw_axioms() -> impl Strategy<Value = Vec<RawAxiom>> {
    prop::collection::vec(
        (0..CONCEPTS, 0..CONCEPTS, 0..ROLES, any::<bool>()).prop_map(
            |(sub, sup, role, uncertain)| RawAxiom {
                sub,
                sup,
                role,
                uncertain,
            },
        ),
        0..24,
    )
}

fn build(axioms: &[RawAxiom]) -> KnowledgeBase {
    let mut kb = KnowledgeBase::new("bot", "top");
    for i in 0..CONCEPTS {
        kb.add_concept(format!("C{i}"));
    }
    // role 0 is is-a, the rest are ordinary
    for r in 1..ROLES {
        kb.add_role(format!("r{r}"));
    }
    let mut next_pbox = 0;
    for ax in axioms {
        let role = if ax.role == 0 {
            IS_A_IRI.to_string()
        } else {
            format!("r{}", ax.role)
        };
        let pbox = if ax.uncertain {
            let id = next_pbox;
            next_pbox += 1;
            Some(id)
        } else {
            None
        };
        kb.add_axiom(&format!("C{}", ax.sub), &format!("C{}", ax.sup), &role, pbox)
            .unwrap();
    }
    kb.complete();
    kb
}

fn total_arrows(kb: &KnowledgeBase) -> usize {
    kb.concepts().map(|(_, c)| c.sup_arrows().len()).sum()
}

proptest! {
    #[test]
    fn inserting_twice_equals_inserting_once(axioms in raw_axioms()) {
        let once = build(&axioms);
        let mut doubled = axioms.clone();
        doubled.extend(axioms.iter().cloned().map(|mut ax| {
            // Re-inserting as certain must still be a no-op on the arrow set.
            ax.uncertain = false;
            ax
        }));
        let twice = build(&doubled);
        prop_assert_eq!(total_arrows(&once), total_arrows(&twice));
        prop_assert_eq!(once.concept_count(), twice.concept_count());
    }

    #[test]
    fn is_a_arrows_are_transitively_closed(axioms in raw_axioms()) {
        let kb = build(&axioms);
        let is_a = kb.is_a();
        for (c, concept) in kb.concepts() {
            for first in concept.sup_arrows().iter().filter(|a| a.role == is_a) {
                let mid = kb.concept(first.target);
                for second in mid.sup_arrows().iter().filter(|a| a.role == is_a) {
                    if second.target == c {
                        continue;
                    }
                    prop_assert!(
                        kb.concept(c)
                            .sup_arrows()
                            .iter()
                            .any(|a| a.role == is_a && a.target == second.target),
                        "missing {} ⊑ {}",
                        concept.iri(),
                        kb.concept(second.target).iri()
                    );
                }
            }
        }
    }

    #[test]
    fn emptiness_never_reverts(axioms in raw_axioms()) {
        let mut kb = build(&axioms);
        let empty_before: Vec<ConceptId> = kb
            .concepts()
            .filter(|(_, c)| c.is_empty())
            .map(|(id, _)| id)
            .collect();
        for i in 0..CONCEPTS {
            kb.add_axiom(&format!("C{i}"), "top", IS_A_IRI, None).unwrap();
        }
        kb.complete();
        for id in empty_before {
            prop_assert!(kb.concept(id).is_empty());
        }
    }
}
