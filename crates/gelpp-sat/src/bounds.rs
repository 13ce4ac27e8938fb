//! Tight probability bounds for a query axiom.
//!
//! The query is registered as one more uncertain axiom and its marginal is
//! pinned by a fresh box row. The set of feasible marginals is an interval
//! (mixtures of world distributions are closed under convex combination), so
//! each endpoint falls to a binary search over satisfiability: the lower
//! bound sweeps `p ≤ v`, the upper `p ≥ v`, halving until the interval is
//! below the driver tolerance.

use crate::error::Error;
use crate::solver::{self, EPSILON};
use gelpp_core::{ProbabilisticKnowledgeBase, Sign};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbabilityBounds {
    pub lower: f64,
    pub upper: f64,
}

/// Tightest `[lower, upper]` interval for `P(sub ⊑_role sup)` consistent
/// with the knowledge base, or `None` when the base itself is
/// unsatisfiable. An axiom already entailed by the certain part comes back
/// as `[1, 1]`; one inconsistent with it as `[0, 0]`.
pub fn compute(
    kb: &ProbabilisticKnowledgeBase,
    sub_iri: &str,
    sup_iri: &str,
    role_iri: &str,
) -> Result<Option<ProbabilityBounds>, Error> {
    let mut kb = kb.clone();
    if !solver::is_satisfiable(&kb)? {
        return Ok(None);
    }
    let column = kb.add_uncertain_axiom(sub_iri, sup_iri, role_iri)?;
    kb.push_restriction(&[(column, 1.0)], Sign::Eq, 0.0);
    let lower = search_lower(&mut kb)?;
    let upper = search_upper(&mut kb)?;
    Ok(Some(ProbabilityBounds { lower, upper }))
}

fn halving_steps() -> usize {
    EPSILON.log2().abs().ceil() as usize
}

fn search_lower(kb: &mut ProbabilisticKnowledgeBase) -> Result<f64, Error> {
    kb.set_last_restriction(Sign::Le, 0.0);
    if solver::is_satisfiable(kb)? {
        return Ok(0.0);
    }
    let (mut lo, mut hi) = (0.0, 1.0);
    for _ in 0..halving_steps() {
        let mid = (lo + hi) / 2.0;
        kb.set_last_restriction(Sign::Le, mid);
        if solver::is_satisfiable(kb)? {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    Ok(hi)
}

fn search_upper(kb: &mut ProbabilisticKnowledgeBase) -> Result<f64, Error> {
    kb.set_last_restriction(Sign::Ge, 1.0);
    if solver::is_satisfiable(kb)? {
        return Ok(1.0);
    }
    let (mut lo, mut hi) = (0.0, 1.0);
    for _ in 0..halving_steps() {
        let mid = (lo + hi) / 2.0;
        kb.set_last_restriction(Sign::Ge, mid);
        if solver::is_satisfiable(kb)? {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    Ok(lo)
}
