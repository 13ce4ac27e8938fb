//! Column-generation driver for probabilistic satisfiability.
//!
//! The master program asks for a convex combination of consistent worlds
//! whose axiom marginals satisfy the probability box. Its row system is
//! `[marginal rows; box rows; convexity row]`: one artificial column per row
//! (cost 1), one structural column per marginal (cost 0), and one zero-cost
//! column per generated world. The knowledge base is satisfiable exactly
//! when the artificial mass can be driven to zero.
//!
//! Worlds enter one at a time: the row duals of the current optimum price
//! the uncertain axioms, the min-cut oracle finds the consistent world of
//! maximum kept weight, and the loop stops when the optimum hits zero cost
//! or no world can improve it.

use crate::error::Error;
use crate::linprog::{LpSolution, LpSolver, SimplexSolver};
use crate::max_sat;
use gelpp_core::{ProbabilisticKnowledgeBase, Sign};
use ndarray::{s, Array1, Array2};
use std::collections::BTreeSet;

/// Cost and constraint tolerance of the driver.
pub const EPSILON: f64 = 1e-7;

#[derive(Debug, Clone)]
pub struct SolverOptions {
    /// Cap on generated columns; `None` runs to convergence.
    pub max_iterations: Option<usize>,
}

impl Default for SolverOptions {
    fn default() -> Self {
        SolverOptions {
            max_iterations: Some(10_000),
        }
    }
}

/// Verdict of one satisfiability run. The final LP optimum is kept for
/// satisfiable outcomes; its structural block holds the axiom marginals.
#[derive(Debug, Clone)]
pub struct SatResult {
    pub satisfiable: bool,
    pub lp: Option<LpSolution>,
}

pub fn is_satisfiable(kb: &ProbabilisticKnowledgeBase) -> Result<bool, Error> {
    Ok(solve(kb)?.satisfiable)
}

pub fn solve(kb: &ProbabilisticKnowledgeBase) -> Result<SatResult, Error> {
    solve_with(kb, &SimplexSolver::default(), &SolverOptions::default())
}

pub fn solve_with(
    kb: &ProbabilisticKnowledgeBase,
    lp: &dyn LpSolver,
    options: &SolverOptions,
) -> Result<SatResult, Error> {
    if kb.kb.has_path_init_to_bot() {
        tracing::debug!("certain part of the ontology is inconsistent");
        return Ok(SatResult {
            satisfiable: false,
            lp: None,
        });
    }

    let n = kb.n();
    let m = n + kb.k() + 1;
    let mut columns = initial_columns(kb);
    let mut costs: Vec<f64> = vec![1.0; m];
    costs.extend(std::iter::repeat(0.0).take(n));
    let rhs = master_rhs(kb);
    let signs = master_signs(kb);

    let mut solution = lp.solve(&Array1::from(costs.clone()), &columns, &rhs, &signs)?;
    let mut iteration = 0usize;
    while solution.cost.abs() > EPSILON {
        if let Some(cap) = options.max_iterations {
            if iteration >= cap {
                return Err(Error::IterationCap(cap));
            }
        }
        let Some(column) = generate_column(kb, &solution.y)? else {
            tracing::debug!(iteration, cost = solution.cost, "no improving world column");
            return Ok(SatResult {
                satisfiable: false,
                lp: None,
            });
        };
        tracing::trace!(iteration, cost = solution.cost, "appending world column");
        columns
            .push_column(column.view())
            .expect("master matrix column extension");
        costs.push(0.0);
        solution = lp.solve(&Array1::from(costs.clone()), &columns, &rhs, &signs)?;
        iteration += 1;
    }
    tracing::debug!(iterations = iteration, "master program reached zero cost");
    debug_assert!(within_tolerance(&columns, &solution.x, &rhs, &signs));
    Ok(SatResult {
        satisfiable: true,
        lp: Some(solution),
    })
}

/// Artificial identity block, then one structural column per marginal with
/// `-1` in its own row and its box coefficients below.
fn initial_columns(kb: &ProbabilisticKnowledgeBase) -> Array2<f64> {
    let n = kb.n();
    let k = kb.k();
    let m = n + k + 1;
    let mut columns = Array2::zeros((m, m + n));
    for i in 0..m {
        columns[[i, i]] = 1.0;
    }
    for j in 0..n {
        columns[[j, m + j]] = -1.0;
        for row in 0..k {
            columns[[n + row, m + j]] = kb.a[[row, j]];
        }
    }
    columns
}

fn master_rhs(kb: &ProbabilisticKnowledgeBase) -> Array1<f64> {
    let mut rhs = vec![0.0; kb.n()];
    rhs.extend(kb.b.iter().copied());
    rhs.push(1.0);
    Array1::from(rhs)
}

fn master_signs(kb: &ProbabilisticKnowledgeBase) -> Vec<Sign> {
    let mut signs = vec![Sign::Eq; kb.n()];
    signs.extend(kb.signs.iter().copied());
    signs.push(Sign::Eq);
    signs
}

/// Price the axioms with the marginal-row duals and ask the oracle for the
/// best consistent world. `None` means no world can improve the master:
/// either every world is inconsistent, or the candidate's reduced cost is
/// non-negative.
fn generate_column(
    kb: &ProbabilisticKnowledgeBase,
    duals: &Array1<f64>,
) -> Result<Option<Array1<f64>>, Error> {
    let n = kb.n();
    let weights = duals.slice(s![..n]).to_vec();
    let outcome = max_sat::solve(&kb.kb, &weights)?;
    if !outcome.success {
        return Ok(None);
    }
    let column = world_column(kb, &outcome.prob_axiom_indexes);
    // The column has zero cost, so its reduced cost is -duals·column.
    if duals.dot(&column) <= EPSILON {
        return Ok(None);
    }
    Ok(Some(column))
}

/// Indicator of the kept axioms, zeros through the box rows, one in the
/// convexity row.
fn world_column(kb: &ProbabilisticKnowledgeBase, dropped: &BTreeSet<usize>) -> Array1<f64> {
    let n = kb.n();
    let k = kb.k();
    let mut column = Array1::zeros(n + k + 1);
    for j in 0..n {
        if !dropped.contains(&j) {
            column[j] = 1.0;
        }
    }
    column[n + k] = 1.0;
    column
}

fn within_tolerance(
    columns: &Array2<f64>,
    x: &Array1<f64>,
    rhs: &Array1<f64>,
    signs: &[Sign],
) -> bool {
    let product = columns.dot(x);
    signs.iter().enumerate().all(|(i, sign)| match sign {
        Sign::Le => product[i] <= rhs[i] + EPSILON / 2.0,
        Sign::Ge => product[i] >= rhs[i] - EPSILON / 2.0,
        Sign::Eq => (product[i] - rhs[i]).abs() <= EPSILON / 2.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gelpp_core::gel::{KnowledgeBase, IS_A_IRI};

    #[test]
    fn empty_ontology_is_satisfiable() {
        let pkb = ProbabilisticKnowledgeBase::new(KnowledgeBase::new("bot", "top"));
        assert!(is_satisfiable(&pkb).unwrap());
    }

    #[test]
    fn forced_inconsistent_axiom_is_unsatisfiable() {
        let mut kb = KnowledgeBase::new("bot", "top");
        kb.add_concept("B");
        kb.add_individual("a");
        kb.add_axiom("a", "B", IS_A_IRI, None).unwrap();
        kb.add_axiom("B", "bot", IS_A_IRI, Some(0)).unwrap();
        kb.complete();
        let mut pkb = ProbabilisticKnowledgeBase::new(kb);
        pkb.push_restriction(&[(0, 1.0)], Sign::Eq, 1.0);
        assert!(!is_satisfiable(&pkb).unwrap());
    }

    #[test]
    fn box_constraints_mix_worlds_into_feasibility() {
        let mut kb = KnowledgeBase::new("bot", "top");
        for iri in ["C", "D", "E", "F"] {
            kb.add_concept(iri);
        }
        kb.add_axiom("C", "D", IS_A_IRI, Some(0)).unwrap();
        kb.add_axiom("E", "F", IS_A_IRI, Some(1)).unwrap();
        kb.complete();
        let mut pkb = ProbabilisticKnowledgeBase::new(kb);
        pkb.push_restriction(&[(0, 1.0)], Sign::Le, 0.5);
        pkb.push_restriction(&[(1, 1.0)], Sign::Ge, 0.3);

        let result = solve(&pkb).unwrap();
        assert!(result.satisfiable);
        let lp = result.lp.unwrap();
        let m = pkb.n() + pkb.k() + 1;
        assert!(lp.x[m] <= 0.5 + EPSILON);
        assert!(lp.x[m + 1] >= 0.3 - EPSILON);
    }

    #[test]
    fn certain_inconsistency_short_circuits() {
        let mut kb = KnowledgeBase::new("bot", "top");
        kb.add_individual("a");
        kb.add_axiom("a", "bot", IS_A_IRI, None).unwrap();
        kb.complete();
        let pkb = ProbabilisticKnowledgeBase::new(kb);
        let result = solve(&pkb).unwrap();
        assert!(!result.satisfiable);
        assert!(result.lp.is_none());
    }

    #[test]
    fn existential_inconsistency_reaches_the_verdict() {
        // a has an r-successor in {b}, b is a B, and ∃r.B is empty.
        let mut kb = KnowledgeBase::new("bot", "top");
        kb.add_concept("B");
        kb.add_individual("a");
        kb.add_individual("b");
        kb.add_role("r");
        kb.add_axiom("a", "b", "r", None).unwrap();
        kb.add_axiom("b", "B", IS_A_IRI, None).unwrap();
        let head = kb.add_existential_concept("r", "B").unwrap();
        let head_iri = kb.concept(head).iri().to_string();
        kb.add_axiom(&head_iri, "bot", IS_A_IRI, None).unwrap();
        kb.complete();
        let pkb = ProbabilisticKnowledgeBase::new(kb);
        assert!(!is_satisfiable(&pkb).unwrap());
    }

    #[test]
    fn uncertain_existential_link_is_cuttable() {
        let build = |value: f64, sign: Sign| {
            let mut kb = KnowledgeBase::new("bot", "top");
            kb.add_concept("B");
            kb.add_individual("a");
            kb.add_individual("b");
            kb.add_role("r");
            kb.add_axiom("a", "b", "r", None).unwrap();
            kb.add_axiom("b", "B", IS_A_IRI, Some(0)).unwrap();
            let head = kb.add_existential_concept("r", "B").unwrap();
            let head_iri = kb.concept(head).iri().to_string();
            kb.add_axiom(&head_iri, "bot", IS_A_IRI, None).unwrap();
            kb.complete();
            let mut pkb = ProbabilisticKnowledgeBase::new(kb);
            pkb.push_restriction(&[(0, 1.0)], sign, value);
            pkb
        };
        assert!(!is_satisfiable(&build(1.0, Sign::Eq)).unwrap());
        assert!(is_satisfiable(&build(0.4, Sign::Le)).unwrap());
    }

    #[test]
    fn iteration_cap_is_enforced() {
        let pkb = ProbabilisticKnowledgeBase::new(KnowledgeBase::new("bot", "top"));
        let options = SolverOptions {
            max_iterations: Some(0),
        };
        let result = solve_with(&pkb, &SimplexSolver::default(), &options);
        assert!(matches!(result, Err(Error::IterationCap(0))));
    }
}
