//! Linear-program boundary for the column-generation driver.
//!
//! The driver only needs `min c·x  s.t.  A x (signs) d, x ≥ 0` together with
//! the dual vector of the row system, so the solver sits behind the
//! [`LpSolver`] trait. [`SimplexSolver`] is the bundled implementation: a
//! dense two-phase primal simplex with Bland's anti-cycling rule. Duals are
//! recovered from the final basis by solving `Bᵀ y = c_B`, so for every row
//! `y_i` is the marginal cost of its right-hand side and `cost = y · d` at
//! the optimum.

use gelpp_core::Sign;
use ndarray::{Array1, Array2};
use thiserror::Error;

/// Optimal point of one master-program solve.
#[derive(Debug, Clone)]
pub struct LpSolution {
    pub x: Array1<f64>,
    /// Row duals, in the caller's row order and sign convention.
    pub y: Array1<f64>,
    pub cost: f64,
}

#[derive(Debug, Error)]
pub enum LpError {
    #[error("linear program is infeasible")]
    Infeasible,
    #[error("linear program is unbounded")]
    Unbounded,
    #[error("numerical failure in the simplex: {0}")]
    Numerical(String),
}

pub trait LpSolver {
    /// Solve `min costs·x  s.t.  coefficients·x (signs) rhs, x ≥ 0`.
    fn solve(
        &self,
        costs: &Array1<f64>,
        coefficients: &Array2<f64>,
        rhs: &Array1<f64>,
        signs: &[Sign],
    ) -> Result<LpSolution, LpError>;
}

/// Dense two-phase primal simplex.
#[derive(Debug, Clone)]
pub struct SimplexSolver {
    pub tolerance: f64,
}

impl Default for SimplexSolver {
    fn default() -> Self {
        SimplexSolver { tolerance: 1e-9 }
    }
}

impl LpSolver for SimplexSolver {
    fn solve(
        &self,
        costs: &Array1<f64>,
        coefficients: &Array2<f64>,
        rhs: &Array1<f64>,
        signs: &[Sign],
    ) -> Result<LpSolution, LpError> {
        let m = coefficients.nrows();
        let n = coefficients.ncols();
        if rhs.len() != m || signs.len() != m || costs.len() != n {
            return Err(LpError::Numerical(format!(
                "shape mismatch: {m}x{n} system with {} rhs, {} signs, {} costs",
                rhs.len(),
                signs.len(),
                costs.len()
            )));
        }

        // Standard form wants non-negative right-hand sides; negated rows
        // flip their comparison here and their dual component on the way out.
        let mut rows: Vec<Vec<f64>> = (0..m).map(|i| coefficients.row(i).to_vec()).collect();
        let mut b: Vec<f64> = rhs.to_vec();
        let mut row_signs: Vec<Sign> = signs.to_vec();
        let mut flipped = vec![false; m];
        for i in 0..m {
            if b[i] < 0.0 {
                for v in &mut rows[i] {
                    *v = -*v;
                }
                b[i] = -b[i];
                row_signs[i] = match row_signs[i] {
                    Sign::Le => Sign::Ge,
                    Sign::Ge => Sign::Le,
                    Sign::Eq => Sign::Eq,
                };
                flipped[i] = true;
            }
        }

        // Column layout: structural, then slack/surplus, then artificials.
        let mut total = n;
        let mut slack = vec![None; m];
        let mut surplus = vec![None; m];
        let mut artificial = vec![None; m];
        for i in 0..m {
            match row_signs[i] {
                Sign::Le => {
                    slack[i] = Some(total);
                    total += 1;
                }
                Sign::Ge => {
                    surplus[i] = Some(total);
                    total += 1;
                }
                Sign::Eq => {}
            }
        }
        for i in 0..m {
            if !matches!(row_signs[i], Sign::Le) {
                artificial[i] = Some(total);
                total += 1;
            }
        }

        // Standardized matrix, kept pristine for the dual solve.
        let mut full = vec![vec![0.0; total]; m];
        for i in 0..m {
            full[i][..n].copy_from_slice(&rows[i]);
            if let Some(j) = slack[i] {
                full[i][j] = 1.0;
            }
            if let Some(j) = surplus[i] {
                full[i][j] = -1.0;
            }
            if let Some(j) = artificial[i] {
                full[i][j] = 1.0;
            }
        }
        let is_artificial: Vec<bool> = (0..total)
            .map(|j| artificial.iter().any(|&a| a == Some(j)))
            .collect();

        // Tableau rows carry the right-hand side in the last column.
        let mut tableau: Vec<Vec<f64>> = full
            .iter()
            .zip(&b)
            .map(|(row, &bi)| {
                let mut t = row.clone();
                t.push(bi);
                t
            })
            .collect();
        let mut basis: Vec<usize> = (0..m)
            .map(|i| artificial[i].or(slack[i]).expect("row without basic column"))
            .collect();

        if is_artificial.iter().any(|&a| a) {
            let phase1: Vec<f64> = is_artificial
                .iter()
                .map(|&a| if a { 1.0 } else { 0.0 })
                .collect();
            self.iterate(&mut tableau, &mut basis, &phase1, &vec![false; total])?;
            let infeasibility: f64 = basis
                .iter()
                .enumerate()
                .filter(|&(_, &j)| is_artificial[j])
                .map(|(i, _)| tableau[i][total])
                .sum();
            if infeasibility > self.tolerance {
                return Err(LpError::Infeasible);
            }
            // Drive leftover artificials out of the basis where a pivot
            // exists; rows where none does are redundant and keep a zero
            // artificial.
            for i in 0..m {
                if is_artificial[basis[i]] {
                    let pivot_col = (0..total)
                        .find(|&j| !is_artificial[j] && tableau[i][j].abs() > self.tolerance);
                    if let Some(j) = pivot_col {
                        Self::pivot(&mut tableau, &mut basis, i, j);
                    }
                }
            }
        }

        let phase2: Vec<f64> = (0..total)
            .map(|j| if j < n { costs[j] } else { 0.0 })
            .collect();
        self.iterate(&mut tableau, &mut basis, &phase2, &is_artificial)?;

        let mut x = Array1::zeros(n);
        for (i, &j) in basis.iter().enumerate() {
            if j < n {
                x[j] = tableau[i][total];
            }
        }
        let cost = costs.dot(&x);

        // Bᵀ y = c_B over the standardized basis columns.
        let mut system = vec![vec![0.0; m + 1]; m];
        for (r, row) in system.iter_mut().enumerate() {
            for c in 0..m {
                row[c] = full[c][basis[r]];
            }
            row[m] = phase2[basis[r]];
        }
        let mut y = solve_square(system, self.tolerance);
        for i in 0..m {
            if flipped[i] {
                y[i] = -y[i];
            }
        }

        Ok(LpSolution {
            x,
            y: Array1::from(y),
            cost,
        })
    }
}

impl SimplexSolver {
    /// Run the simplex to optimality for one phase. Bland's rule: entering
    /// column is the lowest index with a negative reduced cost, leaving row
    /// breaks ratio ties by lowest basis index.
    fn iterate(
        &self,
        tableau: &mut [Vec<f64>],
        basis: &mut [usize],
        costs: &[f64],
        barred: &[bool],
    ) -> Result<(), LpError> {
        let m = tableau.len();
        let total = costs.len();
        let cap = 64 * (total + m) * (total + m).max(4);
        for _ in 0..cap {
            let mut entering = None;
            for j in 0..total {
                if barred[j] || basis.contains(&j) {
                    continue;
                }
                let mut reduced = costs[j];
                for i in 0..m {
                    reduced -= costs[basis[i]] * tableau[i][j];
                }
                if reduced < -self.tolerance {
                    entering = Some(j);
                    break;
                }
            }
            let Some(enter) = entering else {
                return Ok(());
            };

            let mut leave: Option<usize> = None;
            let mut best = f64::INFINITY;
            for i in 0..m {
                if tableau[i][enter] > self.tolerance {
                    let ratio = tableau[i][total] / tableau[i][enter];
                    let tie = (ratio - best).abs() <= self.tolerance;
                    if ratio < best - self.tolerance
                        || (tie && leave.is_some_and(|l| basis[i] < basis[l]))
                    {
                        if ratio < best {
                            best = ratio;
                        }
                        leave = Some(i);
                    }
                }
            }
            let Some(l) = leave else {
                return Err(LpError::Unbounded);
            };
            Self::pivot(tableau, basis, l, enter);
        }
        Err(LpError::Numerical("simplex did not converge".into()))
    }

    fn pivot(tableau: &mut [Vec<f64>], basis: &mut [usize], row: usize, col: usize) {
        let p = tableau[row][col];
        for v in &mut tableau[row] {
            *v /= p;
        }
        let pivot_row = tableau[row].clone();
        for (i, r) in tableau.iter_mut().enumerate() {
            if i == row {
                continue;
            }
            let factor = r[col];
            if factor != 0.0 {
                for (v, &pv) in r.iter_mut().zip(&pivot_row) {
                    *v -= factor * pv;
                }
            }
        }
        basis[row] = col;
    }
}

/// Gauss-Jordan solve of an m×m system in augmented form. Columns without a
/// usable pivot (redundant basis rows) get a zero component.
fn solve_square(mut a: Vec<Vec<f64>>, tolerance: f64) -> Vec<f64> {
    let m = a.len();
    let mut pivot_row_of = vec![None; m];
    let mut next_row = 0;
    for col in 0..m {
        let pivot = (next_row..m)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .filter(|&i| a[i][col].abs() > tolerance);
        let Some(p) = pivot else {
            continue;
        };
        a.swap(next_row, p);
        let pv = a[next_row][col];
        for v in &mut a[next_row] {
            *v /= pv;
        }
        let pivot_values = a[next_row].clone();
        for (i, r) in a.iter_mut().enumerate() {
            if i == next_row {
                continue;
            }
            let factor = r[col];
            if factor != 0.0 {
                for (v, &pv) in r.iter_mut().zip(&pivot_values) {
                    *v -= factor * pv;
                }
            }
        }
        pivot_row_of[col] = Some(next_row);
        next_row += 1;
        if next_row == m {
            break;
        }
    }
    (0..m)
        .map(|col| pivot_row_of[col].map_or(0.0, |r| a[r][m]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn solve(
        costs: Vec<f64>,
        coefficients: Vec<Vec<f64>>,
        rhs: Vec<f64>,
        signs: Vec<Sign>,
    ) -> Result<LpSolution, LpError> {
        let m = coefficients.len();
        let n = costs.len();
        let flat: Vec<f64> = coefficients.into_iter().flatten().collect();
        SimplexSolver::default().solve(
            &Array1::from(costs),
            &Array2::from_shape_vec((m, n), flat).unwrap(),
            &Array1::from(rhs),
            &signs,
        )
    }

    #[test]
    fn solves_an_equality_system_with_duals() {
        let lp = solve(
            vec![1.0, 1.0],
            vec![vec![1.0, 1.0], vec![1.0, -1.0]],
            vec![1.0, 0.0],
            vec![Sign::Eq, Sign::Eq],
        )
        .unwrap();
        assert_abs_diff_eq!(lp.cost, 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(lp.x[0], 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(lp.x[1], 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(lp.y[0], 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(lp.y[1], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn maximizes_through_negated_costs() {
        let lp = solve(
            vec![-1.0, -1.0],
            vec![vec![1.0, 2.0], vec![0.0, 1.0]],
            vec![4.0, 1.0],
            vec![Sign::Le, Sign::Le],
        )
        .unwrap();
        assert_abs_diff_eq!(lp.cost, -4.0, epsilon = 1e-9);
        assert_abs_diff_eq!(lp.x[0], 4.0, epsilon = 1e-9);
        assert_abs_diff_eq!(lp.x[1], 0.0, epsilon = 1e-9);
        // Marginal costs of the two right-hand sides.
        assert_abs_diff_eq!(lp.y[0], -1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(lp.y[1], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn negative_rhs_rows_keep_their_dual_sign() {
        // -x <= -2 is x >= 2; the dual must refer to the caller's row.
        let lp = solve(
            vec![1.0],
            vec![vec![-1.0]],
            vec![-2.0],
            vec![Sign::Le],
        )
        .unwrap();
        assert_abs_diff_eq!(lp.cost, 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(lp.x[0], 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(lp.y[0] * -2.0, lp.cost, epsilon = 1e-9);
    }

    #[test]
    fn reports_infeasible_systems() {
        let result = solve(
            vec![1.0],
            vec![vec![1.0], vec![1.0]],
            vec![1.0, 2.0],
            vec![Sign::Eq, Sign::Eq],
        );
        assert!(matches!(result, Err(LpError::Infeasible)));
    }

    #[test]
    fn reports_unbounded_programs() {
        let result = solve(vec![-1.0], vec![vec![1.0]], vec![1.0], vec![Sign::Ge]);
        assert!(matches!(result, Err(LpError::Unbounded)));
    }

    #[test]
    fn strong_duality_holds_at_the_optimum() {
        let costs = array![2.0, 3.0, 0.0];
        let coefficients = array![[1.0, 1.0, 1.0], [2.0, 1.0, 0.0]];
        let rhs = array![4.0, 5.0];
        let signs = [Sign::Eq, Sign::Ge];
        let lp = SimplexSolver::default()
            .solve(&costs, &coefficients, &rhs, &signs)
            .unwrap();
        assert_abs_diff_eq!(lp.y.dot(&rhs), lp.cost, epsilon = 1e-8);
    }
}
