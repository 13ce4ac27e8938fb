//! Probabilistic EL++ satisfiability.
//!
//! Decides whether a knowledge base with a probability box admits a
//! probability distribution over consistent worlds matching the box, by
//! column generation over a small master LP:
//!
//! - `max_sat`: the weighted min-cut pricing oracle over the subsumption
//!   graph.
//! - `linprog`: the [`LpSolver`] boundary and the bundled dense two-phase
//!   simplex.
//! - `solver`: the column-generation driver.
//! - `bounds`: tight probability bounds for a query axiom, by binary search
//!   over satisfiability.

pub mod bounds;
pub mod error;
pub mod linprog;
pub mod max_sat;
pub mod solver;

pub use bounds::ProbabilityBounds;
pub use error::Error;
pub use linprog::{LpError, LpSolution, LpSolver, SimplexSolver};
pub use max_sat::{CutSet, PricingOutcome};
pub use solver::{is_satisfiable, solve, solve_with, SatResult, SolverOptions, EPSILON};
