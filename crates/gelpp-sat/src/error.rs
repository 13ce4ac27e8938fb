//! Solver-level errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Reference(#[from] gelpp_core::Error),

    /// A pbox id appears in the graph but the weight vector (or the box)
    /// does not cover it.
    #[error("invalid pbox id {pbox_id}: {supplied} weights supplied, define {} more", .pbox_id + 1 - .supplied)]
    InvalidPboxId { pbox_id: usize, supplied: usize },

    #[error("linear program failed: {0}")]
    LinearProgram(#[from] crate::linprog::LpError),

    #[error("column generation exceeded the iteration cap of {0}")]
    IterationCap(usize),
}
