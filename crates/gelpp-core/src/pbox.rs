//! The probability box: linear constraints over the marginal probabilities
//! of a knowledge base's uncertain axioms.
//!
//! A box is `A · p (signs) b` where `p` is the vector of marginals indexed by
//! pbox id, `A` is a dense k×n coefficient matrix, `b` a length-k right-hand
//! side and `signs` one comparison per row. Restrictions arrive from the
//! loader as sparse `(column, coefficient)` term lists.

use crate::gel::{Error, KnowledgeBase};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Per-row comparison of a linear restriction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sign {
    Le,
    Eq,
    Ge,
}

impl fmt::Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Sign::Le => "<=",
            Sign::Eq => "==",
            Sign::Ge => ">=",
        })
    }
}

impl FromStr for Sign {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "<=" => Ok(Sign::Le),
            "==" | "=" => Ok(Sign::Eq),
            ">=" | "=>" => Ok(Sign::Ge),
            other => Err(format!("unknown restriction sign: {other:?}")),
        }
    }
}

/// One sparse restriction row: `Σ coefficient · P(axiom) (sign) value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PboxRestriction {
    pub terms: Vec<(usize, f64)>,
    pub sign: Sign,
    pub value: f64,
}

/// A knowledge base together with its probability box.
#[derive(Debug, Clone)]
pub struct ProbabilisticKnowledgeBase {
    pub kb: KnowledgeBase,
    /// k×n coefficient matrix over the uncertain-axiom marginals.
    pub a: Array2<f64>,
    pub b: Array1<f64>,
    pub signs: Vec<Sign>,
}

impl ProbabilisticKnowledgeBase {
    /// Wrap a knowledge base with an empty box.
    pub fn new(kb: KnowledgeBase) -> Self {
        let n = kb.uncertain_axiom_count();
        ProbabilisticKnowledgeBase {
            kb,
            a: Array2::zeros((0, n)),
            b: Array1::zeros(0),
            signs: Vec::new(),
        }
    }

    /// Assemble the dense box from sparse loader restrictions. The column
    /// space covers every registered pbox id and every id a restriction
    /// mentions.
    pub fn from_restrictions(kb: KnowledgeBase, restrictions: &[PboxRestriction]) -> Self {
        let n = restrictions
            .iter()
            .flat_map(|r| r.terms.iter().map(|&(col, _)| col + 1))
            .chain([kb.uncertain_axiom_count()])
            .max()
            .unwrap_or(0);
        let k = restrictions.len();
        let mut a = Array2::zeros((k, n));
        let mut b = Array1::zeros(k);
        let mut signs = Vec::with_capacity(k);
        for (row, restriction) in restrictions.iter().enumerate() {
            for &(col, coefficient) in &restriction.terms {
                a[[row, col]] += coefficient;
            }
            b[row] = restriction.value;
            signs.push(restriction.sign);
        }
        ProbabilisticKnowledgeBase { kb, a, b, signs }
    }

    /// Number of uncertain axioms (columns of the box).
    pub fn n(&self) -> usize {
        self.a.ncols()
    }

    /// Number of restrictions (rows of the box).
    pub fn k(&self) -> usize {
        self.a.nrows()
    }

    /// Register `sub ⊑_role sup` as an uncertain axiom and return the box
    /// column tracking its marginal. Reuses the existing column when the
    /// axiom is already uncertain. When the arrow is already present as a
    /// certain (or derived) axiom the duplicate insertion registers nothing
    /// — the fresh column still exists, and every world keeps it, pinning
    /// its marginal to 1.
    pub fn add_uncertain_axiom(
        &mut self,
        sub_iri: &str,
        sup_iri: &str,
        role_iri: &str,
    ) -> Result<usize, Error> {
        let sub = self.kb.concept_id(sub_iri)?;
        let sup = self.kb.concept_id(sup_iri)?;
        let role = self.kb.role_id(role_iri)?;
        if let Some((&id, _)) = self
            .kb
            .pbox_axioms()
            .iter()
            .find(|(_, ax)| ax.sub == sub && ax.sup == sup && ax.role == role)
        {
            return Ok(id);
        }
        let id = self.n();
        self.kb.add_axiom_ids(sub, sup, role, Some(id));
        self.a
            .push_column(Array1::zeros(self.k()).view())
            .expect("pbox matrix column extension");
        Ok(id)
    }

    /// Append a restriction row to the box.
    pub fn push_restriction(&mut self, terms: &[(usize, f64)], sign: Sign, value: f64) {
        let mut row = Array1::zeros(self.n());
        for &(col, coefficient) in terms {
            row[col] += coefficient;
        }
        self.a
            .push_row(row.view())
            .expect("pbox matrix row extension");
        let mut b = self.b.to_vec();
        b.push(value);
        self.b = Array1::from_vec(b);
        self.signs.push(sign);
    }

    /// Rewrite the sign and right-hand side of the last restriction row.
    /// Used by the bound search to sweep one threshold.
    pub fn set_last_restriction(&mut self, sign: Sign, value: f64) {
        let k = self.k();
        assert!(k > 0, "no restriction row to rewrite");
        self.b[k - 1] = value;
        self.signs[k - 1] = sign;
    }
}
