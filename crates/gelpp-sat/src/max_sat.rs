//! Weighted MAX-SAT pricing oracle.
//!
//! A world (a subset of the uncertain axioms) is consistent exactly when the
//! graph it induces has no path from `init` to `⊥`. Finding the best
//! consistent world for a weight vector therefore reduces to a minimum s-t
//! cut: every non-derived arrow becomes a directed edge, certain arrows get
//! infinite capacity, uncertain ones the weight of their pbox column. The
//! axioms under the cut are dropped, everything else is kept.
//!
//! Negative-weight axioms never pay for themselves: they are excluded from
//! the graph up front and always reported as dropped.

use crate::error::Error;
use gelpp_core::gel::KnowledgeBase;
use std::collections::{BTreeSet, HashMap, VecDeque};

/// One minimum cut: the uncertain axioms under it, and whether a certain
/// edge crosses it (the cut is then effectively infinite).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CutSet {
    pub has_infinite_weight: bool,
    pub axiom_indexes: BTreeSet<usize>,
}

/// Oracle verdict for one weight vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingOutcome {
    /// False when no finite cut exists, i.e. every world is inconsistent.
    pub success: bool,
    /// Axioms to drop from the world.
    pub prob_axiom_indexes: BTreeSet<usize>,
}

/// Find the cheapest set of uncertain axioms whose removal disconnects
/// `init` from `⊥` under the given per-axiom weights.
pub fn solve(kb: &KnowledgeBase, weights: &[f64]) -> Result<PricingOutcome, Error> {
    let graph = WeightedGraph::build(kb, weights)?;
    let cut = graph.min_cut();
    if cut.has_infinite_weight {
        return Ok(PricingOutcome {
            success: false,
            prob_axiom_indexes: BTreeSet::new(),
        });
    }
    Ok(PricingOutcome {
        success: true,
        prob_axiom_indexes: cut.axiom_indexes,
    })
}

struct Edge {
    to: usize,
    capacity: f64,
    pbox_id: Option<usize>,
}

/// The flow network induced by a knowledge base and a weight vector.
pub struct WeightedGraph {
    order: usize,
    source: usize,
    sink: usize,
    edges: Vec<Vec<Edge>>,
    negative: BTreeSet<usize>,
}

impl WeightedGraph {
    /// One edge per non-derived arrow; self-loops carry no flow and are
    /// skipped.
    pub fn build(kb: &KnowledgeBase, weights: &[f64]) -> Result<Self, Error> {
        let order = kb.concept_count();
        let mut edges: Vec<Vec<Edge>> = (0..order).map(|_| Vec::new()).collect();
        let mut negative = BTreeSet::new();
        for (id, concept) in kb.concepts() {
            for arrow in concept.sup_arrows() {
                if arrow.derived || arrow.target == id {
                    continue;
                }
                let capacity = match arrow.pbox_id {
                    None => f64::INFINITY,
                    Some(p) => {
                        let w = *weights.get(p).ok_or(Error::InvalidPboxId {
                            pbox_id: p,
                            supplied: weights.len(),
                        })?;
                        if w < 0.0 {
                            negative.insert(p);
                            continue;
                        }
                        w
                    }
                };
                edges[id.index()].push(Edge {
                    to: arrow.target.index(),
                    capacity,
                    pbox_id: arrow.pbox_id,
                });
            }
        }
        Ok(WeightedGraph {
            order,
            source: kb.init().index(),
            sink: kb.bottom().index(),
            edges,
            negative,
        })
    }

    /// Edmonds-Karp max flow, then the cut is read off the residual
    /// reachability of the source. An augmenting path whose bottleneck is
    /// infinite short-circuits: no finite cut exists.
    pub fn min_cut(&self) -> CutSet {
        let mut residual: Vec<HashMap<usize, f64>> = vec![HashMap::new(); self.order];
        for (u, out) in self.edges.iter().enumerate() {
            for e in out {
                *residual[u].entry(e.to).or_insert(0.0) += e.capacity;
            }
        }

        while let Some(path) = self.augmenting_path(&residual) {
            let bottleneck = path
                .iter()
                .map(|&(u, v)| residual[u][&v])
                .fold(f64::INFINITY, f64::min);
            if bottleneck.is_infinite() {
                return CutSet {
                    has_infinite_weight: true,
                    axiom_indexes: self.negative.clone(),
                };
            }
            for &(u, v) in &path {
                *residual[u].get_mut(&v).expect("forward residual entry") -= bottleneck;
                *residual[v].entry(u).or_insert(0.0) += bottleneck;
            }
        }

        let mut visited = vec![false; self.order];
        let mut queue = VecDeque::from([self.source]);
        visited[self.source] = true;
        while let Some(u) = queue.pop_front() {
            for (&v, &cap) in &residual[u] {
                if cap > 0.0 && !visited[v] {
                    visited[v] = true;
                    queue.push_back(v);
                }
            }
        }

        let mut cut = CutSet {
            has_infinite_weight: false,
            axiom_indexes: self.negative.clone(),
        };
        for (u, out) in self.edges.iter().enumerate() {
            for e in out {
                if visited[u] && !visited[e.to] {
                    match e.pbox_id {
                        Some(p) => {
                            cut.axiom_indexes.insert(p);
                        }
                        None => cut.has_infinite_weight = true,
                    }
                }
            }
        }
        cut
    }

    /// Shortest augmenting path over positive residual capacity, as a list
    /// of `(from, to)` hops.
    fn augmenting_path(&self, residual: &[HashMap<usize, f64>]) -> Option<Vec<(usize, usize)>> {
        let mut parent: Vec<Option<usize>> = vec![None; self.order];
        let mut queue = VecDeque::from([self.source]);
        parent[self.source] = Some(self.source);
        while let Some(u) = queue.pop_front() {
            if u == self.sink {
                break;
            }
            for (&v, &cap) in &residual[u] {
                if cap > 0.0 && parent[v].is_none() {
                    parent[v] = Some(u);
                    queue.push_back(v);
                }
            }
        }
        parent[self.sink]?;
        let mut path = Vec::new();
        let mut v = self.sink;
        while v != self.source {
            let u = parent[v].expect("BFS parent chain");
            path.push((u, v));
            v = u;
        }
        path.reverse();
        Some(path)
    }
}
