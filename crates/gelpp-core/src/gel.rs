//! Graphic EL++: concepts, roles, arrows and the completion engine.
//!
//! The ontology is a directed multigraph over concepts. An arrow
//! `C ⊑_r D` encodes the axiom `C ⊑ ∃r.D` when `r` is an ordinary role, and
//! plain subsumption `C ⊑ D` when `r` is the distinguished is-a role. Every
//! arrow is mirrored on both endpoints (outgoing on the source, incoming on
//! the target); the two halves are inserted atomically and deduplicated by
//! `(target, role)` — `pbox_id` and `derived` are metadata, not identity.
//!
//! Closure strategy: the transitivity-shaped rules (is-a propagation, bottom
//! propagation, role hierarchies and chains) fire eagerly on every insertion
//! through an explicit worklist; the two global rules that need graph-wide
//! scans (existential composition, nominal coincidence) run in `complete()`
//! as a fixpoint pass. The arrow space is bounded by
//! `|concepts|² · |roles|` and every step only adds arrows, so both loops
//! terminate.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};
use thiserror::Error;

// ============================================================================
// Handles
// ============================================================================

/// Arena handle for a concept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct ConceptId(u32);

impl ConceptId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Arena handle for a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct RoleId(u32);

impl RoleId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

// ============================================================================
// Graph elements
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConceptKind {
    Basic,
    /// `⊥` — the empty concept.
    Bottom,
    /// `⊤` — the most general concept.
    Top,
    /// A named individual, modelled as a nominal concept linked from `init`.
    Individual,
    /// The head node of an existential restriction `∃role.target`.
    Existential { role: RoleId, target: ConceptId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoleKind {
    Ordinary,
    /// The distinguished is-a role; exactly one role has this kind.
    IsA,
    /// Synthetic role created alongside an existential head node.
    Artificial,
}

/// Outgoing half of an axiom: the source concept is implicit from the owning
/// `sup_arrows` set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arrow {
    pub target: ConceptId,
    pub role: RoleId,
    /// `None` for certain axioms, `Some(i)` for the i-th uncertain axiom.
    pub pbox_id: Option<usize>,
    pub derived: bool,
}

/// Incoming mirror of an [`Arrow`], owned by the target concept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubArrow {
    pub source: ConceptId,
    pub role: RoleId,
    pub pbox_id: Option<usize>,
    pub derived: bool,
}

#[derive(Debug, Clone)]
pub struct Concept {
    iri: String,
    kind: ConceptKind,
    sup_arrows: Vec<Arrow>,
    sub_arrows: Vec<SubArrow>,
    is_empty: bool,
}

impl Concept {
    pub fn iri(&self) -> &str {
        &self.iri
    }

    pub fn kind(&self) -> ConceptKind {
        self.kind
    }

    pub fn sup_arrows(&self) -> &[Arrow] {
        &self.sup_arrows
    }

    pub fn sub_arrows(&self) -> &[SubArrow] {
        &self.sub_arrows
    }

    /// Whether this concept is subsumed by `⊥` in the certain part of the
    /// graph. Monotone: once set it never reverts.
    pub fn is_empty(&self) -> bool {
        self.is_empty
    }

    fn has_arrow(&self, target: ConceptId, role: RoleId) -> bool {
        self.sup_arrows
            .iter()
            .any(|a| a.target == target && a.role == role)
    }
}

#[derive(Debug, Clone)]
pub struct Role {
    iri: String,
    kind: RoleKind,
    /// Every `(sub, sup)` pair inserted with this role, in insertion order.
    /// Used to fire role-hierarchy and chain closure retroactively.
    axioms: Vec<(ConceptId, ConceptId)>,
}

impl Role {
    pub fn iri(&self) -> &str {
        &self.iri
    }

    pub fn kind(&self) -> RoleKind {
        self.kind
    }

    pub fn axioms(&self) -> &[(ConceptId, ConceptId)] {
        &self.axioms
    }
}

/// An uncertain axiom as registered in the pbox column index space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PboxAxiom {
    pub sub: ConceptId,
    pub sup: ConceptId,
    pub role: RoleId,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown concept IRI: {0}")]
    UnknownConcept(String),
    #[error("unknown role IRI: {0}")]
    UnknownRole(String),
}

// ============================================================================
// Knowledge base
// ============================================================================

/// One axiom waiting on the derivation worklist.
#[derive(Debug, Clone, Copy)]
struct Pending {
    sub: ConceptId,
    sup: ConceptId,
    role: RoleId,
    pbox_id: Option<usize>,
    derived: bool,
}

/// The EL++ subsumption graph: arenas of concepts and roles, the
/// distinguished `init`/`top`/`bottom` concepts and `is_a` role, role
/// inclusion tables and the registry of uncertain (pbox) axioms.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    concepts: Vec<Concept>,
    concept_ids: HashMap<String, ConceptId>,
    roles: Vec<Role>,
    role_ids: HashMap<String, RoleId>,

    init: ConceptId,
    bottom: ConceptId,
    top: ConceptId,
    is_a: RoleId,

    role_inclusions: HashMap<RoleId, Vec<RoleId>>,
    chain_inclusions: HashMap<(RoleId, RoleId), Vec<RoleId>>,
    /// `(role, target)` → existential head node `∃role.target`.
    existential_heads: HashMap<(RoleId, ConceptId), ConceptId>,
    pbox_axioms: BTreeMap<usize, PboxAxiom>,
}

pub const INIT_IRI: &str = "init";
pub const IS_A_IRI: &str = "is a";

impl KnowledgeBase {
    pub fn new(bottom_iri: impl Into<String>, top_iri: impl Into<String>) -> Self {
        let mut kb = KnowledgeBase {
            concepts: Vec::new(),
            concept_ids: HashMap::new(),
            roles: Vec::new(),
            role_ids: HashMap::new(),
            init: ConceptId(0),
            bottom: ConceptId(1),
            top: ConceptId(2),
            is_a: RoleId(0),
            role_inclusions: HashMap::new(),
            chain_inclusions: HashMap::new(),
            existential_heads: HashMap::new(),
            pbox_axioms: BTreeMap::new(),
        };
        kb.init = kb.push_concept(INIT_IRI.to_string(), ConceptKind::Basic);
        kb.bottom = kb.push_concept(bottom_iri.into(), ConceptKind::Bottom);
        kb.top = kb.push_concept(top_iri.into(), ConceptKind::Top);
        kb.concepts[kb.bottom.index()].is_empty = true;
        kb.is_a = kb.push_role(IS_A_IRI.to_string(), RoleKind::IsA);
        let (init, top, is_a) = (kb.init, kb.top, kb.is_a);
        kb.enqueue_axiom(Pending {
            sub: init,
            sup: top,
            role: is_a,
            pbox_id: None,
            derived: false,
        });
        kb
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    /// Register a basic concept; returns the existing handle if the IRI is
    /// already known.
    pub fn add_concept(&mut self, iri: impl Into<String>) -> ConceptId {
        let iri = iri.into();
        if let Some(&id) = self.concept_ids.get(&iri) {
            return id;
        }
        self.push_concept(iri, ConceptKind::Basic)
    }

    /// Register a named individual and link it from `init`.
    pub fn add_individual(&mut self, iri: impl Into<String>) -> ConceptId {
        let iri = iri.into();
        if let Some(&id) = self.concept_ids.get(&iri) {
            return id;
        }
        let id = self.push_concept(iri, ConceptKind::Individual);
        let (init, is_a) = (self.init, self.is_a);
        self.enqueue_axiom(Pending {
            sub: init,
            sup: id,
            role: is_a,
            pbox_id: None,
            derived: false,
        });
        id
    }

    /// Register the existential head node `∃role.target`.
    ///
    /// Creates the artificial role of the same name and the synthetic arrow
    /// pair `∃r.C ⊑_{r.C} C` / `C ⊑_{r.C} ∃r.C` tying the head to its target
    /// in both directions (the artificial role keeps the pair out of is-a
    /// subsumption while still carrying emptiness and cut connectivity).
    /// Every present `X ⊑_r C` source is linked to the head with a derived
    /// is-a arrow; future `X ⊑_r C` insertions link themselves (see
    /// `derive_follow_ups`), so role successors compose through ordinary
    /// is-a propagation.
    pub fn add_existential_concept(
        &mut self,
        role_iri: &str,
        target_iri: &str,
    ) -> Result<ConceptId, Error> {
        let role = self.role_id(role_iri)?;
        let target = self.concept_id(target_iri)?;
        if let Some(&head) = self.existential_heads.get(&(role, target)) {
            return Ok(head);
        }
        let iri = format!("{role_iri}.{target_iri}");
        let head = self.push_concept(iri.clone(), ConceptKind::Existential { role, target });
        let artificial = self.push_role(iri, RoleKind::Artificial);
        self.existential_heads.insert((role, target), head);

        self.enqueue_axiom(Pending {
            sub: head,
            sup: target,
            role: artificial,
            pbox_id: None,
            derived: false,
        });
        self.enqueue_axiom(Pending {
            sub: target,
            sup: head,
            role: artificial,
            pbox_id: None,
            derived: false,
        });

        let sources: Vec<ConceptId> = self.concepts[target.index()]
            .sub_arrows
            .iter()
            .filter(|sa| sa.role == role && sa.source != head)
            .map(|sa| sa.source)
            .collect();
        let is_a = self.is_a;
        for sub in sources {
            self.enqueue_axiom(Pending {
                sub,
                sup: head,
                role: is_a,
                pbox_id: None,
                derived: true,
            });
        }
        Ok(head)
    }

    pub fn add_role(&mut self, iri: impl Into<String>) -> RoleId {
        let iri = iri.into();
        if let Some(&id) = self.role_ids.get(&iri) {
            return id;
        }
        self.push_role(iri, RoleKind::Ordinary)
    }

    fn push_concept(&mut self, iri: String, kind: ConceptKind) -> ConceptId {
        let id = ConceptId(self.concepts.len() as u32);
        self.concept_ids.insert(iri.clone(), id);
        self.concepts.push(Concept {
            iri,
            kind,
            sup_arrows: Vec::new(),
            sub_arrows: Vec::new(),
            is_empty: false,
        });
        id
    }

    fn push_role(&mut self, iri: String, kind: RoleKind) -> RoleId {
        let id = RoleId(self.roles.len() as u32);
        self.role_ids.insert(iri.clone(), id);
        self.roles.push(Role {
            iri,
            kind,
            axioms: Vec::new(),
        });
        id
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    pub fn concept(&self, id: ConceptId) -> &Concept {
        &self.concepts[id.index()]
    }

    pub fn concept_id(&self, iri: &str) -> Result<ConceptId, Error> {
        self.concept_ids
            .get(iri)
            .copied()
            .ok_or_else(|| Error::UnknownConcept(iri.to_string()))
    }

    pub fn role(&self, id: RoleId) -> &Role {
        &self.roles[id.index()]
    }

    pub fn role_id(&self, iri: &str) -> Result<RoleId, Error> {
        self.role_ids
            .get(iri)
            .copied()
            .ok_or_else(|| Error::UnknownRole(iri.to_string()))
    }

    pub fn concepts(&self) -> impl Iterator<Item = (ConceptId, &Concept)> {
        self.concepts
            .iter()
            .enumerate()
            .map(|(i, c)| (ConceptId(i as u32), c))
    }

    pub fn concept_count(&self) -> usize {
        self.concepts.len()
    }

    pub fn init(&self) -> ConceptId {
        self.init
    }

    pub fn bottom(&self) -> ConceptId {
        self.bottom
    }

    pub fn top(&self) -> ConceptId {
        self.top
    }

    pub fn is_a(&self) -> RoleId {
        self.is_a
    }

    pub fn existential_head(&self, role: RoleId, target: ConceptId) -> Option<ConceptId> {
        self.existential_heads.get(&(role, target)).copied()
    }

    pub fn pbox_axioms(&self) -> &BTreeMap<usize, PboxAxiom> {
        &self.pbox_axioms
    }

    /// Size of the pbox column index space (max registered id + 1).
    pub fn uncertain_axiom_count(&self) -> usize {
        self.pbox_axioms
            .keys()
            .next_back()
            .map(|&id| id + 1)
            .unwrap_or(0)
    }

    // ------------------------------------------------------------------
    // Axiom insertion
    // ------------------------------------------------------------------

    /// Insert the axiom `sub ⊑_role sup`, with `pbox_id = Some(i)` for the
    /// i-th uncertain axiom. Idempotent: returns `false` (and registers
    /// nothing) when an equal `(target, role)` arrow already exists.
    /// Derivation checks fire for every newly inserted arrow.
    pub fn add_axiom(
        &mut self,
        sub_iri: &str,
        sup_iri: &str,
        role_iri: &str,
        pbox_id: Option<usize>,
    ) -> Result<bool, Error> {
        let sub = self.concept_id(sub_iri)?;
        let sup = self.concept_id(sup_iri)?;
        let role = self.role_id(role_iri)?;
        Ok(self.add_axiom_ids(sub, sup, role, pbox_id))
    }

    /// Handle-based variant of [`add_axiom`](Self::add_axiom).
    pub fn add_axiom_ids(
        &mut self,
        sub: ConceptId,
        sup: ConceptId,
        role: RoleId,
        pbox_id: Option<usize>,
    ) -> bool {
        self.enqueue_axiom(Pending {
            sub,
            sup,
            role,
            pbox_id,
            derived: false,
        })
    }

    /// Declare `sub_role ⊑ sup_role` and re-fire closure over every axiom
    /// already recorded for `sub_role`.
    pub fn add_role_inclusion(&mut self, sub_iri: &str, sup_iri: &str) -> Result<(), Error> {
        let sub = self.role_id(sub_iri)?;
        let sup = self.role_id(sup_iri)?;
        self.role_inclusions.entry(sub).or_default().push(sup);
        for (c, d) in self.roles[sub.index()].axioms.clone() {
            self.enqueue_axiom(Pending {
                sub: c,
                sup: d,
                role: sup,
                pbox_id: None,
                derived: true,
            });
        }
        Ok(())
    }

    /// Declare the chain inclusion `sub1 ∘ sub2 ⊑ sup` and re-fire closure
    /// over every matching axiom pair already present.
    pub fn add_chained_role_inclusion(
        &mut self,
        sub_iris: (&str, &str),
        sup_iri: &str,
    ) -> Result<(), Error> {
        let sub1 = self.role_id(sub_iris.0)?;
        let sub2 = self.role_id(sub_iris.1)?;
        let sup = self.role_id(sup_iri)?;
        self.chain_inclusions
            .entry((sub1, sub2))
            .or_default()
            .push(sup);
        for (c, d_prime) in self.roles[sub1.index()].axioms.clone() {
            let targets: Vec<ConceptId> = self.concepts[d_prime.index()]
                .sup_arrows
                .iter()
                .filter(|a| a.role == sub2)
                .map(|a| a.target)
                .collect();
            for d in targets {
                self.enqueue_axiom(Pending {
                    sub: c,
                    sup: d,
                    role: sup,
                    pbox_id: None,
                    derived: true,
                });
            }
        }
        Ok(())
    }

    /// Drain the derivation worklist seeded with one axiom; returns whether
    /// the seed itself was newly inserted.
    fn enqueue_axiom(&mut self, seed: Pending) -> bool {
        let mut pending = VecDeque::from([seed]);
        let mut seed_inserted = false;
        let mut first = true;
        while let Some(ax) = pending.pop_front() {
            let inserted = self.insert_arrow(&ax);
            if first {
                seed_inserted = inserted;
                first = false;
            }
            if inserted {
                self.derive_follow_ups(&ax, &mut pending);
            }
        }
        seed_inserted
    }

    /// Insert the mirrored arrow pair atomically. Duplicate `(target, role)`
    /// pairs are silent no-ops.
    fn insert_arrow(&mut self, ax: &Pending) -> bool {
        if ax.sub == ax.sup && ax.role == self.is_a {
            return false;
        }
        if self.concepts[ax.sub.index()].has_arrow(ax.sup, ax.role) {
            return false;
        }
        self.concepts[ax.sub.index()].sup_arrows.push(Arrow {
            target: ax.sup,
            role: ax.role,
            pbox_id: ax.pbox_id,
            derived: ax.derived,
        });
        self.concepts[ax.sup.index()].sub_arrows.push(SubArrow {
            source: ax.sub,
            role: ax.role,
            pbox_id: ax.pbox_id,
            derived: ax.derived,
        });
        self.roles[ax.role.index()].axioms.push((ax.sub, ax.sup));
        if let Some(id) = ax.pbox_id {
            self.pbox_axioms.insert(
                id,
                PboxAxiom {
                    sub: ax.sub,
                    sup: ax.sup,
                    role: ax.role,
                },
            );
        }
        true
    }

    /// Eager closure rules fired by one freshly inserted arrow.
    fn derive_follow_ups(&mut self, ax: &Pending, pending: &mut VecDeque<Pending>) {
        let is_a = self.is_a;

        // Existential head linking: X ⊑_r C and ∃r.C registered ⇒ X ⊑ ∃r.C.
        if let Some(&head) = self.existential_heads.get(&(ax.role, ax.sup)) {
            if ax.sub != head {
                pending.push_back(Pending {
                    sub: ax.sub,
                    sup: head,
                    role: is_a,
                    pbox_id: None,
                    derived: true,
                });
            }
        }

        // R1 backward: c ⊑ sub (is-a) ⇒ c ⊑_role sup.
        for sa in &self.concepts[ax.sub.index()].sub_arrows {
            if sa.role == is_a && sa.source != ax.sub {
                pending.push_back(Pending {
                    sub: sa.source,
                    sup: ax.sup,
                    role: ax.role,
                    pbox_id: None,
                    derived: true,
                });
            }
        }

        // R1 forward: an inserted is-a arrow inherits sup's outgoing arrows.
        if ax.role == is_a {
            for a in &self.concepts[ax.sup.index()].sup_arrows {
                if a.target != ax.sub {
                    pending.push_back(Pending {
                        sub: ax.sub,
                        sup: a.target,
                        role: a.role,
                        pbox_id: None,
                        derived: true,
                    });
                }
            }
        }

        // Role hierarchy: role ⊑ j ⇒ sub ⊑_j sup.
        if let Some(sups) = self.role_inclusions.get(&ax.role) {
            for &j in sups {
                pending.push_back(Pending {
                    sub: ax.sub,
                    sup: ax.sup,
                    role: j,
                    pbox_id: None,
                    derived: true,
                });
            }
        }

        // Role chain, inserted arrow as left premise:
        // sub ⊑_role sup, sup ⊑_j z, (role, j) ⊑ k ⇒ sub ⊑_k z.
        let mut chained: Vec<Pending> = Vec::new();
        for a in &self.concepts[ax.sup.index()].sup_arrows {
            if let Some(ks) = self.chain_inclusions.get(&(ax.role, a.role)) {
                for &k in ks {
                    chained.push(Pending {
                        sub: ax.sub,
                        sup: a.target,
                        role: k,
                        pbox_id: None,
                        derived: true,
                    });
                }
            }
        }
        // Role chain, inserted arrow as right premise:
        // w ⊑_h sub, sub ⊑_role sup, (h, role) ⊑ k ⇒ w ⊑_k sup.
        for sa in &self.concepts[ax.sub.index()].sub_arrows {
            if let Some(ks) = self.chain_inclusions.get(&(sa.role, ax.role)) {
                for &k in ks {
                    chained.push(Pending {
                        sub: sa.source,
                        sup: ax.sup,
                        role: k,
                        pbox_id: None,
                        derived: true,
                    });
                }
            }
        }
        pending.extend(chained);

        // Bottom propagation: a certain, non-derived arrow into an empty
        // concept empties its source. Uncertain arrows never move the flag;
        // the weighted reduction decides their fate instead.
        if ax.pbox_id.is_none() && !ax.derived && self.concepts[ax.sup.index()].is_empty {
            self.mark_empty(ax.sub, pending);
        }
    }

    /// Set `is_empty` on `start` and on everything that reaches it through
    /// certain, non-derived arrows (any role), emitting the derived `C ⊑ ⊥`
    /// arrow for each newly emptied concept.
    fn mark_empty(&mut self, start: ConceptId, pending: &mut VecDeque<Pending>) {
        let (bottom, is_a) = (self.bottom, self.is_a);
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            if self.concepts[id.index()].is_empty {
                continue;
            }
            self.concepts[id.index()].is_empty = true;
            pending.push_back(Pending {
                sub: id,
                sup: bottom,
                role: is_a,
                pbox_id: None,
                derived: true,
            });
            stack.extend(
                self.concepts[id.index()]
                    .sub_arrows
                    .iter()
                    .filter(|sa| sa.pbox_id.is_none() && !sa.derived)
                    .map(|sa| sa.source),
            );
        }
    }

    // ------------------------------------------------------------------
    // Completion (global fixpoint rules)
    // ------------------------------------------------------------------

    /// Saturate the graph under the existential-composition and
    /// nominal-coincidence rules. The eager on-insert rules keep firing for
    /// every arrow added here, so after `complete()` returns the graph is
    /// closed under the full rule set.
    pub fn complete(&mut self) {
        loop {
            let mut changed = false;
            changed |= self.complete_existential_rule();
            changed |= self.complete_individual_rule();
            if !changed {
                break;
            }
        }
    }

    /// R-exists: X ⊑_i E, head ∃i.E ⊑ D (is-a) ⇒ X ⊑ D.
    fn complete_existential_rule(&mut self) -> bool {
        let is_a = self.is_a;
        let mut additions: Vec<(ConceptId, ConceptId)> = Vec::new();
        for (&(role, target), &head) in &self.existential_heads {
            let sources: Vec<ConceptId> = self.concepts[target.index()]
                .sub_arrows
                .iter()
                .filter(|sa| sa.role == role && sa.source != head)
                .map(|sa| sa.source)
                .collect();
            if sources.is_empty() {
                continue;
            }
            for a in &self.concepts[head.index()].sup_arrows {
                if a.role != is_a {
                    continue;
                }
                for &c in &sources {
                    if c != a.target {
                        additions.push((c, a.target));
                    }
                }
            }
        }
        let mut changed = false;
        for (c, d) in additions {
            changed |= self.enqueue_axiom(Pending {
                sub: c,
                sup: d,
                role: is_a,
                pbox_id: None,
                derived: true,
            });
        }
        changed
    }

    /// R-individual: two concepts below the same individual, both reachable
    /// from `init`, subsume each other (two descriptions of one nominal).
    fn complete_individual_rule(&mut self) -> bool {
        let is_a = self.is_a;
        let reached_by_init: Vec<bool> = {
            let mut set = vec![false; self.concepts.len()];
            for id in self.is_a_reachable(self.init) {
                set[id.index()] = true;
            }
            set
        };
        let individuals: Vec<ConceptId> = self
            .concepts()
            .filter(|(_, c)| c.kind == ConceptKind::Individual)
            .map(|(id, _)| id)
            .collect();

        let mut additions: Vec<(ConceptId, ConceptId)> = Vec::new();
        for a in individuals {
            let below: Vec<ConceptId> = self
                .is_a_reaching(a)
                .filter(|id| reached_by_init[id.index()])
                .collect();
            for &c in &below {
                for &d in &below {
                    if c != d {
                        additions.push((c, d));
                    }
                }
            }
        }
        let mut changed = false;
        for (c, d) in additions {
            changed |= self.enqueue_axiom(Pending {
                sub: c,
                sup: d,
                role: is_a,
                pbox_id: None,
                derived: true,
            });
        }
        changed
    }

    // ------------------------------------------------------------------
    // Reachability
    // ------------------------------------------------------------------

    /// Concepts reachable from `start` by following is-a arrows forward,
    /// `start` included. Finite by construction; no recursion.
    pub fn is_a_reachable(&self, start: ConceptId) -> Reachable<'_> {
        Reachable {
            kb: self,
            forward: true,
            stack: vec![start],
            visited: vec![false; self.concepts.len()],
        }
    }

    /// Concepts that reach `start` by following is-a arrows, `start`
    /// included.
    pub fn is_a_reaching(&self, start: ConceptId) -> Reachable<'_> {
        Reachable {
            kb: self,
            forward: false,
            stack: vec![start],
            visited: vec![false; self.concepts.len()],
        }
    }

    /// Whether `sub ⊑ sup` holds in the (closed) graph.
    pub fn is_subsumed(&self, sub_iri: &str, sup_iri: &str) -> Result<bool, Error> {
        let sub = self.concept_id(sub_iri)?;
        let sup = self.concept_id(sup_iri)?;
        if sub == sup {
            return Ok(true);
        }
        Ok(self.is_a_reachable(sub).any(|id| id == sup))
    }

    /// Whether the certain part of the ontology alone is inconsistent. When
    /// true the probabilistic KB is unsatisfiable regardless of any
    /// probability assignment.
    pub fn has_path_init_to_bot(&self) -> bool {
        self.concepts[self.init.index()].is_empty
    }
}

/// Restartable worklist iterator over is-a-connected concepts.
pub struct Reachable<'a> {
    kb: &'a KnowledgeBase,
    forward: bool,
    stack: Vec<ConceptId>,
    visited: Vec<bool>,
}

impl Iterator for Reachable<'_> {
    type Item = ConceptId;

    fn next(&mut self) -> Option<ConceptId> {
        while let Some(id) = self.stack.pop() {
            if self.visited[id.index()] {
                continue;
            }
            self.visited[id.index()] = true;
            let concept = self.kb.concept(id);
            if self.forward {
                self.stack.extend(
                    concept
                        .sup_arrows()
                        .iter()
                        .filter(|a| a.role == self.kb.is_a)
                        .map(|a| a.target),
                );
            } else {
                self.stack.extend(
                    concept
                        .sub_arrows()
                        .iter()
                        .filter(|a| a.role == self.kb.is_a)
                        .map(|a| a.source),
                );
            }
            return Some(id);
        }
        None
    }
}
