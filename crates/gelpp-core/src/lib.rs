//! Graphic EL++ knowledge bases.
//!
//! This crate owns the subsumption graph of an EL++ ontology and its
//! deductive closure:
//!
//! - `gel`: concepts, roles, arrows, the `KnowledgeBase` arena and the
//!   completion engine (eager on-insert closure + fixpoint pass).
//! - `pbox`: the probability box — linear constraints over the marginal
//!   probabilities of uncertain axioms — layered on top of a `KnowledgeBase`.
//! - `iri`: small IRI display helpers.
//!
//! The graph is handle-based: concepts and roles live in arenas indexed by
//! `ConceptId`/`RoleId`, and arrows reference handles, never objects, so the
//! mutual sub/sup back-references stay cycle-free.

pub mod gel;
pub mod iri;
pub mod pbox;

pub use gel::{
    Arrow, Concept, ConceptId, ConceptKind, Error, KnowledgeBase, PboxAxiom, Role, RoleId,
    RoleKind, SubArrow,
};
pub use pbox::{PboxRestriction, ProbabilisticKnowledgeBase, Sign};
