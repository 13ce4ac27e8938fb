//! Assembly of EL-shaped OWL statements into a knowledge base.
//!
//! Recognized vocabulary:
//! - `owl:Class`, `owl:ObjectProperty`, `owl:NamedIndividual` declarations.
//! - `rdfs:subClassOf`, with `owl:Restriction` blank nodes
//!   (`owl:onProperty` + `owl:someValuesFrom`) on either side: a restriction
//!   on the right becomes a role arrow, one on the left registers the
//!   existential head node.
//! - `rdfs:subPropertyOf` and binary `owl:propertyChainAxiom` lists.
//! - `rdf:type` class assertions and object-property assertions between
//!   individuals.
//!
//! Uncertainty annotations:
//! - A reified `owl:Axiom` node whose `rdfs:comment` starts with
//!   `#!pbox-id` assigns the annotated axiom its pbox column:
//!   ```text
//!   #!pbox-id
//!   3
//!   ```
//! - Each `rdfs:comment` on `owl:Thing` starting with `#!pbox-restriction`
//!   contributes one probability box row, as `column coefficient` lines
//!   followed by a sign and a right-hand side:
//!   ```text
//!   #!pbox-restriction
//!   0 1.0
//!   1 -1.0
//!   <=
//!   0.5
//!   ```

use crate::{parse_statements, RdfFormat, RdfNode, RdfObject, RdfStatement};
use anyhow::{anyhow, Context, Result};
use gelpp_core::gel::{KnowledgeBase, IS_A_IRI};
use gelpp_core::{PboxRestriction, ProbabilisticKnowledgeBase, Sign};
use std::collections::{HashMap, HashSet};
use std::path::Path;

pub const OWL_THING: &str = "http://www.w3.org/2002/07/owl#Thing";
pub const OWL_NOTHING: &str = "http://www.w3.org/2002/07/owl#Nothing";

const OWL_CLASS: &str = "http://www.w3.org/2002/07/owl#Class";
const OWL_OBJECT_PROPERTY: &str = "http://www.w3.org/2002/07/owl#ObjectProperty";
const OWL_NAMED_INDIVIDUAL: &str = "http://www.w3.org/2002/07/owl#NamedIndividual";
const OWL_RESTRICTION: &str = "http://www.w3.org/2002/07/owl#Restriction";
const OWL_ON_PROPERTY: &str = "http://www.w3.org/2002/07/owl#onProperty";
const OWL_SOME_VALUES_FROM: &str = "http://www.w3.org/2002/07/owl#someValuesFrom";
const OWL_AXIOM: &str = "http://www.w3.org/2002/07/owl#Axiom";
const OWL_ANNOTATED_SOURCE: &str = "http://www.w3.org/2002/07/owl#annotatedSource";
const OWL_ANNOTATED_PROPERTY: &str = "http://www.w3.org/2002/07/owl#annotatedProperty";
const OWL_ANNOTATED_TARGET: &str = "http://www.w3.org/2002/07/owl#annotatedTarget";
const OWL_PROPERTY_CHAIN: &str = "http://www.w3.org/2002/07/owl#propertyChainAxiom";
const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
const RDF_FIRST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";
const RDF_REST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";
const RDF_NIL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil";
const RDFS_SUB_CLASS_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";
const RDFS_SUB_PROPERTY_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subPropertyOf";
const RDFS_COMMENT: &str = "http://www.w3.org/2000/01/rdf-schema#comment";

const PBOX_ID_MARKER: &str = "#!pbox-id";
const PBOX_RESTRICTION_MARKER: &str = "#!pbox-restriction";

pub fn load_file(path: &Path) -> Result<ProbabilisticKnowledgeBase> {
    let bytes =
        std::fs::read(path).with_context(|| format!("reading ontology {}", path.display()))?;
    let format = RdfFormat::from_path(path)?;
    load_bytes(&bytes, format)
}

pub fn load_str(text: &str, format: RdfFormat) -> Result<ProbabilisticKnowledgeBase> {
    load_bytes(text.as_bytes(), format)
}

pub fn load_bytes(bytes: &[u8], format: RdfFormat) -> Result<ProbabilisticKnowledgeBase> {
    let statements = parse_statements(bytes, format)?;
    assemble(&statements)
}

/// Per-document index of the statements the assembly cares about.
#[derive(Default)]
struct DocumentIndex {
    types: HashMap<RdfNode, HashSet<String>>,
    on_property: HashMap<RdfNode, String>,
    some_values_from: HashMap<RdfNode, String>,
    sub_class_of: Vec<(RdfNode, RdfNode)>,
    sub_property_of: Vec<(String, String)>,
    chains: Vec<(String, RdfNode)>,
    list_first: HashMap<RdfNode, RdfNode>,
    list_rest: HashMap<RdfNode, RdfNode>,
    annotated_source: HashMap<RdfNode, RdfNode>,
    annotated_property: HashMap<RdfNode, String>,
    annotated_target: HashMap<RdfNode, RdfNode>,
    comments: HashMap<RdfNode, Vec<String>>,
}

impl DocumentIndex {
    fn build(statements: &[RdfStatement]) -> Self {
        let mut index = DocumentIndex::default();
        for stmt in statements {
            match (stmt.predicate_iri.as_str(), &stmt.object) {
                (RDF_TYPE, RdfObject::Node(RdfNode::Iri(ty))) => {
                    index
                        .types
                        .entry(stmt.subject.clone())
                        .or_default()
                        .insert(ty.clone());
                }
                (OWL_ON_PROPERTY, RdfObject::Node(RdfNode::Iri(role))) => {
                    index.on_property.insert(stmt.subject.clone(), role.clone());
                }
                (OWL_SOME_VALUES_FROM, RdfObject::Node(RdfNode::Iri(filler))) => {
                    index
                        .some_values_from
                        .insert(stmt.subject.clone(), filler.clone());
                }
                (RDFS_SUB_CLASS_OF, RdfObject::Node(sup)) => {
                    index.sub_class_of.push((stmt.subject.clone(), sup.clone()));
                }
                (RDFS_SUB_PROPERTY_OF, RdfObject::Node(RdfNode::Iri(sup))) => {
                    if let RdfNode::Iri(sub) = &stmt.subject {
                        index.sub_property_of.push((sub.clone(), sup.clone()));
                    }
                }
                (OWL_PROPERTY_CHAIN, RdfObject::Node(head)) => {
                    if let RdfNode::Iri(sup) = &stmt.subject {
                        index.chains.push((sup.clone(), head.clone()));
                    }
                }
                (RDF_FIRST, RdfObject::Node(item)) => {
                    index.list_first.insert(stmt.subject.clone(), item.clone());
                }
                (RDF_REST, RdfObject::Node(rest)) => {
                    index.list_rest.insert(stmt.subject.clone(), rest.clone());
                }
                (OWL_ANNOTATED_SOURCE, RdfObject::Node(source)) => {
                    index
                        .annotated_source
                        .insert(stmt.subject.clone(), source.clone());
                }
                (OWL_ANNOTATED_PROPERTY, RdfObject::Node(RdfNode::Iri(property))) => {
                    index
                        .annotated_property
                        .insert(stmt.subject.clone(), property.clone());
                }
                (OWL_ANNOTATED_TARGET, RdfObject::Node(target)) => {
                    index
                        .annotated_target
                        .insert(stmt.subject.clone(), target.clone());
                }
                (RDFS_COMMENT, RdfObject::Literal(lit)) => {
                    index
                        .comments
                        .entry(stmt.subject.clone())
                        .or_default()
                        .push(lit.lexical.clone());
                }
                _ => {}
            }
        }
        index
    }

    fn has_type(&self, node: &RdfNode, ty: &str) -> bool {
        self.types.get(node).is_some_and(|set| set.contains(ty))
    }

    /// `(role, filler)` when the node is an `owl:Restriction` with both
    /// parts present.
    fn restriction(&self, node: &RdfNode) -> Option<(&str, &str)> {
        if !self.has_type(node, OWL_RESTRICTION) {
            return None;
        }
        Some((
            self.on_property.get(node)?.as_str(),
            self.some_values_from.get(node)?.as_str(),
        ))
    }

    /// Pbox column ids keyed by `(source, property, target)` of the
    /// annotated axiom.
    fn pbox_ids(&self) -> Result<HashMap<(RdfNode, String, RdfNode), usize>> {
        let mut ids = HashMap::new();
        for (node, types) in &self.types {
            if !types.contains(OWL_AXIOM) {
                continue;
            }
            let Some(id) = self
                .comments
                .get(node)
                .into_iter()
                .flatten()
                .find_map(|c| parse_pbox_id(c))
            else {
                continue;
            };
            let (Some(source), Some(property), Some(target)) = (
                self.annotated_source.get(node),
                self.annotated_property.get(node),
                self.annotated_target.get(node),
            ) else {
                return Err(anyhow!("incomplete owl:Axiom annotation carrying a pbox id"));
            };
            ids.insert((source.clone(), property.clone(), target.clone()), id);
        }
        Ok(ids)
    }

    fn walk_role_list(&self, head: &RdfNode) -> Result<Vec<String>> {
        let nil = RdfNode::Iri(RDF_NIL.to_string());
        let mut out = Vec::new();
        let mut cursor = head.clone();
        while cursor != nil {
            let item = self
                .list_first
                .get(&cursor)
                .ok_or_else(|| anyhow!("malformed RDF list in property chain"))?;
            let RdfNode::Iri(iri) = item else {
                return Err(anyhow!("non-IRI member in property chain list"));
            };
            out.push(iri.clone());
            cursor = self
                .list_rest
                .get(&cursor)
                .cloned()
                .ok_or_else(|| anyhow!("unterminated RDF list in property chain"))?;
        }
        Ok(out)
    }
}

fn assemble(statements: &[RdfStatement]) -> Result<ProbabilisticKnowledgeBase> {
    let index = DocumentIndex::build(statements);
    let pbox_ids = index.pbox_ids()?;
    let pbox_of = |source: &RdfNode, property: &str, target: &RdfNode| {
        pbox_ids
            .get(&(source.clone(), property.to_string(), target.clone()))
            .copied()
    };

    let mut kb = KnowledgeBase::new(OWL_NOTHING, OWL_THING);

    // Declarations first: roles, then classes and individuals.
    for (node, types) in &index.types {
        if let RdfNode::Iri(iri) = node {
            if types.contains(OWL_OBJECT_PROPERTY) {
                kb.add_role(iri.clone());
            }
        }
    }
    for (node, types) in &index.types {
        let RdfNode::Iri(iri) = node else {
            continue;
        };
        if types.contains(OWL_CLASS) {
            kb.add_concept(iri.clone());
        }
        if types.contains(OWL_NAMED_INDIVIDUAL) {
            kb.add_individual(iri.clone());
        }
    }

    // Role hierarchy before the axioms so closure fires on insertion.
    for (sub, sup) in &index.sub_property_of {
        kb.add_role_inclusion(sub, sup)
            .map_err(|e| anyhow!("subPropertyOf: {e}"))?;
    }
    for (sup, head) in &index.chains {
        let chain = index.walk_role_list(head)?;
        let [first, second] = chain.as_slice() else {
            return Err(anyhow!(
                "property chains of length {} are unsupported (only binary chains)",
                chain.len()
            ));
        };
        kb.add_chained_role_inclusion((first.as_str(), second.as_str()), sup)
            .map_err(|e| anyhow!("propertyChainAxiom: {e}"))?;
    }

    // Subclass axioms, with existential restrictions on either side.
    for (sub, sup) in &index.sub_class_of {
        let pbox = pbox_of(sub, RDFS_SUB_CLASS_OF, sup);
        let sub_iri = match index.restriction(sub) {
            Some((role, filler)) => {
                let head = kb
                    .add_existential_concept(role, filler)
                    .map_err(|e| anyhow!("someValuesFrom restriction: {e}"))?;
                kb.concept(head).iri().to_string()
            }
            None => match sub {
                RdfNode::Iri(iri) => iri.clone(),
                RdfNode::BlankNode(b) => {
                    return Err(anyhow!("unsupported blank subclass expression _:{b}"))
                }
            },
        };
        match index.restriction(sup) {
            Some((role, filler)) => {
                kb.add_axiom(&sub_iri, filler, role, pbox)
                    .map_err(|e| anyhow!("subClassOf restriction: {e}"))?;
            }
            None => {
                let RdfNode::Iri(sup_iri) = sup else {
                    return Err(anyhow!("unsupported blank superclass expression"));
                };
                kb.add_axiom(&sub_iri, sup_iri, IS_A_IRI, pbox)
                    .map_err(|e| anyhow!("subClassOf: {e}"))?;
            }
        }
    }

    // Assertions: class membership and role edges between individuals.
    for stmt in statements {
        let (RdfNode::Iri(subject), RdfObject::Node(RdfNode::Iri(object))) =
            (&stmt.subject, &stmt.object)
        else {
            continue;
        };
        if stmt.predicate_iri == RDF_TYPE {
            if kb.concept_id(subject).is_ok() && kb.concept_id(object).is_ok() {
                let pbox = pbox_of(&stmt.subject, RDF_TYPE, &RdfNode::Iri(object.clone()));
                kb.add_axiom(subject, object, IS_A_IRI, pbox)
                    .map_err(|e| anyhow!("class assertion: {e}"))?;
            }
        } else if kb.role_id(&stmt.predicate_iri).is_ok() {
            let pbox = pbox_of(
                &stmt.subject,
                &stmt.predicate_iri,
                &RdfNode::Iri(object.clone()),
            );
            kb.add_axiom(subject, object, &stmt.predicate_iri, pbox)
                .map_err(|e| anyhow!("property assertion: {e}"))?;
        }
    }

    kb.complete();

    let thing = RdfNode::Iri(OWL_THING.to_string());
    let mut restrictions = Vec::new();
    for comment in index.comments.get(&thing).into_iter().flatten() {
        if let Some(restriction) = parse_pbox_restriction(comment)? {
            restrictions.push(restriction);
        }
    }

    Ok(ProbabilisticKnowledgeBase::from_restrictions(
        kb,
        &restrictions,
    ))
}

fn parse_pbox_id(text: &str) -> Option<usize> {
    let mut lines = text.lines().map(str::trim);
    if lines.next()? != PBOX_ID_MARKER {
        return None;
    }
    lines.next()?.parse().ok()
}

fn parse_pbox_restriction(text: &str) -> Result<Option<PboxRestriction>> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.first() != Some(&PBOX_RESTRICTION_MARKER) {
        return Ok(None);
    }
    if lines.len() < 3 {
        return Err(anyhow!("malformed pbox restriction comment: {text:?}"));
    }
    let sign: Sign = lines[lines.len() - 2]
        .parse()
        .map_err(|e: String| anyhow!("{e}"))?;
    let value: f64 = lines[lines.len() - 1]
        .parse()
        .with_context(|| format!("pbox restriction right-hand side: {:?}", lines[lines.len() - 1]))?;
    let mut terms = Vec::new();
    for line in &lines[1..lines.len() - 2] {
        let mut parts = line.split_whitespace();
        let (Some(column), Some(coefficient), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(anyhow!("malformed pbox restriction term: {line:?}"));
        };
        terms.push((
            column
                .parse()
                .with_context(|| format!("pbox column in {line:?}"))?,
            coefficient
                .parse()
                .with_context(|| format!("pbox coefficient in {line:?}"))?,
        ));
    }
    Ok(Some(PboxRestriction { terms, sign, value }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
    const RDFS_NS: &str = "http://www.w3.org/2000/01/rdf-schema#";
    const OWL_NS: &str = "http://www.w3.org/2002/07/owl#";

    fn nt(lines: &[String]) -> ProbabilisticKnowledgeBase {
        let doc = lines.join("\n");
        load_str(&doc, RdfFormat::NTriples).unwrap()
    }

    fn decl(iri: &str, ty: &str) -> String {
        format!("<urn:ex#{iri}> <{RDF_NS}type> <{OWL_NS}{ty}> .")
    }

    fn sub_class(sub: &str, sup: &str) -> String {
        format!("<urn:ex#{sub}> <{RDFS_NS}subClassOf> <urn:ex#{sup}> .")
    }

    #[test]
    fn plain_subclass_axioms_close_transitively() {
        let pkb = nt(&[
            decl("C", "Class"),
            decl("D", "Class"),
            decl("E", "Class"),
            sub_class("C", "D"),
            sub_class("D", "E"),
        ]);
        assert!(pkb.kb.is_subsumed("urn:ex#C", "urn:ex#E").unwrap());
        assert_eq!((pkb.n(), pkb.k()), (0, 0));
    }

    #[test]
    fn right_hand_restriction_becomes_a_role_arrow() {
        let pkb = nt(&[
            decl("X", "Class"),
            decl("C", "Class"),
            decl("r", "ObjectProperty"),
            format!("_:b0 <{RDF_NS}type> <{OWL_NS}Restriction> ."),
            format!("_:b0 <{OWL_NS}onProperty> <urn:ex#r> ."),
            format!("_:b0 <{OWL_NS}someValuesFrom> <urn:ex#C> ."),
            format!("<urn:ex#X> <{RDFS_NS}subClassOf> _:b0 ."),
        ]);
        let x = pkb.kb.concept_id("urn:ex#X").unwrap();
        let c = pkb.kb.concept_id("urn:ex#C").unwrap();
        let r = pkb.kb.role_id("urn:ex#r").unwrap();
        assert!(pkb
            .kb
            .concept(x)
            .sup_arrows()
            .iter()
            .any(|a| a.target == c && a.role == r && !a.derived));
    }

    #[test]
    fn left_hand_restriction_registers_the_existential_head() {
        // X ⊑ ∃r.C and ∃r.C ⊑ Y entail X ⊑ Y.
        let pkb = nt(&[
            decl("X", "Class"),
            decl("C", "Class"),
            decl("Y", "Class"),
            decl("r", "ObjectProperty"),
            format!("_:b0 <{RDF_NS}type> <{OWL_NS}Restriction> ."),
            format!("_:b0 <{OWL_NS}onProperty> <urn:ex#r> ."),
            format!("_:b0 <{OWL_NS}someValuesFrom> <urn:ex#C> ."),
            format!("<urn:ex#X> <{RDFS_NS}subClassOf> _:b0 ."),
            format!("_:b1 <{RDF_NS}type> <{OWL_NS}Restriction> ."),
            format!("_:b1 <{OWL_NS}onProperty> <urn:ex#r> ."),
            format!("_:b1 <{OWL_NS}someValuesFrom> <urn:ex#C> ."),
            format!("_:b1 <{RDFS_NS}subClassOf> <urn:ex#Y> ."),
        ]);
        let r = pkb.kb.role_id("urn:ex#r").unwrap();
        let c = pkb.kb.concept_id("urn:ex#C").unwrap();
        assert!(pkb.kb.existential_head(r, c).is_some());
        assert!(pkb.kb.is_subsumed("urn:ex#X", "urn:ex#Y").unwrap());
    }

    #[test]
    fn individuals_get_class_and_role_assertions() {
        let pkb = nt(&[
            decl("B", "Class"),
            decl("r", "ObjectProperty"),
            decl("a", "NamedIndividual"),
            decl("b", "NamedIndividual"),
            format!("<urn:ex#a> <{RDF_NS}type> <urn:ex#B> ."),
            format!("<urn:ex#a> <urn:ex#r> <urn:ex#b> ."),
        ]);
        let a = pkb.kb.concept_id("urn:ex#a").unwrap();
        let b = pkb.kb.concept_id("urn:ex#b").unwrap();
        let r = pkb.kb.role_id("urn:ex#r").unwrap();
        assert!(pkb.kb.is_subsumed("urn:ex#a", "urn:ex#B").unwrap());
        assert!(pkb
            .kb
            .concept(a)
            .sup_arrows()
            .iter()
            .any(|arrow| arrow.target == b && arrow.role == r));
        assert!(pkb
            .kb
            .concept(pkb.kb.init())
            .sup_arrows()
            .iter()
            .any(|arrow| arrow.target == a));
    }

    #[test]
    fn annotated_axiom_and_thing_comment_build_the_box() {
        let pkb = nt(&[
            decl("C", "Class"),
            decl("D", "Class"),
            sub_class("C", "D"),
            format!("_:ax <{RDF_NS}type> <{OWL_NS}Axiom> ."),
            format!("_:ax <{OWL_NS}annotatedSource> <urn:ex#C> ."),
            format!("_:ax <{OWL_NS}annotatedProperty> <{RDFS_NS}subClassOf> ."),
            format!("_:ax <{OWL_NS}annotatedTarget> <urn:ex#D> ."),
            format!("_:ax <{RDFS_NS}comment> \"#!pbox-id\\n0\" ."),
            format!(
                "<{OWL_NS}Thing> <{RDFS_NS}comment> \"#!pbox-restriction\\n0 1.0\\n<=\\n0.5\" ."
            ),
        ]);
        assert_eq!((pkb.n(), pkb.k()), (1, 1));
        assert_eq!(pkb.a[[0, 0]], 1.0);
        assert_eq!(pkb.b[0], 0.5);
        assert_eq!(pkb.signs, vec![Sign::Le]);
        let axiom = pkb.kb.pbox_axioms()[&0];
        assert_eq!(pkb.kb.concept(axiom.sub).iri(), "urn:ex#C");
        assert_eq!(pkb.kb.concept(axiom.sup).iri(), "urn:ex#D");
    }

    #[test]
    fn property_hierarchy_and_chains_are_declared() {
        let pkb = nt(&[
            decl("C", "Class"),
            decl("D", "Class"),
            decl("E", "Class"),
            decl("r", "ObjectProperty"),
            decl("s", "ObjectProperty"),
            decl("t", "ObjectProperty"),
            format!("<urn:ex#r> <{RDFS_NS}subPropertyOf> <urn:ex#s> ."),
            format!("<urn:ex#t> <{OWL_NS}propertyChainAxiom> _:l0 ."),
            format!("_:l0 <{RDF_NS}first> <urn:ex#s> ."),
            format!("_:l0 <{RDF_NS}rest> _:l1 ."),
            format!("_:l1 <{RDF_NS}first> <urn:ex#s> ."),
            format!("_:l1 <{RDF_NS}rest> <{RDF_NS}nil> ."),
            format!("<urn:ex#C> <urn:ex#r> <urn:ex#D> ."),
            format!("<urn:ex#D> <urn:ex#r> <urn:ex#E> ."),
        ]);
        let c = pkb.kb.concept_id("urn:ex#C").unwrap();
        let e = pkb.kb.concept_id("urn:ex#E").unwrap();
        let t = pkb.kb.role_id("urn:ex#t").unwrap();
        // r ⊑ s lifts both edges, then s ∘ s ⊑ t composes them.
        assert!(pkb
            .kb
            .concept(c)
            .sup_arrows()
            .iter()
            .any(|a| a.target == e && a.role == t));
    }

    #[test]
    fn pbox_restriction_comments_reject_garbage() {
        assert!(parse_pbox_restriction("plain comment").unwrap().is_none());
        assert!(parse_pbox_restriction("#!pbox-restriction\n0 1.0\n<=").is_err());
        assert!(parse_pbox_restriction("#!pbox-restriction\n0 one\n<=\n0.5").is_err());
    }
}
