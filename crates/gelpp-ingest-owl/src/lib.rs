//! OWL/RDF ingestion for probabilistic EL++ knowledge bases.
//!
//! This crate sits at the interop boundary: it parses RDF serializations of
//! an OWL 2 EL ontology (untrusted input) and assembles a
//! `ProbabilisticKnowledgeBase` from the EL-shaped statements it finds.
//!
//! Sophia handles the serializations:
//! - N-Triples (`.nt`)
//! - Turtle (`.ttl`)
//! - RDF/XML (`.rdf`, `.owl`, `.xml`)
//!
//! Uncertainty rides on plain OWL annotations, so annotated ontologies stay
//! readable by stock tooling: a reified `owl:Axiom` with an
//! `#!pbox-id` comment marks an uncertain axiom, and `#!pbox-restriction`
//! comments on `owl:Thing` carry the probability box rows (see `owl`).

pub mod owl;

use anyhow::{anyhow, Result};
use sophia::api::prelude::*;
use std::path::Path;

pub use owl::{load_bytes, load_file, load_str};

// ============================================================================
// RDF term model (sufficient for EL assembly)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RdfNode {
    Iri(String),
    BlankNode(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RdfLiteral {
    pub lexical: String,
    pub datatype: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RdfObject {
    Node(RdfNode),
    Literal(RdfLiteral),
}

#[derive(Debug, Clone)]
pub struct RdfStatement {
    pub subject: RdfNode,
    pub predicate_iri: String,
    pub object: RdfObject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RdfFormat {
    NTriples,
    Turtle,
    RdfXml,
}

impl RdfFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();
        match ext.as_str() {
            "nt" | "ntriples" => Ok(RdfFormat::NTriples),
            "ttl" | "turtle" => Ok(RdfFormat::Turtle),
            "rdf" | "owl" | "xml" => Ok(RdfFormat::RdfXml),
            other => Err(anyhow!("unsupported RDF format: .{other}")),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{message}")]
struct StatementSinkError {
    message: String,
}

impl From<anyhow::Error> for StatementSinkError {
    fn from(value: anyhow::Error) -> Self {
        Self {
            message: value.to_string(),
        }
    }
}

// ============================================================================
// Display-form term parsing
// ============================================================================

fn unescape_rdf_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn parse_term_display(term: &str) -> Result<RdfObject> {
    let s = term.trim();

    if let Some(rest) = s.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
        return Ok(RdfObject::Node(RdfNode::Iri(rest.to_string())));
    }

    if let Some(rest) = s.strip_prefix("_:") {
        return Ok(RdfObject::Node(RdfNode::BlankNode(rest.to_string())));
    }

    if s.starts_with('"') {
        // Small literal parser over the N-Triples-ish display form.
        let mut end_quote = None;
        let mut prev_was_escape = false;
        for (i, ch) in s.char_indices().skip(1) {
            if ch == '"' && !prev_was_escape {
                end_quote = Some(i);
                break;
            }
            prev_was_escape = ch == '\\' && !prev_was_escape;
        }
        let Some(end) = end_quote else {
            return Err(anyhow!("invalid literal term (missing closing quote): {s}"));
        };

        let lexical = unescape_rdf_string(&s[1..end]);
        let rest = s[end + 1..].trim();

        let mut language = None;
        let mut datatype = None;
        if let Some(lang) = rest.strip_prefix('@') {
            language = Some(lang.to_string());
        } else if let Some(dt) = rest.strip_prefix("^^") {
            let dt = dt.trim();
            if let Some(dt_iri) = dt.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
                datatype = Some(dt_iri.to_string());
            } else if !dt.is_empty() {
                datatype = Some(dt.to_string());
            }
        }

        return Ok(RdfObject::Literal(RdfLiteral {
            lexical,
            datatype,
            language,
        }));
    }

    Err(anyhow!("unsupported RDF term form: {s}"))
}

fn parse_node_term_display(term: &str) -> Result<RdfNode> {
    match parse_term_display(term)? {
        RdfObject::Node(node) => Ok(node),
        RdfObject::Literal(_) => Err(anyhow!("expected IRI/blank node, got literal: {term}")),
    }
}

fn push_triple(
    out: &mut Vec<RdfStatement>,
    s: &str,
    p: &str,
    o: &str,
) -> std::result::Result<(), StatementSinkError> {
    let subject = parse_node_term_display(s).map_err(StatementSinkError::from)?;
    let RdfNode::Iri(predicate_iri) = parse_node_term_display(p).map_err(StatementSinkError::from)?
    else {
        return Ok(());
    };
    let object = parse_term_display(o).map_err(StatementSinkError::from)?;
    out.push(RdfStatement {
        subject,
        predicate_iri,
        object,
    });
    Ok(())
}

/// Parse one RDF document into a flat statement list.
pub fn parse_statements(bytes: &[u8], format: RdfFormat) -> Result<Vec<RdfStatement>> {
    let reader = std::io::BufReader::new(std::io::Cursor::new(bytes));
    let mut out: Vec<RdfStatement> = Vec::new();

    match format {
        RdfFormat::NTriples => {
            let mut parser = sophia::turtle::parser::nt::parse_bufread(reader);
            parser
                .try_for_each_triple(|t| {
                    push_triple(&mut out, &t.s().to_string(), &t.p().to_string(), &t.o().to_string())
                })
                .map_err(|e| anyhow!("failed to parse N-Triples: {e}"))?;
        }
        RdfFormat::Turtle => {
            let mut parser = sophia::turtle::parser::turtle::parse_bufread(reader);
            parser
                .try_for_each_triple(|t| {
                    push_triple(&mut out, &t.s().to_string(), &t.p().to_string(), &t.o().to_string())
                })
                .map_err(|e| anyhow!("failed to parse Turtle: {e}"))?;
        }
        RdfFormat::RdfXml => {
            let mut parser = sophia::xml::parser::parse_bufread(reader);
            parser
                .try_for_each_triple(|t| {
                    push_triple(&mut out, &t.s().to_string(), &t.p().to_string(), &t.o().to_string())
                })
                .map_err(|e| anyhow!("failed to parse RDF/XML: {e}"))?;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ntriples_into_statements() {
        let nt = r#"
<urn:ex#C> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://www.w3.org/2002/07/owl#Class> .
<urn:ex#C> <http://www.w3.org/2000/01/rdf-schema#comment> "a class\nwith two lines" .
_:b0 <http://www.w3.org/2002/07/owl#onProperty> <urn:ex#r> .
"#;
        let statements = parse_statements(nt.as_bytes(), RdfFormat::NTriples).unwrap();
        assert_eq!(statements.len(), 3);
        assert_eq!(statements[0].subject, RdfNode::Iri("urn:ex#C".to_string()));
        let RdfObject::Literal(lit) = &statements[1].object else {
            panic!("expected literal");
        };
        assert_eq!(lit.lexical, "a class\nwith two lines");
        assert!(matches!(&statements[2].subject, RdfNode::BlankNode(_)));
    }

    #[test]
    fn format_follows_the_file_extension() {
        assert_eq!(
            RdfFormat::from_path(Path::new("kb.owl")).unwrap(),
            RdfFormat::RdfXml
        );
        assert_eq!(
            RdfFormat::from_path(Path::new("kb.ttl")).unwrap(),
            RdfFormat::Turtle
        );
        assert!(RdfFormat::from_path(Path::new("kb.json")).is_err());
    }
}
