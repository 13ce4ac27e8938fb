//! GEL++ CLI
//!
//! Command-line interface for probabilistic EL++ reasoning:
//! - `sat`: decide satisfiability of an annotated OWL ontology and report
//!   the marginal probabilities witnessing it.
//! - `bounds`: tight probability bounds for a query subsumption.
//!
//! Ontologies are loaded from N-Triples, Turtle, or RDF/XML files, with
//! uncertainty carried by `#!pbox-id` / `#!pbox-restriction` annotations
//! (see `gelpp-ingest-owl`).

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use gelpp_core::gel::IS_A_IRI;
use gelpp_core::{iri, ProbabilisticKnowledgeBase};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gelpp")]
#[command(author, version, about = "Probabilistic EL++ reasoner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide satisfiability of an annotated ontology.
    Sat {
        /// Ontology file (.nt, .ttl, .rdf, .owl, .xml)
        input: PathBuf,
        /// Emit a machine-readable JSON report
        #[arg(long)]
        json: bool,
    },

    /// Tight probability bounds for `SUB ⊑ SUP` (or `SUB ⊑ ∃ROLE.SUP`).
    Bounds {
        /// Ontology file (.nt, .ttl, .rdf, .owl, .xml)
        input: PathBuf,
        /// Subsumee IRI
        sub: String,
        /// Subsumer IRI
        sup: String,
        /// Role IRI for an existential query (plain subsumption if omitted)
        #[arg(short, long)]
        role: Option<String>,
        /// Emit a machine-readable JSON report
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Sat { input, json } => {
            let pkb = gelpp_ingest_owl::load_file(&input)?;
            cmd_sat(&pkb, json)
        }
        Commands::Bounds {
            input,
            sub,
            sup,
            role,
            json,
        } => {
            let pkb = gelpp_ingest_owl::load_file(&input)?;
            cmd_bounds(&pkb, &sub, &sup, role.as_deref().unwrap_or(IS_A_IRI), json)
        }
    }
}

fn cmd_sat(pkb: &ProbabilisticKnowledgeBase, json: bool) -> Result<()> {
    let report = sat_report(pkb)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    let satisfiable = report["satisfiable"].as_bool().unwrap_or(false);
    if satisfiable {
        println!("{}", "satisfiable".green().bold());
        if let Some(marginals) = report["marginals"].as_array() {
            for entry in marginals {
                println!(
                    "  P({} ⊑[{}] {}) = {:.6}",
                    iri::clear(entry["sub"].as_str().unwrap_or("?")),
                    iri::clear(entry["role"].as_str().unwrap_or("?")),
                    iri::clear(entry["sup"].as_str().unwrap_or("?")),
                    entry["probability"].as_f64().unwrap_or(f64::NAN),
                );
            }
        }
    } else {
        println!("{}", "unsatisfiable".red().bold());
    }
    Ok(())
}

/// Satisfiability report with one marginal entry per uncertain axiom.
fn sat_report(pkb: &ProbabilisticKnowledgeBase) -> Result<serde_json::Value> {
    let result = gelpp_sat::solve(pkb)?;
    let mut marginals = Vec::new();
    if let Some(lp) = &result.lp {
        // Structural marginal columns sit right after the identity block.
        let identity = pkb.n() + pkb.k() + 1;
        for (&id, axiom) in pkb.kb.pbox_axioms() {
            marginals.push(serde_json::json!({
                "pbox_id": id,
                "sub": pkb.kb.concept(axiom.sub).iri(),
                "role": pkb.kb.role(axiom.role).iri(),
                "sup": pkb.kb.concept(axiom.sup).iri(),
                "probability": lp.x[identity + id],
            }));
        }
    }
    Ok(serde_json::json!({
        "satisfiable": result.satisfiable,
        "marginals": marginals,
    }))
}

fn cmd_bounds(
    pkb: &ProbabilisticKnowledgeBase,
    sub: &str,
    sup: &str,
    role: &str,
    json: bool,
) -> Result<()> {
    let bounds = gelpp_sat::bounds::compute(pkb, sub, sup, role)?;
    if json {
        let report = match &bounds {
            Some(b) => serde_json::json!({
                "satisfiable": true,
                "lower": b.lower,
                "upper": b.upper,
            }),
            None => serde_json::json!({ "satisfiable": false }),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    match bounds {
        Some(b) => {
            println!(
                "{} P({} ⊑[{}] {}) ∈ [{:.6}, {:.6}]",
                "ok".green().bold(),
                iri::clear(sub),
                iri::clear(role),
                iri::clear(sup),
                b.lower,
                b.upper,
            );
        }
        None => {
            println!(
                "{} the knowledge base itself is unsatisfiable",
                "unsatisfiable".red().bold()
            );
        }
    }
    Ok(())
}
