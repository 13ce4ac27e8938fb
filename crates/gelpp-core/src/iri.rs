//! IRI display helpers.

/// Strip the namespace part of an IRI, keeping everything after the first
/// `#`. IRIs without a fragment separator are returned unchanged.
pub fn clear(iri: &str) -> String {
    match iri.split_once('#') {
        Some((_, rest)) => rest.split('#').collect::<Vec<_>>().concat(),
        None => iri.to_string(),
    }
}
