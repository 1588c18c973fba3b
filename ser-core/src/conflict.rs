//! Same-span conflicts within one recognizer's output

use std::collections::BTreeSet;

use indexmap::IndexMap;

use crate::types::{NormalizedOutput, Span};

/// True when any span is claimed by two or more dimensions.
pub fn has_conflict(output: &NormalizedOutput) -> bool {
    let mut seen = BTreeSet::new();
    output.entities().any(|(_, span)| !seen.insert(*span))
}

/// Spans claimed by more than one dimension, each with the dimensions that
/// claim it, in first-seen order.
pub fn conflicting_spans(output: &NormalizedOutput) -> Vec<(Span, Vec<String>)> {
    let mut claims: IndexMap<Span, Vec<String>> = IndexMap::new();
    for (dim, span) in output.entities() {
        claims.entry(*span).or_default().push(dim.to_string());
    }

    claims.into_iter().filter(|(_, dims)| dims.len() > 1).collect()
}

/// Indices of conflicting queries.
pub fn find_conflicts<'a, I>(outputs: I) -> BTreeSet<usize>
where
    I: IntoIterator<Item = (usize, &'a NormalizedOutput)>,
{
    outputs
        .into_iter()
        .filter(|(_, output)| has_conflict(output))
        .map(|(i, _)| i)
        .collect()
}
