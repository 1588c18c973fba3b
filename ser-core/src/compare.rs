//! Cross-recognizer agreement

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::NormalizedOutput;

/// Dimensions skipped by default when checking agreement.
///
/// `amount-of-money` is exempt because the two recognizers disagree on its
/// value format, which also shifts the spans they report. The exemption is
/// broad: every money prediction on either side is ignored, not only the
/// mismatching ones.
pub const DEFAULT_EXEMPT_DIMENSIONS: &[&str] = &["amount-of-money"];

/// Checks whether the reference recognizer also found every entity the
/// checked recognizer found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparator {
    exempt: BTreeSet<String>,
}

impl Comparator {
    pub fn new() -> Self {
        Self::with_exempt(DEFAULT_EXEMPT_DIMENSIONS.iter().copied())
    }

    pub fn with_exempt<I, S>(dimensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            exempt: dimensions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_exempt(&self, dimension: &str) -> bool {
        self.exempt.contains(dimension)
    }

    pub fn exempt_dimensions(&self) -> impl Iterator<Item = &str> {
        self.exempt.iter().map(String::as_str)
    }

    /// True when every non-exempt `(dimension, span)` in `checked` also
    /// appears in `reference`. Values are ignored.
    pub fn agree(&self, reference: &NormalizedOutput, checked: &NormalizedOutput) -> bool {
        checked
            .iter()
            .filter(|(dim, _)| !self.is_exempt(dim))
            .all(|(dim, spans)| match reference.get(dim) {
                Some(ref_spans) => spans.keys().all(|s| ref_spans.contains_key(s)),
                None => false,
            })
    }

    pub fn agree_all<'a, I>(&self, pairs: I) -> AgreementSets
    where
        I: IntoIterator<Item = (usize, &'a NormalizedOutput, &'a NormalizedOutput)>,
    {
        let (agreeing, disagreeing): (Vec<_>, Vec<_>) = pairs
            .into_iter()
            .map(|(i, reference, checked)| (i, self.agree(reference, checked)))
            .partition(|(_, agrees)| *agrees);

        AgreementSets {
            agreeing: agreeing.into_iter().map(|(i, _)| i).collect(),
            disagreeing: disagreeing.into_iter().map(|(i, _)| i).collect(),
        }
    }
}

impl Default for Comparator {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgreementSets {
    pub agreeing: BTreeSet<usize>,
    pub disagreeing: BTreeSet<usize>,
}
