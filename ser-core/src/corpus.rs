//! Labeled corpus and per-query evaluation records

use serde::{Deserialize, Serialize};

use crate::extract::extract;
use crate::types::{EntitySpan, Error, NormalizedOutput, Result};

/// One labeled query of the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusQuery {
    pub id: usize,
    pub text: String,
    pub annotated: String,
    pub ground_truth: Vec<EntitySpan>,
}

/// An ordered, labeled corpus. Query ids are positions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Corpus {
    queries: Vec<CorpusQuery>,
}

impl Corpus {
    /// Build from aligned clean and annotated lines.
    ///
    /// Fails if the two sides differ in length or if any annotated entity
    /// cannot be located in its clean query.
    pub fn from_lines<C, A>(clean: C, annotated: A) -> Result<Self>
    where
        C: IntoIterator,
        C::Item: Into<String>,
        A: IntoIterator,
        A::Item: Into<String>,
    {
        let clean: Vec<String> = clean.into_iter().map(Into::into).collect();
        let annotated: Vec<String> = annotated.into_iter().map(Into::into).collect();

        if clean.len() != annotated.len() {
            return Err(Error::Misaligned {
                what: "annotated corpus".to_string(),
                expected: clean.len(),
                got: annotated.len(),
            });
        }

        let queries = clean
            .into_iter()
            .zip(annotated)
            .enumerate()
            .map(|(id, (text, annotated))| {
                let ground_truth = extract(&text, &annotated).map_err(|e| e.in_query(id))?;
                Ok(CorpusQuery {
                    id,
                    text,
                    annotated,
                    ground_truth,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { queries })
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    pub fn get(&self, id: usize) -> Option<&CorpusQuery> {
        self.queries.get(id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CorpusQuery> {
        self.queries.iter()
    }

    /// Clean query texts in corpus order.
    pub fn texts(&self) -> Vec<&str> {
        self.queries.iter().map(|q| q.text.as_str()).collect()
    }

    pub fn entity_count(&self) -> usize {
        self.queries.iter().map(|q| q.ground_truth.len()).sum()
    }

    /// Pair every query with both recognizers' outputs.
    ///
    /// Both output vectors must be aligned with the corpus.
    pub fn into_records(
        self,
        baseline: Vec<NormalizedOutput>,
        candidate: Vec<NormalizedOutput>,
    ) -> Result<Vec<QueryRecord>> {
        for (what, got) in [("baseline outputs", baseline.len()), ("candidate outputs", candidate.len())] {
            if got != self.queries.len() {
                return Err(Error::Misaligned {
                    what: what.to_string(),
                    expected: self.queries.len(),
                    got,
                });
            }
        }

        Ok(self
            .queries
            .into_iter()
            .zip(baseline)
            .zip(candidate)
            .map(|((q, baseline), candidate)| QueryRecord {
                id: q.id,
                text: q.text,
                annotated: q.annotated,
                ground_truth: q.ground_truth,
                baseline,
                candidate,
            })
            .collect())
    }
}

impl<'a> IntoIterator for &'a Corpus {
    type Item = &'a CorpusQuery;
    type IntoIter = std::slice::Iter<'a, CorpusQuery>;

    fn into_iter(self) -> Self::IntoIter {
        self.queries.iter()
    }
}

/// Everything known about one query in an evaluation run.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRecord {
    pub id: usize,
    pub text: String,
    pub annotated: String,
    pub ground_truth: Vec<EntitySpan>,
    pub baseline: NormalizedOutput,
    pub candidate: NormalizedOutput,
}

impl QueryRecord {
    /// Expected dimension labels in ground-truth order.
    pub fn expected_labels(&self) -> Vec<&str> {
        self.ground_truth.iter().map(|e| e.label.as_str()).collect()
    }
}
