//! Exact-match correctness against ground truth.
//!
//! A query is correct when every ground-truth `(label, span)` is present in
//! the recognizer output. Values are not compared and there is no overlap
//! tolerance.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::{EntitySpan, NormalizedOutput};

/// Outcome for a single query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub correct: bool,
    /// Some expected dimension is absent from the output entirely.
    pub missed_entity: bool,
    /// Some expected dimension is present but without the exact span.
    pub incorrect_span: bool,
}

/// Evaluate one query's output against its ground truth.
pub fn evaluate(ground_truth: &[EntitySpan], output: &NormalizedOutput) -> Verdict {
    let mut verdict = Verdict::default();

    for expected in ground_truth {
        match output.get(&expected.label) {
            None => verdict.missed_entity = true,
            Some(spans) if !spans.contains_key(&expected.span) => verdict.incorrect_span = true,
            Some(_) => {}
        }
    }

    verdict.correct = !verdict.missed_entity && !verdict.incorrect_span;
    verdict
}

/// Corpus-wide correctness index sets for one recognizer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectnessSets {
    pub correct: BTreeSet<usize>,
    pub incorrect: BTreeSet<usize>,
    pub missed_entity: BTreeSet<usize>,
    pub incorrect_span: BTreeSet<usize>,
}

impl CorrectnessSets {
    pub fn total(&self) -> usize {
        self.correct.len() + self.incorrect.len()
    }

    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.correct.len() as f64 / total as f64
        }
    }
}

impl FromIterator<(usize, Verdict)> for CorrectnessSets {
    fn from_iter<I: IntoIterator<Item = (usize, Verdict)>>(iter: I) -> Self {
        let verdicts: Vec<(usize, Verdict)> = iter.into_iter().collect();
        let select = |pred: fn(&Verdict) -> bool| -> BTreeSet<usize> {
            verdicts.iter().filter(|(_, v)| pred(v)).map(|(i, _)| *i).collect()
        };

        Self {
            correct: select(|v| v.correct),
            incorrect: select(|v| !v.correct),
            missed_entity: select(|v| v.missed_entity),
            incorrect_span: select(|v| v.incorrect_span),
        }
    }
}

/// Evaluate a sequence of `(index, ground truth, output)` triples.
pub fn evaluate_all<'a, I>(queries: I) -> CorrectnessSets
where
    I: IntoIterator<Item = (usize, &'a [EntitySpan], &'a NormalizedOutput)>,
{
    queries
        .into_iter()
        .map(|(i, truth, output)| (i, evaluate(truth, output)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EntityValue, Span};

    fn truth(items: &[(usize, usize, &str)]) -> Vec<EntitySpan> {
        items
            .iter()
            .map(|&(s, e, l)| EntitySpan::new(Span::new(s, e).unwrap(), l))
            .collect()
    }

    fn output(items: &[(&str, usize, usize)]) -> NormalizedOutput {
        items.iter().fold(NormalizedOutput::new(), |out, &(d, s, e)| {
            out.with(d, Span::new(s, e).unwrap(), EntityValue::scalar(0))
        })
    }

    #[test]
    fn test_exact_match_is_correct() {
        let v = evaluate(&truth(&[(16, 25, "duration")]), &output(&[("duration", 16, 25)]));
        assert_eq!(
            v,
            Verdict {
                correct: true,
                missed_entity: false,
                incorrect_span: false
            }
        );
    }

    #[test]
    fn test_missing_dimension_is_missed_entity() {
        let v = evaluate(&truth(&[(16, 25, "duration")]), &NormalizedOutput::new());
        assert!(!v.correct);
        assert!(v.missed_entity);
        assert!(!v.incorrect_span);
    }

    #[test]
    fn test_wrong_span_is_incorrect_span() {
        let v = evaluate(&truth(&[(16, 25, "duration")]), &output(&[("duration", 16, 17)]));
        assert!(!v.correct);
        assert!(!v.missed_entity);
        assert!(v.incorrect_span);
    }

    #[test]
    fn test_both_reasons_in_one_query() {
        let v = evaluate(
            &truth(&[(0, 1, "number"), (5, 9, "time")]),
            &output(&[("number", 0, 2)]),
        );
        assert!(!v.correct);
        assert!(v.missed_entity);
        assert!(v.incorrect_span);
    }

    #[test]
    fn test_empty_ground_truth_is_correct() {
        assert!(evaluate(&[], &output(&[("number", 0, 1)])).correct);
    }

    #[test]
    fn test_sets_partition_the_corpus() {
        let t0 = truth(&[(0, 1, "number")]);
        let t1 = truth(&[(0, 1, "number")]);
        let t2 = truth(&[(0, 4, "time")]);
        let o0 = output(&[("number", 0, 1)]);
        let o1 = output(&[("number", 0, 3)]);
        let o2 = NormalizedOutput::new();

        let sets = evaluate_all(vec![
            (0, t0.as_slice(), &o0),
            (1, t1.as_slice(), &o1),
            (2, t2.as_slice(), &o2),
        ]);

        assert_eq!(sets.correct, BTreeSet::from([0]));
        assert_eq!(sets.incorrect, BTreeSet::from([1, 2]));
        assert_eq!(sets.incorrect_span, BTreeSet::from([1]));
        assert_eq!(sets.missed_entity, BTreeSet::from([2]));
        assert_eq!(sets.total(), 3);
        assert!((sets.accuracy() - 1.0 / 3.0).abs() < 1e-9);
    }
}
