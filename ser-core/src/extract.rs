//! Ground-truth span extraction from inline-annotated queries.
//!
//! Annotated queries carry markers of the form `{text|sys_<dimension>}`,
//! optionally followed by a role (`{text|sys_time:start}` or
//! `{text|sys_time|start}`). Markers for non-system entities such as
//! `{pizza|dish}` are ignored.

use std::sync::OnceLock;

use regex::Regex;

use crate::types::{EntitySpan, Error, Result, Span};

const SYS_PREFIX: &str = "sys_";

fn marker_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{([^{}|]+)\|sys_([^\s|:}]+)(?:[|:][^\s}]*)?\}")
            .expect("marker pattern is valid")
    })
}

/// A system-entity marker found in an annotated query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker<'a> {
    pub text: &'a str,
    pub dimension: &'a str,
}

/// All system-entity markers in `annotated`, left to right.
pub fn markers(annotated: &str) -> Vec<Marker<'_>> {
    marker_pattern()
        .captures_iter(annotated)
        .filter_map(|caps| {
            Some(Marker {
                text: caps.get(1)?.as_str(),
                dimension: caps.get(2)?.as_str(),
            })
        })
        .collect()
}

/// Strip the `sys_` prefix and any role suffix from a raw marker label.
pub fn dimension_of(label: &str) -> &str {
    let label = label.strip_prefix(SYS_PREFIX).unwrap_or(label);
    let end = label.find(['|', ':']).unwrap_or(label.len());
    &label[..end]
}

/// Extract ground-truth entity spans for one query.
///
/// Each marker's text is searched in `clean` starting after the end of the
/// previous match, so repeated literals get successive positions. Offsets are
/// character offsets. A marker whose text cannot be found is a desync between
/// the clean and annotated corpora.
pub fn extract(clean: &str, annotated: &str) -> Result<Vec<EntitySpan>> {
    let mut spans = Vec::new();
    let mut byte_cursor = 0;
    let mut char_cursor = 0;

    for marker in markers(annotated) {
        let found = clean[byte_cursor..].find(marker.text).ok_or_else(|| Error::CorpusDesync {
            query: None,
            entity: marker.text.to_string(),
            cursor: char_cursor,
        })?;

        let match_byte = byte_cursor + found;
        let start = char_cursor + clean[byte_cursor..match_byte].chars().count();
        let end = start + marker.text.chars().count();

        spans.push(EntitySpan::new(Span::new(start, end)?, dimension_of(marker.dimension)));

        byte_cursor = match_byte + marker.text.len();
        char_cursor = end;
    }

    Ok(spans)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triples(spans: &[EntitySpan]) -> Vec<(usize, usize, &str)> {
        spans.iter().map(|e| (e.start(), e.end(), e.label.as_str())).collect()
    }

    #[test]
    fn test_single_marker() {
        let spans = extract(
            "set a timer for 5 minutes",
            "set a timer for {5 minutes|sys_duration}",
        )
        .unwrap();
        assert_eq!(triples(&spans), vec![(16, 25, "duration")]);
    }

    #[test]
    fn test_repeated_literal_advances_cursor() {
        let spans = extract(
            "add 2 and 2",
            "add {2|sys_number} and {2|sys_number}",
        )
        .unwrap();
        assert_eq!(triples(&spans), vec![(4, 5, "number"), (10, 11, "number")]);
    }

    #[test]
    fn test_role_suffixes_are_trimmed() {
        let spans = extract(
            "from 5 pm to 7 pm",
            "from {5 pm|sys_time:start} to {7 pm|sys_time|end}",
        )
        .unwrap();
        assert_eq!(triples(&spans), vec![(5, 9, "time"), (13, 17, "time")]);
    }

    #[test]
    fn test_non_system_markers_ignored() {
        let spans = extract(
            "order pizza for 7 pm",
            "order {pizza|dish} for {7 pm|sys_time}",
        )
        .unwrap();
        assert_eq!(triples(&spans), vec![(16, 20, "time")]);
    }

    #[test]
    fn test_hyphenated_dimension() {
        let spans = extract("send $20", "send {$20|sys_amount-of-money}").unwrap();
        assert_eq!(triples(&spans), vec![(5, 8, "amount-of-money")]);
    }

    #[test]
    fn test_offsets_are_characters_not_bytes() {
        let spans = extract(
            "café at 5 pm",
            "café at {5 pm|sys_time}",
        )
        .unwrap();
        assert_eq!(triples(&spans), vec![(8, 12, "time")]);
    }

    #[test]
    fn test_no_markers() {
        assert!(extract("hello there", "hello there").unwrap().is_empty());
    }

    #[test]
    fn test_desync_is_an_error() {
        let err = extract("set a timer", "set a {5 minute|sys_duration} timer").unwrap_err();
        match err {
            Error::CorpusDesync { entity, cursor, query } => {
                assert_eq!(entity, "5 minute");
                assert_eq!(cursor, 0);
                assert_eq!(query, None);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_out_of_order_marker_is_desync() {
        // Second marker text only occurs before the first match.
        let err = extract("3 then 4", "{4|sys_number} then {3|sys_number}").unwrap_err();
        assert!(matches!(err, Error::CorpusDesync { .. }));
    }

    #[test]
    fn test_dimension_of() {
        assert_eq!(dimension_of("sys_time"), "time");
        assert_eq!(dimension_of("sys_time|start"), "time");
        assert_eq!(dimension_of("sys_time:end"), "time");
        assert_eq!(dimension_of("number"), "number");
    }
}
