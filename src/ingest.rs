//! Ingestion boundary: turn messy producer output into [`RawAnnotation`]s.
//!
//! Annotation producers are LLMs and grammar tools. Their output arrives as
//! JSON wrapped in markdown fences, with field shapes that drift between
//! producer revisions (argument `claim`/`evidence` sometimes nested under
//! `parts`, sometimes flat). All of that variance is absorbed here; the
//! locator and compositor only ever see the canonical [`RawAnnotation`]
//! shape.
//!
//! Transient parse failures are handled with an explicit bounded retry loop
//! ([`parse_with_retries`]), never unbounded recursion.

use crate::annotation::{Category, RawAnnotation, Suggestion};
use crate::error::{Error, Result};
use serde::Deserialize;

/// A correction record as producers send it.
///
/// Every field is defaulted so one malformed record degrades to a
/// `Malformed` drop at location time instead of sinking the whole batch.
#[derive(Debug, Clone, Deserialize)]
struct WireCorrection {
    #[serde(default)]
    error: String,
    #[serde(default)]
    context: Option<String>,
    #[serde(default)]
    suggestion: Option<Suggestion>,
    /// Producers occasionally emit negative offsets; those are discarded.
    #[serde(default)]
    offset: Option<i64>,
    #[serde(default)]
    length: Option<i64>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

impl WireCorrection {
    fn into_annotation(self) -> RawAnnotation {
        RawAnnotation {
            error: self.error,
            context: self.context,
            offset: self.offset.and_then(|v| usize::try_from(v).ok()),
            length: self.length.and_then(|v| usize::try_from(v).ok()),
            category: self
                .kind
                .as_deref()
                .map(Category::from_label)
                .unwrap_or_default(),
            suggestion: self.suggestion,
        }
    }
}

/// Claim/evidence breakdown; some producer revisions nest it under `parts`.
#[derive(Debug, Clone, Default, Deserialize)]
struct WireArgumentParts {
    #[serde(default)]
    claim: Option<String>,
    #[serde(default)]
    evidence: Option<String>,
    #[serde(default)]
    counterargument: Option<String>,
}

/// An argument record as producers send it, tolerant of both the flat and
/// the `parts`-nested field shape.
#[derive(Debug, Clone, Deserialize)]
struct WireArgument {
    #[serde(default)]
    context: String,
    #[serde(default)]
    claim: Option<String>,
    #[serde(default)]
    evidence: Option<String>,
    #[serde(default)]
    counterargument: Option<String>,
    #[serde(default)]
    parts: Option<WireArgumentParts>,
    #[serde(default)]
    feedback: Option<String>,
    #[serde(default)]
    actionable_feedback: Option<String>,
}

/// A normalized argument: the full excerpt plus its breakdown and feedback.
///
/// The excerpt doubles as the annotation's error text (newlines collapsed,
/// so the locator's normalized-view strategy can find it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentRecord {
    /// The full argument excerpt as quoted by the producer.
    pub context: String,
    /// The main assertion.
    pub claim: Option<String>,
    /// Support offered for the claim.
    pub evidence: Option<String>,
    /// Opposing viewpoint, if the producer identified one.
    pub counterargument: Option<String>,
    /// What is weak about the argument.
    pub feedback: Option<String>,
    /// Concrete steps to improve it.
    pub actionable_feedback: Option<String>,
}

impl ArgumentRecord {
    /// Convert to an annotation for the locator.
    ///
    /// The excerpt's newlines are collapsed to spaces so the error text
    /// passes the single-line rule; the locator's normalized matching still
    /// finds the multi-line original.
    #[must_use]
    pub fn to_annotation(&self) -> RawAnnotation {
        RawAnnotation::new(self.context.replace('\n', " "), Category::Argument)
    }
}

impl From<WireArgument> for ArgumentRecord {
    fn from(wire: WireArgument) -> Self {
        let parts = wire.parts.unwrap_or_default();
        ArgumentRecord {
            context: wire.context,
            claim: wire.claim.or(parts.claim),
            evidence: wire.evidence.or(parts.evidence),
            counterargument: wire.counterargument.or(parts.counterargument),
            feedback: wire.feedback,
            actionable_feedback: wire.actionable_feedback,
        }
    }
}

/// Extract the JSON array from potentially messy LLM output.
///
/// Handles raw arrays, ```json fences, and arrays embedded in surrounding
/// prose, in that order.
pub fn extract_json_payload(text: &str) -> Result<&str> {
    let trimmed = text.trim();
    if trimmed.starts_with('[') {
        if let Some(end) = trimmed.rfind(']') {
            return Ok(&trimmed[..=end]);
        }
    }

    if let Some(fence) = text.find("```json") {
        let body = &text[fence + 7..];
        if let Some(end) = body.find("```") {
            let payload = body[..end].trim();
            if payload.starts_with('[') {
                return Ok(payload);
            }
        }
    }

    if let Some(start) = text.find('[') {
        if let Some(end) = text.rfind(']') {
            if end > start {
                return Ok(&text[start..=end]);
            }
        }
    }

    Err(Error::NoJsonFound)
}

/// Parse a correction payload into annotations.
///
/// Accepts the raw producer response (fences and all).
pub fn parse_corrections(response: &str) -> Result<Vec<RawAnnotation>> {
    let payload = extract_json_payload(response)?;
    let wire: Vec<WireCorrection> =
        serde_json::from_str(payload).map_err(|e| Error::parse(e.to_string()))?;
    Ok(wire.into_iter().map(WireCorrection::into_annotation).collect())
}

/// Parse an argument payload into normalized records.
pub fn parse_arguments(response: &str) -> Result<Vec<ArgumentRecord>> {
    let payload = extract_json_payload(response)?;
    let wire: Vec<WireArgument> =
        serde_json::from_str(payload).map_err(|e| Error::parse(e.to_string()))?;
    Ok(wire.into_iter().map(ArgumentRecord::from).collect())
}

/// Run a fallible fetch-and-parse step with bounded retries.
///
/// Retries on any error up to `max_attempts` total attempts, logging each
/// failure, then returns [`Error::RetryExhausted`]. Replaces the
/// retry-by-recursion pattern with an explicit terminal state.
pub fn parse_with_retries<T, F>(max_attempts: usize, mut attempt: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    if max_attempts == 0 {
        return Err(Error::invalid_input("max_attempts must be at least 1"));
    }
    let mut last = String::new();
    for n in 1..=max_attempts {
        match attempt() {
            Ok(value) => return Ok(value),
            Err(e) => {
                log::warn!("parse attempt {n}/{max_attempts} failed: {e}");
                last = e.to_string();
            }
        }
    }
    Err(Error::retry_exhausted(max_attempts, last))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_raw_array() {
        assert_eq!(extract_json_payload(r#"[{"a": 1}]"#).unwrap(), r#"[{"a": 1}]"#);
    }

    #[test]
    fn test_extract_fenced_array() {
        let response = "Here you go:\n```json\n[{\"error\": \"teh\"}]\n```\nDone.";
        assert_eq!(extract_json_payload(response).unwrap(), r#"[{"error": "teh"}]"#);
    }

    #[test]
    fn test_extract_embedded_array() {
        let response = "Sure! [1, 2, 3] is the answer.";
        assert_eq!(extract_json_payload(response).unwrap(), "[1, 2, 3]");
    }

    #[test]
    fn test_extract_no_json() {
        assert!(matches!(
            extract_json_payload("no structure here"),
            Err(Error::NoJsonFound)
        ));
    }

    #[test]
    fn test_parse_corrections_full_record() {
        let response = r#"[{
            "error": "teh",
            "context": "fix teh bug",
            "suggestion": "the",
            "offset": 4,
            "length": 3,
            "type": "spelling"
        }]"#;
        let annotations = parse_corrections(response).unwrap();
        assert_eq!(annotations.len(), 1);
        let a = &annotations[0];
        assert_eq!(a.error, "teh");
        assert_eq!(a.context.as_deref(), Some("fix teh bug"));
        assert_eq!(a.offset, Some(4));
        assert_eq!(a.length, Some(3));
        assert_eq!(a.category, Category::Spelling);
        assert_eq!(a.suggestion, Some(Suggestion::One("the".into())));
    }

    #[test]
    fn test_parse_corrections_suggestion_list_and_negative_offset() {
        let response = r#"[{
            "error": "recieve",
            "suggestion": ["receive", "receives"],
            "offset": -1,
            "type": "misspelling"
        }]"#;
        let annotations = parse_corrections(response).unwrap();
        let a = &annotations[0];
        assert_eq!(a.offset, None);
        assert_eq!(a.category, Category::Spelling);
        assert_eq!(
            a.suggestion,
            Some(Suggestion::Many(vec!["receive".into(), "receives".into()]))
        );
    }

    #[test]
    fn test_parse_corrections_missing_fields_tolerated() {
        // A record with no error text still parses; the locator will drop
        // it as malformed without affecting its neighbors.
        let response = r#"[{"type": "grammar"}, {"error": "ok", "type": "style"}]"#;
        let annotations = parse_corrections(response).unwrap();
        assert_eq!(annotations.len(), 2);
        assert_eq!(annotations[0].error, "");
        assert_eq!(annotations[1].category, Category::Style);
    }

    #[test]
    fn test_parse_arguments_flat_shape() {
        let response = r#"[{
            "context": "Dogs are better than cats because they are loyal.",
            "claim": "Dogs are better than cats",
            "evidence": "they are loyal",
            "feedback": "Loyalty is asserted, not demonstrated."
        }]"#;
        let records = parse_arguments(response).unwrap();
        assert_eq!(records[0].claim.as_deref(), Some("Dogs are better than cats"));
        assert_eq!(records[0].evidence.as_deref(), Some("they are loyal"));
    }

    #[test]
    fn test_parse_arguments_nested_parts_shape() {
        let response = r#"[{
            "context": "Dogs are better than cats because they are loyal.",
            "parts": {
                "claim": "Dogs are better than cats",
                "evidence": "they are loyal",
                "counterargument": "Cats are independent."
            }
        }]"#;
        let records = parse_arguments(response).unwrap();
        assert_eq!(records[0].claim.as_deref(), Some("Dogs are better than cats"));
        assert_eq!(
            records[0].counterargument.as_deref(),
            Some("Cats are independent.")
        );
    }

    #[test]
    fn test_argument_to_annotation_collapses_newlines() {
        let record = ArgumentRecord {
            context: "spans\ntwo lines".into(),
            claim: None,
            evidence: None,
            counterargument: None,
            feedback: None,
            actionable_feedback: None,
        };
        let annotation = record.to_annotation();
        assert_eq!(annotation.error, "spans two lines");
        assert_eq!(annotation.category, Category::Argument);
    }

    #[test]
    fn test_retry_succeeds_on_second_attempt() {
        let mut calls = 0;
        let result = parse_with_retries(3, || {
            calls += 1;
            if calls < 2 {
                Err(Error::parse("transient"))
            } else {
                Ok(42)
            }
        });
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_retry_exhausts() {
        let mut calls = 0;
        let result: Result<()> = parse_with_retries(3, || {
            calls += 1;
            Err(Error::parse("still broken"))
        });
        assert_eq!(calls, 3);
        assert!(matches!(
            result,
            Err(Error::RetryExhausted { attempts: 3, .. })
        ));
    }

    #[test]
    fn test_retry_zero_attempts_rejected() {
        let result: Result<()> = parse_with_retries(0, || Ok(()));
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
