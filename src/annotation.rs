//! Annotation types: what producers send in and what the locator resolves.

use serde::{Deserialize, Serialize};

/// Annotation category.
///
/// Producers label each annotation with a category that drives presentation
/// (which flag/underline class the renderer applies). Unknown labels are
/// preserved in `Other` rather than rejected.
///
/// Serializes as the lowercase wire label (`"spelling"`, `"grammar"`, ...),
/// matching what producers emit in their `type` field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    /// Spelling mistake.
    Spelling,
    /// Grammar mistake.
    Grammar,
    /// Style suggestion.
    Style,
    /// Argument span (claim/evidence structure flagged by an LLM).
    Argument,
    /// Anything else the producer labels.
    Other(String),
}

impl Category {
    /// Convert to the canonical label string.
    #[must_use]
    pub fn as_label(&self) -> &str {
        match self {
            Category::Spelling => "spelling",
            Category::Grammar => "grammar",
            Category::Style => "style",
            Category::Argument => "argument",
            Category::Other(s) => s.as_str(),
        }
    }

    /// Parse from a producer label.
    ///
    /// Tolerates the label variants seen across producers
    /// (LanguageTool reports spelling errors as `misspelling`).
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.to_lowercase().as_str() {
            "spelling" | "misspelling" | "typo" => Category::Spelling,
            "grammar" => Category::Grammar,
            "style" => Category::Style,
            "argument" => Category::Argument,
            other => Category::Other(other.to_string()),
        }
    }

    /// CSS class suffix the compositor attaches for this category.
    #[must_use]
    pub fn css_class(&self) -> &str {
        match self {
            Category::Spelling => "spelling",
            Category::Grammar => "grammar",
            Category::Style => "style",
            Category::Argument => "argument",
            Category::Other(_) => "other",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_label())
    }
}

impl Default for Category {
    /// Producers occasionally omit the `type` field; treat as uncategorized.
    fn default() -> Self {
        Category::Other("other".to_string())
    }
}

impl Serialize for Category {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_label())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Category::from_label(&label))
    }
}

/// Replacement text attached to an annotation.
///
/// Producers send either a single string or a list of alternatives;
/// both deserialize transparently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Suggestion {
    /// A single replacement.
    One(String),
    /// Ranked alternatives.
    Many(Vec<String>),
}

impl Suggestion {
    /// Render for display in a tooltip.
    ///
    /// Multiple alternatives are joined with `", "`.
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Suggestion::One(s) => s.clone(),
            Suggestion::Many(items) => items.join(", "),
        }
    }

    /// Whether there is any non-empty suggestion text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Suggestion::One(s) => s.is_empty(),
            Suggestion::Many(items) => items.iter().all(String::is_empty),
        }
    }
}

/// An externally produced annotation, before location.
///
/// The `offset`/`length` hints are *claimed* positions, often computed
/// against a differently-normalized copy of the document (newlines collapsed
/// to spaces), so they are revalidated rather than trusted. The `error` text
/// is authoritative for *what* was flagged; `context` disambiguates *where*.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawAnnotation {
    /// The exact substring the annotation refers to, as the producer saw it.
    #[serde(default)]
    pub error: String,
    /// A few words before and after the error, for disambiguation.
    #[serde(default)]
    pub context: Option<String>,
    /// Claimed start position, in characters. Unreliable.
    #[serde(default)]
    pub offset: Option<usize>,
    /// Claimed length, in characters.
    #[serde(default)]
    pub length: Option<usize>,
    /// Annotation category.
    #[serde(rename = "type", default)]
    pub category: Category,
    /// Replacement text shown as a tooltip. Never spliced into the document.
    #[serde(default)]
    pub suggestion: Option<Suggestion>,
}

impl RawAnnotation {
    /// Create an annotation with just the required fields.
    #[must_use]
    pub fn new(error: impl Into<String>, category: Category) -> Self {
        Self {
            error: error.into(),
            context: None,
            offset: None,
            length: None,
            category,
            suggestion: None,
        }
    }

    /// Attach a disambiguating context snippet.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Attach the producer's claimed offset/length hint.
    #[must_use]
    pub fn with_hint(mut self, offset: usize, length: usize) -> Self {
        self.offset = Some(offset);
        self.length = Some(length);
        self
    }

    /// Attach a suggestion.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: Suggestion) -> Self {
        self.suggestion = Some(suggestion);
        self
    }

    /// Tooltip text for this annotation (empty when there is no suggestion).
    #[must_use]
    pub fn tooltip(&self) -> String {
        match &self.suggestion {
            Some(s) if !s.is_empty() => format!("Suggestion: {}", s.display()),
            _ => String::new(),
        }
    }
}

/// A successfully located annotation span.
///
/// Offsets are **character** offsets into the original document, half-open:
/// `0 <= start <= end <= char_len(document)`. The char slice
/// `document[start..end]` is the annotated content under the matching
/// normalization rules (it may still contain the raw newlines the normalized
/// view collapsed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocatedSpan {
    /// Start character offset (inclusive).
    pub start: usize,
    /// End character offset (exclusive).
    pub end: usize,
    /// Annotation category, carried through to the markup.
    pub category: Category,
    /// Tooltip text (unescaped; the compositor escapes it for the attribute).
    pub tooltip: String,
}

impl LocatedSpan {
    /// Create a located span.
    #[must_use]
    pub fn new(start: usize, end: usize, category: Category, tooltip: impl Into<String>) -> Self {
        Self {
            start,
            end,
            category,
            tooltip: tooltip.into(),
        }
    }

    /// Character length of the span.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Check if the span is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Check if this span overlaps another.
    #[must_use]
    pub const fn overlaps(&self, other: &LocatedSpan) -> bool {
        !(self.end <= other.start || other.end <= self.start)
    }
}
