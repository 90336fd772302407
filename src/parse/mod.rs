//! Lezen en schrijven van scene-markup.

use std::fmt;

use thiserror::Error;

use crate::scene::TreeError;

pub mod markup;
pub mod schema;

pub use markup::{Markup, MarkupSerializer, SerializerOptions, Written};
pub use schema::{Schema, SchemaError};

/// Result type voor de serializer.
pub type MarkupResult<T> = Result<T, MarkupError>;

/// Fatale fouten. Alles wat herstelbaar is komt als [`Violation`] terug.
#[derive(Debug, Error)]
pub enum MarkupError {
    /// De invoer is geen welgevormde XML.
    #[error("ongeldige XML op regel {line}, kolom {column}: {message}")]
    Malformed {
        line: usize,
        column: usize,
        message: String,
    },
    #[error("I/O-fout: {0}")]
    Io(#[from] std::io::Error),
    /// Schrijven van XML mislukte.
    #[error("XML schrijffout: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("schema kon niet geladen worden: {0}")]
    Schema(#[from] SchemaError),
    #[error("verwachtte wortelelement `{expected}`, vond `{found}`")]
    UnexpectedRoot {
        expected: &'static str,
        found: String,
    },
    #[error("boomfout: {0}")]
    Tree(#[from] TreeError),
}

/// Ernst van een herstelbare fout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Fout in de aangeleverde data.
    Data,
    /// Object model en schema lopen uiteen. Een programmeerfout.
    Developer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    UnknownElement,
    UnknownAttribute,
    InvalidValue,
    MissingRequired,
    MissingProperty,
    ModelMismatch,
    NamespaceMismatch,
}

/// Regel en kolom, beide vanaf 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextPosition {
    pub line: usize,
    pub column: usize,
}

impl TextPosition {
    /// Positie van byte-offset `offset` in `input`.
    #[must_use]
    pub fn locate(input: &str, offset: usize) -> Self {
        let mut end = offset.min(input.len());
        while !input.is_char_boundary(end) {
            end -= 1;
        }
        let before = &input[..end];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |idx| idx + 1);
        let column = before[line_start..].chars().count() + 1;
        Self { line, column }
    }
}

impl fmt::Display for TextPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Herstelbare fout die tijdens lezen of schrijven is verzameld.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub severity: Severity,
    pub kind: ViolationKind,
    /// Tag van het betrokken element.
    pub element: String,
    pub attribute: Option<String>,
    pub position: Option<TextPosition>,
    pub message: String,
}

impl Violation {
    #[must_use]
    pub fn new(
        severity: Severity,
        kind: ViolationKind,
        element: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            kind,
            element: element.into(),
            attribute: None,
            position: None,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    #[must_use]
    pub fn at(mut self, position: Option<TextPosition>) -> Self {
        self.position = position;
        self
    }
}

/// Dichtstbijzijnde kandidaat binnen twee bewerkingen, hoofdletterongevoelig.
pub(crate) fn closest_match<'a>(
    needle: &str,
    candidates: impl IntoIterator<Item = &'a str>,
) -> Option<&'a str> {
    let needle = needle.to_lowercase();
    candidates
        .into_iter()
        .map(|candidate| {
            (
                levenshtein::levenshtein(&needle, &candidate.to_lowercase()),
                candidate,
            )
        })
        .filter(|(distance, _)| *distance <= 2)
        .min_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)))
        .map(|(_, candidate)| candidate)
}

/// Achtervoegsel voor meldingen: ` (bedoeld: `x`?)` of niets.
pub(crate) fn suggestion(candidate: Option<&str>) -> String {
    candidate.map_or_else(String::new, |name| format!(" (bedoeld: `{name}`?)"))
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(position) = self.position {
            write!(f, "{position}: ")?;
        }
        write!(f, "[{:?}] <{}", self.severity, self.element)?;
        if let Some(attribute) = &self.attribute {
            write!(f, " {attribute}")?;
        }
        write!(f, "> {}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::{Severity, TextPosition, Violation, ViolationKind, closest_match};

    #[test]
    fn locate_counts_lines_and_columns() {
        let input = "<a>\n  <b/>\n</a>";
        assert_eq!(TextPosition::locate(input, 0), TextPosition { line: 1, column: 1 });
        assert_eq!(TextPosition::locate(input, 6), TextPosition { line: 2, column: 3 });
        assert_eq!(TextPosition::locate(input, 999).line, 3);
    }

    #[test]
    fn developer_is_more_severe_than_data() {
        assert!(Severity::Developer > Severity::Data);
    }

    #[test]
    fn violation_display_mentions_attribute() {
        let violation = Violation::new(
            Severity::Data,
            ViolationKind::InvalidValue,
            "Primitive",
            "ongeldige vector3-waarde `5`",
        )
        .with_attribute("position")
        .at(Some(TextPosition { line: 3, column: 5 }));
        assert_eq!(
            violation.to_string(),
            "3:5: [Data] <Primitive position> ongeldige vector3-waarde `5`"
        );
    }

    #[test]
    fn closest_match_tolerates_small_typos() {
        let tags = ["Camera", "Light", "Primitive"];
        assert_eq!(closest_match("camra", tags), Some("Camera"));
        assert_eq!(closest_match("Ligth", tags), Some("Light"));
        assert_eq!(closest_match("Teapot", tags), None);
    }
}
