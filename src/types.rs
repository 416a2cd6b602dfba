//! Core types for the reference engine

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed-width book/division identifier (exactly 3 ASCII characters).
///
/// Codes are drawn from a closed, versioned set defined by the
/// [`BookRegistry`](crate::registry::BookRegistry) at table-load time.
/// Raw text is validated for shape here and for set membership at the
/// registry boundary; downstream components only ever see codes that
/// passed both checks.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BookCode([u8; 3]);

impl BookCode {
    /// Parse a raw code string, checking shape only (3 ASCII uppercase
    /// letters or digits). Set membership is the registry's concern.
    ///
    /// # Errors
    /// Returns `EngineError::UnknownBookCode` for anything that cannot
    /// be a code at all.
    pub fn parse(text: &str) -> Result<Self> {
        let bytes = text.as_bytes();
        if bytes.len() != 3
            || !bytes
                .iter()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        {
            return Err(EngineError::UnknownBookCode(text.to_string()));
        }
        Ok(Self([bytes[0], bytes[1], bytes[2]]))
    }

    /// The code as a string slice
    pub fn as_str(&self) -> &str {
        // Constructed only from validated ASCII
        std::str::from_utf8(&self.0).unwrap_or("???")
    }
}

impl fmt::Display for BookCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Debug for BookCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BookCode({})", self.as_str())
    }
}

impl Serialize for BookCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for BookCode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        BookCode::parse(&text).map_err(serde::de::Error::custom)
    }
}

/// Testament / canon area classification for a book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Testament {
    /// Hebrew scriptures
    Old,
    /// Greek scriptures
    New,
    /// Deuterocanonical / apocryphal books
    Deuterocanon,
    /// Front/back matter, glossaries, other divisions
    Other,
}

/// Outcome of a name resolution query.
///
/// Ambiguity and absence are expected outcomes a caller branches on,
/// never errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Exactly one book is consistent with the input
    Match(BookCode),
    /// More than one book remains consistent; candidates sorted by code
    Ambiguous(Vec<BookCode>),
    /// No registered name or abbreviation matches
    NotFound,
}

impl Resolution {
    /// The matched code, if the resolution was unambiguous
    pub fn matched(&self) -> Option<BookCode> {
        match self {
            Resolution::Match(code) => Some(*code),
            _ => None,
        }
    }
}

/// A (book, chapter, verse) triple tagged with the versification system
/// it is valid under.
///
/// Chapter 0 and verse 0 are reserved for book/chapter introduction
/// material in some source formats; the mapper passes them through
/// unchanged. Mapping never mutates a reference in place, it produces
/// fresh values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalReference {
    /// Book this reference points into
    pub book: BookCode,
    /// Chapter number (0 = book introduction)
    pub chapter: u32,
    /// Verse number (0 = chapter introduction)
    pub verse: u32,
    /// Versification system the coordinates are valid under
    pub system: String,
}

impl CanonicalReference {
    /// Create a new reference
    pub fn new(book: BookCode, chapter: u32, verse: u32, system: impl Into<String>) -> Self {
        Self {
            book,
            chapter,
            verse,
            system: system.into(),
        }
    }

    /// Copy of this reference re-tagged with another system, coordinates
    /// unchanged. Used for identity mappings and intro passthrough.
    pub fn retagged(&self, system: impl Into<String>) -> Self {
        Self {
            book: self.book,
            chapter: self.chapter,
            verse: self.verse,
            system: system.into(),
        }
    }
}

impl fmt::Display for CanonicalReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}:{} ({})",
            self.book, self.chapter, self.verse, self.system
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_code_parse_valid() {
        let code = BookCode::parse("GEN").unwrap();
        assert_eq!(code.as_str(), "GEN");
        assert_eq!(code.to_string(), "GEN");
    }

    #[test]
    fn test_book_code_parse_digits() {
        // Codes like CO1/JN2 mix letters and digits
        assert!(BookCode::parse("CO1").is_ok());
        assert!(BookCode::parse("JN3").is_ok());
    }

    #[test]
    fn test_book_code_parse_invalid() {
        assert!(BookCode::parse("").is_err());
        assert!(BookCode::parse("GE").is_err());
        assert!(BookCode::parse("GENE").is_err());
        assert!(BookCode::parse("gen").is_err());
        assert!(BookCode::parse("G N").is_err());
    }

    #[test]
    fn test_reference_retagged() {
        let gen = BookCode::parse("GEN").unwrap();
        let original = CanonicalReference::new(gen, 1, 1, "KJV");
        let retagged = original.retagged("Vulgate");
        assert_eq!(retagged.book, gen);
        assert_eq!(retagged.chapter, 1);
        assert_eq!(retagged.verse, 1);
        assert_eq!(retagged.system, "Vulgate");
        // Original untouched
        assert_eq!(original.system, "KJV");
    }

    #[test]
    fn test_reference_display() {
        let psa = BookCode::parse("PSA").unwrap();
        let reference = CanonicalReference::new(psa, 23, 1, "KJV");
        assert_eq!(reference.to_string(), "PSA 23:1 (KJV)");
    }

    #[test]
    fn test_resolution_matched() {
        let gen = BookCode::parse("GEN").unwrap();
        assert_eq!(Resolution::Match(gen).matched(), Some(gen));
        assert_eq!(Resolution::NotFound.matched(), None);
        assert_eq!(Resolution::Ambiguous(vec![gen]).matched(), None);
    }
}
