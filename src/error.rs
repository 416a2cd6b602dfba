//! Error types for the reference engine

use thiserror::Error;

/// Main error type for engine operations
#[derive(Error, Debug)]
pub enum EngineError {
    /// YAML parsing error while loading a table
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// IO error (table file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed or inconsistent static table data (fatal at startup)
    #[error("Invalid {table} table: {detail}")]
    InvalidTable { table: String, detail: String },

    /// The same normalized name maps to more than one book within a language
    #[error("Ambiguous name entry in '{language}': '{name}' registered for both {first} and {second}")]
    AmbiguousNameEntry {
        language: String,
        name: String,
        first: String,
        second: String,
    },

    /// Book code outside the closed registry set
    #[error("Unknown book code: {0}")]
    UnknownBookCode(String),

    /// Publication order name not loaded
    #[error("Unknown book order: {0}")]
    UnknownOrderName(String),

    /// Versification system name not loaded
    #[error("Unknown versification system: {0}")]
    UnknownSystem(String),

    /// Language tag has no name table
    #[error("Unknown language: {0}")]
    UnknownLanguage(String),

    /// Book not covered by the named versification system
    #[error("Book {book} not in versification system '{system}'")]
    UnknownBookInSystem { system: String, book: String },

    /// Chapter outside the book's chapter range for the system
    #[error("Chapter {chapter} not in {book} under '{system}'")]
    UnknownChapter {
        system: String,
        book: String,
        chapter: u32,
    },

    /// Reference handed to the mapper is not valid under its declared system
    #[error("Invalid source reference {book} {chapter}:{verse} under '{system}'")]
    InvalidSourceReference {
        system: String,
        book: String,
        chapter: u32,
        verse: u32,
    },

    /// A computed mapping failed target-side validation (bad irregularity data)
    #[error("Mapping inconsistency: {book} {chapter}:{verse} has no valid counterpart in '{target}': {detail}")]
    MappingInconsistency {
        target: String,
        book: String,
        chapter: u32,
        verse: u32,
        detail: String,
    },
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::UnknownBookCode("XXX".to_string());
        assert_eq!(err.to_string(), "Unknown book code: XXX");
    }

    #[test]
    fn test_unknown_chapter_display() {
        let err = EngineError::UnknownChapter {
            system: "KJV".to_string(),
            book: "GEN".to_string(),
            chapter: 51,
        };
        assert_eq!(err.to_string(), "Chapter 51 not in GEN under 'KJV'");
    }

    #[test]
    fn test_invalid_source_reference_display() {
        let err = EngineError::InvalidSourceReference {
            system: "Vulgate".to_string(),
            book: "PSA".to_string(),
            chapter: 9,
            verse: 99,
        };
        assert_eq!(
            err.to_string(),
            "Invalid source reference PSA 9:99 under 'Vulgate'"
        );
    }
}
