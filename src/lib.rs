//! Bible Reference Engine
//!
//! A Rust engine for normalizing references to passages of scripture.
//! This library provides functionality for:
//! - Resolving user-entered book names and abbreviations to canonical
//!   book codes, per language, including ordinal-leader variants
//! - Validating (book, chapter, verse) coordinates against named
//!   versification systems with their historical irregularities
//! - Translating canonical references between versification systems
//! - Querying publication book orders (denominational canons)
//!
//! # Example
//!
//! ```ignore
//! use bibleref_engine::{ReferenceService, ReferenceOutcome};
//!
//! let service = ReferenceService::from_yaml(books, orders, systems, names)?;
//!
//! if let ReferenceOutcome::Resolved(reference) =
//!     service.parse_reference("en", "1st Tim", 3, 16, "KJV")?
//! {
//!     let mapped = service.map(&reference, "Vulgate")?;
//! }
//! ```
//!
//! All tables are built once from configuration and immutable after;
//! every query is a pure, synchronous computation over shared data.

pub mod config;
pub mod error;
pub mod mapper;
pub mod names;
pub mod order;
pub mod registry;
pub mod service;
pub mod types;
pub mod versification;

// Re-export commonly used items
pub use error::{EngineError, Result};
pub use mapper::ReferenceMapper;
pub use names::{BookNameRecord, DivisionRecord, LanguageNamesRecord, NameResolver};
pub use order::{BookOrderRecord, BookOrderTable};
pub use registry::{BookMetadata, BookRecord, BookRegistry};
pub use service::{ReferenceOutcome, ReferenceService};
pub use types::{BookCode, CanonicalReference, Resolution, Testament};
pub use versification::{
    BookShapeRecord, ChapterRecord, ChapterShape, CombinedVerse, ReorderedVerse,
    VersificationSystemRecord, VersificationTable,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
