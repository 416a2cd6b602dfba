//! Service facade over the reference tables
//!
//! Bundles the four tables behind one construction phase: everything
//! is built from configuration records up front (the build barrier),
//! published as immutable shared data, and then serves unlimited
//! concurrent read-only queries. Components that need a table receive
//! it as an explicit `Arc` dependency; there are no ambient globals.
//!
//! # Example
//!
//! ```ignore
//! use bibleref_engine::{ReferenceService, ReferenceOutcome};
//!
//! let service = ReferenceService::from_yaml(books, orders, systems, names)?;
//! match service.parse_reference("en", "1st Tim", 3, 16, "KJV")? {
//!     ReferenceOutcome::Resolved(reference) => {
//!         let mapped = service.map(&reference, "Vulgate")?;
//!     }
//!     other => println!("could not parse: {other:?}"),
//! }
//! ```

use crate::error::{EngineError, Result};
use crate::mapper::ReferenceMapper;
use crate::names::{LanguageNamesRecord, NameResolver};
use crate::order::{BookOrderRecord, BookOrderTable};
use crate::registry::{BookRecord, BookRegistry};
use crate::types::{BookCode, CanonicalReference, Resolution};
use crate::versification::{VersificationSystemRecord, VersificationTable};
use std::sync::Arc;
use tracing::debug;

/// Outcome of parsing raw user/document input into a reference.
///
/// Everything except `Resolved` is an expected miss the caller
/// branches on; none of these are errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceOutcome {
    /// Input resolved and validated
    Resolved(CanonicalReference),
    /// The book text matched more than one book
    AmbiguousBook(Vec<BookCode>),
    /// The book text matched nothing in the language
    UnknownBook,
    /// The book resolved but the chapter/verse is not valid under the
    /// requested system
    InvalidReference(CanonicalReference),
}

/// Immutable, share-everything facade over the loaded tables.
///
/// `Send + Sync`; clone the `Arc`s out of it or share the whole
/// service behind its own `Arc`.
pub struct ReferenceService {
    registry: Arc<BookRegistry>,
    orders: Arc<BookOrderTable>,
    versification: Arc<VersificationTable>,
    names: Arc<NameResolver>,
    mapper: ReferenceMapper,
}

impl ReferenceService {
    /// Build every table from already-parsed configuration records.
    ///
    /// # Errors
    /// Any `InvalidTable`/`AmbiguousNameEntry` from table construction;
    /// nothing is served if any table fails to build.
    pub fn from_records(
        books: Vec<BookRecord>,
        orders: Vec<BookOrderRecord>,
        systems: Vec<VersificationSystemRecord>,
        names: Vec<LanguageNamesRecord>,
    ) -> Result<Self> {
        let registry = Arc::new(BookRegistry::from_records(books)?);
        let orders = Arc::new(BookOrderTable::from_records(&registry, orders)?);
        let versification = Arc::new(VersificationTable::from_records(&registry, systems)?);
        let names = Arc::new(NameResolver::from_records(&registry, names)?);
        let mapper = ReferenceMapper::new(Arc::clone(&versification));

        debug!(
            books = registry.len(),
            orders = orders.order_names().len(),
            systems = versification.system_names().len(),
            languages = names.language_tags().len(),
            "reference service built"
        );
        Ok(Self {
            registry,
            orders,
            versification,
            names,
            mapper,
        })
    }

    /// Build every table from YAML text
    pub fn from_yaml(
        books_yaml: &str,
        orders_yaml: &str,
        systems_yaml: &str,
        names_yaml: &str,
    ) -> Result<Self> {
        Self::from_records(
            serde_yaml_ng::from_str(books_yaml)?,
            serde_yaml_ng::from_str(orders_yaml)?,
            serde_yaml_ng::from_str(systems_yaml)?,
            serde_yaml_ng::from_str(names_yaml)?,
        )
    }

    /// The book registry
    pub fn registry(&self) -> &Arc<BookRegistry> {
        &self.registry
    }

    /// The publication order table
    pub fn orders(&self) -> &Arc<BookOrderTable> {
        &self.orders
    }

    /// The versification table
    pub fn versification(&self) -> &Arc<VersificationTable> {
        &self.versification
    }

    /// The name resolver
    pub fn names(&self) -> &Arc<NameResolver> {
        &self.names
    }

    /// The reference mapper
    pub fn mapper(&self) -> &ReferenceMapper {
        &self.mapper
    }

    /// Resolve raw book text plus (chapter, verse) integers into a
    /// canonical reference valid under the named system.
    ///
    /// # Errors
    /// `UnknownLanguage` / `UnknownSystem` only; resolution misses and
    /// invalid coordinates are [`ReferenceOutcome`] values.
    pub fn parse_reference(
        &self,
        language_tag: &str,
        book_text: &str,
        chapter: u32,
        verse: u32,
        system: &str,
    ) -> Result<ReferenceOutcome> {
        let resolution = self.names.resolve(language_tag, book_text)?;
        self.finish_parse(resolution, chapter, verse, system)
    }

    /// As [`parse_reference`](Self::parse_reference), with candidate
    /// books restricted to a scope (a division's book list or a
    /// publication order's sequence)
    pub fn parse_reference_scoped(
        &self,
        language_tag: &str,
        book_text: &str,
        scope: &[BookCode],
        chapter: u32,
        verse: u32,
        system: &str,
    ) -> Result<ReferenceOutcome> {
        let resolution = self.names.resolve_scoped(language_tag, book_text, scope)?;
        self.finish_parse(resolution, chapter, verse, system)
    }

    fn finish_parse(
        &self,
        resolution: Resolution,
        chapter: u32,
        verse: u32,
        system: &str,
    ) -> Result<ReferenceOutcome> {
        let book = match resolution {
            Resolution::Match(code) => code,
            Resolution::Ambiguous(candidates) => {
                return Ok(ReferenceOutcome::AmbiguousBook(candidates));
            }
            Resolution::NotFound => return Ok(ReferenceOutcome::UnknownBook),
        };
        let reference = CanonicalReference::new(book, chapter, verse, system);

        // Intro coordinates validate trivially
        let valid = if chapter == 0 || verse == 0 {
            self.versification.contains_book(system, book)?
        } else {
            match self.versification.is_valid_verse(system, book, chapter, verse) {
                Ok(valid) => valid,
                Err(EngineError::UnknownSystem(name)) => {
                    return Err(EngineError::UnknownSystem(name));
                }
                Err(_) => false,
            }
        };
        if valid {
            Ok(ReferenceOutcome::Resolved(reference))
        } else {
            Ok(ReferenceOutcome::InvalidReference(reference))
        }
    }

    /// Map a canonical reference into another versification system
    pub fn map(
        &self,
        reference: &CanonicalReference,
        to_system: &str,
    ) -> Result<Vec<CanonicalReference>> {
        self.mapper.map(reference, to_system)
    }

    /// Map a reference for a specific publication: `Ok(None)` when the
    /// publication's book order excludes the book (an expected
    /// outcome), otherwise the mapped references.
    pub fn map_for_publication(
        &self,
        reference: &CanonicalReference,
        to_system: &str,
        order_name: &str,
    ) -> Result<Option<Vec<CanonicalReference>>> {
        if self.orders.position_of(order_name, reference.book)?.is_none() {
            return Ok(None);
        }
        Ok(Some(self.mapper.map(reference, to_system)?))
    }
}
