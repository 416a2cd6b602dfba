//! Book-name resolution
//!
//! Maps user-entered book names, abbreviations, and misspellings to a
//! book code for one language. Resolution works over a sorted prefix
//! index built once per language: every registered string (default
//! name, default abbreviation, input alternates) is case-folded,
//! leader-normalized, and registered in both spaced and space-stripped
//! forms. A query matches the set of books owning a registered string
//! the input is a prefix of; more than one book is `Ambiguous`, which
//! is reported, never silently resolved by priority order.
//!
//! Leaders are the ordinal prefixes distinguishing e.g. 1 Timothy from
//! 2 Timothy; the leader set maps the canonical leader ("1") to the
//! variants a user might type ("I", "First", "1st").
//!
//! # Example
//!
//! ```ignore
//! use bibleref_engine::{NameResolver, Resolution};
//!
//! let resolver = NameResolver::from_yaml_str(&registry, names_yaml)?;
//! assert_eq!(resolver.resolve("en", "1st Timothy")?, Resolution::Match(ti1));
//! ```

use crate::config::MAX_NAMES_PER_LANGUAGE;
use crate::error::{EngineError, Result};
use crate::registry::BookRegistry;
use crate::types::{BookCode, Resolution};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Configuration record for one book's names in one language
#[derive(Debug, Clone, Deserialize)]
pub struct BookNameRecord {
    /// Book code
    pub book: BookCode,
    /// Default full name
    pub name: String,
    /// Default abbreviation
    pub abbreviation: String,
    /// User-supplied alternates and known misspellings
    #[serde(default)]
    pub inputs: Vec<String>,
}

/// Configuration record for a named book grouping ("Old Testament")
#[derive(Debug, Clone, Deserialize)]
pub struct DivisionRecord {
    /// Default division name
    pub name: String,
    /// Default abbreviation
    pub abbreviation: String,
    /// User-supplied alternates
    #[serde(default)]
    pub inputs: Vec<String>,
    /// Books the division contains, in order
    pub books: Vec<BookCode>,
}

/// Configuration record for one language's complete name table
#[derive(Debug, Clone, Deserialize)]
pub struct LanguageNamesRecord {
    /// Language tag (e.g. "en", "pt-BR")
    pub language: String,
    /// Canonical leader -> typed variants
    #[serde(default)]
    pub leaders: HashMap<String, Vec<String>>,
    /// Per-book names
    pub books: Vec<BookNameRecord>,
    /// Named book groupings
    #[serde(default)]
    pub divisions: Vec<DivisionRecord>,
}

/// One registered string in the prefix index
#[derive(Debug, Clone)]
struct IndexEntry {
    /// Normalized registered text
    text: String,
    /// Book the text belongs to
    code: BookCode,
    /// Shortest prefix length at which this text is not shared by any
    /// string of a different book; `text.len() + 1` when even the full
    /// text prefixes another book's string
    cutoff: usize,
}

#[derive(Debug, Clone)]
struct Division {
    names: Vec<String>,
    books: Vec<BookCode>,
}

/// Built index for one language
#[derive(Debug)]
struct LanguageIndex {
    /// Sorted by text; binary-searched for prefix ranges
    entries: Vec<IndexEntry>,
    /// (variant, canonical) pairs, variants distinct from the canonical
    /// leader, longest variant first
    leaders: Vec<(String, String)>,
    /// Display name and abbreviation per book
    display: HashMap<BookCode, (String, String)>,
    divisions: Vec<Division>,
}

/// Name resolver over per-language prefix indexes.
///
/// All indexes are built at construction time; queries are read-only
/// and lock-free.
#[derive(Debug)]
pub struct NameResolver {
    languages: HashMap<String, LanguageIndex>,
    tags: Vec<String>,
}

/// Case-fold and collapse internal whitespace
fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_space = true;
    for ch in text.trim().chars() {
        if ch.is_whitespace() {
            if !last_space {
                out.push(' ');
                last_space = true;
            }
        } else {
            for upper in ch.to_uppercase() {
                out.push(upper);
            }
            last_space = false;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

impl NameResolver {
    /// Build resolver indexes from configuration records, checking
    /// every code against the registry.
    ///
    /// # Errors
    /// `InvalidTable` for unknown codes or duplicate languages;
    /// `AmbiguousNameEntry` when the same normalized string is
    /// registered for two different books within one language (a
    /// configuration tie, not a runtime condition).
    pub fn from_records(registry: &BookRegistry, records: Vec<LanguageNamesRecord>) -> Result<Self> {
        let mut languages = HashMap::with_capacity(records.len());
        let mut tags = Vec::with_capacity(records.len());

        for record in records {
            let index = Self::build_language(registry, &record)?;
            if languages.insert(record.language.clone(), index).is_some() {
                return Err(EngineError::InvalidTable {
                    table: "names".to_string(),
                    detail: format!("duplicate language '{}'", record.language),
                });
            }
            tags.push(record.language);
        }
        tags.sort();

        debug!(languages = tags.len(), "name resolver built");
        Ok(Self { languages, tags })
    }

    /// Parse language records from YAML text and build the resolver
    pub fn from_yaml_str(registry: &BookRegistry, yaml: &str) -> Result<Self> {
        let records: Vec<LanguageNamesRecord> = serde_yaml_ng::from_str(yaml)?;
        Self::from_records(registry, records)
    }

    /// Load language records from a YAML file and build the resolver
    pub fn from_yaml_file(registry: &BookRegistry, path: impl AsRef<Path>) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(registry, &yaml)
    }

    fn build_language(registry: &BookRegistry, record: &LanguageNamesRecord) -> Result<LanguageIndex> {
        let invalid = |detail: String| EngineError::InvalidTable {
            table: "names".to_string(),
            detail: format!("language '{}': {detail}", record.language),
        };

        // Leader variants, longest first so "II" is tried before "I"
        let mut leaders: Vec<(String, String)> = Vec::new();
        for (canonical, variants) in &record.leaders {
            let canonical = normalize(canonical);
            for variant in variants {
                let variant = normalize(variant);
                if variant.is_empty() {
                    return Err(invalid("empty leader variant".to_string()));
                }
                if variant != canonical {
                    leaders.push((variant, canonical.clone()));
                }
            }
        }
        leaders.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then(a.0.cmp(&b.0)));

        // Register every string in spaced and space-stripped form,
        // post leader normalization
        let mut seen: HashMap<String, BookCode> = HashMap::new();
        let mut display = HashMap::with_capacity(record.books.len());
        for book in &record.books {
            if !registry.contains(book.book) {
                return Err(invalid(format!("unknown code {}", book.book)));
            }
            if display
                .insert(book.book, (book.name.clone(), book.abbreviation.clone()))
                .is_some()
            {
                return Err(invalid(format!("{} listed twice", book.book)));
            }
            let mut raw = vec![book.name.as_str(), book.abbreviation.as_str()];
            raw.extend(book.inputs.iter().map(String::as_str));
            for text in raw {
                let normalized = normalize(text);
                if normalized.is_empty() {
                    return Err(invalid(format!("empty name entry for {}", book.book)));
                }
                for form in registered_forms(&normalized, &leaders) {
                    match seen.get(&form) {
                        Some(previous) if *previous != book.book => {
                            return Err(EngineError::AmbiguousNameEntry {
                                language: record.language.clone(),
                                name: form,
                                first: previous.to_string(),
                                second: book.book.to_string(),
                            });
                        }
                        Some(_) => {}
                        None => {
                            seen.insert(form, book.book);
                        }
                    }
                }
            }
        }
        if seen.len() > MAX_NAMES_PER_LANGUAGE {
            return Err(invalid(format!("{} name strings over limit", seen.len())));
        }

        let mut entries: Vec<IndexEntry> = seen
            .into_iter()
            .map(|(text, code)| IndexEntry {
                text,
                code,
                cutoff: 0,
            })
            .collect();
        entries.sort_by(|a, b| a.text.cmp(&b.text));
        compute_cutoffs(&mut entries);

        // Divisions
        let mut divisions = Vec::with_capacity(record.divisions.len());
        for division in &record.divisions {
            for code in &division.books {
                if !registry.contains(*code) {
                    return Err(invalid(format!(
                        "division '{}' lists unknown code {code}",
                        division.name
                    )));
                }
            }
            let mut names = vec![normalize(&division.name), normalize(&division.abbreviation)];
            names.extend(division.inputs.iter().map(|s| normalize(s)));
            let stripped: Vec<String> = names.iter().map(|n| n.replace(' ', "")).collect();
            names.extend(stripped);
            names.sort();
            names.dedup();
            divisions.push(Division {
                names,
                books: division.books.clone(),
            });
        }

        debug!(
            language = %record.language,
            entries = entries.len(),
            divisions = divisions.len(),
            "language name index built"
        );
        Ok(LanguageIndex {
            entries,
            leaders,
            display,
            divisions,
        })
    }

    fn language(&self, tag: &str) -> Result<&LanguageIndex> {
        self.languages
            .get(tag)
            .ok_or_else(|| EngineError::UnknownLanguage(tag.to_string()))
    }

    /// Resolve user text to a book code within a language.
    ///
    /// # Errors
    /// `UnknownLanguage` only; ambiguity and absence are
    /// [`Resolution`] outcomes.
    pub fn resolve(&self, language_tag: &str, input: &str) -> Result<Resolution> {
        self.resolve_filtered(language_tag, input, None)
    }

    /// Resolve restricted to a subset of books (e.g. one division or
    /// one publication order). A single letter can be unambiguous
    /// within a restricted canon while ambiguous globally.
    pub fn resolve_scoped(
        &self,
        language_tag: &str,
        input: &str,
        scope: &[BookCode],
    ) -> Result<Resolution> {
        self.resolve_filtered(language_tag, input, Some(scope))
    }

    fn resolve_filtered(
        &self,
        language_tag: &str,
        input: &str,
        scope: Option<&[BookCode]>,
    ) -> Result<Resolution> {
        let index = self.language(language_tag)?;
        let normalized = normalize(input);
        if normalized.is_empty() {
            return Ok(Resolution::NotFound);
        }

        let mut candidates: Vec<BookCode> = Vec::new();
        for query in query_forms(&normalized, &index.leaders) {
            collect_prefix_matches(&index.entries, &query, &mut candidates);
        }
        if let Some(scope) = scope {
            candidates.retain(|code| scope.contains(code));
        }
        candidates.sort();
        candidates.dedup();

        match candidates.len() {
            0 => Ok(Resolution::NotFound),
            1 => Ok(Resolution::Match(candidates[0])),
            _ => Ok(Resolution::Ambiguous(candidates)),
        }
    }

    /// Resolve a division name/abbreviation to its book list, usable as
    /// a scope for [`resolve_scoped`](Self::resolve_scoped).
    pub fn resolve_division(&self, language_tag: &str, input: &str) -> Result<Option<&[BookCode]>> {
        let index = self.language(language_tag)?;
        let normalized = normalize(input);
        let stripped = normalized.replace(' ', "");
        for division in &index.divisions {
            if division.names.iter().any(|n| *n == normalized || *n == stripped) {
                return Ok(Some(&division.books));
            }
        }
        Ok(None)
    }

    /// Default full name for a book in a language
    pub fn book_name(&self, language_tag: &str, code: BookCode) -> Result<Option<&str>> {
        Ok(self
            .language(language_tag)?
            .display
            .get(&code)
            .map(|(name, _)| name.as_str()))
    }

    /// Default abbreviation for a book in a language
    pub fn book_abbreviation(&self, language_tag: &str, code: BookCode) -> Result<Option<&str>> {
        Ok(self
            .language(language_tag)?
            .display
            .get(&code)
            .map(|(_, abbreviation)| abbreviation.as_str()))
    }

    /// Minimal unambiguous shortcut per book: the shortest registered
    /// prefix that resolves to that book and no other. Pure-digit
    /// prefixes and prefixes ending in a space are not usable as
    /// shortcuts and are extended until typeable.
    pub fn unambiguous_abbreviations(&self, language_tag: &str) -> Result<HashMap<BookCode, String>> {
        let index = self.language(language_tag)?;
        let mut best: HashMap<BookCode, String> = HashMap::new();
        for entry in &index.entries {
            // Extend past unusable prefixes (bare digits, trailing
            // space) to the shortest typeable unambiguous one
            let mut length = entry.cutoff;
            let prefix = loop {
                if length > entry.text.len() {
                    break None; // Never unambiguous, even in full
                }
                // Byte cutoffs can fall inside a multibyte character;
                // widen until the slice is well-formed
                let Some(candidate) = entry.text.get(..length) else {
                    length += 1;
                    continue;
                };
                if candidate.ends_with(' ') || candidate.chars().all(|c| c.is_ascii_digit()) {
                    length += 1;
                    continue;
                }
                break Some(candidate);
            };
            let Some(prefix) = prefix else { continue };
            match best.get(&entry.code) {
                Some(current)
                    if current.len() < prefix.len()
                        || (current.len() == prefix.len() && current.as_str() <= prefix) => {}
                _ => {
                    best.insert(entry.code, prefix.to_string());
                }
            }
        }
        Ok(best)
    }

    /// All loaded language tags, sorted
    pub fn language_tags(&self) -> &[String] {
        &self.tags
    }
}

/// Forms under which one normalized string is registered: leader
/// rewritten to canonical, spaced and space-stripped.
fn registered_forms(normalized: &str, leaders: &[(String, String)]) -> Vec<String> {
    let mut forms = vec![normalized.to_string()];
    if let Some(rewritten) = rewrite_leader(normalized, leaders) {
        forms.push(rewritten);
    }
    let stripped: Vec<String> = forms
        .iter()
        .filter(|f| f.contains(' '))
        .map(|f| f.replace(' ', ""))
        .collect();
    forms.extend(stripped);
    forms.sort();
    forms.dedup();
    forms
}

/// Candidate query strings for one normalized input: the input itself
/// plus every leading-leader rewrite, each in spaced and unspaced form.
/// Rewrites are additional candidates rather than replacements, so
/// "ISAIAH" is never mangled into "1SAIAH"-only.
fn query_forms(normalized: &str, leaders: &[(String, String)]) -> Vec<String> {
    let mut forms = vec![normalized.to_string(), normalized.replace(' ', "")];
    for (variant, canonical) in leaders {
        if let Some(rest) = normalized.strip_prefix(variant.as_str()) {
            if rest.is_empty() {
                continue; // A bare leader is not a book name
            }
            let spaced = if let Some(tail) = rest.strip_prefix(' ') {
                format!("{canonical} {tail}")
            } else {
                format!("{canonical} {rest}")
            };
            forms.push(spaced.replace(' ', ""));
            forms.push(spaced);
        }
    }
    forms.sort();
    forms.dedup();
    forms
}

/// Rewrite a leading leader variant to its canonical form, if the
/// string starts with one followed by a space
fn rewrite_leader(normalized: &str, leaders: &[(String, String)]) -> Option<String> {
    for (variant, canonical) in leaders {
        if let Some(rest) = normalized.strip_prefix(variant.as_str()) {
            if let Some(tail) = rest.strip_prefix(' ') {
                return Some(format!("{canonical} {tail}"));
            }
        }
    }
    None
}

/// Collect books owning a registered string the query prefixes
fn collect_prefix_matches(entries: &[IndexEntry], query: &str, out: &mut Vec<BookCode>) {
    let start = entries.partition_point(|entry| entry.text.as_str() < query);
    for entry in &entries[start..] {
        if !entry.text.starts_with(query) {
            break;
        }
        out.push(entry.code);
    }
}

/// Compute per-entry unambiguous cutoffs over the sorted index.
///
/// For each entry, the cutoff is one past the longest common prefix
/// with the nearest entry (in sort order, either direction) belonging
/// to a different book; sorted order guarantees those neighbours carry
/// the maximal common prefix among all other-book strings.
fn compute_cutoffs(entries: &mut [IndexEntry]) {
    let lcp = |a: &str, b: &str| -> usize {
        a.bytes().zip(b.bytes()).take_while(|(x, y)| x == y).count()
    };
    for i in 0..entries.len() {
        let mut longest = 0;
        for j in (0..i).rev() {
            if entries[j].code != entries[i].code {
                longest = longest.max(lcp(&entries[j].text, &entries[i].text));
                break;
            }
            // Same book: keep scanning, its common prefix doesn't count
            if lcp(&entries[j].text, &entries[i].text) == 0 {
                break;
            }
        }
        for j in i + 1..entries.len() {
            if entries[j].code != entries[i].code {
                longest = longest.max(lcp(&entries[j].text, &entries[i].text));
                break;
            }
            if lcp(&entries[j].text, &entries[i].text) == 0 {
                break;
            }
        }
        entries[i].cutoff = longest + 1; // May exceed len: never unambiguous
    }
}
