//! Keyword synonym tables used when a rule value does not match literally.
//!
//! A table is written as a flat string: `key / syn1 / syn2 ; key2 / syn3`.
//! The key itself is part of its synonym list. Entries without at least one
//! synonym are ignored.

use std::collections::HashMap;

use crate::attribute::AttributeKind;

/// Canonical key to synonym list for one attribute family.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordTable {
    entries: HashMap<String, Vec<String>>,
}

impl KeywordTable {
    /// Parses a flat keyword string. Keys are looked up case-insensitively.
    pub fn parse(source: &str) -> Self {
        let mut entries = HashMap::new();
        for group in source.split(" ; ") {
            let words: Vec<String> = group
                .split(" / ")
                .map(str::trim)
                .filter(|w| !w.is_empty())
                .map(str::to_string)
                .collect();
            if words.len() > 1 {
                entries.insert(words[0].to_lowercase(), words);
            }
        }
        Self { entries }
    }

    /// Returns the synonyms registered under `key`, including the key.
    pub fn synonyms(&self, key: &str) -> Option<&[String]> {
        self.entries.get(&key.to_lowercase()).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// All keyword tables of a skin, one per attribute family.
#[derive(Debug, Clone, Default)]
pub struct KeywordTables {
    tables: HashMap<AttributeKind, KeywordTable>,
}

impl KeywordTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: AttributeKind, table: KeywordTable) {
        self.tables.insert(kind, table);
    }

    pub fn get(&self, kind: AttributeKind) -> Option<&KeywordTable> {
        self.tables.get(&kind)
    }
}
