//! Fixed types for macros whose value is not a literal
//!
//! Some Slurm macros are defined through other macros (for example
//! `#define PARTITION_DOWN (PARTITION_SUBMIT)`), which the value parser does
//! not evaluate. The override table supplies their type directly.

use pxdgen_core::config::OverrideEntry;
use pxdgen_core::ResolvedType;
use std::collections::HashMap;

/// Lookup of fixed macro types keyed by `(header, macro name)`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideTable {
    entries: HashMap<(String, String), ResolvedType>,
}

impl OverrideTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the overrides needed for the stock Slurm headers
    pub fn builtin() -> Self {
        let mut table = Self::new();
        for name in ["PARTITION_DOWN", "PARTITION_UP", "PARTITION_DRAIN"] {
            table.insert("slurm.h", name, ResolvedType::U8);
        }
        table
    }

    /// Built-in table extended with configured entries
    pub fn with_entries(entries: &[OverrideEntry]) -> Self {
        let mut table = Self::builtin();
        table.extend(entries);
        table
    }

    /// Add or replace an override
    pub fn insert(&mut self, header: &str, name: &str, ty: ResolvedType) {
        self.entries
            .insert((header.to_string(), name.to_string()), ty);
    }

    /// Add configured entries, replacing existing keys
    pub fn extend(&mut self, entries: &[OverrideEntry]) {
        for entry in entries {
            self.insert(&entry.header, &entry.name, entry.ty);
        }
    }

    /// Fixed type for `name` in `header`, if any
    pub fn lookup(&self, header: &str, name: &str) -> Option<ResolvedType> {
        self.entries
            .get(&(header.to_string(), name.to_string()))
            .copied()
    }
}
