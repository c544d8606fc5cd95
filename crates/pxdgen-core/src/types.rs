//! Core type definitions

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::Error;

/// Minimal integer width able to hold a macro value without loss
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolvedType {
    U8,
    U16,
    U32,
    U64,
    I8,
}

impl ResolvedType {
    /// C spelling used in the generated declarations
    pub fn c_name(&self) -> &'static str {
        match self {
            ResolvedType::U8 => "uint8_t",
            ResolvedType::U16 => "uint16_t",
            ResolvedType::U32 => "uint32_t",
            ResolvedType::U64 => "uint64_t",
            ResolvedType::I8 => "int8_t",
        }
    }
}

impl fmt::Display for ResolvedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.c_name())
    }
}

impl FromStr for ResolvedType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "u8" | "uint8_t" => Ok(ResolvedType::U8),
            "u16" | "uint16_t" => Ok(ResolvedType::U16),
            "u32" | "uint32_t" => Ok(ResolvedType::U32),
            "u64" | "uint64_t" => Ok(ResolvedType::U64),
            "i8" | "int8_t" => Ok(ResolvedType::I8),
            _ => Err(Error::Config(format!("unknown integer type: {}", s))),
        }
    }
}

/// A `#define` split into its name and raw value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroDefinition {
    pub name: String,
    pub raw_value: String,
}

/// Insertion-ordered macro declarations.
///
/// Keys keep the position of their first insertion; inserting an existing
/// key replaces its type in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Declarations {
    order: Vec<String>,
    types: HashMap<String, ResolvedType>,
}

impl Declarations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a declaration, returning the previous type
    pub fn insert(&mut self, name: impl Into<String>, ty: ResolvedType) -> Option<ResolvedType> {
        let name = name.into();
        let previous = self.types.insert(name.clone(), ty);
        if previous.is_none() {
            self.order.push(name);
        }
        previous
    }

    /// Remove a declaration, closing the gap in the ordering
    pub fn remove(&mut self, name: &str) -> Option<ResolvedType> {
        let removed = self.types.remove(name)?;
        self.order.retain(|n| n != name);
        Some(removed)
    }

    pub fn get(&self, name: &str) -> Option<ResolvedType> {
        self.types.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Names in first-seen order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// `(name, type)` pairs in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&str, ResolvedType)> + '_ {
        self.order
            .iter()
            .map(move |name| (name.as_str(), self.types[name]))
    }
}

/// Outcome of translating the macros of one header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationResult {
    /// Resolved macros
    pub declarations: Declarations,
    /// Macros whose value could not be resolved, in source order
    pub unresolved: Vec<String>,
}

impl TranslationResult {
    /// Record a resolved macro. A name previously listed as unresolved moves over.
    pub fn resolve(&mut self, name: &str, ty: ResolvedType) {
        self.unresolved.retain(|n| n != name);
        self.declarations.insert(name, ty);
    }

    /// Record an unresolved macro. A previously resolved name is dropped.
    pub fn mark_unresolved(&mut self, name: &str) {
        self.declarations.remove(name);
        if !self.unresolved.iter().any(|n| n == name) {
            self.unresolved.push(name.to_string());
        }
    }
}

/// What a run produces for each header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Full Cython declaration file
    #[default]
    Full,
    /// Only the names of macros that could not be translated
    Diagnostic,
    /// Python constants mirroring the translated macros
    Constant,
}

impl OutputMode {
    /// Whether this mode stops before structural translation
    pub fn is_macro_only(&self) -> bool {
        !matches!(self, OutputMode::Full)
    }
}

/// Where artifacts are written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputTarget {
    /// One `<header>.<ext>` file per header in the given directory
    Files(PathBuf),
    /// A single shared stream (stdout)
    Stream,
}

/// Generated content for one header, not yet emitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Header the content was generated from
    pub header: String,
    /// File path, or `None` for the shared stream
    pub path: Option<PathBuf>,
    /// Content to emit
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declarations_keep_first_position() {
        let mut decls = Declarations::new();
        decls.insert("X", ResolvedType::U8);
        decls.insert("Y", ResolvedType::U8);
        let previous = decls.insert("X", ResolvedType::U32);

        assert_eq!(previous, Some(ResolvedType::U8));
        assert_eq!(decls.names().collect::<Vec<_>>(), vec!["X", "Y"]);
        assert_eq!(decls.get("X"), Some(ResolvedType::U32));
        assert_eq!(decls.len(), 2);
    }

    #[test]
    fn test_declarations_remove() {
        let mut decls = Declarations::new();
        decls.insert("A", ResolvedType::U8);
        decls.insert("B", ResolvedType::U16);
        decls.insert("C", ResolvedType::I8);

        assert_eq!(decls.remove("B"), Some(ResolvedType::U16));
        assert_eq!(decls.remove("B"), None);
        assert_eq!(
            decls.iter().collect::<Vec<_>>(),
            vec![("A", ResolvedType::U8), ("C", ResolvedType::I8)]
        );
    }

    #[test]
    fn test_translation_result_name_in_one_collection() {
        let mut result = TranslationResult::default();
        result.mark_unresolved("STATE");
        result.resolve("STATE", ResolvedType::U8);
        assert!(result.unresolved.is_empty());
        assert!(result.declarations.contains("STATE"));

        result.mark_unresolved("STATE");
        assert!(result.declarations.is_empty());
        assert_eq!(result.unresolved, vec!["STATE".to_string()]);
    }

    #[test]
    fn test_resolved_type_names() {
        assert_eq!(ResolvedType::U8.to_string(), "uint8_t");
        assert_eq!(ResolvedType::I8.to_string(), "int8_t");
        assert_eq!("u64".parse::<ResolvedType>().unwrap(), ResolvedType::U64);
        assert_eq!("uint16_t".parse::<ResolvedType>().unwrap(), ResolvedType::U16);
        assert!("int".parse::<ResolvedType>().is_err());
    }
}
