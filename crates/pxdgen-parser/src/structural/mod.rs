//! Structural Translation
//!
//! Converts the structs, enums, typedefs and function prototypes of a C
//! header into a Cython extern block.
//!
//! The default [`CythonTranslator`] optionally runs the header through
//! `clang -E` (keeping only what the whitelisted files declare) and then
//! extracts declarations with tree-sitter.

pub mod clang;
pub mod treesitter;

pub use clang::{ClangError, ClangPreprocessor, Expansion};
pub use treesitter::{DeclarationExtractor, SyntaxError};

use pxdgen_core::config::StructuralConfig;
use pxdgen_core::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::ast::PxdModule;

/// Input of a structural translation
#[derive(Debug, Clone, Copy)]
pub struct StructuralRequest<'a> {
    /// Header source text
    pub source: &'a str,
    /// Header location on disk
    pub path: &'a Path,
    /// Label used in `cdef extern from`, e.g. `slurm/slurm.h`
    pub origin: &'a str,
    /// Include search path for the preprocessor
    pub include_dirs: &'a [PathBuf],
    /// Files whose declarations are translated
    pub whitelist: &'a [PathBuf],
}

/// Translator for struct/enum/typedef/function declarations
pub trait StructuralTranslator: Send + Sync {
    /// Translate one header
    fn translate(&self, request: &StructuralRequest<'_>) -> Result<PxdModule>;

    /// Get translator name
    fn name(&self) -> &str;
}

/// Tree-sitter based translator with optional clang preprocessing
#[derive(Debug, Clone, Default)]
pub struct CythonTranslator {
    preprocessor: Option<ClangPreprocessor>,
}

impl CythonTranslator {
    /// Translator parsing the raw header text
    pub fn without_preprocessor() -> Self {
        Self { preprocessor: None }
    }

    /// Translator preprocessing headers with the given clang
    pub fn with_preprocessor(preprocessor: ClangPreprocessor) -> Self {
        Self {
            preprocessor: Some(preprocessor),
        }
    }

    /// Translator set up from configuration.
    ///
    /// Falls back to raw parsing when clang is requested but not found.
    pub fn from_config(config: &StructuralConfig) -> Self {
        if !config.use_clang {
            return Self::without_preprocessor();
        }

        let preprocessor = match &config.clang_path {
            Some(path) => Some(ClangPreprocessor::with_path(path.clone())),
            None => ClangPreprocessor::new().ok(),
        };

        match preprocessor {
            Some(p) if p.is_available() => Self::with_preprocessor(p),
            _ => {
                warn!("Clang not available, parsing headers without preprocessing");
                Self::without_preprocessor()
            }
        }
    }

    fn prepare_source(&self, request: &StructuralRequest<'_>) -> Result<String> {
        let Some(preprocessor) = &self.preprocessor else {
            return Ok(strip_directives(request.source));
        };

        let expansion = preprocessor
            .expand(request.path, request.include_dirs, request.whitelist)
            .map_err(|e| Error::Structural {
                header: request.origin.to_string(),
                message: e.to_string(),
            })?;
        debug!(
            "{} pulled in {} files",
            request.origin,
            expansion.files.len()
        );

        Ok(expansion.source)
    }
}

impl StructuralTranslator for CythonTranslator {
    fn translate(&self, request: &StructuralRequest<'_>) -> Result<PxdModule> {
        let source = self.prepare_source(request)?;

        let mut extractor = DeclarationExtractor::new()?;
        let module = extractor
            .extract(&source, request.origin)?
            .map_err(|e| Error::Structural {
                header: request.origin.to_string(),
                message: e.to_string(),
            })?;

        info!(
            "Translated {} declarations from {}",
            module.items.len(),
            request.origin
        );
        Ok(module)
    }

    fn name(&self) -> &str {
        if self.preprocessor.is_some() {
            "clang+tree-sitter"
        } else {
            "tree-sitter"
        }
    }
}

/// Drop preprocessor directives, including backslash-continued lines.
///
/// Line count is preserved so tree-sitter positions still match the header.
pub fn strip_directives(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut continued = false;

    for line in source.lines() {
        let directive = continued || line.trim_start().starts_with('#');
        continued = directive && line.trim_end().ends_with('\\');
        if !directive {
            out.push_str(line);
        }
        out.push('\n');
    }

    out
}
