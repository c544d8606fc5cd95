//! pxdgen Parser
//!
//! Everything that reads a C header: macro translation, license block
//! extraction and structural translation into Cython declarations.
//!
//! ## Modules
//!
//! - `macros` - `#define` values to typed declarations
//! - `provenance` - License block extraction
//! - `structural` - Struct/enum/typedef/function translation (tree-sitter + Clang)
//! - `ast` - Cython declaration model

pub mod ast;
pub mod macros;
pub mod provenance;
pub mod structural;

pub use ast::PxdModule;
pub use macros::{MacroTranslator, OverrideTable, ValueParser};
pub use provenance::{Provenance, ProvenanceExtractor};
pub use structural::{CythonTranslator, StructuralRequest, StructuralTranslator};
