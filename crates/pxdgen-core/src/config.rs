//! Configuration types

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::{OutputMode, OutputTarget, ResolvedType};

/// pxdgen configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Run-level settings
    pub generator: GeneratorConfig,

    /// Macro translation settings
    pub macros: MacroConfig,

    /// License block extraction settings
    pub provenance: ProvenanceConfig,

    /// Structural translator settings
    pub structural: StructuralConfig,
}

impl Config {
    /// Load configuration from a `.json`, `.yaml` or `.yml` file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| Error::Config(format!("{}: {}", path.display(), e))),
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
                .map_err(|e| Error::Config(format!("{}: {}", path.display(), e))),
            _ => Err(Error::Config(format!(
                "unsupported config format: {}",
                path.display()
            ))),
        }
    }
}

/// Run-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Directory containing the headers
    pub header_dir: PathBuf,

    /// Headers to translate, in order
    pub headers: Vec<String>,

    /// Include search path handed to the structural translator
    pub include_dirs: Vec<PathBuf>,

    /// What to generate
    pub mode: OutputMode,

    /// Where to write it
    pub target: OutputTarget,

    /// Extension of per-header output files
    pub extension: String,

    /// Logical directory of the headers, used in `cdef extern from` labels
    pub include_prefix: String,

    /// Fixed timestamp (seconds since the epoch) for reproducible output
    pub source_date_epoch: Option<i64>,

    /// Translate headers on the rayon thread pool
    pub parallel: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            header_dir: PathBuf::from("/usr/include/slurm"),
            headers: vec![
                "slurm_errno.h".into(),
                "slurm.h".into(),
                "slurmdb.h".into(),
            ],
            include_dirs: vec![],
            mode: OutputMode::Full,
            target: OutputTarget::Files(PathBuf::from("pyslurm/slurm")),
            extension: "pxi".into(),
            include_prefix: "slurm".into(),
            source_date_epoch: None,
            parallel: false,
        }
    }
}

impl GeneratorConfig {
    /// Origin label of a header, e.g. `slurm/slurm.h`
    pub fn origin(&self, header: &str) -> String {
        if self.include_prefix.is_empty() {
            header.to_string()
        } else {
            format!("{}/{}", self.include_prefix, header)
        }
    }

    /// Include dirs, falling back to the parent of the header directory
    pub fn effective_include_dirs(&self) -> Vec<PathBuf> {
        if !self.include_dirs.is_empty() {
            return self.include_dirs.clone();
        }
        self.header_dir
            .parent()
            .map(|p| vec![p.to_path_buf()])
            .unwrap_or_default()
    }
}

/// A fixed type for a macro the value parser cannot evaluate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideEntry {
    pub header: String,
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ResolvedType,
}

/// Macro translation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacroConfig {
    /// Names of function-like macros meaning `1 << n`
    pub bit_macros: Vec<String>,

    /// Python module referenced by generated constants
    pub const_module: String,

    /// Overrides added on top of the built-in table
    pub overrides: Vec<OverrideEntry>,
}

impl Default for MacroConfig {
    fn default() -> Self {
        Self {
            bit_macros: vec!["SLURM_BIT".into()],
            const_module: "slurm".into(),
            overrides: vec![],
        }
    }
}

/// License block extraction configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvenanceConfig {
    /// Substring of the last line of the license block
    pub marker: String,
}

impl Default for ProvenanceConfig {
    fn default() -> Self {
        Self {
            marker: "CODE-OCEC".into(),
        }
    }
}

/// Structural translator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuralConfig {
    /// Run the header through `clang -E` before parsing
    pub use_clang: bool,

    /// Path to the clang executable (auto-detected when unset)
    pub clang_path: Option<PathBuf>,

    /// Whole-word keyword replacements applied to the structural output
    pub keyword_rewrites: Vec<(String, String)>,
}

impl Default for StructuralConfig {
    fn default() -> Self {
        Self {
            use_clang: true,
            clang_path: None,
            keyword_rewrites: vec![("cpdef".into(), "cdef".into())],
        }
    }
}
