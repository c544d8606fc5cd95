//! Clang Preprocessor Integration
//!
//! Runs `clang -E` over a header so macros used inside declarations are
//! expanded before tree-sitter sees them. The line markers clang emits tell
//! which file every output line came from; only lines from whitelisted
//! headers are kept, so `stdint.h` and friends never reach the translation.

use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::debug;

/// Executables tried when no clang path is configured
const CLANG_CANDIDATES: &[&str] = &["clang", "clang-18", "clang-17", "clang-16", "clang-15"];

#[derive(Debug, Error)]
pub enum ClangError {
    #[error("no clang executable found (tried {0})")]
    NotFound(String),

    #[error("failed to run {}: {source}", path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("clang exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
}

/// A header after preprocessing
#[derive(Debug, Clone, Default)]
pub struct Expansion {
    /// Lines attributed to whitelisted files, line markers removed
    pub source: String,
    /// Every file clang opened, in first-seen order
    pub files: Vec<PathBuf>,
}

/// Clang preprocessor wrapper
#[derive(Debug, Clone)]
pub struct ClangPreprocessor {
    clang_path: PathBuf,
}

impl ClangPreprocessor {
    /// Locate clang on the `PATH`
    pub fn new() -> Result<Self, ClangError> {
        let clang_path = CLANG_CANDIDATES
            .iter()
            .map(PathBuf::from)
            .find(|candidate| responds(candidate))
            .ok_or_else(|| ClangError::NotFound(CLANG_CANDIDATES.join(", ")))?;

        debug!("Found clang at: {:?}", clang_path);
        Ok(Self { clang_path })
    }

    /// Use a specific clang executable
    pub fn with_path(clang_path: PathBuf) -> Self {
        Self { clang_path }
    }

    pub fn is_available(&self) -> bool {
        responds(&self.clang_path)
    }

    /// Preprocess `header`, keeping the declarations of `whitelist` only
    pub fn expand(
        &self,
        header: &Path,
        include_dirs: &[PathBuf],
        whitelist: &[PathBuf],
    ) -> Result<Expansion, ClangError> {
        let args = preprocess_args(include_dirs);
        debug!("Running {:?} {:?} {:?}", self.clang_path, args, header);

        let output = Command::new(&self.clang_path)
            .args(&args)
            .arg(header)
            .output()
            .map_err(|source| ClangError::Spawn {
                path: self.clang_path.clone(),
                source,
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(ClangError::Failed {
                status: output.status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }
        for warning in stderr.lines().filter(|l| l.contains("warning:")) {
            debug!("clang: {}", warning);
        }

        let code = String::from_utf8_lossy(&output.stdout);
        Ok(Expansion {
            source: retain_files(&code, whitelist),
            files: marked_files(&code),
        })
    }
}

fn responds(clang: &Path) -> bool {
    Command::new(clang)
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Preprocess as C even though headers end in `.h`
fn preprocess_args(include_dirs: &[PathBuf]) -> Vec<String> {
    let mut args: Vec<String> = ["-E", "-x", "c"].iter().map(|s| s.to_string()).collect();
    args.extend(include_dirs.iter().map(|dir| format!("-I{}", dir.display())));
    args
}

/// File named by a line marker such as `# 12 "/usr/include/slurm/slurm.h" 2`
fn line_marker_file(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("# ")?;
    if !rest.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    let start = rest.find('"')? + 1;
    let len = rest[start..].find('"')?;
    Some(&rest[start..start + len])
}

/// Real files named by line markers, skipping `<built-in>` and friends
pub fn marked_files(code: &str) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = Vec::new();
    for file in code.lines().filter_map(line_marker_file) {
        if file.is_empty() || file.starts_with('<') {
            continue;
        }
        let file = PathBuf::from(file);
        if !files.contains(&file) {
            files.push(file);
        }
    }
    files
}

/// Keep only the lines that line markers attribute to a whitelisted file
pub fn retain_files(code: &str, whitelist: &[PathBuf]) -> String {
    let mut out = String::new();
    let mut keep = false;

    for line in code.lines() {
        if let Some(file) = line_marker_file(line) {
            keep = is_whitelisted(Path::new(file), whitelist);
            continue;
        }
        if keep {
            out.push_str(line);
            out.push('\n');
        }
    }

    out
}

fn is_whitelisted(path: &Path, whitelist: &[PathBuf]) -> bool {
    let canonical = path.canonicalize().ok();
    whitelist.iter().any(|allowed| {
        path == allowed
            || (canonical.is_some() && canonical == allowed.canonicalize().ok())
    })
}
