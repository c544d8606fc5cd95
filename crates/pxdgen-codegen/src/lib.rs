//! pxdgen Code Generation
//!
//! Drives the translation of a set of Slurm headers:
//! - License block extraction
//! - Macro translation (or the diagnostic/constant short-cuts)
//! - Structural translation
//! - Assembly and output
//!
//! Artifacts of a run are only written once every header translated
//! successfully.

pub mod assemble;
pub mod rewrite;
pub mod sink;

use pxdgen_core::config::Config;
use pxdgen_core::{Artifact, Error, OutputMode, OutputTarget, Result};
use pxdgen_parser::macros::{render_constants, render_declarations, render_unresolved};
use pxdgen_parser::{
    CythonTranslator, MacroTranslator, ProvenanceExtractor, StructuralRequest,
    StructuralTranslator,
};
use rayon::prelude::*;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info};

pub use assemble::{assemble, Sections};
pub use rewrite::KeywordRewrite;
pub use sink::OutputSink;

/// Outcome of a run
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Headers translated
    pub headers: usize,
    /// Files written (empty when streaming)
    pub written: Vec<PathBuf>,
}

/// Header translation pipeline
pub struct Generator {
    config: Config,
    include_dirs: Vec<PathBuf>,
    macros: MacroTranslator,
    provenance: ProvenanceExtractor,
    structural: Box<dyn StructuralTranslator>,
    rewrite: KeywordRewrite,
}

impl Generator {
    /// Create a generator using the tree-sitter/clang translator
    pub fn new(config: Config) -> Result<Self> {
        let structural = CythonTranslator::from_config(&config.structural);
        Self::with_translator(config, Box::new(structural))
    }

    /// Create a generator with a custom structural translator
    pub fn with_translator(
        config: Config,
        structural: Box<dyn StructuralTranslator>,
    ) -> Result<Self> {
        let include_dirs = config.generator.effective_include_dirs();
        debug!("Include search path: {:?}", include_dirs);

        Ok(Self {
            macros: MacroTranslator::from_config(&config.macros),
            provenance: ProvenanceExtractor::new(config.provenance.marker.clone()),
            rewrite: KeywordRewrite::new(&config.structural.keyword_rewrites)?,
            include_dirs,
            structural,
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Translate one header into an artifact.
    ///
    /// Diagnostic mode yields `None` when every macro resolved.
    pub fn translate_header(&self, header: &str, timestamp: &str) -> Result<Option<Artifact>> {
        let settings = &self.config.generator;
        let path = settings.header_dir.join(header);
        if !path.exists() {
            return Err(Error::FileNotFound(path.display().to_string()));
        }
        let source = std::fs::read_to_string(&path)?;
        let lines: Vec<&str> = source.split_inclusive('\n').collect();
        let origin = settings.origin(header);

        let provenance = self.provenance.extract(header, lines.iter().copied());
        let macros = self.macros.translate(header, lines.iter().copied())?;
        info!(
            "{}: {} macros translated, {} unresolved",
            header,
            macros.declarations.len(),
            macros.unresolved.len()
        );

        match settings.mode {
            OutputMode::Diagnostic => {
                let text = render_unresolved(header, &macros);
                return Ok((!text.is_empty()).then(|| stream_artifact(header, text)));
            }
            OutputMode::Constant => {
                let text = render_constants(&self.config.macros.const_module, &macros);
                return Ok(Some(stream_artifact(header, text)));
            }
            OutputMode::Full => {}
        }

        let whitelist = [path.clone()];
        let request = StructuralRequest {
            source: &source,
            path: &path,
            origin: &origin,
            include_dirs: &self.include_dirs,
            whitelist: &whitelist,
        };
        debug!("Translating {} with {}", header, self.structural.name());
        let module = self.structural.translate(&request)?;
        let structural = module.to_string();

        let content = assemble(&Sections {
            header,
            timestamp,
            provenance: &provenance.text,
            macros: &render_declarations(&origin, &macros),
            structural: &self.rewrite.apply(&structural),
        });

        let path = match &settings.target {
            OutputTarget::Files(dir) => Some(dir.join(format!("{}.{}", header, settings.extension))),
            OutputTarget::Stream => None,
        };

        Ok(Some(Artifact {
            header: header.to_string(),
            path,
            content,
        }))
    }

    /// Translate every configured header, in order.
    ///
    /// Fails on the first header that cannot be translated.
    pub fn generate(&self) -> Result<Vec<Artifact>> {
        let timestamp = assemble::timestamp(self.config.generator.source_date_epoch);
        let headers = &self.config.generator.headers;

        let artifacts: Vec<Option<Artifact>> = if self.config.generator.parallel {
            headers
                .par_iter()
                .map(|h| self.translate_header(h, &timestamp))
                .collect::<Result<_>>()?
        } else {
            headers
                .iter()
                .map(|h| self.translate_header(h, &timestamp))
                .collect::<Result<_>>()?
        };

        Ok(artifacts.into_iter().flatten().collect())
    }

    /// Translate all headers, then emit the artifacts
    pub fn run<W: Write>(&self, stream: W) -> Result<RunSummary> {
        let artifacts = self.generate()?;
        let written = OutputSink::new(stream).emit(&artifacts)?;

        Ok(RunSummary {
            headers: self.config.generator.headers.len(),
            written,
        })
    }
}

fn stream_artifact(header: &str, content: String) -> Artifact {
    Artifact {
        header: header.to_string(),
        path: None,
        content,
    }
}
