//! License Block Extraction
//!
//! Copies the copyright notice from the top of a C header into Python
//! comment syntax so it can be carried into the generated file.

use tracing::warn;

/// The reformatted license block of a header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Provenance {
    /// Reformatted text, one line per accumulated source line
    pub text: String,
    /// Whether the end marker was seen; if not, `text` holds the whole file
    pub marker_found: bool,
}

/// Extracts the license block of a header
#[derive(Debug, Clone)]
pub struct ProvenanceExtractor {
    marker: String,
}

impl ProvenanceExtractor {
    /// Create an extractor that stops at the first line containing `marker`
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    /// Extract from lines that keep their line terminators
    pub fn extract<'a, I>(&self, header: &str, lines: I) -> Provenance
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut provenance = Provenance::default();

        for line in lines {
            let line = rewrite_comment(line);
            provenance.text.push_str(&line);
            if line.contains(&self.marker) {
                provenance.marker_found = true;
                break;
            }
        }

        if !provenance.marker_found {
            warn!(
                "License marker {:?} not found in {}, copied the whole file",
                self.marker, header
            );
        }

        provenance
    }
}

impl Default for ProvenanceExtractor {
    fn default() -> Self {
        Self::new("CODE-OCEC")
    }
}

/// Rewrite C comment characters into `#` and drop leading whitespace.
///
/// A line consisting only of whitespace collapses to the empty string.
fn rewrite_comment(line: &str) -> String {
    let line = if line.starts_with('/') {
        line.replace('/', "#").replace('\\', "")
    } else {
        line.to_string()
    };
    line.replace('*', "#").trim_start().to_string()
}
