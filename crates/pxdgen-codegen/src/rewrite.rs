//! Keyword rewriting for the structural output

use pxdgen_core::{Error, Result};
use regex::Regex;
use std::borrow::Cow;

/// Whole-word keyword replacements
#[derive(Debug, Clone, Default)]
pub struct KeywordRewrite {
    rules: Vec<(Regex, String)>,
}

impl KeywordRewrite {
    /// Build from `(keyword, replacement)` pairs
    pub fn new(pairs: &[(String, String)]) -> Result<Self> {
        let rules = pairs
            .iter()
            .map(|(from, to)| {
                let pattern = format!(r"\b{}\b", regex::escape(from));
                Regex::new(&pattern)
                    .map(|re| (re, to.clone()))
                    .map_err(|e| Error::Config(format!("bad keyword rewrite {:?}: {}", from, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { rules })
    }

    /// Apply every rule in order
    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        let mut out = Cow::Borrowed(text);
        for (re, replacement) in &self.rules {
            if re.is_match(&out) {
                let replaced = re.replace_all(&out, replacement.as_str()).into_owned();
                out = Cow::Owned(replaced);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpdef() -> KeywordRewrite {
        KeywordRewrite::new(&[("cpdef".to_string(), "cdef".to_string())]).unwrap()
    }

    #[test]
    fn test_whole_words_only() {
        let rewrite = cpdef();
        assert_eq!(
            rewrite.apply("    cpdef enum job_states:\n    int cpdef_count\n"),
            "    cdef enum job_states:\n    int cpdef_count\n"
        );
    }

    #[test]
    fn test_untouched_text_is_borrowed() {
        let rewrite = cpdef();
        assert!(matches!(rewrite.apply("ctypedef int x"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_rules_apply_in_order() {
        let rewrite = KeywordRewrite::new(&[
            ("a".to_string(), "b".to_string()),
            ("b".to_string(), "c".to_string()),
        ])
        .unwrap();
        assert_eq!(rewrite.apply("a b"), "c c");
    }
}
