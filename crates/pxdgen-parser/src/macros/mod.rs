//! Macro Translation
//!
//! Turns the `#define`s of a header into typed Cython declarations.
//! Each value goes through the [`ValueParser`], then [`infer_type`]; values
//! the parser cannot evaluate fall back to the [`OverrideTable`], and
//! whatever is left is reported as unresolved.

pub mod overrides;
pub mod tier;
pub mod value;

pub use overrides::OverrideTable;
pub use tier::infer_type;
pub use value::ValueParser;

use pxdgen_core::config::MacroConfig;
use pxdgen_core::{Error, MacroDefinition, ResolvedType, Result, TranslationResult};
use std::fmt::Write;
use tracing::debug;

const DEFINE: &str = "#define";

/// Split a `#define` line into name and raw value.
///
/// Lines that are not a define, or have no value, yield `None`.
pub fn parse_define(line: &str) -> Option<MacroDefinition> {
    let mut tokens = line.split_whitespace();
    if tokens.next()? != DEFINE {
        return None;
    }
    let name = tokens.next()?;
    let value: Vec<&str> = tokens.collect();
    if value.is_empty() {
        return None;
    }

    Some(MacroDefinition {
        name: name.to_string(),
        raw_value: value.join(" "),
    })
}

/// Translates the macros of a header
#[derive(Debug, Clone)]
pub struct MacroTranslator {
    values: ValueParser,
    overrides: OverrideTable,
}

impl MacroTranslator {
    /// Create a translator from its parts
    pub fn new(values: ValueParser, overrides: OverrideTable) -> Self {
        Self { values, overrides }
    }

    /// Create a translator from configuration
    pub fn from_config(config: &MacroConfig) -> Self {
        Self::new(
            ValueParser::new(&config.bit_macros),
            OverrideTable::with_entries(&config.overrides),
        )
    }

    /// Resolve a single definition.
    ///
    /// `Ok(None)` means unresolved; a value outside every tier is an error.
    pub fn resolve(&self, header: &str, def: &MacroDefinition) -> Result<Option<ResolvedType>> {
        match self.values.parse(&def.raw_value) {
            Some(value) => infer_type(value)
                .map(Some)
                .ok_or_else(|| Error::UnrepresentableValue {
                    name: def.name.clone(),
                    value,
                }),
            None => Ok(self.overrides.lookup(header, &def.name)),
        }
    }

    /// Translate all macros found in `lines`
    pub fn translate<'a, I>(&self, header: &str, lines: I) -> Result<TranslationResult>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut result = TranslationResult::default();

        for def in lines.into_iter().filter_map(parse_define) {
            match self.resolve(header, &def)? {
                Some(ty) => {
                    debug!("{}: {} -> {}", header, def.name, ty);
                    result.resolve(&def.name, ty);
                }
                None => {
                    debug!("{}: cannot translate {} = {}", header, def.name, def.raw_value);
                    result.mark_unresolved(&def.name);
                }
            }
        }

        Ok(result)
    }
}

impl Default for MacroTranslator {
    fn default() -> Self {
        Self::new(ValueParser::default(), OverrideTable::builtin())
    }
}

/// List the unresolved macros of a header, or an empty string if none
pub fn render_unresolved(header: &str, result: &TranslationResult) -> String {
    let mut out = String::new();
    if result.unresolved.is_empty() {
        return out;
    }

    let _ = writeln!(out, "Unknown Macros in {}: \n", header);
    for name in &result.unresolved {
        let _ = writeln!(out, "{}", name);
    }
    out.push('\n');
    out
}

/// Render resolved macros as a `cdef extern from` block naming `origin`
pub fn render_declarations(origin: &str, result: &TranslationResult) -> String {
    let mut out = String::new();
    if result.declarations.is_empty() {
        return out;
    }

    let _ = writeln!(out, "cdef extern from \"{}\":\n", origin);
    for (name, ty) in result.declarations.iter() {
        let _ = writeln!(out, "    {} {}", ty, name);
    }
    out
}

/// Render resolved macros as Python constants bound to `module`
pub fn render_constants(module: &str, result: &TranslationResult) -> String {
    let mut out = String::new();
    for name in result.declarations.names() {
        let _ = writeln!(out, "{} = {}.{}", name, module, name);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_define() {
        let def = parse_define("#define  NO_VAL   (0xfffffffe)\n").unwrap();
        assert_eq!(def.name, "NO_VAL");
        assert_eq!(def.raw_value, "(0xfffffffe)");

        let def = parse_define("#define INFINITE64 (0xffffffffffffffff) /* no limit */").unwrap();
        assert_eq!(def.raw_value, "(0xffffffffffffffff) /* no limit */");

        assert_eq!(parse_define("#define _SLURM_H"), None);
        assert_eq!(parse_define("#include <stdint.h>"), None);
        assert_eq!(parse_define("  # define X 1"), None);
        assert_eq!(parse_define(""), None);
    }

    #[test]
    fn test_translate_ordered() {
        let lines = ["#define ALPHA SLURM_BIT(0)\n", "#define BETA 0x1F\n"];
        let result = MacroTranslator::default()
            .translate("slurm.h", lines)
            .unwrap();

        assert_eq!(
            result.declarations.iter().collect::<Vec<_>>(),
            vec![("ALPHA", ResolvedType::U8), ("BETA", ResolvedType::U8)]
        );
        assert!(result.unresolved.is_empty());
    }

    #[test]
    fn test_redefinition_keeps_position_takes_last_value() {
        let lines = ["#define X 1\n", "#define Y 2\n", "#define X 999999\n"];
        let result = MacroTranslator::default().translate("slurm.h", lines).unwrap();

        assert_eq!(result.declarations.names().collect::<Vec<_>>(), vec!["X", "Y"]);
        assert_eq!(result.declarations.get("X"), Some(ResolvedType::U32));
    }

    #[test]
    fn test_short_defines_are_skipped() {
        let lines = ["#define GUARD\n", "#define A 1\n", "#define B some_call(x)\n"];
        let result = MacroTranslator::default().translate("slurm.h", lines).unwrap();

        assert_eq!(result.declarations.len(), 1);
        assert_eq!(result.unresolved, vec!["B".to_string()]);
    }

    #[test]
    fn test_commented_values_resolve() {
        let lines = [
            "#define PARTITION_SUBMIT\t0x01\t/* Allow job submission to partition */\n",
            "#define JOB_LAUNCH_FAILED SLURM_BIT(8) /* launch failed */\n",
            "#define MAX_TASKS 512 /* per node */\n",
            "#define NO_VAL (0xfffffffe) /* no value */\n",
        ];
        let result = MacroTranslator::default().translate("slurm.h", lines).unwrap();

        assert_eq!(
            result.declarations.iter().collect::<Vec<_>>(),
            vec![
                ("PARTITION_SUBMIT", ResolvedType::U8),
                ("JOB_LAUNCH_FAILED", ResolvedType::U16),
                ("MAX_TASKS", ResolvedType::U16),
                ("NO_VAL", ResolvedType::U32),
            ]
        );
        assert!(result.unresolved.is_empty());
    }

    #[test]
    fn test_override_applies_only_when_unparsed() {
        let lines = [
            "#define PARTITION_DOWN (PARTITION_SUBMIT)\n",
            "#define PARTITION_UP 300\n",
            "#define PARTITION_INACTIVE 0x00\n",
        ];
        let result = MacroTranslator::default().translate("slurm.h", lines).unwrap();

        assert_eq!(result.declarations.get("PARTITION_DOWN"), Some(ResolvedType::U8));
        assert_eq!(result.declarations.get("PARTITION_UP"), Some(ResolvedType::U16));
        assert!(result.unresolved.is_empty());

        let result = MacroTranslator::default()
            .translate("slurmdb.h", ["#define PARTITION_DOWN (PARTITION_SUBMIT)\n"])
            .unwrap();
        assert_eq!(result.unresolved, vec!["PARTITION_DOWN".to_string()]);
    }

    #[test]
    fn test_unrepresentable_value_is_fatal() {
        let lines = ["#define OK 1\n", "#define HUGE 18446744073709551616\n"];
        let err = MacroTranslator::default()
            .translate("slurm.h", lines)
            .unwrap_err();

        match err {
            Error::UnrepresentableValue { name, value } => {
                assert_eq!(name, "HUGE");
                assert_eq!(value, 1i128 << 64);
            }
            other => panic!("unexpected error: {}", other),
        }

        assert!(MacroTranslator::default()
            .translate("slurm.h", ["#define NEG -129\n"])
            .is_err());
    }

    #[test]
    fn test_render_unresolved() {
        let lines = [
            "#define A 1\n",
            "#define B 0x2\n",
            "#define C \"string\"\n",
            "#define D OTHER_MACRO\n",
        ];
        let result = MacroTranslator::default().translate("slurm.h", lines).unwrap();
        let text = render_unresolved("slurm.h", &result);

        assert_eq!(text, "Unknown Macros in slurm.h: \n\nC\nD\n\n");
        assert!(!text.contains("uint8_t"));
        assert_eq!(render_unresolved("slurm.h", &TranslationResult::default()), "");
    }

    #[test]
    fn test_render_declarations() {
        let lines = ["#define NO_VAL (0xfffffffe)\n", "#define NO_VAL8 (0xfe)\n", "#define ERR -1\n"];
        let result = MacroTranslator::default().translate("slurm.h", lines).unwrap();

        assert_eq!(
            render_declarations("slurm/slurm.h", &result),
            "cdef extern from \"slurm/slurm.h\":\n\n    uint32_t NO_VAL\n    uint8_t NO_VAL8\n    int8_t ERR\n"
        );
        assert_eq!(render_declarations("slurm/slurm.h", &TranslationResult::default()), "");
    }

    #[test]
    fn test_render_constants() {
        let lines = ["#define A 1\n", "#define B 2\n"];
        let result = MacroTranslator::default().translate("slurm.h", lines).unwrap();
        assert_eq!(render_constants("slurm", &result), "A = slurm.A\nB = slurm.B\n");
    }
}
