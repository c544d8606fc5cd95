//! Macro value parsing
//!
//! Evaluates the small literal grammar found on the right-hand side of
//! Slurm `#define`s: bit-flag helpers, hex (bare or parenthesized) and
//! decimal integers.

use regex::Regex;

/// Parses raw macro values into integers
#[derive(Debug, Clone)]
pub struct ValueParser {
    /// Matches `<BIT_MACRO>(<n>)`
    bit_pattern: Option<Regex>,
}

impl ValueParser {
    /// Create a parser recognizing the given bit-flag macro names
    pub fn new<S: AsRef<str>>(bit_macros: &[S]) -> Self {
        let names: Vec<String> = bit_macros
            .iter()
            .map(|n| regex::escape(n.as_ref()))
            .filter(|n| !n.is_empty())
            .collect();

        let bit_pattern = if names.is_empty() {
            None
        } else {
            let pattern = format!(r"^(?:{})\s*\(\s*(\d+)\s*\)$", names.join("|"));
            Regex::new(&pattern).ok()
        };

        Self { bit_pattern }
    }

    /// Evaluate a raw value, or `None` if it is not a supported literal
    pub fn parse(&self, raw: &str) -> Option<i128> {
        let raw = strip_comment(raw).trim();

        if let Some(v) = self.parse_bit(raw) {
            return Some(v);
        }

        if let Some(digits) = raw.strip_prefix("0x") {
            if let Ok(v) = i128::from_str_radix(digits, 16) {
                return Some(v);
            }
        }

        if raw.starts_with("(0x") {
            if let Some(v) = parse_parenthesized_hex(raw) {
                return Some(v);
            }
        }

        raw.parse::<i128>().ok()
    }

    fn parse_bit(&self, raw: &str) -> Option<i128> {
        let caps = self.bit_pattern.as_ref()?.captures(raw)?;
        let shift: u32 = caps.get(1)?.as_str().parse().ok()?;
        // 1 << 127 is the sign bit of an i128
        if shift >= 127 {
            return None;
        }
        Some(1i128 << shift)
    }
}

impl Default for ValueParser {
    fn default() -> Self {
        Self::new(&["SLURM_BIT"])
    }
}

/// Cut a trailing `/* ... */` or `// ...` comment off a value
fn strip_comment(raw: &str) -> &str {
    match [raw.find("/*"), raw.find("//")].into_iter().flatten().min() {
        Some(start) => &raw[..start],
        None => raw,
    }
}

fn parse_parenthesized_hex(raw: &str) -> Option<i128> {
    let open = raw.find('(')?;
    let close = open + raw[open..].find(')')?;
    let inner = raw[open + 1..close].trim();
    let digits = inner.strip_prefix("0x")?;
    i128::from_str_radix(digits, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_flag() {
        let parser = ValueParser::default();
        assert_eq!(parser.parse("SLURM_BIT(0)"), Some(1));
        assert_eq!(parser.parse("SLURM_BIT(3)"), Some(8));
        assert_eq!(parser.parse("SLURM_BIT(63)"), Some(1i128 << 63));
        assert_eq!(parser.parse("SLURM_BIT(64)"), Some(1i128 << 64));
        assert_eq!(parser.parse("SLURM_BIT(200)"), None);
    }

    #[test]
    fn test_bit_flag_requires_known_macro() {
        let parser = ValueParser::default();
        assert_eq!(parser.parse("OTHER_BIT(3)"), None);

        let parser = ValueParser::new(&["MY_BIT", "SLURM_BIT"]);
        assert_eq!(parser.parse("MY_BIT(4)"), Some(16));
        assert_eq!(parser.parse("SLURM_BIT(1)"), Some(2));
    }

    #[test]
    fn test_hex() {
        let parser = ValueParser::default();
        assert_eq!(parser.parse("0x10"), Some(16));
        assert_eq!(parser.parse("0xfffffffe"), Some(0xfffffffe));
        assert_eq!(parser.parse("0xFFFFFFFFFFFFFFFF"), Some(u64::MAX as i128));
        assert_eq!(parser.parse("(0xFF)"), Some(255));
        assert_eq!(parser.parse("(0x7f) /* mask */"), Some(127));
    }

    #[test]
    fn test_decimal() {
        let parser = ValueParser::default();
        assert_eq!(parser.parse("42"), Some(42));
        assert_eq!(parser.parse("-1"), Some(-1));
        assert_eq!(parser.parse("+7"), Some(7));
        assert_eq!(parser.parse("18446744073709551616"), Some(1i128 << 64));
    }

    #[test]
    fn test_trailing_comments() {
        let parser = ValueParser::default();
        assert_eq!(parser.parse("0x01\t/* Allow job submission to partition */"), Some(1));
        assert_eq!(parser.parse("SLURM_BIT(8) /* launch failed */"), Some(256));
        assert_eq!(parser.parse("512 /* per node */"), Some(512));
        assert_eq!(parser.parse("(0xfffffffe) /* no value */"), Some(0xfffffffe));
        assert_eq!(parser.parse("-1 // error"), Some(-1));
        assert_eq!(parser.parse("0x10/*no space*/"), Some(16));
        assert_eq!(parser.parse("FOO_REF /* 42 */"), None);
        assert_eq!(parser.parse("/* 42 */"), None);
    }

    #[test]
    fn test_unresolved() {
        let parser = ValueParser::default();
        assert_eq!(parser.parse("FOO_REF"), None);
        assert_eq!(parser.parse("\"slurm\""), None);
        assert_eq!(parser.parse("0xZZ"), None);
        assert_eq!(parser.parse("(0x01 << 3)"), None);
        assert_eq!(parser.parse("(NO_VAL - 1)"), None);
        assert_eq!(parser.parse("1U"), None);
        assert_eq!(parser.parse(""), None);
    }
}
