//! Target-script detection.
//!
//! A string is a translation candidate only if it contains at least one
//! character from the configured code-point ranges. The default is the CJK
//! Unified Ideographs block.

use std::ops::RangeInclusive;

/// Default range, `U+4E00..=U+9FA5`.
pub const DEFAULT_RANGE: &str = "4E00-9FA5";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetScript {
    ranges: Vec<RangeInclusive<char>>,
}

impl Default for TargetScript {
    fn default() -> Self {
        Self::cjk()
    }
}

impl TargetScript {
    pub fn cjk() -> Self {
        Self {
            ranges: vec!['\u{4e00}'..='\u{9fa5}'],
        }
    }

    pub fn from_ranges(ranges: Vec<RangeInclusive<char>>) -> Self {
        Self { ranges }
    }

    /// Build from `"4E00-9FA5"` / `"3007"` style specs.
    ///
    /// Invalid entries are dropped and reported; an empty result falls back
    /// to the default range.
    pub fn from_specs(specs: &[String]) -> (Self, Vec<String>) {
        let mut ranges = Vec::new();
        let mut warnings = Vec::new();
        for spec in specs {
            match parse_range(spec) {
                Some(range) => ranges.push(range),
                None => warnings.push(format!("ignoring invalid targetScript range \"{spec}\"")),
            }
        }
        if ranges.is_empty() {
            return (Self::cjk(), warnings);
        }
        (Self { ranges }, warnings)
    }

    pub fn contains_char(&self, c: char) -> bool {
        self.ranges.iter().any(|r| r.contains(&c))
    }

    pub fn matches(&self, text: &str) -> bool {
        text.chars().any(|c| self.contains_char(c))
    }
}

fn parse_code_point(hex: &str) -> Option<char> {
    let hex = hex
        .trim()
        .trim_start_matches("U+")
        .trim_start_matches("u+")
        .trim_start_matches("0x");
    u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
}

fn parse_range(spec: &str) -> Option<RangeInclusive<char>> {
    match spec.split_once('-') {
        Some((lo, hi)) => {
            let (lo, hi) = (parse_code_point(lo)?, parse_code_point(hi)?);
            (lo <= hi).then_some(lo..=hi)
        }
        None => {
            let c = parse_code_point(spec)?;
            Some(c..=c)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::core::script::*;

    #[test]
    fn test_default_matches_cjk() {
        let script = TargetScript::default();
        assert!(script.matches("确定"));
        assert!(script.matches("Hello 世界"));
        assert!(!script.matches("Hello"));
        assert!(!script.matches(""));
        // Fullwidth punctuation alone is outside the block
        assert!(!script.matches("，！"));
    }

    #[test]
    fn test_from_specs() {
        let (script, warnings) =
            TargetScript::from_specs(&["3040-309F".to_string(), "U+3007".to_string()]);
        assert!(warnings.is_empty());
        assert!(script.matches("ひらがな"));
        assert!(script.matches("〇"));
        assert!(!script.matches("确定"));
    }

    #[test]
    fn test_from_specs_invalid_falls_back() {
        let (script, warnings) =
            TargetScript::from_specs(&["zzz".to_string(), "9FA5-4E00".to_string()]);
        assert_eq!(warnings.len(), 2);
        assert_eq!(script, TargetScript::cjk());
    }
}
