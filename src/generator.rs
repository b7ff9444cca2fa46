//! Feature generation rules
//!
//! A [`Generator`] turns the ordered, projected attribute values of a
//! selection into feature values. Ranges and patterns are checked when the
//! generator is built, so applying one never fails.

use regex::Regex;
use std::fmt::{self, Debug};
use std::sync::Arc;

use crate::error::TemplateError;

/// Joins consecutive projected values inside one feature value
pub const VALUE_SEPARATOR: &str = "_";

/// Default separator used by [`Generator::regexp`] to join values
pub const DEFAULT_REGEXP_SEPARATOR: &str = " ";

/// Inclusive ngram length range, both ends positive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NgramRange {
    min: usize,
    max: usize,
}

impl NgramRange {
    /// Ngrams of exactly length `n`
    pub fn exact(n: i64) -> Result<Self, TemplateError> {
        Self::new(n, n)
    }

    /// Ngrams of every length in `min..=max`
    pub fn new(min: i64, max: i64) -> Result<Self, TemplateError> {
        if min <= 0 || max < min {
            return Err(TemplateError::InvalidNgramRange { min, max });
        }
        Ok(Self {
            min: min as usize,
            max: max as usize,
        })
    }

    pub fn min(&self) -> usize {
        self.min
    }

    pub fn max(&self) -> usize {
        self.max
    }

    /// Number of ngrams this range yields over `n` values
    pub fn count(&self, n: usize) -> usize {
        (self.min..=self.max.min(n)).map(|l| n - l + 1).sum()
    }
}

/// A user-supplied generation rule
pub type CustomRule = Arc<dyn Fn(&[String]) -> Vec<String> + Send + Sync>;

/// How projected values become feature values
#[derive(Clone, Default)]
pub enum Generator {
    /// The whole sequence as one value
    #[default]
    Concat,
    /// Every contiguous window whose length is in range, shortest first
    Ngrams(NgramRange),
    /// Every prefix, growing rightwards from the first value
    RightNgrams,
    /// Every suffix, growing leftwards from the last value
    LeftNgrams,
    /// One boolean value: does `regex` match the values joined by `separator`
    Regexp {
        regex: Regex,
        label: String,
        separator: String,
    },
    Custom(CustomRule),
}

// Manual Debug implementation (closures have none)
impl Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Generator::Concat => f.write_str("Concat"),
            Generator::Ngrams(range) => f.debug_tuple("Ngrams").field(range).finish(),
            Generator::RightNgrams => f.write_str("RightNgrams"),
            Generator::LeftNgrams => f.write_str("LeftNgrams"),
            Generator::Regexp {
                regex,
                label,
                separator,
            } => f
                .debug_struct("Regexp")
                .field("pattern", &regex.as_str())
                .field("label", label)
                .field("separator", separator)
                .finish(),
            Generator::Custom(_) => f.write_str("Custom"),
        }
    }
}

impl Generator {
    pub fn ngrams(n: i64) -> Result<Self, TemplateError> {
        Ok(Generator::Ngrams(NgramRange::exact(n)?))
    }

    pub fn ngram_range(min: i64, max: i64) -> Result<Self, TemplateError> {
        Ok(Generator::Ngrams(NgramRange::new(min, max)?))
    }

    pub fn regexp(pattern: &str, label: &str, separator: &str) -> Result<Self, TemplateError> {
        let regex = Regex::new(pattern).map_err(|source| TemplateError::InvalidRegex {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Generator::Regexp {
            regex,
            label: label.to_string(),
            separator: separator.to_string(),
        })
    }

    pub fn custom<F>(rule: F) -> Self
    where
        F: Fn(&[String]) -> Vec<String> + Send + Sync + 'static,
    {
        Generator::Custom(Arc::new(rule))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Generator::Concat => "Indicator",
            Generator::Ngrams(_) => "Ngrams",
            Generator::RightNgrams => "RightNgrams",
            Generator::LeftNgrams => "LeftNgrams",
            Generator::Regexp { .. } => "Regexp",
            Generator::Custom(_) => "Custom",
        }
    }

    /// Generate feature values from a non-empty projected sequence
    pub fn generate(&self, values: &[String]) -> Vec<String> {
        match self {
            Generator::Concat => vec![values.join(VALUE_SEPARATOR)],

            Generator::Ngrams(range) => {
                let n = values.len();
                let mut grams = Vec::with_capacity(range.count(n));
                for len in range.min..=range.max.min(n) {
                    grams.extend(values.windows(len).map(|w| w.join(VALUE_SEPARATOR)));
                }
                grams
            }

            Generator::RightNgrams => (1..=values.len())
                .map(|len| values[..len].join(VALUE_SEPARATOR))
                .collect(),

            Generator::LeftNgrams => (0..values.len())
                .map(|start| values[start..].join(VALUE_SEPARATOR))
                .collect(),

            Generator::Regexp {
                regex,
                label,
                separator,
            } => {
                let matched = regex.is_match(&values.join(separator));
                vec![format!(
                    "RGX:{}={}",
                    label,
                    if matched { "True" } else { "False" }
                )]
            }

            Generator::Custom(rule) => rule(values),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(words: &[&str]) -> Vec<String> {
        words.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_concat() {
        let v = values(&["severe", "headaches"]);
        assert_eq!(Generator::Concat.generate(&v), vec!["severe_headaches"]);
    }

    #[test]
    fn test_ngram_range_counts() {
        let v = values(&["a", "b", "c", "d"]);
        let generator = Generator::ngram_range(2, 3).unwrap();
        let grams = generator.generate(&v);

        assert_eq!(grams, vec!["a_b", "b_c", "c_d", "a_b_c", "b_c_d"]);
        // (4 - 2 + 1) + (4 - 3 + 1)
        assert_eq!(grams.len(), 5);
    }

    #[test]
    fn test_ngram_range_clipped_to_sequence() {
        let v = values(&["a", "b"]);
        let range = NgramRange::new(1, 5).unwrap();
        assert_eq!(range.count(2), 3);
        assert_eq!(
            Generator::Ngrams(range).generate(&v),
            vec!["a", "b", "a_b"]
        );
    }

    #[test]
    fn test_exact_ngrams() {
        let v = values(&["a", "b", "c"]);
        assert_eq!(Generator::ngrams(2).unwrap().generate(&v), vec!["a_b", "b_c"]);
        assert!(Generator::ngrams(4).unwrap().generate(&v).is_empty());
    }

    #[test]
    fn test_invalid_ngram_ranges() {
        assert!(matches!(
            Generator::ngrams(0),
            Err(TemplateError::InvalidNgramRange { min: 0, max: 0 })
        ));
        assert!(NgramRange::new(-1, 2).is_err());
        assert!(NgramRange::new(3, 2).is_err());
        assert!(NgramRange::new(2, 2).is_ok());
    }

    #[test]
    fn test_right_and_left_ngrams() {
        let v = values(&["a", "b", "c"]);

        assert_eq!(Generator::RightNgrams.generate(&v), vec!["a", "a_b", "a_b_c"]);
        assert_eq!(Generator::LeftNgrams.generate(&v), vec!["a_b_c", "b_c", "c"]);
    }

    #[test]
    fn test_regexp() {
        let generator = Generator::regexp("^[A-Z].*$", "STARTS_W_CAPITAL", " ").unwrap();

        assert_eq!(
            generator.generate(&values(&["Aspirin"])),
            vec!["RGX:STARTS_W_CAPITAL=True"]
        );
        assert_eq!(
            generator.generate(&values(&["severe", "Headaches"])),
            vec!["RGX:STARTS_W_CAPITAL=False"]
        );
    }

    #[test]
    fn test_regexp_uses_separator() {
        let generator = Generator::regexp("severe-headaches", "SEV", "-").unwrap();
        assert_eq!(
            generator.generate(&values(&["severe", "headaches"])),
            vec!["RGX:SEV=True"]
        );
    }

    #[test]
    fn test_invalid_regexp() {
        assert!(matches!(
            Generator::regexp("(", "BAD", " "),
            Err(TemplateError::InvalidRegex { .. })
        ));
    }

    #[test]
    fn test_custom() {
        let generator = Generator::custom(|v| vec![v.len().to_string()]);
        assert_eq!(generator.generate(&values(&["a", "b"])), vec!["2"]);
        assert_eq!(format!("{:?}", generator), "Custom");
    }
}
