use regex::Regex;

use crate::process::error::{ProcessError, ProcessResult};
use crate::process::OutputExtractor;

/// Counts the matches of a pattern in command output.
///
/// Zero matches is treated as malformed output unless the text also matches
/// the optional `well_formed` pattern, which identifies output that can
/// legitimately contain nothing of interest (e.g. a table header with no
/// rows).
#[derive(Debug, Clone)]
pub struct PatternCounter {
    pattern: Regex,
    well_formed: Option<Regex>,
}

impl PatternCounter {
    /// Create a counter for `pattern`
    pub fn new(pattern: Regex) -> Self {
        Self {
            pattern,
            well_formed: None,
        }
    }

    /// Accept zero matches when the output matches `marker`
    pub fn allow_empty_when(mut self, marker: Regex) -> Self {
        self.well_formed = Some(marker);
        self
    }

    /// Count matches, applying the empty-output policy
    pub fn count(&self, output: &str) -> ProcessResult<usize> {
        let count = self.pattern.find_iter(output).count();

        if count == 0 {
            let well_formed = self
                .well_formed
                .as_ref()
                .is_some_and(|marker| marker.is_match(output));
            if !well_formed {
                return Err(ProcessError::Parse(format!(
                    "no lines matching {} in output",
                    self.pattern.as_str()
                )));
            }
        }

        Ok(count)
    }
}

impl OutputExtractor for PatternCounter {
    fn extract(&self, output: &str) -> ProcessResult<Vec<f64>> {
        self.count(output).map(|count| vec![count as f64])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter() -> PatternCounter {
        PatternCounter::new(Regex::new(r"(?m)^ok\b").unwrap())
    }

    #[test]
    fn test_counts_matches() {
        assert_eq!(counter().count("ok 1\nfail\nok 2\n").unwrap(), 2);
    }

    #[test]
    fn test_zero_matches_is_parse_error() {
        let err = counter().count("fail\n").unwrap_err();
        assert!(matches!(err, ProcessError::Parse(_)));
    }

    #[test]
    fn test_zero_matches_allowed_with_marker() {
        let counter = counter().allow_empty_when(Regex::new(r"(?m)^status$").unwrap());
        assert_eq!(counter.count("status\nfail\n").unwrap(), 0);
        assert!(counter.count("garbage").is_err());
        assert_eq!(counter.extract("ok\n").unwrap(), vec![1.0]);
    }
}
