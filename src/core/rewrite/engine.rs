use serde::Serialize;

use super::pattern::Pattern;

/// Occurrences one pattern rewrote in one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternHit {
    pub pattern_id: String,
    pub occurrences: usize,
}

/// Outcome of running a pattern list over one file's text.
#[derive(Debug, Clone)]
pub struct RewriteResult {
    pub original_text: String,
    pub final_text: String,
    /// One entry per pattern run, in run order, zero counts included.
    pub applied: Vec<PatternHit>,
    pub changed: bool,
}

impl RewriteResult {
    /// Entries with at least one occurrence.
    pub fn hits(&self) -> Vec<PatternHit> {
        self.applied
            .iter()
            .filter(|hit| hit.occurrences > 0)
            .cloned()
            .collect()
    }

    pub fn total_occurrences(&self) -> usize {
        self.applied.iter().map(|hit| hit.occurrences).sum()
    }

    pub fn occurrences_of(&self, pattern_id: &str) -> usize {
        self.applied
            .iter()
            .find(|hit| hit.pattern_id == pattern_id)
            .map_or(0, |hit| hit.occurrences)
    }
}

/// Apply `patterns` in order, each one seeing the text left by the previous.
///
/// Single pass: text produced by a later pattern is not revisited by an
/// earlier one.
pub fn apply(text: &str, patterns: &[&Pattern]) -> RewriteResult {
    let mut current = text.to_string();
    let mut applied = Vec::with_capacity(patterns.len());

    for pattern in patterns {
        let occurrences = match pattern.rewrite(&current) {
            Some((rewritten, count)) => {
                tracing::trace!(pattern = pattern.id(), count, "pattern matched");
                current = rewritten;
                count
            }
            None => 0,
        };

        applied.push(PatternHit {
            pattern_id: pattern.id().to_string(),
            occurrences,
        });
    }

    let changed = current != text;
    tracing::debug!(
        patterns = patterns.len(),
        changed,
        "rewrite pass finished"
    );

    RewriteResult {
        original_text: text.to_string(),
        final_text: current,
        applied,
        changed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite::PatternDef;

    fn compile(defs: Vec<PatternDef>) -> Vec<Pattern> {
        defs.into_iter().map(|d| Pattern::compile(d).unwrap()).collect()
    }

    #[test]
    fn later_patterns_see_earlier_output() {
        let patterns = compile(vec![
            PatternDef::new("a", "foo", "bar"),
            PatternDef::new("b", "bar", "baz"),
        ]);
        let refs: Vec<&Pattern> = patterns.iter().collect();

        let result = apply("foo bar", &refs);
        assert_eq!(result.final_text, "baz baz");
        assert_eq!(result.occurrences_of("a"), 1);
        assert_eq!(result.occurrences_of("b"), 2);
        assert!(result.changed);
    }

    #[test]
    fn single_sweep_does_not_revisit_earlier_patterns() {
        let patterns = compile(vec![
            PatternDef::new("a", "x", "y"),
            PatternDef::new("b", "z", "x"),
        ]);
        let refs: Vec<&Pattern> = patterns.iter().collect();

        let result = apply("z", &refs);
        assert_eq!(result.final_text, "x");
        assert_eq!(result.occurrences_of("a"), 0);
    }

    #[test]
    fn unmatched_text_is_identical_with_zero_counts() {
        let patterns = compile(vec![
            PatternDef::new("a", "foo", "bar"),
            PatternDef::new("b", r"(\d)", "$1$1"),
        ]);
        let refs: Vec<&Pattern> = patterns.iter().collect();

        let text = "nothing to see here\n";
        let result = apply(text, &refs);
        assert_eq!(result.final_text, text);
        assert!(!result.changed);
        assert_eq!(result.applied.len(), 2);
        assert!(result.applied.iter().all(|hit| hit.occurrences == 0));
        assert!(result.hits().is_empty());
    }

    #[test]
    fn identity_replacement_counts_but_does_not_change() {
        let patterns = compile(vec![PatternDef::new("a", "(same)", "$1")]);
        let refs: Vec<&Pattern> = patterns.iter().collect();

        let result = apply("same", &refs);
        assert_eq!(result.total_occurrences(), 1);
        assert!(!result.changed);
    }

    #[test]
    fn no_patterns_is_a_no_op() {
        let result = apply("text", &[]);
        assert_eq!(result.final_text, "text");
        assert!(result.applied.is_empty());
        assert!(!result.changed);
    }
}
