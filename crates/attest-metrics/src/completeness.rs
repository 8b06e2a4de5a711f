use attest_core::metrics_api::{Evidence, Metric, MetricInput, MetricKind, MetricResult};
use regex::Regex;
use std::sync::OnceLock;

pub const PLACEHOLDER_PENALTY: f64 = 0.15;
pub const SALUTATION_PENALTY: f64 = 0.1;
pub const CLOSING_PENALTY: f64 = 0.1;

pub struct CompletenessMetric;

impl Metric for CompletenessMetric {
    fn kind(&self) -> MetricKind {
        MetricKind::Completeness
    }

    fn evaluate(&self, input: &MetricInput<'_>) -> MetricResult {
        completeness(input.letter)
    }
}

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\[(?:MISSING|TODO|INSERT|TBD|PLACEHOLDER)\b[^\]]*\]").unwrap()
    })
}

fn salutation_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:dear\b|re:|to\s+whom\s+it\s+may\s+concern\b)").unwrap()
    })
}

fn closing_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:sincerely|respectfully|thank\s+you|regards)\b").unwrap()
    })
}

pub fn completeness(letter: &str) -> MetricResult {
    let placeholders: Vec<String> = placeholder_re()
        .find_iter(letter)
        .map(|m| m.as_str().to_string())
        .collect();

    let has_salutation = salutation_re().is_match(letter);
    let has_closing = closing_re().is_match(letter);

    let mut score = 1.0 - PLACEHOLDER_PENALTY * placeholders.len() as f64;
    if !has_salutation {
        score -= SALUTATION_PENALTY;
    }
    if !has_closing {
        score -= CLOSING_PENALTY;
    }

    MetricResult::new(
        MetricKind::Completeness,
        score,
        Evidence::Completeness {
            placeholders,
            has_salutation,
            has_closing,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: &str = "Dear Reviewer,\n\nBody text.\n\nSincerely,\nDr. Example";

    #[test]
    fn test_clean_letter_scores_one() {
        assert_eq!(completeness(FRAME).score, 1.0);
    }

    #[test]
    fn test_each_placeholder_costs_fifteen_hundredths() {
        let one = FRAME.replace("Body text.", "Body [MISSING: imaging date].");
        let two = FRAME.replace("Body text.", "Body [TODO] and [insert NPI].");
        assert!((completeness(&one).score - 0.85).abs() < 1e-9);
        assert!((completeness(&two).score - 0.70).abs() < 1e-9);
    }

    #[test]
    fn test_missing_frame() {
        let r = completeness("Body only.");
        assert!((r.score - 0.8).abs() < 1e-9);
        match r.evidence {
            Evidence::Completeness { has_salutation, has_closing, .. } => {
                assert!(!has_salutation);
                assert!(!has_closing);
            }
            other => panic!("unexpected evidence {:?}", other),
        }
    }

    #[test]
    fn test_bracketed_text_that_is_not_a_placeholder() {
        let letter = FRAME.replace("Body text.", "Body [see attached MRI] and [TODOS].");
        assert_eq!(completeness(&letter).score, 1.0);
    }

    #[test]
    fn test_floor_at_zero() {
        let letter = "[TBD] ".repeat(10);
        assert_eq!(completeness(&letter).score, 0.0);
    }

    #[test]
    fn test_salutation_needs_only_a_word_boundary() {
        assert_eq!(completeness("Dear,\nbody\nSincerely").score, 1.0);
        assert_eq!(completeness("Dear\nDr Smith\nSincerely").score, 1.0);
        assert_eq!(completeness("RE: lumbar decompression\nbody\nRegards").score, 1.0);
    }

    #[test]
    fn test_phrases_inside_other_words_do_not_count() {
        let r = completeness("Procedure: 63047\nbody\nSincerely");
        assert!((r.score - 0.9).abs() < 1e-9);
        let r = completeness("Dearborn clinic\nbody\nDisregards prior notes");
        assert!((r.score - 0.8).abs() < 1e-9);
    }
}
