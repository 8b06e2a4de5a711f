use attest_core::metrics_api::MetricInput;
use attest_core::safety::{CheckOutcome, FindingKind, SafetyCheck, SafetyFinding};
use regex::Regex;
use std::sync::OnceLock;

const MIN_CANDIDATE_LEN: usize = 3;

const STOPLIST: &[&str] = &[
    "the", "this", "that", "these", "those", "our", "your", "his", "her", "their", "its",
    "which", "what", "each", "any", "all", "and", "for", "with", "from",
];

/// Proper-noun run: up to six capitalized tokens.
const NAME: &str = r"[A-Z][A-Za-z0-9&'\-]*(?:\s+(?:of\s+|for\s+|and\s+|&\s+)?[A-Z][A-Za-z0-9&'\-]*){0,5}";

fn patterns() -> &'static [Regex] {
    static RE: OnceLock<Vec<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        [
            format!(r"\b(?i:per|according\s+to)\s+(?:(?i:the)\s+)?({})", NAME),
            format!(r"\b(?i:guidelines?)\s+(?i:from|by|of)\s+(?:(?i:the)\s+)?({})", NAME),
            r"\b(?i:study|studies|trial)\s+(?i:by)\s+([A-Z][A-Za-z'\-]+(?:\s+et\s+al\.?)?)".to_string(),
            r"\(([A-Z][A-Za-z'\-]+(?:\s+et\s+al\.?)?(?:\s+(?:and|&)\s+[A-Z][A-Za-z'\-]+)?),\s*(?:19|20)\d{2}[a-z]?\)"
                .to_string(),
        ]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
    })
}

/// Citation-like phrases, trimmed, filtered and deduplicated case-insensitively.
pub fn citation_candidates(letter: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for re in patterns() {
        for caps in re.captures_iter(letter) {
            let Some(m) = caps.get(1) else { continue };
            let candidate = m.as_str().trim().trim_end_matches(['.', ',', ';', ':']).trim();
            if candidate.chars().count() < MIN_CANDIDATE_LEN {
                continue;
            }
            let lower = candidate.to_lowercase();
            if STOPLIST.contains(&lower.as_str()) {
                continue;
            }
            if out.iter().any(|c| c.to_lowercase() == lower) {
                continue;
            }
            out.push(candidate.to_string());
        }
    }
    out
}

fn is_known(candidate: &str, known_sources: &[String]) -> bool {
    let c = candidate.to_lowercase();
    known_sources
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .any(|s| s.contains(&c) || c.contains(&s))
}

/// Without known sources every candidate is an unverified warning; with
/// them, anything unmatched is fabricated.
pub struct CitationCheck;

impl SafetyCheck for CitationCheck {
    fn name(&self) -> &'static str {
        "citations"
    }

    fn check(&self, input: &MetricInput<'_>, known_sources: &[String]) -> CheckOutcome {
        let candidates = citation_candidates(input.letter);
        let have_sources = known_sources.iter().any(|s| !s.trim().is_empty());

        let mut passed = true;
        let mut findings = Vec::new();
        for c in candidates {
            if !have_sources {
                findings.push(SafetyFinding::new(
                    FindingKind::UnverifiedCitation,
                    c.as_str(),
                    format!("citation \"{}\" could not be verified (no known sources)", c),
                ));
            } else if !is_known(&c, known_sources) {
                passed = false;
                findings.push(SafetyFinding::new(
                    FindingKind::FabricatedCitation,
                    c.as_str(),
                    format!("citation \"{}\" matches no known source", c),
                ));
            }
        }
        if !passed {
            tracing::debug!(count = findings.len(), "fabricated citations");
        }
        CheckOutcome { passed, findings }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::safety::case_with;

    const LETTER: &str = "According to the North American Spine Society guidelines, surgery is \
        indicated. Per InterQual criteria the request is met (Smith, 2019). A study by Jones et al. \
        supports this.";

    #[test]
    fn test_candidates() {
        assert_eq!(
            citation_candidates(LETTER),
            vec!["North American Spine Society", "InterQual", "Jones et al", "Smith"]
        );
    }

    #[test]
    fn test_stoplist_and_min_length() {
        assert!(citation_candidates("Per the patient's report. Per This. Per AB.").is_empty());
    }

    #[test]
    fn test_unverified_without_sources() {
        let tc = case_with(&[], &[]);
        let out = CitationCheck.check(&MetricInput::new(LETTER, &tc), &[]);
        assert!(out.passed);
        assert_eq!(out.findings.len(), 4);
        assert!(out
            .findings
            .iter()
            .all(|f| f.kind == FindingKind::UnverifiedCitation));
    }

    #[test]
    fn test_fabricated_with_sources() {
        let tc = case_with(&[], &[]);
        let known = vec![
            "NASS Coverage Policy: North American Spine Society".to_string(),
            "InterQual".to_string(),
        ];
        let out = CitationCheck.check(&MetricInput::new(LETTER, &tc), &known);
        assert!(!out.passed);
        let fabricated: Vec<_> = out.findings.iter().map(|f| f.value.as_str()).collect();
        assert_eq!(fabricated, vec!["Jones et al", "Smith"]);
        assert!(out
            .findings
            .iter()
            .all(|f| f.kind == FindingKind::FabricatedCitation));
    }

    #[test]
    fn test_substring_match_either_direction() {
        assert!(is_known("InterQual 2024 Criteria", &["interqual".to_string()]));
        assert!(is_known("MCG", &["MCG Health Guidelines".to_string()]));
        assert!(!is_known("Smith", &["  ".to_string()]));
    }
}
