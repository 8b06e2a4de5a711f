use crate::text::content_words;
use attest_core::metrics_api::{Evidence, Metric, MetricInput, MetricKind, MetricResult};
use regex::Regex;
use std::sync::OnceLock;

/// Share of an item's content words that must appear in the letter.
pub const ADDRESSED_THRESHOLD: f64 = 0.4;

pub struct CriteriaCoverageMetric;

impl Metric for CriteriaCoverageMetric {
    fn kind(&self) -> MetricKind {
        MetricKind::Coverage
    }

    fn evaluate(&self, input: &MetricInput<'_>) -> MetricResult {
        criteria_coverage(input.letter, input.criteria())
    }
}

fn item_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(?:\d+[.)]|[-*•])\s+(.+?)\s*$").unwrap())
}

/// Enumerated criteria (`1.`, `2)`, `-`, `*`, `•`); an indented line after an
/// item continues it. Without any marker, each non-empty line is its own item.
pub fn split_criteria(criteria: &str) -> Vec<String> {
    let mut enumerated: Vec<String> = Vec::new();
    for line in criteria.lines() {
        if let Some(item) = item_re().captures(line).and_then(|c| c.get(1)) {
            enumerated.push(item.as_str().to_string());
            continue;
        }
        let text = line.trim();
        if text.is_empty() || !line.starts_with(char::is_whitespace) {
            continue;
        }
        if let Some(last) = enumerated.last_mut() {
            last.push(' ');
            last.push_str(text);
        }
    }
    if !enumerated.is_empty() {
        return enumerated;
    }
    criteria
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn criteria_coverage(letter: &str, criteria: &str) -> MetricResult {
    let items = split_criteria(criteria);
    if items.is_empty() {
        return MetricResult::new(
            MetricKind::Coverage,
            1.0,
            Evidence::Coverage {
                addressed: vec![],
                missed: vec![],
            },
        );
    }

    let letter_lower = letter.to_lowercase();
    let mut addressed = Vec::new();
    let mut missed = Vec::new();

    for item in items {
        let words = content_words(&item);
        let hit = words.iter().filter(|w| letter_lower.contains(w.as_str())).count();
        let is_addressed = words.is_empty() || hit as f64 / words.len() as f64 >= ADDRESSED_THRESHOLD;
        if is_addressed {
            addressed.push(item);
        } else {
            missed.push(item);
        }
    }

    tracing::trace!(
        addressed = addressed.len(),
        missed = missed.len(),
        "criteria coverage"
    );
    let total = addressed.len() + missed.len();
    let score = addressed.len() as f64 / total as f64;
    MetricResult::new(
        MetricKind::Coverage,
        score,
        Evidence::Coverage { addressed, missed },
    )
}
