use attest_core::metrics_api::{Evidence, Metric, MetricInput, MetricKind, MetricResult};

const MINOR_WORDS: &[&str] = &["and", "the", "for", "of", "or", "to", "a", "an", "in", "on", "with"];

pub struct FormatComplianceMetric;

impl Metric for FormatComplianceMetric {
    fn kind(&self) -> MetricKind {
        MetricKind::Format
    }

    fn evaluate(&self, input: &MetricInput<'_>) -> MetricResult {
        format_compliance(input.letter, &input.case.expected_sections)
    }
}

pub fn format_compliance(letter: &str, expected_sections: &[String]) -> MetricResult {
    let headers: Vec<&String> = expected_sections
        .iter()
        .filter(|h| !h.trim().is_empty())
        .collect();
    if headers.is_empty() {
        return MetricResult::new(
            MetricKind::Format,
            1.0,
            Evidence::Format {
                present: vec![],
                missing: vec![],
            },
        );
    }

    let letter_lower = letter.to_lowercase();
    let lines: Vec<String> = letter.lines().map(clean_line).collect();

    let mut present = Vec::new();
    let mut missing = Vec::new();
    for h in headers {
        if header_present(&letter_lower, &lines, h) {
            present.push(h.clone());
        } else {
            missing.push(h.clone());
        }
    }

    let score = present.len() as f64 / (present.len() + missing.len()) as f64;
    MetricResult::new(MetricKind::Format, score, Evidence::Format { present, missing })
}

fn header_present(letter_lower: &str, lines: &[String], header: &str) -> bool {
    let header_lower = header.trim().to_lowercase();
    if letter_lower.contains(&header_lower) {
        return true;
    }
    let words = significant_words(&header_lower);
    if words.is_empty() {
        return false;
    }
    lines
        .iter()
        .any(|line| words.iter().all(|w| line.contains(w.as_str())))
}

fn significant_words(header_lower: &str) -> Vec<String> {
    header_lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= 3 && !MINOR_WORDS.contains(w))
        .map(str::to_string)
        .collect()
}

/// Lowercases a line and strips heading/bullet/number markers and a trailing colon.
fn clean_line(line: &str) -> String {
    let body = line
        .trim()
        .trim_start_matches(|c: char| matches!(c, '#' | '*' | '-' | '•' | '>' | '_' | '=') || c.is_whitespace());
    let body = strip_number_marker(body);
    body.trim_start_matches(|c: char| matches!(c, '*' | '_') || c.is_whitespace())
        .trim_end_matches(|c: char| matches!(c, '*' | '_' | '#' | ':') || c.is_whitespace())
        .to_lowercase()
}

fn strip_number_marker(s: &str) -> &str {
    let digits = s.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return s;
    }
    match s[digits..].strip_prefix(['.', ')']) {
        Some(rest) => rest,
        None => s,
    }
}
