//! Turns free-form judge output into a score.
//!
//! Structured parsing is tried first (raw body, fenced block, embedded
//! record); when all of those fail the text is searched for a bare number.

use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

#[derive(Debug, Clone, Deserialize)]
struct JudgeReply {
    score: serde_json::Value,
    #[serde(default, alias = "rationale")]
    reasoning: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMethod {
    Json,
    Fenced,
    Embedded,
    Numeric,
    None,
}

impl ParseMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseMethod::Json => "json",
            ParseMethod::Fenced => "fenced",
            ParseMethod::Embedded => "embedded",
            ParseMethod::Numeric => "numeric",
            ParseMethod::None => "none",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedJudgement {
    /// 1..=10, or 0 when no score could be found.
    pub score: u8,
    pub rationale: String,
    pub method: ParseMethod,
}

pub fn parse_judgement(raw: &str) -> ParsedJudgement {
    let text = raw.trim();

    if let Some(p) = parse_record(text, ParseMethod::Json) {
        return p;
    }
    if let Some(inner) = strip_fences(text) {
        if let Some(p) = parse_record(inner, ParseMethod::Fenced) {
            return p;
        }
    }
    if let Some(m) = record_re().find(text) {
        if let Some(p) = parse_record(m.as_str(), ParseMethod::Embedded) {
            return p;
        }
    }

    match extract_numeric_score(text) {
        Some(v) => ParsedJudgement {
            score: clamp_score(v),
            rationale: text.to_string(),
            method: ParseMethod::Numeric,
        },
        None => ParsedJudgement {
            score: 0,
            rationale: text.to_string(),
            method: ParseMethod::None,
        },
    }
}

fn parse_record(s: &str, method: ParseMethod) -> Option<ParsedJudgement> {
    let reply: JudgeReply = serde_json::from_str(s.trim()).ok()?;
    let value = match &reply.score {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    Some(ParsedJudgement {
        score: clamp_score(value),
        rationale: reply.reasoning.unwrap_or_default(),
        method,
    })
}

fn strip_fences(s: &str) -> Option<&str> {
    let caps = fence_re().captures(s)?;
    caps.get(1).map(|m| m.as_str())
}

/// Ordered patterns: `score: N`, `N/10`, then a lone 1..=10 integer.
pub fn extract_numeric_score(text: &str) -> Option<f64> {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    let patterns = PATTERNS.get_or_init(|| {
        vec![
            Regex::new(r"(?i)\bscore\b\W{0,3}[:=]?\s*(\d+(?:\.\d+)?)").unwrap(),
            Regex::new(r"\b(\d+(?:\.\d+)?)\s*/\s*10\b").unwrap(),
            Regex::new(r"\b(10|[1-9])\b").unwrap(),
        ]
    });
    patterns
        .iter()
        .find_map(|re| re.captures(text))
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

pub fn clamp_score(v: f64) -> u8 {
    if !v.is_finite() {
        return 0;
    }
    v.clamp(1.0, 10.0).round() as u8
}

fn fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```[A-Za-z0-9_-]*\s*\n?(.*?)\s*```").unwrap())
}

fn record_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?s)\{[^{}]*"score"[^{}]*\}"#).unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_json() {
        let p = parse_judgement(r#"{"score": 7, "reasoning": "solid"}"#);
        assert_eq!(p.score, 7);
        assert_eq!(p.rationale, "solid");
        assert_eq!(p.method, ParseMethod::Json);
    }

    #[test]
    fn test_fenced_json() {
        let raw = "```json\n{\"score\": 8, \"reasoning\": \"addresses all criteria\"}\n```";
        let p = parse_judgement(raw);
        assert_eq!(p.score, 8);
        assert_eq!(p.rationale, "addresses all criteria");
        assert_eq!(p.method, ParseMethod::Fenced);
    }

    #[test]
    fn test_embedded_record() {
        let raw = "Here is my verdict: {\"score\": 4, \"rationale\": \"thin\"} hope it helps";
        let p = parse_judgement(raw);
        assert_eq!(p.score, 4);
        assert_eq!(p.rationale, "thin");
        assert_eq!(p.method, ParseMethod::Embedded);
    }

    #[test]
    fn test_numeric_fallback_score_colon() {
        let p = parse_judgement("The letter is decent. score: 6 overall, not great");
        assert_eq!(p.score, 6);
        assert_eq!(p.method, ParseMethod::Numeric);
    }

    #[test]
    fn test_numeric_fallback_out_of_ten() {
        assert_eq!(parse_judgement("I'd give it 9/10.").score, 9);
    }

    #[test]
    fn test_numeric_fallback_bare_integer() {
        assert_eq!(parse_judgement("Overall a 5, needs citations").score, 5);
    }

    #[test]
    fn test_nothing_found_is_zero() {
        let p = parse_judgement("no idea");
        assert_eq!(p.score, 0);
        assert_eq!(p.method, ParseMethod::None);
    }

    #[test]
    fn test_scores_are_clamped_and_rounded() {
        assert_eq!(parse_judgement(r#"{"score": 14, "reasoning": ""}"#).score, 10);
        assert_eq!(parse_judgement(r#"{"score": 0, "reasoning": ""}"#).score, 1);
        assert_eq!(parse_judgement(r#"{"score": 7.6, "reasoning": ""}"#).score, 8);
        assert_eq!(parse_judgement(r#"{"score": "3", "reasoning": ""}"#).score, 3);
    }

    #[test]
    fn test_score_pattern_wins_over_bare_integer() {
        assert_eq!(parse_judgement("Section 2 is weak. Score: 7").score, 7);
    }
}
