use regex::Regex;
use std::sync::OnceLock;

/// Diagnosis and procedure codes mentioned in a letter, in order of first
/// appearance, deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedCodes {
    pub diagnosis: Vec<String>,
    pub procedure: Vec<String>,
}

impl ExtractedCodes {
    pub fn all(&self) -> impl Iterator<Item = &String> {
        self.diagnosis.iter().chain(self.procedure.iter())
    }
}

fn diagnosis_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // letter, 2-3 digits, '.', 1-4 digits
    RE.get_or_init(|| Regex::new(r"\b[A-Z]\d{2,3}\.\d{1,4}\b").unwrap())
}

fn procedure_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\d{5}\b").unwrap())
}

pub fn extract_codes(text: &str) -> ExtractedCodes {
    let mut out = ExtractedCodes::default();

    for m in diagnosis_re().find_iter(text) {
        push_unique(&mut out.diagnosis, m.as_str());
    }

    for m in procedure_re().find_iter(text) {
        // Skip digits glued to a decimal point ("12345.6", "1.12345").
        let before = text[..m.start()].chars().next_back();
        let after = text[m.end()..].chars().next();
        if before == Some('.') || (after == Some('.') && next_is_digit(&text[m.end()..])) {
            continue;
        }
        let Ok(n) = m.as_str().parse::<u32>() else {
            continue;
        };
        if (10000..=99999).contains(&n) {
            push_unique(&mut out.procedure, m.as_str());
        }
    }

    out
}

fn next_is_digit(rest: &str) -> bool {
    rest.chars().nth(1).is_some_and(|c| c.is_ascii_digit())
}

fn push_unique(v: &mut Vec<String>, s: &str) {
    if !v.iter().any(|x| x == s) {
        v.push(s.to_string());
    }
}
