//! Small lexical helpers shared by the scorers.

const STOPWORDS: &[&str] = &[
    "with", "that", "this", "from", "have", "been", "were", "will", "than", "then", "they",
    "them", "their", "which", "when", "where", "what", "must", "should", "shall", "also",
    "into", "such", "other", "each", "least", "more", "most", "only", "does", "including",
];

/// Lowercased alphanumeric tokens of at least four characters, minus function words.
pub fn content_words(s: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for w in s
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= 4)
    {
        let w = w.to_lowercase();
        if STOPWORDS.contains(&w.as_str()) || out.contains(&w) {
            continue;
        }
        out.push(w);
    }
    out
}
