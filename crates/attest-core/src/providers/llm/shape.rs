use serde_json::Value;

/// The payload layouts a generation endpoint has been seen to return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseShape {
    /// `{"message": {"content": "..."}}`
    MessageContent(String),
    /// `{"choices": [{"message": {"content": "..."}}]}`
    ChoicesContent(String),
    /// `{"response": "..."}`
    Response(String),
    Unknown,
}

impl ResponseShape {
    /// Probes the known layouts in priority order; the first non-empty
    /// string wins.
    pub fn detect(body: &Value) -> Self {
        if let Some(s) = non_empty_str(body.pointer("/message/content")) {
            return ResponseShape::MessageContent(s);
        }
        if let Some(s) = non_empty_str(body.pointer("/choices/0/message/content")) {
            return ResponseShape::ChoicesContent(s);
        }
        if let Some(s) = non_empty_str(body.get("response")) {
            return ResponseShape::Response(s);
        }
        ResponseShape::Unknown
    }

    pub fn name(&self) -> &'static str {
        match self {
            ResponseShape::MessageContent(_) => "message.content",
            ResponseShape::ChoicesContent(_) => "choices[0].message.content",
            ResponseShape::Response(_) => "response",
            ResponseShape::Unknown => "unknown",
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            ResponseShape::MessageContent(s)
            | ResponseShape::ChoicesContent(s)
            | ResponseShape::Response(s) => Some(s),
            ResponseShape::Unknown => None,
        }
    }
}

fn non_empty_str(v: Option<&Value>) -> Option<String> {
    v.and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}
