use crate::model::{ChatMessage, ChatRequest, ClinicalPacket, SamplingOptions, TestCase};

pub const SYSTEM_INSTRUCTION: &str = "You are a clinical documentation specialist drafting a \
prior-authorization letter on behalf of the treating physician. Use only the clinical facts \
provided. Do not invent diagnosis codes, procedure codes, studies or guidelines. Cite the \
payer's policy criteria and show how each one is met. Write a complete letter with a \
salutation, the requested sections, and a closing.";

/// Policy text handed to the model: payer plus the criteria block, if any.
pub fn policy_text(tc: &TestCase) -> String {
    let mut out = format!("Payer: {}\n", tc.payer_id);
    match tc.policy_criteria.as_deref().map(str::trim) {
        Some(c) if !c.is_empty() => {
            out.push_str("Medical policy criteria:\n");
            out.push_str(c);
            out.push('\n');
        }
        _ => out.push_str("Medical policy criteria: not provided\n"),
    }
    out
}

pub fn build_generation_request(
    tc: &TestCase,
    model: &str,
    options: SamplingOptions,
) -> anyhow::Result<ChatRequest> {
    let packet = serde_json::to_string_pretty(&ClinicalPacket::from_case(tc))?;

    let mut user = String::new();
    user.push_str("### Clinical packet\n");
    user.push_str(&packet);
    user.push_str("\n\n### Policy\n");
    user.push_str(&policy_text(tc));
    if !tc.expected_sections.is_empty() {
        user.push_str("\n### Required sections\n");
        for s in &tc.expected_sections {
            user.push_str("- ");
            user.push_str(s);
            user.push('\n');
        }
    }
    user.push_str("\nWrite the letter now.");

    Ok(ChatRequest {
        model: model.to_string(),
        messages: vec![ChatMessage::system(SYSTEM_INSTRUCTION), ChatMessage::user(user)],
        options,
        stream: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PatientProfile;

    #[test]
    fn test_request_has_packet_policy_and_sections() {
        let tc = TestCase {
            id: "tc".into(),
            payer_id: "bcbs".into(),
            policy_criteria: Some("1. Six weeks conservative therapy".into()),
            expected_sections: vec!["Clinical History".into()],
            profile: PatientProfile {
                patient_name: Some("John Doe".into()),
                procedure_codes: vec!["63047".into()],
                ..Default::default()
            },
            ..Default::default()
        };
        let req = build_generation_request(
            &tc,
            "m",
            SamplingOptions {
                temperature: 0.2,
                num_predict: 100,
            },
        )
        .unwrap();
        assert_eq!(req.messages[0].role, "system");
        let user = &req.messages[1].content;
        assert!(user.contains("63047"));
        assert!(user.contains("Payer: bcbs"));
        assert!(user.contains("Six weeks conservative therapy"));
        assert!(user.contains("- Clinical History"));
        assert!(!user.contains("John Doe"));
    }
}
