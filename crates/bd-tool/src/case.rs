use serde::{Deserialize, Serialize};

pub const TESTCASE_SCHEMA_V1: &str = "bd-tool-case.v1";

/// A scripted walk through a demo directory: which tree to load, which branch
/// answers to pick in order, and every stop the reader should make.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub schema_version: String,
    #[serde(default)]
    pub tree: Option<String>,
    #[serde(default)]
    pub start_id: Option<i32>,
    #[serde(default)]
    pub choices: Vec<usize>,
    #[serde(default)]
    pub expected_events: Vec<ExpectedEvent>,
}

/// `speaker` is only present on the first stop and on stops where the speaker changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ExpectedEvent {
    Dialogue {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        speaker: Option<String>,
        text: String,
    },
    Branch {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        speaker: Option<String>,
        question: String,
        answers: Vec<String>,
    },
    End,
}

#[cfg(test)]
mod case_tests {
    use super::*;

    #[test]
    fn testcase_deserialize_applies_defaults() {
        let parsed: TestCase = serde_json::from_str(
            r#"{
  "schemaVersion": "bd-tool-case.v1",
  "expectedEvents": []
}"#,
        )
        .expect("testcase should deserialize");

        assert_eq!(parsed.schema_version, TESTCASE_SCHEMA_V1);
        assert_eq!(parsed.tree, None);
        assert_eq!(parsed.start_id, None);
        assert!(parsed.choices.is_empty());
        assert!(parsed.expected_events.is_empty());
    }

    #[test]
    fn expected_event_deserialize_supports_all_variants() {
        let parsed: Vec<ExpectedEvent> = serde_json::from_str(
            r#"[
  {"kind":"dialogue","speaker":"Guard","text":"a"},
  {"kind":"dialogue","text":"b"},
  {"kind":"branch","question":"pick","answers":["A","B"]},
  {"kind":"end"}
]"#,
        )
        .expect("events should deserialize");

        assert_eq!(parsed.len(), 4);
        assert!(matches!(
            &parsed[0],
            ExpectedEvent::Dialogue { speaker: Some(name), .. } if name == "Guard"
        ));
        assert!(matches!(parsed[1], ExpectedEvent::Dialogue { speaker: None, .. }));
        assert!(matches!(parsed[2], ExpectedEvent::Branch { .. }));
        assert!(matches!(parsed[3], ExpectedEvent::End));
    }

    #[test]
    fn absent_speaker_is_not_serialized() {
        let json = serde_json::to_string(&ExpectedEvent::Dialogue {
            speaker: None,
            text: "hi".to_string(),
        })
        .expect("event should serialize");
        assert_eq!(json, r#"{"kind":"dialogue","text":"hi"}"#);
    }
}
