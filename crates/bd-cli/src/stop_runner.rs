use bd_core::{DialogueError, ReaderOutput};
use bd_runtime::TreeReader;

use crate::{StopEvent, StopResult};

/// Describes where the reader currently rests. The speaker is included when it
/// changed since the last stop, or always when `announce_speaker` is set.
pub(crate) fn describe_stop(
    reader: &mut TreeReader,
    announce_speaker: bool,
) -> Result<StopResult, DialogueError> {
    let changed = reader.did_speaker_change();
    let speaker = if changed || announce_speaker {
        reader.speaker_name()
    } else {
        None
    };

    let stop = match reader.current_output()? {
        ReaderOutput::Dialogue { text } => StopResult {
            event: StopEvent::Dialogue,
            speaker,
            text: Some(text),
            choices: Vec::new(),
        },
        ReaderOutput::Branch { question, answers } => StopResult {
            event: StopEvent::Branch,
            speaker,
            text: Some(question),
            choices: answers
                .into_iter()
                .map(|item| (item.index, item.text))
                .collect(),
        },
        ReaderOutput::End => StopResult {
            event: StopEvent::End,
            speaker: None,
            text: None,
            choices: Vec::new(),
        },
    };
    Ok(stop)
}

pub(crate) fn emit_stop(stop: StopResult, state_out: Option<String>) {
    println!("RESULT:OK");
    match stop.event {
        StopEvent::Dialogue => println!("EVENT:DIALOGUE"),
        StopEvent::Branch => println!("EVENT:BRANCH"),
        StopEvent::End => println!("EVENT:END"),
    }

    if let Some(speaker) = stop.speaker {
        println!(
            "SPEAKER_JSON:{}",
            serde_json::to_string(&speaker).expect("string json")
        );
    }

    if let Some(text) = stop.text {
        println!(
            "TEXT_JSON:{}",
            serde_json::to_string(&text).expect("string json")
        );
    }

    for (index, text) in stop.choices {
        println!(
            "CHOICE:{}|{}",
            index,
            serde_json::to_string(&text).expect("string json")
        );
    }

    println!(
        "STATE_OUT:{}",
        state_out.unwrap_or_else(|| "NONE".to_string())
    );
}

#[cfg(test)]
mod stop_runner_tests {
    use super::*;
    use crate::cli_test_support::*;
    use crate::session_ops::{build_library, start_reader_for};
    use crate::{load_source_by_ref, load_source_by_trees_dir};

    #[test]
    fn describe_stop_and_load_source_helpers_work_with_demos() {
        let trees_dir = demo_trees_dir("02-branching");
        let loaded = load_source_by_trees_dir(&trees_dir, None).expect("source should load");
        assert!(loaded.id.starts_with("trees-dir:"));

        let library = build_library(&loaded).expect("library should build");
        let mut reader = start_reader_for(&library, None, None).expect("reader should start");

        let stop = describe_stop(&mut reader, true).expect("stop should describe");
        assert_eq!(stop.event, StopEvent::Dialogue);
        assert_eq!(stop.speaker.as_deref(), Some("Guard"));

        reader.advance().expect("advance to branch");
        let stop = describe_stop(&mut reader, false).expect("branch stop");
        assert_eq!(stop.event, StopEvent::Branch);
        assert_eq!(stop.speaker, None);
        assert_eq!(stop.choices.len(), 2);
        assert_eq!(stop.choices[0].0, 0);

        let loaded_by_ref = load_source_by_ref(&loaded.id).expect("load by ref should pass");
        assert_eq!(loaded_by_ref.trees_json.len(), loaded.trees_json.len());
    }
}
