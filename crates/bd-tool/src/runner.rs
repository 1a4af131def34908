use std::path::Path;

use bd_api::{start_reader, TreeLibrary};
use bd_core::ReaderOutput;

use crate::source::{read_globals_from_dir, read_test_case, read_trees_from_dir};
use crate::{BdToolError, ExpectedEvent, TestCase};

const MAX_STEPS: usize = 1_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub observed_events: Vec<ExpectedEvent>,
    pub consumed_choices: usize,
    pub steps: usize,
}

/// Plays `case` against the trees in `demo_dir`, answering branches from
/// `case.choices` in order and recording every stop.
pub fn run_case(demo_dir: &Path, case: &TestCase) -> Result<RunReport, BdToolError> {
    let trees_json = read_trees_from_dir(demo_dir)?;
    let globals_json = read_globals_from_dir(demo_dir)?;
    let library = TreeLibrary::from_json_map(&trees_json, globals_json.as_deref())?;
    let (mut reader, _) = start_reader(&library, case.tree.as_deref(), case.start_id)?;

    let mut observed_events = Vec::new();
    let mut choice_index = 0usize;

    for step in 1..=MAX_STEPS {
        let changed = reader.did_speaker_change();
        let speaker = if changed || step == 1 {
            reader.speaker_name()
        } else {
            None
        };

        match reader.current_output()? {
            ReaderOutput::Dialogue { text } => {
                observed_events.push(ExpectedEvent::Dialogue { speaker, text });
                reader.advance()?;
            }
            ReaderOutput::Branch { question, answers } => {
                observed_events.push(ExpectedEvent::Branch {
                    speaker,
                    question,
                    answers: answers.into_iter().map(|item| item.text).collect(),
                });
                let event_index = observed_events.len() - 1;
                let choice = case
                    .choices
                    .get(choice_index)
                    .ok_or(BdToolError::MissingChoice { event_index })?;
                reader.advance_choice(*choice)?;
                choice_index += 1;
            }
            ReaderOutput::End => {
                observed_events.push(ExpectedEvent::End);
                if choice_index != case.choices.len() {
                    return Err(BdToolError::UnusedChoices {
                        used: choice_index,
                        total: case.choices.len(),
                    });
                }
                return Ok(RunReport {
                    observed_events,
                    consumed_choices: choice_index,
                    steps: step,
                });
            }
        }
    }

    Err(BdToolError::GuardExceeded {
        max_steps: MAX_STEPS,
    })
}

pub fn assert_case(demo_dir: &Path, case_path: &Path) -> Result<(), BdToolError> {
    let case = read_test_case(case_path)?;
    let report = run_case(demo_dir, &case)?;

    if report.observed_events.len() != case.expected_events.len() {
        let observed = serde_json::to_string_pretty(&report.observed_events)
            .map_err(BdToolError::EventSerialize)?;
        return Err(BdToolError::EventCountMismatch {
            expected: case.expected_events.len(),
            actual: report.observed_events.len(),
            observed,
        });
    }

    for (index, (expected, actual)) in case
        .expected_events
        .iter()
        .zip(report.observed_events.iter())
        .enumerate()
    {
        if expected != actual {
            let expected = serde_json::to_string(expected).map_err(BdToolError::EventSerialize)?;
            let actual = serde_json::to_string(actual).map_err(BdToolError::EventSerialize)?;
            return Err(BdToolError::EventMismatch {
                index,
                expected,
                actual,
            });
        }
    }

    Ok(())
}
