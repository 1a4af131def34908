mod case;
mod runner;
mod source;

pub use case::{ExpectedEvent, TestCase, TESTCASE_SCHEMA_V1};
pub use runner::{assert_case, run_case, RunReport};
pub use source::{read_globals_from_dir, read_test_case, read_trees_from_dir};

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BdToolError {
    #[error("Failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse testcase {path}: {source}")]
    ParseCase {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Invalid testcase schema version \"{found}\", expected \"{expected}\".")]
    InvalidSchemaVersion { expected: String, found: String },
    #[error("No .tree.json files under {path}.")]
    SourceEmpty { path: PathBuf },
    #[error("Reader error: {0}")]
    Dialogue(#[from] bd_core::DialogueError),
    #[error("Choice missing at event index {event_index}.")]
    MissingChoice { event_index: usize },
    #[error("Unused choices: used {used} of {total}.")]
    UnusedChoices { used: usize, total: usize },
    #[error("Guard exceeded: max_steps={max_steps}.")]
    GuardExceeded { max_steps: usize },
    #[error("Expected event count {expected}, actual {actual}. observed={observed}")]
    EventCountMismatch {
        expected: usize,
        actual: usize,
        observed: String,
    },
    #[error("Event mismatch at index {index}. expected={expected} actual={actual}")]
    EventMismatch {
        index: usize,
        expected: String,
        actual: String,
    },
    #[error("Failed to serialize event for diff: {0}")]
    EventSerialize(serde_json::Error),
}
