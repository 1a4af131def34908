use std::collections::BTreeMap;

use bd_core::ReaderSnapshot;
use serde::{Deserialize, Serialize};

pub(crate) const PLAYER_STATE_SCHEMA: &str = "player-state.v1";
pub(crate) const TREES_DIR_PREFIX: &str = "trees-dir:";

/// Tree sources read from disk, keyed by path relative to the trees dir.
#[derive(Debug, Clone)]
pub(crate) struct LoadedLibrary {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) trees_json: BTreeMap<String, String>,
    pub(crate) globals_json: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PlayerState {
    pub(crate) schema_version: String,
    pub(crate) library_id: String,
    pub(crate) snapshot: ReaderSnapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StopEvent {
    Dialogue,
    Branch,
    End,
}

#[derive(Debug, Clone)]
pub(crate) struct StopResult {
    pub(crate) event: StopEvent,
    /// Present when the speaker should be (re)announced.
    pub(crate) speaker: Option<String>,
    pub(crate) text: Option<String>,
    pub(crate) choices: Vec<(usize, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineCommandAction {
    NotHandled,
    Continue,
    RefreshStop,
    Quit,
}

pub(crate) struct LineCommandContext<'a> {
    pub(crate) state_file: &'a str,
    pub(crate) library: &'a LoadedLibrary,
    pub(crate) tree: Option<&'a str>,
    pub(crate) start_id: Option<i32>,
}
