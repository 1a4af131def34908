use std::path::Path;

use bd_api::{resume_reader, start_reader, TreeLibrary};
use bd_core::DialogueError;
use bd_runtime::TreeReader;

use crate::{
    emit_stop, load_player_state, load_source_by_ref, save_player_state, LoadedLibrary,
    PlayerState, StopEvent, StopResult, PLAYER_STATE_SCHEMA,
};

pub(crate) fn build_library(loaded: &LoadedLibrary) -> Result<TreeLibrary, DialogueError> {
    TreeLibrary::from_json_map(&loaded.trees_json, loaded.globals_json.as_deref())
}

pub(crate) fn start_reader_for(
    library: &TreeLibrary,
    tree: Option<&str>,
    start_id: Option<i32>,
) -> Result<TreeReader, DialogueError> {
    let (reader, report) = start_reader(library, tree, start_id)?;
    if !report.is_valid() {
        tracing::warn!(
            tree = %report.tree_name,
            issues = report.issues.len(),
            "tree loaded with validation issues"
        );
    }
    Ok(reader)
}

pub(crate) fn save_reader_state(
    path: &Path,
    reader: &TreeReader,
    library_id: &str,
) -> Result<(), DialogueError> {
    let state = PlayerState {
        schema_version: PLAYER_STATE_SCHEMA.to_string(),
        library_id: library_id.to_string(),
        snapshot: reader.snapshot()?,
    };
    save_player_state(path, &state)
}

/// Rebuilds the library a state file was saved from and resumes a reader on it.
/// The reader keeps the library's trees alive, so the library may be dropped.
pub(crate) fn load_reader_from_state(
    path: &Path,
) -> Result<(LoadedLibrary, PlayerState, TreeReader), DialogueError> {
    let state = load_player_state(path)?;
    let loaded = load_source_by_ref(&state.library_id)?;
    let library = build_library(&loaded)?;
    let reader = resume_reader(&library, state.snapshot.clone())?;
    Ok((loaded, state, reader))
}

pub(crate) fn load_reader_from_state_for_library(
    path: &Path,
    loaded: &LoadedLibrary,
) -> Result<TreeReader, DialogueError> {
    let state = load_player_state(path)?;
    if state.library_id != loaded.id {
        return Err(DialogueError::new(
            "PLAY_STATE_LIBRARY_MISMATCH",
            format!(
                "State library mismatch. expected={} actual={}",
                loaded.id, state.library_id
            ),
        ));
    }
    let library = build_library(loaded)?;
    resume_reader(&library, state.snapshot)
}

/// Prints the stop and, unless the conversation is over, saves the reader to `state_out`.
pub(crate) fn emit_stop_with_saved_state(
    reader: &TreeReader,
    stop: StopResult,
    state_out: &str,
    library_id: &str,
) -> Result<i32, DialogueError> {
    if matches!(stop.event, StopEvent::Dialogue | StopEvent::Branch) {
        save_reader_state(Path::new(state_out), reader, library_id)?;
        emit_stop(stop, Some(state_out.to_string()));
        return Ok(0);
    }

    emit_stop(stop, None);
    Ok(0)
}

#[cfg(test)]
mod session_ops_tests {
    use super::*;
    use crate::cli_test_support::*;
    use crate::{describe_stop, load_source_by_trees_dir};
    use bd_core::NodeType;

    #[test]
    fn session_helpers_cover_start_save_load_and_emit_paths() {
        let trees_dir = demo_trees_dir("02-branching");
        let loaded = load_source_by_trees_dir(&trees_dir, None).expect("library should load");
        let library = build_library(&loaded).expect("library should build");

        let mut reader = start_reader_for(&library, None, None).expect("reader should start");
        reader.advance().expect("advance to branch");
        let stop = describe_stop(&mut reader, false).expect("stop should describe");
        let state_file = temp_path("session-ops-state.json");
        save_reader_state(&state_file, &reader, &loaded.id).expect("state save should pass");

        let (_loaded, state, mut resumed) =
            load_reader_from_state(&state_file).expect("state ref load should pass");
        assert_eq!(state.library_id, loaded.id);
        assert_eq!(resumed.current_node_type(), Some(NodeType::Branch));
        assert_eq!(
            resumed.advance_choice(1).expect("choice"),
            NodeType::Dialogue
        );

        let resumed_for_library = load_reader_from_state_for_library(&state_file, &loaded)
            .expect("state library load should pass");
        assert_eq!(resumed_for_library.current_node_type(), Some(NodeType::Branch));

        let emit_code = emit_stop_with_saved_state(
            &reader,
            stop,
            state_file.to_string_lossy().as_ref(),
            &loaded.id,
        )
        .expect("emit with save should pass");
        assert_eq!(emit_code, 0);
    }

    #[test]
    fn load_reader_from_state_for_library_rejects_mismatch() {
        let branching = load_source_by_trees_dir(&demo_trees_dir("02-branching"), None)
            .expect("branching load");
        let linear =
            load_source_by_trees_dir(&demo_trees_dir("01-linear"), None).expect("linear load");

        let library = build_library(&linear).expect("library");
        let reader = start_reader_for(&library, None, None).expect("reader");
        let state_file = temp_path("session-ops-mismatch-state.json");
        save_reader_state(&state_file, &reader, &linear.id).expect("state save");

        let error = load_reader_from_state_for_library(&state_file, &branching)
            .err()
            .expect("mismatch should fail");
        assert_eq!(error.code, "PLAY_STATE_LIBRARY_MISMATCH");
    }
}
