use std::path::Path;

use bd_core::DialogueError;
use bd_runtime::TreeReader;

use crate::session_ops::load_reader_from_state;
use crate::{
    build_library, describe_stop, emit_stop_with_saved_state, load_source_by_trees_dir,
    start_reader_for, AgentArgs, AgentCommand, ChooseArgs, NextArgs, StartArgs,
};

pub(super) fn run_agent(args: AgentArgs) -> Result<i32, DialogueError> {
    match args.command {
        AgentCommand::Start(args) => run_start(args),
        AgentCommand::Next(args) => run_next(args),
        AgentCommand::Choose(args) => run_choose(args),
    }
}

pub(super) fn run_start(args: StartArgs) -> Result<i32, DialogueError> {
    let loaded = load_source_by_trees_dir(&args.trees_dir, args.globals.as_deref())?;
    let library = build_library(&loaded)?;
    let mut reader = start_reader_for(&library, args.tree.as_deref(), args.start_id)?;

    let stop = describe_stop(&mut reader, true)?;
    emit_stop_with_saved_state(&reader, stop, &args.state_out, &loaded.id)
}

pub(super) fn run_next(args: NextArgs) -> Result<i32, DialogueError> {
    run_state_transition(&args.state_in, &args.state_out, |reader| {
        reader.advance().map(|_| ())
    })
}

pub(super) fn run_choose(args: ChooseArgs) -> Result<i32, DialogueError> {
    run_state_transition(&args.state_in, &args.state_out, |reader| {
        reader.advance_choice(args.choice).map(|_| ())
    })
}

fn run_state_transition(
    state_in: &str,
    state_out: &str,
    transition: impl FnOnce(&mut TreeReader) -> Result<(), DialogueError>,
) -> Result<i32, DialogueError> {
    let (_, state, mut reader) = load_reader_from_state(Path::new(state_in))?;
    transition(&mut reader)?;
    let stop = describe_stop(&mut reader, false)?;
    emit_stop_with_saved_state(&reader, stop, state_out, &state.library_id)
}
