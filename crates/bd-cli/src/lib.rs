use std::ffi::OsString;

use bd_core::DialogueError;
use clap::Parser;

mod agent;
mod cli_args;
mod error_map;
mod line_mode;
mod models;
mod session_ops;
mod source_loader;
mod state_store;
mod stop_runner;

pub(crate) use cli_args::{
    AgentArgs, AgentCommand, ChooseArgs, Cli, Mode, NextArgs, PlayArgs, StartArgs,
};
pub(crate) use error_map::{
    emit_error, map_cli_source_path, map_cli_source_read, map_cli_source_scan,
    map_cli_state_invalid, map_cli_state_read, map_cli_state_write, map_play_io,
};
pub(crate) use line_mode::run_play_line_mode;
pub(crate) use models::{
    LineCommandAction, LineCommandContext, LoadedLibrary, PlayerState, StopEvent, StopResult,
    PLAYER_STATE_SCHEMA, TREES_DIR_PREFIX,
};
pub(crate) use session_ops::{
    build_library, emit_stop_with_saved_state, load_reader_from_state_for_library,
    save_reader_state, start_reader_for,
};
pub(crate) use source_loader::{load_source_by_ref, load_source_by_trees_dir};
pub(crate) use state_store::{load_player_state, save_player_state};
pub(crate) use stop_runner::{describe_stop, emit_stop};

const DEFAULT_STATE_FILE: &str = ".bd-cli/save.json";

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    init_logging(cli.verbose);
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

/// Logs go to stderr so they never interleave with the line protocol on stdout.
fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .try_init();
}

fn run(cli: Cli) -> Result<i32, DialogueError> {
    match cli.command {
        Mode::Agent(args) => agent::run_agent(args),
        Mode::Play(args) => run_play(args),
    }
}

fn run_play(args: PlayArgs) -> Result<i32, DialogueError> {
    let state_file = args
        .state_file
        .unwrap_or_else(|| DEFAULT_STATE_FILE.to_string());
    let loaded = load_source_by_trees_dir(&args.trees_dir, args.globals.as_deref())?;
    let library = build_library(&loaded)?;
    let mut reader = start_reader_for(&library, args.tree.as_deref(), args.start_id)?;

    let context = LineCommandContext {
        state_file: &state_file,
        library: &loaded,
        tree: args.tree.as_deref(),
        start_id: args.start_id,
    };
    run_play_line_mode(&context, &mut reader)
}

#[cfg(test)]
mod cli_test_support;
