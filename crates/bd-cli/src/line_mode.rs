use std::io::{self, BufRead, Write};
use std::path::Path;

use bd_core::{DialogueError, Variable};
use bd_runtime::TreeReader;

use crate::{
    build_library, describe_stop, load_reader_from_state_for_library, map_play_io,
    save_reader_state, start_reader_for, LineCommandAction, LineCommandContext, StopEvent,
    StopResult,
};

const HELP_LINE: &str = "commands: :help :save :load :restart :vars :quit";

pub(crate) fn run_play_line_mode(
    context: &LineCommandContext<'_>,
    reader: &mut TreeReader,
) -> Result<i32, DialogueError> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    run_play_line_mode_with_io(context, reader, &mut input, &mut output)
}

pub(crate) fn run_play_line_mode_with_io(
    context: &LineCommandContext<'_>,
    reader: &mut TreeReader,
    input: &mut dyn BufRead,
    output: &mut dyn Write,
) -> Result<i32, DialogueError> {
    write_line(output, &context.library.title)?;
    write_line(output, HELP_LINE)?;

    let mut announce_speaker = true;
    loop {
        let stop = describe_stop(reader, announce_speaker)?;
        announce_speaker = false;
        let event = stop.event;
        write_stop(&stop, output)?;
        if event == StopEvent::End {
            write_line(output, "[END]")?;
            return Ok(0);
        }

        loop {
            let Some(raw) = prompt_input_from("> ", input, output)? else {
                return Ok(0);
            };
            let mut lines = Vec::new();
            let action = handle_line_cmd(raw.as_str(), context, reader, &mut |line: String| {
                lines.push(line)
            })?;
            for line in lines {
                write_line(output, &line)?;
            }
            match action {
                LineCommandAction::Continue => continue,
                LineCommandAction::RefreshStop => {
                    announce_speaker = true;
                    break;
                }
                LineCommandAction::Quit => return Ok(0),
                LineCommandAction::NotHandled => {}
            }

            if event == StopEvent::Dialogue {
                if raw.trim().is_empty() {
                    reader.advance()?;
                    break;
                }
                write_line(output, "press enter to continue, or :help")?;
                continue;
            }

            let Ok(choice) = raw.trim().parse::<usize>() else {
                write_line(output, &format!("invalid choice: {}", raw))?;
                continue;
            };
            match reader.advance_choice(choice) {
                Ok(_) => break,
                Err(error) if error.is("READER_CHOICE_NOT_FOUND") => {
                    write_line(output, &format!("no such choice: {}", choice))?;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

/// Runs a `:command` typed at the prompt. Anything else is `NotHandled`.
pub(crate) fn handle_play_command(
    raw: &str,
    state_file: &str,
    context: &LineCommandContext<'_>,
    reader: &mut TreeReader,
    emit: &mut dyn FnMut(String),
) -> Result<LineCommandAction, DialogueError> {
    match raw.trim() {
        ":help" => {
            emit(HELP_LINE.to_string());
            Ok(LineCommandAction::Continue)
        }
        ":save" => {
            save_reader_state(Path::new(state_file), reader, &context.library.id)?;
            emit(format!("saved: {}", state_file));
            Ok(LineCommandAction::Continue)
        }
        ":load" => {
            *reader = load_reader_from_state_for_library(Path::new(state_file), context.library)?;
            emit(format!("loaded: {}", state_file));
            Ok(LineCommandAction::RefreshStop)
        }
        ":restart" => {
            let library = build_library(context.library)?;
            *reader = start_reader_for(&library, context.tree, context.start_id)?;
            emit("restarted".to_string());
            Ok(LineCommandAction::RefreshStop)
        }
        ":vars" => {
            if let Some(tree) = reader.tree() {
                for variable in tree.borrow().locals.iter() {
                    emit(format!("local  {}", describe_variable(variable)));
                }
            }
            for variable in reader.globals().borrow().iter() {
                emit(format!("global {}", describe_variable(variable)));
            }
            Ok(LineCommandAction::Continue)
        }
        ":quit" => {
            emit("bye".to_string());
            Ok(LineCommandAction::Quit)
        }
        _ => Ok(LineCommandAction::NotHandled),
    }
}

pub(crate) fn handle_line_cmd(
    raw: &str,
    context: &LineCommandContext<'_>,
    reader: &mut TreeReader,
    emit: &mut dyn FnMut(String),
) -> Result<LineCommandAction, DialogueError> {
    handle_play_command(raw, context.state_file, context, reader, emit)
}

fn describe_variable(variable: &Variable) -> String {
    format!(
        "{}: bool={} int={} float={} string={:?}",
        variable.name, variable.bool_val, variable.int_val, variable.float_val, variable.string_val
    )
}

fn write_stop(stop: &StopResult, output: &mut dyn Write) -> Result<(), DialogueError> {
    if stop.event == StopEvent::End {
        return Ok(());
    }
    write_line(output, "")?;
    if let Some(speaker) = &stop.speaker {
        write_line(output, &format!("[{}]", speaker))?;
    }
    if let Some(text) = &stop.text {
        write_line(output, text)?;
    }
    for (index, text) in &stop.choices {
        write_line(output, &format!("  [{}] {}", index, text))?;
    }
    Ok(())
}

fn write_line(output: &mut dyn Write, line: &str) -> Result<(), DialogueError> {
    writeln!(output, "{}", line).map_err(map_play_io)
}

/// Reads one line after printing `prefix`; `None` at end of input.
pub(crate) fn prompt_input_from(
    prefix: &str,
    input: &mut dyn BufRead,
    output: &mut dyn Write,
) -> Result<Option<String>, DialogueError> {
    write!(output, "{}", prefix).map_err(map_play_io)?;
    output.flush().map_err(map_play_io)?;
    let mut line = String::new();
    let read = input.read_line(&mut line).map_err(map_play_io)?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(&['\r', '\n'][..]).to_string()))
}
