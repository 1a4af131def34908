use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "bd-cli")]
#[command(about = "Branching dialogue tree player")]
pub(crate) struct Cli {
    /// Log reader decisions to stderr.
    #[arg(long = "verbose", global = true)]
    pub(crate) verbose: bool,
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    Agent(AgentArgs),
    Play(PlayArgs),
}

#[derive(Debug, Args)]
pub(crate) struct AgentArgs {
    #[command(subcommand)]
    pub(crate) command: AgentCommand,
}

#[derive(Debug, Subcommand)]
pub(crate) enum AgentCommand {
    Start(StartArgs),
    Next(NextArgs),
    Choose(ChooseArgs),
}

#[derive(Debug, Args)]
pub(crate) struct StartArgs {
    #[arg(long = "trees-dir")]
    pub(crate) trees_dir: String,
    #[arg(long = "tree")]
    pub(crate) tree: Option<String>,
    #[arg(long = "start-id")]
    pub(crate) start_id: Option<i32>,
    #[arg(long = "globals")]
    pub(crate) globals: Option<String>,
    #[arg(long = "state-out")]
    pub(crate) state_out: String,
}

#[derive(Debug, Args)]
pub(crate) struct NextArgs {
    #[arg(long = "state-in")]
    pub(crate) state_in: String,
    #[arg(long = "state-out")]
    pub(crate) state_out: String,
}

#[derive(Debug, Args)]
pub(crate) struct ChooseArgs {
    #[arg(long = "state-in")]
    pub(crate) state_in: String,
    #[arg(long = "choice")]
    pub(crate) choice: usize,
    #[arg(long = "state-out")]
    pub(crate) state_out: String,
}

#[derive(Debug, Args)]
pub(crate) struct PlayArgs {
    #[arg(long = "trees-dir")]
    pub(crate) trees_dir: String,
    #[arg(long = "tree")]
    pub(crate) tree: Option<String>,
    #[arg(long = "start-id")]
    pub(crate) start_id: Option<i32>,
    #[arg(long = "globals")]
    pub(crate) globals: Option<String>,
    #[arg(long = "state-file")]
    pub(crate) state_file: Option<String>,
}
