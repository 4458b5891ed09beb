use anyhow::Result;
use clap::{ArgAction, Args, Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "repgen")]
#[command(about = "Daily commit activity report for one author of a GitLab project")]
#[command(version)]
pub struct Cli {
    #[arg(short, long, value_name = "FILE", help = "YAML configuration file path")]
    pub config: PathBuf,

    #[arg(short, long, value_enum, default_value_t = Mode::Normal, help = "Operation mode")]
    pub mode: Mode,

    #[arg(short, long, value_name = "FILE", help = "Cached commits JSON to replay in read mode")]
    pub input: Option<PathBuf>,

    #[clap(flatten)]
    pub output: OutputArgs,

    #[arg(long, help = "Do not show the fetch progress spinner")]
    pub no_progress: bool,

    #[arg(short, long, action = ArgAction::Count, help = "More log output (repeatable)")]
    pub verbose: u8,

    #[arg(short, long, conflicts_with = "verbose", help = "Only log warnings and errors")]
    pub quiet: bool,
}

#[derive(Args, Clone)]
pub struct OutputArgs {
    #[arg(long, help = "Output as JSON", conflicts_with = "ndjson")]
    pub json: bool,

    #[arg(long, help = "Output as NDJSON")]
    pub ndjson: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Fetch commits from the API and refresh the cache file
    Normal,
    /// Replay a previously cached commit list
    Read,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn verbosity(&self) -> i8 {
        if self.quiet {
            -1
        } else {
            self.verbose.min(i8::MAX as u8) as i8
        }
    }

    pub fn execute(self) -> Result<()> {
        crate::logging::init(self.verbosity());
        crate::series::exec(&self)
    }
}
