use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "triage",
    version,
    about = "Deterministic scoring of incident-response agent traces"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Score one or more traces of a scenario
    Score(ScoreArgs),
    /// Report run health (validity) for traces without scoring them
    Health(HealthArgs),
    /// List the built-in scorers
    Scorers,
}

#[derive(Parser, Clone)]
pub struct ScoreArgs {
    /// Scenario file (YAML, or JSON with a .json extension)
    #[arg(long)]
    pub scenario: PathBuf,

    /// Trace file(s); repeat to score several runs of the same scenario
    #[arg(long = "trace", required = true, num_args = 1..)]
    pub traces: Vec<PathBuf>,

    /// Optional scoring config (tool catalog, extra cues)
    #[arg(long, env = "TRIAGE_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Run only the named scorer(s)
    #[arg(long = "only")]
    pub only: Vec<String>,

    /// Exit 1 when any applicable score is below this value
    #[arg(long)]
    pub min_score: Option<f64>,
}

#[derive(Parser, Clone)]
pub struct HealthArgs {
    #[arg(long = "trace", required = true, num_args = 1..)]
    pub traces: Vec<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Text,
}
