use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "topicsim",
    version,
    about = "Synthetic LDA corpus simulation and topic-recovery scoring"
)]
pub struct Cli {
    /// TOML config file. Defaults to ./topicsim.toml when present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// SQLite database path, overrides the config file.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a corpus, fit a topic model and score recovery.
    Run {
        #[command(flatten)]
        overrides: RunOverrides,
    },
    /// Create the database schema.
    Init,
    /// List recorded runs.
    Runs,
    /// Show one run and its per-document scores.
    Show {
        run_id: i64,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Print the resolved configuration as TOML.
    Config {
        #[command(flatten)]
        overrides: RunOverrides,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunOverrides {
    #[arg(long)]
    pub topics: Option<usize>,
    #[arg(long)]
    pub vocab_size: Option<usize>,
    #[arg(long)]
    pub docs: Option<usize>,
    #[arg(long)]
    pub alpha: Option<f64>,
    #[arg(long)]
    pub doc_length: Option<usize>,
    #[arg(long)]
    pub high_share: Option<f64>,
    /// Seed for corpus generation; unseeded when omitted.
    #[arg(long)]
    pub seed: Option<u64>,
    #[arg(long)]
    pub iterations: Option<usize>,
    #[arg(long)]
    pub inference_seed: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_run_overrides() {
        let cli = Cli::try_parse_from([
            "topicsim",
            "--db",
            "x.db",
            "run",
            "--topics",
            "3",
            "--vocab-size",
            "90",
            "--alpha",
            "0.1",
            "--seed",
            "7",
        ])
        .unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("x.db")));
        match cli.command {
            Command::Run { overrides } => {
                assert_eq!(overrides.topics, Some(3));
                assert_eq!(overrides.vocab_size, Some(90));
                assert_eq!(overrides.alpha, Some(0.1));
                assert_eq!(overrides.seed, Some(7));
                assert_eq!(overrides.docs, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
