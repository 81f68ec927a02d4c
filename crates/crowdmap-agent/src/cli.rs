//! CLI argument definitions.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "crowdmap",
    version,
    about = "Competitive-landscape crowding analysis for drug targets",
    long_about = "Normalise extracted asset records for each molecular target, deduplicate them \
                  into canonical assets, score how crowded the field is and flag white space.\n\n\
                  Writes <target>_normalized_assets.json and <target>_competitive_analysis.json."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to crowdmap.toml (default: $CROWDMAP_CONFIG, then ./crowdmap.toml).
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Analyse one or more targets.
    Run(RunArgs),

    /// Print the active modality and mechanism vocabularies.
    Lexicon,
}

#[derive(Parser)]
pub struct RunArgs {
    /// Target names, or .txt/.csv/.json files listing targets.
    #[arg(value_name = "TARGET", required = true)]
    pub targets: Vec<String>,

    /// Directory with one <target>.json mention file per target.
    #[arg(long = "mentions-dir", value_name = "DIR", env = "CROWDMAP_MENTIONS_DIR")]
    pub mentions_dir: Option<PathBuf>,

    /// Where report files are written.
    #[arg(long = "output-dir", value_name = "DIR", env = "CROWDMAP_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Targets analysed concurrently.
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Analyse and log without writing output files.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

impl Cli {
    /// Default `EnvFilter` directives for the chosen verbosity.
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "warn";
        }
        match self.verbose {
            0 => "crowdmap=info,warn",
            1 => "crowdmap=debug,info",
            _ => "crowdmap=trace,debug",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_args() {
        let cli = Cli::try_parse_from([
            "crowdmap", "run", "CD47", "targets.csv", "--workers", "2", "--dry-run", "-v",
        ])
        .unwrap();
        assert_eq!(cli.log_filter(), "crowdmap=debug,info");
        let Command::Run(args) = cli.command else { panic!("expected run") };
        assert_eq!(args.targets, vec!["CD47", "targets.csv"]);
        assert_eq!(args.workers, Some(2));
        assert!(args.dry_run);
    }

    #[test]
    fn test_run_requires_a_target() {
        assert!(Cli::try_parse_from(["crowdmap", "run"]).is_err());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["crowdmap", "-q", "-v", "lexicon"]).is_err());
        let cli = Cli::try_parse_from(["crowdmap", "lexicon", "-q"]).unwrap();
        assert_eq!(cli.log_filter(), "warn");
    }
}
