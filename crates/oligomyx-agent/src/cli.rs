//! Command-line interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Overrides;

#[derive(Debug, Parser)]
#[command(name = "oligomyx", version, about = "Filter and rank PDB entries for homo-oligomeric assemblies")]
pub struct Cli {
    /// Config file (TOML, YAML or JSON); defaults to $OLIGOMYX_CONFIG or ./oligomyx.toml
    #[arg(short, long, global = true, env = "OLIGOMYX_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract unique identifiers from a sequence-cluster file
    Extract {
        /// Cluster file, one cluster per line
        #[arg(long)]
        clusters: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Keep identifiers whose size lies within bounds
    Size(StageArgs),

    /// Keep homo-oligomers with enough chains
    Stoichiometry(StageArgs),

    /// Keep identifiers meeting secondary-structure bounds
    SecondaryStructure(StageArgs),

    /// Rank identifiers by a metric, writing `id<TAB>value` lines
    Rank(StageArgs),

    /// Run every stage, writing each stage's list into a directory
    Run {
        /// Start from a cluster file
        #[arg(long, conflicts_with = "input", required_unless_present = "input")]
        clusters: Option<PathBuf>,
        /// Start from an identifier list, skipping extraction
        #[arg(short, long)]
        input: Option<PathBuf>,
        #[arg(short, long, default_value = "oligomyx-out")]
        output_dir: PathBuf,
    },
}

#[derive(Debug, Clone, clap::Args)]
pub struct StageArgs {
    /// Identifier list, one per line
    #[arg(short, long)]
    pub input: PathBuf,
    #[arg(short, long)]
    pub output: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_overrides_parse_after_subcommand() {
        let cli = Cli::parse_from([
            "oligomyx", "size", "-i", "ids.txt", "-o", "out.txt", "--min-size", "60", "--max-size", "400",
        ]);
        assert_eq!(cli.overrides.min_size, Some(60));
        assert_eq!(cli.overrides.max_size, Some(400));
        assert!(matches!(cli.command, Command::Size(ref args) if args.input == PathBuf::from("ids.txt")));
    }

    #[test]
    fn test_run_requires_a_starting_list() {
        assert!(Cli::try_parse_from(["oligomyx", "run"]).is_err());
        assert!(Cli::try_parse_from(["oligomyx", "run", "--clusters", "a", "--input", "b"]).is_err());
        let cli = Cli::try_parse_from(["oligomyx", "run", "--clusters", "bc-90.out", "--size-metric", "residues"])
            .unwrap();
        assert_eq!(cli.overrides.size_metric, Some(oligomyx_common::entities::SizeMetric::Residues));
    }

    #[test]
    fn test_direction_flag_takes_either_order() {
        use oligomyx_common::pipeline_config::RankDirection;

        let cli = Cli::parse_from(["oligomyx", "rank", "-i", "a", "-o", "b", "--direction", "descending"]);
        assert_eq!(cli.overrides.direction, Some(RankDirection::Descending));
        let cli = Cli::parse_from(["oligomyx", "rank", "-i", "a", "-o", "b", "--direction", "ascending"]);
        assert_eq!(cli.overrides.direction, Some(RankDirection::Ascending));
        assert!(Cli::try_parse_from(["oligomyx", "rank", "-i", "a", "-o", "b", "--direction", "up"]).is_err());
    }
}
