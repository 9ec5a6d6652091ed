//! Oligomyx: PDB filtering and ranking pipeline.
//! Entry point for the command-line binary.

use anyhow::Result;
use clap::Parser;
use oligomyx_common::report::StageReport;
use oligomyx_common::PdbId;
use oligomyx_filters::parse_id_list;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use oligomyx_agent::cli::{Cli, Command, StageArgs};
use oligomyx_agent::{config, output, run_pipeline, RunContext};

fn read_ids(path: &Path) -> Result<Vec<PdbId>> {
    let ids = parse_id_list(&output::read_text(path)?);
    if ids.is_empty() {
        warn!("No identifiers in {}", path.display());
    }
    Ok(ids)
}

fn finish_stage(ctx: &RunContext, out: &Path, report: &StageReport) -> Result<()> {
    output::write_id_list(out, &report.kept)?;
    if ctx.config.execution.write_reports {
        output::write_report(out, report)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("oligomyx=info,warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref(), &cli.overrides)?;
    let ctx = RunContext::new(config)?;
    info!(run_id = %ctx.run_id(), "Oligomyx v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Extract { clusters, output: out } => {
            let ids = ctx.extract(&output::read_text(&clusters)?);
            output::write_id_list(&out, &ids)?;
        }
        Command::Size(StageArgs { input, output: out }) => {
            let report = ctx.size(&read_ids(&input)?).await;
            finish_stage(&ctx, &out, &report)?;
        }
        Command::Stoichiometry(StageArgs { input, output: out }) => {
            let report = ctx.stoichiometry(&read_ids(&input)?).await;
            finish_stage(&ctx, &out, &report)?;
        }
        Command::SecondaryStructure(StageArgs { input, output: out }) => {
            let report = ctx.secondary_structure(&read_ids(&input)?).await;
            finish_stage(&ctx, &out, &report)?;
        }
        Command::Rank(StageArgs { input, output: out }) => {
            let ranking = ctx.rank(&read_ids(&input)?).await;
            output::write_ranking(&out, &ranking.entries)?;
            if ctx.config.execution.write_reports {
                output::write_report(&out, &ranking)?;
            }
        }
        Command::Run { clusters, input, output_dir } => {
            let ids = match (clusters, input) {
                (Some(clusters), _) => {
                    let ids = ctx.extract(&output::read_text(&clusters)?);
                    output::write_id_list(&output_dir.join("ids.txt"), &ids)?;
                    ids
                }
                (None, Some(input)) => read_ids(&input)?,
                (None, None) => anyhow::bail!("run needs --clusters or --input"),
            };

            let outcome = run_pipeline(&ctx, &ids).await;
            for report in &outcome.stages {
                finish_stage(&ctx, &output_dir.join(format!("{}.txt", report.stage)), report)?;
            }
            output::write_ranking(&output_dir.join("ranked.tsv"), &outcome.ranking.entries)?;
            if ctx.config.execution.write_reports {
                let path = output::write_report(&output_dir.join("run"), &outcome)?;
                info!("Run report written to {}", path.display());
            }
        }
    }

    Ok(())
}
