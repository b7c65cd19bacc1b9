use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;

use gamess_interaction::{
    apply_boltzmann_weightings, calculate_interaction_energies, extract_directory, table, GamessLog, GroupBy,
    PipelineConfig, Software,
};

#[derive(Parser)]
#[command(author, version, about = "GAMESS interaction energy toolkit")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawls a directory of GAMESS logs into an energy table.
    Extract {
        #[arg(short, long)]
        root: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// Trailing share of each log searched for final energies.
        #[arg(long, default_value_t = 0.2)]
        tail_fraction: f64,

        /// Write equilibrium / rerun XYZ files next to optimisation logs.
        #[arg(long)]
        write_geometries: bool,

        /// Also write a HOMO/LUMO gap table.
        #[arg(long)]
        gaps: Option<PathBuf>,
    },

    /// Decomposes an energy table into per-configuration interaction energies.
    Interaction {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// Subtract ionic reference calculations (paths containing "ionic").
        #[arg(long)]
        with_ionic: bool,

        /// Program that produced the energies: gamess or psi4.
        #[arg(long, default_value = "gamess")]
        software: Software,

        /// Print an aligned table instead of raw rows.
        #[arg(long)]
        pretty: bool,
    },

    /// Boltzmann-weights an interaction table over groups of configurations.
    Boltzmann {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// config, all, prefix:<separator> or regex:<pattern>.
        #[arg(long, default_value = "config")]
        group_by: String,
    },

    /// Prints the frontier orbital gap of a single log.
    Gap {
        #[arg(short, long)]
        log: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    let start_time = Instant::now();

    match cli.command {
        Commands::Extract { root, output, tail_fraction, write_geometries, gaps } => {
            println!("--- GAMESS Log Extraction ---");

            if !(tail_fraction > 0.0 && tail_fraction <= 1.0) {
                anyhow::bail!("--tail-fraction must be in (0, 1], got {}", tail_fraction);
            }

            let config = PipelineConfig {
                tail_fraction,
                write_geometries,
                collect_gaps: gaps.is_some(),
                ..PipelineConfig::default()
            };

            println!("Crawling {:?}...", root);
            let report = extract_directory(&root, &config)?;
            println!("-> Extracted {} records.", report.records.len());
            if !report.failures.is_empty() {
                println!("-> {} problem(s) reported:", report.failures.len());
                for failure in &report.failures {
                    println!("   {}", failure);
                }
            }
            for (path, diagnosis) in &report.diagnoses {
                println!("-> {:?}: {}", path, diagnosis.message());
            }
            for rerun in report.resubmissions() {
                println!("-> Resubmit from {:?}", rerun.destination);
            }

            println!("Writing records to {:?}...", output);
            table::write_records_to_path(&output, &report.records)
                .with_context(|| format!("Could not write {:?}", output))?;

            if let Some(gap_path) = gaps {
                println!("Writing {} gaps to {:?}...", report.gaps.len(), gap_path);
                table::write_gaps_to_path(&gap_path, &report.gaps)
                    .with_context(|| format!("Could not write {:?}", gap_path))?;
            }
        }

        Commands::Interaction { input, output, with_ionic, software, pretty } => {
            println!("--- Interaction Energies ---");

            let config = PipelineConfig {
                ionic_present: with_ionic,
                software,
                pretty_print: pretty,
                ..PipelineConfig::default()
            };

            let aggregation = calculate_interaction_energies(&input, &config)?;
            for warning in &aggregation.warnings {
                println!("-> Warning: {}", warning);
            }

            if config.pretty_print {
                let (headers, cells) = table::aggregate_cells(&aggregation.rows);
                println!("{}", table::render_pretty(&headers, &cells, 10));
            } else {
                for row in &aggregation.rows {
                    println!("{:?}", row);
                }
            }

            println!("Writing output to {:?}...", output);
            table::write_aggregates_to_path(&output, &aggregation.rows)
                .with_context(|| format!("Could not write {:?}", output))?;
        }

        Commands::Boltzmann { input, output, group_by } => {
            println!("--- Boltzmann Weighting ---");

            let group_by: GroupBy = group_by.parse().map_err(anyhow::Error::msg)?;
            let results = apply_boltzmann_weightings(&input, &group_by)?;
            println!("-> {} group(s).", results.len());

            println!("Writing output to {:?}...", output);
            table::write_ensembles_to_path(&output, &results)
                .with_context(|| format!("Could not write {:?}", output))?;
        }

        Commands::Gap { log } => {
            let root = log.parent().map(PathBuf::from).unwrap_or_default();
            let gamess_log = GamessLog::open(&root, &log)?;
            let report = gamess_log.gap()?;
            println!(
                "{} ({}): {:.6} Eh -> {:.6} Eh, gap {:.4} eV",
                report.file,
                report.transition.label(),
                report.homo,
                report.lumo,
                report.gap_ev
            );
        }
    }

    println!("Done in {:.2?}", start_time.elapsed());
    Ok(())
}
