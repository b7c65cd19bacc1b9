// ============================================================================
// MODULE DECLARATIONS
// ============================================================================
pub mod core;
pub mod io;
pub mod math;
pub mod analysis;
pub mod extraction;

// ============================================================================
// RE-EXPORTS (Public API)
// ============================================================================
pub use crate::core::error::{ExtractionError, TableError};
pub use crate::core::record::{Energies, EnergyModel, LogRecord, RunType, Software, StructuralRole};
pub use crate::io::{table, xyz};

pub use crate::extraction::{ExtractionOptions, GamessLog};
pub use crate::extraction::basis::BasisResolver;
pub use crate::extraction::classifier::RunClassifier;
pub use crate::extraction::energy::EnergyExtractor;
pub use crate::extraction::geometry::{GeometryBlock, GeometryOutput, GeometryTracker};
pub use crate::extraction::orbitals::{GapReport, OrbitalAnalyzer};
pub use crate::extraction::status::Diagnosis;
pub use crate::analysis::interaction::{Aggregation, ConfigAggregate, EnergyRow, InteractionEnergyAggregator};
pub use crate::analysis::boltzmann::{BoltzmannWeighter, GroupBy, WeightedEnsembleResult};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

// ============================================================================
// HIGH-LEVEL INTERFACE
// ============================================================================

/// Configuration for the extraction and aggregation pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Dataset carries ionic reference calculations (`ionic` in the path).
    pub ionic_present: bool,
    pub software: Software,
    /// Aligned table output instead of one debug line per row.
    pub pretty_print: bool,
    /// Trailing share of each log searched for final energies.
    pub tail_fraction: f64,
    /// Trailing share of each log searched for normal termination.
    pub completion_fraction: f64,
    /// Write equilibrium / rerun XYZ files next to the logs.
    pub write_geometries: bool,
    /// Compute HOMO/LUMO gaps for every log.
    pub collect_gaps: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let options = ExtractionOptions::default();
        Self {
            ionic_present: false,
            software: Software::default(),
            pretty_print: false,
            tail_fraction: options.tail_fraction,
            completion_fraction: options.completion_fraction,
            write_geometries: false,
            collect_gaps: false,
        }
    }
}

impl PipelineConfig {
    pub fn extraction_options(&self) -> ExtractionOptions {
        ExtractionOptions {
            tail_fraction: self.tail_fraction,
            completion_fraction: self.completion_fraction,
        }
    }

    pub fn aggregator(&self) -> InteractionEnergyAggregator {
        InteractionEnergyAggregator::new(self.ionic_present, self.software)
    }
}

/// Everything pulled out of a directory of logs. Per-file problems land in
/// `failures`; they never abort the batch.
#[derive(Debug, Default)]
pub struct ExtractionReport {
    pub records: Vec<LogRecord>,
    pub gaps: Vec<GapReport>,
    /// Geometry files written when `write_geometries` is set.
    pub geometries: Vec<GeometryOutput>,
    pub failures: Vec<ExtractionError>,
    /// Logs that did not terminate normally.
    pub diagnoses: Vec<(PathBuf, Diagnosis)>,
}

impl ExtractionReport {
    /// Unconverged geometries whose jobs must be resubmitted.
    pub fn resubmissions(&self) -> Vec<&GeometryOutput> {
        self.geometries.iter().filter(|g| g.needs_resubmission()).collect()
    }
}

/// Result of reading one log, before the batch barrier.
#[derive(Default)]
struct LogOutcome {
    record: Option<LogRecord>,
    gap: Option<GapReport>,
    geometry: Option<GeometryOutput>,
    failures: Vec<ExtractionError>,
    diagnosis: Option<(PathBuf, Diagnosis)>,
}

fn extract_one(root: &Path, log_path: &Path, config: &PipelineConfig) -> LogOutcome {
    let mut outcome = LogOutcome::default();
    let log = match GamessLog::open(root, log_path) {
        Ok(log) => log,
        Err(e) => {
            outcome.failures.push(e);
            return outcome;
        }
    };
    let options = config.extraction_options();

    match log.diagnose(&options) {
        Diagnosis::Completed => {}
        other => outcome.diagnosis = Some((log_path.to_path_buf(), other)),
    }
    match log.record(&options) {
        Ok(record) => outcome.record = Some(record),
        Err(e) => outcome.failures.push(e),
    }

    if config.collect_gaps {
        match log.gap() {
            Ok(gap) => outcome.gap = Some(gap),
            Err(e) => outcome.failures.push(e),
        }
    }

    // Only optimisations produce geometries worth writing; an unknown run
    // type is reported rather than guessed.
    let run_type = RunClassifier::run_type(log.text().lines());
    if config.write_geometries && (run_type.is_optimisation() || run_type == RunType::Unknown) {
        match log.geometry() {
            Ok(geometry) => outcome.geometry = Some(geometry),
            Err(e) => outcome.failures.push(e),
        }
    }
    outcome
}

/// Reads every `*.log` below `root` in parallel. All files are processed
/// before anything is returned, so callers can aggregate the records
/// directly.
pub fn extract_directory(root: &Path, config: &PipelineConfig) -> Result<ExtractionReport> {
    let logs = io::crawler::find_logs(root)
        .with_context(|| format!("Failed to collect logs under {:?}", root))?;
    info!("Found {} log files under {:?}", logs.len(), root);

    let outcomes: Vec<LogOutcome> = logs
        .par_iter()
        .map(|path| extract_one(root, path, config))
        .collect();

    let mut report = ExtractionReport::default();
    for outcome in outcomes {
        report.records.extend(outcome.record);
        report.gaps.extend(outcome.gap);
        report.diagnoses.extend(outcome.diagnosis);
        report.failures.extend(outcome.failures);

        // A geometry that cannot be written is one more per-file failure.
        if let Some(geometry) = outcome.geometry {
            match xyz::write(&geometry) {
                Ok(()) => {
                    info!("Wrote {:?}", geometry.destination);
                    report.geometries.push(geometry);
                }
                Err(e) => report.failures.push(e),
            }
        }
    }

    for failure in &report.failures {
        warn!("{}", failure);
    }
    for (path, diagnosis) in &report.diagnoses {
        warn!("{:?}: {}", path, diagnosis.message());
    }

    Ok(report)
}

/// Aggregator stage over a raw extraction table on disk.
pub fn calculate_interaction_energies(input: &Path, config: &PipelineConfig) -> Result<Aggregation> {
    let rows = table::read_energy_rows_from_path(input)
        .with_context(|| format!("Failed to read energy table {:?}", input))?;
    info!("Read {} rows from {:?}", rows.len(), input);
    Ok(config.aggregator().aggregate(&rows))
}

/// Weighting stage over an aggregate table on disk.
pub fn apply_boltzmann_weightings(input: &Path, group_by: &GroupBy) -> Result<Vec<WeightedEnsembleResult>> {
    let aggregates = table::read_aggregates_from_path(input)
        .with_context(|| format!("Failed to read aggregate table {:?}", input))?;
    debug!("Grouping {} configurations by {:?}", aggregates.len(), group_by);
    Ok(BoltzmannWeighter::default().weight(&aggregates, group_by))
}
