use crate::core::record::EnergyModel;
use std::path::PathBuf;
use thiserror::Error;

/// Per-file failures. None of these abort a batch; they are collected next to
/// the successfully extracted records.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("failed to read log '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write geometry '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{file}: no '{marker}' found for a {model} calculation")]
    MissingEnergy {
        file: String,
        model: EnergyModel,
        marker: &'static str,
    },

    #[error("{file}: no 'SPIN MULTIPLICITY' line")]
    MissingMultiplicity { file: String },

    #[error("{file}: only singlet/doublet multiplicities are handled, found {multiplicity}")]
    UnsupportedMultiplicity { file: String, multiplicity: u32 },

    #[error("{file}: SOMO-LUMO gap for doublets is not implemented")]
    OpenShellGap { file: String },

    #[error("{file}: needed {needed} orbital energies, found {found}")]
    MissingOrbitals {
        file: String,
        needed: usize,
        found: usize,
    },

    #[error("{file}: no 'ORBITALS ARE OCCUPIED' line")]
    MissingOccupancy { file: String },

    #[error("{file}: no iterations were cycled through, no coordinates to write")]
    NoIterations { file: String },

    #[error("{file}: run type could not be determined")]
    UnsupportedRunType { file: String },

    #[error("{file}: no 'INPUT CARD> $BASIS' line")]
    MissingBasis { file: String },

    #[error("{file}: failed to parse '{details}' (line {line})")]
    Parse {
        file: String,
        line: usize,
        details: String,
    },
}

impl ExtractionError {
    pub fn parse(file: &str, line: usize, details: impl Into<String>) -> Self {
        Self::Parse {
            file: file.to_string(),
            line,
            details: details.into(),
        }
    }
}

/// Failures reading or writing the tabular artifacts.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("table '{path}' has no '{column}' column")]
    MissingColumn { column: &'static str, path: String },

    #[error("row {row}: '{value}' in column '{column}' is not a number or NA")]
    Parse {
        row: usize,
        column: &'static str,
        value: String,
    },
}
