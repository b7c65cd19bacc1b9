//! CSV artifacts of the pipeline.
//!
//! Three tables flow between stages:
//!
//! - **records**: one row per log (`File, Path, Run, Model, Basis,
//!   Multiplicity, HF/DFT, MP2/SRS, MP2_opp, MP2_same`).
//! - **aggregates**: one row per configuration (`Config, hf_complex,
//!   [hf_ionic,] hf_frags, corr_complex, [corr_ionic,] corr_frags, hf_int_kJ,
//!   corr_int_kJ, total_int_kJ`).
//! - **ensembles**: one row per Boltzmann group (`Groups, Electrostatics,
//!   Dispersion, Electro_CI, Dispersion_CI`).
//!
//! Values that do not apply are written as `NA` and read back as `None`.

use crate::analysis::boltzmann::WeightedEnsembleResult;
use crate::analysis::interaction::{ConfigAggregate, EnergyRow};
use crate::core::error::TableError;
use crate::core::record::LogRecord;
use crate::extraction::orbitals::GapReport;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt::Write as _;
use std::io::{Read, Write};
use std::path::Path;

pub const NA: &str = "NA";

const RECORD_HEADERS: [&str; 10] = [
    "File", "Path", "Run", "Model", "Basis", "Multiplicity", "HF/DFT", "MP2/SRS", "MP2_opp", "MP2_same",
];

// ============================================================================
// NOT-APPLICABLE MARKERS
// ============================================================================

fn na_float<S: Serializer>(value: &Option<f64>, s: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => s.serialize_f64(*v),
        None => s.serialize_str(NA),
    }
}

fn format_na(value: Option<f64>) -> String {
    value.map_or_else(|| NA.to_string(), |v| v.to_string())
}

/// `NA`, `nan` and empty fields are "not applicable"; anything else must be
/// a number.
fn parse_na(raw: &str, row: usize, column: &'static str) -> Result<Option<f64>, TableError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(NA) || trimmed.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    trimmed.parse::<f64>().map(Some).map_err(|_| TableError::Parse {
        row,
        column,
        value: raw.to_string(),
    })
}

// ============================================================================
// RECORDS
// ============================================================================

pub fn write_records<W: Write>(writer: W, records: &[LogRecord]) -> Result<(), TableError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(RECORD_HEADERS)?;
    for r in records {
        wtr.write_record([
            r.file.clone(),
            r.path.clone(),
            r.run_type.to_string(),
            r.energy_model.to_string(),
            r.basis.clone().unwrap_or_else(|| NA.to_string()),
            r.multiplicity.map_or_else(|| NA.to_string(), |m| m.to_string()),
            r.energies.hf.to_string(),
            format_na(r.energies.mp2_correlation),
            format_na(r.energies.mp2_opposite_spin),
            format_na(r.energies.mp2_same_spin),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_records_to_path(path: &Path, records: &[LogRecord]) -> Result<(), TableError> {
    write_records(std::fs::File::create(path)?, records)
}

/// Reads a raw extraction table into the rows the aggregator consumes.
///
/// Requires `Path`, `HF/DFT` and at least one of `MP2/SRS` / `MP2_opp`, so an
/// aggregate table fed back in is rejected rather than misread.
pub fn read_energy_rows<R: Read>(reader: R, source: &str) -> Result<Vec<EnergyRow>, TableError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();
    let column = |name: &'static str| headers.iter().position(|h| h.trim() == name);
    let missing = |name: &'static str| TableError::MissingColumn {
        column: name,
        path: source.to_string(),
    };

    let path_idx = column("Path").ok_or_else(|| missing("Path"))?;
    let hf_idx = column("HF/DFT").ok_or_else(|| missing("HF/DFT"))?;
    let srs_idx = column("MP2/SRS");
    let opp_idx = column("MP2_opp");
    if srs_idx.is_none() && opp_idx.is_none() {
        return Err(missing("MP2/SRS"));
    }

    let mut rows = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let row = i + 1;
        let field = |idx: Option<usize>, name: &'static str| -> Result<Option<f64>, TableError> {
            match idx.and_then(|idx| record.get(idx)) {
                Some(raw) => parse_na(raw, row, name),
                None => Ok(None),
            }
        };
        rows.push(EnergyRow {
            path: record.get(path_idx).unwrap_or_default().to_string(),
            hf: field(Some(hf_idx), "HF/DFT")?,
            srs: field(srs_idx, "MP2/SRS")?,
            mp2_opposite_spin: field(opp_idx, "MP2_opp")?,
        });
    }
    Ok(rows)
}

pub fn read_energy_rows_from_path(path: &Path) -> Result<Vec<EnergyRow>, TableError> {
    read_energy_rows(std::fs::File::open(path)?, &path.display().to_string())
}

// ============================================================================
// AGGREGATES
// ============================================================================

/// Header and formatted cells of an aggregate table. Ionic columns appear
/// only when the rows carry them.
pub fn aggregate_cells(rows: &[ConfigAggregate]) -> (Vec<&'static str>, Vec<Vec<String>>) {
    let ionic = rows.iter().any(|r| r.hf_ionic.is_some());
    let mut headers = vec!["Config", "hf_complex"];
    if ionic {
        headers.push("hf_ionic");
    }
    headers.extend(["hf_frags", "corr_complex"]);
    if ionic {
        headers.push("corr_ionic");
    }
    headers.extend(["corr_frags", "hf_int_kJ", "corr_int_kJ", "total_int_kJ"]);

    let cells = rows
        .iter()
        .map(|r| {
            let mut cells = vec![r.config.clone(), r.hf_complex.to_string()];
            if ionic {
                cells.push(format_na(r.hf_ionic));
            }
            cells.extend([r.hf_frags.to_string(), r.corr_complex.to_string()]);
            if ionic {
                cells.push(format_na(r.corr_ionic));
            }
            cells.extend([
                r.corr_frags.to_string(),
                r.hf_int_kj.to_string(),
                r.corr_int_kj.to_string(),
                r.total_int_kj.to_string(),
            ]);
            cells
        })
        .collect();
    (headers, cells)
}

pub fn write_aggregates<W: Write>(writer: W, rows: &[ConfigAggregate]) -> Result<(), TableError> {
    let (headers, cells) = aggregate_cells(rows);
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(&headers)?;
    for row in cells {
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_aggregates_to_path(path: &Path, rows: &[ConfigAggregate]) -> Result<(), TableError> {
    write_aggregates(std::fs::File::create(path)?, rows)
}

#[derive(Debug, Deserialize)]
struct AggregateRow {
    #[serde(rename = "Config")]
    config: String,
    hf_complex: f64,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    hf_ionic: Option<f64>,
    hf_frags: f64,
    corr_complex: f64,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    corr_ionic: Option<f64>,
    corr_frags: f64,
    #[serde(rename = "hf_int_kJ")]
    hf_int_kj: f64,
    #[serde(rename = "corr_int_kJ")]
    corr_int_kj: f64,
    #[serde(rename = "total_int_kJ")]
    total_int_kj: f64,
}

impl From<AggregateRow> for ConfigAggregate {
    fn from(r: AggregateRow) -> Self {
        ConfigAggregate {
            config: r.config,
            hf_complex: r.hf_complex,
            hf_ionic: r.hf_ionic,
            hf_frags: r.hf_frags,
            corr_complex: r.corr_complex,
            corr_ionic: r.corr_ionic,
            corr_frags: r.corr_frags,
            hf_int_kj: r.hf_int_kj,
            corr_int_kj: r.corr_int_kj,
            total_int_kj: r.total_int_kj,
        }
    }
}

pub fn read_aggregates<R: Read>(reader: R, source: &str) -> Result<Vec<ConfigAggregate>, TableError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();
    for required in ["Config", "hf_complex", "corr_complex", "hf_int_kJ", "corr_int_kJ"] {
        if !headers.iter().any(|h| h == required) {
            return Err(TableError::MissingColumn {
                column: required,
                path: source.to_string(),
            });
        }
    }
    rdr.deserialize::<AggregateRow>()
        .map(|row| Ok(row?.into()))
        .collect()
}

pub fn read_aggregates_from_path(path: &Path) -> Result<Vec<ConfigAggregate>, TableError> {
    read_aggregates(std::fs::File::open(path)?, &path.display().to_string())
}

// ============================================================================
// ENSEMBLES & GAPS
// ============================================================================

const ENSEMBLE_HEADERS: [&str; 5] = ["Groups", "Electrostatics", "Dispersion", "Electro_CI", "Dispersion_CI"];

const GAP_HEADERS: [&str; 8] = [
    "File", "Path", "Multiplicity", "Transition", "HOMO/SOMO (Eh)", "LUMO (Eh)", "Gap (Eh)", "Gap (eV)",
];

/// Writer that emits `headers` up front, so an empty table still has them.
fn headed_writer<W: Write>(writer: W, headers: &[&str]) -> Result<csv::Writer<W>, TableError> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(headers)?;
    Ok(wtr)
}

#[derive(Serialize)]
struct EnsembleRow<'a> {
    group: &'a str,
    electrostatics: f64,
    dispersion: f64,
    #[serde(serialize_with = "na_float")]
    electro_ci: Option<f64>,
    #[serde(serialize_with = "na_float")]
    dispersion_ci: Option<f64>,
}

pub fn write_ensembles<W: Write>(writer: W, results: &[WeightedEnsembleResult]) -> Result<(), TableError> {
    let mut wtr = headed_writer(writer, &ENSEMBLE_HEADERS)?;
    for r in results {
        wtr.serialize(EnsembleRow {
            group: &r.group,
            electrostatics: r.electrostatics,
            dispersion: r.dispersion,
            electro_ci: r.electro_ci,
            dispersion_ci: r.dispersion_ci,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_ensembles_to_path(path: &Path, results: &[WeightedEnsembleResult]) -> Result<(), TableError> {
    write_ensembles(std::fs::File::create(path)?, results)
}

#[derive(Serialize)]
struct GapRow<'a> {
    file: &'a str,
    path: &'a str,
    multiplicity: u32,
    transition: &'static str,
    homo: f64,
    lumo: f64,
    gap_hartree: f64,
    gap_ev: f64,
}

pub fn write_gaps<W: Write>(writer: W, gaps: &[GapReport]) -> Result<(), TableError> {
    let mut wtr = headed_writer(writer, &GAP_HEADERS)?;
    for g in gaps {
        wtr.serialize(GapRow {
            file: &g.file,
            path: &g.path,
            multiplicity: g.multiplicity,
            transition: g.transition.label(),
            homo: g.homo,
            lumo: g.lumo,
            gap_hartree: g.gap_hartree,
            gap_ev: g.gap_ev,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_gaps_to_path(path: &Path, gaps: &[GapReport]) -> Result<(), TableError> {
    write_gaps(std::fs::File::create(path)?, gaps)
}

// ============================================================================
// PRETTY PRINTING
// ============================================================================

/// Aligned, human-readable rendering. Columns are at least `min_width` wide.
pub fn render_pretty(headers: &[&str], rows: &[Vec<String>], min_width: usize) -> String {
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rows.iter()
                .filter_map(|r| r.get(i))
                .map(String::len)
                .chain(std::iter::once(h.len()))
                .max()
                .unwrap_or(0)
                .max(min_width)
        })
        .collect();

    let mut out = String::new();
    push_row(&mut out, headers.iter().copied(), &widths);
    out.push_str(&"-".repeat(widths.iter().map(|w| w + 1).sum()));
    out.push('\n');
    for row in rows {
        push_row(&mut out, row.iter().map(String::as_str), &widths);
    }
    out
}

fn push_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    for (cell, width) in cells.zip(widths) {
        let _ = write!(out, "{:>width$}", cell, width = width + 1);
    }
    out.push('\n');
}
