use crate::core::error::ExtractionError;
use lazy_static::lazy_static;
use regex::Regex;
use std::path::{Path, PathBuf};

lazy_static! {
    /// Element symbol followed by nuclear charge and x, y, z, as printed in
    /// GAMESS `COORDINATES OF ALL ATOMS ARE (ANGS)` tables.
    static ref RE_COORDINATE: Regex =
        Regex::new(r"[A-Za-z]{1,2}(\s*\D?[0-9]{1,3}\.[0-9]{1,10}){4}").unwrap();
}

const EQUILIBRIUM_MARKER: &str = "EQUILIBRIUM GEOMETRY LOCATED";
const COORDINATE_HEADER: &str = "COORDINATES OF ALL ATOMS ARE (ANGS)";

/// Directory names that sit directly below a system's parent directory.
const STAGE_DIRS: &[&str] = &["opt", "spec", "hess"];

// ============================================================================
// DATA STRUCTURES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Converged geometry, ready for a single point.
    Equilibrium,
    /// Most recent unconverged geometry; the job must be resubmitted from it.
    PendingRerun,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateAtom {
    pub element: String,
    pub position: [f64; 3],
}

/// Raw coordinate lines as they appeared in the log.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryBlock {
    pub kind: BlockKind,
    pub lines: Vec<String>,
}

impl GeometryBlock {
    /// Element symbol plus the last three numeric fields of each line; the
    /// nuclear charge column is dropped.
    pub fn atoms(&self) -> Result<Vec<CoordinateAtom>, ExtractionError> {
        self.lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                let fields: Vec<&str> = line.split_whitespace().collect();
                if fields.len() < 4 {
                    return Err(ExtractionError::parse("geometry block", i + 1, line.as_str()));
                }
                let mut position = [0.0; 3];
                for (slot, raw) in position.iter_mut().zip(&fields[fields.len() - 3..]) {
                    *slot = raw
                        .parse()
                        .map_err(|_| ExtractionError::parse("geometry block", i + 1, line.as_str()))?;
                }
                Ok(CoordinateAtom { element: fields[0].to_string(), position })
            })
            .collect()
    }
}

/// Where a captured block should be written.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryOutput {
    pub block: GeometryBlock,
    pub destination: PathBuf,
}

impl GeometryOutput {
    /// A pending rerun means the configuration has to be resubmitted.
    pub fn needs_resubmission(&self) -> bool {
        self.block.kind == BlockKind::PendingRerun
    }
}

// ============================================================================
// TRACKER
// ============================================================================

/// Scans a log for coordinate tables, separating the equilibrium geometry
/// from the most recent unconverged one.
pub struct GeometryTracker;

impl GeometryTracker {
    /// Returns `(equilibrium, rerun)` coordinate lines.
    pub fn track<'a, I>(lines: I) -> (Vec<String>, Vec<String>)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut equil = Vec::new();
        let mut rerun = Vec::new();
        let mut found_equil = false;
        let mut found_some = false;

        for line in lines {
            if line.contains(EQUILIBRIUM_MARKER) {
                found_equil = true;
            }
            if line.contains(COORDINATE_HEADER) {
                found_some = true;
                rerun.clear();
            }
            if (found_equil || found_some) && RE_COORDINATE.is_match(line) {
                if found_equil {
                    equil.push(line.to_string());
                }
                if found_some {
                    rerun.push(line.to_string());
                }
            }
            if line.is_empty() {
                found_equil = false;
                found_some = false;
            }
        }

        (equil, rerun)
    }

    /// Picks the block to write and its destination.
    ///
    /// `log_dir` is the directory holding the log relative to `root`, and
    /// `stem` the log's base name without extension. Only `log_dir` is cut
    /// at the stage directory, so stage names above the root never matter.
    pub fn plan<'a, I>(lines: I, root: &Path, log_dir: &Path, stem: &str) -> Result<GeometryOutput, ExtractionError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let (equil, rerun) = Self::track(lines);

        if !equil.is_empty() {
            Ok(GeometryOutput {
                block: GeometryBlock { kind: BlockKind::Equilibrium, lines: equil },
                destination: root
                    .join(parent_dir(log_dir))
                    .join("spec")
                    .join(format!("{}_equil.xyz", stem)),
            })
        } else if !rerun.is_empty() {
            Ok(GeometryOutput {
                block: GeometryBlock { kind: BlockKind::PendingRerun, lines: rerun },
                destination: root.join(log_dir).join("rerun").join("rerun.xyz"),
            })
        } else {
            Err(ExtractionError::NoIterations { file: stem.to_string() })
        }
    }
}

/// Path components up to, but excluding, the first `opt`/`spec`/`hess`.
pub fn parent_dir(log_dir: &Path) -> PathBuf {
    log_dir
        .components()
        .take_while(|c| {
            c.as_os_str()
                .to_str()
                .map_or(true, |name| !STAGE_DIRS.contains(&name))
        })
        .collect()
}
