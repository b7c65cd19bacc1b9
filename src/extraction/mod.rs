//! Per-log extraction: classification, energies, basis, geometry and
//! frontier orbitals of a single GAMESS output file.

pub mod basis;
pub mod classifier;
pub mod energy;
pub mod geometry;
pub mod orbitals;
pub mod status;

use crate::core::error::ExtractionError;
use crate::core::record::{EnergyModel, LogRecord, RunType};
use crate::io::lines::LogText;
use basis::BasisResolver;
use classifier::RunClassifier;
use energy::EnergyExtractor;
use geometry::{GeometryOutput, GeometryTracker};
use log::{debug, warn};
use orbitals::{GapReport, OrbitalAnalyzer};
use status::Diagnosis;
use std::path::{Path, PathBuf};

/// Tunables for reading a single log.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractionOptions {
    /// Trailing share of lines searched for final energies.
    pub tail_fraction: f64,
    /// Trailing share of lines searched for normal termination.
    pub completion_fraction: f64,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            tail_fraction: 0.2,
            completion_fraction: 0.1,
        }
    }
}

/// One GAMESS log loaded into memory.
#[derive(Debug, Clone)]
pub struct GamessLog {
    /// Directory of the log relative to the crawl root, slash-delimited.
    pub path: String,
    /// Crawl root the log was found under.
    pub root: PathBuf,
    pub file: String,
    text: LogText,
}

impl GamessLog {
    pub fn open(root: &Path, log_path: &Path) -> Result<Self, ExtractionError> {
        let text = LogText::read(log_path)?;
        let dir = log_path.parent().map(Path::to_path_buf).unwrap_or_default();
        let relative = dir.strip_prefix(root).unwrap_or(dir.as_path());
        let path = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let file = log_path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            path,
            root: root.to_path_buf(),
            file,
            text,
        })
    }

    pub fn from_text(path: &str, file: &str, text: &str) -> Self {
        Self {
            path: path.to_string(),
            root: PathBuf::new(),
            file: file.to_string(),
            text: LogText::from_text(text),
        }
    }

    pub fn text(&self) -> &LogText {
        &self.text
    }

    /// File name without extension.
    pub fn stem(&self) -> &str {
        Path::new(&self.file)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(self.file.as_str())
    }

    pub fn classify(&self) -> (RunType, EnergyModel) {
        RunClassifier::classify(self.text.lines())
    }

    /// Builds the table row for this log. A missing energy marker fails the
    /// whole record; a missing basis card only blanks the basis.
    pub fn record(&self, options: &ExtractionOptions) -> Result<LogRecord, ExtractionError> {
        let (run_type, model) = self.classify();
        debug!("{}: run type {}, energy model {}", self.file, run_type, model);
        if model.is_fmo() {
            debug!("{}: FMO level {}", self.file, self.fmo_level());
        }

        let energies = EnergyExtractor::new(&self.file, options.tail_fraction).extract(&self.text, model)?;

        let basis = match BasisResolver::resolve(self.text.lines(), &self.file) {
            Ok(name) => Some(name),
            Err(e) => {
                warn!("{}", e);
                None
            }
        };

        Ok(LogRecord {
            path: self.path.clone(),
            file: self.file.clone(),
            run_type,
            energy_model: model,
            basis,
            multiplicity: orbitals::multiplicity(self.text.lines()),
            energies,
        })
    }

    /// Geometry to write for this log. Needs a known run type.
    pub fn geometry(&self) -> Result<GeometryOutput, ExtractionError> {
        if RunClassifier::run_type(self.text.lines()) == RunType::Unknown {
            return Err(ExtractionError::UnsupportedRunType { file: self.file.clone() });
        }
        GeometryTracker::plan(self.text.lines(), &self.root, Path::new(&self.path), self.stem()).map_err(|e| match e {
            ExtractionError::NoIterations { .. } => ExtractionError::NoIterations { file: self.file.clone() },
            other => other,
        })
    }

    pub fn gap(&self) -> Result<GapReport, ExtractionError> {
        OrbitalAnalyzer::new(&self.file).report(self.text.lines(), &self.path)
    }

    pub fn diagnose(&self, options: &ExtractionOptions) -> Diagnosis {
        let run_type = RunClassifier::run_type(self.text.lines());
        status::diagnose(&self.text, run_type, options.completion_fraction)
    }

    pub fn fmo_level(&self) -> u8 {
        status::fmo_level(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FMO_LOG: &str = "\
 $CONTRL SCFTYP=RHF RUNTYP=ENERGY $END
 $FMO NBODY=3 $END
 MPLEVL=2
 INPUT CARD> $BASIS GBASIS=CCT $END
 SPIN MULTIPLICITY = 1
 RUN TITLE
 Euncorr HF(2)=  -100.0
 E corr MP2(2)=  -100.9
 Euncorr HF(3)=  -100.5
 E corr MP2(3)=  -101.2
 EXECUTION OF GAMESS TERMINATED NORMALLY
";

    #[test]
    fn record_from_fmo_log() {
        let log = GamessLog::from_text("c1/spec", "c1.log", FMO_LOG);
        let options = ExtractionOptions { tail_fraction: 1.0, ..Default::default() };
        let record = log.record(&options).unwrap();
        assert_eq!(record.run_type, RunType::Energy);
        assert_eq!(record.energy_model, EnergyModel::FmoMp2);
        assert_eq!(record.multiplicity, Some(1));
        assert_eq!(record.basis.as_deref(), Some("cc-pVTZ"));
        assert_eq!(record.energies.hf, -100.5);
        assert_eq!(record.energies.mp2_correlation, Some(-101.2));
        assert_eq!(log.fmo_level(), 3);
        assert_eq!(log.diagnose(&options), Diagnosis::Completed);
    }

    #[test]
    fn missing_energy_fails_the_record() {
        let log = GamessLog::from_text("c1/spec", "c1.log", " FMO MPLEVL=2\n RUN TITLE\n");
        assert!(matches!(
            log.record(&ExtractionOptions::default()),
            Err(ExtractionError::MissingEnergy { .. })
        ));
    }

    #[test]
    fn geometry_needs_a_run_type() {
        let log = GamessLog::from_text("c1/opt", "c1.log", " no run type\n");
        assert!(matches!(log.geometry(), Err(ExtractionError::UnsupportedRunType { .. })));

        let log = GamessLog::from_text("c1/opt", "c1.log", " RUNTYP=OPTIMIZE\n");
        assert!(matches!(log.geometry(), Err(ExtractionError::NoIterations { file }) if file == "c1.log"));
    }

    #[test]
    fn stem_drops_extension() {
        let log = GamessLog::from_text("c1", "water.log", "");
        assert_eq!(log.stem(), "water");
    }
}
