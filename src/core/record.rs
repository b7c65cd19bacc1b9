use std::fmt;
use std::str::FromStr;

// ============================================================================
// ENUMS & SEMANTICS
// ============================================================================

/// The `RUNTYP=` a calculation was submitted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RunType {
    /// Single point (`RUNTYP=ENERGY`).
    Energy,
    /// Geometry optimisation (`RUNTYP=OPTIMIZE`).
    Optimize,
    /// Frequency calculation (`RUNTYP=HESSIAN`).
    Hessian,
    /// No `RUNTYP=` token, or one outside the fragment-interaction workflow.
    #[default]
    Unknown,
}

impl RunType {
    /// Maps the lowercase token value; anything unrecognised is `Unknown`.
    pub fn from_token(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "energy" => RunType::Energy,
            "optimize" => RunType::Optimize,
            "hessian" => RunType::Hessian,
            _ => RunType::Unknown,
        }
    }

    pub fn is_optimisation(&self) -> bool { *self == RunType::Optimize }
}

impl fmt::Display for RunType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunType::Energy => "energy",
            RunType::Optimize => "optimize",
            RunType::Hessian => "hessian",
            RunType::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Level of theory detected in the log header.
///
/// Each variant owns exactly one extraction branch (see
/// [`crate::extraction::energy::EnergyExtractor`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnergyModel {
    Hf,
    Dft,
    Mp2,
    Scs,
    FmoHf,
    FmoMp2,
    FmoScs,
    FmoDft,
}

impl EnergyModel {
    pub fn is_fmo(&self) -> bool {
        matches!(
            self,
            EnergyModel::FmoHf | EnergyModel::FmoMp2 | EnergyModel::FmoScs | EnergyModel::FmoDft
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EnergyModel::Hf => "hf",
            EnergyModel::Dft => "dft",
            EnergyModel::Mp2 => "mp2",
            EnergyModel::Scs => "scs",
            EnergyModel::FmoHf => "fmo_hf",
            EnergyModel::FmoMp2 => "fmo_mp2",
            EnergyModel::FmoScs => "fmo_scs",
            EnergyModel::FmoDft => "fmo_dft",
        }
    }
}

impl fmt::Display for EnergyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role of a calculation within its configuration, derived from its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructuralRole {
    /// The full cluster (default when no other marker matches).
    Complex,
    /// All ions of the cluster with neutral molecules removed.
    IonicReference,
    /// An isolated fragment.
    Fragment,
}

impl StructuralRole {
    /// `"frag"` wins over `"ionic"`; `"ionic"` is only honoured when the
    /// dataset declares ionic references.
    pub fn from_path(path: &str, ionic_present: bool) -> Self {
        if path.contains("frag") {
            StructuralRole::Fragment
        } else if ionic_present && path.contains("ionic") {
            StructuralRole::IonicReference
        } else {
            StructuralRole::Complex
        }
    }
}

/// Which program produced the raw table. Both feed the same decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Software {
    #[default]
    Gamess,
    Psi4,
}

impl FromStr for Software {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gamess" => Ok(Software::Gamess),
            "psi4" => Ok(Software::Psi4),
            other => Err(format!("unknown software profile '{}'", other)),
        }
    }
}

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Final energies pulled from a single log, in Hartree.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Energies {
    pub hf: f64,
    /// Correlation-corrected total energy (FMO `E corr MP2/SCS`).
    pub mp2_correlation: Option<f64>,
    /// `E(2S)` from non-FMO MP2 runs.
    pub mp2_opposite_spin: Option<f64>,
    /// `E(2T)` from non-FMO MP2 runs.
    pub mp2_same_spin: Option<f64>,
}

/// One computational job, the unit handed to the aggregator.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    /// Slash-delimited directory of the log relative to the crawl root.
    /// The first segment names the configuration.
    pub path: String,
    pub file: String,
    pub run_type: RunType,
    pub energy_model: EnergyModel,
    pub basis: Option<String>,
    /// `None` when the log never states a `SPIN MULTIPLICITY`.
    pub multiplicity: Option<u32>,
    pub energies: Energies,
}

impl LogRecord {
    /// First path segment.
    pub fn config(&self) -> &str {
        self.path.split('/').next().unwrap_or("")
    }

    pub fn role(&self, ionic_present: bool) -> StructuralRole {
        StructuralRole::from_path(&self.path, ionic_present)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_is_derived_from_path_markers() {
        assert_eq!(StructuralRole::from_path("c1/frag1/spec", true), StructuralRole::Fragment);
        assert_eq!(StructuralRole::from_path("c1/ionic/spec", true), StructuralRole::IonicReference);
        assert_eq!(StructuralRole::from_path("c1/ionic/spec", false), StructuralRole::Complex);
        assert_eq!(StructuralRole::from_path("c1/spec", true), StructuralRole::Complex);
        // fragment marker takes precedence
        assert_eq!(StructuralRole::from_path("c1/ionic/frag2", true), StructuralRole::Fragment);
    }

    #[test]
    fn run_type_tokens() {
        assert_eq!(RunType::from_token("OPTIMIZE"), RunType::Optimize);
        assert_eq!(RunType::from_token("energy"), RunType::Energy);
        assert_eq!(RunType::from_token("gradient"), RunType::Unknown);
        assert!(RunType::Optimize.is_optimisation());
        assert!(!RunType::Hessian.is_optimisation());
    }

    #[test]
    fn config_is_first_segment() {
        let record = LogRecord {
            path: "c12/frag1/spec".into(),
            file: "a.log".into(),
            run_type: RunType::Energy,
            energy_model: EnergyModel::Hf,
            basis: None,
            multiplicity: Some(1),
            energies: Energies::default(),
        };
        assert_eq!(record.config(), "c12");
    }
}
