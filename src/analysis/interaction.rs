use crate::core::record::{LogRecord, Software, StructuralRole};
use log::warn;
use std::collections::BTreeMap;
use std::fmt;

/// kJ/mol per Hartree.
pub const HARTREE_TO_KJ_MOL: f64 = 2625.5;

/// Opposite-spin scaling used to synthesise an SRS total from MP2 components.
pub const OPPOSITE_SPIN_SCALE: f64 = 1.64;

// ============================================================================
// INPUT ROWS
// ============================================================================

/// The columns of a raw extraction table the decomposition needs.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyRow {
    pub path: String,
    /// `HF/DFT`
    pub hf: Option<f64>,
    /// `MP2/SRS`: a correlation-corrected total.
    pub srs: Option<f64>,
    /// `MP2_opp`
    pub mp2_opposite_spin: Option<f64>,
}

impl From<&LogRecord> for EnergyRow {
    fn from(record: &LogRecord) -> Self {
        Self {
            path: record.path.clone(),
            hf: Some(record.energies.hf),
            srs: record.energies.mp2_correlation,
            mp2_opposite_spin: record.energies.mp2_opposite_spin,
        }
    }
}

impl EnergyRow {
    pub fn config(&self) -> &str {
        self.path.split('/').next().unwrap_or("")
    }

    /// Best available correlation-corrected total.
    pub fn srs_total(&self, software: Software) -> Option<f64> {
        let synthesised = self
            .hf
            .zip(self.mp2_opposite_spin)
            .map(|(hf, opp)| hf + OPPOSITE_SPIN_SCALE * opp);
        match software {
            Software::Gamess => self.srs.or(synthesised),
            Software::Psi4 => synthesised,
        }
    }

    /// `SRS - HF`.
    pub fn correlation(&self, software: Software) -> Option<f64> {
        self.srs_total(software).zip(self.hf).map(|(srs, hf)| srs - hf)
    }
}

// ============================================================================
// OUTPUT ROWS
// ============================================================================

/// Summed energies and interaction energies of one configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigAggregate {
    pub config: String,
    pub hf_complex: f64,
    /// Present only when the dataset declares ionic references.
    pub hf_ionic: Option<f64>,
    pub hf_frags: f64,
    pub corr_complex: f64,
    pub corr_ionic: Option<f64>,
    pub corr_frags: f64,
    pub hf_int_kj: f64,
    pub corr_int_kj: f64,
    pub total_int_kj: f64,
}

impl ConfigAggregate {
    /// HF plus correlation of the full complex, in Hartree.
    pub fn complex_total_energy(&self) -> f64 {
        self.hf_complex + self.corr_complex
    }
}

/// A configuration whose rows do not support a meaningful decomposition,
/// usually a sign that paths were classified into the wrong role.
#[derive(Debug, Clone, PartialEq)]
pub struct DataQualityWarning {
    pub config: String,
    pub message: String,
}

impl fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "configuration '{}': {}", self.config, self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub rows: Vec<ConfigAggregate>,
    pub warnings: Vec<DataQualityWarning>,
}

// ============================================================================
// AGGREGATOR
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
struct RoleSum {
    hf: f64,
    corr: f64,
    rows: usize,
    hf_rows: usize,
}

impl RoleSum {
    fn add(&mut self, hf: Option<f64>, corr: Option<f64>) {
        self.rows += 1;
        if let Some(hf) = hf {
            self.hf += hf;
            self.hf_rows += 1;
        }
        // rows without a correlation value contribute nothing
        if let Some(corr) = corr {
            self.corr += corr;
        }
    }
}

#[derive(Debug, Default)]
struct ConfigSums {
    complex: RoleSum,
    ionic: RoleSum,
    frags: RoleSum,
}

impl ConfigSums {
    fn role_mut(&mut self, role: StructuralRole) -> &mut RoleSum {
        match role {
            StructuralRole::Complex => &mut self.complex,
            StructuralRole::IonicReference => &mut self.ionic,
            StructuralRole::Fragment => &mut self.frags,
        }
    }
}

/// Groups rows by configuration and decomposes them into interaction
/// energies.
#[derive(Debug, Clone, Copy, Default)]
pub struct InteractionEnergyAggregator {
    pub ionic_present: bool,
    pub software: Software,
}

impl InteractionEnergyAggregator {
    pub fn new(ionic_present: bool, software: Software) -> Self {
        Self { ionic_present, software }
    }

    pub fn aggregate_records(&self, records: &[LogRecord]) -> Aggregation {
        let rows: Vec<EnergyRow> = records.iter().map(EnergyRow::from).collect();
        self.aggregate(&rows)
    }

    pub fn aggregate(&self, rows: &[EnergyRow]) -> Aggregation {
        let mut groups: BTreeMap<&str, ConfigSums> = BTreeMap::new();

        for row in rows {
            let role = StructuralRole::from_path(&row.path, self.ionic_present);
            groups
                .entry(row.config())
                .or_default()
                .role_mut(role)
                .add(row.hf, row.correlation(self.software));
        }

        let mut aggregation = Aggregation::default();
        for (config, sums) in groups {
            aggregation.warnings.extend(self.check(config, &sums));
            aggregation.rows.push(self.decompose(config, &sums));
        }

        for warning in &aggregation.warnings {
            warn!("{}", warning);
        }
        aggregation
    }

    fn decompose(&self, config: &str, sums: &ConfigSums) -> ConfigAggregate {
        let (hf_ionic, corr_ionic) = if self.ionic_present {
            (Some(sums.ionic.hf), Some(sums.ionic.corr))
        } else {
            (None, None)
        };

        let hf_int_kj =
            (sums.complex.hf - hf_ionic.unwrap_or_default() - sums.frags.hf) * HARTREE_TO_KJ_MOL;
        let corr_int_kj =
            (sums.complex.corr - corr_ionic.unwrap_or_default() - sums.frags.corr) * HARTREE_TO_KJ_MOL;

        ConfigAggregate {
            config: config.to_string(),
            hf_complex: sums.complex.hf,
            hf_ionic,
            hf_frags: sums.frags.hf,
            corr_complex: sums.complex.corr,
            corr_ionic,
            corr_frags: sums.frags.corr,
            hf_int_kj,
            corr_int_kj,
            total_int_kj: hf_int_kj + corr_int_kj,
        }
    }

    fn check(&self, config: &str, sums: &ConfigSums) -> Vec<DataQualityWarning> {
        let mut warnings = Vec::new();
        let mut flag = |message: String| {
            warnings.push(DataQualityWarning { config: config.to_string(), message })
        };

        if sums.complex.hf_rows == 0 {
            flag("no complex energy; check for misclassified paths".to_string());
        }
        let references = sums.frags.hf_rows + if self.ionic_present { sums.ionic.hf_rows } else { 0 };
        if references == 0 {
            flag("no fragment or ionic energies to subtract".to_string());
        }
        let skipped = [&sums.complex, &sums.ionic, &sums.frags]
            .iter()
            .map(|s| s.rows - s.hf_rows)
            .sum::<usize>();
        if skipped > 0 {
            flag(format!("{} row(s) without an HF/DFT value were left out", skipped));
        }
        warnings
    }
}
