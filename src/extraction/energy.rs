use crate::core::error::ExtractionError;
use crate::core::record::{Energies, EnergyModel};
use crate::io::lines::LogText;

const EUNCORR_HF: &str = "Euncorr HF";
const E_CORR_MP2: &str = "E corr MP2";
const E_CORR_SCS: &str = "E corr SCS";
const E_ZERO: &str = "E(0)=";
const E_2S: &str = "E(2S)=";
const E_2T: &str = "E(2T)=";
const TOTAL_ENERGY: &str = "TOTAL ENERGY =";

/// How a given [`EnergyModel`] is read out of a log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// FMO-MP2/SCS summary lines; `correlation` selects the `E corr` flavour.
    FmoCorrelated { correlation: &'static str },
    /// Non-FMO MP2 energy components.
    SpinComponents,
    /// Last `TOTAL ENERGY =` line, no correlation.
    TotalEnergy,
}

impl From<EnergyModel> for Strategy {
    fn from(model: EnergyModel) -> Self {
        match model {
            EnergyModel::FmoScs => Strategy::FmoCorrelated { correlation: E_CORR_SCS },
            EnergyModel::FmoMp2 => Strategy::FmoCorrelated { correlation: E_CORR_MP2 },
            EnergyModel::Mp2 | EnergyModel::Scs => Strategy::SpinComponents,
            EnergyModel::Hf | EnergyModel::Dft | EnergyModel::FmoHf | EnergyModel::FmoDft => {
                Strategy::TotalEnergy
            }
        }
    }
}

/// Pulls the final energies for a classified log.
///
/// Every marker follows "last occurrence wins": FMO prints FMO2 values
/// before FMO3, and optimisations print one total energy per step.
pub struct EnergyExtractor<'a> {
    file: &'a str,
    tail_fraction: f64,
}

impl<'a> EnergyExtractor<'a> {
    pub fn new(file: &'a str, tail_fraction: f64) -> Self {
        Self { file, tail_fraction }
    }

    pub fn extract(&self, log: &LogText, model: EnergyModel) -> Result<Energies, ExtractionError> {
        match Strategy::from(model) {
            Strategy::FmoCorrelated { correlation } => self.fmo_correlated(log, model, correlation),
            Strategy::SpinComponents => self.spin_components(log, model),
            Strategy::TotalEnergy => self.total_energy(log, model),
        }
    }

    fn fmo_correlated(
        &self,
        log: &LogText,
        model: EnergyModel,
        correlation: &'static str,
    ) -> Result<Energies, ExtractionError> {
        let (hf, corr) = log
            .tail(self.tail_fraction)
            .fold((None, None), |(hf, corr), line| {
                let hf = if line.contains(EUNCORR_HF) { last_token(line).or(hf) } else { hf };
                let corr = if line.contains(correlation) { last_token(line).or(corr) } else { corr };
                (hf, corr)
            });

        Ok(Energies {
            hf: self.require(hf, model, EUNCORR_HF)?,
            mp2_correlation: Some(self.require(corr, model, correlation)?),
            mp2_opposite_spin: None,
            mp2_same_spin: None,
        })
    }

    fn spin_components(&self, log: &LogText, model: EnergyModel) -> Result<Energies, ExtractionError> {
        #[derive(Default)]
        struct Seen {
            zero: Option<f64>,
            opposite: Option<f64>,
            same: Option<f64>,
        }

        let seen = log.tail(self.tail_fraction).fold(Seen::default(), |mut seen, line| {
            let has = |marker: &str| line.split_whitespace().any(|t| t == marker);
            let last = last_token(line);
            if has(E_ZERO) {
                seen.zero = last.or(seen.zero);
            }
            if has(E_2S) {
                seen.opposite = last.or(seen.opposite);
            }
            if has(E_2T) {
                seen.same = last.or(seen.same);
            }
            seen
        });

        Ok(Energies {
            hf: self.require(seen.zero, model, E_ZERO)?,
            mp2_correlation: None,
            mp2_opposite_spin: Some(self.require(seen.opposite, model, E_2S)?),
            mp2_same_spin: Some(self.require(seen.same, model, E_2T)?),
        })
    }

    fn total_energy(&self, log: &LogText, model: EnergyModel) -> Result<Energies, ExtractionError> {
        let hf = log
            .lines()
            .rev()
            .filter(|line| line.contains(TOTAL_ENERGY))
            .find_map(last_token);

        Ok(Energies {
            hf: self.require(hf, model, TOTAL_ENERGY)?,
            ..Energies::default()
        })
    }

    fn require(&self, value: Option<f64>, model: EnergyModel, marker: &'static str) -> Result<f64, ExtractionError> {
        value.ok_or_else(|| ExtractionError::MissingEnergy {
            file: self.file.to_string(),
            model,
            marker,
        })
    }
}

fn last_token(line: &str) -> Option<f64> {
    line.split_whitespace().next_back()?.parse().ok()
}
