use crate::analysis::interaction::{ConfigAggregate, HARTREE_TO_KJ_MOL};
use crate::math::statistics::{confidence_95, relative};
use nalgebra::DVector;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Gas constant in J/(mol K).
pub const GAS_CONSTANT: f64 = 8.3145;
/// Room temperature in K.
pub const ROOM_TEMPERATURE: f64 = 298.15;

// ============================================================================
// GROUPING
// ============================================================================

/// How configurations are partitioned into ensembles.
pub enum GroupBy {
    /// Every configuration is its own group.
    Config,
    /// One ensemble over all configurations.
    All,
    /// Text of the configuration name before the first `separator`,
    /// e.g. `c1-a`, `c1-b` → `c1` for separator `-`.
    Prefix(String),
    /// First capture group of the pattern (or the whole match). Configs the
    /// pattern does not match stay in a group of their own name.
    Pattern(Regex),
    Custom(Box<dyn Fn(&ConfigAggregate) -> String + Send + Sync>),
}

impl GroupBy {
    pub fn key(&self, aggregate: &ConfigAggregate) -> String {
        match self {
            GroupBy::Config => aggregate.config.clone(),
            GroupBy::All => "all".to_string(),
            GroupBy::Prefix(separator) => aggregate
                .config
                .split(separator.as_str())
                .next()
                .unwrap_or(aggregate.config.as_str())
                .to_string(),
            GroupBy::Pattern(re) => re
                .captures(&aggregate.config)
                .and_then(|caps| caps.get(1).or_else(|| caps.get(0)))
                .map_or_else(|| aggregate.config.clone(), |m| m.as_str().to_string()),
            GroupBy::Custom(f) => f(aggregate),
        }
    }
}

impl fmt::Debug for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupBy::Config => write!(f, "Config"),
            GroupBy::All => write!(f, "All"),
            GroupBy::Prefix(sep) => write!(f, "Prefix({:?})", sep),
            GroupBy::Pattern(re) => write!(f, "Pattern({:?})", re.as_str()),
            GroupBy::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

impl FromStr for GroupBy {
    type Err = String;

    /// `config`, `all`, `prefix:<separator>` or `regex:<pattern>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some(("prefix", sep)) if !sep.is_empty() => Ok(GroupBy::Prefix(sep.to_string())),
            Some(("regex", pattern)) => Regex::new(pattern)
                .map(GroupBy::Pattern)
                .map_err(|e| format!("invalid grouping pattern: {}", e)),
            None if s == "config" => Ok(GroupBy::Config),
            None if s == "all" => Ok(GroupBy::All),
            _ => Err(format!(
                "unknown grouping '{}', expected config, all, prefix:<sep> or regex:<pattern>",
                s
            )),
        }
    }
}

// ============================================================================
// WEIGHTING
// ============================================================================

/// Boltzmann-weighted interaction energies of one group, in kJ/mol.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedEnsembleResult {
    pub group: String,
    pub electrostatics: f64,
    pub dispersion: f64,
    /// `None` for groups with fewer than two configurations.
    pub electro_ci: Option<f64>,
    pub dispersion_ci: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
pub struct BoltzmannWeighter {
    pub temperature: f64,
}

impl Default for BoltzmannWeighter {
    fn default() -> Self {
        Self { temperature: ROOM_TEMPERATURE }
    }
}

impl BoltzmannWeighter {
    /// Occupation probabilities for energies given in Hartree. Energies are
    /// taken relative to the lowest so the most stable configuration has an
    /// unnormalised weight of exactly one.
    pub fn probabilities(&self, energies: &DVector<f64>) -> DVector<f64> {
        let kj = energies * HARTREE_TO_KJ_MOL;
        let rt = GAS_CONSTANT * self.temperature;
        let weights = relative(&kj).map(|de| (-de * 1000.0 / rt).exp());
        let total = weights.sum();
        weights / total
    }

    pub fn weight(&self, aggregates: &[ConfigAggregate], group_by: &GroupBy) -> Vec<WeightedEnsembleResult> {
        let mut groups: BTreeMap<String, Vec<&ConfigAggregate>> = BTreeMap::new();
        for aggregate in aggregates {
            groups.entry(group_by.key(aggregate)).or_default().push(aggregate);
        }

        groups
            .into_iter()
            .map(|(group, members)| self.weigh_group(group, &members))
            .collect()
    }

    fn weigh_group(&self, group: String, members: &[&ConfigAggregate]) -> WeightedEnsembleResult {
        let energies = DVector::from_iterator(members.len(), members.iter().map(|a| a.complex_total_energy()));
        let probabilities = self.probabilities(&energies);

        let hf_weighted: Vec<f64> = members
            .iter()
            .zip(probabilities.iter())
            .map(|(a, p)| a.hf_int_kj * p)
            .collect();
        let corr_weighted: Vec<f64> = members
            .iter()
            .zip(probabilities.iter())
            .map(|(a, p)| a.corr_int_kj * p)
            .collect();

        WeightedEnsembleResult {
            group,
            electrostatics: hf_weighted.iter().sum(),
            dispersion: corr_weighted.iter().sum(),
            electro_ci: confidence_95(&hf_weighted),
            dispersion_ci: confidence_95(&corr_weighted),
        }
    }
}
