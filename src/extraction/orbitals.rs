use crate::core::error::ExtractionError;
use lazy_static::lazy_static;
use regex::Regex;

/// Hartree to electron-volt factor used for reported gaps.
pub const HARTREE_TO_EV: f64 = 27.21;

lazy_static! {
    /// A row of one to five orbital energies and nothing else.
    static ref RE_EIGENVALUE_ROW: Regex = Regex::new(r"^(\s+-?[0-9]+\.[0-9]+){1,5}$").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    HomoLumo,
    SomoLumo,
}

impl Transition {
    pub fn label(&self) -> &'static str {
        match self {
            Transition::HomoLumo => "HOMO-LUMO",
            Transition::SomoLumo => "SOMO-LUMO",
        }
    }
}

/// Frontier-orbital energies of one log, in Hartree unless noted.
#[derive(Debug, Clone, PartialEq)]
pub struct GapReport {
    pub file: String,
    pub path: String,
    pub multiplicity: u32,
    pub transition: Transition,
    pub homo: f64,
    pub lumo: f64,
    pub gap_hartree: f64,
    pub gap_ev: f64,
}

pub struct OrbitalAnalyzer<'a> {
    file: &'a str,
}

impl<'a> OrbitalAnalyzer<'a> {
    pub fn new(file: &'a str) -> Self {
        Self { file }
    }

    /// `(homo_or_somo, lumo, gap_eV)` for the given spin state.
    pub fn gap<'l, I>(&self, lines: I, multiplicity: u32, occupied: usize) -> Result<(f64, f64, f64), ExtractionError>
    where
        I: IntoIterator<Item = &'l str>,
    {
        let (homo, lumo) = match multiplicity {
            1 => self.closed_shell(lines, occupied)?,
            2 => return Err(ExtractionError::OpenShellGap { file: self.file.to_string() }),
            other => {
                return Err(ExtractionError::UnsupportedMultiplicity {
                    file: self.file.to_string(),
                    multiplicity: other,
                })
            }
        };
        Ok((homo, lumo, (lumo - homo) * HARTREE_TO_EV))
    }

    /// Reads multiplicity and occupation from the log itself and builds the
    /// full report.
    pub fn report<'l, I>(&self, lines: I, path: &str) -> Result<GapReport, ExtractionError>
    where
        I: IntoIterator<Item = &'l str> + Clone,
    {
        let multiplicity = multiplicity(lines.clone())
            .ok_or_else(|| ExtractionError::MissingMultiplicity { file: self.file.to_string() })?;
        let transition = match multiplicity {
            2 => Transition::SomoLumo,
            _ => Transition::HomoLumo,
        };
        let occupied = match multiplicity {
            1 => occupied_orbitals(lines.clone())
                .ok_or_else(|| ExtractionError::MissingOccupancy { file: self.file.to_string() })?,
            // rejected by `gap` before the count is used
            _ => 0,
        };
        let (homo, lumo, gap_ev) = self.gap(lines, multiplicity, occupied)?;

        Ok(GapReport {
            file: self.file.to_string(),
            path: path.to_string(),
            multiplicity,
            transition,
            homo,
            lumo,
            gap_hartree: lumo - homo,
            gap_ev,
        })
    }

    fn closed_shell<'l, I>(&self, lines: I, occupied: usize) -> Result<(f64, f64), ExtractionError>
    where
        I: IntoIterator<Item = &'l str>,
    {
        let mut found = false;
        let mut energies: Vec<f64> = Vec::new();

        for line in lines {
            if line.contains("EIGENVECTORS") {
                found = true;
            }
            if line.contains("CPU") {
                found = false;
            }
            if found && RE_EIGENVALUE_ROW.is_match(line) {
                energies.extend(line.split_whitespace().filter_map(|t| t.parse::<f64>().ok()));
                if energies.len() > occupied + 1 {
                    break;
                }
            }
        }

        if occupied == 0 || energies.len() <= occupied {
            return Err(ExtractionError::MissingOrbitals {
                file: self.file.to_string(),
                needed: occupied + 1,
                found: energies.len(),
            });
        }
        Ok((energies[occupied - 1], energies[occupied]))
    }
}

/// Last token of the first `SPIN MULTIPLICITY` line.
pub fn multiplicity<'a, I>(lines: I) -> Option<u32>
where
    I: IntoIterator<Item = &'a str>,
{
    lines
        .into_iter()
        .find(|line| line.contains("SPIN MULTIPLICITY"))
        .and_then(|line| line.split_whitespace().next_back()?.parse().ok())
}

/// Number of doubly occupied orbitals from `N ORBITALS ARE OCCUPIED`.
pub fn occupied_orbitals<'a, I>(lines: I) -> Option<usize>
where
    I: IntoIterator<Item = &'a str>,
{
    lines
        .into_iter()
        .find(|line| line.contains("ORBITALS ARE OCCUPIED"))
        .and_then(|line| line.split_whitespace().next()?.parse().ok())
}
