use crate::core::record::{EnergyModel, RunType};

/// Header markers observed before `RUN TITLE`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ModelFlags {
    fmo: bool,
    mp2: bool,
    scs: bool,
    dft: bool,
}

impl ModelFlags {
    fn observe(mut self, line: &str) -> Self {
        self.fmo |= line.contains("FMO");
        self.mp2 |= line.contains("MPLEVL");
        self.scs |= line.contains("SCS");
        self.dft |= line.contains("DFT");
        self
    }

    /// Most specific combination first: FMO-SCS implies FMO-MP2 implies FMO.
    fn resolve(self) -> EnergyModel {
        match self {
            ModelFlags { fmo: true, scs: true, .. } => EnergyModel::FmoScs,
            ModelFlags { fmo: true, mp2: true, .. } => EnergyModel::FmoMp2,
            ModelFlags { fmo: true, dft: true, .. } => EnergyModel::FmoDft,
            ModelFlags { fmo: true, .. } => EnergyModel::FmoHf,
            ModelFlags { scs: true, .. } => EnergyModel::Scs,
            ModelFlags { mp2: true, .. } => EnergyModel::Mp2,
            ModelFlags { dft: true, .. } => EnergyModel::Dft,
            _ => EnergyModel::Hf,
        }
    }
}

/// Determines run type and energy model from the raw log text.
pub struct RunClassifier;

impl RunClassifier {
    pub fn classify<'a, I>(lines: I) -> (RunType, EnergyModel)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut run_type = None;
        let mut flags = ModelFlags::default();
        let mut in_header = true;

        for line in lines {
            if run_type.is_none() {
                run_type = Self::run_type_token(line);
            }
            if in_header {
                if line.contains("RUN TITLE") {
                    in_header = false;
                } else {
                    flags = flags.observe(line);
                }
            }
            if !in_header && run_type.is_some() {
                break;
            }
        }

        (run_type.unwrap_or(RunType::Unknown), flags.resolve())
    }

    pub fn run_type<'a, I>(lines: I) -> RunType
    where
        I: IntoIterator<Item = &'a str>,
    {
        lines
            .into_iter()
            .find_map(Self::run_type_token)
            .unwrap_or(RunType::Unknown)
    }

    /// `RUNTYP=OPTIMIZE` anywhere on the line, matched case-insensitively.
    fn run_type_token(line: &str) -> Option<RunType> {
        if !line.to_uppercase().contains("RUNTYP=") {
            return None;
        }
        line.split_whitespace()
            .find(|token| token.to_uppercase().starts_with("RUNTYP="))
            .and_then(|token| token.split_once('='))
            .map(|(_, value)| RunType::from_token(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::lines::LogText;

    fn classify(text: &str) -> (RunType, EnergyModel) {
        let log = LogText::from_text(text);
        RunClassifier::classify(log.lines())
    }

    #[test]
    fn fmo_with_scs_is_fmo_scs() {
        let text = " $FMO NBODY=2 $END\n $MP2 SCSPT=SCS $END\n MPLEVL=2\n RUN TITLE\n";
        assert_eq!(classify(text).1, EnergyModel::FmoScs);
    }

    #[test]
    fn priority_order_of_models() {
        assert_eq!(classify(" FMO\n MPLEVL=2\n RUN TITLE\n").1, EnergyModel::FmoMp2);
        assert_eq!(classify(" FMO\n DFTTYP=B3LYP\n RUN TITLE\n").1, EnergyModel::FmoDft);
        assert_eq!(classify(" FMO\n RUN TITLE\n").1, EnergyModel::FmoHf);
        assert_eq!(classify(" MPLEVL=2 SCS\n RUN TITLE\n").1, EnergyModel::Scs);
        assert_eq!(classify(" MPLEVL=2\n RUN TITLE\n").1, EnergyModel::Mp2);
        assert_eq!(classify(" DFTTYP=M062X\n RUN TITLE\n").1, EnergyModel::Dft);
        assert_eq!(classify(" SCFTYP=RHF\n RUN TITLE\n").1, EnergyModel::Hf);
    }

    #[test]
    fn markers_after_run_title_are_ignored() {
        let text = " SCFTYP=RHF RUNTYP=ENERGY\n RUN TITLE\n MPLEVL=2 printed in a summary\n FMO\n";
        assert_eq!(classify(text), (RunType::Energy, EnergyModel::Hf));
    }

    #[test]
    fn run_type_is_first_token_lowercased() {
        let text = " $contrl runtyp=Optimize $end\n RUNTYP=ENERGY\n RUN TITLE\n";
        assert_eq!(classify(text).0, RunType::Optimize);
    }

    #[test]
    fn run_type_after_header_is_still_found() {
        let text = " RUN TITLE\n SCFTYP=RHF          RUNTYP=HESSIAN\n";
        assert_eq!(classify(text).0, RunType::Hessian);
    }

    #[test]
    fn missing_run_type_is_unknown() {
        assert_eq!(classify(" nothing here\n").0, RunType::Unknown);
    }

    #[test]
    fn run_type_helper_agrees_with_classify() {
        let text = " RUNTYP=ENERGY\n FMO MPLEVL=2\n RUN TITLE\n";
        let log = LogText::from_text(text);
        assert_eq!(RunClassifier::run_type(log.lines()), classify(text).0);
    }
}
