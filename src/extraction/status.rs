use crate::core::record::RunType;
use crate::io::lines::LogText;

const NORMAL_TERMINATION: &str = "EXECUTION OF GAMESS TERMINATED NORMALLY";

/// Outcome of a finished or interrupted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagnosis {
    Completed,
    /// Optimisation stopped before convergence; resubmit from `rerun.xyz`.
    NeedsRerun,
    /// Optimisation that converged but was cut off, usually a memory
    /// allocation problem.
    ProbableMemoryError,
    /// Any other run that stopped before normal termination.
    Incomplete,
}

impl Diagnosis {
    pub fn message(&self) -> &'static str {
        match self {
            Diagnosis::Completed => "terminated normally",
            Diagnosis::NeedsRerun => "no equilibrium geometry found, resubmit with rerun.xyz",
            Diagnosis::ProbableMemoryError => "memory error, check allocation before resubmitting",
            Diagnosis::Incomplete => "did not terminate normally",
        }
    }
}

/// Normal termination is printed in the last few lines only.
pub fn completed(log: &LogText, fraction: f64) -> bool {
    log.tail(fraction).any(|line| line.contains(NORMAL_TERMINATION))
}

pub fn diagnose(log: &LogText, run_type: RunType, fraction: f64) -> Diagnosis {
    if completed(log, fraction) {
        Diagnosis::Completed
    } else if !run_type.is_optimisation() {
        Diagnosis::Incomplete
    } else if log.lines().any(|line| line.contains("EQUILIBRIUM GEOMETRY LOCATED")) {
        Diagnosis::ProbableMemoryError
    } else {
        Diagnosis::NeedsRerun
    }
}

/// FMO many-body level from `NBODY=`; 0 when the run is not FMO.
pub fn fmo_level(log: &LogText) -> u8 {
    log.lines()
        .find(|line| line.contains("NBODY"))
        .and_then(|line| {
            line.split_whitespace()
                .find(|token| token.contains("NBODY"))?
                .rsplit('=')
                .next()?
                .parse()
                .ok()
        })
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_termination_in_tail() {
        let log = LogText::from_text(" work\n work\n EXECUTION OF GAMESS TERMINATED NORMALLY\n");
        assert!(completed(&log, 0.1));
        assert_eq!(diagnose(&log, RunType::Energy, 0.1), Diagnosis::Completed);
    }

    #[test]
    fn unconverged_optimisation_needs_rerun() {
        let log = LogText::from_text(" NSERCH:   3\n COORDINATES OF ALL ATOMS ARE (ANGS)\n");
        assert_eq!(diagnose(&log, RunType::Optimize, 0.1), Diagnosis::NeedsRerun);
        assert_eq!(diagnose(&log, RunType::Energy, 0.1), Diagnosis::Incomplete);
    }

    #[test]
    fn converged_but_cut_off_is_memory() {
        let log = LogText::from_text(" EQUILIBRIUM GEOMETRY LOCATED\n DDI Process 0: error\n");
        assert_eq!(diagnose(&log, RunType::Optimize, 0.1), Diagnosis::ProbableMemoryError);
    }

    #[test]
    fn interrupted_single_points_and_hessians_are_incomplete() {
        let log = LogText::from_text(" EQUILIBRIUM GEOMETRY LOCATED\n ITER 12\n");
        assert_eq!(diagnose(&log, RunType::Energy, 0.1), Diagnosis::Incomplete);
        assert_eq!(diagnose(&log, RunType::Hessian, 0.1), Diagnosis::Incomplete);
        assert_eq!(diagnose(&log, RunType::Unknown, 0.1), Diagnosis::Incomplete);
    }

    #[test]
    fn fmo_level_from_nbody() {
        assert_eq!(fmo_level(&LogText::from_text(" $FMO NBODY=3\n")), 3);
        assert_eq!(fmo_level(&LogText::from_text(" $FMO NBODY=2 $END\n")), 2);
        assert_eq!(fmo_level(&LogText::from_text(" SCFTYP=RHF\n")), 0);
    }
}
