use approx::assert_relative_eq;
use gamess_interaction::{
    apply_boltzmann_weightings, calculate_interaction_energies, extract_directory, table, Diagnosis,
    ExtractionError, GroupBy, PipelineConfig, TableError,
};
use std::fs;
use std::path::Path;

fn fmo_mp2_log(hf: f64, corr_total: f64) -> String {
    format!(
        "\
 $CONTRL SCFTYP=RHF RUNTYP=ENERGY $END
 $FMO NBODY=2 $END
 $MP2 MPLEVL=2 $END
 INPUT CARD> $BASIS GBASIS=CCD $END
 SPIN MULTIPLICITY = 1
 RUN TITLE
 ---------
 Euncorr HF(2)= {:.6}
 E corr MP2(2)= {:.6}
 EXECUTION OF GAMESS TERMINATED NORMALLY
",
        hf, corr_total
    )
}

const TRUNCATED_LOG: &str = "\
 $CONTRL SCFTYP=RHF RUNTYP=ENERGY $END
 $FMO NBODY=2 $END
 $MP2 MPLEVL=2 $END
 RUN TITLE
 ---------
 ITER   1  ENERGY
";

const TABLE: &str = "\
 COORDINATES OF ALL ATOMS ARE (ANGS)
   ATOM   CHARGE       X              Y              Z
 ------------------------------------------------------------
 O           8.0   0.0000000000   0.0000000000   0.1170000000
 H           1.0   0.0000000000   0.7570000000  -0.4690000000
 H           1.0   0.0000000000  -0.7570000000  -0.4690000000

";

fn write_log(root: &Path, relative: &str, body: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

fn full_window() -> PipelineConfig {
    PipelineConfig {
        tail_fraction: 1.0,
        completion_fraction: 1.0,
        ..PipelineConfig::default()
    }
}

#[test]
fn test_extract_aggregate_and_weight() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("runs");
    write_log(&root, "c1/spec/c1.log", &fmo_mp2_log(-100.0, -100.4));
    write_log(&root, "c1/frag1/spec/frag1.log", &fmo_mp2_log(-49.0, -49.15));
    write_log(&root, "c1/frag2/spec/frag2.log", &fmo_mp2_log(-50.9, -51.1));
    write_log(&root, "c2/spec/c2.log", TRUNCATED_LOG);

    let config = full_window();
    let report = extract_directory(&root, &config).unwrap();

    // the broken log is reported, the rest of the batch survives
    assert_eq!(report.records.len(), 3);
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(report.failures[0], ExtractionError::MissingEnergy { .. }));
    assert_eq!(report.diagnoses.len(), 1);
    assert_eq!(report.diagnoses[0].1, Diagnosis::Incomplete);

    let paths: Vec<&str> = report.records.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(paths, vec!["c1/frag1/spec", "c1/frag2/spec", "c1/spec"]);
    assert!(report.records.iter().all(|r| r.basis.as_deref() == Some("cc-pVDZ")));

    let records_csv = dir.path().join("records.csv");
    table::write_records_to_path(&records_csv, &report.records).unwrap();

    let aggregation = calculate_interaction_energies(&records_csv, &config).unwrap();
    assert!(aggregation.warnings.is_empty());
    assert_eq!(aggregation.rows.len(), 1);
    let c1 = &aggregation.rows[0];
    assert_eq!(c1.config, "c1");
    assert_eq!(c1.hf_ionic, None);
    assert_relative_eq!(c1.hf_int_kj, -0.1 * 2625.5, epsilon = 1e-6);
    assert_relative_eq!(c1.corr_int_kj, -0.05 * 2625.5, epsilon = 1e-6);
    assert_relative_eq!(c1.total_int_kj, -0.15 * 2625.5, epsilon = 1e-6);

    let aggregates_csv = dir.path().join("interaction.csv");
    table::write_aggregates_to_path(&aggregates_csv, &aggregation.rows).unwrap();

    let ensembles = apply_boltzmann_weightings(&aggregates_csv, &GroupBy::All).unwrap();
    assert_eq!(ensembles.len(), 1);
    assert_eq!(ensembles[0].group, "all");
    assert_relative_eq!(ensembles[0].electrostatics, c1.hf_int_kj, epsilon = 1e-6);
    assert_relative_eq!(ensembles[0].dispersion, c1.corr_int_kj, epsilon = 1e-6);
    assert_eq!(ensembles[0].electro_ci, None);

    let ensemble_csv = dir.path().join("boltzmann.csv");
    table::write_ensembles_to_path(&ensemble_csv, &ensembles).unwrap();
    let written = fs::read_to_string(&ensemble_csv).unwrap();
    assert!(written.starts_with("Groups,Electrostatics,Dispersion,Electro_CI,Dispersion_CI\n"));
    assert!(written.contains(",NA,NA"));
}

#[test]
fn test_ionic_references_are_subtracted() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_log(root, "c1/spec/c1.log", &fmo_mp2_log(-100.0, -100.0));
    write_log(root, "c1/ionic/spec/ionic.log", &fmo_mp2_log(-40.0, -40.0));
    write_log(root, "c1/frag1/spec/frag1.log", &fmo_mp2_log(-30.0, -30.0));
    write_log(root, "c1/frag2/spec/frag2.log", &fmo_mp2_log(-29.0, -29.0));

    let config = PipelineConfig { ionic_present: true, ..full_window() };
    let report = extract_directory(root, &config).unwrap();
    assert!(report.failures.is_empty());

    let aggregation = config.aggregator().aggregate_records(&report.records);
    let c1 = &aggregation.rows[0];
    assert_eq!(c1.hf_ionic, Some(-40.0));
    assert_relative_eq!(c1.hf_int_kj, -2625.5, epsilon = 1e-6);
    assert_relative_eq!(c1.corr_int_kj, 0.0, epsilon = 1e-9);
}

#[test]
fn test_geometries_are_written_for_optimisations() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let converged = converged_optimisation();
    let interrupted = format!(" $CONTRL RUNTYP=OPTIMIZE $END\n RUN TITLE\n{} TOTAL ENERGY =  -76.01\n", TABLE);
    write_log(root, "water/opt/water.log", &converged);
    write_log(root, "ice/opt/ice.log", &interrupted);
    write_log(root, "empty/opt/empty.log", " $CONTRL RUNTYP=OPTIMIZE $END\n RUN TITLE\n TOTAL ENERGY = -1.0\n");

    let config = PipelineConfig { write_geometries: true, ..full_window() };
    let report = extract_directory(root, &config).unwrap();

    let equil = root.join("water").join("spec").join("water_equil.xyz");
    let xyz = fs::read_to_string(&equil).unwrap();
    assert_eq!(xyz.lines().next(), Some("3"));
    assert_eq!(xyz.lines().count(), 5);

    let rerun = root.join("ice").join("opt").join("rerun").join("rerun.xyz");
    assert!(rerun.is_file());
    assert_eq!(report.resubmissions().len(), 1);
    assert!(report
        .diagnoses
        .iter()
        .any(|(path, d)| path.ends_with("ice/opt/ice.log") && *d == Diagnosis::NeedsRerun));

    // energies are still extracted from every log
    assert_eq!(report.records.len(), 3);
    assert!(report
        .failures
        .iter()
        .any(|e| matches!(e, ExtractionError::NoIterations { file } if file == "empty.log")));
}

fn converged_optimisation() -> String {
    format!(
        " $CONTRL RUNTYP=OPTIMIZE $END\n RUN TITLE\n{}      ***** EQUILIBRIUM GEOMETRY LOCATED *****\n{} TOTAL ENERGY =  -76.02\n EXECUTION OF GAMESS TERMINATED NORMALLY\n",
        TABLE, TABLE
    )
}

#[test]
fn test_geometry_destination_ignores_stage_names_above_root() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("spec").join("runs");
    write_log(&root, "water/opt/water.log", &converged_optimisation());

    let config = PipelineConfig { write_geometries: true, ..full_window() };
    let report = extract_directory(&root, &config).unwrap();
    assert!(report.failures.is_empty());

    let expected = root.join("water").join("spec").join("water_equil.xyz");
    assert_eq!(report.geometries[0].destination, expected);
    assert!(expected.is_file());
    assert!(!dir.path().join("spec").join("water_equil.xyz").exists());
}

#[test]
fn test_failed_geometry_write_does_not_abort_batch() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_log(root, "water/opt/water.log", &converged_optimisation());
    write_log(root, "ice/opt/ice.log", &converged_optimisation());
    // a regular file where the output directory should go
    fs::write(root.join("water").join("spec"), "blocked").unwrap();

    let config = PipelineConfig { write_geometries: true, ..full_window() };
    let report = extract_directory(root, &config).unwrap();

    assert_eq!(report.records.len(), 2);
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(
        &report.failures[0],
        ExtractionError::Write { path, .. } if path.ends_with("water/spec/water_equil.xyz")
    ));
    assert_eq!(report.geometries.len(), 1);
    assert!(root.join("ice").join("spec").join("ice_equil.xyz").is_file());
}

#[test]
fn test_aggregate_table_is_not_accepted_as_raw_input() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("runs");
    write_log(&root, "c1/spec/c1.log", &fmo_mp2_log(-10.0, -10.2));
    write_log(&root, "c1/frag1/spec/frag1.log", &fmo_mp2_log(-9.9, -10.0));

    let config = full_window();
    let report = extract_directory(&root, &config).unwrap();
    let aggregation = config.aggregator().aggregate_records(&report.records);

    let aggregates_csv = dir.path().join("interaction.csv");
    table::write_aggregates_to_path(&aggregates_csv, &aggregation.rows).unwrap();

    let err = calculate_interaction_energies(&aggregates_csv, &config).unwrap_err();
    let table_err = err.downcast_ref::<TableError>().expect("expected a table error");
    assert!(matches!(table_err, TableError::MissingColumn { column: "Path", .. }));
}

#[test]
fn test_gap_table_from_directory() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let water = "\
 $CONTRL SCFTYP=RHF RUNTYP=ENERGY $END
 SPIN MULTIPLICITY = 1
     5 ORBITALS ARE OCCUPIED
 RUN TITLE
          EIGENVECTORS

                      1          2          3          4          5
                  -20.5584    -1.3398    -0.6999    -0.5665    -0.4932
                    A          A          A          A          A

                      6          7
                    0.2106     0.3045
 STEP CPU TIME =     0.05
 TOTAL ENERGY =  -76.02
";
    write_log(root, "water/spec/water.log", water);
    write_log(root, "radical/spec/radical.log", " SPIN MULTIPLICITY = 2\n RUN TITLE\n TOTAL ENERGY = -1.0\n");

    let config = PipelineConfig { collect_gaps: true, ..full_window() };
    let report = extract_directory(root, &config).unwrap();
    assert_eq!(report.gaps.len(), 1);
    assert_relative_eq!(report.gaps[0].gap_ev, (0.2106 + 0.4932) * 27.21, epsilon = 1e-9);
    assert!(report
        .failures
        .iter()
        .any(|e| matches!(e, ExtractionError::OpenShellGap { .. })));

    let gaps_csv = root.join("gaps.csv");
    table::write_gaps_to_path(&gaps_csv, &report.gaps).unwrap();
    let written = fs::read_to_string(&gaps_csv).unwrap();
    assert!(written.contains("water.log,water/spec,1,HOMO-LUMO"));
}
