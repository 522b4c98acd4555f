//! Pull-test tests - log import, analysis and `modqc pull`

mod common;

use common::{modqc, pull_log, stderr_text, write_directory, BARE_SERIAL};
use modqc::core::pulltest::{analyze, PullCriteria};
use modqc::entities::pull_test::Zone;
use modqc::import::parse_pull_log;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn strong_wires(count: usize) -> Vec<(f64, f64)> {
    vec![(2.0, 10.0); count]
}

#[test]
fn test_log_to_result() {
    let mut wires = strong_wires(20);
    wires[4] = (6.0, 9.5); // exempt wire inside the first zone
    let text = pull_log(&wires);
    let rows = parse_pull_log(text.as_bytes(), Path::new("pull.csv")).unwrap();
    assert_eq!(rows.len(), 20);

    let result = analyze(&rows, &PullCriteria::default()).unwrap();
    assert_eq!(result.stats.number_of_wires, 20);
    assert_eq!(result.stats.percentage_2, 95.0);
    assert_eq!(result.wires[4].grade, 5);
    // One exemption shrinks the first zone to nine wires
    assert_eq!(result.wires[8].location, Zone::First);
    assert_eq!(result.wires[9].location, Zone::Second);
    assert_eq!(result.wires[14].location, Zone::Third);
    assert_eq!(result.pass_fail(), vec![true, true, true, true]);
}

#[test]
fn test_custom_criteria() {
    let text = pull_log(&strong_wires(10));
    let rows = parse_pull_log(text.as_bytes(), Path::new("pull.csv")).unwrap();
    let strict = PullCriteria {
        min_mean: 12.0,
        ..PullCriteria::default()
    };
    let result = analyze(&rows, &strict).unwrap();
    assert_eq!(result.pass_fail(), vec![false, true, true, true]);
}

#[test]
fn test_pull_command_table_output() {
    let tmp = TempDir::new().unwrap();
    let log = tmp.path().join("pull.csv");
    std::fs::write(&log, pull_log(&strong_wires(20))).unwrap();

    modqc()
        .current_dir(tmp.path())
        .arg("pull")
        .arg(&log)
        .assert()
        .success()
        .stdout(predicate::str::contains("mean_pull"))
        .stdout(predicate::str::contains("(2, 1) (2, 1) (2, 1) (2, 1) (2, 1)"))
        .stdout(predicate::str::contains("All 4 check(s) passed"));
}

#[test]
fn test_pull_command_yaml_output() {
    let tmp = TempDir::new().unwrap();
    let log = tmp.path().join("pull.csv");
    let mut wires = strong_wires(19);
    wires.push((4.0, 4.5));
    std::fs::write(&log, pull_log(&wires)).unwrap();

    modqc()
        .current_dir(tmp.path())
        .args(["--format", "yaml", "pull"])
        .arg(&log)
        .assert()
        .success()
        .stdout(predicate::str::contains("before5g_wires: 1"))
        .stdout(predicate::str::contains("number_of_wires: 20"));
}

#[test]
fn test_pull_command_strict_failure() {
    let tmp = TempDir::new().unwrap();
    let log = tmp.path().join("pull.csv");
    std::fs::write(&log, pull_log(&vec![(2.0, 7.0); 20])).unwrap();

    modqc()
        .current_dir(tmp.path())
        .args(["pull", "--strict"])
        .arg(&log)
        .assert()
        .code(2);
}

#[test]
fn test_pull_command_single_wire_fails() {
    let tmp = TempDir::new().unwrap();
    let log = tmp.path().join("pull.csv");
    std::fs::write(&log, pull_log(&strong_wires(1))).unwrap();

    let output = modqc()
        .current_dir(tmp.path())
        .arg("pull")
        .arg(&log)
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(stderr_text(&output).contains("at least 2 wires"));
}

#[test]
fn test_pull_command_config_criteria() {
    let tmp = TempDir::new().unwrap();
    std::fs::create_dir_all(tmp.path().join(".modqc")).unwrap();
    std::fs::write(
        tmp.path().join(".modqc/config.yaml"),
        "pull_test:\n  min_mean: 12.0\n",
    )
    .unwrap();
    let log = tmp.path().join("pull.csv");
    std::fs::write(&log, pull_log(&strong_wires(20))).unwrap();

    modqc()
        .current_dir(tmp.path())
        .arg("pull")
        .arg(&log)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 of 4 check(s) failed"));
}

#[test]
fn test_pull_report_has_no_mass() {
    let tmp = TempDir::new().unwrap();
    let db = write_directory(tmp.path());
    let log = tmp.path().join("pull.csv");
    std::fs::write(&log, pull_log(&strong_wires(20))).unwrap();

    let output = modqc()
        .current_dir(tmp.path())
        .args(["--format", "json", "pull", "--component", BARE_SERIAL])
        .arg(&log)
        .arg("--db")
        .arg(&db)
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["component_id"], BARE_SERIAL);
    assert_eq!(json["outcome"]["kind"], "pull_test");
    assert_eq!(json["outcome"]["stats"]["mean_pull"], 10.0);
    assert!(json.get("mass").is_none());
}
