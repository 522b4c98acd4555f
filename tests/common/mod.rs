//! Shared test helpers for integration tests
//!
//! Synthetic scans place a handful of probe points inside every calibrated
//! region and pad the rest of the scan with points at the origin, which no
//! region accepts.

#![allow(dead_code)]

use assert_cmd::cargo;
use assert_cmd::Command;
use modqc::core::{MeasurementRow, SummaryRow};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Home directory with no global config in it
pub fn empty_home() -> PathBuf {
    let home = Path::new(env!("CARGO_TARGET_TMPDIR")).join("empty-home");
    std::fs::create_dir_all(&home).unwrap();
    home
}

/// Helper to get a modqc command isolated from the user's environment
pub fn modqc() -> Command {
    let home = empty_home();
    let mut cmd = Command::new(cargo::cargo_bin!("modqc"));
    cmd.env("HOME", &home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("APPDATA", &home)
        .env_remove("MODQC_FORMAT")
        .env_remove("MODQC_LOG")
        .env_remove("MODQC_TOKEN");
    cmd
}

pub const BARE_SERIAL: &str = "20UPGB42000001";
pub const ASSEMBLED_SERIAL: &str = "20UPGM24220370";
pub const FLEX_SERIAL: &str = "20UPGPQ2110001";

fn padded(len: usize, placed: &[(usize, (f64, f64, f64))]) -> Vec<MeasurementRow> {
    let mut rows = vec![MeasurementRow::new(0.0, 0.0, 0.0); len];
    for (index, point) in placed {
        rows[*index] = MeasurementRow::from(*point);
    }
    rows
}

fn cluster(start: usize, point: (f64, f64, f64)) -> Vec<(usize, (f64, f64, f64))> {
    (start..start + 5).map(|i| (i, point)).collect()
}

/// Bare module scan: five points in each sensor and front-end region
pub fn bare_scan() -> Vec<MeasurementRow> {
    let mut placed = Vec::new();
    placed.extend(cluster(10, (140.0, 150.0, 0.5)));
    placed.extend(cluster(20, (147.0, 140.0, 0.5)));
    placed.extend(cluster(30, (120.0, 160.5, 0.5)));
    placed.extend(cluster(40, (170.0, 140.0, 0.65)));
    placed.extend(cluster(50, (130.0, 170.0, 0.65)));
    placed.extend(cluster(60, (145.0, 185.0, 0.65)));
    padded(100, &placed)
}

/// Bare module summary trailer with the given sensor x dimension
pub fn bare_summary(sensor_x: f64) -> Vec<SummaryRow> {
    vec![
        vec![1.0, 2.0, 3.0],
        vec![sensor_x],
        vec![41.1],
        vec![42.2],
        vec![40.3],
        vec![0.0],
        vec![0.150],
        vec![0.0],
        vec![0.330],
    ]
}

/// Flex scan of 1300 rows; quadrant points sit inside their scan windows
pub fn flex_scan() -> Vec<MeasurementRow> {
    let mut placed = Vec::new();
    placed.extend(cluster(1000, (160.0, 100.0, 0.25)));
    placed.extend(cluster(700, (150.0, 100.0, 0.25)));
    placed.extend(cluster(400, (135.0, 160.0, 0.25)));
    placed.extend(cluster(30, (147.0, 100.0, 0.25)));
    placed.extend(cluster(800, (100.0, 185.0, 1.0)));
    placed.extend(cluster(420, (150.0, 185.0, 1.0)));
    placed.extend(cluster(440, (140.0, 140.0, 1.0)));
    padded(1300, &placed)
}

/// Flex summary trailer with the given HV-capacitor height
pub fn flex_summary(hv: f64) -> Vec<SummaryRow> {
    vec![
        vec![1.0, 2.0, 3.0],
        vec![0.0, 0.0, hv],
        vec![0.0, 0.0, 1.10],
        vec![0.0, 0.0, 1.20],
        vec![0.0, 0.0, 1.64],
        vec![0.0, 0.0, 0.25],
        vec![0.0, 0.0, 0.26],
        vec![0.0, 0.0, 0.24],
        vec![0.0, 0.0, 0.25],
        vec![0.0],
        vec![0.0],
        vec![0.0],
        vec![39.6],
        vec![40.6],
    ]
}

/// Assembled module scan: pickup areas and sensor references
pub fn assembled_scan() -> Vec<MeasurementRow> {
    let mut placed = Vec::new();
    placed.extend(cluster(10, (137.0, 160.0, 0.70)));
    placed.extend(cluster(20, (149.0, 150.0, 0.70)));
    placed.extend(cluster(30, (160.0, 160.0, 0.70)));
    placed.extend(cluster(40, (147.5, 173.0, 0.70)));
    placed.extend(cluster(50, (125.0, 150.0, 0.2)));
    placed.extend(cluster(60, (140.0, 137.0, 0.2)));
    placed.extend(cluster(70, (150.0, 185.0, 0.2)));
    padded(100, &placed)
}

/// Assembled module summary, ending with a stray two-value row
pub fn assembled_summary(fiducial_br: (f64, f64)) -> Vec<SummaryRow> {
    vec![
        vec![1.0, 2.0, 3.0],
        vec![0.0, 0.0, 0.70],
        vec![0.0, 0.0, 0.71],
        vec![0.0, 0.0, 0.72],
        vec![0.0, 0.0, 0.69],
        vec![0.0],
        vec![0.0],
        vec![0.0],
        vec![0.0],
        vec![39.6],
        vec![12.0, 41.1],
        vec![0.0],
        vec![2.2, 0.7],
        vec![fiducial_br.0, fiducial_br.1],
        vec![2.3],
        vec![2.0],
        vec![1.0, 2.0],
    ]
}

/// Write scan rows as whitespace-separated `.DAT` text with a header line
pub fn write_scan(dir: &Path, name: &str, rows: &[MeasurementRow]) -> PathBuf {
    let mut text = String::from("X Y Z\n");
    for r in rows {
        text.push_str(&format!("{} {} {}\n", r.x, r.y, r.z));
    }
    let path = dir.join(name);
    std::fs::write(&path, text).unwrap();
    path
}

/// Write summary rows as comma-separated `.STA` text with a title line
pub fn write_summary(dir: &Path, name: &str, rows: &[SummaryRow]) -> PathBuf {
    let mut text = String::from("Summary\n");
    for row in rows {
        let fields: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        text.push_str(&fields.join(","));
        text.push('\n');
    }
    let path = dir.join(name);
    std::fs::write(&path, text).unwrap();
    path
}

/// Write a bare module `.DAT`/`.STA` pair
pub fn write_bare_pair(tmp: &TempDir, sensor_x: f64) -> (PathBuf, PathBuf) {
    (
        write_scan(
            tmp.path(),
            &format!("{}_vc3_bare_module_metrology.DAT", BARE_SERIAL),
            &bare_scan(),
        ),
        write_summary(
            tmp.path(),
            &format!("{}_vc3_bare_module_metrology.STA", BARE_SERIAL),
            &bare_summary(sensor_x),
        ),
    )
}

/// Pull-tester log text from (raw grade, strength) pairs
pub fn pull_log(wires: &[(f64, f64)]) -> String {
    let mut text = String::new();
    for i in 0..19 {
        text.push_str(&format!("Header line {},,\n", i));
    }
    for (i, (grade, strength)) in wires.iter().enumerate() {
        text.push_str(&format!("TEST,{},{},{}\n", i + 1, grade, strength));
        if i == 9 {
            text.push_str("NOTE,operator break\n");
        }
    }
    text
}

/// Write a component database export with one assembled and one bare module
pub fn write_directory(dir: &Path) -> PathBuf {
    let yaml = format!(
        r#"components:
  - code: obj-assembled
    serialNumber: "{assembled}"
    alternativeIdentifier: MOD-7
    currentStage: {{ code: MODULE/ASSEMBLY }}
    componentType: {{ code: MODULE }}
    currentLocation: {{ code: GL }}
    tests:
      - code: MASS_MEASUREMENT
        testRuns: [{{ id: run-assembled }}]
    children:
      - type: {{ code: CARRIER }}
        component: {{ serialNumber: "20UPGMC0000042" }}
  - code: obj-bare
    serialNumber: "{bare}"
    currentStage: {{ code: BAREMODULERECEPTION }}
    componentType: {{ code: BARE_MODULE }}
    currentLocation: {{ code: GL }}
    tests:
      - code: MASS_MEASUREMENT
        testRuns: [{{ id: run-bare }}]
test_runs:
  - id: run-assembled
    results: [{{ code: MASS, value: 3.52 }}]
  - id: run-bare
    results: [{{ code: MASS, value: 1.92 }}]
"#,
        assembled = ASSEMBLED_SERIAL,
        bare = BARE_SERIAL
    );
    let path = dir.join("db.yaml");
    std::fs::write(&path, yaml).unwrap();
    path
}

/// Stderr with miette's line wrapping undone
pub fn stderr_text(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr)
        .split_whitespace()
        .filter(|token| *token != "│")
        .collect::<Vec<_>>()
        .join(" ")
}
