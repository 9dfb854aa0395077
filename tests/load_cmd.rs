mod common;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

use common::{PEOPLE_CSV, TestWorkspace};

fn write_spec(workspace: &TestWorkspace, csv_contents: &str) -> std::path::PathBuf {
    let input = workspace.write("people.csv", csv_contents);
    let spec = workspace.path().join("spec.yml");
    cargo_bin_cmd!("csv-structing")
        .args([
            "schema",
            "-i",
            input.to_str().unwrap(),
            "-o",
            spec.to_str().unwrap(),
        ])
        .assert()
        .success();
    spec
}

#[test]
fn load_streams_every_row_of_the_specification() {
    let workspace = TestWorkspace::new();
    let spec = write_spec(&workspace, PEOPLE_CSV);

    cargo_bin_cmd!("csv-structing")
        .args(["load", "-s", spec.to_str().unwrap(), "-b", "1"])
        .assert()
        .success()
        .stderr(predicate::str::contains("2 row(s)"));
}

#[test]
fn strict_load_fails_on_malformed_cell() {
    let workspace = TestWorkspace::new();
    let spec = write_spec(&workspace, PEOPLE_CSV);

    // Appending a malformed row after inference: the age column no longer
    // parses under its inferred integer type.
    let input = workspace.path().join("people.csv");
    let mut contents = std::fs::read_to_string(&input).expect("read input");
    contents.push_str("Carol,thirtytwo,2021-06-01\n");
    std::fs::write(&input, contents).expect("append row");

    cargo_bin_cmd!("csv-structing")
        .args(["load", "-s", spec.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("thirtytwo"));
}

#[test]
fn lenient_load_substitutes_null_and_succeeds() {
    let workspace = TestWorkspace::new();
    let spec = write_spec(&workspace, PEOPLE_CSV);

    let input = workspace.path().join("people.csv");
    let mut contents = std::fs::read_to_string(&input).expect("read input");
    contents.push_str("Carol,thirtytwo,2021-06-01\n");
    std::fs::write(&input, contents).expect("append row");

    cargo_bin_cmd!("csv-structing")
        .args(["load", "-s", spec.to_str().unwrap(), "--lenient"])
        .assert()
        .success()
        .stderr(predicate::str::contains("3 row(s)"));
}

#[test]
fn load_rejects_missing_specification() {
    let workspace = TestWorkspace::new();
    cargo_bin_cmd!("csv-structing")
        .args([
            "load",
            "-s",
            workspace.path().join("absent.yml").to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("absent.yml"));
}
