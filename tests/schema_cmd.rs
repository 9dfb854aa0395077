mod common;

use assert_cmd::cargo::cargo_bin_cmd;
use csv_structing::schema::{DbType, Specification};
use predicates::prelude::*;

use common::{PEOPLE_CSV, TestWorkspace};

#[test]
fn schema_command_writes_loadable_specification() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("people.csv", PEOPLE_CSV);
    let output = workspace.path().join("spec.yml");

    cargo_bin_cmd!("csv-structing")
        .args([
            "schema",
            "-i",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .success();

    let spec = Specification::load(&output).expect("load spec");
    assert_eq!(spec.tables.len(), 1);
    let table = &spec.tables[0];
    assert_eq!(table.name, "people");
    assert_eq!(table.column_names(), vec!["name", "age", "joined"]);
    assert_eq!(table.columns[0].datatype, DbType::String);
    assert_eq!(table.columns[1].datatype, DbType::Integer);
    assert_eq!(table.columns[2].datatype, DbType::Date);
    assert_eq!(table.file.offset, 0);
    assert_eq!(table.file.headers, vec!["Name", "Age", "Joined"]);
}

#[test]
fn schema_command_renders_identically_across_runs() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("people.csv", PEOPLE_CSV);
    let first = workspace.path().join("first.yml");
    let second = workspace.path().join("second.yml");

    for output in [&first, &second] {
        cargo_bin_cmd!("csv-structing")
            .args([
                "schema",
                "-i",
                input.to_str().unwrap(),
                "-o",
                output.to_str().unwrap(),
            ])
            .assert()
            .success();
    }

    let first_text = std::fs::read_to_string(&first).expect("first render");
    let second_text = std::fs::read_to_string(&second).expect("second render");
    assert_eq!(first_text, second_text);
}

#[test]
fn schema_command_handles_multiple_files_and_digit_leading_names() {
    let workspace = TestWorkspace::new();
    let people = workspace.write("people.csv", PEOPLE_CSV);
    let quarters = workspace.write(
        "3rd quarter.csv",
        "3rd Quarter,Total\nweek one,10.5\nweek two,11.25\n",
    );
    let output = workspace.path().join("spec.yml");

    cargo_bin_cmd!("csv-structing")
        .args([
            "schema",
            "-i",
            people.to_str().unwrap(),
            "-i",
            quarters.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .success();

    let spec = Specification::load(&output).expect("load spec");
    assert_eq!(spec.tables.len(), 2);
    let quarters_table = spec.table("t3rd_quarter").expect("quarters table");
    assert_eq!(
        quarters_table.column_names(),
        vec!["c3rd_quarter", "total"]
    );
    assert_eq!(quarters_table.columns[1].datatype, DbType::Float);
}

#[test]
fn failing_file_does_not_abort_siblings() {
    let workspace = TestWorkspace::new();
    let people = workspace.write("people.csv", PEOPLE_CSV);
    // Purely numeric rows leave nothing to accept as a header.
    let numbers = workspace.write("numbers.csv", "1,2,3\n4,5,6\n7,8,9\n");
    let output = workspace.path().join("spec.yml");

    cargo_bin_cmd!("csv-structing")
        .args([
            "schema",
            "-i",
            numbers.to_str().unwrap(),
            "-i",
            people.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("numbers.csv"));

    // The sibling file still produced a table.
    let spec = Specification::load(&output).expect("load spec");
    assert_eq!(spec.tables.len(), 1);
    assert_eq!(spec.tables[0].name, "people");
}

#[test]
fn missing_input_file_is_reported() {
    let workspace = TestWorkspace::new();
    let output = workspace.path().join("spec.yml");

    cargo_bin_cmd!("csv-structing")
        .args([
            "schema",
            "-i",
            workspace.path().join("absent.csv").to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("absent.csv"));
}

#[test]
fn json_extension_writes_json_specification() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("people.csv", PEOPLE_CSV);
    let output = workspace.path().join("spec.json");

    cargo_bin_cmd!("csv-structing")
        .args([
            "schema",
            "-i",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .success();

    let text = std::fs::read_to_string(&output).expect("read spec");
    assert!(text.trim_start().starts_with('{'));
    let spec = Specification::load(&output).expect("load spec");
    assert_eq!(spec.tables[0].name, "people");
}
