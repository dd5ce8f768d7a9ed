mod common;

use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;

use common::TestWorkspace;

fn wrangler() -> Command {
    Command::cargo_bin("xlsx-wrangler").expect("binary exists")
}

#[test]
fn sheets_lists_names_with_row_and_column_counts() {
    let workspace = TestWorkspace::new();
    let data: &[&[&str]] = &[&["id", "name", "branch"], &["1", "An", "HN"], &["2", "Binh", "HCM"]];
    let empty: &[&[&str]] = &[&["only header"]];
    let input = workspace.write_workbook("input.xlsx", &[("Dữ liệu", data), ("Ghi chú", empty)]);

    wrangler()
        .args(["sheets", "-i"])
        .arg(&input)
        .assert()
        .success()
        .stdout(
            contains("Sheet")
                .and(contains("Rows"))
                .and(contains("Dữ liệu"))
                .and(contains("Ghi chú"))
                .and(contains("3")),
        );
}

#[test]
fn missing_input_fails_cleanly() {
    wrangler()
        .args(["sheets", "-i", "does-not-exist.xlsx"])
        .assert()
        .failure()
        .stderr(contains("error:"));
}
