mod common;

use assert_cmd::Command;
use predicates::str::contains;

use common::{read_sheet, sheet_names, TestWorkspace};

const HEADER: &[&str] = &["Full name", "ID card/Passport pick today", "Branch"];

fn wrangler() -> Command {
    Command::cargo_bin("xlsx-wrangler").expect("binary exists")
}

#[test]
fn groups_are_ordered_by_size_and_named_with_row_counts() {
    let workspace = TestWorkspace::new();
    let rows: &[&[&str]] = &[
        &["Quarterly report", "", ""],
        HEADER,
        &["An", "A", "north"],
        &["Binh", "B", "south"],
        &["Chi", "A", "north"],
        &["Dung", "B", "south"],
        &["Em", "A", "west"],
        &["Giang", "C", "west"],
    ];
    let input = workspace.write_workbook("input.xlsx", &[("Sheet1", rows)]);
    let output = workspace.path().join("grouped.xlsx");

    wrangler()
        .args(["group", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    // C has one row and falls below the default threshold of 2.
    assert_eq!(
        sheet_names(&output),
        vec!["ID A (3 dòng)", "ID B (2 dòng)"]
    );
    let sheet = read_sheet(&output, "ID A (3 dòng)");
    assert_eq!(sheet[0], HEADER);
    assert_eq!(sheet[1], vec!["An", "A", "north"]);
    assert_eq!(sheet[2], vec!["Chi", "A", "north"]);
    assert_eq!(sheet[3], vec!["Em", "A", "west"]);
}

#[test]
fn equal_sized_groups_keep_first_seen_order() {
    let workspace = TestWorkspace::new();
    let rows: &[&[&str]] = &[
        HEADER,
        &["An", "Z", "north"],
        &["Binh", "Y", "south"],
        &["Chi", "Z", "north"],
        &["Dung", "Y", "south"],
    ];
    let input = workspace.write_workbook("input.xlsx", &[("Sheet1", rows)]);
    let output = workspace.path().join("grouped.xlsx");

    wrangler()
        .args(["group", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    assert_eq!(
        sheet_names(&output),
        vec!["ID Z (2 dòng)", "ID Y (2 dòng)"]
    );
}

#[test]
fn forbidden_sheet_name_characters_become_underscores() {
    let workspace = TestWorkspace::new();
    let mut rows: Vec<&[&str]> = vec![HEADER];
    let member: &[&str] = &["An", "A/B:C", "north"];
    for _ in 0..5 {
        rows.push(member);
    }
    let input = workspace.write_workbook("input.xlsx", &[("Sheet1", &rows)]);
    let output = workspace.path().join("grouped.xlsx");

    wrangler()
        .args(["group", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    assert_eq!(sheet_names(&output), vec!["ID A_B_C (5 dòng)"]);
}

#[test]
fn statistic_blocks_append_value_histograms() {
    let workspace = TestWorkspace::new();
    let rows: &[&[&str]] = &[
        HEADER,
        &["An", "A", "north"],
        &["Chi", "A", "north"],
        &["Em", "A", "west"],
    ];
    let input = workspace.write_workbook("input.xlsx", &[("Sheet1", rows)]);
    let output = workspace.path().join("grouped.xlsx");

    wrangler()
        .args(["group", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .args(["--stats", "Branch"])
        .assert()
        .success();

    let sheet = read_sheet(&output, "ID A (3 dòng)");
    // header + 3 members + blank + block header + two histogram rows
    assert!(sheet[4].iter().all(String::is_empty));
    assert_eq!(&sheet[5][..2], &["Branch", "Số lượng"]);
    assert_eq!(&sheet[6][..2], &["north", "2"]);
    assert_eq!(&sheet[7][..2], &["west", "1"]);
}

#[test]
fn empty_keys_form_their_own_group_unless_excluded() {
    let workspace = TestWorkspace::new();
    let rows: &[&[&str]] = &[
        HEADER,
        &["An", "A", "north"],
        &["Binh", "", "south"],
        &["Chi", "A", "north"],
        &["Dung", "", "south"],
    ];
    let input = workspace.write_workbook("input.xlsx", &[("Sheet1", rows)]);

    let kept = workspace.path().join("kept.xlsx");
    wrangler()
        .args(["group", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(&kept)
        .assert()
        .success();
    assert_eq!(sheet_names(&kept).len(), 2);
    assert!(sheet_names(&kept).contains(&"ID  (2 dòng)".to_string()));

    let dropped = workspace.path().join("dropped.xlsx");
    wrangler()
        .args(["group", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(&dropped)
        .arg("--exclude-empty-keys")
        .assert()
        .success();
    assert_eq!(sheet_names(&dropped), vec!["ID A (2 dòng)"]);
}

#[test]
fn all_unique_keys_fail_with_a_threshold_message() {
    let workspace = TestWorkspace::new();
    let rows: &[&[&str]] = &[
        HEADER,
        &["An", "A", "north"],
        &["Binh", "B", "south"],
    ];
    let input = workspace.write_workbook("input.xlsx", &[("Sheet1", rows)]);

    wrangler()
        .args(["group", "-i"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(contains("no group has 2 or more rows"));
}

#[test]
fn missing_marker_fails_with_a_header_message() {
    let workspace = TestWorkspace::new();
    let rows: &[&[&str]] = &[&["name", "code"], &["An", "A"]];
    let input = workspace.write_workbook("input.xlsx", &[("Sheet1", rows)]);

    wrangler()
        .args(["group", "-i"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(contains("marker column"));
}

#[test]
fn key_column_override_groups_by_another_header() {
    let workspace = TestWorkspace::new();
    let rows: &[&[&str]] = &[
        HEADER,
        &["An", "A", "north"],
        &["Binh", "B", "north"],
        &["Chi", "C", "south"],
        &["Dung", "D", "south"],
    ];
    let input = workspace.write_workbook("input.xlsx", &[("Sheet1", rows)]);
    let output = workspace.path().join("grouped.xlsx");

    wrangler()
        .args(["group", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .args(["-k", "Branch"])
        .assert()
        .success();

    assert_eq!(
        sheet_names(&output),
        vec!["ID north (2 dòng)", "ID south (2 dòng)"]
    );
}

#[test]
fn rejects_thresholds_below_two() {
    let workspace = TestWorkspace::new();
    let input = workspace.write_workbook("input.xlsx", &[("Sheet1", &[HEADER] as &[&[&str]])]);

    wrangler()
        .args(["group", "-i"])
        .arg(&input)
        .args(["--threshold", "1"])
        .assert()
        .failure()
        .stderr(contains("threshold must be at least 2"));
}
