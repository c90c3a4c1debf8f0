use std::io::Write;
use std::path::Path;

use table_cleaner::data::{loader::load_file, writer::write_file};
use table_cleaner::{clean, CellValue, DType, Dataset};

fn write_raw_csv(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("raw.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "id,name,signup,score,vip").unwrap();
    writeln!(file, "1,a,2020-01-01,1.5,true").unwrap();
    writeln!(file, "1,a,2020-01-01,1.5,true").unwrap();
    writeln!(file, "2,b,bad,,false").unwrap();
    writeln!(file, "3,c,2020-02-29 12:00:00,2.0,false").unwrap();
    path
}

fn cleaned_from_csv(dir: &Path) -> Dataset {
    let raw = load_file(&write_raw_csv(dir)).unwrap();
    let report = clean(&raw, &["signup"]);
    assert_eq!(report.duplicates_removed, 1);
    report.dataset
}

fn assert_same_cells(a: &Dataset, b: &Dataset) {
    assert_eq!(a.column_names(), b.column_names());
    for (x, y) in a.columns().iter().zip(b.columns()) {
        assert_eq!(x.values(), y.values(), "column {}", x.name());
    }
}

#[test]
fn parquet_preserves_cleaned_values() {
    let dir = tempfile::tempdir().unwrap();
    let cleaned = cleaned_from_csv(dir.path());

    let out = dir.path().join("clean.parquet");
    write_file(&cleaned, &out).unwrap();
    let reloaded = load_file(&out).unwrap();

    assert_same_cells(&cleaned, &reloaded);
    assert_eq!(reloaded.column("signup").unwrap().dtype(), DType::Datetime);
    assert_eq!(reloaded.column("vip").unwrap().dtype(), DType::Boolean);
}

#[test]
fn csv_reloads_and_recleans_to_the_same_table() {
    let dir = tempfile::tempdir().unwrap();
    let cleaned = cleaned_from_csv(dir.path());

    let out = dir.path().join("clean.csv");
    write_file(&cleaned, &out).unwrap();
    let reloaded = load_file(&out).unwrap();
    assert_eq!(reloaded.column("signup").unwrap().dtype(), DType::Object);

    let recleaned = clean(&reloaded, &["signup"]);
    assert_eq!(recleaned.duplicates_removed, 0);
    assert_same_cells(&cleaned, &recleaned.dataset);
}

#[test]
fn json_reloads_and_recleans_to_the_same_table() {
    let dir = tempfile::tempdir().unwrap();
    let cleaned = cleaned_from_csv(dir.path());

    let out = dir.path().join("clean.json");
    write_file(&cleaned, &out).unwrap();
    let recleaned = clean(&load_file(&out).unwrap(), &["signup"]);
    assert_same_cells(&cleaned, &recleaned.dataset);
}

#[test]
fn coerced_dates_stay_missing_through_parquet() {
    let dir = tempfile::tempdir().unwrap();
    let raw_path = dir.path().join("signups.csv");
    std::fs::write(&raw_path, "id,signup\n1,2020-01-01\n2,bad\n").unwrap();

    let report = clean(&load_file(&raw_path).unwrap(), &["signup"]);
    let out = dir.path().join("signups.parquet");
    write_file(&report.dataset, &out).unwrap();

    let reloaded = load_file(&out).unwrap();
    let signup = reloaded.column("signup").unwrap().values();
    assert_eq!(signup[0].to_string(), "2020-01-01 00:00:00");
    assert_eq!(signup[1], CellValue::Null);
}

#[test]
fn mixed_numeric_csv_column_dedups_and_survives_parquet() {
    let dir = tempfile::tempdir().unwrap();
    let raw_path = dir.path().join("mixed.csv");
    std::fs::write(&raw_path, "x\n1\n1.0\n2.5\n").unwrap();

    let report = clean(&load_file(&raw_path).unwrap(), &[] as &[&str]);
    assert_eq!(report.duplicates_removed, 1);
    assert_eq!(report.columns.numerical, vec!["x"]);

    let out = dir.path().join("mixed.parquet");
    write_file(&report.dataset, &out).unwrap();
    assert_same_cells(&report.dataset, &load_file(&out).unwrap());
}
