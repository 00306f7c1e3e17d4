// End-to-end load / is_loaded / destroy lifecycle against real files.
use std::path::Path;

use snowvis_coeff::data::writer::write_file;
use snowvis_coeff::{CategoryTable, FileFormat, LoadError, LoadOptions, SnowVisCoeff};

fn table() -> CategoryTable {
    CategoryTable::new(
        "Snow",
        vec![0.45, 0.55, 0.65],
        vec!["fresh_snow".into(), "wet_snow".into()],
        vec![0.99, 0.98, 0.97, 0.94, 0.92, 0.88],
    )
    .expect("valid table")
}

fn prefix(dir: &Path) -> String {
    format!("{}/", dir.display())
}

#[test]
fn fresh_load_destroy_scenario() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_file(&dir.path().join("snow_vis.bin"), &table(), FileFormat::Binary).expect("write");
    let opts = LoadOptions::new().with_file_path(prefix(dir.path()));

    let mut coeff = SnowVisCoeff::new();
    assert!(!coeff.is_loaded());

    coeff.load("snow_vis.bin", &opts).expect("load");
    assert!(coeff.is_loaded());
    assert_eq!(coeff.table().map(|t| t.n_surface_types()), Some(2));

    coeff.destroy(None).expect("destroy");
    assert!(!coeff.is_loaded());
}

#[test]
fn parquet_variant_loads_with_alternate_flag() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_file(&dir.path().join("snow_vis.parquet"), &table(), FileFormat::Parquet)
        .expect("write");

    let mut coeff = SnowVisCoeff::new();
    let opts = LoadOptions::new()
        .with_file_path(prefix(dir.path()))
        .with_alternate_format(true)
        .with_process_ids(1, 0);
    coeff.load("snow_vis.parquet", &opts).expect("load");
    assert_eq!(coeff.table(), Some(&table()));
}

#[test]
fn prefix_is_joined_without_separator() {
    let dir = tempfile::tempdir().expect("tempdir");
    // "<dir>/snow" + "_vis.bin" must resolve to "<dir>/snow_vis.bin".
    write_file(&dir.path().join("snow_vis.bin"), &table(), FileFormat::Binary).expect("write");

    let mut coeff = SnowVisCoeff::new();
    let opts = LoadOptions::new().with_file_path(format!("{}/snow", dir.path().display()));
    coeff.load("_vis.bin", &opts).expect("load");
    assert!(coeff.is_loaded());
}

#[test]
fn corrupt_file_after_success_leaves_store_empty() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_file(&dir.path().join("good.bin"), &table(), FileFormat::Binary).expect("write");
    std::fs::write(dir.path().join("corrupt.bin"), b"SNOWVIS\0\x01\x00").expect("write");
    let opts = LoadOptions::new().with_file_path(prefix(dir.path())).with_quiet(true);

    let mut coeff = SnowVisCoeff::new();
    coeff.load("good.bin", &opts).expect("load");
    assert!(coeff.is_loaded());

    let err = coeff.load("corrupt.bin", &opts).unwrap_err();
    match &err {
        LoadError::Read { path, .. } => assert!(path.ends_with("corrupt.bin")),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!coeff.is_loaded());

    // A retry needs no destroy in between.
    coeff.load("good.bin", &opts).expect("reload");
    assert!(coeff.is_loaded());
}

#[test]
fn missing_file_reports_filename_and_process() {
    let dir = tempfile::tempdir().expect("tempdir");
    let opts = LoadOptions::new()
        .with_file_path(prefix(dir.path()))
        .with_process_ids(3, 0);

    let mut coeff = SnowVisCoeff::new();
    let err = coeff.load("nope.bin", &opts).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("nope.bin"), "{msg}");
    assert!(msg.ends_with("; Process ID: 3"), "{msg}");
    assert!(!coeff.is_loaded());
}

#[test]
fn binary_file_read_as_parquet_fails_cleanly() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_file(&dir.path().join("snow_vis.bin"), &table(), FileFormat::Binary).expect("write");

    let mut coeff = SnowVisCoeff::new();
    let opts = LoadOptions::new()
        .with_file_path(prefix(dir.path()))
        .with_alternate_format(true);
    assert!(coeff.load("snow_vis.bin", &opts).is_err());
    assert!(!coeff.is_loaded());
}

#[test]
fn destroy_is_idempotent() {
    let mut coeff = SnowVisCoeff::new();
    coeff.destroy(Some(0)).expect("first");
    coeff.destroy(Some(0)).expect("second");
    assert!(!coeff.is_loaded());
}
