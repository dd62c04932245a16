use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;

mod common;

use common::{write_v04_image, write_v2_array};

fn ngffcheck() -> Command {
    Command::cargo_bin("ngffcheck").unwrap()
}

#[test]
fn runs() {
    ngffcheck().assert().success();
}

#[test]
fn outputs_tool_name() {
    let mut cmd = ngffcheck();
    cmd.arg("-V");
    cmd.assert().success().stdout("ngffcheck 0.1.0\n");
}

#[test]
fn validate_valid_store_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    write_v04_image(dir.path(), 2, "<u2");

    let mut cmd = ngffcheck();
    cmd.arg("validate").arg(dir.path());
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Validation passed"))
        .stdout(predicate::str::contains("OME-NGFF 0.4 image"));
}

#[test]
fn validate_invalid_store_fails_with_exit_code_1() {
    let dir = tempfile::tempdir().unwrap();
    write_v04_image(dir.path(), 2, "<u2");
    write_v2_array(&dir.path().join("1"), &[8, 32, 32], "<u2");

    let mut cmd = ngffcheck();
    cmd.arg("validate").arg(dir.path());
    cmd.assert()
        .code(1)
        .stdout(predicate::str::contains("1 error(s)"))
        .stdout(predicate::str::contains("dataset_dimension_mismatch"))
        .stdout(predicate::str::contains("multiscales.0.datasets.1.path"));
}

#[test]
fn validate_json_output_format() {
    let dir = tempfile::tempdir().unwrap();
    write_v04_image(dir.path(), 1, "<u2");

    let mut cmd = ngffcheck();
    cmd.arg("validate").arg(dir.path()).args(["--output", "json"]);
    let output = cmd.assert().success().get_output().stdout.clone();

    let parsed: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(parsed["version"], json!("0.4"));
    assert_eq!(parsed["kind"], json!("image"));
    assert_eq!(parsed["report"]["error_count"], json!(0));
    assert_eq!(parsed["report"]["issues"], json!([]));
}

#[test]
fn validate_json_output_lists_issues() {
    let dir = tempfile::tempdir().unwrap();
    write_v04_image(dir.path(), 2, "<u2");
    fs::remove_dir_all(dir.path().join("1")).unwrap();

    let mut cmd = ngffcheck();
    cmd.arg("validate")
        .arg(dir.path())
        .args(["--output", "json", "--jobs", "4"]);
    let output = cmd.assert().code(1).get_output().stdout.clone();

    let parsed: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let issue = &parsed["report"]["issues"][0];
    assert_eq!(issue["code"], json!("dataset_path_not_found"));
    assert_eq!(issue["domain"], json!("structure"));
    assert_eq!(issue["severity"], json!("error"));
    assert_eq!(issue["location"], json!("multiscales.0.datasets.1.path"));
}

#[test]
fn validate_metadata_document_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("zarr.json");
    fs::write(
        &path,
        json!({
            "zarr_format": 3,
            "node_type": "group",
            "attributes": {"ome": {"version": "0.5", "labels": ["cells"]}}
        })
        .to_string(),
    )
    .unwrap();

    let mut cmd = ngffcheck();
    cmd.arg("validate").arg(&path);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("OME-NGFF 0.5 labels-group"));
}

#[test]
fn validate_invalid_metadata_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".zattrs");
    fs::write(
        &path,
        json!({"multiscales": [{
            "axes": [{"name": "c"}, {"name": "c"}],
            "datasets": [{"path": "0", "coordinateTransformations": [{"type": "scale", "scale": [1.0, 1.0]}]}]
        }]})
        .to_string(),
    )
    .unwrap();

    let mut cmd = ngffcheck();
    cmd.arg("validate").arg(&path);
    cmd.assert()
        .code(1)
        .stdout(predicate::str::contains("duplicate_axis_name"))
        .stdout(predicate::str::contains("multiscales.0.axes.1.name"));
}

#[test]
fn strict_mode_fails_on_warnings() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".zattrs");
    fs::write(&path, json!({"labels": ["cell masks"]}).to_string()).unwrap();

    let mut cmd = ngffcheck();
    cmd.arg("validate").arg(&path);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("risky_node_name"));

    let mut cmd = ngffcheck();
    cmd.arg("validate").arg(&path).arg("--strict");
    cmd.assert().code(1);

    let mut cmd = ngffcheck();
    cmd.arg("validate")
        .arg(&path)
        .args(["--strict", "--allow-risky-names"]);
    cmd.assert().success();
}

#[test]
fn validate_nonexistent_store_exits_with_code_2() {
    let mut cmd = ngffcheck();
    cmd.args(["validate", "nonexistent_store.zarr"]);
    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("unreachable"));
}

#[test]
fn validate_unsupported_scheme() {
    let mut cmd = ngffcheck();
    cmd.args(["validate", "s3://bucket/image.zarr"]);
    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid store URI"));
}
