// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::path::PathBuf;
use std::process::Command;

fn pmportc() -> Command {
    Command::new(env!("CARGO_BIN_EXE_pmportc"))
}

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../pmport-tests/tests/fixtures/protocol")
}

#[test]
fn version() {
    let output = pmportc().arg("--version").output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("pmportc "));
}

#[test]
fn packets_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let output_path = dir.path().join("proto.go");
    let status = pmportc()
        .arg("packets")
        .arg(fixtures())
        .arg("--ids")
        .arg(fixtures().join("Info.php"))
        .arg("--no-format")
        .arg("--output")
        .arg(&output_path)
        .status()
        .unwrap();
    assert!(status.success());
    let code = std::fs::read_to_string(output_path).unwrap();
    assert!(code.contains("type MovePlayer struct {"));
    assert!(code.contains("type Batch struct {"));
}

#[test]
fn packets_as_json() {
    let output = pmportc()
        .arg("packets")
        .arg(fixtures())
        .arg("--ids")
        .arg(fixtures().join("Info.php"))
        .arg("--output-format")
        .arg("json")
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["packets"].as_array().map(Vec::len), Some(11));
}

#[test]
fn ids_table() {
    let output = pmportc()
        .arg("ids")
        .arg(fixtures().join("Info.php"))
        .arg("--type-name")
        .arg("PacketID")
        .arg("--repr")
        .arg("byte")
        .arg("--suffix")
        .arg("Head")
        .arg("--declaration-suffix")
        .arg("_PACKET")
        .arg("--no-format")
        .output()
        .unwrap();
    assert!(output.status.success());
    let code = String::from_utf8(output.stdout).unwrap();
    assert!(code.contains("\tLoginHead PacketID = iota + 143 // 143\n"));
    assert!(code.contains("func PacketIDFromString(name string) (PacketID, bool) {"));
    assert!(!code.contains("var packets"));
}

#[test]
fn invalid_declarations_are_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let declarations = dir.path().join("Info.php");
    let output_path = dir.path().join("proto.go");
    std::fs::write(&declarations, "const A_PACKET = 1;\nconst A_PACKET = 2;\n").unwrap();
    let output = pmportc()
        .arg("packets")
        .arg(dir.path())
        .arg("--ids")
        .arg(&declarations)
        .arg("--no-format")
        .arg("--output")
        .arg(&output_path)
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("E1"));
    assert!(!output_path.exists());
}

#[test]
fn formatter_failure_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let output_path = dir.path().join("proto.go");
    let output = pmportc()
        .arg("packets")
        .arg(fixtures())
        .arg("--ids")
        .arg(fixtures().join("Info.php"))
        .arg("--gofmt")
        .arg(dir.path().join("missing-gofmt"))
        .arg("--output")
        .arg(&output_path)
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(!output_path.exists());
}
