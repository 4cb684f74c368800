// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! End-to-end tests for the `skilltree` binary.
#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const CATALOG: &str = r#"{
  "trees": {
    "1": {
      "passive_tree": {
        "nodes": {
          "1": { "parent": 1, "radius": 0, "position": 0, "connections": [{ "id": 2 }], "skill_id": "root" },
          "2": { "parent": 2, "radius": 0, "position": 0, "connections": [{ "id": 1 }, { "id": 3 }], "skill_id": "life" },
          "3": { "parent": 3, "radius": 0, "position": 0, "connections": [{ "id": 2 }], "skill_id": "oak" }
        },
        "groups": {
          "1": { "x": 0, "y": 0, "nodes": [1] },
          "2": { "x": 100, "y": 0, "nodes": [2] },
          "3": { "x": 200, "y": 0, "nodes": [3] }
        },
        "character_root": { "Witch": 1 }
      },
      "passive_skills": {
        "root": { "name": "Witch Start", "starting_node": ["Witch"] },
        "life": { "name": "Life", "stats": { "base_maximum_life": 10 } },
        "oak": { "name": "Heart of Oak", "is_notable": true, "stats": { "maximum_life_+%": 8 } }
      }
    }
  },
  "alternate_tree_versions": {
    "1": { "id": "vaal", "replace_small_normal": true }
  },
  "alternate_passive_skills": [
    { "version": 1, "name": "Ritual of Life", "types": 2, "weight": 10,
      "stats": [{ "id": "vaal_life", "min": 5, "max": 5 }] }
  ]
}"#;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("catalog.json"), CATALOG).expect("catalog");
        Self { dir }
    }

    fn catalog(&self) -> PathBuf {
        self.dir.path().join("catalog.json")
    }

    fn config_dir(&self) -> PathBuf {
        self.dir.path().join("config")
    }

    fn build(&self, history: &str) -> PathBuf {
        let path = self.dir.path().join("build.json");
        let doc = format!(
            r#"{{"tree":{{"version":1,"kind":"passive","char_class":"Witch"}},"editing":{{"history":{history},"position":99}}}}"#
        );
        fs::write(&path, doc).expect("build");
        path
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("skilltree").expect("binary");
        cmd.env("SKILLTREE_CONFIG_DIR", self.config_dir())
            .env_remove("RUST_LOG");
        cmd
    }

    fn with_catalog(&self) -> Command {
        let mut cmd = self.cmd();
        cmd.arg("--catalog").arg(self.catalog());
        cmd
    }
}

fn history_of(path: &Path) -> serde_json::Value {
    let doc: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(path).expect("read")).expect("json");
    doc["editing"]["history"].clone()
}

#[test]
fn state_prints_nodes_budget_and_digest() {
    let ws = Workspace::new();
    let build = ws.build("[2, 3]");
    ws.with_catalog()
        .arg("state")
        .arg("--build")
        .arg(&build)
        .assert()
        .success()
        .stdout(predicate::str::contains("Heart of Oak"))
        .stdout(predicate::str::contains("Active"))
        .stdout(predicate::str::contains("normal"))
        .stdout(predicate::str::is_match("digest: [0-9a-f]{64}").expect("regex"));
}

#[test]
fn state_json_lists_allocated_nodes() {
    let ws = Workspace::new();
    let build = ws.build("[2, 3]");
    let output = ws
        .with_catalog()
        .args(["state", "--json", "--build"])
        .arg(&build)
        .output()
        .expect("run");
    assert!(output.status.success());
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(summary["allocated"], serde_json::json!([2, 3]));
    assert_eq!(summary["count"]["normal"], 2);
    assert_eq!(summary["digest"].as_str().map(str::len), Some(64));
}

#[test]
fn toggle_prints_and_optionally_writes_the_history() {
    let ws = Workspace::new();
    let build = ws.build("[]");
    ws.with_catalog()
        .args(["toggle", "--node", "3", "--build"])
        .arg(&build)
        .assert()
        .success()
        .stdout("[2,3]\n");
    assert_eq!(history_of(&build), serde_json::json!([]));

    ws.with_catalog()
        .args(["toggle", "--node", "3", "--write", "--build"])
        .arg(&build)
        .assert()
        .success();
    assert_eq!(history_of(&build), serde_json::json!([2, 3]));

    ws.with_catalog()
        .args(["toggle", "--node", "2", "--build"])
        .arg(&build)
        .assert()
        .success()
        .stdout("[]\n");
}

#[test]
fn validate_exits_nonzero_when_the_history_changes() {
    let ws = Workspace::new();
    let build = ws.build("[3, 2, 3]");
    ws.with_catalog()
        .args(["validate", "--build"])
        .arg(&build)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("accepted 2 of 3 steps, dropped 1"))
        .stdout(predicate::str::contains("[2,3]"));

    ws.with_catalog()
        .args(["validate", "--write", "--build"])
        .arg(&build)
        .assert()
        .code(1);
    assert_eq!(history_of(&build), serde_json::json!([2, 3]));

    ws.with_catalog()
        .args(["validate", "--build"])
        .arg(&build)
        .assert()
        .success();
}

#[test]
fn reroll_replaces_small_passives() {
    let ws = Workspace::new();
    ws.with_catalog()
        .args([
            "reroll",
            "--tree-version",
            "1",
            "--jewel-version",
            "1",
            "--seed",
            "1234",
            "--node",
            "2",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ritual of Life"))
        .stdout(predicate::str::contains("vaal_life: 5"));

    ws.with_catalog()
        .args([
            "reroll",
            "--tree-version",
            "1",
            "--jewel-version",
            "1",
            "--seed",
            "1234",
            "--node",
            "99",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("node 99"));
}

#[test]
fn configured_catalog_replaces_the_flag() {
    let ws = Workspace::new();
    let build = ws.build("[2]");
    ws.cmd()
        .args(["state", "--build"])
        .arg(&build)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no catalog"));

    ws.cmd()
        .args(["config", "set-catalog"])
        .arg(ws.catalog())
        .assert()
        .success();
    assert!(ws.config_dir().join("skilltree.json").exists());

    ws.cmd()
        .args(["state", "--build"])
        .arg(&build)
        .assert()
        .success()
        .stdout(predicate::str::contains("Life"));

    ws.cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("catalog.json"))
        .stdout(predicate::str::contains("\"log_filter\": \"warn\""));
}

#[test]
fn corrupt_settings_fall_back_to_defaults_with_a_warning() {
    let ws = Workspace::new();
    let build = ws.build("[2]");
    fs::create_dir_all(ws.config_dir()).expect("config dir");
    fs::write(ws.config_dir().join("skilltree.json"), "{").expect("settings");

    ws.with_catalog()
        .args(["state", "--build"])
        .arg(&build)
        .assert()
        .success()
        .stdout(predicate::str::contains("Life"))
        .stderr(predicate::str::contains("skilltree.json is not valid JSON"));

    ws.cmd()
        .args(["config", "set-catalog"])
        .arg(ws.catalog())
        .assert()
        .success();
    ws.cmd()
        .args(["state", "--build"])
        .arg(&build)
        .assert()
        .success();
}

#[test]
fn invalid_log_filters_are_rejected() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["config", "set-log", "skilltree_core=loud"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid log filter"));
}
