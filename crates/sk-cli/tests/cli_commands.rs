//! Integration tests for the sk CLI commands.
#![allow(deprecated)] // Command::cargo_bin – macro replacement not yet stable

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const ENCOUNTER: &str = r#"{
  "trigger": "bridge ambush",
  "grid": {
    "width": 8,
    "height": 6,
    "terrain": [
      { "x": 3, "y": 1, "terrain": "obstacle" },
      { "x": 4, "y": 4, "terrain": "difficult" }
    ]
  },
  "players": [
    {
      "id": "aria",
      "name": "Aria",
      "hit_points": 30,
      "armor_class": 16,
      "level": 3,
      "position": { "x": 1, "y": 2 },
      "attacks": [
        { "name": "Longsword", "to_hit": 6, "damage": "1d8+3", "kind": "melee" }
      ]
    }
  ],
  "enemies": [
    {
      "statblock": {
        "id": "goblin",
        "name": "Goblin",
        "hit_points": 7,
        "armor_class": 13,
        "xp": 50,
        "attacks": [
          { "name": "Scimitar", "to_hit": 4, "damage": "1d6", "kind": "melee" }
        ]
      },
      "position": { "x": 6, "y": 2 }
    }
  ]
}"#;

/// Write an encounter file into a fresh temp directory.
fn encounter_file(contents: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("encounter.json");
    fs::write(&path, contents).unwrap();
    (dir, path)
}

fn skirmish() -> Command {
    let mut cmd = Command::cargo_bin("skirmish").unwrap();
    cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

#[test]
fn run_fights_to_a_result() {
    let (_dir, path) = encounter_file(ENCOUNTER);
    skirmish()
        .arg("run")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Event Log"))
        .stdout(predicate::str::contains("Combat begins: bridge ambush"))
        .stdout(predicate::str::contains("Combatants"))
        .stdout(predicate::str::contains("Outcome:"));
}

#[test]
fn run_is_reproducible_for_a_seed() {
    let (_dir, path) = encounter_file(ENCOUNTER);
    let first = skirmish()
        .args(["run", "--seed", "7"])
        .arg(&path)
        .output()
        .unwrap();
    let second = skirmish()
        .args(["run", "--seed", "7"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn run_quiet_skips_the_log() {
    let (_dir, path) = encounter_file(ENCOUNTER);
    skirmish()
        .args(["run", "--quiet"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Event Log").not())
        .stdout(predicate::str::contains("Outcome:"));
}

#[test]
fn run_stops_at_the_round_limit() {
    let (_dir, path) = encounter_file(ENCOUNTER);
    skirmish()
        .args(["run", "--max-rounds", "0"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("interrupted"))
        .stdout(predicate::str::contains("round_limit"));
}

#[test]
fn run_missing_file_fails() {
    skirmish()
        .args(["run", "does-not-exist.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: cannot read"));
}

#[test]
fn run_malformed_file_fails() {
    let (_dir, path) = encounter_file("{ \"grid\": 3 }");
    skirmish()
        .arg("run")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid encounter"));
}

#[test]
fn run_rejects_a_blocked_start() {
    let blocked = ENCOUNTER.replace(r#""x": 6, "y": 2"#, r#""x": 3, "y": 1"#);
    let (_dir, path) = encounter_file(&blocked);
    skirmish()
        .arg("run")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot start combat"));
}

#[test]
fn verbose_logs_to_stderr() {
    let (_dir, path) = encounter_file(ENCOUNTER);
    skirmish()
        .args(["run", "--quiet", "--verbose"])
        .arg(&path)
        .assert()
        .success()
        .stderr(predicate::str::contains("combat started"));
}

// ---------------------------------------------------------------------------
// scale
// ---------------------------------------------------------------------------

#[test]
fn scale_reports_each_monster() {
    let (_dir, path) = encounter_file(ENCOUNTER);
    skirmish()
        .arg("scale")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Party power"))
        .stdout(predicate::str::contains("Goblin"))
        .stdout(predicate::str::contains("Scimitar 1d6 ->"));
}

#[test]
fn scale_rejects_a_broken_statblock() {
    let broken = ENCOUNTER.replace(r#""hit_points": 7"#, r#""hit_points": 0"#);
    let (_dir, path) = encounter_file(&broken);
    skirmish()
        .arg("scale")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("goblin"));
}

// ---------------------------------------------------------------------------
// grid
// ---------------------------------------------------------------------------

#[test]
fn grid_draws_terrain_and_combatants() {
    let (_dir, path) = encounter_file(ENCOUNTER);
    skirmish()
        .arg("grid")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Battlefield"))
        .stdout(predicate::str::contains(".A....g."))
        .stdout(predicate::str::contains("~"))
        .stdout(predicate::str::contains("threatened").not());
}

#[test]
fn grid_marks_threats() {
    let (_dir, path) = encounter_file(ENCOUNTER);
    skirmish()
        .args(["grid", "--threats"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("!g!"))
        .stdout(predicate::str::contains("threatened"));
}

#[test]
fn grid_rejects_out_of_bounds_placement() {
    let outside = ENCOUNTER.replace(r#""x": 6, "y": 2"#, r#""x": 20, "y": 2"#);
    let (_dir, path) = encounter_file(&outside);
    skirmish()
        .arg("grid")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: Goblin"));
}

// ---------------------------------------------------------------------------
// help
// ---------------------------------------------------------------------------

#[test]
fn help_lists_commands() {
    skirmish()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("scale"))
        .stdout(predicate::str::contains("grid"));
}
