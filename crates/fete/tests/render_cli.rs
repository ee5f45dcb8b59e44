use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

const SOCIAL_PLAN: &str = r##"{
  "event_classification": "social_celebration",
  "key_considerations": ["Keep it casual"],
  "plan": {
    "event_type": "social_celebration",
    "themes": [
      {"name": "Garden Party", "description": "Outdoors", "color_palette": ["#ffc0cb", "green"]},
      {"name": "Retro Disco"}
    ],
    "budget_breakdown": [{"category": "Food", "amount": 100, "percentage": 100}]
  },
  "reasoning": "Small group"
}"##;

fn setup() -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().unwrap();
    let plan = dir.path().join("plan.json");
    fs::write(&plan, SOCIAL_PLAN).unwrap();
    (dir, plan)
}

#[test]
fn render_prints_every_section() {
    let (dir, plan) = setup();

    let mut cmd = cargo_bin_cmd!("fete");
    cmd.env("FETE_DIR", dir.path().join("fete"));
    cmd.arg("render").arg(&plan);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Social Celebration"))
        .stdout(predicate::str::contains("Keep it casual"))
        .stdout(predicate::str::contains("Theme Options (2)"))
        .stdout(predicate::str::contains("( ) Theme #1"))
        .stdout(predicate::str::contains("#1: Garden Party"))
        .stdout(predicate::str::contains("Total Budget: $100.00"))
        .stdout(predicate::str::contains("100.0%"));
}

#[test]
fn render_rejects_list_of_plans() {
    let (dir, _) = setup();
    let plan = dir.path().join("two.json");
    fs::write(&plan, format!("[{SOCIAL_PLAN}, {SOCIAL_PLAN}]")).unwrap();

    let mut cmd = cargo_bin_cmd!("fete");
    cmd.env("FETE_DIR", dir.path().join("fete"));
    cmd.arg("render").arg(&plan);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("got a list of 2"));
}

#[test]
fn render_applies_config_overrides() {
    let (dir, plan) = setup();
    let fete_dir = dir.path().join("fete");
    fs::create_dir_all(fete_dir.join("config")).unwrap();
    fs::write(
        fete_dir.join("config").join("config.toml"),
        "[sections.reasoning]\ntitle = \"Why this plan\"\nrank = 1\n",
    )
    .unwrap();

    let mut cmd = cargo_bin_cmd!("fete");
    cmd.env("FETE_DIR", &fete_dir);
    cmd.arg("render").arg(&plan);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Why this plan"))
        .stdout(predicate::str::contains("Small group"));
}

#[test]
fn render_fails_on_invalid_catalog() {
    let (dir, plan) = setup();
    let fete_dir = dir.path().join("fete");
    fs::create_dir_all(fete_dir.join("config")).unwrap();
    fs::write(
        fete_dir.join("config").join("config.toml"),
        "[sections.themes]\ntitle = \"Themes\"\nrenderer = \"timeline\"\nselectable = true\n",
    )
    .unwrap();

    let mut cmd = cargo_bin_cmd!("fete");
    cmd.env("FETE_DIR", &fete_dir);
    cmd.arg("render").arg(&plan);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("validate config.toml"));
}

#[test]
fn render_accepts_loosely_typed_items() {
    let dir = TempDir::new().unwrap();
    let plan = dir.path().join("loose.json");
    fs::write(
        &plan,
        r#"{
  "plan": {
    "event_type": "social_celebration",
    "themes": [{"name": "Garden Party", "color_palette": null, "vibe": "Breezy"}],
    "activities": [{"name": "Croquet", "duration": 30}],
    "budget_breakdown": [{"category": "Venue", "amount": "$1,200", "percentage": 100}]
  }
}"#,
    )
    .unwrap();

    let mut cmd = cargo_bin_cmd!("fete");
    cmd.env("FETE_DIR", dir.path().join("fete"));
    cmd.arg("render").arg(&plan);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("#1: Garden Party"))
        .stdout(predicate::str::contains("Vibe: Breezy"))
        .stdout(predicate::str::contains("Croquet"))
        .stdout(predicate::str::contains("Total Budget: $1,200.00"))
        .stdout(predicate::str::contains("Atmosphere").not());
}
