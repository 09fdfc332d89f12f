use assert_cmd::prelude::*;
use predicates::str::contains;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

fn labs() -> Command {
    Command::cargo_bin("graphics-labs").expect("binary exists")
}

#[test]
fn list_names_every_lab() {
    labs()
        .arg("--list")
        .assert()
        .success()
        .stdout(contains("camera"))
        .stdout(contains("helicopter"))
        .stdout(contains("lighting"))
        .stdout(contains("stencil"));
}

#[test]
fn pressing_l_turns_the_stencil_light_on() {
    labs()
        .args(["stencil", "--summary-only", "--press", "L"])
        .assert()
        .success()
        .stdout(contains("Final stencil lab state:"))
        .stdout(contains("light enabled=true"))
        .stdout(contains("selected=ruby sphere"));
}

#[test]
fn holding_equal_spins_the_rotor_a_full_turn() {
    labs()
        .args(["lab3", "--summary-only", "--hold", "Equal", "--frames", "18"])
        .assert()
        .success()
        .stdout(contains("rotor angle=0.00 offset=4.50"));
}

#[test]
fn held_key_stays_down_when_also_pressed() {
    labs()
        .args([
            "camera",
            "--summary-only",
            "--press",
            "Equal",
            "--hold",
            "Equal",
            "--frames",
            "2",
        ])
        .assert()
        .success()
        .stdout(contains("rotor angle=40.00 offset=0.50"));
}

#[test]
fn missing_textures_fall_back() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut config = NamedTempFile::new().expect("temp config");
    write!(
        config,
        "<lab><window><title>blank</title></window><assets>{}</assets></lab>",
        dir.path().display()
    )
    .expect("write config");

    labs()
        .args(["helicopter", "--summary-only", "--config"])
        .arg(config.path())
        .assert()
        .success()
        .stdout(contains("Loaded helicopter lab: \"blank\" 800x450 at 60 fps"))
        .stdout(contains("camera mode=Custom"));
}

#[test]
fn config_overrides_window_settings() {
    let mut config = NamedTempFile::new().expect("temp config");
    config
        .write_all(
            br#"<lab>
  <window><width>1024</width><height>768</height></window>
  <target-fps>30</target-fps>
</lab>"#,
        )
        .expect("write config");

    labs()
        .args(["lighting", "--summary-only", "--press", "Tab", "--config"])
        .arg(config.path())
        .assert()
        .success()
        .stdout(contains("1024x768 at 30 fps"))
        .stdout(contains("light enabled=false"))
        .stdout(contains("material=obsidian"));
}

#[test]
fn bad_config_value_is_reported() {
    let mut config = NamedTempFile::new().expect("temp config");
    config
        .write_all(b"<lab><target-fps>fast</target-fps></lab>")
        .expect("write config");

    labs()
        .args(["camera", "--summary-only", "--config"])
        .arg(config.path())
        .assert()
        .failure()
        .stderr(contains("invalid value \"fast\" for <target-fps>"));
}

#[test]
fn unknown_lab_is_rejected() {
    labs()
        .args(["lab9", "--summary-only"])
        .assert()
        .failure()
        .stderr(contains("unknown lab"));
}

#[test]
fn unknown_key_is_rejected() {
    labs()
        .args(["camera", "--summary-only", "--press", "Hyper"])
        .assert()
        .failure()
        .stderr(contains("unknown key or button \"Hyper\""));
}
