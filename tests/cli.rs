use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

fn write_scene(xml: &str) -> NamedTempFile {
    let mut tmp = NamedTempFile::new().expect("temp scene");
    tmp.write_all(xml.as_bytes()).expect("write scene");
    tmp
}

#[test]
fn summary_reports_builtin_defaults() {
    let mut cmd = Command::cargo_bin("pet-sims").expect("binary exists");
    cmd.arg("--summary-only");
    cmd.assert()
        .success()
        .stdout(contains("Window: PET SIMS (800x600)"))
        .stdout(contains(
            "Camera: start=(0.00, 0.00, 3.00) speed=2.50 sensitivity=0.10",
        ))
        .stdout(contains("Projection: near=1.10 far=100.00"))
        .stdout(contains(
            "Point light: position=(4.00, 4.00, 0.00) attenuation=(1.000, 0.090, 0.032)",
        ))
        .stdout(contains("Draw list (3 entries):"))
        .stdout(contains(
            " - ground at (0.95, -0.50, 0.10) from resources/textures/wood3.jpg",
        ))
        .stdout(contains(" - dog at (-0.25, -1.00, 0.00)"))
        .stdout(contains(" - statue at (0.80, 0.20, 0.50)"))
        .stdout(contains(" - right: resources/textures/cube/right.jpg"))
        .stdout(contains(" - back: resources/textures/cube/back.jpg"));
}

#[test]
fn summary_applies_scene_overrides() {
    let scene = write_scene(
        r#"<scene>
  <window>
    <title>Pet Preview</title>
    <width>1024</width>
    <height>768</height>
  </window>
  <camera>
    <position>1 2 5</position>
    <speed>4</speed>
  </camera>
  <model>
    <name>cat</name>
    <path>objects/cat/cat.obj</path>
    <position>1 0 -2</position>
    <scale>0.5</scale>
    <rotation axis="0 1 0">90</rotation>
  </model>
</scene>
"#,
    );
    let mut cmd = Command::cargo_bin("pet-sims").expect("binary exists");
    cmd.arg(scene.path()).arg("--summary-only");
    cmd.assert()
        .success()
        .stdout(contains("Window: Pet Preview (1024x768)"))
        .stdout(contains("Camera: start=(1.00, 2.00, 5.00) speed=4.00"))
        .stdout(contains("Draw list (2 entries):"))
        .stdout(contains(" - cat at (1.00, 0.00, -2.00) from "))
        .stdout(contains("objects/cat/cat.obj"))
        .stdout(contains(" - dog").not());
}

#[test]
fn malformed_scene_fails_before_opening_a_window() {
    let scene = write_scene("<scene><projection><near>5</near><far>1</far></projection></scene>");
    let mut cmd = Command::cargo_bin("pet-sims").expect("binary exists");
    cmd.arg(scene.path()).arg("--summary-only");
    cmd.assert()
        .failure()
        .stderr(contains("Error:"))
        .stderr(contains("0 < near < far"));
}

#[test]
fn missing_scene_file_is_reported() {
    let mut cmd = Command::cargo_bin("pet-sims").expect("binary exists");
    cmd.arg("does/not/exist.xml").arg("--summary-only");
    cmd.assert()
        .failure()
        .stderr(contains("failed to load scene does/not/exist.xml"));
}

#[test]
fn unknown_flags_are_rejected() {
    let mut cmd = Command::cargo_bin("pet-sims").expect("binary exists");
    cmd.arg("--fullscreen");
    cmd.assert()
        .failure()
        .stderr(contains("Unknown argument: --fullscreen"));
}
