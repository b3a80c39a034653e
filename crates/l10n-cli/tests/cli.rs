use assert_cmd::prelude::*;
use chrono::{TimeZone, Utc};
use l10n_core::OccurrenceType;
use l10n_store::{MemoryStore, Snapshot};
use predicates::prelude::*;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Command;

const NOW: &str = "2024-06-01T12:00:00Z";

struct Env {
    dir: tempfile::TempDir,
}

impl Env {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut s = Snapshot::default();
        let p = s.add_project("drupal", "Drupal core");
        let r = s.add_release(p, "9.1.0");
        s.add_language("de", "German", 2, "($n!=1)");
        s.add_language("fr", "French", 2, "($n>1)");
        let save = s.add_string("Save", "");
        let items = s.add_string("1 item\0@count items", "");
        s.add_line(save, r, "core/modules/node.module", 12, OccurrenceType::Runtime);
        s.add_line(items, r, "core/includes/common.inc", 99, OccurrenceType::Runtime);
        s.add_translation(
            save,
            "de",
            "Speichern",
            false,
            Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap(),
        );
        MemoryStore::new(s)
            .save_to(&dir.path().join("l10n.json"))
            .expect("save fixture");
        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("l10n").expect("binary built");
        cmd.current_dir(self.path())
            .env("L10N_NOW", NOW)
            .env_remove("RUST_LOG")
            .arg("--quiet")
            .arg("--config")
            .arg(self.path().join("l10n.toml"))
            .arg("--data")
            .arg(self.path().join("l10n.json"));
        cmd
    }

    fn files(&self) -> PathBuf {
        self.path().join("files")
    }
}

fn stdout_of(cmd: &mut Command) -> String {
    let assert = cmd.assert().success();
    String::from_utf8_lossy(&assert.get_output().stdout).to_string()
}

#[test]
fn export_po_to_stdout() {
    let env = Env::new();
    let stdout = stdout_of(env.cmd().args([
        "export",
        "--project",
        "drupal",
        "--release",
        "9.1.0",
        "--lang",
        "de",
    ]));
    insta::assert_snapshot!("export_de_po", stdout);
}

#[test]
fn export_template_reports_json() {
    let env = Env::new();
    let out = env.path().join("out");
    std::fs::create_dir_all(&out).unwrap();
    let stdout = stdout_of(
        env.cmd()
            .args(["export", "--project", "drupal", "--release", "9.1.0", "--template"])
            .arg("--out")
            .arg(&out)
            .args(["--format", "json"]),
    );
    let v: Value = serde_json::from_str(&stdout).expect("valid json");
    assert_eq!(v["filename"], "drupal-9.1.0.pot");
    assert_eq!(v["strings"], 2);
    assert_eq!(v["template"], true);
    let pot = std::fs::read_to_string(out.join("drupal-9.1.0.pot")).unwrap();
    assert!(pot.contains("msgstr[1] \"\""));
    assert!(!pot.contains("Speichern"));
}

#[test]
fn export_unknown_project_fails() {
    let env = Env::new();
    env.cmd()
        .args(["export", "--project", "nope", "--lang", "de"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("project not found: nope"));
}

#[test]
fn package_release_writes_then_reports_up_to_date() {
    let env = Env::new();
    let files = env.files();
    let stdout = stdout_of(
        env.cmd()
            .args(["package", "--project", "drupal", "--release", "9.1.0", "--no-link"])
            .arg("--directory")
            .arg(&files),
    );
    assert!(stdout.contains("all/drupal/drupal-9.1.0.de.po"));
    let po = std::fs::read_to_string(files.join("all/drupal/drupal-9.1.0.de.po")).unwrap();
    assert!(po.contains("msgstr \"Speichern\""));
    assert!(!po.contains("#:"));

    env.cmd()
        .args(["package", "--project", "drupal", "--release", "9.1.0"])
        .arg("--directory")
        .arg(&files)
        .assert()
        .success()
        .stderr(predicate::str::contains("up to date"));
}

#[test]
fn package_queue_uses_config() {
    let env = Env::new();
    std::fs::write(
        env.path().join("l10n.toml"),
        "[packager]\ndirectory = \"queue-files\"\nfilepath = \"%project/%language.po\"\n",
    )
    .unwrap();
    let stdout = stdout_of(env.cmd().args(["package", "--format", "json"]));
    let v: Value = serde_json::from_str(&stdout).expect("valid json");
    assert_eq!(v["releases_checked"], 1);
    assert_eq!(v["files_updated"], 1);
    assert!(env.path().join("queue-files/drupal/de.po").is_file());

    let data: Value =
        serde_json::from_str(&std::fs::read_to_string(env.path().join("l10n.json")).unwrap())
            .unwrap();
    assert_eq!(data["packages"][0]["status"], "active");
}

#[test]
fn import_po_updates_translations() {
    let env = Env::new();
    let po = env.path().join("drupal-9.1.0.de.po");
    std::fs::write(
        &po,
        "msgid \"\"\nmsgstr \"\"\n\n#, fuzzy\nmsgid \"Save\"\nmsgstr \"Sichern\"\n\nmsgid \"1 item\"\nmsgid_plural \"@count items\"\nmsgstr[0] \"1 Element\"\nmsgstr[1] \"@count Elemente\"\n",
    )
    .unwrap();
    let stdout = stdout_of(
        env.cmd()
            .args(["import-po", "--project", "drupal", "--lang", "de", "--format", "json"])
            .arg("--po")
            .arg(&po),
    );
    let v: Value = serde_json::from_str(&stdout).expect("valid json");
    assert_eq!(v["added"], 1);
    assert_eq!(v["suggestions"], 1);

    let body = stdout_of(env.cmd().args([
        "export",
        "--project",
        "drupal",
        "--lang",
        "de",
        "--suggestions",
    ]));
    assert!(body.contains("msgstr[1] \"@count Elemente\""));
    assert!(body.contains("# suggestion: Sichern"));
    assert!(body.contains("msgstr \"Speichern\""));
}

#[test]
fn releases_lists_and_registers_archives() {
    let env = Env::new();
    let archives = env.path().join("archives");
    std::fs::create_dir_all(&archives).unwrap();
    std::fs::write(archives.join("drupal-9.1.1.tar.gz"), b"").unwrap();
    std::fs::write(archives.join("views-7.x-3.24.tgz"), b"").unwrap();

    let stdout = stdout_of(
        env.cmd()
            .args(["releases", "--source", "filesystem", "--register"])
            .arg("--path")
            .arg(&archives),
    );
    assert!(stdout.contains("drupal\t9.1.1"));
    assert!(stdout.contains("views\t7.x-3.24"));

    let data: Value =
        serde_json::from_str(&std::fs::read_to_string(env.path().join("l10n.json")).unwrap())
            .unwrap();
    assert_eq!(data["releases"].as_array().unwrap().len(), 3);
}

#[test]
fn releases_requires_path_for_feeds() {
    let env = Env::new();
    env.cmd()
        .args(["releases", "--source", "restapi"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--path"));
}

#[test]
fn schema_writes_json_files() {
    let env = Env::new();
    let out = env.path().join("schemas");
    env.cmd()
        .arg("schema")
        .arg("--out-dir")
        .arg(&out)
        .assert()
        .success();
    for name in [
        "export_report.schema.json",
        "package_report.schema.json",
        "snapshot.schema.json",
    ] {
        let text = std::fs::read_to_string(out.join(name)).unwrap();
        let v: Value = serde_json::from_str(&text).unwrap();
        assert!(v.get("title").is_some(), "{name} has a title");
    }
}
