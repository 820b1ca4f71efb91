//! End-to-end runs of the `kiln` binary against temporary projects.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const KILN_TOML: &str = r#"
[[entries]]
name = "home"
modules = ["src/home.ts"]

[[entries]]
name = "account"
modules = ["src/account.ts"]
"#;

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("src");
    fs::create_dir_all(&src).unwrap();
    fs::write(dir.path().join("kiln.toml"), KILN_TOML).unwrap();
    fs::write(
        src.join("home.ts"),
        "import { shared } from './shared.ts';\nconst about = () => import('./about.ts');\nconsole.log(shared, about);\n",
    )
    .unwrap();
    fs::write(
        src.join("account.ts"),
        "import { shared } from './shared.ts';\nconsole.log(shared);\n",
    )
    .unwrap();
    fs::write(src.join("shared.ts"), "export const shared = 1;\n").unwrap();
    fs::write(src.join("about.ts"), "export default 'about';\n").unwrap();
    dir
}

fn kiln(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("kiln").unwrap();
    cmd.current_dir(root)
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1")
        .arg("--no-color");
    cmd
}

fn manifest(root: &Path) -> serde_json::Value {
    let raw = fs::read(root.join("dist").join("bundle-manifest.json")).unwrap();
    serde_json::from_slice(&raw).unwrap()
}

#[test]
fn build_writes_chunks_and_manifest() {
    let dir = project();

    kiln(dir.path())
        .arg("build")
        .assert()
        .success()
        .stderr(predicate::str::contains("wrote 4 chunk(s)"));

    let manifest = manifest(dir.path());
    let names: Vec<_> = manifest["chunks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|chunk| chunk["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["shared", "home", "account", "about"]);

    for chunk in manifest["chunks"].as_array().unwrap() {
        let file = chunk["file"].as_str().unwrap();
        assert!(dir.path().join("dist").join(file).is_file(), "{file} missing");
    }
    assert!(dir.path().join(".kiln/cache/kiln.redb").is_file());
}

#[test]
fn second_build_is_served_from_the_cache() {
    let dir = project();
    kiln(dir.path()).arg("build").assert().success();
    let first = manifest(dir.path());

    kiln(dir.path())
        .arg("build")
        .assert()
        .success()
        .stderr(predicate::str::contains("0 transpiled"));

    assert_eq!(first, manifest(dir.path()));
}

#[test]
fn editing_a_shared_module_renames_dependent_chunks() {
    let dir = project();
    kiln(dir.path()).arg("build").assert().success();
    let before = manifest(dir.path());

    fs::write(
        dir.path().join("src/shared.ts"),
        "export const shared = 2;\n",
    )
    .unwrap();
    kiln(dir.path()).args(["build", "--clean"]).assert().success();
    let after = manifest(dir.path());

    let file = |manifest: &serde_json::Value, index: usize| {
        manifest["chunks"][index]["file"].as_str().unwrap().to_string()
    };
    assert_ne!(file(&before, 0), file(&after, 0), "shared chunk content changed");
    assert_ne!(file(&before, 1), file(&after, 1), "home embeds shared's token");
    assert_eq!(file(&before, 3), file(&after, 3), "about does not import shared");
}

#[test]
fn broken_import_fails_the_build() {
    let dir = project();
    fs::write(
        dir.path().join("src/account.ts"),
        "import { gone } from './gone.ts';\nconsole.log(gone);\n",
    )
    .unwrap();

    kiln(dir.path())
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to compile"));
    assert!(!dir.path().join("dist/bundle-manifest.json").exists());
}

#[test]
fn missing_entries_are_reported() {
    let dir = TempDir::new().unwrap();

    kiln(dir.path())
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no entries specified"));
}

#[test]
fn entry_flag_replaces_configured_entries() {
    let dir = project();

    kiln(dir.path())
        .args(["build", "--entry", "solo=src/account.ts", "--out-dir", "out"])
        .assert()
        .success();

    let raw = fs::read(dir.path().join("out/bundle-manifest.json")).unwrap();
    let manifest: serde_json::Value = serde_json::from_slice(&raw).unwrap();
    let chunks = manifest["chunks"].as_array().unwrap();
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0]["name"], "solo");
    assert_eq!(
        chunks[0]["modules"].as_array().unwrap().len(),
        2,
        "shared.ts and account.ts"
    );
}

#[test]
fn analyze_prints_the_partition() {
    let dir = project();

    let output = kiln(dir.path()).arg("analyze").output().unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let shared = report["shared"]["modules"].as_array().unwrap();
    assert_eq!(shared.len(), 1);
    assert!(shared[0].as_str().unwrap().ends_with("/src/shared.ts"));

    let entries: Vec<_> = report["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| (e["name"].as_str().unwrap(), e["kind"].as_str().unwrap()))
        .collect();
    assert_eq!(
        entries,
        vec![("home", "sync"), ("account", "sync"), ("about", "async")]
    );
}
