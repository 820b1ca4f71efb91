//! Layered loading: defaults < kiln.toml < KILN_* env < overrides.

use std::fs;
use std::path::PathBuf;

use kiln_config::{ConfigDiscovery, ConfigError, ConfigOverrides, EntryConfig, KilnConfig};
use serial_test::serial;
use tempfile::TempDir;

const KILN_TOML: &str = r#"
out_dir = "public/build"
external = ["^https://cdn\\.example\\.com/"]
compile_remote = ["https://esm.sh/"]

[import_map]
react = "https://esm.sh/react@18"
"@app/" = "/src/"

[[entries]]
name = "vendor"
modules = ["react"]
preload = true

[[entries]]
name = "home"
modules = ["src/pages/home.ts"]

[dev]
debounce_ms = 120
"#;

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("kiln.toml"), KILN_TOML).unwrap();
    dir
}

struct EnvGuard(&'static [&'static str]);

impl EnvGuard {
    fn set(vars: &'static [(&'static str, &'static str)], names: &'static [&'static str]) -> Self {
        for (key, value) in vars {
            // Tests touching the environment are serialized.
            unsafe { std::env::set_var(key, value) };
        }
        Self(names)
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for key in self.0 {
            unsafe { std::env::remove_var(key) };
        }
    }
}

#[test]
#[serial]
fn defaults_apply_without_a_file() {
    let dir = TempDir::new().unwrap();
    let config = ConfigDiscovery::new(dir.path())
        .extract(&ConfigOverrides::default())
        .unwrap();

    assert_eq!(config.root, dir.path());
    assert_eq!(config.out_dir, PathBuf::from("dist"));
    assert_eq!(config.cache_dir, PathBuf::from(".kiln/cache"));
    assert_eq!(config.dev.debounce_ms, 50);
    assert!(config.entries.is_empty());
}

#[test]
#[serial]
fn load_without_entries_fails_validation() {
    let dir = TempDir::new().unwrap();
    let err = ConfigDiscovery::new(dir.path())
        .load(&ConfigOverrides::default())
        .unwrap_err();
    assert!(matches!(err, ConfigError::NoEntries));
}

#[test]
#[serial]
fn file_values_override_defaults() {
    let dir = project();
    let config = ConfigDiscovery::new(dir.path())
        .load(&ConfigOverrides::default())
        .unwrap();

    assert_eq!(config.out_dir, PathBuf::from("public/build"));
    assert_eq!(config.out_dir_path(), dir.path().join("public/build"));
    assert_eq!(config.cache_dir, PathBuf::from(".kiln/cache"));
    assert_eq!(config.dev.debounce_ms, 120);
    assert_eq!(config.import_map["react"], "https://esm.sh/react@18");
    assert_eq!(config.import_map["@app/"], "/src/");
    assert_eq!(config.entries.len(), 2);
    assert!(config.entry("vendor").unwrap().preload);
    assert!(!config.entry("home").unwrap().preload);
    assert_eq!(config.entry_specifier("react"), "react");
}

#[test]
#[serial]
fn environment_overrides_the_file() {
    let dir = project();
    let _env = EnvGuard::set(
        &[("KILN_OUT_DIR", "env-dist"), ("KILN_DEV__DEBOUNCE_MS", "15")],
        &["KILN_OUT_DIR", "KILN_DEV__DEBOUNCE_MS"],
    );

    let config = ConfigDiscovery::new(dir.path())
        .load(&ConfigOverrides::default())
        .unwrap();

    assert_eq!(config.out_dir, PathBuf::from("env-dist"));
    assert_eq!(config.dev.debounce_ms, 15);
    assert_eq!(config.entries.len(), 2);
}

#[test]
#[serial]
fn overrides_win_over_everything() {
    let dir = project();
    let _env = EnvGuard::set(&[("KILN_OUT_DIR", "env-dist")], &["KILN_OUT_DIR"]);

    let overrides = ConfigOverrides {
        out_dir: Some(PathBuf::from("cli-dist")),
        entries: vec![EntryConfig::new("main", vec!["src/main.ts".to_string()])],
        ..ConfigOverrides::default()
    };
    let config = ConfigDiscovery::new(dir.path()).load(&overrides).unwrap();

    assert_eq!(config.out_dir, PathBuf::from("cli-dist"));
    assert_eq!(config.entries.len(), 1);
    assert_eq!(config.entries[0].name, "main");
    assert_eq!(config.import_map.len(), 2, "unset overrides keep file values");
}

#[test]
#[serial]
fn malformed_file_is_an_extraction_error() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("kiln.toml"), "out_dir = [1, 2").unwrap();

    let err = ConfigDiscovery::new(dir.path())
        .load(&ConfigOverrides::default())
        .unwrap_err();
    assert!(matches!(err, ConfigError::Extract(_)));
}

#[test]
#[serial]
fn manifest_digests_follow_the_config() {
    let dir = project();
    let discovery = ConfigDiscovery::new(dir.path());
    let first = discovery.load(&ConfigOverrides::default()).unwrap();
    let again = discovery.load(&ConfigOverrides::default()).unwrap();
    assert_eq!(first.build_manifest(), again.build_manifest());

    let edited = KILN_TOML.replace("react@18", "react@19");
    fs::write(dir.path().join("kiln.toml"), edited).unwrap();
    let changed: KilnConfig = discovery.load(&ConfigOverrides::default()).unwrap();

    assert_ne!(first.import_map_digest(), changed.import_map_digest());
    assert_eq!(first.plugin_list_digest(), changed.plugin_list_digest());
}
