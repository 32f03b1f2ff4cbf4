use assert_cmd::Command;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const LOCK: &str = r#"
[[group]]
name = "Main"

[[group.package]]
name = "FAKE"
install_folder = "packages/FAKE"
"#;

fn repotools(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("repotools").unwrap();
    cmd.current_dir(dir)
        .env_remove("PAKET_REPOTOOL_PREFERRED_RUNTIME")
        .env_remove("REPOTOOLS_LOG");
    cmd
}

fn setup_project(dir: &Path) {
    let exe = dir.join("packages/FAKE/tools/net461/FAKE.exe");
    fs::create_dir_all(exe.parent().unwrap()).unwrap();
    fs::write(exe, b"MZ").unwrap();
    fs::write(dir.join("repotools.lock"), LOCK).unwrap();
}

#[test]
fn test_execute_init_creates_config() {
    let dir = tempdir().unwrap();
    repotools(dir.path()).arg("init").assert().success();
    assert!(dir.path().join("repotools.toml").exists());
}

#[test]
fn test_execute_install_generates_launchers() {
    let dir = tempdir().unwrap();
    setup_project(dir.path());

    let output = repotools(dir.path())
        .arg("install")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let output_str = String::from_utf8_lossy(&output);
    assert!(output_str.contains("FAKE"));

    let bin = dir.path().join("paket-files").join("bin");
    assert!(bin.join("FAKE").exists());
    assert!(bin.join("FAKE.cmd").exists());
    assert!(dir.path().join("paket-files").join("paket.repotools.csv").exists());
}

#[test]
fn test_execute_install_prefers_runtime_from_env() {
    let dir = tempdir().unwrap();
    setup_project(dir.path());
    let core = dir.path().join("packages/FAKE/tools/netcoreapp3.1/any");
    fs::create_dir_all(&core).unwrap();
    fs::write(core.join("FAKE.dll"), b"MZ").unwrap();
    fs::write(core.join("FAKE.runtimeconfig.json"), "{}").unwrap();

    repotools(dir.path())
        .env("PAKET_REPOTOOL_PREFERRED_RUNTIME", "netcore")
        .arg("install")
        .assert()
        .success();
    let sh = fs::read_to_string(dir.path().join("paket-files/bin/FAKE")).unwrap();
    assert!(sh.contains("dotnet "));
    assert!(sh.contains("FAKE.dll"));
    let cmd = fs::read_to_string(dir.path().join("paket-files/bin/FAKE.cmd")).unwrap();
    assert!(cmd.contains("dotnet "));
}

#[test]
fn test_execute_install_without_lock_fails() {
    let dir = tempdir().unwrap();
    repotools(dir.path()).arg("install").assert().failure();
}

#[test]
fn test_execute_add_then_restore() {
    let dir = tempdir().unwrap();
    setup_project(dir.path());

    repotools(dir.path())
        .args(["add", "FAKE", "--alias", "fake5", "--", "run", "build.fsx"])
        .assert()
        .success();
    let config = fs::read_to_string(dir.path().join("repotools.toml")).unwrap();
    assert!(config.contains("fake5"));

    repotools(dir.path()).arg("restore").assert().success();
    let sh = fs::read_to_string(dir.path().join("paket-files/bin/fake5")).unwrap();
    assert!(sh.ends_with("FAKE.exe\" run build.fsx \"$@\"\n"));
}

#[test]
fn test_execute_add_duplicate_alias_fails() {
    let dir = tempdir().unwrap();
    repotools(dir.path()).args(["add", "FAKE", "--alias", "fake5"]).assert().success();
    repotools(dir.path()).args(["add", "FAKE", "--alias", "fake5"]).assert().failure();
}

#[test]
fn test_execute_path_enable_sh_prints_snippet() {
    let dir = tempdir().unwrap();
    let output = repotools(dir.path())
        .args(["path", "--enable", "--export", "sh"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let output_str = String::from_utf8_lossy(&output);
    let lines: Vec<&str> = output_str.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("echo \"Adding "));
    assert!(lines[1].starts_with("export PATH=\""));
    assert!(lines[1].ends_with("paket-files/bin:$PATH\"") || lines[1].ends_with("paket-files\\bin:$PATH\""));
}

#[test]
fn test_execute_path_disable_cmd_to_file() {
    let dir = tempdir().unwrap();
    repotools(dir.path())
        .args(["path", "--disable", "--export", "cmd", "--export-path", "disable.cmd"])
        .assert()
        .success();
    let content = fs::read_to_string(dir.path().join("disable.cmd")).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("ECHO Removing "));
    assert!(lines[1].starts_with("CALL SET PATH=%%PATH:"));
}

#[test]
fn test_execute_path_rejects_unknown_dialect() {
    let dir = tempdir().unwrap();
    repotools(dir.path())
        .args(["path", "--enable", "--export", "fish"])
        .assert()
        .failure();
}

#[test]
fn test_execute_path_list_by_default() {
    let dir = tempdir().unwrap();
    let output = repotools(dir.path())
        .arg("path")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let output_str = String::from_utf8_lossy(&output);
    assert!(output_str.contains("Tool directory:"));
    assert!(output_str.contains("exists:  no"));
}

#[test]
fn test_execute_list_json() {
    let dir = tempdir().unwrap();
    setup_project(dir.path());
    repotools(dir.path()).arg("install").assert().success();

    let output = repotools(dir.path())
        .args(["list", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let listed: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(listed[0]["group_name"], "Main");
    assert_eq!(listed[0]["commands"][0], "FAKE");
}
