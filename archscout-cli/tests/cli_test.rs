use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::{self, File};
use std::io::Write;
use tempfile::{tempdir, TempDir};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

fn create_test_files(dir: &TempDir, files: &[(&str, &str)]) -> Result<()> {
    for (name, content) in files {
        let file_path = dir.path().join(name);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = File::create(file_path)?;
        write!(file, "{}", content)?;
    }
    Ok(())
}

fn cli() -> Result<Command> {
    let mut cmd = Command::cargo_bin("archscout-cli")?;
    cmd.env_remove("RUST_LOG").env("NO_COLOR", "1");
    Ok(cmd)
}

#[test]
fn test_search_directory() -> Result<()> {
    let temp_dir = tempdir()?;
    create_test_files(
        &temp_dir,
        &[
            ("a.txt", "foo bar\nnothing\n"),
            ("b.txt", "one\ntwo\nFOO\n"),
            ("empty.txt", "nothing at all\n"),
        ],
    )?;

    cli()?
        .current_dir(temp_dir.path())
        .args(["search", "-p", "foo", "."])
        .assert()
        .success()
        .stdout(predicate::str::contains("a.txt"))
        .stdout(predicate::str::contains("b.txt"))
        .stdout(predicate::str::contains("empty.txt").not())
        .stdout(predicate::str::contains("Found 2 matches in 2 files"));
    Ok(())
}

#[test]
fn test_search_json_output() -> Result<()> {
    let temp_dir = tempdir()?;
    create_test_files(&temp_dir, &[("b.txt", "one\ntwo\nFOO\n")])?;

    let output = cli()?
        .current_dir(temp_dir.path())
        .args(["search", "-p", "foo", "--json", "."])
        .output()?;
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(value["outcome"], "completed");
    assert_eq!(value["error"], serde_json::Value::Null);
    assert_eq!(value["fileMatches"][0]["path"], "b.txt");
    assert_eq!(value["fileMatches"][0]["lineMatches"][0]["lineNumber"], 2);
    assert_eq!(
        value["fileMatches"][0]["lineMatches"][0]["offsetAndLengths"],
        serde_json::json!([[0, 3]])
    );
    Ok(())
}

#[test]
fn test_search_zip_archive() -> Result<()> {
    let temp_dir = tempdir()?;
    let zip_path = temp_dir.path().join("snapshot.zip");
    let mut writer = ZipWriter::new(File::create(&zip_path)?);
    writer.start_file("src/main.rs", SimpleFileOptions::default())?;
    writer.write_all(b"fn main() {\n    let cat = 1;\n}\n")?;
    writer.start_file("docs/notes.md", SimpleFileOptions::default())?;
    writer.write_all(b"concatenate strings\n")?;
    writer.finish()?;

    cli()?
        .current_dir(temp_dir.path())
        .args(["search", "-p", "cat", "--word", "--stats"])
        .arg(&zip_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 1 matches in 1 files"));
    Ok(())
}

#[test]
fn test_invalid_pattern_fails() -> Result<()> {
    let temp_dir = tempdir()?;
    create_test_files(&temp_dir, &[("a.txt", "text\n")])?;

    cli()?
        .current_dir(temp_dir.path())
        .args(["search", "-p", "(open", "--regex", "."])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid pattern"));
    Ok(())
}

#[test]
fn test_invalid_timeout_fails() -> Result<()> {
    let temp_dir = tempdir()?;
    create_test_files(&temp_dir, &[("a.txt", "text\n")])?;

    cli()?
        .current_dir(temp_dir.path())
        .args(["search", "-p", "text", "--timeout", "eventually", "."])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid timeout"));
    Ok(())
}
