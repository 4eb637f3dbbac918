use assert_cmd::{Command, cargo::cargo_bin_cmd};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub fn descsync_cmd(cwd: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("descsync");
    cmd.arg("-C").arg(cwd);
    cmd
}

/// Write a description store in the on-disk TOML format.
pub fn write_store(path: &Path, computers: &[(&str, Option<&str>)]) {
    let mut content = String::from("[metadata]\nversion = 1\n");
    for (name, description) in computers {
        content.push_str(&format!("\n[computers.\"{name}\"]\n"));
        if let Some(description) = description {
            content.push_str(&format!("description = \"{description}\"\n"));
        }
    }
    fs::write(path, content).unwrap();
}

/// A working directory with a config pointing at `directory.toml` and
/// `hosts.toml`, and transcripts written to `logs/`.
pub fn workspace(directory: &[(&str, Option<&str>)], hosts: &[(&str, Option<&str>)]) -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("descsync.toml"),
        "transcript_dir = \"logs\"\n\n[directory]\nfile = \"directory.toml\"\n\n[hosts]\nfile = \"hosts.toml\"\n",
    )
    .unwrap();
    write_store(&temp.path().join("directory.toml"), directory);
    write_store(&temp.path().join("hosts.toml"), hosts);
    temp
}

// Not every integration test crate inspects the directory store afterwards.
#[allow(dead_code)]
pub fn directory_contents(cwd: &Path) -> String {
    fs::read_to_string(cwd.join("directory.toml")).unwrap()
}
