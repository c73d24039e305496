// Each integration test file is compiled as its own crate and uses a
// different subset of these helpers.
#![allow(dead_code)]

use assert_cmd::{Command, cargo::cargo_bin_cmd};
use std::fs;
use std::path::{Path, PathBuf};

pub fn snapcheck_cmd(cwd: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("snapcheck");
    cmd.arg("-C").arg(cwd);
    cmd
}

/// A fake digest made of one repeated hex character.
pub fn digest(c: char) -> String {
    std::iter::repeat_n(c, 64).collect()
}

/// Write a snapshot file named `name` in `dir` holding `entries`.
pub fn write_snapshot(dir: &Path, name: &str, entries: &[(&str, char)]) -> PathBuf {
    let mut content = String::from("snapcheck: 2024-01-01-120000\nsnapcheck: /home/user\n\n");
    for (path, c) in entries {
        content.push_str(&format!("{}  {}\n", digest(*c), path));
    }

    let snapshot = dir.join(name);
    fs::write(&snapshot, content).unwrap();
    snapshot
}

pub fn write_config(dir: &Path, yaml: &str) -> PathBuf {
    let config = dir.join("policy.yaml");
    fs::write(&config, yaml).unwrap();
    config
}
