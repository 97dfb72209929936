// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! Workspace snapshotting and diffing.
//!
//! Taken before and after a sandboxed run, two [`WorkspaceSnapshot`]s are
//! compared into a [`WorkspaceDiff`] naming only paths — file contents
//! never leave the sandbox via the diff itself, only via `stdout`/`stderr`
//! or whatever the command itself prints.

use std::collections::BTreeMap;
use std::path::Path;

use gavel_core::hash::sha256_hex;
use gavel_core::types::WorkspaceDiff;

/// Relative path -> content hash, for every file under a workspace root at
/// a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkspaceSnapshot {
    files: BTreeMap<String, String>,
}

impl WorkspaceSnapshot {
    /// Walk `root` recursively and hash every regular file's contents.
    /// Missing directories snapshot as empty rather than erroring — a
    /// Blast Box workspace that doesn't exist yet is simply empty.
    pub fn capture(root: &Path) -> std::io::Result<Self> {
        let mut files = BTreeMap::new();
        if root.is_dir() {
            walk(root, root, &mut files)?;
        }
        Ok(Self { files })
    }

    pub fn diff(&self, after: &WorkspaceSnapshot) -> WorkspaceDiff {
        let mut added = Vec::new();
        let mut modified = Vec::new();
        let mut deleted = Vec::new();

        for (path, after_hash) in &after.files {
            match self.files.get(path) {
                None => added.push(path.clone()),
                Some(before_hash) if before_hash != after_hash => modified.push(path.clone()),
                Some(_) => {}
            }
        }
        for path in self.files.keys() {
            if !after.files.contains_key(path) {
                deleted.push(path.clone());
            }
        }

        added.sort();
        modified.sort();
        deleted.sort();
        WorkspaceDiff { added, modified, deleted }
    }
}

fn walk(
    root: &Path,
    dir: &Path,
    out: &mut BTreeMap<String, String>,
) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            walk(root, &path, out)?;
        } else if path.is_file() {
            let contents = std::fs::read(&path)?;
            let relative = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");
            out.insert(relative, sha256_hex(&contents));
        }
    }
    Ok(())
}
