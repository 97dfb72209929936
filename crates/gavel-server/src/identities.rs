// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! The actor allow-list consulted by `POST /propose`.
//!
//! Backed by a flat JSON file (`identities.json` by default) rather than a
//! database table — identity management is an external collaborator's
//! concern; this crate only needs a yes/no answer to "is this actor
//! permitted to propose actions".

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct IdentitiesFile {
    actors: Vec<String>,
}

/// Set of `actor_id`s permitted to call `/propose`.
#[derive(Debug, Clone, Default)]
pub struct IdentityAllowList {
    actors: HashSet<String>,
}

impl IdentityAllowList {
    /// Load the allow-list from `path`. A missing file yields an empty
    /// list — every actor is then unauthenticated, which is the fail-closed
    /// default rather than an error.
    pub fn load(path: &str) -> std::io::Result<Self> {
        if !Path::new(path).exists() {
            tracing::warn!(path, "identities file not found, starting with an empty allow-list");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        let file: IdentitiesFile = serde_json::from_str(&text)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        Ok(Self {
            actors: file.actors.into_iter().collect(),
        })
    }

    pub fn is_allowed(&self, actor_id: &str) -> bool {
        self.actors.contains(actor_id)
    }
}
