// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! Shared application state handed to every axum handler.
//!
//! The ledger backend (file- or SQL-backed, chosen from `database_url` at
//! startup) is boxed behind `Box<dyn LedgerStorage>` so `AppState` is a
//! single concrete type regardless of which backend `main` wires up.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use gavel_core::{AsyncControlPlane, LedgerStorage};
use gavel_sandbox::{BlastBox, SandboxRuntime};

use crate::config::GatewayConfig;
use crate::identities::IdentityAllowList;

pub type BoxedControlPlane = AsyncControlPlane<Box<dyn LedgerStorage>>;

/// Everything a handler needs, cloned cheaply per request (every field is
/// an `Arc` or a plain `Clone`-able value).
#[derive(Clone)]
pub struct AppState {
    pub control_plane: BoxedControlPlane,
    pub blast_box: Arc<BlastBox>,
    pub sandbox_runtime: Arc<dyn SandboxRuntime>,
    pub identities: Arc<IdentityAllowList>,
    pub human_api_key: Arc<String>,
    pub version: String,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        control_plane: BoxedControlPlane,
        blast_box: BlastBox,
        sandbox_runtime: Arc<dyn SandboxRuntime>,
        identities: IdentityAllowList,
        config: &GatewayConfig,
    ) -> Self {
        Self {
            control_plane,
            blast_box: Arc::new(blast_box),
            sandbox_runtime,
            identities: Arc::new(identities),
            human_api_key: Arc::new(config.human_api_key.clone()),
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: Utc::now(),
        }
    }

    /// Bearer-token check for `/approve` and `/deny`. An empty configured
    /// key means the endpoint is always unauthenticated, per §6.
    pub fn authenticate_bearer(&self, header: Option<&str>) -> bool {
        if self.human_api_key.is_empty() {
            return false;
        }
        match header.and_then(|h| h.strip_prefix("Bearer ")) {
            Some(token) => token == self.human_api_key.as_str(),
            None => false,
        }
    }

    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}
