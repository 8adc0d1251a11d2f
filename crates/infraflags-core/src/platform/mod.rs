//! Narrow interface onto the infrastructure-automation platform.
//!
//! The resolver only ever talks to [`PlatformApi`]. Wire details (URLs, auth,
//! pagination, how computed values are stored) live in the adapters.

pub mod http;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use http::{HttpPlatform, HttpPlatformConfig};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Identifier of a change set on the platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotId(pub String);

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which change set to read. `Head` is the platform's live baseline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SnapshotRef {
    #[default]
    Head,
    Id(SnapshotId),
}

impl SnapshotRef {
    pub fn from_option(id: Option<String>) -> Self {
        match id {
            Some(id) => SnapshotRef::Id(SnapshotId(id)),
            None => SnapshotRef::Head,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentRef(pub String);

impl fmt::Display for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compound search predicate: schema kind AND application name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentQuery {
    pub kind: String,
    pub application: String,
}

// ---------------------------------------------------------------------------
// PlatformApi
// ---------------------------------------------------------------------------

#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// Identifier of the current baseline change set.
    ///
    /// # Errors
    ///
    /// `SnapshotResolution` when no baseline exists or it is not readable.
    async fn resolve_current_baseline(&self) -> Result<SnapshotId>;

    /// Components matching `query` in `snapshot`, in the platform's stable order.
    async fn search(&self, snapshot: &SnapshotId, query: &ComponentQuery)
        -> Result<Vec<ComponentRef>>;

    /// Raw computed value named `projection` on `component`.
    async fn get_computed_projection(
        &self,
        snapshot: &SnapshotId,
        component: &ComponentRef,
        projection: &str,
    ) -> Result<serde_json::Value>;
}
