use crate::error::{FlagsError, Result, TransportError};
use crate::mapping::FlagMapping;
use crate::platform::{ComponentQuery, ComponentRef, PlatformApi, SnapshotId, SnapshotRef};
use serde::Serialize;
use std::time::Duration;

pub const DEFAULT_COMPONENT_KIND: &str = "InfraFlags";
pub const DEFAULT_PROJECTION: &str = "/domain/flagMapping";

// ---------------------------------------------------------------------------
// ResolverSettings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ResolverSettings {
    /// Schema kind of the component that declares an application's flags.
    pub component_kind: String,
    /// Name of the computed value holding the flag mapping.
    pub projection: String,
    /// Deadline for the whole resolution. `None` leaves it to the adapter.
    pub timeout: Option<Duration>,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            component_kind: DEFAULT_COMPONENT_KIND.to_string(),
            projection: DEFAULT_PROJECTION.to_string(),
            timeout: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Deployed state of one application as of one change set.
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    pub snapshot: SnapshotId,
    pub component: ComponentRef,
    pub mapping: FlagMapping,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl Resolution {
    /// Flags active in `environment`, sorted.
    pub fn deployed_in(&self, environment: &str) -> Vec<String> {
        self.mapping.flags_in(environment)
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

pub struct Resolver<'a, P: PlatformApi + ?Sized> {
    platform: &'a P,
    settings: ResolverSettings,
}

impl<'a, P: PlatformApi + ?Sized> Resolver<'a, P> {
    pub fn new(platform: &'a P, settings: ResolverSettings) -> Self {
        Self { platform, settings }
    }

    /// Fetch the flag mapping for `application`.
    ///
    /// Nothing is cached: every call goes back to the platform. When
    /// `environment` is given and the snapshot never mentions it, a warning is
    /// recorded on the resolution.
    pub async fn resolve_deployed_flags(
        &self,
        application: &str,
        environment: Option<&str>,
        snapshot: &SnapshotRef,
    ) -> Result<Resolution> {
        let work = self.resolve_inner(application, environment, snapshot);
        match self.settings.timeout {
            Some(after) => tokio::time::timeout(after, work)
                .await
                .map_err(|_| FlagsError::from(TransportError::Timeout { after }))?,
            None => work.await,
        }
    }

    async fn resolve_inner(
        &self,
        application: &str,
        environment: Option<&str>,
        snapshot: &SnapshotRef,
    ) -> Result<Resolution> {
        let snapshot = match snapshot {
            SnapshotRef::Id(id) => id.clone(),
            SnapshotRef::Head => self.platform.resolve_current_baseline().await?,
        };

        let query = ComponentQuery {
            kind: self.settings.component_kind.clone(),
            application: application.to_string(),
        };
        let matches = self.platform.search(&snapshot, &query).await?;

        let mut warnings = Vec::new();
        let component = match matches.as_slice() {
            [] => {
                return Err(FlagsError::ComponentNotFound {
                    kind: query.kind,
                    application: query.application,
                    snapshot: snapshot.0,
                })
            }
            [only] => only.clone(),
            [first, ..] => {
                let ids: Vec<&str> = matches.iter().map(|c| c.0.as_str()).collect();
                let msg = format!(
                    "{} '{}' components match application '{}' ({}); using {}",
                    matches.len(),
                    query.kind,
                    application,
                    ids.join(", "),
                    first
                );
                tracing::warn!("{msg}");
                warnings.push(msg);
                first.clone()
            }
        };

        let payload = self
            .platform
            .get_computed_projection(&snapshot, &component, &self.settings.projection)
            .await?;
        let mapping =
            FlagMapping::from_projection(&payload).map_err(|reason| FlagsError::ProjectionParse {
                component: component.to_string(),
                reason,
                raw: payload.to_string(),
            })?;

        if let Some(env) = environment {
            if !mapping.environments().is_empty() && !mapping.has_environment(env) {
                let msg = format!(
                    "environment '{env}' does not appear in change set {snapshot} (known: {})",
                    mapping.environments().join(", ")
                );
                tracing::warn!("{msg}");
                warnings.push(msg);
            }
        }

        tracing::debug!(%snapshot, %component, "resolved deployed flags");
        Ok(Resolution {
            snapshot,
            component,
            mapping,
            warnings,
        })
    }
}
