//! One reconciliation run: read requirements, resolve deployed flags, compare.

use crate::error::{FlagsError, Result};
use crate::platform::{ComponentRef, PlatformApi, SnapshotId, SnapshotRef};
use crate::reconcile::{reconcile, ReconciliationResult};
use crate::requirements::{read_source, RequirementSet, RequirementSource};
use crate::resolver::{Resolver, ResolverSettings};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct CheckRequest {
    pub application: String,
    pub environment: String,
    pub snapshot: SnapshotRef,
    pub requirements_path: PathBuf,
    pub requirements_key: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub application: String,
    pub environment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<SnapshotId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<ComponentRef>,
    #[serde(flatten)]
    pub result: ReconciliationResult,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl CheckReport {
    /// Report for a run that failed before comparison.
    pub fn indeterminate(request: &CheckRequest, required: RequirementSet) -> Self {
        Self {
            application: request.application.clone(),
            environment: request.environment.clone(),
            snapshot: match &request.snapshot {
                SnapshotRef::Id(id) => Some(id.clone()),
                SnapshotRef::Head => None,
            },
            component: None,
            result: ReconciliationResult::indeterminate(required),
            warnings: Vec::new(),
        }
    }
}

/// Run one check. The requirement read and the platform lookup proceed
/// concurrently; neither depends on the other.
pub async fn run<P: PlatformApi + ?Sized>(
    platform: &P,
    settings: ResolverSettings,
    request: &CheckRequest,
) -> Result<CheckReport> {
    let path = request.requirements_path.clone();
    let key = request.requirements_key.clone();
    let read = tokio::task::spawn_blocking(move || read_source(&path, &key));

    let resolver = Resolver::new(platform, settings);
    let resolve = resolver.resolve_deployed_flags(
        &request.application,
        Some(&request.environment),
        &request.snapshot,
    );

    let (source, resolution) = tokio::join!(read, resolve);
    let source = source.map_err(|e| FlagsError::Io(std::io::Error::other(e)))??;

    let mut warnings = Vec::new();
    let required = match source {
        RequirementSource::Loaded {
            set,
            warnings: read_warnings,
        } => {
            for w in &read_warnings {
                tracing::warn!(path = %request.requirements_path.display(), "{w}");
            }
            warnings.extend(read_warnings);
            set
        }
        RequirementSource::ParseError(diagnostic) => {
            return Err(FlagsError::Configuration {
                path: request.requirements_path.clone(),
                diagnostic,
            })
        }
        RequirementSource::Absent => {
            tracing::debug!(path = %request.requirements_path.display(), "no requirements file");
            RequirementSet::empty()
        }
    };

    let resolution = resolution?;
    warnings.extend(resolution.warnings.iter().cloned());
    let deployed = resolution.deployed_in(&request.environment);
    let result = reconcile(&required, &deployed);

    Ok(CheckReport {
        application: request.application.clone(),
        environment: request.environment.clone(),
        snapshot: Some(resolution.snapshot),
        component: Some(resolution.component),
        result,
        warnings,
    })
}
