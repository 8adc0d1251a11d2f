use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

// ---------------------------------------------------------------------------
// TransportError
// ---------------------------------------------------------------------------

/// Failures talking to the platform API. Never retried inside the core.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("platform request timed out after {}s", after.as_secs_f64())]
    Timeout { after: Duration },

    #[error("platform unreachable: {0}")]
    Unreachable(String),

    #[error("platform rejected credentials (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("platform returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected platform response: {0}")]
    Protocol(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            return TransportError::Protocol(e.to_string());
        }
        if let Some(status) = e.status() {
            return TransportError::Status {
                status: status.as_u16(),
                body: e.to_string(),
            };
        }
        TransportError::Unreachable(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// FlagsError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum FlagsError {
    #[error("malformed requirements file {}: {diagnostic}", path.display())]
    Configuration { path: PathBuf, diagnostic: String },

    #[error("malformed config file {}: {diagnostic}", path.display())]
    ConfigFile { path: PathBuf, diagnostic: String },

    #[error("could not resolve change set: {reason}")]
    SnapshotResolution { reason: String },

    #[error(
        "no '{kind}' component found for application '{application}' in change set {snapshot}"
    )]
    ComponentNotFound {
        kind: String,
        application: String,
        snapshot: String,
    },

    #[error("could not parse flag projection of component {component}: {reason}")]
    ProjectionParse {
        component: String,
        reason: String,
        /// Raw payload as received, kept for operator debugging.
        raw: String,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl FlagsError {
    /// Stable snake_case name of the failure class, used in JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            FlagsError::Configuration { .. } | FlagsError::ConfigFile { .. } => {
                "configuration_error"
            }
            FlagsError::SnapshotResolution { .. } => "snapshot_resolution_error",
            FlagsError::ComponentNotFound { .. } => "component_not_found_error",
            FlagsError::ProjectionParse { .. } => "projection_parse_error",
            FlagsError::Transport(_) => "transport_error",
            FlagsError::Io(_) | FlagsError::Yaml(_) | FlagsError::Json(_) => "configuration_error",
        }
    }

    /// Only transport failures are worth another attempt; everything else
    /// will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FlagsError::Transport(_))
    }

    /// What the operator should do next.
    pub fn remediation(&self) -> String {
        match self {
            FlagsError::Configuration { path, .. } => format!(
                "Fix the YAML syntax in {}. It must be a mapping with a list of flag names, \
                 e.g.\n  flags:\n    - baseline\n    - redis",
                path.display()
            ),
            FlagsError::ConfigFile { path, .. } => format!(
                "Fix the YAML in {} or delete it to fall back to defaults. \
                 `infraflags config init` writes a fresh one.",
                path.display()
            ),
            FlagsError::SnapshotResolution { .. } => {
                "Check that the workspace id is correct, that the API token can read it, \
                 and that the workspace has a HEAD change set. Pass --change-set to pin one \
                 explicitly."
                    .to_string()
            }
            FlagsError::ComponentNotFound {
                kind, application, ..
            } => format!(
                "Searched for components of kind '{kind}' whose application is \
                 '{application}' and found none. Create a '{kind}' component for \
                 '{application}' on the platform and apply it, or check the application \
                 name for typos."
            ),
            FlagsError::ProjectionParse { raw, .. } => format!(
                "The component's computed flag mapping is not in the expected shape \
                 ({{\"byFlag\": {{flag: [env, ...]}}}}). Re-run the component's \
                 functions on the platform.\nRaw payload:\n{raw}"
            ),
            FlagsError::Transport(TransportError::Unauthorized { .. }) => {
                "Check that the API token is set and has not expired.".to_string()
            }
            FlagsError::Transport(TransportError::Timeout { .. }) => {
                "The platform did not answer in time. Raise --timeout or retry with \
                 --retries."
                    .to_string()
            }
            FlagsError::Transport(_) => {
                "Check the platform base URL and network connectivity, then retry.".to_string()
            }
            FlagsError::Io(_) | FlagsError::Yaml(_) | FlagsError::Json(_) => {
                "Check the infraflags configuration file.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, FlagsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transport_is_retryable() {
        let t = FlagsError::from(TransportError::Unreachable("refused".into()));
        assert!(t.is_retryable());
        let c = FlagsError::ComponentNotFound {
            kind: "InfraFlags".into(),
            application: "shop".into(),
            snapshot: "cs-1".into(),
        };
        assert!(!c.is_retryable());
    }

    #[test]
    fn component_not_found_remediation_names_search() {
        let e = FlagsError::ComponentNotFound {
            kind: "InfraFlags".into(),
            application: "shop".into(),
            snapshot: "cs-1".into(),
        };
        assert_eq!(e.kind(), "component_not_found_error");
        let text = e.remediation();
        assert!(text.contains("InfraFlags"));
        assert!(text.contains("'shop'"));
    }

    #[test]
    fn projection_parse_remediation_includes_raw_payload() {
        let e = FlagsError::ProjectionParse {
            component: "c-1".into(),
            reason: "missing byFlag".into(),
            raw: "{\"nope\":1}".into(),
        };
        assert!(e.remediation().contains("{\"nope\":1}"));
    }

    #[test]
    fn config_file_error_points_at_config_not_requirements() {
        let e = FlagsError::ConfigFile {
            path: PathBuf::from(".infraflags/config.yaml"),
            diagnostic: "bad".into(),
        };
        assert_eq!(e.kind(), "configuration_error");
        assert!(e.to_string().starts_with("malformed config file"));
        let text = e.remediation();
        assert!(text.contains("config init"));
        assert!(!text.contains("flags:"));
    }

    #[test]
    fn timeout_message_mentions_duration() {
        let e = TransportError::Timeout {
            after: Duration::from_secs(5),
        };
        assert!(e.to_string().contains("5s"));
    }
}
