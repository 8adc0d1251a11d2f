use crate::error::{FlagsError, Result};
use crate::paths;
use crate::platform::HttpPlatformConfig;
use crate::requirements::{DEFAULT_REQUIREMENTS_FILE, DEFAULT_REQUIREMENTS_KEY};
use crate::resolver::{ResolverSettings, DEFAULT_COMPONENT_KIND, DEFAULT_PROJECTION};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// PlatformSettings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub workspace_id: String,
    /// Name of the environment variable holding the API token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_component_kind")]
    pub component_kind: String,
    #[serde(default = "default_application_attribute")]
    pub application_attribute: String,
    #[serde(default = "default_projection")]
    pub projection: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_base_url() -> String {
    "https://api.systeminit.com".to_string()
}

fn default_token_env() -> String {
    "SI_API_TOKEN".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_component_kind() -> String {
    DEFAULT_COMPONENT_KIND.to_string()
}

fn default_application_attribute() -> String {
    "/domain/application".to_string()
}

fn default_projection() -> String {
    DEFAULT_PROJECTION.to_string()
}

fn default_page_size() -> u32 {
    50
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            workspace_id: String::new(),
            token_env: default_token_env(),
            timeout_seconds: default_timeout_seconds(),
            component_kind: default_component_kind(),
            application_attribute: default_application_attribute(),
            projection: default_projection(),
            page_size: default_page_size(),
        }
    }
}

impl PlatformSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn http_config(&self, token: Option<String>) -> HttpPlatformConfig {
        HttpPlatformConfig {
            base_url: self.base_url.clone(),
            workspace_id: self.workspace_id.clone(),
            token,
            application_attribute: self.application_attribute.clone(),
            page_size: self.page_size,
            request_timeout: self.timeout(),
        }
    }

    pub fn resolver_settings(&self) -> ResolverSettings {
        ResolverSettings {
            component_kind: self.component_kind.clone(),
            projection: self.projection.clone(),
            timeout: Some(self.timeout()),
        }
    }
}

// ---------------------------------------------------------------------------
// RequirementsConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequirementsConfig {
    #[serde(default = "default_requirements_path")]
    pub path: PathBuf,
    #[serde(default = "default_requirements_key")]
    pub key: String,
}

fn default_requirements_path() -> PathBuf {
    PathBuf::from(DEFAULT_REQUIREMENTS_FILE)
}

fn default_requirements_key() -> String {
    DEFAULT_REQUIREMENTS_KEY.to_string()
}

impl Default for RequirementsConfig {
    fn default() -> Self {
        Self {
            path: default_requirements_path(),
            key: default_requirements_key(),
        }
    }
}

// ---------------------------------------------------------------------------
// RetryConfig
// ---------------------------------------------------------------------------

/// Retries for transport failures. Applied by the caller, never inside the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default)]
    pub attempts: u32,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

fn default_backoff_ms() -> u64 {
    500
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 0,
            backoff_ms: default_backoff_ms(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    /// Default application name for checks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<String>,
    #[serde(default)]
    pub platform: PlatformSettings,
    #[serde(default)]
    pub requirements: RequirementsConfig,
    /// Environments accepted by `--env`. Empty accepts anything.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environments: Vec<String>,
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            application: None,
            platform: PlatformSettings::default(),
            requirements: RequirementsConfig::default(),
            environments: Vec::new(),
            retry: RetryConfig::default(),
        }
    }
}

impl Config {
    /// Load `.infraflags/config.yaml`; defaults when the file does not exist.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&data).map_err(|e| FlagsError::ConfigFile {
            path,
            diagnostic: e.to_string(),
        })
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn allows_environment(&self, environment: &str) -> bool {
        self.environments.is_empty() || self.environments.iter().any(|e| e == environment)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let mut push = |level: WarnLevel, message: String| {
            warnings.push(ConfigWarning { level, message })
        };

        let base_url = self.platform.base_url.trim();
        if base_url.is_empty() {
            push(WarnLevel::Error, "platform.base_url is empty".to_string());
        } else if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            push(
                WarnLevel::Warning,
                format!("platform.base_url '{base_url}' is not an http(s) URL"),
            );
        }

        if self.platform.workspace_id.trim().is_empty() {
            push(
                WarnLevel::Warning,
                "platform.workspace_id is not set; pass --workspace or INFRAFLAGS_WORKSPACE_ID"
                    .to_string(),
            );
        }

        if self.platform.timeout_seconds == 0 {
            push(
                WarnLevel::Error,
                "platform.timeout_seconds is 0; every request would time out".to_string(),
            );
        }

        if self.platform.page_size == 0 {
            push(WarnLevel::Error, "platform.page_size must be positive".to_string());
        }

        if self.requirements.key.trim().is_empty() {
            push(WarnLevel::Error, "requirements.key is empty".to_string());
        }

        if self.retry.attempts > 10 {
            push(
                WarnLevel::Warning,
                format!(
                    "retry.attempts={} (>10 is unusual)",
                    self.retry.attempts
                ),
            );
        }

        let mut seen = HashSet::new();
        for env in &self.environments {
            if !seen.insert(env.as_str()) {
                push(
                    WarnLevel::Warning,
                    format!("environment '{env}' is listed more than once"),
                );
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::load(dir.path()).unwrap();
        assert_eq!(cfg.version, 1);
        assert_eq!(cfg.platform.token_env, "SI_API_TOKEN");
        assert_eq!(cfg.platform.component_kind, "InfraFlags");
        assert_eq!(cfg.requirements.key, "flags");
        assert_eq!(cfg.retry.attempts, 0);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let yaml = "platform:\n  workspace_id: ws-1\n  timeout_seconds: 5\nenvironments: [dev, prod]\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.platform.workspace_id, "ws-1");
        assert_eq!(cfg.platform.timeout(), Duration::from_secs(5));
        assert_eq!(cfg.platform.page_size, 50);
        assert!(cfg.allows_environment("dev"));
        assert!(!cfg.allows_environment("staging"));
    }

    #[test]
    fn malformed_file_is_configuration_error() {
        let dir = TempDir::new().unwrap();
        let path = paths::config_path(dir.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "platform: [unclosed\n").unwrap();
        let err = Config::load(dir.path()).unwrap_err();
        assert!(matches!(err, FlagsError::ConfigFile { .. }));
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let mut cfg = Config::default();
        cfg.application = Some("shop".to_string());
        cfg.platform.workspace_id = "ws-9".to_string();
        cfg.save(dir.path()).unwrap();
        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded.application.as_deref(), Some("shop"));
        assert_eq!(loaded.platform.workspace_id, "ws-9");
    }

    #[test]
    fn empty_environment_list_allows_anything() {
        assert!(Config::default().allows_environment("anything"));
    }

    #[test]
    fn validate_default_only_warns_about_workspace() {
        let warnings = Config::default().validate();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].level, WarnLevel::Warning);
        assert!(warnings[0].message.contains("workspace_id"));
    }

    #[test]
    fn validate_flags_errors() {
        let mut cfg = Config::default();
        cfg.platform.workspace_id = "ws".to_string();
        cfg.platform.base_url = String::new();
        cfg.platform.timeout_seconds = 0;
        cfg.platform.page_size = 0;
        cfg.requirements.key = " ".to_string();
        let warnings = cfg.validate();
        assert_eq!(
            warnings.iter().filter(|w| w.level == WarnLevel::Error).count(),
            4
        );
    }

    #[test]
    fn validate_duplicate_environment_and_retries() {
        let mut cfg = Config::default();
        cfg.platform.workspace_id = "ws".to_string();
        cfg.environments = vec!["dev".into(), "prod".into(), "dev".into()];
        cfg.retry.attempts = 15;
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.message.contains("'dev' is listed more than once")));
        assert!(warnings.iter().any(|w| w.message.contains("retry.attempts=15")));
    }

    #[test]
    fn resolver_settings_carry_timeout() {
        let cfg = Config::default();
        let s = cfg.platform.resolver_settings();
        assert_eq!(s.timeout, Some(Duration::from_secs(30)));
        assert_eq!(s.projection, "/domain/flagMapping");
    }
}
