use anyhow::Context;
use clap::Args;
use infraflags_cli::retry::RetryPolicy;
use infraflags_core::config::Config;
use infraflags_core::platform::HttpPlatform;
use std::path::Path;

/// Platform connection overrides shared by every command that talks to the
/// platform. Values here win over `.infraflags/config.yaml`.
#[derive(Args, Debug, Default)]
pub struct PlatformArgs {
    /// Platform API root
    #[arg(long, env = "INFRAFLAGS_BASE_URL")]
    pub base_url: Option<String>,

    /// Workspace id
    #[arg(long, env = "INFRAFLAGS_WORKSPACE_ID")]
    pub workspace: Option<String>,

    /// Deadline for the platform lookup, in seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Extra attempts on transport failures
    #[arg(long)]
    pub retries: Option<u32>,
}

impl PlatformArgs {
    pub fn apply(&self, config: &mut Config) {
        if let Some(url) = &self.base_url {
            config.platform.base_url = url.clone();
        }
        if let Some(ws) = &self.workspace {
            config.platform.workspace_id = ws.clone();
        }
        if let Some(t) = self.timeout {
            config.platform.timeout_seconds = t;
        }
        if let Some(r) = self.retries {
            config.retry.attempts = r;
        }
    }
}

/// Load `.infraflags/config.yaml`, carrying the fix-it text into the error.
pub fn load_config(root: &Path) -> anyhow::Result<Config> {
    Config::load(root)
        .map_err(|e| anyhow::anyhow!("{e}\n{}", e.remediation()))
        .context("failed to load config")
}

/// Build the HTTP adapter, reading the token from the configured env var.
pub fn platform(config: &Config) -> anyhow::Result<HttpPlatform> {
    if config.platform.workspace_id.trim().is_empty() {
        anyhow::bail!(
            "no workspace id configured\n\
             Set platform.workspace_id in .infraflags/config.yaml, pass --workspace, \
             or export INFRAFLAGS_WORKSPACE_ID"
        );
    }
    let token = std::env::var(&config.platform.token_env)
        .ok()
        .filter(|t| !t.trim().is_empty());
    if token.is_none() {
        tracing::warn!(
            env = %config.platform.token_env,
            "no API token set; sending unauthenticated requests"
        );
    }
    HttpPlatform::new(config.platform.http_config(token)).context("failed to build HTTP client")
}

pub fn retry_policy(config: &Config) -> RetryPolicy {
    RetryPolicy::from(&config.retry)
}

pub fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("failed to start tokio runtime")
}
