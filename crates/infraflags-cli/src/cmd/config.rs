use crate::connect;
use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use infraflags_core::config::{Config, WarnLevel};
use infraflags_core::{io, paths};
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand, Debug)]
pub enum ConfigSubcommand {
    /// Show the effective configuration (file values over defaults)
    Show,

    /// Validate the config for common mistakes
    Validate,

    /// Write a starter .infraflags/config.yaml and requirements file
    Init {
        /// Default application name
        #[arg(long)]
        app: Option<String>,
        /// Platform workspace id
        #[arg(long)]
        workspace: Option<String>,
    },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(root, json),
        ConfigSubcommand::Validate => validate(root, json),
        ConfigSubcommand::Init { app, workspace } => init(root, app, workspace),
    }
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = connect::load_config(root)?;
    if json {
        return print_json(&config);
    }
    print!("{}", serde_yaml::to_string(&config)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = connect::load_config(root)?;
    let warnings = config.validate();

    if json {
        let value = serde_json::json!({
            "warnings": warnings,
        });
        print_json(&value)?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    let has_errors = warnings.iter().any(|w| w.level == WarnLevel::Error);
    if has_errors {
        anyhow::bail!("config validation found errors");
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

const STARTER_REQUIREMENTS: &str = "\
# Infrastructure flags this application needs in every environment it
# deploys to. `infraflags check --env <env>` fails if any are missing.
flags:
  - baseline
";

fn init(root: &Path, app: Option<String>, workspace: Option<String>) -> anyhow::Result<()> {
    let config_path = paths::config_path(root);
    if config_path.exists() {
        println!("{} already exists; leaving it unchanged.", config_path.display());
    } else {
        let mut config = Config::default();
        config.application = app;
        if let Some(ws) = workspace {
            config.platform.workspace_id = ws;
        }
        config.save(root).context("failed to write config")?;
        println!("Wrote {}", config_path.display());
    }

    let config = connect::load_config(root)?;
    let req_path = paths::requirements_path(root, &config.requirements.path);
    if io::write_if_missing(&req_path, STARTER_REQUIREMENTS.as_bytes())? {
        println!("Wrote {}", req_path.display());
    }
    Ok(())
}
