use crate::connect::{self, PlatformArgs};
use crate::output::print_json;
use clap::Args;
use infraflags_core::check::{self, CheckReport, CheckRequest};
use infraflags_core::paths;
use infraflags_core::platform::SnapshotRef;
use infraflags_core::report::{failure_json, render_failure, render_report};
use infraflags_core::requirements::read_requirements;
use infraflags_core::{FlagsError, Status};
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Application name (default: `application` from config)
    #[arg(long)]
    pub app: Option<String>,

    /// Target environment (e.g. pr, dev, preprod, prod)
    #[arg(long)]
    pub env: String,

    /// Change set id (default: the HEAD change set)
    #[arg(long)]
    pub change_set: Option<String>,

    /// Requirements file (default: requirements.path from config)
    #[arg(long)]
    pub requirements: Option<PathBuf>,

    /// Key in the requirements file holding the flag list
    #[arg(long)]
    pub key: Option<String>,

    #[command(flatten)]
    pub platform: PlatformArgs,
}

/// Run a reconciliation. Platform and requirement failures are reported as an
/// indeterminate result rather than returned as errors.
pub fn run(root: &Path, args: CheckArgs, json: bool) -> anyhow::Result<Status> {
    let mut config = connect::load_config(root)?;
    args.platform.apply(&mut config);

    let application = args
        .app
        .or_else(|| config.application.clone())
        .ok_or_else(|| {
            anyhow::anyhow!(
                "no application given\nPass --app or set 'application' in .infraflags/config.yaml"
            )
        })?;

    if !config.allows_environment(&args.env) {
        anyhow::bail!(
            "unknown environment '{}'; expected one of: {}",
            args.env,
            config.environments.join(", ")
        );
    }

    let requirements_path = paths::requirements_path(
        root,
        args.requirements
            .as_deref()
            .unwrap_or(config.requirements.path.as_path()),
    );
    let request = CheckRequest {
        application,
        environment: args.env,
        snapshot: SnapshotRef::from_option(args.change_set),
        requirements_path,
        requirements_key: args.key.unwrap_or_else(|| config.requirements.key.clone()),
    };

    let platform = connect::platform(&config)?;
    let policy = connect::retry_policy(&config);
    let settings = config.platform.resolver_settings();
    let rt = connect::runtime()?;

    let outcome = rt.block_on(async {
        let platform = &platform;
        let request = &request;
        tokio::select! {
            r = policy.run(move || check::run(platform, settings.clone(), request)) => Some(r),
            _ = tokio::signal::ctrl_c() => None,
        }
    });

    match outcome {
        Some(Ok(report)) => {
            emit_report(&report, None, json)?;
            Ok(report.result.status)
        }
        Some(Err(e)) => {
            let required =
                read_requirements(&request.requirements_path, &request.requirements_key)
                    .unwrap_or_default();
            let report = CheckReport::indeterminate(&request, required);
            emit_report(&report, Some(&e), json)?;
            Ok(Status::Indeterminate)
        }
        None => {
            eprintln!("infraflags: cancelled; deployed state not confirmed");
            Ok(Status::Indeterminate)
        }
    }
}

fn emit_report(report: &CheckReport, error: Option<&FlagsError>, json: bool) -> anyhow::Result<()> {
    if json {
        let mut value = serde_json::to_value(report)?;
        value["checked_at"] = serde_json::json!(chrono::Utc::now().to_rfc3339());
        if let Some(e) = error {
            value["error"] = failure_json(e);
        }
        return print_json(&value);
    }

    match error {
        Some(e) => print!("{}", render_failure(report, e)),
        None => print!("{}", render_report(report)),
    }
    Ok(())
}
