use crate::connect::{self, PlatformArgs};
use crate::output::{print_json, print_table};
use clap::{Args, ValueEnum};
use infraflags_core::platform::SnapshotRef;
use infraflags_core::{Resolution, Resolver};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum GroupBy {
    #[default]
    Environment,
    Flag,
}

#[derive(Args, Debug)]
pub struct FlagsArgs {
    /// Application name (default: `application` from config)
    #[arg(long)]
    pub app: Option<String>,

    /// Change set id (default: the HEAD change set)
    #[arg(long)]
    pub change_set: Option<String>,

    /// Group rows by environment or by flag
    #[arg(long, value_enum, default_value_t = GroupBy::Environment)]
    pub by: GroupBy,

    #[command(flatten)]
    pub platform: PlatformArgs,
}

/// Print an application's deployed flag mapping.
pub fn run(root: &Path, args: FlagsArgs, json: bool) -> anyhow::Result<()> {
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
    let snapshot = SnapshotRef::from_option(args.change_set);

    let platform = connect::platform(&config)?;
    let policy = connect::retry_policy(&config);
    let resolver = Resolver::new(&platform, config.platform.resolver_settings());
    let rt = connect::runtime()?;

    let resolution = rt
        .block_on(async {
            let resolver = &resolver;
            let application = application.as_str();
            let snapshot = &snapshot;
            tokio::select! {
                r = policy.run(move || resolver.resolve_deployed_flags(application, None, snapshot)) => Some(r),
                _ = tokio::signal::ctrl_c() => None,
            }
        })
        .ok_or_else(|| anyhow::anyhow!("cancelled"))?
        .map_err(|e| anyhow::anyhow!("{e}\n{}", e.remediation()))?;

    if json {
        return print_json(&resolution);
    }
    print_resolution(&resolution, args.by);
    Ok(())
}

fn print_resolution(resolution: &Resolution, by: GroupBy) {
    println!(
        "change set: {} (component {})",
        resolution.snapshot, resolution.component
    );
    for w in &resolution.warnings {
        eprintln!("warning: {w}");
    }
    if resolution.mapping.is_empty() {
        println!("No flags deployed.");
        return;
    }

    let (headers, grouped): ([&str; 2], BTreeMap<String, Vec<String>>) = match by {
        GroupBy::Environment => (["ENVIRONMENT", "FLAGS"], resolution.mapping.by_environment()),
        GroupBy::Flag => (["FLAG", "ENVIRONMENTS"], resolution.mapping.by_flag()),
    };
    let rows = grouped
        .into_iter()
        .map(|(key, values)| vec![key, values.join(", ")])
        .collect();
    print_table(&headers, rows);
}
