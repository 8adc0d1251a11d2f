use crate::connect;
use crate::output::print_json;
use clap::Args;
use infraflags_core::paths;
use infraflags_core::requirements::read_requirements;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct RequirementsArgs {
    /// Requirements file (default: requirements.path from config)
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Key holding the flag list
    #[arg(long)]
    pub key: Option<String>,
}

/// Print the deduplicated requirement set.
pub fn run(root: &Path, args: RequirementsArgs, json: bool) -> anyhow::Result<()> {
    let config = connect::load_config(root)?;
    let path = paths::requirements_path(
        root,
        args.path
            .as_deref()
            .unwrap_or(config.requirements.path.as_path()),
    );
    let key = args.key.unwrap_or(config.requirements.key);

    let set = read_requirements(&path, &key)
        .map_err(|e| anyhow::anyhow!("{e}\n{}", e.remediation()))?;

    if json {
        return print_json(&serde_json::json!({
            "path": path,
            "flags": set,
        }));
    }

    if set.is_empty() {
        println!("No required flags ({}).", path.display());
        return Ok(());
    }
    for flag in set.iter() {
        println!("{flag}");
    }
    Ok(())
}
