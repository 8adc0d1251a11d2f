use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const INFRAFLAGS_DIR: &str = ".infraflags";
pub const CONFIG_FILE: &str = ".infraflags/config.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Resolve a requirements path relative to the project root unless absolute.
pub fn requirements_path(root: &Path, configured: &Path) -> PathBuf {
    if configured.is_absolute() {
        configured.to_path_buf()
    } else {
        root.join(configured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_under_root() {
        let p = config_path(Path::new("/repo"));
        assert_eq!(p, PathBuf::from("/repo/.infraflags/config.yaml"));
    }

    #[test]
    fn relative_requirements_join_root() {
        let p = requirements_path(Path::new("/repo"), Path::new("deploy/infraflags.yaml"));
        assert_eq!(p, PathBuf::from("/repo/deploy/infraflags.yaml"));
    }

    #[test]
    fn absolute_requirements_kept() {
        let p = requirements_path(Path::new("/repo"), Path::new("/etc/infraflags.yaml"));
        assert_eq!(p, PathBuf::from("/etc/infraflags.yaml"));
    }
}
