use std::path::{Path, PathBuf};

/// Resolve the project root directory.
///
/// Priority:
/// 1. `--root` flag / `INFRAFLAGS_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `.infraflags/`
/// 3. Walk upward from `cwd` looking for `.git/`
/// 4. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_upward(&cwd, infraflags_core::paths::INFRAFLAGS_DIR)
        .or_else(|| find_upward(&cwd, ".git"))
        .unwrap_or(cwd)
}

fn find_upward(start: &Path, marker: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(marker).is_dir())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_root_wins() {
        let dir = TempDir::new().unwrap();
        let result = resolve_root(Some(dir.path()));
        assert_eq!(result, dir.path());
    }

    #[test]
    fn marker_found_from_nested_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".infraflags")).unwrap();
        let subdir = dir.path().join("services/api");
        std::fs::create_dir_all(&subdir).unwrap();
        assert_eq!(
            find_upward(&subdir, ".infraflags").as_deref(),
            Some(dir.path())
        );
    }

    #[test]
    fn infraflags_dir_preferred_over_git() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".git")).unwrap();
        let app = dir.path().join("app");
        std::fs::create_dir_all(app.join(".infraflags")).unwrap();
        assert_eq!(find_upward(&app, ".infraflags").as_deref(), Some(app.as_path()));
        assert_eq!(find_upward(&app, ".git").as_deref(), Some(dir.path()));
    }
}
