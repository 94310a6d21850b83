//! Configuration utility functions.

use std::path::{Path, PathBuf};

/// Find config file by searching upward from current directory
///
/// Starts from cwd and walks up parent directories until finding `config_name`
/// Returns the absolute path to the config file if found
///
/// # Example
/// ```text
/// /home/user/app/src/components/  ← cwd
/// /home/user/app/devup-ui.toml    ← found!
/// ```
pub fn find_config_file(config_name: &Path) -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_file_from(&cwd, config_name)
}

/// Same as [`find_config_file`], starting from an explicit directory.
pub fn find_config_file_from(start: &Path, config_name: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }

    let mut current = start;
    loop {
        let candidate = current.join(config_name);
        if candidate.exists() {
            return Some(candidate);
        }

        match current.parent() {
            Some(parent) => current = parent,
            None => return None, // Reached filesystem root
        }
    }
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_walks_upward() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("src/components");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(tmp.path().join("devup-ui.toml"), "").unwrap();

        let found = find_config_file_from(&nested, Path::new("devup-ui.toml")).unwrap();
        assert_eq!(found, tmp.path().join("devup-ui.toml"));
    }

    #[test]
    fn test_find_config_missing() {
        let tmp = TempDir::new().unwrap();
        let found = find_config_file_from(tmp.path(), Path::new("no-such-config-7f3a.toml"));
        assert!(found.is_none());
    }

    #[test]
    fn test_find_config_absolute() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("custom.toml");
        assert!(find_config_file_from(tmp.path(), &path).is_none());

        std::fs::write(&path, "").unwrap();
        assert_eq!(find_config_file_from(Path::new("/"), &path), Some(path));
    }
}
