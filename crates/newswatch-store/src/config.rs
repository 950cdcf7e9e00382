use std::path::{Path, PathBuf};

pub const STORE_PATH_ENV: &str = "NEWSWATCH_STORE_PATH";
const DEFAULT_STORE_PATH: &str = "newswatch.db";

/// Where the snapshot database lives on disk.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_STORE_PATH),
        }
    }
}

impl StoreConfig {
    pub fn at(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Environment override, falling back to `newswatch.db` in the working
    /// directory.
    pub fn from_env() -> Self {
        match std::env::var(STORE_PATH_ENV) {
            Ok(path) if !path.is_empty() => Self::at(path),
            _ => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_points_at_working_directory() {
        assert_eq!(StoreConfig::default().path, PathBuf::from("newswatch.db"));
    }

    #[test]
    fn at_keeps_the_given_path() {
        let config = StoreConfig::at("/tmp/some/store.db");
        assert_eq!(config.path, PathBuf::from("/tmp/some/store.db"));
    }
}
