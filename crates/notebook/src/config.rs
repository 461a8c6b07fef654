use std::path::PathBuf;

/// Where the notebook lives on disk.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base directory of the folder/note tree
    pub notebook_dir: PathBuf,
    /// Session state file (open tabs, last opened note)
    pub state_file: PathBuf,
}

impl Config {
    /// Resolve configuration from the command line and environment.
    ///
    /// Precedence for the notebook directory: `--dir`, then `NOTEBOOK_DIR`,
    /// then `<data dir>/notebook/notebooks`. The state file defaults to
    /// `app_state.json` next to the notebook directory and can be moved with
    /// `NOTEBOOK_STATE_FILE`. Both support `~`.
    pub fn resolve(dir_arg: Option<PathBuf>) -> Result<Self, ConfigError> {
        Self::from_sources(dir_arg, |key| std::env::var(key).ok())
    }

    fn from_sources(
        dir_arg: Option<PathBuf>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let notebook_dir = match (dir_arg, env("NOTEBOOK_DIR")) {
            (Some(dir), _) => expand_tilde(&dir.to_string_lossy()),
            (None, Some(dir)) if !dir.trim().is_empty() => expand_tilde(&dir),
            _ => dirs::data_dir()
                .ok_or(ConfigError::NoDataDir)?
                .join("notebook")
                .join("notebooks"),
        };

        let state_file = match env("NOTEBOOK_STATE_FILE") {
            Some(path) if !path.trim().is_empty() => expand_tilde(&path),
            _ => notebook_dir
                .parent()
                .map(|p| p.join("app_state.json"))
                .unwrap_or_else(|| PathBuf::from("app_state.json")),
        };

        Ok(Self {
            notebook_dir,
            state_file,
        })
    }
}

/// Expand ~ or ~/ prefix to the user's home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"))
    } else if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path))
    } else {
        PathBuf::from(path)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("No platform data directory; pass --dir or set NOTEBOOK_DIR")]
    NoDataDir,
}
