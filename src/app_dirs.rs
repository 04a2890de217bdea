use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// Key-value store file under $HOME/.local/state/stint
    pub fn store_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("store.json"))
    }

    /// Session history log under the same state directory
    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("sessions.csv"))
    }

    fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join("stint"),
            )
        } else {
            ProjectDirs::from("", "", "stint")
                .map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }
}
