//! Platform directory lookup

use std::path::PathBuf;

use etcetera::BaseStrategy;

/// Application directory name under the platform config root
const APP_DIR: &str = "emailcss";

/// Per-user configuration directory, e.g. `~/.config/emailcss` on Linux.
pub fn user_config_dir() -> Option<PathBuf> {
    etcetera::choose_base_strategy()
        .ok()
        .map(|strategy| strategy.config_dir().join(APP_DIR))
}
