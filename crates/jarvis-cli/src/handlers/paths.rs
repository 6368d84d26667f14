//! `paths` command handler.

use crate::bootstrap::CliConfig;

/// Print the resolved locations in `key = value` form.
pub fn execute(config: &CliConfig) {
    println!("data_root = {}", config.data_root.display());
    println!("history_dir = {}", config.history_dir().display());
    println!("config_path = {}", config.config_path().display());
    if let Some(seed) = &config.config_seed {
        println!("config_seed = {}", seed.display());
    }
}
