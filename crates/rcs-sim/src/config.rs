//! TOML configuration loading.
//!
//! ```toml
//! start_tick         = 0
//! end_tick           = 10080   # one week of minutes
//! seed               = 42
//! num_threads        = 4       # optional
//! tick_duration_secs = 60
//! ```
//!
//! Every key is optional; missing keys take [`SimConfig::default`] values.

use std::path::Path;

use rcs_core::SimConfig;

use crate::SimResult;

/// Read and validate a config file.
pub fn load_config(path: impl AsRef<Path>) -> SimResult<SimConfig> {
    let text = std::fs::read_to_string(path)?;
    parse_config(&text)
}

/// Parse and validate config text.
pub fn parse_config(text: &str) -> SimResult<SimConfig> {
    let config: SimConfig = toml::from_str(text)?;
    config.validate()?;
    Ok(config)
}
