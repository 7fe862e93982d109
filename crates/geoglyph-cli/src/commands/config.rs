//! Config command implementation.

use crate::config::Config;
use crate::error::Result;

/// Execute the config command.
pub fn execute_config(config: &Config) -> Result<()> {
    print!("{}", config.redacted().to_toml()?);
    Ok(())
}
