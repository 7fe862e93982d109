//! Command implementations.

pub mod config;
pub mod regions;
pub mod run;
pub mod verify;

pub use self::config::execute_config;
pub use self::regions::execute_regions;
pub use self::run::execute_run;
pub use self::verify::execute_verify;

use crate::config::Config;
use crate::error::Result;
use geoglyph_domain::RegionRegistry;

/// Load the registry named in the configuration, or the built-in one.
pub fn load_registry(config: &Config) -> Result<RegionRegistry> {
    let registry = match &config.settings.regions_file {
        Some(path) => RegionRegistry::load(path)?,
        None => RegionRegistry::builtin()?,
    };
    Ok(registry)
}
