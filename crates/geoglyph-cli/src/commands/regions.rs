//! Regions command implementation.

use super::load_registry;
use crate::cli::RegionsArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use geoglyph_domain::{Priority, Region, RegionRegistry};

/// Execute the regions command.
pub fn execute_regions(args: RegionsArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let registry = load_registry(config)?;
    let regions = filter_regions(&registry, &args)?;
    println!("{}", formatter.format_regions(&regions)?);
    Ok(())
}

/// Regions matching the filters, highest priority first.
fn filter_regions<'a>(registry: &'a RegionRegistry, args: &RegionsArgs) -> Result<Vec<&'a Region>> {
    let priority = match &args.priority {
        Some(p) => Some(p.parse::<Priority>().map_err(CliError::InvalidInput)?),
        None => None,
    };

    Ok(registry
        .by_priority(registry.len())
        .into_iter()
        .filter(|r| priority.map_or(true, |p| r.priority == p))
        .filter(|r| {
            args.country
                .as_deref()
                .map_or(true, |c| r.country.eq_ignore_ascii_case(c))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "brazil_xingu": {"name": "Upper Xingu Basin", "center": [-12.5, -53.0], "country": "Brazil", "priority": "high"},
        "brazil_acre": {"name": "Acre Geoglyphs", "center": [-9.9, -67.8], "country": "Brazil", "priority": "medium"},
        "peru_explore": {"name": "Ucayali Basin", "center": [-8.0, -74.5], "country": "Peru", "priority": "medium"}
    }"#;

    fn args(priority: Option<&str>, country: Option<&str>) -> RegionsArgs {
        RegionsArgs {
            priority: priority.map(str::to_string),
            country: country.map(str::to_string),
        }
    }

    #[test]
    fn test_filter_by_priority_and_country() {
        let registry = RegionRegistry::from_json(SAMPLE).unwrap();

        let all = filter_regions(&registry, &args(None, None)).unwrap();
        assert_eq!(all[0].id, "brazil_xingu");
        assert_eq!(all.len(), 3);

        let medium_brazil = filter_regions(&registry, &args(Some("medium"), Some("brazil"))).unwrap();
        assert_eq!(medium_brazil.len(), 1);
        assert_eq!(medium_brazil[0].id, "brazil_acre");
    }

    #[test]
    fn test_invalid_priority() {
        let registry = RegionRegistry::from_json(SAMPLE).unwrap();
        let result = filter_regions(&registry, &args(Some("urgent"), None));
        assert!(matches!(result, Err(CliError::InvalidInput(_))));
    }
}
