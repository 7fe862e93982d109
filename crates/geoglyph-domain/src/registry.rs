//! Region registry - static table of areas of interest
//!
//! The registry is loaded once from a JSON document mapping region
//! identifiers to their metadata:
//!
//! ```json
//! { "brazil_xingu": { "name": "Upper Xingu Basin", "center": [-12.5, -53.0],
//!                     "country": "Brazil", "priority": "high",
//!                     "known_sites": true, "notes": "..." } }
//! ```

use crate::error::DomainError;
use crate::geo::Coordinate;
use crate::region::{Priority, Region};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

const BUILTIN_REGIONS: &str = include_str!("../data/regions.json");

/// On-disk shape of a region entry
#[derive(Debug, Deserialize)]
struct RegionEntry {
    name: String,
    center: [f64; 2],
    #[serde(default)]
    country: String,
    priority: Priority,
    #[serde(default)]
    known_sites: bool,
    #[serde(default, alias = "note")]
    notes: String,
}

/// Immutable lookup table of regions, ordered by identifier
#[derive(Debug, Clone, Default)]
pub struct RegionRegistry {
    regions: Vec<Region>,
}

impl RegionRegistry {
    /// Parse a registry from region configuration JSON
    pub fn from_json(json: &str) -> Result<Self, DomainError> {
        let entries: BTreeMap<String, RegionEntry> = serde_json::from_str(json)
            .map_err(|e| DomainError::RegionConfig(e.to_string()))?;

        let mut regions = Vec::with_capacity(entries.len());
        for (id, entry) in entries {
            let center = Coordinate::new(entry.center[0], entry.center[1]);
            if !center.is_valid() {
                return Err(DomainError::InvalidRegion {
                    id,
                    reason: format!("center {} is out of range", center),
                });
            }
            if entry.name.trim().is_empty() {
                return Err(DomainError::InvalidRegion {
                    id,
                    reason: "name is empty".to_string(),
                });
            }

            regions.push(Region {
                id,
                name: entry.name,
                center,
                priority: entry.priority,
                known_sites: entry.known_sites,
                country: entry.country,
                note: entry.notes,
            });
        }

        Ok(Self { regions })
    }

    /// Load a registry from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            DomainError::RegionConfig(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&contents)
    }

    /// Registry shipped with the crate
    pub fn builtin() -> Result<Self, DomainError> {
        Self::from_json(BUILTIN_REGIONS)
    }

    /// All regions, ordered by identifier
    pub fn all(&self) -> &[Region] {
        &self.regions
    }

    /// Number of regions
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether the registry holds no regions
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Look up a region by identifier
    pub fn get(&self, id: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == id)
    }

    /// Regions with exactly the given priority
    pub fn with_priority(&self, priority: Priority) -> Vec<&Region> {
        self.regions.iter().filter(|r| r.priority == priority).collect()
    }

    /// Regions in a country (case-insensitive)
    pub fn in_country(&self, country: &str) -> Vec<&Region> {
        self.regions
            .iter()
            .filter(|r| r.country.eq_ignore_ascii_case(country))
            .collect()
    }

    /// Up to `max` regions, highest priority first (ties by identifier)
    pub fn by_priority(&self, max: usize) -> Vec<&Region> {
        let mut ordered: Vec<&Region> = self.regions.iter().collect();
        ordered.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.id.cmp(&b.id)));
        ordered.truncate(max);
        ordered
    }

    /// Up to `max` high or medium priority regions
    pub fn recommended(&self, max: usize) -> Vec<&Region> {
        self.by_priority(self.regions.len())
            .into_iter()
            .filter(|r| r.priority != Priority::Low)
            .take(max)
            .collect()
    }

    /// Resolve identifiers in the given order, failing on the first unknown one
    pub fn select(&self, ids: &[String]) -> Result<Vec<Region>, DomainError> {
        ids.iter()
            .map(|id| {
                self.get(id)
                    .cloned()
                    .ok_or_else(|| DomainError::UnknownRegion(id.clone()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "peru_explore": {"name": "Ucayali Basin", "center": [-8.0, -74.5], "country": "Peru",
                         "priority": "medium", "known_sites": false, "notes": "Exploration"},
        "brazil_xingu": {"name": "Upper Xingu Basin", "center": [-12.5, -53.0], "country": "Brazil",
                         "priority": "high", "known_sites": true, "note": "Documented"},
        "colombia_test": {"name": "Colombian Amazon", "center": [-1.0, -70.0],
                          "priority": "low"}
    }"#;

    #[test]
    fn test_parse_sample() {
        let registry = RegionRegistry::from_json(SAMPLE).unwrap();
        assert_eq!(registry.len(), 3);

        let xingu = registry.get("brazil_xingu").unwrap();
        assert_eq!(xingu.center, Coordinate::new(-12.5, -53.0));
        assert_eq!(xingu.priority, Priority::High);
        assert!(xingu.known_sites);
        assert_eq!(xingu.note, "Documented");

        let colombia = registry.get("colombia_test").unwrap();
        assert!(!colombia.known_sites);
        assert!(colombia.country.is_empty());
    }

    #[test]
    fn test_regions_ordered_by_id() {
        let registry = RegionRegistry::from_json(SAMPLE).unwrap();
        let ids: Vec<_> = registry.all().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["brazil_xingu", "colombia_test", "peru_explore"]);
    }

    #[test]
    fn test_by_priority_and_recommended() {
        let registry = RegionRegistry::from_json(SAMPLE).unwrap();

        let ordered: Vec<_> = registry.by_priority(10).iter().map(|r| r.id.clone()).collect();
        assert_eq!(ordered, vec!["brazil_xingu", "peru_explore", "colombia_test"]);

        let recommended: Vec<_> = registry.recommended(5).iter().map(|r| r.id.clone()).collect();
        assert_eq!(recommended, vec!["brazil_xingu", "peru_explore"]);

        assert_eq!(registry.by_priority(1).len(), 1);
    }

    #[test]
    fn test_filters() {
        let registry = RegionRegistry::from_json(SAMPLE).unwrap();
        assert_eq!(registry.with_priority(Priority::Low).len(), 1);
        assert_eq!(registry.in_country("brazil").len(), 1);
        assert!(registry.in_country("Bolivia").is_empty());
    }

    #[test]
    fn test_select_unknown_region() {
        let registry = RegionRegistry::from_json(SAMPLE).unwrap();
        let result = registry.select(&["brazil_xingu".to_string(), "atlantis".to_string()]);
        assert_eq!(result, Err(DomainError::UnknownRegion("atlantis".to_string())));
    }

    #[test]
    fn test_invalid_center_rejected() {
        let json = r#"{"bad": {"name": "Bad", "center": [120.0, 0.0], "priority": "low"}}"#;
        let result = RegionRegistry::from_json(json);
        assert!(matches!(result, Err(DomainError::InvalidRegion { .. })));
    }

    #[test]
    fn test_malformed_json_rejected() {
        let result = RegionRegistry::from_json("{ not json");
        assert!(matches!(result, Err(DomainError::RegionConfig(_))));
    }

    #[test]
    fn test_builtin_registry_loads() {
        let registry = RegionRegistry::builtin().unwrap();
        assert!(registry.len() >= 5);
        let xingu = registry.get("brazil_xingu").unwrap();
        assert_eq!(xingu.center, Coordinate::new(-12.5, -53.0));
    }
}
