//! Region module - named areas of interest

use crate::geo::Coordinate;
use serde::{Deserialize, Serialize};

/// Priority tier of a region
///
/// Ordering follows analysis preference: `High < Medium < Low`, so an
/// ascending sort puts the most promising regions first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Published evidence and good data availability
    High,

    /// Known sites or promising terrain
    Medium,

    /// Exploration or test regions
    Low,
}

impl Priority {
    /// Get the priority name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    /// Parse a priority from a string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid priority: {}", s))
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A geographic area of interest
///
/// Loaded once at startup from the region configuration and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Stable identifier (e.g. "brazil_xingu")
    pub id: String,

    /// Human-readable name
    pub name: String,

    /// Center coordinate all scale windows are derived from
    pub center: Coordinate,

    /// Analysis priority
    pub priority: Priority,

    /// Whether documented archaeological sites exist in the area
    pub known_sites: bool,

    /// Country the region lies in
    #[serde(default)]
    pub country: String,

    /// Free-text note
    #[serde(default)]
    pub note: String,
}

impl Region {
    /// Short label used in prompts and reports
    pub fn label(&self) -> String {
        if self.country.is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.country)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering() {
        let mut priorities = vec![Priority::Low, Priority::High, Priority::Medium];
        priorities.sort();
        assert_eq!(priorities, vec![Priority::High, Priority::Medium, Priority::Low]);
    }

    #[test]
    fn test_priority_parse() {
        assert_eq!(Priority::parse("HIGH"), Some(Priority::High));
        assert_eq!("medium".parse::<Priority>(), Ok(Priority::Medium));
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn test_region_label() {
        let region = Region {
            id: "brazil_xingu".to_string(),
            name: "Upper Xingu Basin".to_string(),
            center: Coordinate::new(-12.5, -53.0),
            priority: Priority::High,
            known_sites: true,
            country: "Brazil".to_string(),
            note: String::new(),
        };
        assert_eq!(region.label(), "Upper Xingu Basin (Brazil)");
    }
}
