//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use geoglyph_domain::Region;
use geoglyph_results::{ReproducibilityReport, SubmissionPackage};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Selected output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format the region registry.
    pub fn format_regions(&self, regions: &[&Region]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(regions)?),
            OutputFormat::Table => {
                if regions.is_empty() {
                    return Ok(self.colorize("No regions found.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["ID", "Name", "Country", "Priority", "Center", "Known Sites"]);
                for region in regions {
                    builder.push_record([
                        region.id.clone(),
                        region.name.clone(),
                        region.country.clone(),
                        region.priority.to_string(),
                        region.center.to_string(),
                        if region.known_sites { "yes" } else { "no" }.to_string(),
                    ]);
                }
                Ok(self.render(builder))
            }
        }
    }

    /// Format the outcome of a run.
    pub fn format_package(&self, package: &SubmissionPackage) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(package.to_json()?),
            OutputFormat::Table => {
                let mut out = String::new();

                if package.discoveries.is_empty() {
                    out.push_str(&self.colorize("No discoveries.", "yellow"));
                } else {
                    let mut builder = Builder::default();
                    builder.push_record(["Rank", "ID", "Scale", "Pass", "Coordinate", "Confidence", "Type"]);
                    for d in &package.discoveries {
                        builder.push_record([
                            d.rank.map(|r| r.to_string()).unwrap_or_default(),
                            d.id.clone(),
                            d.scale.to_string(),
                            d.pass.to_string(),
                            d.coordinate.to_string(),
                            format!("{:.2}", d.confidence),
                            d.site_type.clone(),
                        ]);
                    }
                    out.push_str(&self.render(builder));
                }
                out.push('\n');

                let mut checklist = Builder::default();
                checklist.push_record(["Requirement", "Status"]);
                for (name, ok) in package.compliance.items() {
                    let status = if ok {
                        self.colorize("PASS", "green")
                    } else {
                        self.colorize("FAIL", "red")
                    };
                    checklist.push_record([name.to_string(), status]);
                }
                out.push_str(&self.render(checklist));
                Ok(out)
            }
        }
    }

    /// Format a reproducibility report.
    pub fn format_verification(&self, report: &ReproducibilityReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
            OutputFormat::Table => {
                if report.matches.is_empty() {
                    return Ok(self.colorize("No discoveries to compare.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["ID", "Coordinate", "Matched", "Offset (m)", "Reproduced"]);
                for m in &report.matches {
                    builder.push_record([
                        m.id.clone(),
                        m.coordinate.to_string(),
                        m.matched_id.clone().unwrap_or_else(|| "-".to_string()),
                        m.offset_m.map(|o| format!("{:.1}", o)).unwrap_or_else(|| "-".to_string()),
                        if m.reproduced {
                            self.colorize("yes", "green")
                        } else {
                            self.colorize("no", "red")
                        },
                    ]);
                }
                Ok(self.render(builder))
            }
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn render(&self, builder: Builder) -> String {
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}
