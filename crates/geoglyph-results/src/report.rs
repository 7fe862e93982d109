//! Markdown summary rendered from a submission package

use crate::package::SubmissionPackage;
use geoglyph_domain::PromptStatus;
use std::fmt::Write;

/// Render the Markdown summary of a package
///
/// Uses only data in the package, so a summary can be regenerated from a
/// submission file.
pub fn render_markdown(package: &SubmissionPackage) -> String {
    let mut out = String::new();

    out.push_str("# Geoglyph Submission\n\n");
    let _ = writeln!(out, "- Run: `{}`", package.run_id);
    let _ = writeln!(out, "- Generated: {}", package.generated_at.format("%Y-%m-%d %H:%M:%S UTC"));
    if !package.model.is_empty() {
        let _ = writeln!(out, "- Model: {}", package.model);
    }
    let _ = writeln!(out, "- Regions: {}", package.regions.join(", "));
    let _ = writeln!(
        out,
        "- Discoveries: {} selected of {} unique candidates",
        package.discoveries.len(),
        package.total_candidates
    );
    out.push('\n');

    out.push_str("## Compliance\n\n");
    out.push_str("| Requirement | Status |\n|---|---|\n");
    for (name, ok) in package.compliance.items() {
        let _ = writeln!(out, "| {} | {} |", name, if ok { "PASS" } else { "FAIL" });
    }
    out.push('\n');

    out.push_str("## Discoveries\n\n");
    if package.discoveries.is_empty() {
        out.push_str("No discoveries.\n");
    } else {
        out.push_str("| Rank | ID | Region | Scale | Pass | Latitude | Longitude | Confidence | Type |\n");
        out.push_str("|---|---|---|---|---|---|---|---|---|\n");
        for d in &package.discoveries {
            let rank = d.rank.map(|r| r.to_string()).unwrap_or_else(|| "-".to_string());
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} | {} | {:.6} | {:.6} | {:.2} | {} |",
                rank,
                d.id,
                d.region_id,
                d.scale,
                d.pass,
                d.coordinate.lat,
                d.coordinate.lon,
                d.confidence,
                d.site_type
            );
        }
    }
    out.push('\n');

    out.push_str("## Datasets\n\n");
    for id in &package.dataset_ids {
        let _ = writeln!(out, "- `{}`", id);
    }
    out.push('\n');

    out.push_str("## Prompts\n\n");
    for (idx, record) in package.prompts.iter().enumerate() {
        let status = match &record.status {
            PromptStatus::Answered { discoveries, quarantined } => {
                format!("answered, {} discoveries, {} quarantined", discoveries, quarantined)
            }
            PromptStatus::Discarded { reason } => format!("discarded: {}", reason),
            PromptStatus::Failed { reason } => format!("failed: {}", reason),
        };
        let _ = writeln!(
            out,
            "### {}. {} / {} ({})\n\n{}\n\n```text\n{}\n```\n",
            idx + 1,
            record.region_id,
            record.scale,
            record.pass,
            status,
            record.prompt.trim_end()
        );
    }

    out
}
