//! Verify command implementation.

use crate::cli::VerifyArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use geoglyph_results::{compare, SubmissionPackage};

/// Execute the verify command.
pub fn execute_verify(args: VerifyArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let tolerance = args.tolerance.unwrap_or(config.results.dedup_tolerance_m);
    if !tolerance.is_finite() || tolerance <= 0.0 {
        return Err(CliError::InvalidInput("Tolerance must be greater than 0".to_string()));
    }

    let first = SubmissionPackage::load(&args.first)?;
    let second = SubmissionPackage::load(&args.second)?;
    let report = compare(&first, &second, tolerance);

    println!("{}", formatter.format_verification(&report)?);

    let total = report.matches.len();
    let reproduced = report.reproduced_count();
    if report.passed() {
        println!(
            "{}",
            formatter.success(&format!("{} of {} discoveries reproduced within {} m", reproduced, total, tolerance))
        );
        Ok(())
    } else {
        Err(CliError::NotReproduced {
            missing: total - reproduced,
            total,
        })
    }
}
