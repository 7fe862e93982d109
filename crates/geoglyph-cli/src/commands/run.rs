//! Run command implementation.

use super::load_registry;
use crate::cli::RunArgs;
use crate::config::{Config, OutputFormat};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use crate::pipeline::{offline_provider, run_pipeline, RunContext};
use geoglyph_analyzer::DiscoveryAnalyzer;
use geoglyph_domain::{ImagerySource, InferenceProvider, Recoverability, Region};
use geoglyph_imagery::{HttpImagerySource, SyntheticImagery};
use geoglyph_llm::OpenAiProvider;
use geoglyph_processor::MultiScaleProcessor;
use std::fmt::Display;
use std::path::Path;

/// Execute the run command.
pub fn execute_run(args: RunArgs, config: &Config, output_dir: &Path, formatter: &Formatter) -> Result<()> {
    let registry = load_registry(config)?;
    let regions: Vec<Region> = if args.regions.is_empty() {
        let max = args.max_regions.unwrap_or(config.settings.max_regions);
        registry.recommended(max).into_iter().cloned().collect()
    } else {
        registry.select(&args.regions)?
    };
    if regions.is_empty() {
        return Err(CliError::InvalidInput("No regions selected".to_string()));
    }

    let mut ctx = if args.resume {
        RunContext::resume(output_dir, config.results.clone(), config.processor.export_images)?
    } else {
        RunContext::new(output_dir, config.results.clone(), config.processor.export_images)?
    };

    if formatter.format() == OutputFormat::Table {
        println!(
            "{}",
            formatter.info(&format!("Run {}: {} region(s)", ctx.run_id(), regions.len()))
        );
    }

    if args.offline {
        let source = SyntheticImagery::new(config.settings.offline_seed);
        execute(&mut ctx, source, offline_provider(), &regions, config, formatter)
    } else {
        let token = std::env::var(&config.imagery.token_env).ok();
        let source = HttpImagerySource::new(&config.imagery.endpoint, token)?
            .with_timeout(config.imagery.timeout_secs)?;

        let api_key = config
            .inference
            .api_key
            .clone()
            .or_else(|| std::env::var(geoglyph_llm::openai::API_KEY_ENV).ok())
            .unwrap_or_default();
        let provider = OpenAiProvider::new(&config.inference.endpoint, &config.inference.model, api_key)?
            .with_timeout(config.inference.timeout_secs)?
            .with_temperature(config.inference.temperature)
            .with_vision(config.inference.vision);

        execute(&mut ctx, source, provider, &regions, config, formatter)
    }
}

fn execute<S, L>(
    ctx: &mut RunContext,
    source: S,
    provider: L,
    regions: &[Region],
    config: &Config,
    formatter: &Formatter,
) -> Result<()>
where
    S: ImagerySource,
    S::Error: Recoverability + Display,
    L: InferenceProvider,
    L::Error: Recoverability + Display,
{
    let processor = MultiScaleProcessor::new(source, config.processor.clone())?;
    let analyzer = DiscoveryAnalyzer::new(provider, config.analyzer.clone())?;

    run_pipeline(ctx, &processor, &analyzer, regions)?;
    let (package, written) = ctx.finish(analyzer.provider().model_name())?;

    println!("{}", formatter.format_package(&package)?);

    if formatter.format() == OutputFormat::Table {
        println!("{}", formatter.success(&format!("Submission written to {}", written.json.display())));
        if let Some(markdown) = &written.markdown {
            println!("{}", formatter.success(&format!("Summary written to {}", markdown.display())));
        }
        if !package.compliance.critical_requirements_met {
            println!(
                "{}",
                formatter.warning(&format!(
                    "Unmet requirements: {}",
                    package.compliance.failed().join(", ")
                ))
            );
        }
    }
    Ok(())
}
