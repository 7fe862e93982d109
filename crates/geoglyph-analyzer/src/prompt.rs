//! Prompt construction for the per-scale and leverage analyses

use geoglyph_domain::{CompositeImage, Discovery, Region, Scale, ScaleWindow};
use std::fmt::Write;

/// Builds analysis prompts for one region
pub struct PromptBuilder<'a> {
    region: &'a Region,
    hotspot_limit: usize,
}

impl<'a> PromptBuilder<'a> {
    /// Create a new prompt builder
    pub fn new(region: &'a Region) -> Self {
        Self {
            region,
            hotspot_limit: 5,
        }
    }

    /// Cap the number of hotspots listed
    pub fn with_hotspot_limit(mut self, limit: usize) -> Self {
        self.hotspot_limit = limit;
        self
    }

    /// Build the prompt for a composite at its scale
    pub fn build(&self, composite: &CompositeImage) -> String {
        let window = &composite.window;
        let mut prompt = String::new();

        // 1. Task header and goal
        prompt.push_str(template_for(window.scale));
        prompt.push_str("\n\n");

        // 2. Region and window context
        self.push_region(&mut prompt);
        push_window(&mut prompt, window);

        // 3. Imagery: datasets, dates, index summary
        let _ = writeln!(prompt, "Composite: {}", composite.reference);
        let _ = writeln!(prompt, "Datasets: {}", composite.dataset_ids.join(", "));
        let _ = writeln!(prompt, "Date range: {}", composite.date_range);
        let stats = &composite.stats;
        let _ = writeln!(
            prompt,
            "Archaeological index (normalized 0-1): min {:.3}, max {:.3}, mean {:.3}",
            stats.min, stats.max, stats.mean
        );

        if stats.hotspots.is_empty() {
            prompt.push_str("Hotspots: none above threshold\n");
        } else {
            prompt.push_str("Hotspots (lat, lon, index):\n");
            for hotspot in stats.hotspots.iter().take(self.hotspot_limit) {
                let _ = writeln!(prompt, "- {}, {:.3}", hotspot.coordinate, hotspot.value);
            }
        }
        prompt.push('\n');

        // 4. Output format
        prompt.push_str(response_example(window.scale));
        prompt.push_str("\n\n");
        prompt.push_str(JSON_ONLY_INSTRUCTION);

        prompt
    }

    /// Build the leverage prompt seeded with earlier discoveries
    pub fn build_leverage(&self, window: &ScaleWindow, seeds: &[Discovery]) -> String {
        let mut prompt = String::new();

        prompt.push_str(LEVERAGE_TEMPLATE);
        prompt.push_str("\n\n");

        self.push_region(&mut prompt);
        push_window(&mut prompt, window);

        prompt.push_str("Confirmed discoveries (id, lat, lon, type, confidence, features):\n");
        for seed in seeds {
            let _ = writeln!(
                prompt,
                "- {}: {}, {}, {:.2}, [{}]",
                seed.id,
                seed.coordinate,
                seed.site_type,
                seed.confidence,
                seed.features.join(", ")
            );
        }
        prompt.push('\n');

        prompt.push_str(LEVERAGE_EXAMPLE);
        prompt.push_str("\n\n");
        prompt.push_str(JSON_ONLY_INSTRUCTION);

        prompt
    }

    fn push_region(&self, prompt: &mut String) {
        let region = self.region;
        let _ = writeln!(prompt, "Region: {} [{}]", region.label(), region.id);
        let _ = writeln!(prompt, "Center: {}", region.center);
        let _ = writeln!(
            prompt,
            "Known sites: {}",
            if region.known_sites { "yes" } else { "none documented" }
        );
        if !region.note.is_empty() {
            let _ = writeln!(prompt, "Note: {}", region.note);
        }
    }
}

fn push_window(prompt: &mut String, window: &ScaleWindow) {
    let (width, height) = window.dimensions();
    let bounds = &window.bounds;
    let _ = writeln!(
        prompt,
        "Window: {} scale, {} km span at {} m/pixel ({}x{} pixels)",
        window.scale, window.span_km, window.resolution_m, width, height
    );
    let _ = writeln!(
        prompt,
        "Bounds: lat {:.6} to {:.6}, lon {:.6} to {:.6}",
        bounds.min_lat, bounds.max_lat, bounds.min_lon, bounds.max_lon
    );
    prompt.push('\n');
}

fn template_for(scale: Scale) -> &'static str {
    match scale {
        Scale::Regional => REGIONAL_TEMPLATE,
        Scale::Zone => ZONE_TEMPLATE,
        Scale::Site => SITE_TEMPLATE,
    }
}

fn response_example(scale: Scale) -> &'static str {
    match scale {
        Scale::Regional => REGIONAL_EXAMPLE,
        Scale::Zone => ZONE_EXAMPLE,
        Scale::Site => SITE_EXAMPLE,
    }
}

const REGIONAL_TEMPLATE: &str = r#"REGIONAL NETWORK ANALYSIS
You are reviewing a 50 km composite of optical and radar imagery for evidence of
pre-Columbian settlement networks under forest canopy.

Discovery targets:
- Clusters of anomalies suggesting linked settlements
- Linear features that could be causeways or roads between clusters
- Zones worth a closer look at zone scale, with a priority level (high, medium, low)

Report cluster centers and priority zones with coordinates inside the window."#;

const ZONE_TEMPLATE: &str = r#"ZONE SITE DETECTION
You are reviewing a 10 km composite for individual archaeological sites.

Discovery targets:
- Ring ditches, geometric earthworks and mound groups
- Vegetation anomalies over buried structures (low NDVI, bright soil)
- Radar texture breaks that follow regular shapes

Report each site with its center, type, observed features and a confidence score."#;

const SITE_TEMPLATE: &str = r#"SITE DETAILED MAPPING
You are reviewing a 2 km composite centered on a candidate site.

Discovery targets:
- The exact site center
- Internal structure: plazas, mounds, ditches, entrances
- A classification tier (primary, secondary, tertiary) and an overall assessment

Report one site mapping with a final archaeological confidence."#;

const LEVERAGE_TEMPLATE: &str = r#"LEVERAGE DISCOVERY
The discoveries listed below were found earlier in this region. Use the patterns
they share (shape, size, spacing, spectral signature) to predict further sites.

Discovery targets:
- Locations that repeat the confirmed patterns
- Gaps in the spacing of confirmed sites that suggest missing members of a network

Every predicted location must lie inside the window bounds."#;

const REGIONAL_EXAMPLE: &str = r#"Response format:
{
  "analysis_type": "regional_network",
  "settlement_clusters": [
    {"center_coordinates": "lat, lon", "confidence": 0.0-1.0, "cluster_size_km": 5.0, "site_count_estimate": 8}
  ],
  "priority_zones": [
    {"center_coordinates": "lat, lon", "priority_level": "high|medium|low", "expected_site_type": "...", "reasoning": "..."}
  ]
}"#;

const ZONE_EXAMPLE: &str = r#"Response format:
{
  "analysis_type": "zone_site_detection",
  "sites_detected": [
    {"site_id": "SITE_001", "center_coordinates": "lat, lon", "site_type": "...", "features_detected": ["..."], "confidence_score": 0.0-1.0}
  ]
}"#;

const SITE_EXAMPLE: &str = r#"Response format:
{
  "analysis_type": "site_detailed_mapping",
  "site_id": "...",
  "site_center": "lat, lon",
  "site_classification": {"tier": "primary|secondary|tertiary", "confidence": 0.0-1.0},
  "features_detected": ["..."],
  "final_assessment": {"archaeological_confidence": 0.0-1.0}
}"#;

const LEVERAGE_EXAMPLE: &str = r#"Response format:
{
  "analysis_type": "leverage_discovery",
  "pattern_based_discoveries": [
    {"discovery_id": "LEV_001", "center_coordinates": "lat, lon", "predicted_type": "...", "confidence_based_on_pattern": 0.0-1.0, "matching_patterns": ["..."]}
  ]
}"#;

/// Final line of every prompt
pub const JSON_ONLY_INSTRUCTION: &str =
    "Return ONE valid JSON object and nothing else. No markdown code blocks, no explanations.";
