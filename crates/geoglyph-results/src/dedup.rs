//! Deduplication and ranking of discoveries

use geoglyph_domain::Discovery;
use std::cmp::Ordering;

/// Ranking order: confidence descending, then identifier ascending
pub fn ranking_order(a: &Discovery, b: &Discovery) -> Ordering {
    b.confidence
        .total_cmp(&a.confidence)
        .then_with(|| a.id.cmp(&b.id))
}

/// Drop discoveries that repeat a stronger candidate
///
/// Discoveries are visited in ranking order. One is kept unless an already
/// kept discovery lies within `tolerance_m` with an intersecting window.
/// Attributes are never merged. Applying this twice changes nothing.
pub fn deduplicate(discoveries: &[Discovery], tolerance_m: f64) -> Vec<Discovery> {
    let mut ordered: Vec<&Discovery> = discoveries.iter().collect();
    ordered.sort_by(|a, b| ranking_order(a, b));

    let mut kept: Vec<Discovery> = Vec::with_capacity(ordered.len());
    for discovery in ordered {
        if !kept.iter().any(|k| k.is_same_candidate(discovery, tolerance_m)) {
            kept.push(discovery.clone());
        }
    }
    kept
}

/// Assign ranks 1..N in the given order
pub fn rank(discoveries: Vec<Discovery>) -> Vec<Discovery> {
    discoveries
        .into_iter()
        .enumerate()
        .map(|(idx, d)| d.with_rank(idx as u32 + 1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoglyph_domain::{AnalysisPass, BoundingBox, Coordinate, Provenance, Scale};

    fn discovery(id: &str, lat: f64, lon: f64, confidence: f64) -> Discovery {
        Discovery {
            id: id.to_string(),
            region_id: "brazil_xingu".to_string(),
            coordinate: Coordinate::new(lat, lon),
            confidence,
            site_type: "secondary".to_string(),
            features: Vec::new(),
            scale: Scale::Zone,
            pass: AnalysisPass::Primary,
            window: BoundingBox::around(Coordinate::new(-12.5, -53.0), 10.0),
            provenance: Provenance {
                prompt: "prompt".to_string(),
                dataset_ids: Vec::new(),
            },
            rank: None,
        }
    }

    #[test]
    fn test_close_discoveries_collapse_to_stronger() {
        let weak = discovery("a", -12.450779, -53.114006, 0.6);
        let strong = discovery("b", -12.450979, -53.114006, 0.9);

        let kept = deduplicate(&[weak, strong], 50.0);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "b");
        // No attribute merge
        assert_eq!(kept[0].confidence, 0.9);
    }

    #[test]
    fn test_one_km_apart_kept() {
        let a = discovery("a", -12.450779, -53.114006, 0.6);
        let mut b = a.clone();
        b.id = "b".to_string();
        b.coordinate = a.coordinate.offset_km(1.0, 0.0);

        assert_eq!(deduplicate(&[a, b], 50.0).len(), 2);
    }

    #[test]
    fn test_ties_broken_by_id() {
        let a = discovery("zone_002", -12.40, -53.0, 0.8);
        let b = discovery("zone_001", -12.45, -53.0, 0.8);
        let c = discovery("zone_003", -12.47, -53.0, 0.95);

        let ids: Vec<_> = deduplicate(&[a, b, c], 50.0).into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["zone_003", "zone_001", "zone_002"]);
    }

    #[test]
    fn test_rank_is_one_based() {
        let ranked = rank(vec![discovery("a", 0.0, 0.0, 0.5), discovery("b", 1.0, 1.0, 0.4)]);
        assert_eq!(ranked[0].rank, Some(1));
        assert_eq!(ranked[1].rank, Some(2));
    }
}
