//! Archaeological index band arithmetic
//!
//! All functions work on row-major `f32` slices of one window. The index
//! rewards exposed soil and modified radar texture and penalises vigorous
//! vegetation:
//!
//! ```text
//! raw = -0.3 NDVI - 0.2 EVI + 0.4 soil + 0.2 texture + 0.1 smoothness
//! ```
//!
//! followed by cleaning and 5th/95th percentile normalization into [0, 1].

use geoglyph_domain::{BoundingBox, Hotspot, IndexStats};

/// Component weights (NDVI, EVI, soil, texture, smoothness)
pub const WEIGHTS: [f32; 5] = [-0.3, -0.2, 0.4, 0.2, 0.1];

/// Scale factor of surface reflectance integers
pub const REFLECTANCE_SCALE: f32 = 10_000.0;

/// Normalized difference vegetation index, 0 where `nir + red == 0`
pub fn ndvi(nir: &[f32], red: &[f32]) -> Vec<f32> {
    nir.iter()
        .zip(red)
        .map(|(&n, &r)| {
            let denom = n + r;
            if denom == 0.0 {
                0.0
            } else {
                (n - r) / denom
            }
        })
        .collect()
}

/// Enhanced vegetation index clamped to [-1, 1]
///
/// Inputs are used as delivered (reflectance scaled by 10000).
pub fn evi(nir: &[f32], red: &[f32], blue: &[f32]) -> Vec<f32> {
    nir.iter()
        .zip(red)
        .zip(blue)
        .map(|((&n, &r), &b)| {
            let denom = n + 6.0 * r - 7.5 * b + 1.0;
            if denom == 0.0 {
                0.0
            } else {
                (2.5 * (n - r) / denom).clamp(-1.0, 1.0)
            }
        })
        .collect()
}

/// Mean of the four optical bands as reflectance
pub fn soil_brightness(red: &[f32], green: &[f32], blue: &[f32], nir: &[f32]) -> Vec<f32> {
    (0..red.len())
        .map(|i| (red[i] + green[i] + blue[i] + nir[i]) / 4.0 / REFLECTANCE_SCALE)
        .collect()
}

/// Visit the circular neighbourhood of every pixel, clipped at the edges
fn focal<F>(values: &[f32], width: u32, height: u32, radius: u32, mut reduce: F) -> Vec<f32>
where
    F: FnMut(&[f32]) -> f32,
{
    let (w, h, r) = (width as i64, height as i64, radius as i64);
    let mut out = Vec::with_capacity(values.len());
    let mut window = Vec::with_capacity(((2 * r + 1) * (2 * r + 1)) as usize);

    for y in 0..h {
        for x in 0..w {
            window.clear();
            for dy in -r..=r {
                for dx in -r..=r {
                    if dx * dx + dy * dy > r * r {
                        continue;
                    }
                    let (nx, ny) = (x + dx, y + dy);
                    if nx < 0 || ny < 0 || nx >= w || ny >= h {
                        continue;
                    }
                    let v = values[(ny * w + nx) as usize];
                    if v.is_finite() {
                        window.push(v);
                    }
                }
            }
            out.push(if window.is_empty() { 0.0 } else { reduce(&window) });
        }
    }
    out
}

fn mean(values: &[f32]) -> f32 {
    values.iter().sum::<f32>() / values.len() as f32
}

/// Local mean over a circular neighbourhood
pub fn focal_mean(values: &[f32], width: u32, height: u32, radius: u32) -> Vec<f32> {
    focal(values, width, height, radius, mean)
}

/// Local population standard deviation over a circular neighbourhood
pub fn focal_std_dev(values: &[f32], width: u32, height: u32, radius: u32) -> Vec<f32> {
    focal(values, width, height, radius, |window| {
        let m = mean(window);
        let var = window.iter().map(|v| (v - m) * (v - m)).sum::<f32>() / window.len() as f32;
        var.sqrt()
    })
}

/// Convert backscatter from dB to linear power
pub fn db_to_linear(values: &[f32]) -> Vec<f32> {
    values.iter().map(|db| 10f32.powf(db / 10.0)).collect()
}

/// Inputs for one window
#[derive(Debug, Clone, Copy)]
pub struct IndexInputs<'a> {
    /// Blue
    pub b2: &'a [f32],
    /// Green
    pub b3: &'a [f32],
    /// Red
    pub b4: &'a [f32],
    /// Near infrared
    pub b8: &'a [f32],
    /// Radar VV backscatter (dB)
    pub vv: &'a [f32],
    /// Pixels per row
    pub width: u32,
    /// Number of rows
    pub height: u32,
    /// Radar texture radius
    pub texture_radius: u32,
    /// Radar smoothness radius
    pub smoothness_radius: u32,
}

/// Weighted sum of the index components, not yet cleaned
pub fn raw_index(inputs: &IndexInputs<'_>) -> Vec<f32> {
    let ndvi = ndvi(inputs.b8, inputs.b4);
    let evi = evi(inputs.b8, inputs.b4, inputs.b2);
    let soil = soil_brightness(inputs.b4, inputs.b3, inputs.b2, inputs.b8);
    let texture = focal_std_dev(inputs.vv, inputs.width, inputs.height, inputs.texture_radius);
    let smoothness = db_to_linear(&focal_mean(
        inputs.vv,
        inputs.width,
        inputs.height,
        inputs.smoothness_radius,
    ));

    (0..ndvi.len())
        .map(|i| {
            WEIGHTS[0] * ndvi[i]
                + WEIGHTS[1] * evi[i]
                + WEIGHTS[2] * soil[i]
                + WEIGHTS[3] * texture[i]
                + WEIGHTS[4] * smoothness[i]
        })
        .collect()
}

/// Replace invalid values: negative → 0, above 10 → 1, non-finite → 0
pub fn clean(values: &mut [f32]) {
    for v in values.iter_mut() {
        if !v.is_finite() || *v < 0.0 {
            *v = 0.0;
        } else if *v > 10.0 {
            *v = 1.0;
        }
    }
}

/// Nearest-rank percentile (`p` in [0, 100]) of the values
pub fn percentile(values: &[f32], p: f32) -> f32 {
    let mut sorted: Vec<f32> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return 0.0;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));
    let rank = ((p / 100.0) * (sorted.len() - 1) as f32).round() as usize;
    sorted[rank.min(sorted.len() - 1)]
}

/// Rescale with the 5th/95th percentiles and clamp to [0, 1]
///
/// A flat distribution (`p95 <= p5`) yields all zeros.
pub fn normalize(values: &mut [f32]) {
    let p5 = percentile(values, 5.0);
    let p95 = percentile(values, 95.0);
    let range = p95 - p5;

    for v in values.iter_mut() {
        *v = if range <= 0.0 {
            0.0
        } else {
            ((*v - p5) / range).clamp(0.0, 1.0)
        };
    }
}

/// Full pipeline: raw index, cleaning, normalization
pub fn archaeological_index(inputs: &IndexInputs<'_>) -> Vec<f32> {
    let mut index = raw_index(inputs);
    clean(&mut index);
    normalize(&mut index);
    index
}

/// Strongest cells at or above `threshold`, converted to coordinates
///
/// Sorted by value descending, then row and column.
pub fn hotspots(
    index: &[f32],
    width: u32,
    height: u32,
    bounds: &BoundingBox,
    threshold: f32,
    max: usize,
) -> Vec<Hotspot> {
    let mut cells: Vec<(usize, f32)> = index
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, v)| *v >= threshold)
        .collect();

    // Stable sort keeps row-major order among equal values
    cells.sort_by(|a, b| b.1.total_cmp(&a.1));
    cells.truncate(max);

    let w = width.max(1) as usize;
    cells
        .into_iter()
        .map(|(i, value)| {
            let row = (i / w) as u32;
            let col = (i % w) as u32;
            Hotspot {
                coordinate: bounds.pixel_center(row, col, width, height),
                value,
            }
        })
        .collect()
}

/// Min, max, mean and hotspots of a normalized index
pub fn stats(
    index: &[f32],
    width: u32,
    height: u32,
    bounds: &BoundingBox,
    threshold: f32,
    max_hotspots: usize,
) -> IndexStats {
    if index.is_empty() {
        return IndexStats::default();
    }

    let min = index.iter().copied().fold(f32::INFINITY, f32::min);
    let max = index.iter().copied().fold(f32::NEG_INFINITY, f32::max);

    IndexStats {
        min,
        max,
        mean: mean(index),
        hotspots: hotspots(index, width, height, bounds, threshold, max_hotspots),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoglyph_domain::Coordinate;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_ndvi() {
        let values = ndvi(&[3000.0, 0.0, 500.0], &[1000.0, 0.0, 1500.0]);
        assert!(approx(values[0], 0.5));
        assert_eq!(values[1], 0.0);
        assert!(approx(values[2], -0.5));
    }

    #[test]
    fn test_evi_clamped() {
        let values = evi(&[3000.0, 100.0], &[1000.0, 0.0], &[400.0, 20.0]);
        // 2.5 * 2000 / (3000 + 6000 - 3000 + 1)
        assert!(approx(values[0], 2.5 * 2000.0 / 6001.0));
        // 2.5 * 100 / (100 - 150 + 1) is below -1
        assert_eq!(values[1], -1.0);
    }

    #[test]
    fn test_soil_brightness() {
        let values = soil_brightness(&[1000.0], &[2000.0], &[3000.0], &[4000.0]);
        assert!(approx(values[0], 0.25));
    }

    #[test]
    fn test_focal_filters_on_uniform_input() {
        let values = vec![-12.0; 25];
        let means = focal_mean(&values, 5, 5, 2);
        let stds = focal_std_dev(&values, 5, 5, 2);
        assert!(means.iter().all(|v| approx(*v, -12.0)));
        assert!(stds.iter().all(|v| approx(*v, 0.0)));
    }

    #[test]
    fn test_focal_std_dev_detects_edge() {
        // Left half -5 dB, right half -15 dB
        let values: Vec<f32> = (0..36).map(|i| if i % 6 < 3 { -5.0 } else { -15.0 }).collect();
        let stds = focal_std_dev(&values, 6, 6, 1);
        assert!(approx(stds[0], 0.0));
        assert!(stds[2] > 1.0);
        assert!(stds[3] > 1.0);
    }

    #[test]
    fn test_db_to_linear() {
        let values = db_to_linear(&[0.0, -10.0, 10.0]);
        assert!(approx(values[0], 1.0));
        assert!(approx(values[1], 0.1));
        assert!(approx(values[2], 10.0));
    }

    #[test]
    fn test_clean() {
        let mut values = vec![-1.0, 0.5, 11.0, f32::NAN, 10.0];
        clean(&mut values);
        assert_eq!(values, vec![0.0, 0.5, 1.0, 0.0, 10.0]);
    }

    #[test]
    fn test_normalize_range() {
        let mut values: Vec<f32> = (0..=100).map(|i| i as f32).collect();
        normalize(&mut values);
        assert_eq!(values[0], 0.0);
        assert_eq!(values[5], 0.0);
        assert_eq!(values[95], 1.0);
        assert_eq!(values[100], 1.0);
        assert!(approx(values[50], 0.5));
        assert!(values.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_normalize_flat_is_zero() {
        let mut values = vec![0.42; 10];
        normalize(&mut values);
        assert!(values.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_hotspots_ordering_and_limit() {
        let bounds = BoundingBox {
            min_lat: 0.0,
            min_lon: 0.0,
            max_lat: 1.0,
            max_lon: 1.0,
        };
        let index = vec![
            0.9, 0.1, 1.0, //
            0.85, 0.9, 0.2, //
            0.8, 0.95, 0.99,
        ];
        let spots = hotspots(&index, 3, 3, &bounds, 0.8, 5);
        let values: Vec<f32> = spots.iter().map(|h| h.value).collect();
        assert_eq!(values, vec![1.0, 0.99, 0.95, 0.9, 0.9]);

        // Tie at 0.9 resolved by row then column: (0,0) before (1,1)
        let nw = bounds.pixel_center(0, 0, 3, 3);
        assert_eq!(spots[3].coordinate, nw);

        let top = spots[0].coordinate;
        assert!((top.lat - (1.0 - 0.5 / 3.0)).abs() < 1e-9);
        assert!((top.lon - 2.5 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_index_prefers_bare_ground() {
        let n = 9;
        // Pixel 4 is a clearing: low NIR, bright visible bands
        let mut b8 = vec![3200.0; n];
        let mut b4 = vec![400.0; n];
        let mut b3 = vec![600.0; n];
        let mut b2 = vec![350.0; n];
        b8[4] = 2200.0;
        b4[4] = 1900.0;
        b3[4] = 1500.0;
        b2[4] = 1250.0;
        let vv = vec![-8.0; n];

        let inputs = IndexInputs {
            b2: &b2,
            b3: &b3,
            b4: &b4,
            b8: &b8,
            vv: &vv,
            width: 3,
            height: 3,
            texture_radius: 2,
            smoothness_radius: 3,
        };
        let raw = raw_index(&inputs);
        assert!(raw[4] > raw[0]);

        let index = archaeological_index(&inputs);
        assert_eq!(index[4], 1.0);
        assert!(index.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_stats() {
        let bounds = BoundingBox::around(Coordinate::new(0.0, 0.0), 1.0);
        let stats = stats(&[0.0, 0.5, 1.0, 0.5], 2, 2, &bounds, 0.8, 5);
        assert_eq!(stats.min, 0.0);
        assert_eq!(stats.max, 1.0);
        assert!(approx(stats.mean, 0.5));
        assert_eq!(stats.hotspots.len(), 1);

        assert_eq!(super::stats(&[], 0, 0, &bounds, 0.8, 5), IndexStats::default());
    }
}
