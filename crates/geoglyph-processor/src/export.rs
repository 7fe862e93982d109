//! Heatmap PNG export

use crate::error::ProcessorError;
use geoglyph_domain::{CompositeImage, Raster, INDEX_BAND};
use image::{codecs::png::PngEncoder, ExtendedColorType, ImageEncoder};
use std::path::{Path, PathBuf};

/// Encode the index band of a heatmap as an 8-bit grayscale PNG
pub fn heatmap_png(heatmap: &Raster) -> Result<Vec<u8>, ProcessorError> {
    let values = heatmap.band(INDEX_BAND).ok_or_else(|| ProcessorError::MissingBand {
        dataset_id: "heatmap".to_string(),
        band: INDEX_BAND.to_string(),
    })?;

    let pixels: Vec<u8> = values
        .iter()
        .map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
        .collect();

    let mut png = Vec::new();
    PngEncoder::new(&mut png).write_image(&pixels, heatmap.width, heatmap.height, ExtendedColorType::L8)?;
    Ok(png)
}

/// Write `<dir>/images/<scale>/<region>_<scale>_heatmap.png`
///
/// The file is written to a temporary name first and renamed into place.
pub fn export_heatmap(composite: &CompositeImage, dir: &Path) -> Result<PathBuf, ProcessorError> {
    let scale = composite.window.scale.as_str();
    let target_dir = dir.join("images").join(scale);
    std::fs::create_dir_all(&target_dir)?;

    let path = target_dir.join(format!("{}_{}_heatmap.png", composite.region_id, scale));
    let tmp = path.with_extension("png.tmp");

    std::fs::write(&tmp, heatmap_png(&composite.heatmap)?)?;
    std::fs::rename(&tmp, &path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoglyph_domain::{Coordinate, DateRange, IndexStats, Scale, ScaleWindow};

    fn composite() -> CompositeImage {
        let heatmap = Raster::new(2, 2)
            .with_band(INDEX_BAND, vec![0.0, 0.5, 1.0, 0.25])
            .unwrap();
        CompositeImage {
            region_id: "brazil_xingu".to_string(),
            window: ScaleWindow::with_defaults(Coordinate::new(-12.5, -53.0), Scale::Site),
            sources: Raster::new(2, 2),
            heatmap,
            stats: IndexStats::default(),
            dataset_ids: vec![],
            date_range: DateRange::parse("2023-01-01", "2023-12-31").unwrap(),
            reference: "brazil_xingu_site_composite".to_string(),
        }
    }

    #[test]
    fn test_png_signature() {
        let png = heatmap_png(&composite().heatmap).unwrap();
        assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    }

    #[test]
    fn test_missing_band() {
        assert!(matches!(
            heatmap_png(&Raster::new(1, 1)),
            Err(ProcessorError::MissingBand { .. })
        ));
    }

    #[test]
    fn test_export_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = export_heatmap(&composite(), dir.path()).unwrap();

        assert_eq!(path, dir.path().join("images/site/brazil_xingu_site_heatmap.png"));
        assert!(path.exists());
        assert!(!path.with_extension("png.tmp").exists());
    }
}
