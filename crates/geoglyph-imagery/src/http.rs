//! HTTP raster service client
//!
//! Wire format:
//!
//! - request: `POST {endpoint}/v1/rasters` with `RasterRequest` as JSON
//! - `200`: `{"rasters": {"<dataset id>": {"width", "height", "bands": {...}}}}`
//! - `204` / `404`: no coverage, optional `{"dataset_id": "..."}` body
//! - `401` / `403`: credentials rejected

use crate::ImageryError;
use geoglyph_domain::traits::{ImageryRequest, ImageryResponse, ImagerySource};
use geoglyph_domain::{bands_for, BoundingBox, Raster};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Default timeout for raster requests (300 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Client for a remote raster service
pub struct HttpImagerySource {
    endpoint: String,
    token: Option<String>,
    client: reqwest::blocking::Client,
}

#[derive(Debug, Serialize)]
struct RasterRequest<'a> {
    bounds: &'a BoundingBox,
    datasets: &'a [String],
    start_date: String,
    end_date: String,
    resolution_m: f64,
    width: u32,
    height: u32,
}

#[derive(Debug, Deserialize)]
struct RasterResponse {
    rasters: BTreeMap<String, Raster>,
}

#[derive(Debug, Default, Deserialize)]
struct MissBody {
    #[serde(default)]
    dataset_id: Option<String>,
}

impl HttpImagerySource {
    /// Create a client for `endpoint` with an optional bearer token
    pub fn new(endpoint: impl Into<String>, token: Option<String>) -> Result<Self, ImageryError> {
        let endpoint = endpoint.into();
        if endpoint.trim().is_empty() {
            return Err(ImageryError::Configuration("imagery endpoint is empty".to_string()));
        }

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
            client: build_client(DEFAULT_TIMEOUT_SECS)?,
        })
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Result<Self, ImageryError> {
        self.client = build_client(timeout_secs)?;
        Ok(self)
    }

    /// Service base URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn build_client(timeout_secs: u64) -> Result<reqwest::blocking::Client, ImageryError> {
    reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ImageryError::Configuration(format!("Failed to build HTTP client: {}", e)))
}

impl ImagerySource for HttpImagerySource {
    type Error = ImageryError;

    fn fetch(&self, request: &ImageryRequest) -> Result<ImageryResponse, Self::Error> {
        let url = format!("{}/v1/rasters", self.endpoint);
        let (width, height) = request.dimensions;

        let body = RasterRequest {
            bounds: &request.bounds,
            datasets: &request.dataset_ids,
            start_date: request.date_range.start.to_string(),
            end_date: request.date_range.end.to_string(),
            resolution_m: request.resolution_m,
            width,
            height,
        };

        debug!(datasets = ?request.dataset_ids, width, height, "Requesting rasters");

        let mut builder = self.client.post(&url).json(&body);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .map_err(|e| ImageryError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .map_err(|e| ImageryError::Communication(format!("Failed to read body: {}", e)))?;

        interpret(status, &text, request)
    }
}

/// Turn a service reply into a response for `request`
fn interpret(status: StatusCode, body: &str, request: &ImageryRequest) -> Result<ImageryResponse, ImageryError> {
    match status {
        StatusCode::OK => {
            let parsed: RasterResponse = serde_json::from_str(body)?;
            check_rasters(parsed.rasters, request)
        }
        StatusCode::NO_CONTENT | StatusCode::NOT_FOUND => {
            let miss: MissBody = serde_json::from_str(body).unwrap_or_default();
            let dataset_id = miss
                .dataset_id
                .unwrap_or_else(|| request.dataset_ids.join(","));
            Ok(ImageryResponse::CoverageMiss { dataset_id })
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(ImageryError::Authentication(format!("HTTP {}: {}", status, body)))
        }
        _ => Err(ImageryError::Communication(format!("HTTP {}: {}", status, body))),
    }
}

/// Every requested dataset must be present with the requested shape and bands
fn check_rasters(
    mut rasters: BTreeMap<String, Raster>,
    request: &ImageryRequest,
) -> Result<ImageryResponse, ImageryError> {
    let (width, height) = request.dimensions;

    for dataset_id in &request.dataset_ids {
        let Some(raster) = rasters.get(dataset_id) else {
            warn!(dataset = %dataset_id, "Dataset missing from response, treating as coverage miss");
            return Ok(ImageryResponse::CoverageMiss {
                dataset_id: dataset_id.clone(),
            });
        };

        if raster.width != width || raster.height != height {
            return Err(ImageryError::InvalidResponse(format!(
                "{} is {}x{}, expected {}x{}",
                dataset_id, raster.width, raster.height, width, height
            )));
        }
        raster
            .validate()
            .map_err(|e| ImageryError::InvalidResponse(format!("{}: {}", dataset_id, e)))?;

        for band in bands_for(dataset_id) {
            if raster.band(band).is_none() {
                return Err(ImageryError::InvalidResponse(format!(
                    "{} is missing band {}",
                    dataset_id, band
                )));
            }
        }
    }

    rasters.retain(|id, _| request.dataset_ids.contains(id));
    Ok(ImageryResponse::Rasters(rasters))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoglyph_domain::{Coordinate, DateRange, OPTICAL_DATASET, RADAR_DATASET};

    fn request() -> ImageryRequest {
        ImageryRequest {
            bounds: BoundingBox::around(Coordinate::new(-12.5, -53.0), 2.0),
            dataset_ids: vec![OPTICAL_DATASET.to_string(), RADAR_DATASET.to_string()],
            date_range: DateRange::parse("2023-01-01", "2023-12-31").unwrap(),
            resolution_m: 1000.0,
            dimensions: (2, 1),
        }
    }

    fn body(include_radar: bool) -> String {
        let mut rasters = serde_json::json!({
            OPTICAL_DATASET: {"width": 2, "height": 1, "bands": {
                "B2": [1.0, 2.0], "B3": [1.0, 2.0], "B4": [1.0, 2.0], "B8": [1.0, 2.0]
            }}
        });
        if include_radar {
            rasters[RADAR_DATASET] = serde_json::json!({"width": 2, "height": 1, "bands": {
                "VV": [-12.0, -11.0], "VH": [-18.0, -17.0]
            }});
        }
        serde_json::json!({ "rasters": rasters }).to_string()
    }

    #[test]
    fn test_ok_response_parsed() {
        let response = interpret(StatusCode::OK, &body(true), &request()).unwrap();
        match response {
            ImageryResponse::Rasters(rasters) => {
                assert_eq!(rasters.len(), 2);
                assert_eq!(rasters[RADAR_DATASET].band("VV"), Some(&[-12.0, -11.0][..]));
            }
            other => panic!("Expected rasters, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_dataset_is_coverage_miss() {
        let response = interpret(StatusCode::OK, &body(false), &request()).unwrap();
        assert_eq!(
            response,
            ImageryResponse::CoverageMiss {
                dataset_id: RADAR_DATASET.to_string()
            }
        );
    }

    #[test]
    fn test_no_content_is_coverage_miss() {
        let response = interpret(StatusCode::NO_CONTENT, "", &request()).unwrap();
        assert!(matches!(response, ImageryResponse::CoverageMiss { .. }));

        let response = interpret(
            StatusCode::NOT_FOUND,
            r#"{"dataset_id": "COPERNICUS/S1_GRD"}"#,
            &request(),
        )
        .unwrap();
        assert_eq!(
            response,
            ImageryResponse::CoverageMiss {
                dataset_id: RADAR_DATASET.to_string()
            }
        );
    }

    #[test]
    fn test_auth_failure_is_fatal() {
        let err = interpret(StatusCode::FORBIDDEN, "denied", &request()).unwrap_err();
        assert!(matches!(err, ImageryError::Authentication(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let mut req = request();
        req.dimensions = (3, 1);
        let err = interpret(StatusCode::OK, &body(true), &req).unwrap_err();
        assert!(matches!(err, ImageryError::InvalidResponse(_)));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_server_error_recoverable() {
        let err = interpret(StatusCode::INTERNAL_SERVER_ERROR, "boom", &request()).unwrap_err();
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_empty_endpoint_rejected() {
        assert!(matches!(
            HttpImagerySource::new("", None),
            Err(ImageryError::Configuration(_))
        ));
        let source = HttpImagerySource::new("https://rasters.example.org/", Some(String::new())).unwrap();
        assert_eq!(source.endpoint(), "https://rasters.example.org");
        assert!(source.token.is_none());
    }
}
