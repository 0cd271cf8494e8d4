//! Generation request model and lifecycle states

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Reference to an image, either a remote URL or a local file path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ImageSource {
    Url(String),
    Path(String),
}

impl ImageSource {
    /// The raw reference string (also used as the fetch-cache key)
    pub fn reference(&self) -> &str {
        match self {
            ImageSource::Url(url) => url,
            ImageSource::Path(path) => path,
        }
    }
}

impl From<String> for ImageSource {
    fn from(reference: String) -> Self {
        if reference.starts_with("http://") || reference.starts_with("https://") {
            ImageSource::Url(reference)
        } else {
            ImageSource::Path(reference)
        }
    }
}

impl From<ImageSource> for String {
    fn from(source: ImageSource) -> Self {
        match source {
            ImageSource::Url(url) => url,
            ImageSource::Path(path) => path,
        }
    }
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reference())
    }
}

/// Which physical surface a visualization targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceType {
    Floor,
    Wall,
    Both,
}

impl fmt::Display for SurfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SurfaceType::Floor => "floor",
            SurfaceType::Wall => "wall",
            SurfaceType::Both => "both",
        };
        f.write_str(name)
    }
}

/// A target material: product name, swatch image, optional free-text descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductReference {
    pub name: String,
    pub swatch: ImageSource,
    #[serde(default)]
    pub descriptor: Option<String>,
}

/// One visualization request as accepted by the orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub id: Uuid,
    pub source_image: ImageSource,
    pub products: Vec<ProductReference>,
    pub surface: SurfaceType,
    #[serde(default)]
    pub pattern: Option<String>,
}

impl GenerationRequest {
    /// Reject malformed requests before they reach the admission path.
    pub fn validate(&self) -> Result<()> {
        if self.source_image.reference().trim().is_empty() {
            return Err(AppError::InvalidRequest(
                "source image reference is empty".to_string(),
            ));
        }

        match self.surface {
            SurfaceType::Floor | SurfaceType::Wall => {
                if self.products.is_empty() {
                    return Err(AppError::InvalidRequest(format!(
                        "surface type '{}' requires a product reference",
                        self.surface
                    )));
                }
            }
            SurfaceType::Both => {
                if self.products.len() < 2 {
                    return Err(AppError::InvalidRequest(
                        "surface type 'both' requires two product references".to_string(),
                    ));
                }
            }
        }

        if self.products.len() > 2 {
            return Err(AppError::InvalidRequest(format!(
                "at most two product references are supported, got {}",
                self.products.len()
            )));
        }

        for product in &self.products {
            if product.name.trim().is_empty() {
                return Err(AppError::InvalidRequest(
                    "product reference has an empty name".to_string(),
                ));
            }
            if product.swatch.reference().trim().is_empty() {
                return Err(AppError::InvalidRequest(format!(
                    "product '{}' has an empty swatch reference",
                    product.name
                )));
            }
        }

        Ok(())
    }
}

/// Request lifecycle: pending -> generating -> completed | failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    Pending,
    Generating,
    Completed,
    Failed,
}

impl GenerationStatus {
    /// Terminal statuses are final; a request never transitions out of them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, GenerationStatus::Completed | GenerationStatus::Failed)
    }
}

impl fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GenerationStatus::Pending => "pending",
            GenerationStatus::Generating => "generating",
            GenerationStatus::Completed => "completed",
            GenerationStatus::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A produced artifact, immutable once written
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    pub artifact_ref: String,
    pub surface: SurfaceType,
    pub created_at: DateTime<Utc>,
}

/// Stored view of a request: status, error summary, produced artifacts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestRecord {
    pub id: Uuid,
    pub surface: SurfaceType,
    pub status: GenerationStatus,
    pub error_message: Option<String>,
    pub results: Vec<GenerationResult>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Upper bound on persisted failure messages
pub const ERROR_SUMMARY_MAX_LEN: usize = 256;

/// Bound a failure message before it is persisted; upstream error text can be
/// arbitrarily verbose.
pub fn truncate_error_summary(message: &str) -> String {
    if message.len() <= ERROR_SUMMARY_MAX_LEN {
        return message.to_string();
    }
    let mut cut = ERROR_SUMMARY_MAX_LEN;
    while !message.is_char_boundary(cut) {
        cut -= 1;
    }
    message[..cut].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(surface: SurfaceType, products: usize) -> GenerationRequest {
        GenerationRequest {
            id: Uuid::new_v4(),
            source_image: ImageSource::from("https://example.com/room.png".to_string()),
            products: (0..products)
                .map(|i| ProductReference {
                    name: format!("product-{i}"),
                    swatch: ImageSource::from(format!("https://example.com/swatch-{i}.png")),
                    descriptor: None,
                })
                .collect(),
            surface,
            pattern: None,
        }
    }

    #[test]
    fn source_parsing_distinguishes_urls_from_paths() {
        assert_eq!(
            ImageSource::from("https://example.com/a.png".to_string()),
            ImageSource::Url("https://example.com/a.png".to_string())
        );
        assert_eq!(
            ImageSource::from("/var/data/room.png".to_string()),
            ImageSource::Path("/var/data/room.png".to_string())
        );
    }

    #[test]
    fn floor_requires_a_product() {
        assert!(request(SurfaceType::Floor, 1).validate().is_ok());
        assert!(request(SurfaceType::Floor, 0).validate().is_err());
    }

    #[test]
    fn both_requires_two_products() {
        assert!(request(SurfaceType::Both, 1).validate().is_err());
        assert!(request(SurfaceType::Both, 2).validate().is_ok());
    }

    #[test]
    fn more_than_two_products_rejected() {
        assert!(request(SurfaceType::Floor, 3).validate().is_err());
    }

    #[test]
    fn empty_source_rejected() {
        let mut req = request(SurfaceType::Floor, 1);
        req.source_image = ImageSource::from("  ".to_string());
        assert!(req.validate().is_err());
    }

    #[test]
    fn terminal_statuses() {
        assert!(!GenerationStatus::Pending.is_terminal());
        assert!(!GenerationStatus::Generating.is_terminal());
        assert!(GenerationStatus::Completed.is_terminal());
        assert!(GenerationStatus::Failed.is_terminal());
    }

    #[test]
    fn error_summary_is_bounded() {
        let long = "x".repeat(2000);
        let summary = truncate_error_summary(&long);
        assert_eq!(summary.len(), ERROR_SUMMARY_MAX_LEN);

        let short = "fetch failed";
        assert_eq!(truncate_error_summary(short), short);
    }

    #[test]
    fn error_summary_respects_char_boundaries() {
        let message = "é".repeat(300);
        let summary = truncate_error_summary(&message);
        assert!(summary.len() <= ERROR_SUMMARY_MAX_LEN);
        assert!(summary.chars().all(|c| c == 'é'));
    }
}
