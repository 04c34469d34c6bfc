//! Collage Document - JSON envelope used by the CLI

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::Collage;

/// Version written into new documents.
pub const DOCUMENT_FORMAT_VERSION: &str = "1.0.0";

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Failed to read document: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid format version: {0}")]
    InvalidVersion(String),

    #[error("Document format {found} is not supported (expected {expected}.x)")]
    UnsupportedVersion { found: String, expected: u64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollageDocument {
    pub format_version: String,
    pub collage: Collage,
}

impl CollageDocument {
    pub fn new(collage: Collage) -> Self {
        Self {
            format_version: DOCUMENT_FORMAT_VERSION.to_string(),
            collage,
        }
    }

    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, DocumentError> {
        let doc: Self = serde_json::from_str(content)?;
        doc.check_version()?;
        Ok(doc)
    }

    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn check_version(&self) -> Result<(), DocumentError> {
        let found = semver::Version::parse(&self.format_version)
            .map_err(|_| DocumentError::InvalidVersion(self.format_version.clone()))?;
        let supported = semver::Version::parse(DOCUMENT_FORMAT_VERSION)
            .map_err(|_| DocumentError::InvalidVersion(DOCUMENT_FORMAT_VERSION.into()))?;

        if found.major != supported.major {
            return Err(DocumentError::UnsupportedVersion {
                found: self.format_version.clone(),
                expected: supported.major,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point, Size};
    use crate::model::{Background, Canvas, ImagePlacement};

    fn sample() -> CollageDocument {
        let canvas = Canvas::new(800, 600, "#336699".parse::<Background>().unwrap()).unwrap();
        let mut collage = Collage::new("Doc", canvas);
        collage.add_placement(ImagePlacement::new(
            "one.png",
            Size::new(300.0, 200.0),
            Point::new(-10.0, 5.5),
        ));
        CollageDocument::new(collage)
    }

    #[test]
    fn test_document_survives_json() {
        let doc = sample();
        let json = doc.to_json().unwrap();
        assert!(json.contains("\"formatVersion\": \"1.0.0\""));
        assert!(json.contains("#336699"));

        let back = CollageDocument::from_json(&json).unwrap();
        assert_eq!(back.collage, doc.collage);
    }

    #[test]
    fn test_zero_sized_canvas_rejected_on_load() {
        let json = sample().to_json().unwrap().replace("\"width\": 800", "\"width\": 0");
        assert!(matches!(
            CollageDocument::from_json(&json).unwrap_err(),
            DocumentError::Parse(_)
        ));
    }

    #[test]
    fn test_pinched_document_reloads() {
        let mut doc = sample();
        let id = doc.collage.placements()[0].id();
        let p = doc.collage.placement_mut(id).unwrap();
        let session = crate::gesture::GestureSession::begin(crate::gesture::GestureKind::Pinch, p);
        session
            .apply(crate::gesture::GestureUpdate::Pinch { scale: f64::INFINITY }, p)
            .unwrap();

        let back = CollageDocument::from_json(&doc.to_json().unwrap()).unwrap();
        assert_eq!(back.collage.placements()[0].size(), Size::new(300.0, 200.0));
    }

    #[test]
    fn test_minor_version_accepted() {
        let mut doc = sample();
        doc.format_version = "1.4.0".to_string();
        let json = doc.to_json().unwrap();
        assert!(CollageDocument::from_json(&json).is_ok());
    }

    #[test]
    fn test_major_version_rejected() {
        let mut doc = sample();
        doc.format_version = "2.0.0".to_string();
        let json = doc.to_json().unwrap();
        let err = CollageDocument::from_json(&json).unwrap_err();
        assert!(matches!(err, DocumentError::UnsupportedVersion { expected: 1, .. }));

        doc.format_version = "one".to_string();
        let json = doc.to_json().unwrap();
        assert!(matches!(
            CollageDocument::from_json(&json).unwrap_err(),
            DocumentError::InvalidVersion(_)
        ));
    }
}
