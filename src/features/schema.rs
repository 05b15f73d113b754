//! Typed representation of an extracted-features archive document.
//!
//! Archives are decoded once, at load time, into these structs; "wrong
//! shape" conditions surface as a single validation failure instead of
//! scattered lookup errors in every accessor. The `metadata` object has
//! its own independently-versioned schema, so it stays a raw JSON map.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Top-level shape of an archive document as found on disk, before
/// validation.
#[derive(Debug, Deserialize)]
pub(crate) struct RawVolume {
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub features: Option<Features>,
}

impl RawVolume {
    /// Checks the document against the schema version expected for its
    /// archive kind, producing the validated form.
    pub fn validate(self, expected_version: &'static str) -> Result<VolumeData> {
        let features = self.features.ok_or_else(|| Error::MissingElement {
            element: "features".to_string(),
        })?;
        match features.schema_version.as_deref() {
            Some(found) if found == expected_version => {}
            Some(found) => {
                return Err(Error::SchemaVersionMismatch {
                    expected: expected_version,
                    found: found.to_string(),
                })
            }
            None => {
                return Err(Error::MissingElement {
                    element: "features.schemaVersion".to_string(),
                })
            }
        }
        Ok(VolumeData {
            metadata: self.metadata,
            features,
        })
    }
}

/// A schema-validated archive document.
#[derive(Debug)]
pub struct VolumeData {
    /// The bibliographic metadata object (metadata schema is versioned
    /// independently of the features schema).
    pub metadata: Map<String, Value>,
    pub features: Features,
}

/// The `features` element of an archive document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Features {
    pub schema_version: Option<String>,
    pub page_count: Option<u64>,
    #[serde(default)]
    pub pages: Vec<PageData>,
}

/// One entry of `features.pages`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageData {
    pub seq: Option<String>,
    pub date_created: Option<String>,
    pub token_count: Option<u64>,
    pub line_count: Option<u64>,
    pub body: Option<SectionData>,
    pub header: Option<SectionData>,
    pub footer: Option<SectionData>,
}

/// A page section (body, header, or footer) holding per-token
/// part-of-speech counts.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionData {
    pub token_pos_count: Option<HashMap<String, HashMap<String, u64>>>,
}
