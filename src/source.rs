//! Metadata records from the catalog query endpoint.
//!
//! The endpoint returns a JSON array, one object per image variant. Records
//! only pre-populate gallery entries; their natural sizes are still unknown.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::ImageEntry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    #[serde(rename = "idvariant")]
    pub identifier: i64,
    #[serde(rename = "file")]
    pub filename: String,
    /// Locator of the displayable preview asset.
    #[serde(rename = "preview")]
    pub preview_reference: String,
    #[serde(rename = "iddata", default)]
    pub metadata_id: Option<i64>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(rename = "countrycode", default)]
    pub country_code: Option<String>,
}

impl SourceRecord {
    /// "City, State, Country" from whichever parts are present.
    pub fn location(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.city, &self.state, &self.country]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }

    /// Unloaded gallery entry keyed by variant id, sourced from the preview.
    pub fn to_entry(&self) -> ImageEntry {
        ImageEntry::pending(self.identifier.to_string(), self.preview_reference.clone())
    }
}

pub fn parse_records(json: &str) -> Result<Vec<SourceRecord>> {
    Ok(serde_json::from_str(json)?)
}

/// Parses records and converts them to entries, keeping endpoint order.
pub fn entries_from_json(json: &str) -> Result<Vec<ImageEntry>> {
    Ok(parse_records(json)?.iter().map(SourceRecord::to_entry).collect())
}

/// Reads a saved endpoint response.
pub fn load_records(path: &Path) -> anyhow::Result<Vec<SourceRecord>> {
    use anyhow::Context;

    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read metadata: {:?}", path))?;
    parse_records(&json).with_context(|| format!("Failed to parse metadata: {:?}", path))
}
