//! Catalog document decoding.
//!
//! A catalog lists every add-on published on a branch. Each record has the
//! same shape as an add-on manifest:
//!
//! ```json
//! {
//!   "addons": [
//!     {
//!       "id": "script.module.six",
//!       "version": "1.15.0",
//!       "requires": [{ "addon": "xbmc.python", "version": "2.25.0" }]
//!     }
//!   ]
//! }
//! ```
//!
//! Payloads may be gzip-compressed; compression is detected from the magic
//! bytes rather than the file name. Records are converted one at a time, so
//! a malformed record is skipped with a warning instead of failing the
//! whole catalog.

use std::io::Read;

use addon_meta::ManifestDocument;
use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// A decoded catalog document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CatalogDocument {
    /// Published add-on records.
    #[serde(default)]
    pub addons: Vec<ManifestDocument>,
}

impl CatalogDocument {
    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// The document as read, before records are converted.
#[derive(Debug, Deserialize)]
struct RawCatalog {
    #[serde(default)]
    addons: Vec<serde_json::Value>,
}

impl From<RawCatalog> for CatalogDocument {
    fn from(raw: RawCatalog) -> Self {
        let addons = raw
            .addons
            .into_iter()
            .enumerate()
            .filter_map(|(index, record)| {
                let id = record.get("id").and_then(|id| id.as_str()).map(str::to_owned);
                match ManifestDocument::from_json_value(record) {
                    Ok(document) => Some(document),
                    Err(e) => {
                        tracing::warn!(index, id = ?id, error = %e, "Skipping malformed catalog record");
                        None
                    }
                }
            })
            .collect();
        Self { addons }
    }
}

/// Whether the payload starts with the gzip magic bytes.
pub fn is_gzip(payload: &[u8]) -> bool {
    payload.starts_with(&GZIP_MAGIC)
}

/// Decode a raw catalog payload.
///
/// # Errors
///
/// Fails when the payload cannot be inflated or is not a catalog document
/// at all. Individual malformed records are dropped, not reported.
pub fn decode(payload: &[u8]) -> Result<CatalogDocument> {
    let raw: RawCatalog = if is_gzip(payload) {
        let mut decoder = GzDecoder::new(payload);
        let mut inflated = Vec::new();
        decoder
            .read_to_end(&mut inflated)
            .map_err(Error::Decompress)?;
        serde_json::from_slice(&inflated)?
    } else {
        serde_json::from_slice(payload)?
    };
    Ok(raw.into())
}
