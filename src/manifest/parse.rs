//! Archive ingestion: turn uploaded zip bytes into a [`ModManifest`].

use crate::asset::{sniff_mac_binary, validate_logo};
use crate::error::ApiError;
use crate::manifest::{MANIFEST_ENTRY, ModManifest};
use log::debug;
use sha2::{Digest, Sha256};
use std::io::{Cursor, Read};
use zip::ZipArchive;

impl ModManifest {
    /// Parse an uploaded package archive.
    ///
    /// The archive is hashed exactly as supplied, its `mod.json` entry
    /// is parsed and enriched (version `v` prefix stripped, hash and
    /// normalized download URL injected), and every other entry is
    /// classified: payload suffixes set platform flags, a bare
    /// `.dylib` is sniffed for Mach-O architectures, `about.md` /
    /// `changelog.md` fill the text fields and `logo.png` is validated
    /// (`store_logo` controls whether its bytes are retained). The
    /// dependency and incompatibility blocks are normalized into their
    /// canonical sequences before the manifest is returned, so an
    /// unparseable constraint rejects the upload here.
    ///
    /// Any error rejects the whole archive; no partial manifest is
    /// ever returned.
    pub fn from_archive(
        bytes: &[u8],
        download_url: &str,
        store_logo: bool,
        max_size_mb: u32,
    ) -> Result<Self, ApiError> {
        if bytes.len() > max_size_mb as usize * 1_000_000 {
            return Err(ApiError::SizeLimitExceeded);
        }

        let hash = hex::encode(Sha256::digest(bytes));

        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| ApiError::BadRequest(format!("Invalid archive: {}", e)))?;

        let mut raw: serde_json::Value = {
            let entry = archive
                .by_name(MANIFEST_ENTRY)
                .map_err(|_| ApiError::MissingManifest)?;
            serde_json::from_reader(entry)
                .map_err(|e| ApiError::BadRequest(format!("Invalid mod.json: {}", e)))?
        };

        let object = raw
            .as_object_mut()
            .ok_or_else(|| ApiError::BadRequest("mod.json must be a JSON object".to_string()))?;
        if let Some(serde_json::Value::String(version)) = object.get_mut("version") {
            *version = version.trim_start_matches('v').to_string();
        }
        object.insert("hash".to_string(), serde_json::Value::String(hash));
        object.insert(
            "download_url".to_string(),
            serde_json::Value::String(normalize_download_url(download_url)),
        );

        let mut manifest: ModManifest = serde_json::from_value(raw)
            .map_err(|e| ApiError::BadRequest(format!("Invalid mod.json: {}", e)))?;
        manifest.normalize_declarations()?;

        for index in 0..archive.len() {
            let mut entry = archive.by_index(index).map_err(|e| {
                ApiError::BadRequest(format!("Failed to read archive entry {}: {}", index, e))
            })?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();

            if name.ends_with(".dll") {
                manifest.windows = true;
            } else if name.ends_with(".ios.dylib") {
                manifest.ios = true;
            } else if name.ends_with(".dylib") {
                // Only the first 12 bytes matter for classification.
                let mut header = Vec::with_capacity(12);
                entry
                    .by_ref()
                    .take(12)
                    .read_to_end(&mut header)
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read {}: {}", name, e)))?;
                let (arm, intel) = sniff_mac_binary(&header)?;
                manifest.mac_arm = arm;
                manifest.mac_intel = intel;
            } else if name.ends_with(".android32.so") {
                manifest.android32 = true;
            } else if name.ends_with(".android64.so") {
                manifest.android64 = true;
            } else if name == "about.md" {
                manifest.about = Some(read_utf8(&mut entry, &name)?);
            } else if name == "changelog.md" {
                manifest.changelog = Some(read_utf8(&mut entry, &name)?);
            } else if name == "logo.png" {
                let mut bytes = Vec::new();
                entry
                    .read_to_end(&mut bytes)
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read {}: {}", name, e)))?;
                manifest.logo = validate_logo(&bytes, store_logo)?;
            } else {
                debug!("ignoring archive entry {}", name);
            }
        }

        Ok(manifest)
    }
}

fn read_utf8(entry: &mut impl Read, name: &str) -> Result<String, ApiError> {
    let mut bytes = Vec::new();
    entry
        .read_to_end(&mut bytes)
        .map_err(|e| ApiError::BadRequest(format!("Failed to read {}: {}", name, e)))?;
    String::from_utf8(bytes)
        .map_err(|_| ApiError::BadRequest(format!("{} is not valid UTF-8", name)))
}

/// Strip trailing path separators so stored URLs join cleanly.
fn normalize_download_url(url: &str) -> String {
    url.trim_end_matches(['/', '\\']).to_string()
}
