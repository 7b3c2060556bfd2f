use serde::{Deserialize, Serialize};

use crate::assets::AssetError;

pub const MANIFEST_VERSION: &str = "1.0";
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Lists the files that make up one dot map.
///
/// Hotspot files are loaded in the listed order; that order is also the
/// order the sequential connector threads the hotspots in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetManifest {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub dots: String,
    pub hotspots: Vec<HotspotSource>,
    /// Optional scene config overrides, relative to the manifest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HotspotSource {
    /// `global`, `regional` or `telco`.
    pub kind: String,
    pub path: String,
}

impl HotspotSource {
    pub fn new(kind: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            path: path.into(),
        }
    }
}

impl AssetManifest {
    /// Parses a manifest and checks its version.
    pub fn from_json(file: &str, payload: &str) -> Result<Self, AssetError> {
        let manifest: AssetManifest =
            serde_json::from_str(payload).map_err(|source| AssetError::Json {
                file: file.to_string(),
                source,
            })?;
        if manifest.version != MANIFEST_VERSION {
            return Err(AssetError::UnsupportedVersion {
                found: manifest.version,
            });
        }
        Ok(manifest)
    }
}

impl Default for AssetManifest {
    /// The conventional file layout used when a directory has no manifest.
    fn default() -> Self {
        Self {
            version: MANIFEST_VERSION.to_string(),
            name: None,
            dots: "dots.json".to_string(),
            hotspots: vec![
                HotspotSource::new("global", "global-hotspots.json"),
                HotspotSource::new("regional", "regional-hotspots.json"),
                HotspotSource::new("telco", "telco-hotspots.json"),
            ],
            config: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AssetManifest, MANIFEST_VERSION};
    use crate::assets::AssetError;
    use pretty_assertions::assert_eq;

    #[test]
    fn minimal_manifest_parses() {
        let m = AssetManifest::from_json(
            "manifest.json",
            r#"{
                "version": "1.0",
                "dots": "grid.json",
                "hotspots": [{ "kind": "telco", "path": "t.json" }]
            }"#,
        )
        .expect("parse manifest");
        assert_eq!(m.dots, "grid.json");
        assert_eq!(m.hotspots[0].kind, "telco");
        assert_eq!(m.config, None);
    }

    #[test]
    fn default_layout_lists_three_kinds_in_order() {
        let m = AssetManifest::default();
        assert_eq!(m.version, MANIFEST_VERSION);
        let kinds: Vec<&str> = m.hotspots.iter().map(|h| h.kind.as_str()).collect();
        assert_eq!(kinds, vec!["global", "regional", "telco"]);
    }

    #[test]
    fn rejects_unsupported_version() {
        let err = AssetManifest::from_json(
            "manifest.json",
            r#"{ "version": "2.0", "dots": "d.json", "hotspots": [] }"#,
        )
        .expect_err("version");
        match err {
            AssetError::UnsupportedVersion { found } => assert_eq!(found, "2.0"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
