//! JSON asset payloads.
//!
//! Dots: `[[x, y], ...]` in logical grid units.
//! Hotspots: `[{ "id", "label", "message", "lat", "lon" }, ...]`; the kind comes
//! from the file a record is listed in, not from the record.

use foundation::math::Vec2;
use scene::{HotspotKind, HotspotRecord, UnknownHotspotKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to parse {file}: {source}")]
    Json {
        file: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{file}: entry {index} has a non-finite coordinate")]
    NonFinite { file: String, index: usize },
    #[error(transparent)]
    UnknownKind(#[from] UnknownHotspotKind),
    #[error("unsupported manifest version {found:?}")]
    UnsupportedVersion { found: String },
}

/// One hotspot as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HotspotEntry {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub message: String,
    pub lat: f64,
    pub lon: f64,
}

impl HotspotEntry {
    pub fn into_record(self, kind: HotspotKind) -> HotspotRecord {
        HotspotRecord {
            id: self.id,
            label: self.label,
            message: self.message,
            lat: self.lat,
            lon: self.lon,
            kind,
        }
    }
}

pub fn parse_dots(file: &str, payload: &str) -> Result<Vec<Vec2>, AssetError> {
    let raw: Vec<[f64; 2]> = serde_json::from_str(payload).map_err(|source| AssetError::Json {
        file: file.to_string(),
        source,
    })?;

    raw.into_iter()
        .enumerate()
        .map(|(index, [x, y])| {
            if x.is_finite() && y.is_finite() {
                Ok(Vec2::new(x, y))
            } else {
                Err(AssetError::NonFinite {
                    file: file.to_string(),
                    index,
                })
            }
        })
        .collect()
}

/// Decodes a hotspot file. Records without an id or with a non-finite
/// position are skipped with a warning; the rest of the file still loads.
pub fn parse_hotspots(
    file: &str,
    payload: &str,
    kind: HotspotKind,
) -> Result<Vec<HotspotRecord>, AssetError> {
    let raw: Vec<HotspotEntry> = serde_json::from_str(payload).map_err(|source| AssetError::Json {
        file: file.to_string(),
        source,
    })?;

    let mut records = Vec::with_capacity(raw.len());
    for (index, entry) in raw.into_iter().enumerate() {
        if entry.id.trim().is_empty() {
            warn!(file, index, "skipping hotspot with an empty id");
            continue;
        }
        if !(entry.lat.is_finite() && entry.lon.is_finite()) {
            warn!(file, index, id = %entry.id, "skipping hotspot with a non-finite position");
            continue;
        }
        records.push(entry.into_record(kind));
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::{AssetError, parse_dots, parse_hotspots};
    use foundation::math::Vec2;
    use pretty_assertions::assert_eq;
    use scene::HotspotKind;

    #[test]
    fn parses_dot_pairs() {
        let dots = parse_dots("dots.json", "[[0, 1.5], [-2, 3]]").expect("dots");
        assert_eq!(dots, vec![Vec2::new(0.0, 1.5), Vec2::new(-2.0, 3.0)]);
    }

    #[test]
    fn rejects_malformed_dots() {
        let err = parse_dots("dots.json", "[[0, 1, 2]]").expect_err("triple");
        assert!(matches!(err, AssetError::Json { .. }));
        assert!(err.to_string().contains("dots.json"));
    }

    #[test]
    fn hotspot_kind_comes_from_the_caller() {
        let records = parse_hotspots(
            "telco.json",
            r#"[{ "id": "angola", "label": "Angola POP", "message": "up", "lat": -8.8, "lon": 13.3 }]"#,
            HotspotKind::Telco,
        )
        .expect("hotspots");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, HotspotKind::Telco);
        assert_eq!(records[0].label, "Angola POP");
    }

    #[test]
    fn label_and_message_are_optional() {
        let records = parse_hotspots("g.json", r#"[{ "id": "x", "lat": 0, "lon": 0 }]"#, HotspotKind::Global)
            .expect("hotspots");
        assert_eq!(records[0].message, "");
    }

    #[test]
    fn malformed_hotspots_are_skipped() {
        let payload = r#"[
            { "id": " ", "lat": 0, "lon": 0 },
            { "id": "lagos", "label": "Lagos POP", "lat": 6.5, "lon": 3.4 },
            { "id": "", "lat": 1, "lon": 1 }
        ]"#;
        let records = parse_hotspots("g.json", payload, HotspotKind::Global).expect("hotspots");
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["lagos"]);
    }
}
