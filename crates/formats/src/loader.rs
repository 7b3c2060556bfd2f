use std::fs;
use std::path::{Path, PathBuf};

use foundation::math::Vec2;
use scene::{HotspotKind, HotspotRecord, SceneConfig, SceneState};
use thiserror::Error;
use tracing::info;

use crate::assets::{AssetError, parse_dots, parse_hotspots};
use crate::manifest::{AssetManifest, HotspotSource, MANIFEST_FILE_NAME};

#[derive(Debug, Error)]
pub enum SceneLoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error("invalid scene config: {0}")]
    Config(#[from] scene::ConfigError),
}

/// Parsed dots and hotspot records, plus a content hash over every payload
/// that went into them.
#[derive(Clone, Default)]
pub struct AssetBundle {
    dots: Vec<Vec2>,
    hotspots: Vec<HotspotRecord>,
    hasher: blake3::Hasher,
}

impl AssetBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dots(&self) -> &[Vec2] {
        &self.dots
    }

    pub fn hotspots(&self) -> &[HotspotRecord] {
        &self.hotspots
    }

    /// Replaces the dot grid.
    pub fn add_dots(&mut self, file: &str, payload: &str) -> Result<(), AssetError> {
        self.dots = parse_dots(file, payload)?;
        self.digest(file, payload);
        Ok(())
    }

    /// Appends the records of one hotspot file.
    pub fn add_hotspots(&mut self, source: &HotspotSource, payload: &str) -> Result<(), AssetError> {
        let kind: HotspotKind = source.kind.parse()?;
        let records = parse_hotspots(&source.path, payload, kind)?;
        self.hotspots.extend(records);
        self.digest(&source.path, payload);
        Ok(())
    }

    /// Hex blake3 digest of every payload added so far, in order.
    pub fn content_hash(&self) -> String {
        self.hasher.finalize().to_hex().to_string()
    }

    /// Builds the scene, binding every hotspot to its nearest free dot.
    pub fn build_scene(&self, config: &SceneConfig) -> SceneState {
        SceneState::build(config, self.dots.iter().copied(), self.hotspots.iter().cloned())
    }

    fn digest(&mut self, file: &str, payload: &str) {
        self.hasher.update(file.as_bytes());
        self.hasher.update(&[0]);
        self.hasher.update(payload.as_bytes());
    }
}

fn read(path: &Path) -> Result<String, SceneLoadError> {
    fs::read_to_string(path).map_err(|source| SceneLoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads `manifest.json` under `root`, or the conventional layout if absent.
pub fn load_manifest(root: impl AsRef<Path>) -> Result<AssetManifest, SceneLoadError> {
    let path = root.as_ref().join(MANIFEST_FILE_NAME);
    if !path.exists() {
        return Ok(AssetManifest::default());
    }
    let payload = read(&path)?;
    Ok(AssetManifest::from_json(MANIFEST_FILE_NAME, &payload)?)
}

/// Parses and validates a scene config payload. Missing fields take defaults.
pub fn parse_config(file: &str, payload: &str) -> Result<SceneConfig, SceneLoadError> {
    let config: SceneConfig = serde_json::from_str(payload).map_err(|source| AssetError::Json {
        file: file.to_string(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}

/// Reads and validates a scene config file.
pub fn load_config(path: impl AsRef<Path>) -> Result<SceneConfig, SceneLoadError> {
    let path = path.as_ref();
    let payload = read(path)?;
    parse_config(&path.display().to_string(), &payload)
}

/// Config named by the manifest, or defaults.
pub fn load_manifest_config(
    root: impl AsRef<Path>,
    manifest: &AssetManifest,
) -> Result<SceneConfig, SceneLoadError> {
    match &manifest.config {
        Some(rel) => load_config(root.as_ref().join(rel)),
        None => Ok(SceneConfig::default()),
    }
}

pub fn load_bundle_from_dir(
    root: impl AsRef<Path>,
    manifest: &AssetManifest,
) -> Result<AssetBundle, SceneLoadError> {
    let root = root.as_ref();
    let mut bundle = AssetBundle::new();

    let dots = read(&root.join(&manifest.dots))?;
    bundle.add_dots(&manifest.dots, &dots)?;

    for source in &manifest.hotspots {
        let payload = read(&root.join(&source.path))?;
        bundle.add_hotspots(source, &payload)?;
    }

    info!(
        root = %root.display(),
        dots = bundle.dots().len(),
        hotspots = bundle.hotspots().len(),
        "assets loaded"
    );
    Ok(bundle)
}

/// Loads an asset directory into a scene using `config`.
pub fn load_scene_from_dir(
    root: impl AsRef<Path>,
    config: &SceneConfig,
) -> Result<SceneState, SceneLoadError> {
    let root = root.as_ref();
    let manifest = load_manifest(root)?;
    let bundle = load_bundle_from_dir(root, &manifest)?;
    Ok(bundle.build_scene(config))
}

#[cfg(test)]
mod tests {
    use super::{
        AssetBundle, SceneLoadError, load_bundle_from_dir, load_manifest, load_scene_from_dir,
        parse_config,
    };
    use crate::assets::AssetError;
    use crate::manifest::HotspotSource;
    use pretty_assertions::assert_eq;
    use scene::{HotspotKind, SceneConfig};
    use std::fs;
    use std::path::PathBuf;

    fn demo_root() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../apps/viewer_web/assets")
    }

    fn temp_dir(label: &str) -> PathBuf {
        let mut dir = std::env::temp_dir();
        dir.push(format!("dotmap_loader_{label}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn loads_demo_assets_into_scene() {
        let scene = load_scene_from_dir(demo_root(), &SceneConfig::default()).expect("load scene");

        assert!(scene.dots().len() > 100);
        assert!(scene.skipped_hotspots().is_empty());
        assert!(scene.find_hotspot("johannesburg").is_some());
        assert!(scene.find_hotspot("singapore").is_some());
        let counts = scene.instance_counts();
        assert!(counts.iter().all(|&c| c > 0), "every kind present: {counts:?}");
    }

    #[test]
    fn demo_hotspots_keep_manifest_order() {
        let root = demo_root();
        let manifest = load_manifest(&root).expect("manifest");
        let bundle = load_bundle_from_dir(&root, &manifest).expect("bundle");
        let kinds: Vec<HotspotKind> = bundle.hotspots().iter().map(|h| h.kind).collect();
        let mut sorted = kinds.clone();
        sorted.sort();
        assert_eq!(kinds, sorted);
    }

    #[test]
    fn missing_manifest_falls_back_to_conventional_layout() {
        let root = temp_dir("fallback");
        fs::write(root.join("dots.json"), "[[0,0],[1,0]]").expect("write dots");
        fs::write(
            root.join("global-hotspots.json"),
            r#"[{ "id": "a", "label": "A", "message": "", "lat": 0, "lon": 0 }]"#,
        )
        .expect("write global");
        fs::write(root.join("regional-hotspots.json"), "[]").expect("write regional");
        fs::write(root.join("telco-hotspots.json"), "[]").expect("write telco");

        let scene = load_scene_from_dir(&root, &SceneConfig::default()).expect("load");
        assert_eq!(scene.dots().len(), 2);
        assert_eq!(scene.hotspots().len(), 1);
    }

    #[test]
    fn missing_file_reports_its_path() {
        let root = temp_dir("missing");
        let err = load_scene_from_dir(&root, &SceneConfig::default()).expect_err("no dots");
        match err {
            SceneLoadError::Io { path, .. } => assert!(path.ends_with("dots.json")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let mut bundle = AssetBundle::new();
        let err = bundle
            .add_hotspots(&HotspotSource::new("carrier", "c.json"), "[]")
            .expect_err("kind");
        assert!(matches!(err, AssetError::UnknownKind(_)));
    }

    #[test]
    fn content_hash_tracks_payloads() {
        let mut a = AssetBundle::new();
        a.add_dots("dots.json", "[[0,0]]").expect("dots");
        let mut b = AssetBundle::new();
        b.add_dots("dots.json", "[[0,0]]").expect("dots");
        assert_eq!(a.content_hash(), b.content_hash());
        b.add_hotspots(&HotspotSource::new("global", "g.json"), "[]")
            .expect("hotspots");
        assert_ne!(a.content_hash(), b.content_hash());
        assert_eq!(a.content_hash().len(), 64);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config = parse_config("scene.json", r#"{ "hover": { "max_lift": 0.8 } }"#)
            .expect("config");
        assert_eq!(config.hover.max_lift, 0.8);
        assert_eq!(config.hover.radius, SceneConfig::default().hover.radius);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let err = parse_config("scene.json", r#"{ "interaction": { "decay": 1.5 } }"#)
            .expect_err("decay");
        assert!(matches!(
            err,
            SceneLoadError::Config(scene::ConfigError::DecayOutOfRange(_))
        ));
    }
}
