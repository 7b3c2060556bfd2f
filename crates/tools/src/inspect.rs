//! `dotmap inspect`: how an asset directory resolves into a scene.

use std::path::Path;

use formats::{
    AssetBundle, AssetManifest, SceneLoadError, load_bundle_from_dir, load_config, load_manifest,
    load_manifest_config,
};
use scene::connectors::Route;
use scene::{FrameDriver, NullSink, SceneConfig, SceneState};
use serde::Serialize;

/// An asset directory loaded from disk, before any frame has run.
pub struct LoadedMap {
    pub manifest: AssetManifest,
    pub config: SceneConfig,
    pub bundle: AssetBundle,
}

impl LoadedMap {
    pub fn scene(&self) -> SceneState {
        self.bundle.build_scene(&self.config)
    }
}

/// Loads `root`. A `config` path overrides the one named by the manifest.
pub fn load_map(root: &Path, config: Option<&Path>) -> Result<LoadedMap, SceneLoadError> {
    let manifest = load_manifest(root)?;
    let config = match config {
        Some(path) => load_config(path)?,
        None => load_manifest_config(root, &manifest)?,
    };
    let bundle = load_bundle_from_dir(root, &manifest)?;
    Ok(LoadedMap {
        manifest,
        config,
        bundle,
    })
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HotspotBinding {
    pub id: String,
    pub kind: &'static str,
    pub dot: u32,
    pub instance: u32,
    pub grid: [f64; 2],
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ConnectorSummary {
    pub route: String,
    pub points: usize,
    pub vertices: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InspectReport {
    pub name: Option<String>,
    pub content_hash: String,
    pub dots: usize,
    /// Global, regional, telco.
    pub instance_counts: [u32; 3],
    pub hotspots: Vec<HotspotBinding>,
    pub skipped: Vec<String>,
    pub connectors: Vec<ConnectorSummary>,
}

fn route_name(scene: &SceneState, route: &Route) -> String {
    match route {
        Route::Sequential => "sequential".to_string(),
        Route::Pair { from, to } => {
            let name = |id| scene.hotspot(id).map_or("?", |h| h.id.as_str());
            format!("{} -> {}", name(*from), name(*to))
        }
    }
}

pub fn inspect(map: &LoadedMap) -> Result<InspectReport, scene::ConfigError> {
    let scene = map.scene();

    let mut driver = FrameDriver::new(map.config.clone())?;
    driver.install(&scene, &mut NullSink);

    let hotspots = scene
        .hotspots()
        .iter()
        .map(|h| {
            let grid = scene.dot(h.dot).map_or([0.0, 0.0], |d| [d.grid.x, d.grid.y]);
            HotspotBinding {
                id: h.id.clone(),
                kind: h.kind.as_str(),
                dot: h.dot.index(),
                instance: h.instance,
                grid,
            }
        })
        .collect();

    let connectors = driver
        .connectors()
        .iter()
        .map(|(_, c)| ConnectorSummary {
            route: route_name(&scene, c.route()),
            points: c.points().len(),
            vertices: c.mesh().map_or(0, |m| m.vertex_count()),
        })
        .collect();

    Ok(InspectReport {
        name: map.manifest.name.clone(),
        content_hash: map.bundle.content_hash(),
        dots: scene.dots().len(),
        instance_counts: scene.instance_counts(),
        hotspots,
        skipped: scene.skipped_hotspots().to_vec(),
        connectors,
    })
}

#[cfg(test)]
mod tests {
    use super::{inspect, load_map};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn demo_root() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../apps/viewer_web/assets")
    }

    #[test]
    fn demo_map_binds_every_hotspot() {
        let map = load_map(&demo_root(), None).expect("load demo");
        let report = inspect(&map).expect("inspect");

        assert_eq!(report.name.as_deref(), Some("Demo POP map"));
        assert!(report.skipped.is_empty());
        assert_eq!(report.hotspots.len(), 7);
        assert_eq!(report.instance_counts, [2, 4, 1]);

        let mut dots: Vec<u32> = report.hotspots.iter().map(|h| h.dot).collect();
        dots.sort_unstable();
        dots.dedup();
        assert_eq!(dots.len(), report.hotspots.len(), "one hotspot per dot");
    }

    #[test]
    fn sequential_connector_spans_every_hotspot() {
        let map = load_map(&demo_root(), None).expect("load demo");
        let report = inspect(&map).expect("inspect");
        let seq = report
            .connectors
            .iter()
            .find(|c| c.route == "sequential")
            .expect("sequential connector");
        let segments = map.config.connector.segments as usize;
        assert_eq!(seq.points, (report.hotspots.len() - 1) * segments + 1);
        assert!(seq.vertices > 0);
    }

    #[test]
    fn content_hash_is_stable_across_loads() {
        let a = inspect(&load_map(&demo_root(), None).expect("load")).expect("inspect");
        let b = inspect(&load_map(&demo_root(), None).expect("load")).expect("inspect");
        assert_eq!(a.content_hash, b.content_hash);
    }
}
