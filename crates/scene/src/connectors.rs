//! Connector tubes between hotspots.
//!
//! Two kinds of connector exist: one sequential tube threading every hotspot
//! in dataset order, and any number of pairwise arcs named by hotspot id.
//! Each connector owns its tube buffers. When its hotspots move the buffers are
//! rewritten in place; they are only replaced when the sampled point count
//! changes, and every replacement bumps the connector's buffer generation.

use foundation::math::Vec3;
use foundation::{ConnectorId, HotspotId};
use tracing::{debug, warn};

use crate::config::{ConnectorConfig, ConnectorOverrides, SceneConfig};
use crate::curve::{chain_arcs, push_arc};
use crate::state::SceneState;
use crate::tube::TubeMesh;

/// Connector style with every per-pair override applied.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ResolvedConnectorConfig {
    pub color: u32,
    pub opacity: f64,
    pub height_offset: f64,
    pub arc_height: f64,
    pub segments: u32,
    pub thickness: f64,
    pub radial_segments: u32,
}

impl ResolvedConnectorConfig {
    pub fn from_global(global: &ConnectorConfig) -> Self {
        Self::merge(global, &ConnectorOverrides::default())
    }

    /// Field-wise merge: each override wins when present.
    pub fn merge(global: &ConnectorConfig, overrides: &ConnectorOverrides) -> Self {
        Self {
            color: overrides.color.unwrap_or(global.color),
            opacity: overrides.opacity.unwrap_or(global.opacity),
            height_offset: overrides.height_offset.unwrap_or(global.height_offset),
            arc_height: overrides.arc_height.unwrap_or(global.arc_height),
            segments: overrides.segments.unwrap_or(global.segments),
            thickness: overrides.thickness.unwrap_or(global.thickness),
            radial_segments: overrides.radial_segments.unwrap_or(global.radial_segments),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Every hotspot, in dataset order.
    Sequential,
    Pair { from: HotspotId, to: HotspotId },
}

impl Route {
    /// Whether moving any hotspot flagged in `moved` changes this route.
    pub fn touches(&self, moved: &[bool]) -> bool {
        let flagged = |h: &HotspotId| moved.get(h.as_usize()).copied().unwrap_or(false);
        match self {
            Route::Sequential => moved.iter().any(|m| *m),
            Route::Pair { from, to } => flagged(from) || flagged(to),
        }
    }
}

/// Outcome of refreshing one connector.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Refresh {
    /// Fewer than two points: nothing to draw.
    Skipped,
    /// Buffers rewritten in place.
    Rewritten,
    /// Buffers replaced; the generation was bumped.
    Rebuilt,
}

#[derive(Debug, Clone)]
pub struct Connector {
    route: Route,
    style: ResolvedConnectorConfig,
    mesh: Option<TubeMesh>,
    generation: u32,
    points: Vec<Vec3>,
    anchors: Vec<Vec3>,
}

impl Connector {
    fn new(route: Route, style: ResolvedConnectorConfig) -> Self {
        Self {
            route,
            style,
            mesh: None,
            generation: 0,
            points: Vec::new(),
            anchors: Vec::new(),
        }
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn style(&self) -> &ResolvedConnectorConfig {
        &self.style
    }

    pub fn mesh(&self) -> Option<&TubeMesh> {
        self.mesh.as_ref()
    }

    /// Bumped every time the buffers are replaced.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Arc points sampled by the last refresh.
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    fn anchor(scene: &SceneState, id: HotspotId, height_offset: f64) -> Option<Vec3> {
        scene
            .hotspot_center(id)
            .map(|c| c + Vec3::new(0.0, height_offset, 0.0))
    }

    fn sample(&mut self, scene: &SceneState) {
        let style = self.style;
        self.points.clear();
        match self.route {
            Route::Sequential => {
                self.anchors.clear();
                for i in 0..scene.hotspots().len() {
                    if let Some(p) = Self::anchor(scene, HotspotId::from_usize(i), style.height_offset) {
                        self.anchors.push(p);
                    }
                }
                chain_arcs(&mut self.points, &self.anchors, style.segments, style.arc_height);
            }
            Route::Pair { from, to } => {
                let a = Self::anchor(scene, from, style.height_offset);
                let b = Self::anchor(scene, to, style.height_offset);
                if let (Some(a), Some(b)) = (a, b) {
                    push_arc(&mut self.points, a, b, style.segments, style.arc_height, false);
                }
            }
        }
    }

    /// Resamples the route and updates the tube buffers.
    pub fn refresh(&mut self, scene: &SceneState) -> Refresh {
        self.sample(scene);
        if self.points.len() < 2 {
            return Refresh::Skipped;
        }

        if let Some(mesh) = self.mesh.as_mut() {
            if mesh.rewrite(&self.points) {
                return Refresh::Rewritten;
            }
        }

        // Release the old buffers before installing the replacement.
        self.mesh = None;
        self.mesh = TubeMesh::build(&self.points, self.style.thickness, self.style.radial_segments);
        if self.mesh.is_none() {
            return Refresh::Skipped;
        }
        self.generation = self.generation.wrapping_add(1);
        debug!(
            route = ?self.route,
            points = self.points.len(),
            generation = self.generation,
            "connector rebuilt"
        );
        Refresh::Rebuilt
    }
}

/// Every connector of a scene, addressed by `ConnectorId`.
#[derive(Debug, Clone, Default)]
pub struct ConnectorSet {
    connectors: Vec<Connector>,
}

impl ConnectorSet {
    /// Resolves the configured routes against the scene's hotspots.
    ///
    /// Pairs naming an unknown hotspot are dropped with a warning. Buffers are
    /// not built until the first refresh.
    pub fn build(config: &SceneConfig, scene: &SceneState) -> Self {
        let mut connectors = Vec::new();

        if config.connector.enabled && scene.hotspots().len() >= 2 {
            connectors.push(Connector::new(
                Route::Sequential,
                ResolvedConnectorConfig::from_global(&config.connector),
            ));
        }

        for pair in &config.pairs {
            let from = scene.find_hotspot(&pair.from_id);
            let to = scene.find_hotspot(&pair.to_id);
            let (Some(from), Some(to)) = (from, to) else {
                warn!(from = %pair.from_id, to = %pair.to_id, "connector pair names an unknown hotspot, skipping");
                continue;
            };
            connectors.push(Connector::new(
                Route::Pair { from, to },
                ResolvedConnectorConfig::merge(&config.connector, &pair.overrides),
            ));
        }

        Self { connectors }
    }

    pub fn len(&self) -> usize {
        self.connectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }

    pub fn get(&self, id: ConnectorId) -> Option<&Connector> {
        self.connectors.get(id.as_usize())
    }

    pub fn iter(&self) -> impl Iterator<Item = (ConnectorId, &Connector)> + '_ {
        self.connectors
            .iter()
            .enumerate()
            .map(|(i, c)| (ConnectorId::from_usize(i), c))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ConnectorId, &mut Connector)> + '_ {
        self.connectors
            .iter_mut()
            .enumerate()
            .map(|(i, c)| (ConnectorId::from_usize(i), c))
    }
}
