use foundation::{ConnectorId, HotspotId};

use crate::connectors::{ConnectorSet, Refresh};
use crate::dot_set::DotSet;
use crate::render::RenderSink;
use crate::state::SceneState;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct SyncReport {
    pub hotspots_moved: usize,
    pub rewritten: usize,
    pub rebuilt: usize,
}

impl SyncReport {
    pub fn is_empty(&self) -> bool {
        self.hotspots_moved == 0 && self.rewritten == 0 && self.rebuilt == 0
    }
}

/// Keeps hotspot markers and connector tubes attached to their lifted dots.
#[derive(Debug, Clone, Default)]
pub struct GeometrySync {
    moved: Vec<bool>,
    rebuilds: Vec<(ConnectorId, usize)>,
}

impl GeometrySync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connectors whose buffers were replaced by the last run, with their
    /// new vertex counts.
    pub fn rebuilds(&self) -> &[(ConnectorId, usize)] {
        &self.rebuilds
    }

    /// Repositions every hotspot whose dot is in `changed`, then refreshes
    /// the connectors that route through a moved hotspot.
    pub fn run<S: RenderSink>(
        &mut self,
        scene: &SceneState,
        changed: &DotSet,
        connectors: &mut ConnectorSet,
        sink: &mut S,
    ) -> SyncReport {
        let mut report = SyncReport::default();
        self.moved.clear();
        self.rebuilds.clear();
        self.moved.resize(scene.hotspots().len(), false);

        for (i, hotspot) in scene.hotspots().iter().enumerate() {
            if !changed.contains(hotspot.dot) {
                continue;
            }
            let id = HotspotId::from_usize(i);
            let Some(center) = scene.hotspot_center(id) else {
                continue;
            };
            self.moved[i] = true;
            report.hotspots_moved += 1;
            sink.hotspot_moved(id, hotspot.kind, hotspot.instance, center);
        }

        if report.hotspots_moved == 0 {
            return report;
        }

        for (id, connector) in connectors.iter_mut() {
            if !connector.route().touches(&self.moved) {
                continue;
            }
            let outcome = connector.refresh(scene);
            let Some(mesh) = connector.mesh() else {
                continue;
            };
            match outcome {
                Refresh::Skipped => {}
                Refresh::Rewritten => {
                    report.rewritten += 1;
                    sink.connector_updated(id, mesh, connector.generation(), false);
                }
                Refresh::Rebuilt => {
                    report.rebuilt += 1;
                    self.rebuilds.push((id, mesh.vertex_count()));
                    sink.connector_updated(id, mesh, connector.generation(), true);
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::GeometrySync;
    use crate::config::SceneConfig;
    use crate::connectors::ConnectorSet;
    use crate::dot_set::DotSet;
    use crate::render::RenderSink;
    use crate::state::{HotspotKind, HotspotRecord, SceneState};
    use crate::tube::TubeMesh;
    use foundation::math::{Vec2, Vec3};
    use foundation::{ConnectorId, DotId, HotspotId};
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Recorder {
        hotspots: Vec<HotspotId>,
        connectors: Vec<(ConnectorId, bool)>,
    }

    impl RenderSink for Recorder {
        fn dot_moved(&mut self, _dot: DotId, _center: Vec3) {}

        fn hotspot_moved(&mut self, hotspot: HotspotId, _kind: HotspotKind, _instance: u32, _center: Vec3) {
            self.hotspots.push(hotspot);
        }

        fn connector_updated(&mut self, connector: ConnectorId, _mesh: &TubeMesh, _generation: u32, rebuilt: bool) {
            self.connectors.push((connector, rebuilt));
        }

        fn request_redraw(&mut self) {}
    }

    fn record(id: &str, lon: f64) -> HotspotRecord {
        HotspotRecord {
            id: id.to_string(),
            label: id.to_string(),
            message: String::new(),
            lat: 0.0,
            lon,
            kind: HotspotKind::Regional,
        }
    }

    /// Hotspots a, b, c on dots 0, 2, 4; sequential connector plus a -> b.
    fn fixture() -> (SceneState, ConnectorSet) {
        let mut config = SceneConfig::default();
        config.pairs = vec![crate::config::ConnectorPair::new("a", "b")];
        let scene = SceneState::build(
            &config,
            (0..6).map(|x| Vec2::new(f64::from(x), 0.0)),
            [record("a", 0.0), record("b", 36.0), record("c", 72.0)],
        );
        let mut connectors = ConnectorSet::build(&config, &scene);
        for (_, c) in connectors.iter_mut() {
            c.refresh(&scene);
        }
        (scene, connectors)
    }

    #[test]
    fn nothing_changed_does_nothing() {
        let (scene, mut connectors) = fixture();
        let mut sink = Recorder::default();
        let report = GeometrySync::new().run(&scene, &DotSet::new(), &mut connectors, &mut sink);
        assert!(report.is_empty());
        assert!(sink.connectors.is_empty());
    }

    #[test]
    fn only_connectors_through_moved_hotspots_are_rewritten() {
        let (mut scene, mut connectors) = fixture();
        scene.dots_mut()[4].lift = 0.2;
        let mut changed = DotSet::new();
        changed.insert(DotId::new(4));
        changed.insert(DotId::new(5));

        let mut sink = Recorder::default();
        let report = GeometrySync::new().run(&scene, &changed, &mut connectors, &mut sink);

        assert_eq!(sink.hotspots, vec![HotspotId::new(2)]);
        // Only the sequential connector threads hotspot c.
        assert_eq!(sink.connectors, vec![(ConnectorId::new(0), false)]);
        assert_eq!(report.hotspots_moved, 1);
        assert_eq!(report.rewritten, 1);
        assert_eq!(report.rebuilt, 0);
    }

    #[test]
    fn pair_endpoint_move_rewrites_both_connectors() {
        let (mut scene, mut connectors) = fixture();
        scene.dots_mut()[0].lift = 0.2;
        let mut changed = DotSet::new();
        changed.insert(DotId::new(0));

        let mut sink = Recorder::default();
        GeometrySync::new().run(&scene, &changed, &mut connectors, &mut sink);
        assert_eq!(
            sink.connectors,
            vec![(ConnectorId::new(0), false), (ConnectorId::new(1), false)]
        );
    }
}
