//! Per-frame orchestration.
//!
//! One `step` per displayed frame, in a fixed order:
//! 1. advance the camera rig,
//! 2. resolve the hovered dot from this frame's cursor ray,
//! 3. run the lift field,
//! 4. while the field is active, sync hotspot markers and connectors,
//! 5. request a redraw if anything moved.
//!
//! Until a scene is installed every step is a no-op apart from the camera.

use foundation::{DotId, HotspotId};
use foundation::math::Vec3;
use runtime::{Event, EventBus, EventKind, Frame, FrameClock, Metrics, Phase, names};
use tracing::{debug, info};

use crate::camera::{CameraRig, Ndc};
use crate::config::{ConfigError, SceneConfig};
use crate::connectors::{ConnectorSet, Refresh};
use crate::hover::HoverResolver;
use crate::lift::{LiftField, LiftReport};
use crate::picking::{pick_dot, pick_hotspot};
use crate::render::RenderSink;
use crate::state::SceneState;
use crate::sync::{GeometrySync, SyncReport};
use crate::tooltip::{PointerKind, TooltipAction, TooltipController};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameReport {
    pub frame: Frame,
    pub phase: Phase,
    pub hovered: Option<DotId>,
    pub camera_moved: bool,
    pub lift: LiftReport,
    pub sync: SyncReport,
    pub redraw: bool,
}

#[derive(Debug)]
pub struct FrameDriver {
    config: SceneConfig,
    clock: FrameClock,
    phase: Phase,
    hover: HoverResolver,
    lift: LiftField,
    sync: GeometrySync,
    connectors: ConnectorSet,
    tooltip: TooltipController,
    bus: EventBus,
    metrics: Metrics,
}

impl FrameDriver {
    /// Validates `config` and creates a driver with no scene installed.
    pub fn new(config: SceneConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            hover: HoverResolver::new(config.interaction.hover_cooldown_frames),
            lift: LiftField::new(&config, 0),
            config,
            clock: FrameClock::new(),
            phase: Phase::Unloaded,
            sync: GeometrySync::new(),
            connectors: ConnectorSet::default(),
            tooltip: TooltipController::new(),
            bus: EventBus::new(),
            metrics: Metrics::new(),
        })
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn hovered(&self) -> Option<DotId> {
        self.hover.hovered()
    }

    pub fn connectors(&self) -> &ConnectorSet {
        &self.connectors
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn events(&self) -> &[Event] {
        self.bus.events()
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        self.bus.drain()
    }

    /// Attaches a freshly built scene and pushes its full initial state to
    /// `sink`: every dot, every hotspot marker and every connector tube.
    pub fn install<S: RenderSink>(&mut self, scene: &SceneState, sink: &mut S) {
        let at = self.clock.frames_started();

        for id in scene.skipped_hotspots() {
            self.bus
                .emit_at(at, EventKind::HotspotSkipped { id: id.clone() });
        }

        self.hover.reset();
        self.lift = LiftField::new(&self.config, scene.dots().len());
        if self.tooltip.hide() == TooltipAction::Hide {
            self.bus.emit_at(at, EventKind::TooltipHidden);
        }

        let layout = *scene.layout();
        for (i, dot) in scene.dots().iter().enumerate() {
            sink.dot_moved(DotId::from_usize(i), layout.dot_center(dot));
        }
        for (i, hotspot) in scene.hotspots().iter().enumerate() {
            let id = HotspotId::from_usize(i);
            let center = scene.hotspot_center(id).unwrap_or(Vec3::ZERO);
            sink.hotspot_moved(id, hotspot.kind, hotspot.instance, center);
        }

        self.connectors = ConnectorSet::build(&self.config, scene);
        for (id, connector) in self.connectors.iter_mut() {
            if connector.refresh(scene) != Refresh::Rebuilt {
                continue;
            }
            if let Some(mesh) = connector.mesh() {
                sink.connector_updated(id, mesh, connector.generation(), true);
                self.bus.emit_at(
                    at,
                    EventKind::ConnectorRebuilt {
                        connector: id,
                        vertex_count: mesh.vertex_count(),
                    },
                );
            }
        }
        sink.request_redraw();

        info!(
            dots = scene.dots().len(),
            hotspots = scene.hotspots().len(),
            connectors = self.connectors.len(),
            "scene installed"
        );
        self.set_phase(at, Phase::Idle);
    }

    /// Detaches the scene. Subsequent steps only drive the camera.
    pub fn unload(&mut self) {
        let at = self.clock.frames_started();
        self.hover.reset();
        self.lift.reset();
        self.connectors = ConnectorSet::default();
        if self.tooltip.hide() == TooltipAction::Hide {
            self.bus.emit_at(at, EventKind::TooltipHidden);
        }
        self.set_phase(at, Phase::Unloaded);
    }

    /// Runs one frame. `cursor` is `None` until the pointer has entered the
    /// viewport.
    pub fn step<C, S>(
        &mut self,
        scene: Option<&mut SceneState>,
        camera: &mut C,
        cursor: Option<Ndc>,
        sink: &mut S,
    ) -> FrameReport
    where
        C: CameraRig + ?Sized,
        S: RenderSink,
    {
        let frame = self.clock.tick();
        let camera_moved = camera.update();

        let mut report = FrameReport {
            frame,
            phase: self.phase,
            hovered: None,
            camera_moved,
            lift: LiftReport::default(),
            sync: SyncReport::default(),
            redraw: camera_moved,
        };

        let Some(scene) = scene.filter(|_| self.phase.is_loaded()) else {
            if camera_moved {
                sink.request_redraw();
            }
            return report;
        };
        self.metrics.inc_counter(names::FRAMES, 1);

        // Hover.
        let hit = match cursor {
            Some(ndc) => pick_dot(scene, camera.ray_from_ndc(ndc)).map(|h| h.id),
            None => None,
        };
        let hover = self.hover.resolve(hit);
        if hover.changed() {
            debug!(from = ?hover.previous, to = ?hover.hovered, "hover changed");
            self.bus.emit(
                frame,
                EventKind::HoverChanged {
                    from: hover.previous,
                    to: hover.hovered,
                },
            );
        }
        report.hovered = hover.hovered;

        // Lift.
        if let Some(id) = hover.hovered {
            self.lift.apply_hover(scene.dots_mut(), id);
        }
        let lift = self.lift.integrate(scene.dots_mut(), hover.hovered.is_some());
        if lift.ran {
            self.metrics.inc_counter(names::LIFT_PASSES, 1);
            self.metrics
                .record_histogram(names::LIFT_DOTS_WRITTEN, lift.written as u64);
            let layout = *scene.layout();
            for id in self.lift.changed().iter() {
                if let Some(dot) = scene.dot(id) {
                    sink.dot_moved(id, layout.dot_center(dot));
                }
            }
        } else {
            self.metrics.inc_counter(names::LIFT_SKIPPED, 1);
        }
        self.metrics
            .set_gauge(names::ACTIVE_DOTS, lift.written as i64);
        report.lift = lift;

        // Dependent geometry.
        if self.lift.is_active() {
            let sync = self
                .sync
                .run(scene, self.lift.changed(), &mut self.connectors, sink);
            self.metrics
                .inc_counter(names::SYNC_HOTSPOTS_MOVED, sync.hotspots_moved as u64);
            self.metrics
                .inc_counter(names::SYNC_REWRITES, sync.rewritten as u64);
            self.metrics
                .inc_counter(names::SYNC_REBUILDS, sync.rebuilt as u64);
            for &(connector, vertex_count) in self.sync.rebuilds() {
                self.bus.emit(
                    frame,
                    EventKind::ConnectorRebuilt {
                        connector,
                        vertex_count,
                    },
                );
            }
            report.sync = sync;
        }

        report.redraw = camera_moved || lift.dirty || !report.sync.is_empty();
        if report.redraw {
            self.metrics.inc_counter(names::REDRAWS, 1);
            sink.request_redraw();
        }

        self.set_phase(
            frame.index,
            Phase::loaded(hover.hovered.is_some(), self.lift.is_active()),
        );
        report.phase = self.phase;
        report
    }

    /// Routes a pointer event at `ndc` (viewport pixel position `x_px, y_px`)
    /// to the tooltip.
    pub fn pointer<C>(
        &mut self,
        scene: &SceneState,
        camera: &C,
        kind: PointerKind,
        ndc: Ndc,
        x_px: f64,
        y_px: f64,
    ) -> TooltipAction
    where
        C: CameraRig + ?Sized,
    {
        if !self.phase.is_loaded() {
            return TooltipAction::Unchanged;
        }
        let hit = pick_hotspot(scene, camera.ray_from_ndc(ndc)).map(|h| h.id);
        let action = self.tooltip.on_pointer(kind, hit, x_px, y_px);
        let at = self.clock.frames_started();
        match action {
            TooltipAction::Show { hotspot, x_px, y_px } => {
                self.bus
                    .emit_at(at, EventKind::TooltipShown { hotspot, x_px, y_px });
            }
            TooltipAction::Hide => self.bus.emit_at(at, EventKind::TooltipHidden),
            TooltipAction::Unchanged => {}
        }
        action
    }

    /// The pointer left the viewport.
    pub fn pointer_left(&mut self) -> TooltipAction {
        let action = self.tooltip.hide();
        if action == TooltipAction::Hide {
            self.bus
                .emit_at(self.clock.frames_started(), EventKind::TooltipHidden);
        }
        action
    }

    fn set_phase(&mut self, at: u64, next: Phase) {
        if next == self.phase {
            return;
        }
        debug!(from = self.phase.as_str(), to = next.as_str(), "phase changed");
        self.bus.emit_at(
            at,
            EventKind::PhaseChanged {
                from: self.phase,
                to: next,
            },
        );
        self.phase = next;
    }
}
