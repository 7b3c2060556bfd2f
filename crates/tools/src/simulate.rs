//! `dotmap simulate`: drives the frame loop headlessly with the cursor parked
//! on one hotspot, then released, and reports how the lift field behaved.

use std::collections::BTreeMap;

use foundation::DotId;
use foundation::math::Vec3;
use gpu::InstanceBuffers;
use runtime::{Phase, names};
use scene::picking::pick_dot;
use scene::{FrameDriver, Ndc, OrbitRig, SceneConfig, SceneState};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Viewport the simulated camera renders into.
const VIEWPORT: (f64, f64) = (1280.0, 720.0);

#[derive(Debug, Error)]
pub enum SimulateError {
    #[error(transparent)]
    Config(#[from] scene::ConfigError),
    #[error("no hotspot with id {0:?}")]
    UnknownHotspot(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulateOptions {
    pub hotspot: String,
    /// Frames with the cursor on the hotspot's dot.
    pub hover_frames: u32,
    /// Upper bound on frames spent waiting for the field to settle.
    pub max_settle_frames: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SimulationReport {
    pub hotspot: String,
    pub dot: u32,
    pub hover_frames: u32,
    /// Whether the driver reported the target dot as hovered.
    pub hovered: bool,
    pub peak_lift: f64,
    /// Frames after release until the phase returned to idle.
    pub settle_frames: Option<u32>,
    pub final_phase: &'static str,
    pub redraws: u64,
    pub lift_passes: u64,
    pub mean_dots_written: f64,
    pub connector_rewrites: u64,
    pub connector_rebuilds: u64,
    pub events: BTreeMap<&'static str, usize>,
}

/// Cursor position whose ray picks `dot` before any other dot.
///
/// The ray through the top of the dot's hover proxy descends onto it from
/// above every neighbouring proxy, so nothing in front can intercept it.
pub fn park_cursor(scene: &SceneState, rig: &OrbitRig, dot: DotId) -> Option<Ndc> {
    let center = scene.dot_center(dot)?;
    let top = center + Vec3::new(0.0, scene.layout().proxy_height * 0.5, 0.0);
    let ndc = rig.camera.project(top);
    let hit = pick_dot(scene, rig.camera.ray_from_ndc(ndc))?;
    (hit.id == dot).then_some(ndc)
}

pub fn simulate(
    mut scene: SceneState,
    config: &SceneConfig,
    options: &SimulateOptions,
) -> Result<SimulationReport, SimulateError> {
    let hotspot_id = scene
        .find_hotspot(&options.hotspot)
        .ok_or_else(|| SimulateError::UnknownHotspot(options.hotspot.clone()))?;
    let dot = scene
        .hotspot(hotspot_id)
        .map(|h| h.dot)
        .ok_or_else(|| SimulateError::UnknownHotspot(options.hotspot.clone()))?;

    let mut driver = FrameDriver::new(config.clone())?;
    let mut rig = OrbitRig::new(
        config.camera.clone(),
        config.controls.clone(),
        VIEWPORT.0 / VIEWPORT.1,
    );
    let mut buffers = InstanceBuffers::with_counts(scene.dots().len(), scene.instance_counts());
    driver.install(&scene, &mut buffers);

    if let Some(center) = scene.dot_center(dot) {
        rig.camera.recenter(center);
    }
    let cursor = park_cursor(&scene, &rig, dot);
    if cursor.is_none() {
        warn!(hotspot = %options.hotspot, "no cursor position picks the hotspot's dot");
    }

    let mut hovered = false;
    let mut peak_lift: f64 = 0.0;
    for _ in 0..options.hover_frames {
        let report = driver.step(Some(&mut scene), &mut rig, cursor, &mut buffers);
        hovered |= report.hovered == Some(dot);
        if let Some(d) = scene.dot(dot) {
            peak_lift = peak_lift.max(d.lift);
        }
    }
    debug!(peak_lift, hovered, "hover phase done");

    let mut settle_frames = None;
    for frame in 1..=options.max_settle_frames {
        let report = driver.step(Some(&mut scene), &mut rig, None, &mut buffers);
        if report.phase == Phase::Idle {
            settle_frames = Some(frame);
            break;
        }
    }

    let metrics = driver.metrics();
    let mut events = BTreeMap::new();
    for event in driver.events() {
        *events.entry(event.kind.name()).or_insert(0) += 1;
    }

    let report = SimulationReport {
        hotspot: options.hotspot.clone(),
        dot: dot.index(),
        hover_frames: options.hover_frames,
        hovered,
        peak_lift,
        settle_frames,
        final_phase: driver.phase().as_str(),
        redraws: metrics.counter(names::REDRAWS),
        lift_passes: metrics.counter(names::LIFT_PASSES),
        mean_dots_written: metrics
            .histogram(names::LIFT_DOTS_WRITTEN)
            .map_or(0.0, |h| h.mean()),
        connector_rewrites: metrics.counter(names::SYNC_REWRITES),
        connector_rebuilds: metrics.counter(names::SYNC_REBUILDS),
        events,
    };
    info!(
        hotspot = %report.hotspot,
        peak_lift = report.peak_lift,
        settle_frames = ?report.settle_frames,
        "simulation finished"
    );
    Ok(report)
}
