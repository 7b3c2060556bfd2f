use foundation::math::Vec3;
use foundation::{ConnectorId, DotId, HotspotId};

use crate::state::HotspotKind;
use crate::tube::TubeMesh;

/// Receiver of per-frame geometry changes.
///
/// The frame driver reports only what moved; implementations mirror those
/// changes into whatever the renderer consumes (instance buffers, a scene
/// graph, a recording for tests).
pub trait RenderSink {
    fn dot_moved(&mut self, dot: DotId, center: Vec3);

    fn hotspot_moved(&mut self, hotspot: HotspotId, kind: HotspotKind, instance: u32, center: Vec3);

    /// `rebuilt` is set when the buffers were replaced rather than rewritten;
    /// any GPU copy of the previous buffers must be released.
    fn connector_updated(&mut self, connector: ConnectorId, mesh: &TubeMesh, generation: u32, rebuilt: bool);

    fn request_redraw(&mut self);
}

/// Sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl RenderSink for NullSink {
    fn dot_moved(&mut self, _dot: DotId, _center: Vec3) {}

    fn hotspot_moved(&mut self, _hotspot: HotspotId, _kind: HotspotKind, _instance: u32, _center: Vec3) {}

    fn connector_updated(&mut self, _connector: ConnectorId, _mesh: &TubeMesh, _generation: u32, _rebuilt: bool) {}

    fn request_redraw(&mut self) {}
}
