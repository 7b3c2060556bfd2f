//! CPU mirrors of the GPU-resident instance and connector buffers.
//!
//! The frame driver reports moves through `RenderSink`; `InstanceBuffers`
//! writes them into flat `f32` arrays laid out the way the shaders read them
//! and tracks what needs uploading. The host drains the dirty state once per
//! rendered frame.

use foundation::math::{Vec3, to_gpu_f32};
use foundation::{ConnectorId, DotId, HotspotId};
use scene::render::RenderSink;
use scene::tube::TubeMesh;
use scene::HotspotKind;

const KINDS: usize = HotspotKind::ALL.len();

/// Inclusive range of instance indices written since the last upload.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DirtyRange {
    pub first: u32,
    pub last: u32,
}

impl DirtyRange {
    fn include(range: &mut Option<DirtyRange>, index: u32) {
        *range = Some(match *range {
            None => DirtyRange {
                first: index,
                last: index,
            },
            Some(r) => DirtyRange {
                first: r.first.min(index),
                last: r.last.max(index),
            },
        });
    }

    pub fn len(&self) -> u32 {
        self.last - self.first + 1
    }
}

/// Translation buffer of one instanced mesh (xyz per instance).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstanceBuffer {
    translations: Vec<f32>,
    dirty: Option<DirtyRange>,
}

impl InstanceBuffer {
    pub fn with_capacity(instances: usize) -> Self {
        Self {
            translations: vec![0.0; instances * 3],
            dirty: None,
        }
    }

    pub fn len(&self) -> usize {
        self.translations.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.translations.is_empty()
    }

    pub fn translations(&self) -> &[f32] {
        &self.translations
    }

    pub fn translation(&self, index: u32) -> Option<[f32; 3]> {
        let i = index as usize * 3;
        let t = self.translations.get(i..i + 3)?;
        Some([t[0], t[1], t[2]])
    }

    pub fn dirty(&self) -> Option<DirtyRange> {
        self.dirty
    }

    pub fn take_dirty(&mut self) -> Option<DirtyRange> {
        self.dirty.take()
    }

    fn write(&mut self, index: u32, value: Vec3) {
        let i = index as usize * 3;
        if self.translations.len() < i + 3 {
            self.translations.resize(i + 3, 0.0);
        }
        self.translations[i..i + 3].copy_from_slice(&to_gpu_f32(value));
        DirtyRange::include(&mut self.dirty, index);
    }
}

/// Tube geometry mirrored for one connector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectorBuffers {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub uvs: Vec<f32>,
    pub indices: Vec<u32>,
    /// Generation of the buffers currently held.
    pub generation: u32,
    /// Positions and normals changed since the last upload.
    pub vertices_dirty: bool,
    /// The whole buffer set was replaced since the last upload.
    pub replaced: bool,
}

/// Buffer set whose GPU copy must be disposed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Release {
    pub connector: ConnectorId,
    pub generation: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstanceBuffers {
    dots: InstanceBuffer,
    hotspots: [InstanceBuffer; KINDS],
    connectors: Vec<Option<ConnectorBuffers>>,
    releases: Vec<Release>,
    redraw: bool,
}

impl InstanceBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Presizes for a scene with `dot_count` dots and `hotspot_counts`
    /// markers per kind (`HotspotKind::ALL` order).
    pub fn with_counts(dot_count: usize, hotspot_counts: [u32; KINDS]) -> Self {
        Self {
            dots: InstanceBuffer::with_capacity(dot_count),
            hotspots: hotspot_counts.map(|n| InstanceBuffer::with_capacity(n as usize)),
            ..Self::default()
        }
    }

    pub fn dots(&self) -> &InstanceBuffer {
        &self.dots
    }

    pub fn dots_mut(&mut self) -> &mut InstanceBuffer {
        &mut self.dots
    }

    pub fn hotspots(&self, kind: HotspotKind) -> &InstanceBuffer {
        &self.hotspots[kind as usize]
    }

    pub fn hotspots_mut(&mut self, kind: HotspotKind) -> &mut InstanceBuffer {
        &mut self.hotspots[kind as usize]
    }

    pub fn connector_count(&self) -> usize {
        self.connectors.len()
    }

    pub fn connector(&self, id: ConnectorId) -> Option<&ConnectorBuffers> {
        self.connectors.get(id.as_usize()).and_then(Option::as_ref)
    }

    pub fn connector_mut(&mut self, id: ConnectorId) -> Option<&mut ConnectorBuffers> {
        self.connectors.get_mut(id.as_usize()).and_then(Option::as_mut)
    }

    /// GPU copies superseded since the last call.
    pub fn take_releases(&mut self) -> Vec<Release> {
        std::mem::take(&mut self.releases)
    }

    /// Whether a redraw was requested since the last call.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw)
    }
}

impl RenderSink for InstanceBuffers {
    fn dot_moved(&mut self, dot: DotId, center: Vec3) {
        self.dots.write(dot.index(), center);
    }

    fn hotspot_moved(&mut self, _hotspot: HotspotId, kind: HotspotKind, instance: u32, center: Vec3) {
        self.hotspots[kind as usize].write(instance, center);
    }

    fn connector_updated(&mut self, connector: ConnectorId, mesh: &TubeMesh, generation: u32, rebuilt: bool) {
        let slot = connector.as_usize();
        if self.connectors.len() <= slot {
            self.connectors.resize(slot + 1, None);
        }

        match &mut self.connectors[slot] {
            Some(buffers) if !rebuilt && buffers.positions.len() == mesh.positions().len() => {
                buffers.positions.copy_from_slice(mesh.positions());
                buffers.normals.copy_from_slice(mesh.normals());
                buffers.vertices_dirty = true;
            }
            entry => {
                if let Some(old) = entry.take() {
                    self.releases.push(Release {
                        connector,
                        generation: old.generation,
                    });
                }
                *entry = Some(ConnectorBuffers {
                    positions: mesh.positions().to_vec(),
                    normals: mesh.normals().to_vec(),
                    uvs: mesh.uvs().to_vec(),
                    indices: mesh.indices().to_vec(),
                    generation,
                    vertices_dirty: true,
                    replaced: true,
                });
            }
        }
    }

    fn request_redraw(&mut self) {
        self.redraw = true;
    }
}
