//! Tube extrusion of connector curves.
//!
//! A tube is a ring of `radial + 1` vertices at each of `tubular + 1` stations
//! along the curve, oriented by parallel-transported Frenet frames. The vertex
//! layout depends only on the segment counts, so a tube over a moved curve with
//! the same point count is rewritten in place.

use std::f64::consts::TAU;

use foundation::math::{Vec3, to_gpu_f32};

use crate::curve::CatmullRom;

/// Smallest tube radius ever extruded.
pub const MIN_RADIUS: f64 = 0.001;
/// Smallest ring resolution ever extruded.
pub const MIN_RADIAL_SEGMENTS: u32 = 3;

/// Shape parameters of one tube.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TubeShape {
    pub radius: f64,
    pub radial_segments: u32,
    pub tubular_segments: u32,
}

impl TubeShape {
    /// Clamps style values and derives the tubular resolution from the
    /// number of curve points.
    pub fn for_points(point_count: usize, thickness: f64, radial_segments: u32) -> Self {
        let tubular = u32::try_from(point_count.saturating_mul(2)).unwrap_or(u32::MAX);
        Self {
            radius: thickness.max(MIN_RADIUS),
            radial_segments: radial_segments.max(MIN_RADIAL_SEGMENTS),
            tubular_segments: tubular.max(2),
        }
    }

    pub fn vertex_count(&self) -> usize {
        (self.tubular_segments as usize + 1) * (self.radial_segments as usize + 1)
    }

    pub fn index_count(&self) -> usize {
        self.tubular_segments as usize * self.radial_segments as usize * 6
    }
}

/// Rotates `v` about unit `axis` by `angle` (Rodrigues).
fn rotate_about(v: Vec3, axis: Vec3, angle: f64) -> Vec3 {
    let (sin, cos) = angle.sin_cos();
    v * cos + axis.cross(v) * sin + axis * (axis.dot(v) * (1.0 - cos))
}

/// Tangents, normals and binormals at `segments + 1` arc-length stations.
struct Frames {
    tangents: Vec<Vec3>,
    normals: Vec<Vec3>,
    binormals: Vec<Vec3>,
}

impl Frames {
    fn compute(curve: &CatmullRom<'_>, segments: u32) -> Self {
        let n = segments as usize + 1;
        let tangents: Vec<Vec3> = (0..n)
            .map(|i| curve.tangent_at(i as f64 / f64::from(segments)))
            .collect();

        let mut normals = Vec::with_capacity(n);
        let mut binormals = Vec::with_capacity(n);

        // Initial normal: the axis least aligned with the first tangent.
        let t0 = tangents[0];
        let (ax, ay, az) = (t0.x.abs(), t0.y.abs(), t0.z.abs());
        let mut min = f64::MAX;
        let mut seed = Vec3::Z;
        if ax <= min {
            min = ax;
            seed = Vec3::X;
        }
        if ay <= min {
            min = ay;
            seed = Vec3::Y;
        }
        if az <= min {
            seed = Vec3::Z;
        }
        let side = t0.cross(seed).normalize_or_zero();
        normals.push(t0.cross(side));
        binormals.push(t0.cross(normals[0]));

        for i in 1..n {
            let mut normal = normals[i - 1];
            let axis = tangents[i - 1].cross(tangents[i]);
            if axis.length() > f64::EPSILON {
                let axis = axis.normalize_or_zero();
                let theta = tangents[i - 1].dot(tangents[i]).clamp(-1.0, 1.0).acos();
                normal = rotate_about(normal, axis, theta);
            }
            normals.push(normal);
            binormals.push(tangents[i].cross(normal));
        }

        Self {
            tangents,
            normals,
            binormals,
        }
    }
}

/// CPU-side tube geometry ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct TubeMesh {
    shape: TubeShape,
    point_count: usize,
    positions: Vec<f32>,
    normals: Vec<f32>,
    uvs: Vec<f32>,
    indices: Vec<u32>,
}

impl TubeMesh {
    /// Extrudes a tube along the spline through `points`.
    ///
    /// `None` for fewer than two points.
    pub fn build(points: &[Vec3], thickness: f64, radial_segments: u32) -> Option<Self> {
        let curve = CatmullRom::new(points)?;
        let shape = TubeShape::for_points(points.len(), thickness, radial_segments);
        let vertex_count = shape.vertex_count();

        let mut mesh = Self {
            shape,
            point_count: points.len(),
            positions: vec![0.0; vertex_count * 3],
            normals: vec![0.0; vertex_count * 3],
            uvs: Vec::with_capacity(vertex_count * 2),
            indices: Vec::with_capacity(shape.index_count()),
        };
        mesh.fill_vertices(&curve);
        mesh.fill_uvs_and_indices();
        Some(mesh)
    }

    /// Rewrites positions and normals for a moved curve.
    ///
    /// Returns `false` without touching the buffers when the point count
    /// differs from the one this mesh was built for; the caller must rebuild.
    pub fn rewrite(&mut self, points: &[Vec3]) -> bool {
        if points.len() != self.point_count {
            return false;
        }
        let Some(curve) = CatmullRom::new(points) else {
            return false;
        };
        self.fill_vertices(&curve);
        true
    }

    pub fn shape(&self) -> TubeShape {
        self.shape
    }

    pub fn point_count(&self) -> usize {
        self.point_count
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn normals(&self) -> &[f32] {
        &self.normals
    }

    pub fn uvs(&self) -> &[f32] {
        &self.uvs
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    fn fill_vertices(&mut self, curve: &CatmullRom<'_>) {
        let tubular = self.shape.tubular_segments;
        let radial = self.shape.radial_segments;
        let radius = self.shape.radius;
        let frames = Frames::compute(curve, tubular);
        debug_assert_eq!(frames.tangents.len(), tubular as usize + 1);

        let mut v = 0;
        for i in 0..=tubular as usize {
            let p = curve.point_at(i as f64 / f64::from(tubular));
            let n = frames.normals[i];
            let b = frames.binormals[i];
            for j in 0..=radial {
                let angle = f64::from(j) / f64::from(radial) * TAU;
                let sin = angle.sin();
                let cos = -angle.cos();
                let normal = (n * cos + b * sin).normalize_or_zero();
                let vertex = p + normal * radius;

                self.normals[v..v + 3].copy_from_slice(&to_gpu_f32(normal));
                self.positions[v..v + 3].copy_from_slice(&to_gpu_f32(vertex));
                v += 3;
            }
        }
    }

    fn fill_uvs_and_indices(&mut self) {
        let tubular = self.shape.tubular_segments;
        let radial = self.shape.radial_segments;

        self.uvs.clear();
        for i in 0..=tubular {
            for j in 0..=radial {
                self.uvs.push(i as f32 / tubular as f32);
                self.uvs.push(j as f32 / radial as f32);
            }
        }

        self.indices.clear();
        let ring = radial + 1;
        for j in 1..=tubular {
            for i in 1..=radial {
                let a = ring * (j - 1) + (i - 1);
                let b = ring * j + (i - 1);
                let c = ring * j + i;
                let d = ring * (j - 1) + i;
                self.indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }
    }
}
