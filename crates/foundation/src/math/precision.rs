//! Precision policies.
//!
//! All CPU-side simulation runs in `f64`. Values cross into `f32` only when
//! they are written into render buffers.

use core::cmp::Ordering;

use super::Vec3;

/// CPU-authoritative precision type.
pub type HighPrecision = f64;

/// GPU-friendly position in `f32`.
pub type GpuVec3 = [f32; 3];

/// Narrow a world-space point for upload.
#[inline]
pub fn to_gpu_f32(v: Vec3) -> GpuVec3 {
    [v.x as f32, v.y as f32, v.z as f32]
}

/// Canonicalize a floating-point value for deterministic ordering.
///
/// Rules:
/// - `-0.0` becomes `0.0`
/// - all NaNs become a single canonical NaN
pub fn canonical_f64(v: f64) -> f64 {
    if v == 0.0 {
        // Handles +0.0 and -0.0.
        0.0
    } else if v.is_nan() {
        f64::NAN
    } else {
        v
    }
}

/// Deterministic total ordering for floats.
///
/// Prefer this any time you sort floats or pick a minimum among candidates.
pub fn stable_total_cmp_f64(a: f64, b: f64) -> Ordering {
    canonical_f64(a).total_cmp(&canonical_f64(b))
}

#[cfg(test)]
mod tests {
    use super::{canonical_f64, stable_total_cmp_f64, to_gpu_f32};
    use crate::math::Vec3;
    use core::cmp::Ordering;

    #[test]
    fn canonicalizes_negative_zero() {
        assert_eq!(canonical_f64(-0.0), 0.0);
        assert_eq!(stable_total_cmp_f64(-0.0, 0.0), Ordering::Equal);
    }

    #[test]
    fn stable_cmp_is_total() {
        assert_eq!(stable_total_cmp_f64(1.0, 2.0), Ordering::Less);
        assert_eq!(stable_total_cmp_f64(f64::NAN, f64::NAN), Ordering::Equal);
    }

    #[test]
    fn narrows_to_f32() {
        assert_eq!(to_gpu_f32(Vec3::new(1.5, -0.25, 3.0)), [1.5, -0.25, 3.0]);
    }
}
