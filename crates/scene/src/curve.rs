//! Connector curve math.
//!
//! Arcs are sampled as straight chords lifted by `sin(pi * t) * arc_height`.
//! The sampled points are then smoothed by a centripetal Catmull-Rom spline
//! which is walked by arc length when the tube is extruded.

use std::f64::consts::PI;

use foundation::math::Vec3;

/// Appends the arc from `a` to `b` to `out`.
///
/// Emits `segments + 1` points, or `segments` when `skip_first` is set so a
/// chain of arcs shares each joint point once.
pub fn push_arc(out: &mut Vec<Vec3>, a: Vec3, b: Vec3, segments: u32, arc_height: f64, skip_first: bool) {
    let segments = segments.max(1);
    let start = if skip_first { 1 } else { 0 };
    for s in start..=segments {
        let t = f64::from(s) / f64::from(segments);
        let lift = (PI * t).sin() * arc_height;
        out.push(a.lerp(b, t) + Vec3::new(0.0, lift, 0.0));
    }
}

/// Fills `out` with one arc per consecutive pair of `anchors`.
///
/// Produces `(anchors.len() - 1) * segments + 1` points, or none for fewer
/// than two anchors.
pub fn chain_arcs(out: &mut Vec<Vec3>, anchors: &[Vec3], segments: u32, arc_height: f64) {
    out.clear();
    for (i, pair) in anchors.windows(2).enumerate() {
        push_arc(out, pair[0], pair[1], segments, arc_height, i > 0);
    }
}

const ARC_LENGTH_DIVISIONS: usize = 200;
const TANGENT_DELTA: f64 = 0.0001;
const KNOT_EPS: f64 = 1e-4;

/// Cubic `c0 + c1 t + c2 t^2 + c3 t^3` for one axis of one span.
#[derive(Debug, Copy, Clone, PartialEq)]
struct Cubic {
    c0: f64,
    c1: f64,
    c2: f64,
    c3: f64,
}

impl Cubic {
    fn hermite(x0: f64, x1: f64, t0: f64, t1: f64) -> Self {
        Self {
            c0: x0,
            c1: t0,
            c2: -3.0 * x0 + 3.0 * x1 - 2.0 * t0 - t1,
            c3: 2.0 * x0 - 2.0 * x1 + t0 + t1,
        }
    }

    /// Non-uniform Catmull-Rom through `x1..x2` with knot intervals `dt0..dt2`.
    fn non_uniform(x0: f64, x1: f64, x2: f64, x3: f64, dt0: f64, dt1: f64, dt2: f64) -> Self {
        let t1 = ((x1 - x0) / dt0 - (x2 - x0) / (dt0 + dt1) + (x2 - x1) / dt1) * dt1;
        let t2 = ((x2 - x1) / dt1 - (x3 - x1) / (dt1 + dt2) + (x3 - x2) / dt2) * dt1;
        Self::hermite(x1, x2, t1, t2)
    }

    fn eval(&self, t: f64) -> f64 {
        let t2 = t * t;
        self.c0 + self.c1 * t + self.c2 * t2 + self.c3 * t2 * t
    }
}

/// Open centripetal Catmull-Rom spline through a point list.
///
/// End spans use mirrored phantom points. Sampling by `point_at` is uniform in
/// arc length, approximated from a table of chord lengths.
#[derive(Debug, Clone)]
pub struct CatmullRom<'a> {
    points: &'a [Vec3],
    lengths: Vec<f64>,
}

impl<'a> CatmullRom<'a> {
    /// `None` for fewer than two points.
    pub fn new(points: &'a [Vec3]) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }
        let mut curve = Self {
            points,
            lengths: Vec::with_capacity(ARC_LENGTH_DIVISIONS + 1),
        };
        curve.build_lengths();
        Some(curve)
    }

    pub fn length(&self) -> f64 {
        self.lengths.last().copied().unwrap_or(0.0)
    }

    fn build_lengths(&mut self) {
        let mut sum = 0.0;
        let mut last = self.point(0.0);
        self.lengths.push(0.0);
        for d in 1..=ARC_LENGTH_DIVISIONS {
            let current = self.point(d as f64 / ARC_LENGTH_DIVISIONS as f64);
            sum += current.distance(last);
            self.lengths.push(sum);
            last = current;
        }
    }

    /// Point at curve parameter `t` in `[0, 1]`.
    pub fn point(&self, t: f64) -> Vec3 {
        let points = self.points;
        let l = points.len();
        let p = (l - 1) as f64 * t.clamp(0.0, 1.0);
        let mut int_point = p.floor() as usize;
        let mut weight = p - int_point as f64;

        if weight == 0.0 && int_point == l - 1 {
            int_point = l - 2;
            weight = 1.0;
        }

        let p1 = points[int_point];
        let p2 = points[int_point + 1];
        let p0 = if int_point > 0 {
            points[int_point - 1]
        } else {
            p1 * 2.0 - p2
        };
        let p3 = if int_point + 2 < l {
            points[int_point + 2]
        } else {
            points[l - 1] * 2.0 - points[l - 2]
        };

        let mut dt0 = p0.distance_squared(p1).powf(0.25);
        let mut dt1 = p1.distance_squared(p2).powf(0.25);
        let mut dt2 = p2.distance_squared(p3).powf(0.25);
        if dt1 < KNOT_EPS {
            dt1 = 1.0;
        }
        if dt0 < KNOT_EPS {
            dt0 = dt1;
        }
        if dt2 < KNOT_EPS {
            dt2 = dt1;
        }

        let px = Cubic::non_uniform(p0.x, p1.x, p2.x, p3.x, dt0, dt1, dt2);
        let py = Cubic::non_uniform(p0.y, p1.y, p2.y, p3.y, dt0, dt1, dt2);
        let pz = Cubic::non_uniform(p0.z, p1.z, p2.z, p3.z, dt0, dt1, dt2);
        Vec3::new(px.eval(weight), py.eval(weight), pz.eval(weight))
    }

    /// Maps arc-length fraction `u` to curve parameter `t`.
    pub fn u_to_t(&self, u: f64) -> f64 {
        let lengths = &self.lengths;
        let il = lengths.len();
        let total = self.length();
        if total <= 0.0 {
            return u.clamp(0.0, 1.0);
        }
        let target = u.clamp(0.0, 1.0) * total;

        // Last index whose cumulative length is <= target.
        let i = lengths.partition_point(|&len| len <= target).saturating_sub(1);
        if lengths[i] == target || i + 1 >= il {
            return i as f64 / (il - 1) as f64;
        }

        let before = lengths[i];
        let segment = lengths[i + 1] - before;
        let fraction = (target - before) / segment;
        (i as f64 + fraction) / (il - 1) as f64
    }

    pub fn point_at(&self, u: f64) -> Vec3 {
        self.point(self.u_to_t(u))
    }

    /// Unit tangent at curve parameter `t`, by central difference.
    pub fn tangent(&self, t: f64) -> Vec3 {
        let t1 = (t - TANGENT_DELTA).max(0.0);
        let t2 = (t + TANGENT_DELTA).min(1.0);
        (self.point(t2) - self.point(t1)).normalize_or_zero()
    }

    pub fn tangent_at(&self, u: f64) -> Vec3 {
        self.tangent(self.u_to_t(u))
    }
}

#[cfg(test)]
mod tests {
    use super::{CatmullRom, chain_arcs, push_arc};
    use foundation::math::Vec3;
    use pretty_assertions::assert_eq;

    fn assert_vec_close(a: Vec3, b: Vec3, eps: f64) {
        assert!(a.distance(b) <= eps, "expected {a:?} ~= {b:?}");
    }

    #[test]
    fn arc_peaks_at_midpoint() {
        let mut pts = Vec::new();
        push_arc(&mut pts, Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0), 4, 2.0, false);
        assert_eq!(pts.len(), 5);
        assert_vec_close(pts[0], Vec3::ZERO, 1e-12);
        assert_vec_close(pts[2], Vec3::new(2.0, 2.0, 0.0), 1e-12);
        assert_vec_close(pts[4], Vec3::new(4.0, 0.0, 0.0), 1e-12);
    }

    #[test]
    fn three_anchors_fifty_segments_sample_101_points() {
        let anchors = [
            Vec3::ZERO,
            Vec3::new(5.0, 0.0, 0.0),
            Vec3::new(5.0, 0.0, 5.0),
        ];
        let mut pts = Vec::new();
        chain_arcs(&mut pts, &anchors, 50, 4.0);
        assert_eq!(pts.len(), 101);
        // The shared joint appears once and sits on the anchor.
        assert_vec_close(pts[50], anchors[1], 1e-12);
        assert_vec_close(pts[100], anchors[2], 1e-12);
    }

    #[test]
    fn chain_needs_two_anchors() {
        let mut pts = vec![Vec3::X];
        chain_arcs(&mut pts, &[Vec3::ZERO], 50, 4.0);
        assert!(pts.is_empty());
    }

    #[test]
    fn spline_interpolates_its_control_points() {
        let pts = [
            Vec3::ZERO,
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(3.0, 0.0, 0.0),
            Vec3::new(4.0, 2.0, 1.0),
        ];
        let curve = CatmullRom::new(&pts).expect("curve");
        for (i, p) in pts.iter().enumerate() {
            let t = i as f64 / (pts.len() - 1) as f64;
            assert_vec_close(curve.point(t), *p, 1e-9);
        }
    }

    #[test]
    fn straight_line_spline_is_straight_and_arc_length_uniform() {
        let pts = [Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Vec3::new(10.0, 0.0, 0.0)];
        let curve = CatmullRom::new(&pts).expect("curve");
        assert!((curve.length() - 10.0).abs() < 1e-6);
        let mid = curve.point_at(0.5);
        assert!((mid.x - 5.0).abs() < 0.05);
        assert!(mid.y.abs() < 1e-12 && mid.z.abs() < 1e-12);
        assert_vec_close(curve.tangent_at(0.3), Vec3::X, 1e-9);
    }

    #[test]
    fn end_parameters_map_to_end_points() {
        let pts = [Vec3::ZERO, Vec3::new(1.0, 2.0, 0.0), Vec3::new(3.0, 0.0, 1.0)];
        let curve = CatmullRom::new(&pts).expect("curve");
        assert_eq!(curve.u_to_t(0.0), 0.0);
        assert_eq!(curve.u_to_t(1.0), 1.0);
        assert_vec_close(curve.point_at(1.0), pts[2], 1e-9);
    }

    #[test]
    fn coincident_points_do_not_produce_nan() {
        let pts = [Vec3::ZERO, Vec3::ZERO];
        let curve = CatmullRom::new(&pts).expect("curve");
        let p = curve.point_at(0.5);
        assert!(p.x.is_finite() && p.y.is_finite() && p.z.is_finite());
        assert_eq!(curve.tangent_at(0.5), Vec3::ZERO);
    }

    #[test]
    fn single_point_is_not_a_curve() {
        assert!(CatmullRom::new(&[Vec3::ZERO]).is_none());
    }
}
