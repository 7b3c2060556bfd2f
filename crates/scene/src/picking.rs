use foundation::math::Vec3;
use foundation::math::precision::stable_total_cmp_f64;
use foundation::{DotId, HotspotId};

use crate::state::SceneState;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self { origin, dir }
    }

    pub fn at(&self, t: f64) -> Vec3 {
        self.origin + self.dir * t
    }
}

/// Capped cylinder with a vertical axis.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Cylinder {
    pub center: Vec3,
    pub radius: f64,
    pub half_height: f64,
}

impl Cylinder {
    pub fn new(center: Vec3, radius: f64, height: f64) -> Self {
        Self {
            center,
            radius,
            half_height: height / 2.0,
        }
    }

    fn contains(&self, p: Vec3) -> bool {
        let dx = p.x - self.center.x;
        let dz = p.z - self.center.z;
        dx * dx + dz * dz <= self.radius * self.radius
            && (p.y - self.center.y).abs() <= self.half_height
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickHit<T> {
    pub id: T,
    pub distance: f64,
    pub point: Vec3,
}

/// Distance along `dir` (normalized) to the first surface hit, or `0.0` if
/// the origin is inside. `None` if the ray misses or the hit is behind it.
pub fn ray_cylinder_hit_t(origin: Vec3, dir: Vec3, cyl: &Cylinder) -> Option<f64> {
    if cyl.contains(origin) {
        return Some(0.0);
    }

    let mut best: Option<f64> = None;
    let mut consider = |t: f64| {
        if t >= 0.0 && best.is_none_or(|b| t < b) {
            best = Some(t);
        }
    };

    let y_min = cyl.center.y - cyl.half_height;
    let y_max = cyl.center.y + cyl.half_height;
    let r2 = cyl.radius * cyl.radius;

    // Side wall.
    let ox = origin.x - cyl.center.x;
    let oz = origin.z - cyl.center.z;
    let a = dir.x * dir.x + dir.z * dir.z;
    if a > 1e-12 {
        let b = 2.0 * (ox * dir.x + oz * dir.z);
        let c = ox * ox + oz * oz - r2;
        let disc = b * b - 4.0 * a * c;
        if disc >= 0.0 {
            let sq = disc.sqrt();
            for t in [(-b - sq) / (2.0 * a), (-b + sq) / (2.0 * a)] {
                let y = origin.y + dir.y * t;
                if (y_min..=y_max).contains(&y) {
                    consider(t);
                }
            }
        }
    }

    // Caps.
    if dir.y.abs() > 1e-12 {
        for cap_y in [y_min, y_max] {
            let t = (cap_y - origin.y) / dir.y;
            let x = ox + dir.x * t;
            let z = oz + dir.z * t;
            if x * x + z * z <= r2 {
                consider(t);
            }
        }
    }

    best
}

/// Nearest hit among `(index, cylinder)` candidates.
///
/// Ordering contract:
/// - The closest hit along the (normalized) ray wins.
/// - If multiple candidates are hit at the same distance, the lower index wins.
fn pick_nearest(
    ray: Ray,
    candidates: impl Iterator<Item = (usize, Cylinder)>,
) -> Option<(usize, f64, Vec3)> {
    let dir = ray.dir.try_normalize()?;
    let mut best: Option<(f64, usize)> = None;

    for (index, cyl) in candidates {
        let Some(t) = ray_cylinder_hit_t(ray.origin, dir, &cyl) else {
            continue;
        };
        best = match best {
            None => Some((t, index)),
            Some((bt, bi)) => {
                let ord = stable_total_cmp_f64(t, bt).then_with(|| index.cmp(&bi));
                if ord.is_lt() {
                    Some((t, index))
                } else {
                    Some((bt, bi))
                }
            }
        };
    }

    let (t, index) = best?;
    Some((index, t, ray.origin + dir * t))
}

/// Picks the dot whose hover proxy the ray hits first.
///
/// Proxies are wider and taller than the visible dots so the cursor does not
/// have to land exactly on a thin cylinder. They follow each dot's lift.
pub fn pick_dot(scene: &SceneState, ray: Ray) -> Option<PickHit<DotId>> {
    let layout = *scene.layout();
    let candidates = scene.dots().iter().enumerate().map(|(i, dot)| {
        (
            i,
            Cylinder::new(
                layout.dot_center(dot),
                layout.proxy_radius,
                layout.proxy_height,
            ),
        )
    });
    pick_nearest(ray, candidates).map(|(i, distance, point)| PickHit {
        id: DotId::from_usize(i),
        distance,
        point,
    })
}

/// Picks the hotspot marker the ray hits first.
pub fn pick_hotspot(scene: &SceneState, ray: Ray) -> Option<PickHit<HotspotId>> {
    let layout = *scene.layout();
    let dots = scene.dots();
    let candidates = scene
        .hotspots()
        .iter()
        .enumerate()
        .filter_map(|(i, h)| {
            let dot = dots.get(h.dot.as_usize())?;
            Some((
                i,
                Cylinder::new(
                    layout.hotspot_center(dot),
                    layout.hotspot_radius,
                    layout.hotspot_height,
                ),
            ))
        });
    pick_nearest(ray, candidates).map(|(i, distance, point)| PickHit {
        id: HotspotId::from_usize(i),
        distance,
        point,
    })
}
