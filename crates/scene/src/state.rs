use std::str::FromStr;

use foundation::math::{Vec2, Vec3, lat_lon_to_map_xy, stable_total_cmp_f64};
use foundation::{DotId, HotspotId};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::SceneConfig;

/// One instanced dot on the logical grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Dot {
    /// Logical grid coordinates. Fixed at load.
    pub grid: Vec2,
    /// Current vertical displacement. Written only by the lift field.
    pub lift: f64,
    /// Displacement the lift is easing toward.
    pub target_lift: f64,
    /// Hotspot bound to this dot, if any. Fixed at load.
    pub hotspot: Option<HotspotId>,
}

impl Dot {
    pub fn new(grid: Vec2) -> Self {
        Self {
            grid,
            lift: 0.0,
            target_lift: 0.0,
            hotspot: None,
        }
    }
}

/// Hotspot category. Picks the marker color and the instanced mesh group.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HotspotKind {
    Global,
    Regional,
    Telco,
}

/// Marker color per kind, indexed by `HotspotKind as usize`.
const HOTSPOT_COLORS: [u32; 3] = [
    0x008551, // green
    0xff8a00, // orange
    0xff4fa3, // pink
];

impl HotspotKind {
    pub const ALL: [HotspotKind; 3] = [HotspotKind::Global, HotspotKind::Regional, HotspotKind::Telco];

    pub fn color(self) -> u32 {
        HOTSPOT_COLORS[self as usize]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HotspotKind::Global => "global",
            HotspotKind::Regional => "regional",
            HotspotKind::Telco => "telco",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown hotspot kind {0:?} (expected global, regional or telco)")]
pub struct UnknownHotspotKind(pub String);

impl FromStr for HotspotKind {
    type Err = UnknownHotspotKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "global" => Ok(HotspotKind::Global),
            "regional" => Ok(HotspotKind::Regional),
            "telco" => Ok(HotspotKind::Telco),
            _ => Err(UnknownHotspotKind(s.to_string())),
        }
    }
}

/// A hotspot as it arrives from the asset layer, before binding.
#[derive(Debug, Clone, PartialEq)]
pub struct HotspotRecord {
    pub id: String,
    pub label: String,
    pub message: String,
    pub lat: f64,
    pub lon: f64,
    pub kind: HotspotKind,
}

/// A hotspot bound to its dot.
#[derive(Debug, Clone, PartialEq)]
pub struct Hotspot {
    pub id: String,
    pub label: String,
    pub message: String,
    pub kind: HotspotKind,
    /// Dot this marker rides on. Fixed at load.
    pub dot: DotId,
    /// Index within the instanced mesh of this hotspot's kind.
    pub instance: u32,
}

/// World-space dimensions derived from the config, shared by every
/// position computation so dots, markers, proxies and connectors agree.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SceneLayout {
    pub spacing: f64,
    pub dot_height: f64,
    pub hotspot_radius: f64,
    pub hotspot_height: f64,
    pub proxy_radius: f64,
    pub proxy_height: f64,
}

impl SceneLayout {
    pub fn from_config(config: &SceneConfig) -> Self {
        Self {
            spacing: config.dots.spacing,
            dot_height: config.dots.height,
            hotspot_radius: config.hotspot_radius(),
            hotspot_height: config.hotspot_height(),
            proxy_radius: config.dots.radius * config.dots.proxy_radius_factor,
            proxy_height: config.dots.height * config.dots.proxy_height_factor,
        }
    }

    /// Ground-plane world position of a grid coordinate (y = 0).
    pub fn ground(&self, grid: Vec2) -> Vec3 {
        Vec3::new(grid.x * self.spacing, 0.0, -grid.y * self.spacing)
    }

    /// Center of a dot cylinder standing on the ground, raised by its lift.
    pub fn dot_center(&self, dot: &Dot) -> Vec3 {
        self.ground(dot.grid) + Vec3::new(0.0, self.dot_height / 2.0 + dot.lift, 0.0)
    }

    /// Center of a hotspot marker riding on `dot`.
    pub fn hotspot_center(&self, dot: &Dot) -> Vec3 {
        self.ground(dot.grid) + Vec3::new(0.0, self.hotspot_height / 2.0 + dot.lift, 0.0)
    }
}

/// Everything the frame loop mutates, owned by one controller and passed by
/// reference into each step.
#[derive(Debug, Clone)]
pub struct SceneState {
    layout: SceneLayout,
    dots: Vec<Dot>,
    hotspots: Vec<Hotspot>,
    skipped: Vec<String>,
}

impl SceneState {
    /// Builds the dot array and binds each hotspot to its nearest free dot.
    ///
    /// Hotspots are bound in record order; a dot already claimed by an earlier
    /// hotspot is not considered for later ones. Records that find no dot are
    /// skipped and listed in `skipped_hotspots`.
    pub fn build(
        config: &SceneConfig,
        grid: impl IntoIterator<Item = Vec2>,
        records: impl IntoIterator<Item = HotspotRecord>,
    ) -> Self {
        let layout = SceneLayout::from_config(config);
        let mut dots: Vec<Dot> = grid.into_iter().map(Dot::new).collect();
        let mut hotspots: Vec<Hotspot> = Vec::new();
        let mut skipped = Vec::new();
        let mut instances = [0u32; HotspotKind::ALL.len()];
        let extent = config.map.extent();

        for record in records {
            let target = lat_lon_to_map_xy(record.lat, record.lon, extent);
            let Some(dot_id) = nearest_free_dot(&dots, target) else {
                warn!(id = %record.id, "no free dot for hotspot, skipping");
                skipped.push(record.id);
                continue;
            };

            let hotspot_id = HotspotId::from_usize(hotspots.len());
            dots[dot_id.as_usize()].hotspot = Some(hotspot_id);

            let slot = &mut instances[record.kind as usize];
            let instance = *slot;
            *slot += 1;

            hotspots.push(Hotspot {
                id: record.id,
                label: record.label,
                message: record.message,
                kind: record.kind,
                dot: dot_id,
                instance,
            });
        }

        info!(
            dots = dots.len(),
            hotspots = hotspots.len(),
            skipped = skipped.len(),
            "scene built"
        );

        Self {
            layout,
            dots,
            hotspots,
            skipped,
        }
    }

    pub fn layout(&self) -> &SceneLayout {
        &self.layout
    }

    pub fn dots(&self) -> &[Dot] {
        &self.dots
    }

    /// Mutable access for the lift field.
    pub fn dots_mut(&mut self) -> &mut [Dot] {
        &mut self.dots
    }

    pub fn dot(&self, id: DotId) -> Option<&Dot> {
        self.dots.get(id.as_usize())
    }

    pub fn hotspots(&self) -> &[Hotspot] {
        &self.hotspots
    }

    pub fn hotspot(&self, id: HotspotId) -> Option<&Hotspot> {
        self.hotspots.get(id.as_usize())
    }

    /// Finds a hotspot by its dataset id, ignoring ASCII case.
    pub fn find_hotspot(&self, key: &str) -> Option<HotspotId> {
        self.hotspots
            .iter()
            .position(|h| h.id.eq_ignore_ascii_case(key))
            .map(HotspotId::from_usize)
    }

    /// Ids of records that could not be bound to a dot.
    pub fn skipped_hotspots(&self) -> &[String] {
        &self.skipped
    }

    pub fn dot_center(&self, id: DotId) -> Option<Vec3> {
        self.dot(id).map(|d| self.layout.dot_center(d))
    }

    /// Marker center of a hotspot, following its dot's current lift.
    pub fn hotspot_center(&self, id: HotspotId) -> Option<Vec3> {
        let hotspot = self.hotspot(id)?;
        let dot = self.dot(hotspot.dot)?;
        Some(self.layout.hotspot_center(dot))
    }

    /// Number of hotspots of each kind, in `HotspotKind::ALL` order.
    pub fn instance_counts(&self) -> [u32; 3] {
        let mut counts = [0u32; 3];
        for h in &self.hotspots {
            counts[h.kind as usize] += 1;
        }
        counts
    }
}

/// Brute-force nearest unclaimed dot in grid space. Ties go to the lower index.
fn nearest_free_dot(dots: &[Dot], target: Vec2) -> Option<DotId> {
    dots.iter()
        .enumerate()
        .filter(|(_, d)| d.hotspot.is_none())
        .map(|(i, d)| (i, d.grid.distance_squared(target)))
        .min_by(|(ia, da), (ib, db)| stable_total_cmp_f64(*da, *db).then(ia.cmp(ib)))
        .map(|(i, _)| DotId::from_usize(i))
}

#[cfg(test)]
mod tests {
    use super::{HotspotKind, HotspotRecord, SceneState};
    use crate::config::SceneConfig;
    use foundation::math::{Vec2, Vec3};
    use foundation::{DotId, HotspotId};
    use pretty_assertions::assert_eq;

    fn record(id: &str, lat: f64, lon: f64, kind: HotspotKind) -> HotspotRecord {
        HotspotRecord {
            id: id.to_string(),
            label: id.to_uppercase(),
            message: format!("{id} message"),
            lat,
            lon,
            kind,
        }
    }

    fn grid() -> Vec<Vec2> {
        vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(0.0, 1.0),
        ]
    }

    #[test]
    fn binds_hotspot_to_nearest_dot() {
        // lon 18 -> x = 1.0, lat 0 -> y = 0.0
        let scene = SceneState::build(
            &SceneConfig::default(),
            grid(),
            [record("a", 0.0, 18.0, HotspotKind::Global)],
        );
        assert_eq!(scene.hotspots()[0].dot, DotId::new(1));
        assert_eq!(scene.dots()[1].hotspot, Some(HotspotId::new(0)));
        assert!(scene.skipped_hotspots().is_empty());
    }

    #[test]
    fn first_claim_wins_and_later_hotspot_takes_next_nearest() {
        let scene = SceneState::build(
            &SceneConfig::default(),
            grid(),
            [
                record("first", 0.0, 18.0, HotspotKind::Global),
                record("second", 0.0, 19.0, HotspotKind::Telco),
            ],
        );
        assert_eq!(scene.hotspots()[0].dot, DotId::new(1));
        // x = 1.0556: dot 1 is taken, dot 2 (x = 2) is next nearest.
        assert_eq!(scene.hotspots()[1].dot, DotId::new(2));
        assert_eq!(scene.dots()[2].hotspot, Some(HotspotId::new(1)));
    }

    #[test]
    fn skips_hotspots_when_no_dot_is_free() {
        let scene = SceneState::build(
            &SceneConfig::default(),
            vec![Vec2::new(0.0, 0.0)],
            [
                record("a", 0.0, 0.0, HotspotKind::Global),
                record("b", 0.0, 0.0, HotspotKind::Global),
            ],
        );
        assert_eq!(scene.hotspots().len(), 1);
        assert_eq!(scene.skipped_hotspots(), ["b".to_string()]);
    }

    #[test]
    fn empty_dot_list_skips_every_hotspot() {
        let scene = SceneState::build(
            &SceneConfig::default(),
            Vec::<Vec2>::new(),
            [record("a", 0.0, 0.0, HotspotKind::Global)],
        );
        assert!(scene.hotspots().is_empty());
        assert_eq!(scene.skipped_hotspots().len(), 1);
    }

    #[test]
    fn instance_indices_count_per_kind() {
        let scene = SceneState::build(
            &SceneConfig::default(),
            grid(),
            [
                record("g0", 0.0, 0.0, HotspotKind::Global),
                record("r0", 0.0, 18.0, HotspotKind::Regional),
                record("g1", 0.0, 36.0, HotspotKind::Global),
            ],
        );
        let instances: Vec<u32> = scene.hotspots().iter().map(|h| h.instance).collect();
        assert_eq!(instances, vec![0, 0, 1]);
        assert_eq!(scene.instance_counts(), [2, 1, 0]);
    }

    #[test]
    fn find_hotspot_ignores_case() {
        let scene = SceneState::build(
            &SceneConfig::default(),
            grid(),
            [record("Johannesburg", 0.0, 0.0, HotspotKind::Global)],
        );
        assert_eq!(scene.find_hotspot("johannesburg"), Some(HotspotId::new(0)));
        assert_eq!(scene.find_hotspot("singapore"), None);
    }

    #[test]
    fn positions_follow_spacing_and_lift() {
        let mut scene = SceneState::build(&SceneConfig::default(), grid(), Vec::<HotspotRecord>::new());
        scene.dots_mut()[3].lift = 0.2;
        let p = scene.dot_center(DotId::new(3)).expect("dot");
        assert!((p.x - 0.0).abs() < 1e-12);
        assert!((p.y - (0.15 + 0.2)).abs() < 1e-12);
        assert!((p.z - -1.5).abs() < 1e-12);
        assert_eq!(
            scene.layout().ground(Vec2::new(2.0, 0.0)),
            Vec3::new(3.0, 0.0, -0.0)
        );
    }

    #[test]
    fn kind_parses_and_maps_to_color() {
        assert_eq!("Telco".parse::<HotspotKind>(), Ok(HotspotKind::Telco));
        assert!("carrier".parse::<HotspotKind>().is_err());
        assert_eq!(HotspotKind::Regional.color(), 0xff8a00);
    }
}
