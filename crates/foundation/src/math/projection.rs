use super::Vec2;

/// Extent of the flat logical map that geographic coordinates are projected
/// onto. The map is centered on the origin.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MapExtent {
    pub width: f64,
    pub height: f64,
}

impl Default for MapExtent {
    fn default() -> Self {
        Self {
            width: 20.0,
            height: 10.0,
        }
    }
}

/// Equirectangular projection from degrees to logical map coordinates.
///
/// Longitude ±180 maps to ±`width / 2`, latitude ±90 to ±`height / 2`.
pub fn lat_lon_to_map_xy(lat_deg: f64, lon_deg: f64, extent: MapExtent) -> Vec2 {
    Vec2::new(
        (lon_deg / 180.0) * (extent.width / 2.0),
        (lat_deg / 90.0) * (extent.height / 2.0),
    )
}
