use super::Vec3;

/// Relative tolerance for accepting a Cartesian point as "on the sphere".
///
/// Slightly looser than the pick gate so that any intersection a picker
/// accepts converts without a second rejection.
pub const SURFACE_REL_TOLERANCE: f64 = 0.05;

/// Geographic coordinates in degrees.
///
/// Invariants (enforced by `new`):
/// - latitude is clamped to [-90, 90]
/// - longitude is normalized into [-180, 180)
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GeoPoint {
    pub lat_deg: f64,
    pub lon_deg: f64,
}

impl GeoPoint {
    pub fn new(lat_deg: f64, lon_deg: f64) -> Self {
        Self {
            lat_deg: lat_deg.clamp(-90.0, 90.0),
            lon_deg: normalize_lon_deg(lon_deg),
        }
    }

    pub fn is_finite(self) -> bool {
        self.lat_deg.is_finite() && self.lon_deg.is_finite()
    }
}

/// Wraps a longitude into [-180, 180). NaN passes through.
pub fn normalize_lon_deg(lon_deg: f64) -> f64 {
    (lon_deg + 180.0).rem_euclid(360.0) - 180.0
}

#[derive(Debug, Clone, PartialEq)]
pub enum SphericalError {
    /// The point's distance from the origin is not within tolerance of the
    /// sphere radius (or is non-finite).
    OffSurface { distance: f64, radius: f64 },
}

impl std::fmt::Display for SphericalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SphericalError::OffSurface { distance, radius } => {
                write!(
                    f,
                    "point at distance {distance} is not on the sphere of radius {radius}"
                )
            }
        }
    }
}

impl std::error::Error for SphericalError {}

/// The one lat/lon ↔ Cartesian convention used everywhere.
///
/// x = r·cos(lat)·cos(lon)
/// y = r·sin(lat)
/// z = -r·cos(lat)·sin(lon)
///
/// Both the surface picker and the outline builder must go through this
/// pair; a second formula anywhere is how a highlight drifts off the click.
pub fn geo_to_cartesian(geo: GeoPoint, radius: f64) -> Vec3 {
    let lat = geo.lat_deg.to_radians();
    let lon = geo.lon_deg.to_radians();
    let cos_lat = lat.cos();
    Vec3::new(
        radius * cos_lat * lon.cos(),
        radius * lat.sin(),
        -radius * cos_lat * lon.sin(),
    )
}

/// Inverse of [`geo_to_cartesian`].
///
/// Fails with `OffSurface` when the point is not within
/// `SURFACE_REL_TOLERANCE` of the sphere; this guards against resolving a
/// hit on some unrelated scene object into a bogus country.
///
/// At the poles longitude is undefined; 0 is returned by convention.
pub fn cartesian_to_geo(point: Vec3, radius: f64) -> Result<GeoPoint, SphericalError> {
    let distance = point.length();
    if !distance.is_finite()
        || !(radius > 0.0)
        || (distance - radius).abs() > radius * SURFACE_REL_TOLERANCE
    {
        return Err(SphericalError::OffSurface { distance, radius });
    }

    // Use the actual distance, not the nominal radius, so near-surface
    // points land exactly where their direction says.
    let lat = (point.y / distance).clamp(-1.0, 1.0).asin();
    let horizontal = point.x.hypot(point.z);
    let lon = if horizontal <= distance * 1e-12 {
        0.0
    } else {
        (-point.z).atan2(point.x)
    };

    Ok(GeoPoint::new(lat.to_degrees(), lon.to_degrees()))
}
