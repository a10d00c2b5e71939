use foundation::math::GeoPoint;
use formats::countries::{PolygonGeometry, Ring};

/// Even-odd ray-casting containment test against one ring.
///
/// The cast runs eastward at the point's latitude: each edge that straddles
/// the latitude toggles inclusion when its crossing longitude lies east of
/// the point. Horizontal edges never straddle, so the division is safe.
/// The segment from the last vertex back to the first closes the ring.
///
/// Known limitation: edges are not unwrapped across the anti-meridian, so
/// rings straddling ±180° can report the wrong side near the seam.
pub fn ring_contains(point: GeoPoint, ring: &Ring) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }

    let lat = point.lat_deg;
    let lon = point.lon_deg;
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (ring[i].lon_deg, ring[i].lat_deg);
        let (xj, yj) = (ring[j].lon_deg, ring[j].lat_deg);
        if (yi > lat) != (yj > lat) {
            let crossing = (xj - xi) * (lat - yi) / (yj - yi) + xi;
            if lon < crossing {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Containment against a full geometry.
///
/// Polygons test their outer ring only; holes are ignored (current scope).
/// A multipolygon contains the point when any member's outer ring does.
pub fn geometry_contains(point: GeoPoint, geometry: &PolygonGeometry) -> bool {
    match geometry {
        PolygonGeometry::Polygon(rings) => {
            rings.first().is_some_and(|outer| ring_contains(point, outer))
        }
        PolygonGeometry::MultiPolygon(polys) => polys
            .iter()
            .any(|rings| rings.first().is_some_and(|outer| ring_contains(point, outer))),
    }
}
