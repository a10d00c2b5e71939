use foundation::math::{GeoPoint, SphericalError, Vec2, Vec3, cartesian_to_geo};
use tracing::warn;

/// Default relative tolerance for accepting an intersection distance as
/// "on the globe".
pub const DEFAULT_PICK_TOLERANCE: f64 = 0.04;

/// Angular divergence (degrees) above which the UV cross-check warns.
const UV_CHECK_TOLERANCE_DEG: f64 = 5.0;

/// One ray-cast intersection candidate, in the globe's local space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Intersection {
    pub point: Vec3,
    pub uv: Option<Vec2>,
}

impl Intersection {
    pub fn new(point: Vec3) -> Self {
        Self { point, uv: None }
    }

    pub fn with_uv(point: Vec3, uv: Vec2) -> Self {
        Self {
            point,
            uv: Some(uv),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PickError {
    /// No candidate was within tolerance of the globe surface.
    NoSurfaceIntersection { candidates: usize },
}

impl std::fmt::Display for PickError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PickError::NoSurfaceIntersection { candidates } => {
                write!(
                    f,
                    "none of {candidates} intersection candidate(s) lie on the globe surface"
                )
            }
        }
    }
}

impl std::error::Error for PickError {}

/// Converts ray/sphere intersections into the canonical geographic point.
///
/// There is exactly one derivation: `cartesian_to_geo` on the 3-D hit
/// point. A texture UV, when supplied, is only cross-checked for
/// diagnostics and never used as an alternative answer.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SurfacePicker {
    radius: f64,
    tolerance: f64,
}

impl SurfacePicker {
    /// Picker for a globe of the given radius, with the default ±4%
    /// distance tolerance.
    pub fn new(radius: f64) -> Self {
        Self::with_tolerance(radius, DEFAULT_PICK_TOLERANCE)
    }

    pub fn with_tolerance(radius: f64, tolerance: f64) -> Self {
        Self { radius, tolerance }
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Resolves the first usable candidate to a `GeoPoint`.
    ///
    /// Candidates must arrive in ray order (nearest first). A candidate
    /// whose distance from the sphere center falls outside tolerance is
    /// skipped, so a stray hit on some other scene object falls through to
    /// the actual globe intersection behind it. A failed pick is an error
    /// the caller drops; it never changes the current selection.
    pub fn pick(&self, candidates: &[Intersection]) -> Result<GeoPoint, PickError> {
        for candidate in candidates {
            let distance = candidate.point.length();
            if !distance.is_finite()
                || (distance - self.radius).abs() > self.radius * self.tolerance
            {
                continue;
            }

            let geo = match cartesian_to_geo(candidate.point, self.radius) {
                Ok(geo) => geo,
                Err(SphericalError::OffSurface { .. }) => continue,
            };

            if let Some(uv) = candidate.uv {
                cross_check_uv(geo, uv);
            }
            return Ok(geo);
        }

        Err(PickError::NoSurfaceIntersection {
            candidates: candidates.len(),
        })
    }
}

/// Diagnostic only: equirectangular UVs should land near the derived
/// lat/lon. Texture conventions vary, so divergence is logged, never acted
/// on.
fn cross_check_uv(geo: GeoPoint, uv: Vec2) {
    let uv_lon = uv.x * 360.0 - 180.0;
    let uv_lat = uv.y * 180.0 - 90.0;
    let d_lon = (geo.lon_deg - uv_lon + 180.0).rem_euclid(360.0) - 180.0;
    let d_lat = geo.lat_deg - uv_lat;
    if d_lon.abs() > UV_CHECK_TOLERANCE_DEG || d_lat.abs() > UV_CHECK_TOLERANCE_DEG {
        warn!(
            lat = geo.lat_deg,
            lon = geo.lon_deg,
            uv_lat,
            uv_lon,
            "surface pick diverges from texture UV"
        );
    }
}

/// Ray/sphere intersections in ray order (0, 1 or 2 candidates).
///
/// For hosts that do not run their own ray cast. The sphere is centered at
/// the origin of the globe's local space; hits behind the ray origin are
/// discarded.
pub fn ray_sphere_intersections(origin: Vec3, dir: Vec3, radius: f64) -> Vec<Intersection> {
    let Some(d) = dir.normalized() else {
        return Vec::new();
    };

    // |origin + t·d|² = radius², with d unit length.
    let b = origin.dot(d);
    let c = origin.dot(origin) - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return Vec::new();
    }

    let s = disc.sqrt();
    let mut out: Vec<Intersection> = Vec::with_capacity(2);
    for t in [-b - s, -b + s] {
        if t < 0.0 {
            continue;
        }
        let point = origin + d.scale(t);
        // Tangent ray: both roots coincide.
        if let Some(prev) = out.last()
            && (point - prev.point).length() <= 1e-12
        {
            continue;
        }
        out.push(Intersection::new(point));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{Intersection, PickError, SurfacePicker, ray_sphere_intersections};
    use foundation::math::{Vec2, Vec3};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn picks_surface_point() {
        let picker = SurfacePicker::new(10.0);
        let geo = picker
            .pick(&[Intersection::new(Vec3::new(10.0, 0.0, 0.0))])
            .expect("pick");
        assert_close(geo.lat_deg, 0.0, 1e-9);
        assert_close(geo.lon_deg, 0.0, 1e-9);
    }

    #[test]
    fn skips_off_globe_candidate_and_uses_the_next() {
        let picker = SurfacePicker::new(10.0);
        // First candidate is a hit on some other object far off the sphere.
        let candidates = [
            Intersection::new(Vec3::new(30.0, 5.0, 0.0)),
            Intersection::new(Vec3::new(0.0, 10.0, 0.0)),
        ];
        let geo = picker.pick(&candidates).expect("fallback pick");
        assert_close(geo.lat_deg, 90.0, 1e-9);
    }

    #[test]
    fn fails_when_no_candidate_is_on_surface() {
        let picker = SurfacePicker::new(10.0);
        let err = picker
            .pick(&[Intersection::new(Vec3::new(30.0, 0.0, 0.0))])
            .unwrap_err();
        assert_eq!(err, PickError::NoSurfaceIntersection { candidates: 1 });

        let err = picker.pick(&[]).unwrap_err();
        assert_eq!(err, PickError::NoSurfaceIntersection { candidates: 0 });
    }

    #[test]
    fn tolerance_gates_distance() {
        let picker = SurfacePicker::new(10.0);
        // 3% off: accepted under the default 4% gate.
        assert!(picker.pick(&[Intersection::new(Vec3::new(10.3, 0.0, 0.0))]).is_ok());
        // 5% off: rejected.
        assert!(picker.pick(&[Intersection::new(Vec3::new(10.5, 0.0, 0.0))]).is_err());

        let strict = SurfacePicker::with_tolerance(10.0, 0.001);
        assert!(strict.pick(&[Intersection::new(Vec3::new(10.3, 0.0, 0.0))]).is_err());
    }

    #[test]
    fn non_finite_candidate_is_skipped() {
        let picker = SurfacePicker::new(10.0);
        let candidates = [
            Intersection::new(Vec3::new(f64::NAN, 0.0, 0.0)),
            Intersection::new(Vec3::new(10.0, 0.0, 0.0)),
        ];
        assert!(picker.pick(&candidates).is_ok());
    }

    #[test]
    fn uv_cross_check_never_changes_the_answer() {
        let picker = SurfacePicker::new(10.0);
        // Wildly wrong UV: logged, not used.
        let geo = picker
            .pick(&[Intersection::with_uv(
                Vec3::new(10.0, 0.0, 0.0),
                Vec2::new(0.9, 0.9),
            )])
            .expect("pick");
        assert_close(geo.lat_deg, 0.0, 1e-9);
        assert_close(geo.lon_deg, 0.0, 1e-9);
    }

    #[test]
    fn ray_from_outside_yields_two_ordered_hits() {
        let hits = ray_sphere_intersections(Vec3::new(30.0, 0.0, 0.0), Vec3::new(-1.0, 0.0, 0.0), 10.0);
        assert_eq!(hits.len(), 2);
        assert_close(hits[0].point.x, 10.0, 1e-9);
        assert_close(hits[1].point.x, -10.0, 1e-9);
    }

    #[test]
    fn ray_from_inside_yields_one_hit() {
        let hits = ray_sphere_intersections(Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0), 10.0);
        assert_eq!(hits.len(), 1);
        assert_close(hits[0].point.y, 10.0, 1e-9);
    }

    #[test]
    fn missing_and_degenerate_rays() {
        assert!(ray_sphere_intersections(Vec3::new(30.0, 30.0, 0.0), Vec3::new(1.0, 0.0, 0.0), 10.0).is_empty());
        assert!(ray_sphere_intersections(Vec3::new(30.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 0.0), 10.0).is_empty());
    }

    #[test]
    fn ray_hits_feed_the_picker() {
        let picker = SurfacePicker::new(10.0);
        let hits = ray_sphere_intersections(Vec3::new(50.0, 0.0, 0.0), Vec3::new(-1.0, 0.0, 0.0), 10.0);
        let geo = picker.pick(&hits).expect("pick from ray");
        assert_close(geo.lat_deg, 0.0, 1e-9);
        assert_close(geo.lon_deg, 0.0, 1e-9);
    }
}
