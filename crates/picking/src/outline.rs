use foundation::math::{GeoPoint, geo_to_cartesian};
use formats::countries::PolygonGeometry;
use tracing::warn;

/// Rendering parameters for one outline pass.
///
/// Several layers at slightly different radii are usually drawn per
/// selection to fake line thickness and glow; `color` carries opacity in
/// its alpha channel.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OutlineLayer {
    pub radius: f64,
    pub color: [f32; 4],
}

impl OutlineLayer {
    pub fn new(radius: f64, color: [f32; 4]) -> Self {
        Self { radius, color }
    }
}

/// GPU-ready line-segment vertices: consecutive position pairs, f32.
///
/// One buffer per layer; all outer rings of the selected geometry share
/// it, so the host binds one vertex buffer per visual pass.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSegmentBuffer {
    pub layer: OutlineLayer,
    pub positions: Vec<[f32; 3]>,
}

impl LineSegmentBuffer {
    pub fn segment_count(&self) -> usize {
        self.positions.len() / 2
    }
}

/// Builds outline buffers for a selection.
///
/// Vertices go through the same `geo_to_cartesian` the surface picker
/// inverts, which is what keeps the highlight under the click. Outer rings
/// only; the implicit closing edge (last vertex back to first) is emitted;
/// segments touching a non-finite vertex are skipped with a warning.
///
/// Degenerate input (no rings, no layers) yields an empty vec, never an
/// error: "nothing selected" must not crash the interaction loop.
pub fn build_outline(geometry: &PolygonGeometry, layers: &[OutlineLayer]) -> Vec<LineSegmentBuffer> {
    if layers.is_empty() {
        return Vec::new();
    }

    // Gather segment endpoints once in geo space, then transform per layer.
    let mut segments: Vec<(GeoPoint, GeoPoint)> = Vec::new();
    for ring in geometry.outer_rings() {
        let n = ring.len();
        if n < 2 {
            continue;
        }
        for i in 0..n {
            let a = ring[i];
            let b = ring[(i + 1) % n];
            if !a.is_finite() || !b.is_finite() {
                warn!("skipping outline segment with non-finite vertex");
                continue;
            }
            segments.push((a, b));
        }
    }
    if segments.is_empty() {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(layers.len());
    for layer in layers {
        if !layer.radius.is_finite() || layer.radius <= 0.0 {
            warn!(radius = layer.radius, "skipping outline layer with bad radius");
            continue;
        }
        let mut positions = Vec::with_capacity(segments.len() * 2);
        for (a, b) in &segments {
            positions.push(vertex(*a, layer.radius));
            positions.push(vertex(*b, layer.radius));
        }
        out.push(LineSegmentBuffer {
            layer: *layer,
            positions,
        });
    }
    out
}

/// `build_outline` over an optional geometry, so the ocean / not-loaded
/// states produce an empty result instead of needing a caller-side branch.
pub fn build_outline_opt(
    geometry: Option<&PolygonGeometry>,
    layers: &[OutlineLayer],
) -> Vec<LineSegmentBuffer> {
    match geometry {
        Some(geometry) => build_outline(geometry, layers),
        None => Vec::new(),
    }
}

// CPU math stays f64; vertices are cast to f32 only at the buffer edge.
fn vertex(geo: GeoPoint, radius: f64) -> [f32; 3] {
    let p = geo_to_cartesian(geo, radius);
    [p.x as f32, p.y as f32, p.z as f32]
}
