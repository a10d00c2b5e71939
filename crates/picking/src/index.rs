use foundation::math::GeoPoint;
use formats::countries::{CountryFeature, PolygonGeometry};
use serde::Serialize;
use tracing::debug;

use crate::containment::geometry_contains;

/// Display name of the "no country matched" sentinel.
pub const OCEAN_NAME: &str = "Ocean/International Waters";

/// Display name while the country dataset has not arrived yet.
pub const NOT_LOADED_NAME: &str = "Loading...";

/// Lon/lat bounding box over a geometry's outer rings.
///
/// Used only as a cheap reject ahead of ray casting: a point inside a ring
/// is always inside the ring's vertex bbox, so pruning never changes the
/// first-match result.
#[derive(Debug, Copy, Clone, PartialEq)]
struct GeoBounds {
    min_lon: f64,
    min_lat: f64,
    max_lon: f64,
    max_lat: f64,
}

impl GeoBounds {
    fn of_geometry(geometry: &PolygonGeometry) -> Self {
        let mut b = Self {
            min_lon: f64::INFINITY,
            min_lat: f64::INFINITY,
            max_lon: f64::NEG_INFINITY,
            max_lat: f64::NEG_INFINITY,
        };
        for ring in geometry.outer_rings() {
            for p in ring {
                b.min_lon = b.min_lon.min(p.lon_deg);
                b.min_lat = b.min_lat.min(p.lat_deg);
                b.max_lon = b.max_lon.max(p.lon_deg);
                b.max_lat = b.max_lat.max(p.lat_deg);
            }
        }
        b
    }

    fn contains(&self, p: GeoPoint) -> bool {
        p.lon_deg >= self.min_lon
            && p.lon_deg <= self.max_lon
            && p.lat_deg >= self.min_lat
            && p.lat_deg <= self.max_lat
    }
}

#[derive(Debug, Clone)]
struct IndexedCountry {
    bounds: GeoBounds,
    feature: CountryFeature,
}

#[derive(Debug, Clone, Default)]
enum IndexState {
    #[default]
    NotLoaded,
    Loaded(Vec<IndexedCountry>),
}

/// Resolves a geographic point to the country that owns it.
///
/// Ordering contract:
/// - Features are scanned in insertion order; the first containing feature
///   wins. Overlapping geometries therefore resolve deterministically.
///
/// The index starts empty ("not loaded") and is replaced atomically by
/// `load`; there is no partially-visible state. Reads never block, so a
/// resolve before the dataset arrives reports `Resolution::NotLoaded`
/// rather than stalling the interaction loop.
#[derive(Debug, Clone, Default)]
pub struct CountryIndex {
    state: IndexState,
}

impl CountryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, IndexState::Loaded(_))
    }

    pub fn len(&self) -> usize {
        match &self.state {
            IndexState::NotLoaded => 0,
            IndexState::Loaded(countries) => countries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replaces the whole index in one assignment.
    pub fn load(&mut self, features: Vec<CountryFeature>) {
        let countries: Vec<IndexedCountry> = features
            .into_iter()
            .map(|feature| IndexedCountry {
                bounds: GeoBounds::of_geometry(&feature.geometry),
                feature,
            })
            .collect();
        debug!(countries = countries.len(), "country index loaded");
        self.state = IndexState::Loaded(countries);
    }

    pub fn resolve(&self, point: GeoPoint) -> Resolution<'_> {
        let countries = match &self.state {
            IndexState::NotLoaded => return Resolution::NotLoaded { point },
            IndexState::Loaded(countries) => countries,
        };

        for country in countries {
            if !country.bounds.contains(point) {
                continue;
            }
            if geometry_contains(point, &country.feature.geometry) {
                return Resolution::Country(ResolvedCountry {
                    feature: &country.feature,
                    point,
                });
            }
        }

        Resolution::Ocean { point }
    }
}

/// A resolved country plus the point that selected it.
#[derive(Debug, Copy, Clone)]
pub struct ResolvedCountry<'a> {
    pub feature: &'a CountryFeature,
    pub point: GeoPoint,
}

/// Outcome of a resolve.
///
/// `Ocean` (definitively no match) and `NotLoaded` (dataset not ready) are
/// distinct states; only the display name may collapse them for the UI.
#[derive(Debug, Copy, Clone)]
pub enum Resolution<'a> {
    Country(ResolvedCountry<'a>),
    Ocean { point: GeoPoint },
    NotLoaded { point: GeoPoint },
}

impl<'a> Resolution<'a> {
    pub fn display_name(&self) -> &str {
        match self {
            Resolution::Country(c) => &c.feature.name,
            Resolution::Ocean { .. } => OCEAN_NAME,
            Resolution::NotLoaded { .. } => NOT_LOADED_NAME,
        }
    }

    pub fn point(&self) -> GeoPoint {
        match self {
            Resolution::Country(c) => c.point,
            Resolution::Ocean { point } | Resolution::NotLoaded { point } => *point,
        }
    }

    pub fn geometry(&self) -> Option<&'a PolygonGeometry> {
        match self {
            Resolution::Country(c) => Some(&c.feature.geometry),
            Resolution::Ocean { .. } | Resolution::NotLoaded { .. } => None,
        }
    }

    /// The `{name, lat, lon}` struct handed to downstream services
    /// (weather, news, local time).
    pub fn payload(&self) -> PlacePayload {
        let point = self.point();
        PlacePayload {
            name: self.display_name().to_string(),
            lat: point.lat_deg,
            lon: point.lon_deg,
        }
    }
}

/// Serializable location payload for downstream data services.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacePayload {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}
