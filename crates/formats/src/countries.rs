use foundation::math::GeoPoint;
use serde_json::{Map, Value};
use tracing::warn;

/// One closed polygon boundary. Not explicitly closed: consumers treat the
/// segment from the last vertex back to the first as part of the ring.
pub type Ring = Vec<GeoPoint>;

/// Country boundary geometry, GeoJSON `Polygon`/`MultiPolygon` only.
///
/// Ring 0 of each polygon is the outer boundary; later rings are holes.
/// Holes are retained in the data but not consulted by containment or
/// outlining (current scope).
#[derive(Debug, Clone, PartialEq)]
pub enum PolygonGeometry {
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
}

impl PolygonGeometry {
    /// Iterates the outer ring of every constituent polygon.
    pub fn outer_rings(&self) -> impl Iterator<Item = &Ring> {
        let (single, multi) = match self {
            PolygonGeometry::Polygon(rings) => (rings.first(), None),
            PolygonGeometry::MultiPolygon(polys) => (None, Some(polys)),
        };
        single.into_iter().chain(
            multi
                .into_iter()
                .flat_map(|polys| polys.iter().filter_map(|rings| rings.first())),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.outer_rings().next().is_none()
    }
}

/// One country, immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct CountryFeature {
    pub name: String,
    pub properties: Map<String, Value>,
    pub geometry: PolygonGeometry,
}

/// A parsed country FeatureCollection.
///
/// Parsing degrades per feature: a feature with a missing name, an
/// unsupported geometry type, or no usable outer ring is skipped with a
/// warning rather than failing the whole set. Only a root that is not a
/// FeatureCollection is a hard error.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CountrySet {
    pub features: Vec<CountryFeature>,
}

#[derive(Debug)]
pub enum CountrySetError {
    Json { message: String },
    NotAFeatureCollection,
}

impl std::fmt::Display for CountrySetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CountrySetError::Json { message } => write!(f, "JSON parse error: {message}"),
            CountrySetError::NotAFeatureCollection => {
                write!(f, "expected GeoJSON FeatureCollection")
            }
        }
    }
}

impl std::error::Error for CountrySetError {}

impl CountrySet {
    pub fn from_geojson_str(payload: &str) -> Result<Self, CountrySetError> {
        let value: Value = serde_json::from_str(payload).map_err(|e| CountrySetError::Json {
            message: e.to_string(),
        })?;
        Self::from_geojson_value(&value)
    }

    pub fn from_geojson_value(value: &Value) -> Result<Self, CountrySetError> {
        let obj = value
            .as_object()
            .ok_or(CountrySetError::NotAFeatureCollection)?;
        let ty = obj
            .get("type")
            .and_then(|v| v.as_str())
            .ok_or(CountrySetError::NotAFeatureCollection)?;
        if ty != "FeatureCollection" {
            return Err(CountrySetError::NotAFeatureCollection);
        }
        let features_val = obj
            .get("features")
            .and_then(|v| v.as_array())
            .ok_or(CountrySetError::NotAFeatureCollection)?;

        let mut features = Vec::with_capacity(features_val.len());
        for (index, feat_val) in features_val.iter().enumerate() {
            match parse_feature(feat_val) {
                Ok(feature) => features.push(feature),
                Err(reason) => {
                    warn!(index, %reason, "skipping country feature");
                }
            }
        }

        Ok(Self { features })
    }
}

fn parse_feature(value: &Value) -> Result<CountryFeature, String> {
    let obj = value.as_object().ok_or("feature must be an object")?;
    let ty = obj
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or("feature missing type")?;
    if ty != "Feature" {
        return Err(format!("unexpected feature type: {ty}"));
    }

    let properties = obj
        .get("properties")
        .and_then(|v| v.as_object())
        .cloned()
        .unwrap_or_default();

    let name = feature_name(&properties).ok_or("feature missing NAME/name property")?;

    let geometry_val = obj.get("geometry").ok_or("feature missing geometry")?;
    let raw = parse_geometry(geometry_val)?;
    let geometry =
        sanitize_geometry(raw, &name).ok_or("geometry has no usable outer ring")?;

    Ok(CountryFeature {
        name,
        properties,
        geometry,
    })
}

fn feature_name(properties: &Map<String, Value>) -> Option<String> {
    properties
        .get("NAME")
        .or_else(|| properties.get("name"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

fn parse_geometry(value: &Value) -> Result<PolygonGeometry, String> {
    let obj = value.as_object().ok_or("geometry must be an object")?;
    let ty = obj
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or("geometry missing type")?;
    let coords = obj
        .get("coordinates")
        .ok_or("geometry missing coordinates")?;

    match ty {
        "Polygon" => Ok(PolygonGeometry::Polygon(parse_polygon(coords)?)),
        "MultiPolygon" => Ok(PolygonGeometry::MultiPolygon(parse_multi_polygon(coords)?)),
        other => Err(format!("unsupported geometry type: {other}")),
    }
}

fn parse_polygon(coords: &Value) -> Result<Vec<Ring>, String> {
    let rings = coords
        .as_array()
        .ok_or("Polygon coordinates must be an array of rings")?;
    let mut out = Vec::with_capacity(rings.len());
    for ring in rings {
        out.push(parse_ring(ring)?);
    }
    Ok(out)
}

fn parse_multi_polygon(coords: &Value) -> Result<Vec<Vec<Ring>>, String> {
    let polys = coords
        .as_array()
        .ok_or("MultiPolygon coordinates must be an array of polygons")?;
    let mut out = Vec::with_capacity(polys.len());
    for poly in polys {
        out.push(parse_polygon(poly)?);
    }
    Ok(out)
}

fn parse_ring(coords: &Value) -> Result<Ring, String> {
    let arr = coords.as_array().ok_or("ring must be an array")?;
    let mut out = Vec::with_capacity(arr.len());
    for pos in arr {
        let pair = pos.as_array().ok_or("position must be an array")?;
        if pair.len() < 2 {
            return Err("position must have [lon, lat]".to_string());
        }
        let lon = pair[0].as_f64().ok_or("lon must be a number")?;
        let lat = pair[1].as_f64().ok_or("lat must be a number")?;
        // GeoJSON is longitude-first; GeoPoint::new is (lat, lon).
        out.push(GeoPoint::new(lat, lon));
    }
    Ok(out)
}

/// Drops non-finite vertices and rings left with fewer than 3 points.
///
/// Returns `None` when nothing usable remains. Lossy steps are logged, not
/// fatal: a bad ring must never take down the whole dataset.
fn sanitize_geometry(geometry: PolygonGeometry, name: &str) -> Option<PolygonGeometry> {
    match geometry {
        PolygonGeometry::Polygon(rings) => {
            let rings = sanitize_rings(rings, name);
            if rings.first().is_some() {
                Some(PolygonGeometry::Polygon(rings))
            } else {
                None
            }
        }
        PolygonGeometry::MultiPolygon(polys) => {
            let polys: Vec<Vec<Ring>> = polys
                .into_iter()
                .map(|rings| sanitize_rings(rings, name))
                .filter(|rings| rings.first().is_some())
                .collect();
            if polys.is_empty() {
                None
            } else {
                Some(PolygonGeometry::MultiPolygon(polys))
            }
        }
    }
}

fn sanitize_rings(rings: Vec<Ring>, name: &str) -> Vec<Ring> {
    let mut out = Vec::with_capacity(rings.len());
    for ring in rings {
        let before = ring.len();
        let ring: Ring = ring.into_iter().filter(|p| p.is_finite()).collect();
        if ring.len() < before {
            warn!(country = name, dropped = before - ring.len(), "non-finite ring vertices");
        }
        if ring.len() < 3 {
            warn!(country = name, vertices = ring.len(), "dropping degenerate ring");
            continue;
        }
        out.push(ring);
    }
    out
}

/// Semantic exporter: emits the geometry back as a GeoJSON geometry object.
pub fn geometry_to_geojson_value(geometry: &PolygonGeometry) -> Value {
    let mut obj = Map::new();
    match geometry {
        PolygonGeometry::Polygon(rings) => {
            obj.insert("type".to_string(), Value::String("Polygon".to_string()));
            obj.insert("coordinates".to_string(), rings_value(rings));
        }
        PolygonGeometry::MultiPolygon(polys) => {
            obj.insert(
                "type".to_string(),
                Value::String("MultiPolygon".to_string()),
            );
            obj.insert(
                "coordinates".to_string(),
                Value::Array(polys.iter().map(|rings| rings_value(rings)).collect()),
            );
        }
    }
    Value::Object(obj)
}

fn rings_value(rings: &[Ring]) -> Value {
    Value::Array(
        rings
            .iter()
            .map(|ring| Value::Array(ring.iter().map(point_coords).collect()))
            .collect(),
    )
}

fn point_coords(p: &GeoPoint) -> Value {
    Value::Array(vec![Value::from(p.lon_deg), Value::from(p.lat_deg)])
}

#[cfg(test)]
mod tests {
    use super::{CountrySet, CountrySetError, PolygonGeometry, geometry_to_geojson_value};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn square_feature(name: &str, x0: f64, y0: f64) -> serde_json::Value {
        json!({
            "type": "Feature",
            "properties": { "NAME": name },
            "geometry": {
                "type": "Polygon",
                "coordinates": [[
                    [x0, y0], [x0 + 10.0, y0], [x0 + 10.0, y0 + 10.0], [x0, y0 + 10.0]
                ]]
            }
        })
    }

    #[test]
    fn parses_feature_collection() {
        let doc = json!({
            "type": "FeatureCollection",
            "features": [square_feature("Alpha", 0.0, 0.0), square_feature("Beta", 40.0, 20.0)]
        });
        let set = CountrySet::from_geojson_value(&doc).expect("parse");
        assert_eq!(set.features.len(), 2);
        assert_eq!(set.features[0].name, "Alpha");
        let PolygonGeometry::Polygon(rings) = &set.features[0].geometry else {
            panic!("expected Polygon");
        };
        assert_eq!(rings[0].len(), 4);
        // lon-first on the wire, lat-first in GeoPoint
        assert_eq!(rings[0][1].lon_deg, 10.0);
        assert_eq!(rings[0][1].lat_deg, 0.0);
    }

    #[test]
    fn lowercase_name_property_is_accepted() {
        let doc = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": { "name": "Gamma" },
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [[[[0.0, 0.0], [5.0, 0.0], [5.0, 5.0]]]]
                }
            }]
        });
        let set = CountrySet::from_geojson_value(&doc).expect("parse");
        assert_eq!(set.features[0].name, "Gamma");
    }

    #[test]
    fn rejects_non_feature_collection_root() {
        let err = CountrySet::from_geojson_str(r#"{"type": "Feature"}"#).unwrap_err();
        assert!(matches!(err, CountrySetError::NotAFeatureCollection));

        let err = CountrySet::from_geojson_str("not json").unwrap_err();
        assert!(matches!(err, CountrySetError::Json { .. }));
    }

    #[test]
    fn skips_malformed_features_and_keeps_the_rest() {
        let doc = json!({
            "type": "FeatureCollection",
            "features": [
                // no name
                {
                    "type": "Feature",
                    "properties": {},
                    "geometry": { "type": "Polygon", "coordinates": [[[0.0,0.0],[1.0,0.0],[1.0,1.0]]] }
                },
                // unsupported geometry
                {
                    "type": "Feature",
                    "properties": { "NAME": "Point Place" },
                    "geometry": { "type": "Point", "coordinates": [1.0, 2.0] }
                },
                // degenerate ring (2 points)
                {
                    "type": "Feature",
                    "properties": { "NAME": "Sliver" },
                    "geometry": { "type": "Polygon", "coordinates": [[[0.0,0.0],[1.0,1.0]]] }
                },
                square_feature("Keeper", 0.0, 0.0)
            ]
        });
        let set = CountrySet::from_geojson_value(&doc).expect("parse");
        assert_eq!(set.features.len(), 1);
        assert_eq!(set.features[0].name, "Keeper");
    }

    #[test]
    fn structurally_bad_positions_reject_the_feature() {
        let doc = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": { "NAME": "Holey" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[
                        [0.0, 0.0], [10.0, 0.0], [null, 5.0], [10.0, 10.0], [0.0, 10.0]
                    ]]
                }
            }]
        });
        let set = CountrySet::from_geojson_value(&doc).expect("parse");
        assert_eq!(set.features.len(), 0);
    }

    #[test]
    fn sanitize_drops_non_finite_vertices() {
        use foundation::math::GeoPoint;
        // JSON cannot carry NaN, but programmatic geometry can.
        let ring = vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint {
                lat_deg: f64::NAN,
                lon_deg: 5.0,
            },
            GeoPoint::new(0.0, 10.0),
            GeoPoint::new(10.0, 10.0),
        ];
        let geometry = super::sanitize_geometry(PolygonGeometry::Polygon(vec![ring]), "Test")
            .expect("outer ring survives");
        let PolygonGeometry::Polygon(rings) = geometry else {
            panic!("expected Polygon");
        };
        assert_eq!(rings[0].len(), 3);
    }

    #[test]
    fn geometry_round_trips_to_geojson_value() {
        let doc = json!({
            "type": "FeatureCollection",
            "features": [square_feature("Alpha", 0.0, 0.0)]
        });
        let set = CountrySet::from_geojson_value(&doc).expect("parse");
        let out = geometry_to_geojson_value(&set.features[0].geometry);
        assert_eq!(out, doc["features"][0]["geometry"]);
    }

    #[test]
    fn outer_rings_spans_all_polygons() {
        let geometry = PolygonGeometry::MultiPolygon(vec![
            vec![vec![
                foundation::math::GeoPoint::new(0.0, 0.0),
                foundation::math::GeoPoint::new(0.0, 1.0),
                foundation::math::GeoPoint::new(1.0, 1.0),
            ]],
            vec![vec![
                foundation::math::GeoPoint::new(20.0, 20.0),
                foundation::math::GeoPoint::new(20.0, 21.0),
                foundation::math::GeoPoint::new(21.0, 21.0),
            ]],
        ]);
        assert_eq!(geometry.outer_rings().count(), 2);
        assert!(!geometry.is_empty());
    }
}
