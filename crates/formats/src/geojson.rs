use foundation::MapPoint;
use serde_json::{Map, Value};

use crate::feature::{Feature, FeatureId, PolygonEncoding, PolygonGeometry, drop_closing_duplicate};

#[derive(Debug, Clone, PartialEq)]
pub enum FeatureCodecError {
    Json(String),
    NotAFeatureCollection,
    InvalidFeature { index: usize, reason: String },
}

impl std::fmt::Display for FeatureCodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureCodecError::Json(e) => write!(f, "JSON parse error: {e}"),
            FeatureCodecError::NotAFeatureCollection => {
                write!(f, "expected GeoJSON FeatureCollection")
            }
            FeatureCodecError::InvalidFeature { index, reason } => {
                write!(f, "invalid feature at index {index}: {reason}")
            }
        }
    }
}

impl std::error::Error for FeatureCodecError {}

/// A GeoJSON `FeatureCollection` restricted to polygon features.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    /// Parses a feature-info response body and decodes its first feature.
    pub fn first_from_geojson_str(payload: &str) -> Result<Option<Feature>, FeatureCodecError> {
        let value: Value =
            serde_json::from_str(payload).map_err(|e| FeatureCodecError::Json(e.to_string()))?;
        Self::first_from_geojson_value(&value)
    }

    /// Decodes only the first feature, which is all a point query needs.
    ///
    /// An empty collection is `Ok(None)`; features after the first are not
    /// inspected, so a malformed tail does not fail the lookup.
    pub fn first_from_geojson_value(value: &Value) -> Result<Option<Feature>, FeatureCodecError> {
        let obj = value
            .as_object()
            .ok_or(FeatureCodecError::NotAFeatureCollection)?;
        if obj.get("type").and_then(Value::as_str) != Some("FeatureCollection") {
            return Err(FeatureCodecError::NotAFeatureCollection);
        }
        let features_val = obj
            .get("features")
            .and_then(Value::as_array)
            .ok_or(FeatureCodecError::NotAFeatureCollection)?;
        let Some(first) = features_val.first() else {
            return Ok(None);
        };
        decode_feature(first)
            .map(Some)
            .map_err(|reason| FeatureCodecError::InvalidFeature { index: 0, reason })
    }

    pub fn to_geojson_value(&self) -> Value {
        let mut root = Map::new();
        root.insert(
            "type".to_string(),
            Value::String("FeatureCollection".to_string()),
        );
        root.insert(
            "features".to_string(),
            Value::Array(self.features.iter().map(feature_to_geojson_value).collect()),
        );
        Value::Object(root)
    }

}

fn feature_to_geojson_value(feature: &Feature) -> Value {
    let mut obj = Map::new();
    obj.insert("type".to_string(), Value::String("Feature".to_string()));
    if let Some(id) = &feature.id {
        obj.insert("id".to_string(), id.to_value());
    }
    obj.insert(
        "geometry".to_string(),
        geometry_to_geojson_value(&feature.geometry),
    );
    obj.insert(
        "properties".to_string(),
        Value::Object(feature.properties.clone()),
    );
    Value::Object(obj)
}

fn geometry_to_geojson_value(geom: &PolygonGeometry) -> Value {
    let rings: Vec<Value> = geom
        .closed_rings()
        .iter()
        .map(|ring| Value::Array(ring.iter().map(point_coords).collect()))
        .collect();

    let mut obj = Map::new();
    match geom.encoding {
        PolygonEncoding::Polygon => {
            obj.insert("type".to_string(), Value::String("Polygon".to_string()));
            obj.insert("coordinates".to_string(), Value::Array(rings));
        }
        PolygonEncoding::SingleMultiPolygon => {
            obj.insert(
                "type".to_string(),
                Value::String("MultiPolygon".to_string()),
            );
            obj.insert(
                "coordinates".to_string(),
                Value::Array(vec![Value::Array(rings)]),
            );
        }
    }
    Value::Object(obj)
}

fn point_coords(p: &MapPoint) -> Value {
    Value::Array(vec![Value::from(p.x), Value::from(p.y)])
}

fn decode_feature(value: &Value) -> Result<Feature, String> {
    let obj = value
        .as_object()
        .ok_or("feature must be an object".to_string())?;
    match obj.get("type").and_then(Value::as_str) {
        Some("Feature") => {}
        Some(other) => return Err(format!("unexpected feature type: {other}")),
        None => return Err("feature missing type".to_string()),
    }

    let id = obj.get("id").and_then(FeatureId::from_value);

    let properties = match obj.get("properties") {
        Some(Value::Object(props)) => props.clone(),
        Some(Value::Null) | None => Map::new(),
        Some(_) => return Err("properties must be an object".to_string()),
    };

    let geometry_val = obj
        .get("geometry")
        .ok_or("feature missing geometry".to_string())?;
    let geometry = parse_geometry(geometry_val)?;

    Ok(Feature {
        id,
        geometry,
        properties,
    })
}

fn parse_geometry(value: &Value) -> Result<PolygonGeometry, String> {
    let obj = value
        .as_object()
        .ok_or("geometry must be an object".to_string())?;
    let ty = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or("geometry missing type".to_string())?;
    let coords = obj
        .get("coordinates")
        .ok_or("geometry missing coordinates".to_string())?;

    match ty {
        "Polygon" => Ok(PolygonGeometry {
            rings: parse_polygon(coords)?,
            encoding: PolygonEncoding::Polygon,
        }),
        "MultiPolygon" => {
            let polys = coords
                .as_array()
                .ok_or("MultiPolygon coordinates must be an array of polygons".to_string())?;
            match polys.as_slice() {
                [single] => Ok(PolygonGeometry {
                    rings: parse_polygon(single)?,
                    encoding: PolygonEncoding::SingleMultiPolygon,
                }),
                _ => Err(format!(
                    "MultiPolygon with {} parts is not editable",
                    polys.len()
                )),
            }
        }
        other => Err(format!("unsupported geometry type: {other}")),
    }
}

fn parse_point(coords: &Value) -> Result<MapPoint, String> {
    let arr = coords
        .as_array()
        .ok_or("position must be an array".to_string())?;
    if arr.len() < 2 {
        return Err("position must have [x, y]".to_string());
    }
    let x = arr[0].as_f64().ok_or("x must be a number".to_string())?;
    let y = arr[1].as_f64().ok_or("y must be a number".to_string())?;
    Ok(MapPoint::new(x, y))
}

fn parse_polygon(coords: &Value) -> Result<Vec<Vec<MapPoint>>, String> {
    let rings = coords
        .as_array()
        .ok_or("Polygon coordinates must be an array of rings".to_string())?;
    if rings.is_empty() {
        return Err("Polygon has no rings".to_string());
    }
    let mut out = Vec::with_capacity(rings.len());
    for ring in rings {
        let positions = ring
            .as_array()
            .ok_or("ring must be an array of positions".to_string())?;
        let mut points = Vec::with_capacity(positions.len());
        for p in positions {
            points.push(parse_point(p)?);
        }
        drop_closing_duplicate(&mut points);
        out.push(points);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::{FeatureCodecError, FeatureCollection, geometry_to_geojson_value};
    use crate::feature::{FeatureId, PolygonEncoding};
    use foundation::MapPoint;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn geoserver_response() -> serde_json::Value {
        json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "id": "imunim.12",
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [[[
                        [700000.0, 3450000.0],
                        [700100.0, 3450000.0],
                        [700100.0, 3450100.0],
                        [700000.0, 3450000.0]
                    ]]]
                },
                "geometry_name": "geom",
                "properties": { "color": "black", "is_deleted": false }
            }],
            "totalFeatures": "unknown",
            "numberReturned": 1,
            "crs": { "type": "name", "properties": { "name": "urn:ogc:def:crs:EPSG::32636" } }
        })
    }

    #[test]
    fn decodes_geoserver_feature_info() {
        let f = FeatureCollection::first_from_geojson_value(&geoserver_response())
            .expect("decode")
            .expect("hit");
        assert_eq!(f.id, Some(FeatureId::from("imunim.12")));
        assert_eq!(f.color(), Some("black"));
        assert_eq!(f.geometry.encoding, PolygonEncoding::SingleMultiPolygon);
        assert_eq!(f.geometry.rings[0].len(), 3);
    }

    #[test]
    fn multipolygon_is_written_back_in_kind() {
        let f = FeatureCollection::first_from_geojson_value(&geoserver_response())
            .expect("decode")
            .expect("hit");
        let out = geometry_to_geojson_value(&f.geometry);
        assert_eq!(
            out,
            json!({
                "type": "MultiPolygon",
                "coordinates": [[[
                    [700000.0, 3450000.0],
                    [700100.0, 3450000.0],
                    [700100.0, 3450100.0],
                    [700000.0, 3450000.0]
                ]]]
            })
        );
    }

    #[test]
    fn first_feature_of_empty_collection_is_none() {
        let empty = json!({ "type": "FeatureCollection", "features": [] });
        assert_eq!(FeatureCollection::first_from_geojson_value(&empty), Ok(None));
    }

    #[test]
    fn first_feature_ignores_malformed_tail() {
        let mut v = geoserver_response();
        v["features"]
            .as_array_mut()
            .expect("array")
            .push(json!({ "type": "Feature" }));
        let first = FeatureCollection::first_from_geojson_value(&v).expect("decode");
        assert_eq!(
            first.and_then(|f| f.id),
            Some(FeatureId::from("imunim.12"))
        );

        // The same feature in first position is rejected.
        v["features"].as_array_mut().expect("array").reverse();
        assert!(FeatureCollection::first_from_geojson_value(&v).is_err());
    }

    #[test]
    fn rejects_non_collections_and_bad_geometry() {
        assert_eq!(
            FeatureCollection::first_from_geojson_value(&json!({ "type": "Feature" })),
            Err(FeatureCodecError::NotAFeatureCollection)
        );
        let point = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [1.0, 2.0] },
                "properties": {}
            }]
        });
        let err = FeatureCollection::first_from_geojson_value(&point).unwrap_err();
        assert_eq!(
            err,
            FeatureCodecError::InvalidFeature {
                index: 0,
                reason: "unsupported geometry type: Point".to_string()
            }
        );
        assert!(matches!(
            FeatureCollection::first_from_geojson_str("{not json"),
            Err(FeatureCodecError::Json(_))
        ));
    }

    #[test]
    fn drafts_encode_without_id_and_with_closed_ring() {
        let mut f = crate::feature::Feature::draft(crate::feature::PolygonGeometry::from_exterior(
            vec![
                MapPoint::new(0.0, 0.0),
                MapPoint::new(4.0, 0.0),
                MapPoint::new(4.0, 4.0),
                MapPoint::new(0.0, 4.0),
            ],
        ));
        f.set_color("yellow");
        let v = FeatureCollection::new(vec![f]).to_geojson_value();
        assert_eq!(
            v,
            json!({
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[
                            [0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0], [0.0, 0.0]
                        ]]
                    },
                    "properties": { "color": "yellow" }
                }]
            })
        );
    }
}
