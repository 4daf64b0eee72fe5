use foundation::MapPoint;
use serde_json::{Map, Number, Value};

/// Name of the only property the editor inspects.
pub const COLOR_PROPERTY: &str = "color";

/// Store-assigned feature identifier.
///
/// The map service and the backend use either strings (`"imunim.12"`) or
/// numbers; the wire form is kept so it can be sent back verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FeatureId {
    Text(String),
    /// Any JSON number, including ids above `i64::MAX` and non-integers.
    Number(Number),
}

impl FeatureId {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(FeatureId::Text(s.clone())),
            Value::Number(n) => Some(FeatureId::Number(n.clone())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            FeatureId::Text(s) => Value::String(s.clone()),
            FeatureId::Number(n) => Value::Number(n.clone()),
        }
    }
}

impl std::fmt::Display for FeatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureId::Text(s) => f.write_str(s),
            FeatureId::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for FeatureId {
    fn from(s: &str) -> Self {
        FeatureId::Text(s.to_string())
    }
}

impl From<i64> for FeatureId {
    fn from(n: i64) -> Self {
        FeatureId::Number(Number::from(n))
    }
}

/// Which GeoJSON type a polygon arrived as, so edits are written back in kind.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum PolygonEncoding {
    #[default]
    Polygon,
    /// A `MultiPolygon` holding exactly one polygon.
    SingleMultiPolygon,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GeometryEditError {
    NoSuchRing { ring: usize },
    NoSuchVertex { ring: usize, index: usize },
    NonFiniteCoordinate,
}

impl std::fmt::Display for GeometryEditError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryEditError::NoSuchRing { ring } => write!(f, "polygon has no ring {ring}"),
            GeometryEditError::NoSuchVertex { ring, index } => {
                write!(f, "ring {ring} has no vertex {index}")
            }
            GeometryEditError::NonFiniteCoordinate => write!(f, "coordinate is not finite"),
        }
    }
}

impl std::error::Error for GeometryEditError {}

/// Polygon rings in the map CRS. The first ring is the exterior.
///
/// Rings are stored open: the closing vertex is implied and never repeated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolygonGeometry {
    pub rings: Vec<Vec<MapPoint>>,
    pub encoding: PolygonEncoding,
}

impl PolygonGeometry {
    pub fn new(rings: Vec<Vec<MapPoint>>) -> Self {
        let rings = rings
            .into_iter()
            .map(|mut ring| {
                drop_closing_duplicate(&mut ring);
                ring
            })
            .collect();
        Self {
            rings,
            encoding: PolygonEncoding::Polygon,
        }
    }

    pub fn from_exterior(exterior: Vec<MapPoint>) -> Self {
        Self::new(vec![exterior])
    }

    pub fn exterior(&self) -> Option<&[MapPoint]> {
        self.rings.first().map(Vec::as_slice)
    }

    pub fn vertex_count(&self) -> usize {
        self.rings.iter().map(Vec::len).sum()
    }

    /// An exterior ring with at least three distinct vertices.
    pub fn is_valid(&self) -> bool {
        let Some(exterior) = self.exterior() else {
            return false;
        };
        distinct_vertex_count(exterior) >= 3
            && self.rings.iter().flatten().all(MapPoint::is_finite)
    }

    pub fn move_vertex(
        &mut self,
        ring: usize,
        index: usize,
        to: MapPoint,
    ) -> Result<(), GeometryEditError> {
        if !to.is_finite() {
            return Err(GeometryEditError::NonFiniteCoordinate);
        }
        let r = self
            .rings
            .get_mut(ring)
            .ok_or(GeometryEditError::NoSuchRing { ring })?;
        let v = r
            .get_mut(index)
            .ok_or(GeometryEditError::NoSuchVertex { ring, index })?;
        *v = to;
        Ok(())
    }

    /// Rings with the closing vertex appended, as GeoJSON requires.
    pub fn closed_rings(&self) -> Vec<Vec<MapPoint>> {
        self.rings
            .iter()
            .map(|ring| {
                let mut closed = ring.clone();
                if let Some(first) = ring.first() {
                    closed.push(*first);
                }
                closed
            })
            .collect()
    }
}

pub(crate) fn drop_closing_duplicate(points: &mut Vec<MapPoint>) {
    if points.len() >= 2 {
        let first = points[0];
        if let Some(last) = points.last()
            && first.approx_eq(last, 1e-9)
        {
            points.pop();
        }
    }
}

/// Vertices of `ring` that differ from every earlier vertex.
pub fn distinct_vertex_count(ring: &[MapPoint]) -> usize {
    let mut seen: Vec<MapPoint> = Vec::with_capacity(ring.len());
    for p in ring {
        if !seen.iter().any(|s| s.approx_eq(p, 1e-9)) {
            seen.push(*p);
        }
    }
    seen.len()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// `None` until the store has persisted the feature.
    pub id: Option<FeatureId>,
    pub geometry: PolygonGeometry,
    pub properties: Map<String, Value>,
}

impl Feature {
    /// A freshly drawn, not yet persisted feature.
    pub fn draft(geometry: PolygonGeometry) -> Self {
        Self {
            id: None,
            geometry,
            properties: Map::new(),
        }
    }

    pub fn color(&self) -> Option<&str> {
        self.properties.get(COLOR_PROPERTY).and_then(Value::as_str)
    }

    pub fn set_color(&mut self, color: impl Into<String>) {
        self.properties
            .insert(COLOR_PROPERTY.to_string(), Value::String(color.into()));
    }
}
