use crate::point::MapPoint;

/// Axis-aligned bounding box in map coordinates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb2 {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Aabb2 {
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Aabb2 { min, max }
    }

    /// Square box centred on `center` extending `half_extent` in each direction.
    pub fn around(center: MapPoint, half_extent: f64) -> Self {
        Aabb2 {
            min: [center.x - half_extent, center.y - half_extent],
            max: [center.x + half_extent, center.y + half_extent],
        }
    }

    /// `minx,miny,maxx,maxy`, the WMS `BBOX` parameter for projected CRSs.
    pub fn to_bbox_param(&self) -> String {
        format!(
            "{},{},{},{}",
            self.min[0], self.min[1], self.max[0], self.max[1]
        )
    }
}
