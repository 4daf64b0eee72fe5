/// A position in the map's projected coordinate system (metres for UTM).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MapPoint {
    pub x: f64,
    pub y: f64,
}

impl MapPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Coordinate-wise comparison with an absolute tolerance.
    pub fn approx_eq(&self, other: &Self, eps: f64) -> bool {
        (self.x - other.x).abs() <= eps && (self.y - other.y).abs() <= eps
    }
}

/// View resolution in map units per screen pixel.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Resolution(f64);

impl Resolution {
    /// Returns `None` unless `units_per_px` is finite and strictly positive.
    pub fn new(units_per_px: f64) -> Option<Self> {
        (units_per_px.is_finite() && units_per_px > 0.0).then_some(Self(units_per_px))
    }

    pub fn units_per_px(self) -> f64 {
        self.0
    }

    /// Map-space length covered by `px` screen pixels.
    pub fn span(self, px: f64) -> f64 {
        self.0 * px
    }
}

#[cfg(test)]
mod tests {
    use super::{MapPoint, Resolution};

    #[test]
    fn resolution_rejects_degenerate_values() {
        assert!(Resolution::new(0.0).is_none());
        assert!(Resolution::new(-2.0).is_none());
        assert!(Resolution::new(f64::NAN).is_none());
        assert!(Resolution::new(f64::INFINITY).is_none());
        assert_eq!(Resolution::new(2.5).map(|r| r.span(4.0)), Some(10.0));
    }

    #[test]
    fn approx_eq_uses_absolute_tolerance() {
        let a = MapPoint::new(700_000.0, 3_450_000.0);
        let b = MapPoint::new(700_000.0 + 1e-10, 3_450_000.0);
        assert!(a.approx_eq(&b, 1e-9));
        assert!(!a.approx_eq(&MapPoint::new(700_001.0, 3_450_000.0), 1e-9));
    }
}
