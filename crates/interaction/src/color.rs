/// Fill colors the store recognizes for polygons.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum FillColor {
    #[default]
    Yellow,
    Black,
}

impl FillColor {
    pub fn as_str(self) -> &'static str {
        match self {
            FillColor::Yellow => "yellow",
            FillColor::Black => "black",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "yellow" => Some(FillColor::Yellow),
            "black" => Some(FillColor::Black),
            _ => None,
        }
    }

    /// Recolor rule: `black` becomes `yellow`; anything else, including a
    /// missing or unrecognized value, becomes `black`.
    pub fn toggled_from(current: Option<&str>) -> Self {
        match current {
            Some("black") => FillColor::Yellow,
            _ => FillColor::Black,
        }
    }
}

impl std::fmt::Display for FillColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stroke applied to every freshly drawn polygon.
pub const DRAW_STROKE_COLOR: &str = "black";
pub const DRAW_STROKE_WIDTH_PX: f64 = 2.0;

/// Render style of a drawn, not yet persisted polygon.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DrawStyle {
    pub fill: FillColor,
    pub stroke: &'static str,
    pub stroke_width_px: f64,
}

impl DrawStyle {
    pub fn for_fill(fill: FillColor) -> Self {
        Self {
            fill,
            stroke: DRAW_STROKE_COLOR,
            stroke_width_px: DRAW_STROKE_WIDTH_PX,
        }
    }
}
