use formats::{Feature, PolygonGeometry, distinct_vertex_count};
use foundation::MapPoint;

use crate::color::{DrawStyle, FillColor};

/// Identifies one reshape interaction instance attached to the map.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReshapeId(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub struct DrawnPolygon {
    pub feature: Feature,
    pub style: DrawStyle,
}

/// Polygons authored in the current draw session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawBuffer {
    pub completed: Vec<DrawnPolygon>,
    /// Vertices of the polygon currently being sketched, if any.
    pub sketch: Option<Vec<MapPoint>>,
}

impl DrawBuffer {
    /// Completed polygons with no sketch in progress.
    pub fn is_committable(&self) -> bool {
        !self.completed.is_empty() && self.sketch.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum OverlayContent {
    #[default]
    Empty,
    Drawing(DrawBuffer),
    /// A stored feature loaded for reshaping.
    Editing(Feature),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayConflict {
    /// A query load was attempted while a draw session owns the overlay.
    DrawInProgress,
    /// A draw was started while an edit session owns the overlay.
    EditInProgress,
    NoSketch,
    InvalidSketch { distinct_vertices: usize },
    NotEditing,
}

impl std::fmt::Display for OverlayConflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverlayConflict::DrawInProgress => {
                write!(f, "a drawing is in progress; save or cancel it first")
            }
            OverlayConflict::EditInProgress => {
                write!(f, "an edit is in progress; save or cancel it first")
            }
            OverlayConflict::NoSketch => write!(f, "no polygon is being drawn"),
            OverlayConflict::InvalidSketch { distinct_vertices } => write!(
                f,
                "a polygon needs at least 3 distinct vertices (got {distinct_vertices})"
            ),
            OverlayConflict::NotEditing => write!(f, "no feature is loaded for editing"),
        }
    }
}

impl std::error::Error for OverlayConflict {}

/// Transient buffer for the feature(s) under construction or modification.
///
/// Content is either a draw session or an edit session, never both; each
/// producer is refused while the other owns the buffer. At most one reshape
/// interaction is attached at any time.
#[derive(Debug, Default)]
pub struct ScratchOverlay {
    content: OverlayContent,
    reshape: Option<ReshapeId>,
    next_reshape: u64,
}

impl ScratchOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self) -> &OverlayContent {
        &self.content
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.content, OverlayContent::Empty)
    }

    /// Loads a queried feature for editing.
    ///
    /// Replaces a previously loaded feature; refuses while drawing.
    pub fn load(&mut self, feature: Feature) -> Result<(), OverlayConflict> {
        if let OverlayContent::Drawing(_) = self.content {
            return Err(OverlayConflict::DrawInProgress);
        }
        self.content = OverlayContent::Editing(feature);
        Ok(())
    }

    /// Empties the buffer and detaches the reshape interaction.
    ///
    /// Returns the detached interaction, if one was attached. Idempotent.
    pub fn clear(&mut self) -> Option<ReshapeId> {
        self.content = OverlayContent::Empty;
        self.detach_reshape_interaction()
    }

    pub fn current_features(&self) -> Vec<&Feature> {
        match &self.content {
            OverlayContent::Empty => Vec::new(),
            OverlayContent::Drawing(buf) => buf.completed.iter().map(|p| &p.feature).collect(),
            OverlayContent::Editing(feature) => vec![feature],
        }
    }

    /// Attaches a fresh reshape interaction, detaching the previous one first.
    ///
    /// Returns `(attached, detached)`.
    pub fn attach_reshape_interaction(&mut self) -> (ReshapeId, Option<ReshapeId>) {
        let detached = self.detach_reshape_interaction();
        self.next_reshape += 1;
        let id = ReshapeId(self.next_reshape);
        self.reshape = Some(id);
        (id, detached)
    }

    pub fn detach_reshape_interaction(&mut self) -> Option<ReshapeId> {
        self.reshape.take()
    }

    pub fn reshape_interaction(&self) -> Option<ReshapeId> {
        self.reshape
    }

    /// Starts sketching a new polygon, keeping polygons already completed in
    /// this draw session. An unfinished sketch is discarded.
    pub fn begin_sketch(&mut self) -> Result<(), OverlayConflict> {
        match &mut self.content {
            OverlayContent::Editing(_) => Err(OverlayConflict::EditInProgress),
            OverlayContent::Drawing(buf) => {
                buf.sketch = Some(Vec::new());
                Ok(())
            }
            OverlayContent::Empty => {
                self.content = OverlayContent::Drawing(DrawBuffer {
                    completed: Vec::new(),
                    sketch: Some(Vec::new()),
                });
                Ok(())
            }
        }
    }

    pub fn push_vertex(&mut self, at: MapPoint) -> Result<usize, OverlayConflict> {
        let OverlayContent::Drawing(DrawBuffer {
            sketch: Some(vertices),
            ..
        }) = &mut self.content
        else {
            return Err(OverlayConflict::NoSketch);
        };
        vertices.push(at);
        Ok(vertices.len())
    }

    /// Closes the sketch into a polygon tagged with `fill`.
    ///
    /// An invalid sketch is left in place so more vertices can be added.
    pub fn complete_sketch(&mut self, fill: FillColor) -> Result<&DrawnPolygon, OverlayConflict> {
        let OverlayContent::Drawing(buf) = &mut self.content else {
            return Err(OverlayConflict::NoSketch);
        };
        let Some(vertices) = &buf.sketch else {
            return Err(OverlayConflict::NoSketch);
        };

        let geometry = PolygonGeometry::from_exterior(vertices.clone());
        if !geometry.is_valid() {
            let distinct_vertices = distinct_vertex_count(vertices);
            return Err(OverlayConflict::InvalidSketch { distinct_vertices });
        }

        let mut feature = Feature::draft(geometry);
        feature.set_color(fill.as_str());
        buf.sketch = None;
        buf.completed.push(DrawnPolygon {
            feature,
            style: DrawStyle::for_fill(fill),
        });
        buf.completed.last().ok_or(OverlayConflict::NoSketch)
    }

    pub fn editing_feature_mut(&mut self) -> Result<&mut Feature, OverlayConflict> {
        match &mut self.content {
            OverlayContent::Editing(feature) => Ok(feature),
            _ => Err(OverlayConflict::NotEditing),
        }
    }
}
