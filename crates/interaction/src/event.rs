use formats::{Feature, PolygonGeometry};
use foundation::{MapPoint, Resolution, Ticket};

use crate::color::FillColor;
use crate::error::{CommitError, QueryError};

/// Everything the state machine reacts to: operator gestures and the
/// responses to requests it issued earlier.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Primary click; loads the feature under the pointer for editing.
    SingleClick { at: MapPoint, resolution: Resolution },
    /// Soft-deletes the feature under the pointer.
    DoubleClick { at: MapPoint, resolution: Resolution },
    /// Context-menu action; toggles the color of the feature under the pointer.
    SecondaryAction { at: MapPoint, resolution: Resolution },

    DrawStart,
    DrawVertex { at: MapPoint },
    DrawComplete,
    SelectColor(FillColor),

    /// Replaces the loaded feature's geometry.
    Reshape { geometry: PolygonGeometry },
    MoveVertex { ring: usize, index: usize, to: MapPoint },

    Commit,
    Cancel,

    QueryResolved {
        ticket: Ticket,
        outcome: Result<Option<Feature>, QueryError>,
    },
    CommitResolved {
        ticket: Ticket,
        outcome: Result<String, CommitError>,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::SingleClick { .. } => "single_click",
            Event::DoubleClick { .. } => "double_click",
            Event::SecondaryAction { .. } => "secondary_action",
            Event::DrawStart => "draw_start",
            Event::DrawVertex { .. } => "draw_vertex",
            Event::DrawComplete => "draw_complete",
            Event::SelectColor(_) => "select_color",
            Event::Reshape { .. } => "reshape",
            Event::MoveVertex { .. } => "move_vertex",
            Event::Commit => "commit",
            Event::Cancel => "cancel",
            Event::QueryResolved { .. } => "query_resolved",
            Event::CommitResolved { .. } => "commit_resolved",
        }
    }
}
