use foundation::{MapPoint, Resolution, Ticket};
use protocol::Mutation;

use crate::overlay::ReshapeId;

/// Side effects requested by a transition, in the order they must run.
///
/// Request effects carry the ticket their response has to be fed back with.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    QueryFeatureInfo {
        ticket: Ticket,
        at: MapPoint,
        resolution: Resolution,
    },
    SendMutation {
        ticket: Ticket,
        mutation: Mutation,
    },
    AttachReshape(ReshapeId),
    DetachReshape(ReshapeId),
    /// Make the tile layer refetch.
    InvalidateTiles,
}

/// Operator controls whose availability follows the machine state.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Affordances {
    /// Save the drawn polygons.
    pub save_drawing: bool,
    /// Save the reshaped feature.
    pub save_edit: bool,
    pub cancel: bool,
    pub draw: bool,
}
