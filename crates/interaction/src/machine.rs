//! Interaction state machine.
//!
//! One entry point, [`InteractionMachine::handle`], takes an [`Event`] and
//! returns the resulting [`Transition`]: the mode afterwards and the side
//! effects the host must run. Responses to issued requests come back in as
//! events carrying the request's ticket.
//!
//! Ordering rules:
//! - At most one mutation is outstanding; gestures that would issue another
//!   one, or touch the overlay it was built from, are refused until it
//!   resolves.
//! - Tile invalidation is only requested after a confirmed mutation.
//! - A query response is applied only if it answers the latest query and the
//!   mode has not changed since it was issued; anything else is stale and is
//!   dropped.

use formats::{Feature, FeatureId, PolygonGeometry};
use foundation::{Epoch, MapPoint, Resolution, Ticket, TicketIssuer};
use protocol::{Mutation, MutationKind};
use tracing::{debug, error, info, warn};

use crate::color::FillColor;
use crate::effect::{Affordances, Effect};
use crate::error::{CommitError, QueryError};
use crate::event::Event;
use crate::notice::{Notice, NoticeBus, Severity};
use crate::overlay::{OverlayContent, ScratchOverlay};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Mode {
    Idle,
    /// Authoring new polygons that are not yet persisted.
    Drawing,
    /// Reshaping a stored feature loaded from a query.
    Editing,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Mode::Idle => "idle",
            Mode::Drawing => "drawing",
            Mode::Editing => "editing",
        };
        f.write_str(s)
    }
}

/// What a feature-info lookup was issued for.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum QueryIntent {
    Edit,
    Delete,
    Recolor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingQuery {
    pub ticket: Ticket,
    pub epoch: Epoch,
    pub intent: QueryIntent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingCommit {
    pub ticket: Ticket,
    pub kind: MutationKind,
    pub target: Option<FeatureId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub mode: Mode,
    pub effects: Vec<Effect>,
}

#[derive(Debug)]
pub struct InteractionMachine {
    overlay: ScratchOverlay,
    fill: FillColor,
    epoch: Epoch,
    tickets: TicketIssuer,
    pending_query: Option<PendingQuery>,
    pending_commit: Option<PendingCommit>,
    notices: NoticeBus,
}

impl Default for InteractionMachine {
    fn default() -> Self {
        Self::new(FillColor::default())
    }
}

impl InteractionMachine {
    pub fn new(fill: FillColor) -> Self {
        Self {
            overlay: ScratchOverlay::new(),
            fill,
            epoch: Epoch::default(),
            tickets: TicketIssuer::new(),
            pending_query: None,
            pending_commit: None,
            notices: NoticeBus::new(),
        }
    }

    pub fn mode(&self) -> Mode {
        match self.overlay.content() {
            OverlayContent::Empty => Mode::Idle,
            OverlayContent::Drawing(_) => Mode::Drawing,
            OverlayContent::Editing(_) => Mode::Editing,
        }
    }

    pub fn overlay(&self) -> &ScratchOverlay {
        &self.overlay
    }

    pub fn fill(&self) -> FillColor {
        self.fill
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn pending_query(&self) -> Option<&PendingQuery> {
        self.pending_query.as_ref()
    }

    pub fn pending_commit(&self) -> Option<&PendingCommit> {
        self.pending_commit.as_ref()
    }

    /// Completed polygons awaiting a create.
    pub fn has_uncommitted_drawing(&self) -> bool {
        matches!(self.overlay.content(), OverlayContent::Drawing(buf) if !buf.completed.is_empty())
    }

    pub fn affordances(&self) -> Affordances {
        let idle_commit = self.pending_commit.is_none();
        let (save_drawing, save_edit) = match self.overlay.content() {
            OverlayContent::Empty => (false, false),
            OverlayContent::Drawing(buf) => (buf.is_committable(), false),
            OverlayContent::Editing(_) => (false, true),
        };
        Affordances {
            save_drawing: save_drawing && idle_commit,
            save_edit: save_edit && idle_commit,
            cancel: self.mode() != Mode::Idle && idle_commit,
            draw: self.mode() != Mode::Editing && idle_commit,
        }
    }

    pub fn notices(&self) -> &[Notice] {
        self.notices.notices()
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }

    pub fn handle(&mut self, event: Event) -> Transition {
        let before = self.mode();
        let name = event.name();
        let effects = match event {
            Event::SingleClick { at, resolution } => self.on_single_click(at, resolution),
            Event::DoubleClick { at, resolution } => {
                self.on_lookup_for_commit(QueryIntent::Delete, at, resolution)
            }
            Event::SecondaryAction { at, resolution } => {
                self.on_lookup_for_commit(QueryIntent::Recolor, at, resolution)
            }
            Event::DrawStart => self.on_draw_start(),
            Event::DrawVertex { at } => self.on_draw_vertex(at),
            Event::DrawComplete => self.on_draw_complete(),
            Event::SelectColor(color) => {
                info!(color = %color, "fill color selected");
                self.fill = color;
                Vec::new()
            }
            Event::Reshape { geometry } => self.on_reshape(geometry),
            Event::MoveVertex { ring, index, to } => self.on_move_vertex(ring, index, to),
            Event::Commit => self.on_commit(),
            Event::Cancel => self.on_cancel(),
            Event::QueryResolved { ticket, outcome } => self.on_query_resolved(ticket, outcome),
            Event::CommitResolved { ticket, outcome } => self.on_commit_resolved(ticket, outcome),
        };

        let mode = self.mode();
        if mode != before {
            info!(event = name, from = %before, to = %mode, epoch = self.epoch.0, "mode changed");
        }
        Transition { mode, effects }
    }

    fn notify(&mut self, severity: Severity, message: impl Into<String>) {
        self.notices.emit(self.epoch, severity, message);
    }

    fn begin_epoch(&mut self) {
        self.epoch = self.epoch.next();
    }

    fn refuse_if_committing(&mut self, gesture: &str) -> bool {
        if let Some(pending) = &self.pending_commit {
            let message = format!("{gesture} ignored: a {} is still in progress", pending.kind);
            debug!("{message}");
            self.notify(Severity::Warning, message);
            return true;
        }
        false
    }

    fn issue_query(
        &mut self,
        intent: QueryIntent,
        at: MapPoint,
        resolution: Resolution,
    ) -> Vec<Effect> {
        let ticket = self.tickets.issue();
        if let Some(prev) = self.pending_query.replace(PendingQuery {
            ticket,
            epoch: self.epoch,
            intent,
        }) {
            debug!(superseded = prev.ticket.0, ticket = ticket.0, "query superseded");
        }
        debug!(ticket = ticket.0, ?intent, x = at.x, y = at.y, "feature-info query issued");
        vec![Effect::QueryFeatureInfo {
            ticket,
            at,
            resolution,
        }]
    }

    fn issue_mutation(&mut self, mutation: Mutation) -> Vec<Effect> {
        let ticket = self.tickets.issue();
        let kind = mutation.kind();
        let target = mutation.target().cloned();
        match &target {
            Some(id) => info!(ticket = ticket.0, %kind, id = %id, "mutation issued"),
            None => info!(ticket = ticket.0, %kind, "mutation issued"),
        }
        self.pending_commit = Some(PendingCommit {
            ticket,
            kind,
            target,
        });
        vec![Effect::SendMutation { ticket, mutation }]
    }

    fn on_single_click(&mut self, at: MapPoint, resolution: Resolution) -> Vec<Effect> {
        if self.mode() == Mode::Drawing {
            debug!("click ignored while drawing");
            return Vec::new();
        }
        if self.refuse_if_committing("click") {
            return Vec::new();
        }
        self.issue_query(QueryIntent::Edit, at, resolution)
    }

    fn on_lookup_for_commit(
        &mut self,
        intent: QueryIntent,
        at: MapPoint,
        resolution: Resolution,
    ) -> Vec<Effect> {
        let gesture = match intent {
            QueryIntent::Delete => "delete",
            _ => "recolor",
        };
        if self.mode() != Mode::Idle {
            let message = format!(
                "{gesture} ignored: save or cancel the current {} first",
                self.mode()
            );
            self.notify(Severity::Warning, message);
            return Vec::new();
        }
        if self.refuse_if_committing(gesture) {
            return Vec::new();
        }
        self.issue_query(intent, at, resolution)
    }

    fn on_draw_start(&mut self) -> Vec<Effect> {
        if self.refuse_if_committing("draw") {
            return Vec::new();
        }
        let was_idle = self.mode() == Mode::Idle;
        match self.overlay.begin_sketch() {
            Ok(()) => {
                if was_idle {
                    self.begin_epoch();
                }
                debug!("sketch started");
            }
            Err(conflict) => {
                warn!(%conflict, "draw refused");
                self.notify(Severity::Warning, conflict.to_string());
            }
        }
        Vec::new()
    }

    fn on_draw_vertex(&mut self, at: MapPoint) -> Vec<Effect> {
        if !at.is_finite() {
            self.notify(Severity::Warning, "vertex ignored: coordinate is not finite");
            return Vec::new();
        }
        if let Err(conflict) = self.overlay.push_vertex(at) {
            debug!(%conflict, "vertex ignored");
        }
        Vec::new()
    }

    fn on_draw_complete(&mut self) -> Vec<Effect> {
        let fill = self.fill;
        match self.overlay.complete_sketch(fill) {
            Ok(drawn) => {
                let vertices = drawn.feature.geometry.vertex_count();
                info!(vertices, color = %fill, "polygon drawn");
            }
            Err(conflict) => {
                warn!(%conflict, "draw completion refused");
                self.notify(Severity::Warning, conflict.to_string());
            }
        }
        Vec::new()
    }

    fn on_reshape(&mut self, mut geometry: PolygonGeometry) -> Vec<Effect> {
        if self.refuse_if_committing("reshape") {
            return Vec::new();
        }
        if !geometry.is_valid() {
            self.notify(Severity::Warning, "reshape ignored: polygon would be degenerate");
            return Vec::new();
        }
        match self.overlay.editing_feature_mut() {
            Ok(feature) => {
                geometry.encoding = feature.geometry.encoding;
                feature.geometry = geometry;
            }
            Err(conflict) => self.notify(Severity::Warning, conflict.to_string()),
        }
        Vec::new()
    }

    fn on_move_vertex(&mut self, ring: usize, index: usize, to: MapPoint) -> Vec<Effect> {
        if self.refuse_if_committing("reshape") {
            return Vec::new();
        }
        let result = match self.overlay.editing_feature_mut() {
            Ok(feature) => {
                let mut candidate = feature.geometry.clone();
                match candidate.move_vertex(ring, index, to) {
                    Ok(()) if candidate.is_valid() => {
                        feature.geometry = candidate;
                        Ok(())
                    }
                    Ok(()) => Err("polygon would be degenerate".to_string()),
                    Err(e) => Err(e.to_string()),
                }
            }
            Err(conflict) => Err(conflict.to_string()),
        };
        if let Err(reason) = result {
            self.notify(Severity::Warning, format!("vertex move ignored: {reason}"));
        }
        Vec::new()
    }

    fn on_commit(&mut self) -> Vec<Effect> {
        if self.refuse_if_committing("save") {
            return Vec::new();
        }
        let planned = match self.overlay.content() {
            OverlayContent::Empty => Err(None),
            OverlayContent::Drawing(buf) if buf.sketch.is_some() => Err(Some((
                Severity::Warning,
                "finish the polygon before saving",
            ))),
            OverlayContent::Drawing(buf) if buf.completed.is_empty() => Err(None),
            OverlayContent::Drawing(buf) => Ok(Mutation::Create {
                features: buf.completed.iter().map(|p| p.feature.clone()).collect(),
            }),
            OverlayContent::Editing(Feature {
                id: Some(id),
                geometry,
                properties,
            }) => Ok(Mutation::Edit {
                id: id.clone(),
                geometry: geometry.clone(),
                properties: properties.clone(),
            }),
            OverlayContent::Editing(_) => Err(Some((
                Severity::Error,
                "loaded feature has no identifier; cannot save",
            ))),
        };

        match planned {
            Ok(mutation) => self.issue_mutation(mutation),
            Err(Some((severity, message))) => {
                self.notify(severity, message);
                Vec::new()
            }
            Err(None) => {
                info!("No feature available to save.");
                self.notify(Severity::Info, "nothing to save");
                Vec::new()
            }
        }
    }

    fn on_cancel(&mut self) -> Vec<Effect> {
        if self.mode() == Mode::Idle {
            return Vec::new();
        }
        if self.refuse_if_committing("cancel") {
            return Vec::new();
        }
        let mut effects = Vec::new();
        if let Some(detached) = self.overlay.clear() {
            effects.push(Effect::DetachReshape(detached));
        }
        self.begin_epoch();
        info!("interaction cancelled");
        effects
    }

    fn on_query_resolved(
        &mut self,
        ticket: Ticket,
        outcome: Result<Option<Feature>, QueryError>,
    ) -> Vec<Effect> {
        let pending = match self.pending_query.take() {
            Some(p) if p.ticket == ticket && p.epoch == self.epoch => p,
            other => {
                warn!(ticket = ticket.0, "stale feature-info response dropped");
                self.pending_query = other;
                return Vec::new();
            }
        };

        let found = match outcome {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, "feature-info lookup failed; treating as no feature");
                self.notify(Severity::Warning, format!("{e}; no feature selected"));
                return Vec::new();
            }
        };

        let Some(feature) = found else {
            info!("No feature found at this location.");
            self.notify(Severity::Info, "no feature found at this location");
            return Vec::new();
        };

        match pending.intent {
            QueryIntent::Edit => self.load_for_edit(feature),
            QueryIntent::Delete => {
                let Some(id) = self.commit_target(&feature, "delete") else {
                    return Vec::new();
                };
                self.issue_mutation(Mutation::Delete { id })
            }
            QueryIntent::Recolor => {
                let Some(id) = self.commit_target(&feature, "recolor") else {
                    return Vec::new();
                };
                let color = FillColor::toggled_from(feature.color());
                info!(id = %id, from = ?feature.color(), to = %color, "recolor requested");
                self.issue_mutation(Mutation::Recolor {
                    id,
                    color: color.as_str().to_string(),
                })
            }
        }
    }

    /// Identifier for a direct commit from `Idle`, or `None` after notifying.
    fn commit_target(&mut self, feature: &Feature, gesture: &str) -> Option<FeatureId> {
        if self.refuse_if_committing(gesture) {
            return None;
        }
        match &feature.id {
            Some(id) => Some(id.clone()),
            None => {
                self.notify(
                    Severity::Error,
                    format!("{gesture} refused: feature has no identifier"),
                );
                None
            }
        }
    }

    fn load_for_edit(&mut self, feature: Feature) -> Vec<Effect> {
        if self.refuse_if_committing("load") {
            return Vec::new();
        }
        if feature.id.is_none() {
            self.notify(Severity::Error, "feature has no identifier; it cannot be edited");
            return Vec::new();
        }
        let id = feature.id.clone();
        if let Err(conflict) = self.overlay.load(feature) {
            warn!(%conflict, "load refused");
            self.notify(Severity::Warning, conflict.to_string());
            return Vec::new();
        }
        self.begin_epoch();

        let (attached, detached) = self.overlay.attach_reshape_interaction();
        let mut effects = Vec::with_capacity(2);
        if let Some(old) = detached {
            effects.push(Effect::DetachReshape(old));
        }
        effects.push(Effect::AttachReshape(attached));
        if let Some(id) = id {
            info!(id = %id, "feature loaded for editing");
        }
        effects
    }

    fn on_commit_resolved(
        &mut self,
        ticket: Ticket,
        outcome: Result<String, CommitError>,
    ) -> Vec<Effect> {
        let pending = match self.pending_commit.take() {
            Some(p) if p.ticket == ticket => p,
            other => {
                warn!(ticket = ticket.0, "stale store response dropped");
                self.pending_commit = other;
                return Vec::new();
            }
        };

        let message = match outcome {
            Ok(message) => message,
            Err(e) => {
                error!(kind = %pending.kind, error = %e, "mutation failed");
                self.notify(Severity::Error, format!("{} failed: {e}", pending.kind));
                return Vec::new();
            }
        };

        info!(kind = %pending.kind, %message, "mutation confirmed");
        let text = if message.is_empty() {
            format!("{} saved", pending.kind)
        } else {
            format!("{} saved: {message}", pending.kind)
        };
        self.notify(Severity::Info, text);

        let mut effects = Vec::new();
        match pending.kind {
            MutationKind::Create | MutationKind::Edit => {
                if let Some(detached) = self.overlay.clear() {
                    effects.push(Effect::DetachReshape(detached));
                }
                self.begin_epoch();
            }
            MutationKind::Delete | MutationKind::Recolor => {}
        }
        effects.push(Effect::InvalidateTiles);
        effects
    }
}
