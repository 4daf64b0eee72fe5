//! Drives the interaction state machine against live gateways.

use std::collections::VecDeque;

use foundation::Resolution;
use interaction::{Effect, Event, InteractionMachine, Notice, ReshapeId, Transition};
use protocol::Mutation;
use tracing::{debug, warn};

use crate::config::EditorConfig;
use crate::error::{http_client, GatewayError};
use crate::gateway::{HttpFeatureStore, PersistenceGateway};
use crate::query::{FeatureInfoSource, WmsFeatureInfo};

/// One editing session: the state machine plus the services its effects use.
///
/// Effects run to completion before `dispatch` returns, so gestures are
/// processed one at a time and every response is fed back before the next.
pub struct Session {
    machine: InteractionMachine,
    source: Box<dyn FeatureInfoSource>,
    gateway: PersistenceGateway,
    attached: Option<ReshapeId>,
    resolution: Resolution,
}

impl Session {
    pub fn new(
        machine: InteractionMachine,
        source: Box<dyn FeatureInfoSource>,
        gateway: PersistenceGateway,
        resolution: Resolution,
    ) -> Self {
        Self {
            machine,
            source,
            gateway,
            attached: None,
            resolution,
        }
    }

    pub fn from_config(config: &EditorConfig) -> Result<Self, GatewayError> {
        config.validate()?;
        let resolution = config
            .view_resolution()
            .ok_or_else(|| GatewayError::new("map resolution must be positive"))?;
        let client = http_client(config.http_timeout)?;
        let layer = config.wms_layer();
        let source = WmsFeatureInfo::new(layer.clone(), config.pixel_radius, client.clone());
        let store = HttpFeatureStore::new(config.backend_url.clone(), client);
        Ok(Self::new(
            InteractionMachine::new(config.default_fill),
            Box::new(source),
            PersistenceGateway::new(Box::new(store), layer),
            resolution,
        ))
    }

    pub fn machine(&self) -> &InteractionMachine {
        &self.machine
    }

    pub fn gateway(&self) -> &PersistenceGateway {
        &self.gateway
    }

    /// Reshape interaction currently attached to the map, if any.
    pub fn attached_reshape(&self) -> Option<ReshapeId> {
        self.attached
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn set_resolution(&mut self, resolution: Resolution) {
        self.resolution = resolution;
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.machine.drain_notices()
    }

    /// Handles `event` and every response it leads to.
    ///
    /// The returned transition carries the final mode and all effects that
    /// were executed, in order.
    pub async fn dispatch(&mut self, event: Event) -> Transition {
        let mut queue = VecDeque::from([event]);
        let mut executed = Vec::new();
        let mut mode = self.machine.mode();

        while let Some(event) = queue.pop_front() {
            let transition = self.machine.handle(event);
            mode = transition.mode;
            for effect in transition.effects {
                if let Some(response) = self.run(&effect).await {
                    queue.push_back(response);
                }
                executed.push(effect);
            }
        }

        Transition {
            mode,
            effects: executed,
        }
    }

    async fn run(&mut self, effect: &Effect) -> Option<Event> {
        match effect {
            Effect::QueryFeatureInfo {
                ticket,
                at,
                resolution,
            } => {
                let outcome = self.source.lookup(*at, *resolution).await;
                Some(Event::QueryResolved {
                    ticket: *ticket,
                    outcome,
                })
            }
            Effect::SendMutation { ticket, mutation } => {
                let outcome = match mutation.clone() {
                    Mutation::Create { features } => self.gateway.create(features).await,
                    Mutation::Edit {
                        id,
                        geometry,
                        properties,
                    } => self.gateway.edit(id, geometry, properties).await,
                    Mutation::Delete { id } => self.gateway.delete(id).await,
                    Mutation::Recolor { id, color } => self.gateway.recolor(id, &color).await,
                };
                Some(Event::CommitResolved {
                    ticket: *ticket,
                    outcome,
                })
            }
            Effect::AttachReshape(id) => {
                if let Some(previous) = self.attached.replace(*id) {
                    warn!(previous = previous.0, "reshape interaction replaced without detach");
                }
                debug!(id = id.0, "reshape interaction attached");
                None
            }
            Effect::DetachReshape(id) => {
                if self.attached == Some(*id) {
                    self.attached = None;
                    debug!(id = id.0, "reshape interaction detached");
                }
                None
            }
            Effect::InvalidateTiles => {
                self.gateway.invalidate_tiles();
                None
            }
        }
    }
}
