//! Mutations against the polygon store and tile cache busting.

use std::time::{SystemTime, UNIX_EPOCH};

use foundation::Aabb2;
use formats::{Feature, FeatureId, PolygonGeometry};
use interaction::CommitError;
use protocol::{interpret_reply, CacheBuster, Mutation, QueryPairs, WmsLayer};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::BoxFuture;

/// Applies a mutation and returns the store's confirmation message.
pub trait FeatureStore: Send + Sync {
    fn apply<'a>(&'a self, mutation: &'a Mutation) -> BoxFuture<'a, Result<String, CommitError>>;
}

/// JSON-over-HTTP polygon store (`POST /polygons`, `/polygons/edit`, ...).
pub struct HttpFeatureStore {
    base_url: String,
    client: reqwest::Client,
}

impl HttpFeatureStore {
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }
}

impl FeatureStore for HttpFeatureStore {
    fn apply<'a>(&'a self, mutation: &'a Mutation) -> BoxFuture<'a, Result<String, CommitError>> {
        Box::pin(async move {
            let kind = mutation.kind();
            let body = mutation
                .body()
                .map_err(|e| CommitError::Encode(e.to_string()))?;
            let url = self.url(kind.path());
            debug!(%kind, %url, "POST");

            let resp = self
                .client
                .post(&url)
                .json(&body)
                .send()
                .await
                .map_err(|e| CommitError::Transport(e.to_string()))?;
            let status = resp.status().as_u16();
            let text = resp
                .text()
                .await
                .map_err(|e| CommitError::Transport(e.to_string()))?;

            interpret_reply(status, &text).map_err(CommitError::from)
        })
    }
}

/// Issues mutations and owns the tile cache-busting value.
pub struct PersistenceGateway {
    store: Box<dyn FeatureStore>,
    layer: WmsLayer,
    buster: CacheBuster,
}

impl PersistenceGateway {
    pub fn new(store: Box<dyn FeatureStore>, layer: WmsLayer) -> Self {
        Self {
            store,
            layer,
            buster: CacheBuster::new(),
        }
    }

    pub async fn create(&self, features: Vec<Feature>) -> Result<String, CommitError> {
        self.submit(&Mutation::Create { features }).await
    }

    pub async fn edit(
        &self,
        id: FeatureId,
        geometry: PolygonGeometry,
        properties: Map<String, Value>,
    ) -> Result<String, CommitError> {
        self.submit(&Mutation::Edit {
            id,
            geometry,
            properties,
        })
        .await
    }

    pub async fn delete(&self, id: FeatureId) -> Result<String, CommitError> {
        self.submit(&Mutation::Delete { id }).await
    }

    pub async fn recolor(&self, id: FeatureId, color: &str) -> Result<String, CommitError> {
        self.submit(&Mutation::Recolor {
            id,
            color: color.to_string(),
        })
        .await
    }

    async fn submit(&self, mutation: &Mutation) -> Result<String, CommitError> {
        let kind = mutation.kind();
        match self.store.apply(mutation).await {
            Ok(message) => {
                info!(%kind, %message, "store accepted mutation");
                Ok(message)
            }
            Err(e) => {
                warn!(%kind, error = %e, "store did not accept mutation");
                Err(e)
            }
        }
    }

    /// Changes the cache-busting value so the next tile requests bypass caches.
    pub fn invalidate_tiles(&mut self) -> u64 {
        let value = self.buster.bump(now_ms());
        info!(value, "tile cache busted");
        value
    }

    pub fn cache_buster(&self) -> &CacheBuster {
        &self.buster
    }

    /// `GetMap` parameters for one tile at the current cache-busting value.
    pub fn tile_params(&self, bbox: Aabb2, width_px: u32, height_px: u32) -> QueryPairs {
        self.layer.tile_params(bbox, width_px, height_px, &self.buster)
    }

    /// Full `GetMap` URL for one tile.
    pub fn tile_url(&self, bbox: Aabb2, width_px: u32, height_px: u32) -> Option<String> {
        let params = self.tile_params(bbox, width_px, height_px);
        reqwest::Url::parse_with_params(&self.layer.url, &params)
            .ok()
            .map(String::from)
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
