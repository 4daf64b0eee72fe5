//! Feature-info lookups against the WMS service.

use formats::{Feature, FeatureCollection};
use foundation::{MapPoint, Resolution};
use interaction::QueryError;
use protocol::WmsLayer;
use tracing::{debug, info, warn};

use crate::BoxFuture;

/// Resolves the feature under a map point.
///
/// Implementations report failures as [`QueryError`]; the caller decides to
/// treat them as a miss.
pub trait FeatureInfoSource: Send + Sync {
    fn lookup(
        &self,
        at: MapPoint,
        resolution: Resolution,
    ) -> BoxFuture<'_, Result<Option<Feature>, QueryError>>;
}

/// `GetFeatureInfo` against a GeoServer-style WMS endpoint.
pub struct WmsFeatureInfo {
    layer: WmsLayer,
    pixel_radius: u32,
    client: reqwest::Client,
}

impl WmsFeatureInfo {
    pub fn new(layer: WmsLayer, pixel_radius: u32, client: reqwest::Client) -> Self {
        Self {
            layer,
            pixel_radius,
            client,
        }
    }
}

impl FeatureInfoSource for WmsFeatureInfo {
    fn lookup(
        &self,
        at: MapPoint,
        resolution: Resolution,
    ) -> BoxFuture<'_, Result<Option<Feature>, QueryError>> {
        let params = self
            .layer
            .feature_info_params(at, resolution, self.pixel_radius);
        Box::pin(async move {
            debug!(x = at.x, y = at.y, layer = %self.layer.layer, "GetFeatureInfo");
            let resp = self
                .client
                .get(&self.layer.url)
                .query(&params)
                .send()
                .await
                .map_err(|e| QueryError::Transport(e.to_string()))?;

            let status = resp.status();
            if !status.is_success() {
                warn!(%status, "feature-info request rejected");
                return Err(QueryError::Status(status.as_u16()));
            }

            let body = resp
                .text()
                .await
                .map_err(|e| QueryError::Transport(e.to_string()))?;
            let found = decode_first_feature(&body)?;
            match &found {
                Some(feature) => match &feature.id {
                    Some(id) => info!(id = %id, "feature-info hit"),
                    None => info!("feature-info hit without identifier"),
                },
                None => debug!("feature-info miss"),
            }
            Ok(found)
        })
    }
}

/// Decodes the first feature of a feature-info response body.
pub fn decode_first_feature(body: &str) -> Result<Option<Feature>, QueryError> {
    FeatureCollection::first_from_geojson_str(body)
        .map_err(|e| QueryError::Malformed(e.to_string()))
}
