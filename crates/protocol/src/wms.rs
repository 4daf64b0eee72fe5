//! WMS request parameters for the polygon layer.
//!
//! Two request kinds are issued against the tiled map service:
//! - `GetFeatureInfo` to resolve the feature under a map point
//! - `GetMap` tiles, carrying the cache-busting value after a mutation
//!
//! Only query pairs are produced here; URL assembly and transport belong to
//! the caller.

use foundation::{Aabb2, Crs, MapPoint, Resolution};

use crate::cache_buster::CacheBuster;

pub const WMS_VERSION: &str = "1.3.0";
pub const INFO_FORMAT_JSON: &str = "application/json";

/// Query pairs in request order. Keys are WMS parameter names.
pub type QueryPairs = Vec<(&'static str, String)>;

#[derive(Debug, Clone, PartialEq)]
pub struct WmsLayer {
    /// OWS endpoint, e.g. `http://localhost:8080/geoserver/tiger/ows`.
    pub url: String,
    pub layer: String,
    /// Server-side filter; excludes soft-deleted rows.
    pub cql_filter: Option<String>,
    pub crs: Crs,
}

impl WmsLayer {
    pub fn new(url: impl Into<String>, layer: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            layer: layer.into(),
            cql_filter: Some("is_deleted=false".to_string()),
            crs: Crs::default(),
        }
    }

    pub fn with_cql_filter(mut self, filter: Option<String>) -> Self {
        self.cql_filter = filter;
        self
    }

    pub fn with_crs(mut self, crs: Crs) -> Self {
        self.crs = crs;
        self
    }

    fn common_params(&self, request: &'static str) -> QueryPairs {
        let mut params: QueryPairs = vec![
            ("SERVICE", "WMS".to_string()),
            ("VERSION", WMS_VERSION.to_string()),
            ("REQUEST", request.to_string()),
            ("FORMAT", "image/png".to_string()),
            ("TRANSPARENT", "true".to_string()),
            ("TILED", "true".to_string()),
            ("LAYERS", self.layer.clone()),
            ("STYLES", String::new()),
        ];
        if let Some(filter) = &self.cql_filter {
            params.push(("CQL_FILTER", filter.clone()));
        }
        params
    }

    /// Parameters for a feature-info lookup centred on `point`.
    ///
    /// The request describes a `(2r+1)` pixel square image at the current view
    /// resolution with the queried pixel in its centre, so the server's hit
    /// tolerance (in pixels) scales with zoom the same way the rendered tiles
    /// do.
    pub fn feature_info_params(
        &self,
        point: MapPoint,
        resolution: Resolution,
        pixel_radius: u32,
    ) -> QueryPairs {
        let size = 2 * u64::from(pixel_radius) + 1;
        let half_extent = resolution.span(pixel_radius as f64 + 0.5);
        let bbox = Aabb2::around(point, half_extent);

        let mut params = self.common_params("GetFeatureInfo");
        params.extend([
            ("QUERY_LAYERS", self.layer.clone()),
            ("INFO_FORMAT", INFO_FORMAT_JSON.to_string()),
            ("CRS", self.crs.to_string()),
            ("BBOX", bbox.to_bbox_param()),
            ("WIDTH", size.to_string()),
            ("HEIGHT", size.to_string()),
            ("I", pixel_radius.to_string()),
            ("J", pixel_radius.to_string()),
        ]);
        params
    }

    /// Parameters for one `GetMap` tile, including the cache-busting value
    /// once any mutation has been committed.
    pub fn tile_params(
        &self,
        bbox: Aabb2,
        width_px: u32,
        height_px: u32,
        buster: &CacheBuster,
    ) -> QueryPairs {
        let mut params = self.common_params("GetMap");
        params.extend([
            ("CRS", self.crs.to_string()),
            ("BBOX", bbox.to_bbox_param()),
            ("WIDTH", width_px.to_string()),
            ("HEIGHT", height_px.to_string()),
        ]);
        if let Some(pair) = buster.param() {
            params.push(pair);
        }
        params
    }
}

/// Looks up a parameter value by key.
pub fn param<'a>(params: &'a QueryPairs, key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v.as_str())
}
