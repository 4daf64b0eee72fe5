use std::env;
use std::time::Duration;

use clap::Parser;
use foundation::{Crs, Resolution, DEFAULT_CRS};
use interaction::FillColor;
use protocol::WmsLayer;

use crate::error::GatewayError;

pub const DEFAULT_WMS_URL: &str = "http://localhost:8080/geoserver/tiger/ows";
pub const DEFAULT_WMS_LAYER: &str = "imunim";
pub const DEFAULT_CQL_FILTER: &str = "is_deleted=false";
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3000";
pub const DEFAULT_PIXEL_RADIUS: u32 = 50;
/// Largest accepted feature-info pixel radius.
pub const MAX_PIXEL_RADIUS: u32 = 2048;
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 10_000;
/// Initial view resolution in map units per pixel.
pub const DEFAULT_RESOLUTION: f64 = 611.4962;

#[derive(Debug, Clone, PartialEq)]
pub struct EditorConfig {
    pub wms_url: String,
    pub wms_layer: String,
    /// `None` disables the soft-delete filter.
    pub cql_filter: Option<String>,
    pub crs: Crs,
    pub pixel_radius: u32,
    pub backend_url: String,
    pub http_timeout: Duration,
    pub default_fill: FillColor,
    pub resolution: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            wms_url: DEFAULT_WMS_URL.to_string(),
            wms_layer: DEFAULT_WMS_LAYER.to_string(),
            cql_filter: Some(DEFAULT_CQL_FILTER.to_string()),
            crs: Crs::new(DEFAULT_CRS),
            pixel_radius: DEFAULT_PIXEL_RADIUS,
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            http_timeout: Duration::from_millis(DEFAULT_HTTP_TIMEOUT_MS),
            default_fill: FillColor::default(),
            resolution: DEFAULT_RESOLUTION,
        }
    }
}

impl EditorConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads settings through `lookup`; unset or unparsable values fall back
    /// to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        let string = |key: &str, default: String| lookup(key).unwrap_or(default);

        let cql_filter = match lookup("WMS_CQL_FILTER") {
            Some(v) if v.trim().is_empty() => None,
            Some(v) => Some(v),
            None => d.cql_filter.clone(),
        };

        Self {
            wms_url: string("WMS_URL", d.wms_url),
            wms_layer: string("WMS_LAYER", d.wms_layer),
            cql_filter,
            crs: lookup("MAP_CRS").map(Crs::new).unwrap_or(d.crs),
            pixel_radius: parsed(&lookup, "FEATURE_INFO_PIXEL_RADIUS", d.pixel_radius),
            backend_url: string("BACKEND_URL", d.backend_url),
            http_timeout: Duration::from_millis(parsed(
                &lookup,
                "HTTP_TIMEOUT_MS",
                DEFAULT_HTTP_TIMEOUT_MS,
            )),
            default_fill: lookup("DEFAULT_FILL_COLOR")
                .and_then(|v| FillColor::parse(&v))
                .unwrap_or(d.default_fill),
            resolution: parsed(&lookup, "MAP_RESOLUTION", d.resolution),
        }
    }

    /// Applies command-line overrides on top of the environment.
    pub fn with_args(mut self, args: &Args) -> Result<Self, GatewayError> {
        if let Some(url) = &args.wms_url {
            self.wms_url = url.clone();
        }
        if let Some(layer) = &args.layer {
            self.wms_layer = layer.clone();
        }
        if let Some(url) = &args.backend_url {
            self.backend_url = url.clone();
        }
        if let Some(color) = &args.color {
            self.default_fill = FillColor::parse(color)
                .ok_or_else(|| GatewayError::new(format!("unknown fill color `{color}`")))?;
        }
        if let Some(resolution) = args.resolution {
            self.resolution = resolution;
        }
        if args.no_filter {
            self.cql_filter = None;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.view_resolution().is_none() {
            return Err(GatewayError::new(format!(
                "map resolution must be positive, got {}",
                self.resolution
            )));
        }
        if !(1..=MAX_PIXEL_RADIUS).contains(&self.pixel_radius) {
            return Err(GatewayError::new(format!(
                "feature-info pixel radius must be within 1..={MAX_PIXEL_RADIUS}, got {}",
                self.pixel_radius
            )));
        }
        Ok(())
    }

    pub fn view_resolution(&self) -> Option<Resolution> {
        Resolution::new(self.resolution)
    }

    pub fn wms_layer(&self) -> WmsLayer {
        WmsLayer::new(self.wms_url.clone(), self.wms_layer.clone())
            .with_cql_filter(self.cql_filter.clone())
            .with_crs(self.crs.clone())
    }
}

fn parsed<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    lookup(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Operator console for the polygon layer")]
pub struct Args {
    /// WMS endpoint (overrides WMS_URL)
    #[arg(long)]
    pub wms_url: Option<String>,

    /// Polygon layer name (overrides WMS_LAYER)
    #[arg(long)]
    pub layer: Option<String>,

    /// Polygon store base URL (overrides BACKEND_URL)
    #[arg(long)]
    pub backend_url: Option<String>,

    /// Initial fill color: yellow or black
    #[arg(long)]
    pub color: Option<String>,

    /// View resolution in map units per pixel
    #[arg(long)]
    pub resolution: Option<f64>,

    /// Query without the soft-delete filter
    #[arg(long, default_value_t = false)]
    pub no_filter: bool,
}

#[cfg(test)]
mod tests {
    use super::{Args, EditorConfig};
    use clap::Parser;
    use interaction::FillColor;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::time::Duration;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_the_deployed_services() {
        let c = EditorConfig::from_lookup(lookup(&[]));
        assert_eq!(c, EditorConfig::default());
        assert_eq!(c.crs.as_str(), "EPSG:32636");
        assert_eq!(c.cql_filter.as_deref(), Some("is_deleted=false"));
        assert_eq!(c.pixel_radius, 50);
    }

    #[test]
    fn environment_overrides_and_bad_values_fall_back() {
        let c = EditorConfig::from_lookup(lookup(&[
            ("BACKEND_URL", "http://store:9000"),
            ("HTTP_TIMEOUT_MS", "250"),
            ("FEATURE_INFO_PIXEL_RADIUS", "many"),
            ("DEFAULT_FILL_COLOR", "black"),
            ("WMS_CQL_FILTER", ""),
        ]));
        assert_eq!(c.backend_url, "http://store:9000");
        assert_eq!(c.http_timeout, Duration::from_millis(250));
        assert_eq!(c.pixel_radius, 50);
        assert_eq!(c.default_fill, FillColor::Black);
        assert_eq!(c.cql_filter, None);
    }

    #[test]
    fn flags_override_environment() {
        let args = Args::try_parse_from([
            "polygon-editor",
            "--layer",
            "parcels",
            "--color",
            "black",
            "--resolution",
            "2.5",
        ])
        .expect("args");
        let c = EditorConfig::default().with_args(&args).expect("config");
        assert_eq!(c.wms_layer, "parcels");
        assert_eq!(c.default_fill, FillColor::Black);
        assert_eq!(c.resolution, 2.5);
        assert_eq!(c.wms_layer().layer, "parcels");
    }

    #[test]
    fn oversized_pixel_radius_is_rejected() {
        let c = EditorConfig::from_lookup(lookup(&[("FEATURE_INFO_PIXEL_RADIUS", "3000000000")]));
        assert_eq!(c.pixel_radius, 3_000_000_000);
        assert!(c.validate().is_err());

        let c = EditorConfig::from_lookup(lookup(&[("FEATURE_INFO_PIXEL_RADIUS", "2048")]));
        assert!(c.validate().is_ok());
        let c = EditorConfig::from_lookup(lookup(&[("FEATURE_INFO_PIXEL_RADIUS", "0")]));
        assert!(c.validate().is_err());
    }

    #[test]
    fn invalid_overrides_are_rejected() {
        let args = Args {
            color: Some("purple".to_string()),
            ..Args::default()
        };
        assert!(EditorConfig::default().with_args(&args).is_err());

        let args = Args {
            resolution: Some(-1.0),
            ..Args::default()
        };
        assert!(EditorConfig::default().with_args(&args).is_err());
    }
}
