/// Coordinate reference system identifier, e.g. `EPSG:32636`.
///
/// All geometry exchanged with the map service and the feature store is
/// expressed in a single CRS; nothing in the workspace reprojects.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Crs(String);

/// WGS 84 / UTM zone 36N.
pub const DEFAULT_CRS: &str = "EPSG:32636";

impl Crs {
    pub fn new(code: impl Into<String>) -> Self {
        Crs(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Crs {
    fn default() -> Self {
        Crs::new(DEFAULT_CRS)
    }
}

impl std::fmt::Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
