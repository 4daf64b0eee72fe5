/// Cache-busting value for tile requests.
///
/// Changing the `_` parameter makes the tile layer request URLs it has never
/// fetched before, so intermediate caches are bypassed. This is a nudge, not
/// an invalidation protocol: caches keyed without query strings still serve
/// stale tiles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheBuster {
    value: Option<u64>,
    bumps: u64,
}

pub const CACHE_BUSTER_PARAM: &str = "_";

impl CacheBuster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the value to `now_ms`, or one past the previous value when the
    /// clock has not advanced, so every bump yields a distinct URL.
    pub fn bump(&mut self, now_ms: u64) -> u64 {
        let next = match self.value {
            Some(prev) if now_ms <= prev => prev + 1,
            _ => now_ms,
        };
        self.value = Some(next);
        self.bumps += 1;
        next
    }

    pub fn value(&self) -> Option<u64> {
        self.value
    }

    /// Number of bumps since construction.
    pub fn bumps(&self) -> u64 {
        self.bumps
    }

    pub fn param(&self) -> Option<(&'static str, String)> {
        self.value.map(|v| (CACHE_BUSTER_PARAM, v.to_string()))
    }
}
