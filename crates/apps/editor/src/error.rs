/// Failure to set up a gateway (client construction, bad configuration).
///
/// Request outcomes are reported as `QueryError` / `CommitError` instead, since
/// the state machine consumes those.
#[derive(Debug)]
pub struct GatewayError {
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{}: {source}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for GatewayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as _)
    }
}

impl GatewayError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Builds the shared HTTP client with a request timeout.
pub fn http_client(timeout: std::time::Duration) -> Result<reqwest::Client, GatewayError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| GatewayError::with_source("failed to build HTTP client", e))
}

#[cfg(test)]
mod tests {
    use super::GatewayError;
    use std::error::Error;

    #[test]
    fn source_is_exposed_and_displayed() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let e = GatewayError::with_source("setup failed", io);
        assert_eq!(e.to_string(), "setup failed: boom");
        assert!(e.source().is_some());
        assert!(GatewayError::new("plain").source().is_none());
    }
}
