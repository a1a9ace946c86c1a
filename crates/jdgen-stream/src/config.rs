use std::time::Duration;

/// Environment variable used to resolve the backend base URL.
pub const BASE_URL_ENV: &str = "JDGEN_API_BASE_URL";

/// Streaming generation endpoint path.
pub const GENERATE_STREAM_PATH: &str = "/api/jd/generate/stream";

const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Configuration for the streaming client.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base URL of the generation backend.
    pub base_url: String,
    /// Endpoint path for the generate stream.
    pub stream_path: String,
    /// Connection establishment timeout.
    ///
    /// This bounds the handshake only; an open stream runs until the server
    /// signals `end`/`error` or the caller cancels.
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            stream_path: GENERATE_STREAM_PATH.to_string(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl ClientConfig {
    /// Creates a config with the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Builds a config from `JDGEN_API_BASE_URL`, falling back to the local
    /// development default.
    pub fn from_env() -> Self {
        let base_url = match std::env::var(BASE_URL_ENV) {
            Ok(value) if !value.trim().is_empty() => value,
            _ => DEFAULT_BASE_URL.to_string(),
        };
        Self::new(base_url)
    }

    /// Overrides the stream endpoint path.
    pub fn stream_path(mut self, path: impl Into<String>) -> Self {
        self.stream_path = path.into();
        self
    }

    /// Overrides the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub(crate) fn stream_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.stream_path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_url_joins_without_duplicate_slashes() {
        let config = ClientConfig::new("http://localhost:8000/");
        assert_eq!(
            config.stream_url(),
            "http://localhost:8000/api/jd/generate/stream"
        );
    }

    #[test]
    fn stream_path_override_is_applied() {
        let config = ClientConfig::new("http://h").stream_path("/api/dash/jd/preview");
        assert_eq!(config.stream_url(), "http://h/api/dash/jd/preview");
    }
}
