//! Connection level settings for request body ingestion.

use std::time::Duration;

/// Initial capacity reserved for a connection's receive buffer.
pub const DEFAULT_REQUEST_BUFFER_CAPACITY: usize = 8 * 1024;

/// How long a readiness wait may last before it fails with a timeout.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings shared by a connection, its endpoint and its input.
///
/// ```
/// use std::time::Duration;
/// use micro_http_input::config::InputConfig;
///
/// let config = InputConfig::default()
///     .with_request_buffer_capacity(16 * 1024)
///     .with_idle_timeout(Some(Duration::from_secs(5)));
/// assert_eq!(config.request_buffer_capacity(), 16 * 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputConfig {
    request_buffer_capacity: usize,
    idle_timeout: Option<Duration>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self { request_buffer_capacity: DEFAULT_REQUEST_BUFFER_CAPACITY, idle_timeout: Some(DEFAULT_IDLE_TIMEOUT) }
    }
}

impl InputConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the receive buffer capacity, at least one byte is always reserved.
    #[must_use]
    pub fn with_request_buffer_capacity(mut self, capacity: usize) -> Self {
        self.request_buffer_capacity = capacity.max(1);
        self
    }

    /// Bounds every readiness wait, `None` waits forever.
    #[must_use]
    pub fn with_idle_timeout(mut self, idle_timeout: Option<Duration>) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn request_buffer_capacity(&self) -> usize {
        self.request_buffer_capacity
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = InputConfig::default();
        assert_eq!(config.request_buffer_capacity(), 8 * 1024);
        assert_eq!(config.idle_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let config = InputConfig::new().with_request_buffer_capacity(0).with_idle_timeout(None);
        assert_eq!(config.request_buffer_capacity(), 1);
        assert_eq!(config.idle_timeout(), None);
    }
}
