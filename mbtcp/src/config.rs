use std::time::Duration;

use crate::constants::DEFAULT_PORT;
use crate::decode::DecodeLevel;
use crate::error::InvalidArgument;
use crate::types::UnitId;

/// Everything needed to open a session with one device
///
/// The defaults are `localhost:502`, unit 1, a 5 second timeout and no protocol decoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// host name or IP address of the server
    pub host: String,
    /// TCP port of the server
    pub port: u16,
    /// unit addressed by every request
    pub unit_id: UnitId,
    /// bounds both connecting and each send-then-receive exchange
    pub timeout: Duration,
    /// protocol decoding written to the log
    pub decode: DecodeLevel,
}

impl ClientConfig {
    /// Default settings for the given host
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Set the TCP port
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the unit identifier
    pub fn unit_id(mut self, unit_id: UnitId) -> Self {
        self.unit_id = unit_id;
        self
    }

    /// Set the timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the decode level
    pub fn decode(mut self, decode: DecodeLevel) -> Self {
        self.decode = decode;
        self
    }

    /// Reject settings no session can work with
    pub fn validate(&self) -> Result<(), InvalidArgument> {
        if self.port == 0 {
            return Err(InvalidArgument::InvalidPort);
        }
        if self.timeout.is_zero() {
            return Err(InvalidArgument::ZeroTimeout);
        }
        self.unit_id.validate()?;
        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            unit_id: UnitId::default(),
            timeout: Duration::from_secs(5),
            decode: DecodeLevel::nothing(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_a_local_server() {
        let config = ClientConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 502);
        assert_eq!(config.unit_id, UnitId::new(1));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn builder_overrides_fields() {
        let config = ClientConfig::new("10.0.0.7")
            .port(5020)
            .unit_id(UnitId::new(17))
            .timeout(Duration::from_millis(250));
        assert_eq!(config.host, "10.0.0.7");
        assert_eq!(config.port, 5020);
        assert_eq!(config.unit_id, UnitId::new(17));
        assert_eq!(config.timeout, Duration::from_millis(250));
    }

    #[test]
    fn rejects_unusable_settings() {
        assert_eq!(
            ClientConfig::default().port(0).validate(),
            Err(InvalidArgument::InvalidPort)
        );
        assert_eq!(
            ClientConfig::default().timeout(Duration::ZERO).validate(),
            Err(InvalidArgument::ZeroTimeout)
        );
        assert_eq!(
            ClientConfig::default().unit_id(UnitId::new(0)).validate(),
            Err(InvalidArgument::InvalidUnitId(0))
        );
    }
}
