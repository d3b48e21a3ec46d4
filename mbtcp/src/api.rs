use crate::client::ClientSession;
use crate::config::ClientConfig;
use crate::error::{InternalError, RequestError};

/// Client that opens a new connection for every operation
///
/// Each method connects, performs exactly one transaction and closes the connection again,
/// whatever the outcome. Use [`ClientSession`] to make several requests over one connection.
#[derive(Clone, Debug)]
pub struct OneShotClient {
    config: ClientConfig,
}

impl OneShotClient {
    /// Create a client for the device described by `config`
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Settings used for every connection
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Read the state of a single coil
    pub async fn read_coil(&self, address: u16) -> Result<bool, RequestError> {
        first(self.read_multiple_coils(address, 1).await?)
    }

    /// Read the state of `count` consecutive coils
    pub async fn read_multiple_coils(
        &self,
        address: u16,
        count: u16,
    ) -> Result<Vec<bool>, RequestError> {
        let mut session = ClientSession::connect(&self.config).await?;
        let result = session.read_coils(address, count).await;
        session.close().await;
        result
    }

    /// Read a single holding register
    pub async fn read_holding_register(&self, address: u16) -> Result<u16, RequestError> {
        first(self.read_multiple_holding_registers(address, 1).await?)
    }

    /// Read `count` consecutive holding registers
    pub async fn read_multiple_holding_registers(
        &self,
        address: u16,
        count: u16,
    ) -> Result<Vec<u16>, RequestError> {
        let mut session = ClientSession::connect(&self.config).await?;
        let result = session.read_holding_registers(address, count).await;
        session.close().await;
        result
    }

    /// Write a single coil, returning the state echoed by the server
    pub async fn write_coil(&self, address: u16, value: bool) -> Result<bool, RequestError> {
        let mut session = ClientSession::connect(&self.config).await?;
        let result = session.write_bit(address, value).await;
        session.close().await;
        result
    }

    /// Write a single holding register, returning true if the server echoed the value
    pub async fn write_register(&self, address: u16, value: u16) -> Result<bool, RequestError> {
        let mut session = ClientSession::connect(&self.config).await?;
        let result = session.write_register(address, value).await;
        session.close().await;
        result
    }
}

fn first<T>(values: Vec<T>) -> Result<T, RequestError> {
    values
        .into_iter()
        .next()
        .ok_or_else(|| InternalError::MissingValue.into())
}
