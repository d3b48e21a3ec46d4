//! A Modbus TCP client protocol engine built on [Tokio](https://docs.rs/tokio).
//!
//! # Features
//!
//! * Byte-exact MBAP framing with strict length validation
//! * Panic-free parsing of responses
//! * One outstanding transaction per session, no hidden retries or reconnects
//! * Typed conversion of register data (two's complement, IEEE-754 floats, hex)
//!
//! # Supported Functions
//!
//! * Read Coils
//! * Read Discrete Inputs
//! * Read Holding Registers
//! * Read Input Registers
//! * Write Single Coil
//! * Write Single Register
//!
//! # Example
//!
//! Read two holding registers and interpret them as a single float
//!
//! ```no_run
//! use mbtcp::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::new("127.0.0.1").port(502).unit_id(UnitId::new(1));
//!
//!     let mut session = ClientSession::connect(&config).await?;
//!     let values = session
//!         .read_registers_as(
//!             FunctionCode::ReadHoldingRegisters,
//!             0,
//!             2,
//!             Interpretation::Float(WordOrder::HighFirst),
//!         )
//!         .await?;
//!
//!     for value in values {
//!         println!("{value}");
//!     }
//!
//!     session.close().await;
//!     Ok(())
//! }
//! ```

mod api;
mod client;
mod common;
mod config;
/// Public constants defined by the Modbus protocol
pub mod constants;
/// Conversions from raw register and bit data to typed values
pub mod convert;
mod decode;
mod error;
mod exception;
mod tcp;
mod types;

pub use crate::api::*;
pub use crate::client::*;
pub use crate::common::frame::TxId;
pub use crate::common::function::FunctionCode;
pub use crate::common::pdu::*;
pub use crate::config::*;
pub use crate::convert::{Interpretation, RegisterValue, WordOrder};
pub use crate::decode::*;
pub use crate::error::*;
pub use crate::exception::*;
pub use crate::tcp::client::Transport;
pub use crate::tcp::frame::{decode_response, encode_request, encode_response};
pub use crate::types::*;
