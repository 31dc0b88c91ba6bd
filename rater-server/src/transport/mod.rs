//! Transport layer for the admission-control server
//!
//! A transport accepts client connections, hands complete request lines to
//! the engine actor, and writes the verdict back. There is one shipped
//! implementation, the [`line`] protocol the original service spoke.

pub mod line;

use crate::actor::EngineHandle;
use anyhow::Result;
use async_trait::async_trait;

/// Common interface for transport implementations
///
/// Each transport is responsible for:
/// - Accepting client connections
/// - Framing protocol-specific requests
/// - Forwarding requests to the engine actor
/// - Sending verdicts back to clients
#[async_trait]
pub trait Transport {
    /// Start the transport server
    ///
    /// Binds to the configured address, accepts connections, and serves
    /// requests using the provided engine handle. Runs indefinitely until
    /// an error occurs or the server shuts down.
    async fn start(self, engine: EngineHandle) -> Result<()>;
}
