use std::time::Duration;

/// Address a node listens on when none is configured.
pub const DEFAULT_ADDRESS: &str = "localhost:3410";
/// Default timeout for a single network exchange before it is abandoned as a transport failure.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(2000); // 2 seconds

#[derive(Debug, Clone)]
/// Node configurations
pub struct Config {
    /// Address to listen on, also advertised to peers when joining a ring
    /// and hashed into the node's [Id](crate::Id).
    ///
    /// If the port is `0` an ephemeral port is picked when binding and the
    /// resulting socket address is used instead.
    ///
    /// Defaults to [DEFAULT_ADDRESS]
    pub address: String,
    /// Read and write timeout applied to every connection, inbound or outbound.
    ///
    /// Operations queued on the state owner are never timed out, but an
    /// outbound call's read timeout covers the whole wait for the reply,
    /// including the time its operation spends queued on the remote node.
    /// A call failing that way with [CallError::IO](crate::CallError::IO)
    /// may still have been applied.
    ///
    /// Defaults to [DEFAULT_REQUEST_TIMEOUT]
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}
