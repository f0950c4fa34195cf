//! Lifecycle of the local node, as driven by a front-end.
//!
//! A [Session] starts idle. Creating or joining a ring moves it to serving
//! exactly once, and only a serving session may issue calls.

use std::io;
use std::sync::Arc;
use std::thread::JoinHandle;

use tracing::info;

use crate::actor::{StateOwner, StateOwnerError};
use crate::common::{Info, Node};
use crate::rpc::{CallError, Client, Config, Rpc, Server, COMMANDS};

#[derive(Debug)]
/// The front-end's view of the local node: idle until a ring is created or joined.
pub struct Session {
    config: Config,
    client: Client,
    state: State,
}

#[derive(Debug)]
enum State {
    Idle,
    Serving {
        rpc: Rpc,
        _server: JoinHandle<()>,
    },
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self {
            client: Client::new(config.request_timeout),
            config,
            state: State::Idle,
        }
    }

    // === Getters ===

    /// This node's own address, the bound one once serving.
    pub fn address(&self) -> &str {
        &self.config.address
    }

    pub fn is_serving(&self) -> bool {
        matches!(self.state, State::Serving { .. })
    }

    // === Lifecycle ===

    /// Change the port of this node's own address, only possible before serving.
    pub fn set_port(&mut self, port: u16) -> Result<(), SessionError> {
        self.ensure_idle()?;

        let host = self
            .config
            .address
            .rsplit_once(':')
            .map(|(host, _)| host)
            .unwrap_or(&self.config.address);

        self.config.address = format!("{host}:{port}");
        info!(address = %self.config.address, "Address changed");

        Ok(())
    }

    /// Start a new ring with this node as its only member.
    pub fn create(&mut self) -> Result<(), SessionError> {
        self.ensure_idle()?;

        let (server, address) = self.bind()?;
        let node = Node::create(&address);

        self.serve(server, node)?;
        info!(address = %self.config.address, "Created a new ring");

        Ok(())
    }

    /// Join the ring `peer` is part of.
    ///
    /// `peer` records this node as its predecessor and seeds this node's
    /// successor list. If `peer` can't be reached the session stays idle.
    pub fn join(&mut self, peer: &str) -> Result<(), SessionError> {
        self.ensure_idle()?;

        let (server, address) = self.bind()?;

        self.client.join(peer, &address)?;

        let node = Node::join(&address, peer);

        self.serve(server, node)?;
        info!(address = %self.config.address, peer, "Joined a ring");

        Ok(())
    }

    // === Calls ===

    /// Command names, asked from `target` (or this node) once serving.
    pub fn help(&self, target: Option<&str>) -> Result<Vec<String>, SessionError> {
        if !self.is_serving() {
            return Ok(COMMANDS.iter().map(|command| command.to_string()).collect());
        }

        Ok(self.client.help(target.unwrap_or(&self.config.address))?)
    }

    pub fn ping(&self, address: &str) -> Result<(), SessionError> {
        self.ensure_serving()?;
        Ok(self.client.ping(address)?)
    }

    pub fn put(&self, address: &str, key: &str, value: &str) -> Result<(), SessionError> {
        self.ensure_serving()?;
        Ok(self.client.put(address, key, value)?)
    }

    /// Returns `Ok(None)` if the node at `address` does not store `key`.
    pub fn get(&self, address: &str, key: &str) -> Result<Option<String>, SessionError> {
        self.ensure_serving()?;
        Ok(self.client.get(address, key)?)
    }

    pub fn delete(&self, address: &str, key: &str) -> Result<(), SessionError> {
        self.ensure_serving()?;
        Ok(self.client.delete(address, key)?)
    }

    /// Snapshot of the local node, read through its state owner.
    pub fn dump(&self) -> Result<Info, SessionError> {
        match &self.state {
            State::Serving { rpc, .. } => Ok(rpc.info()?),
            State::Idle => Err(SessionError::NotInitialized),
        }
    }

    // === Private Methods ===

    fn ensure_idle(&self) -> Result<(), SessionError> {
        if self.is_serving() {
            return Err(SessionError::AlreadyServing(self.config.address.clone()));
        }

        Ok(())
    }

    fn ensure_serving(&self) -> Result<(), SessionError> {
        if !self.is_serving() {
            return Err(SessionError::NotInitialized);
        }

        Ok(())
    }

    /// Bind the listener and return the address to advertise, an ephemeral
    /// port is resolved to the one actually bound.
    fn bind(&self) -> Result<(Server, String), SessionError> {
        let server = Server::bind(&self.config.address, self.config.request_timeout)
            .map_err(SessionError::Bind)?;

        let address = match self.config.address.rsplit_once(':') {
            Some((_, "0")) => server.local_addr().to_string(),
            _ => self.config.address.clone(),
        };

        Ok((server, address))
    }

    fn serve(&mut self, server: Server, node: Node) -> Result<(), SessionError> {
        let address = node.address().to_string();
        let rpc = Rpc::new(StateOwner::spawn(node)?);

        let handle = server.spawn(Arc::new(rpc.clone()))?;

        self.config.address = address;
        self.state = State::Serving {
            rpc,
            _server: handle,
        };

        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Session::new(Config::default())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("Node is not serving, create or join a ring first")]
    NotInitialized,

    #[error("Node is already serving at {0}")]
    AlreadyServing(String),

    /// The listening address is unavailable, fatal for a front-end.
    #[error("Failed to bind: {0}")]
    Bind(io::Error),

    #[error("Failed to start serving: {0}")]
    Startup(#[from] io::Error),

    #[error(transparent)]
    Call(#[from] CallError),

    #[error(transparent)]
    StateOwner(#[from] StateOwnerError),
}
