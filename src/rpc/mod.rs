//! Remote call surface of a Chord node and the TCP transport serving it.

pub mod client;
pub mod config;
pub mod server;

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};

use tracing::{debug, info};

use crate::actor::{StateOwner, StateOwnerError};
use crate::common::{ErrorSpecific, Info, Request, Response, MAX_MESSAGE_SIZE};

pub use client::{call, CallError, Client};
pub use config::{Config, DEFAULT_ADDRESS, DEFAULT_REQUEST_TIMEOUT};
pub use server::{RequestHandler, Server};

/// Every command understood by the interactive front-end, as returned by `help`.
pub const COMMANDS: [&str; 10] = [
    "Help", "Port", "Create", "Join", "Put", "Ping", "Get", "Delete", "Dump", "Quit",
];

#[derive(Debug, Clone)]
/// The remotely invokable operations of a node.
///
/// Each operation is exactly one submission to the [StateOwner], nothing here
/// touches the network or waits on anything but the owner's queue.
pub struct Rpc {
    owner: StateOwner,
}

impl Rpc {
    pub fn new(owner: StateOwner) -> Self {
        Self { owner }
    }

    pub fn help(&self) -> Result<Vec<String>, StateOwnerError> {
        self.owner
            .submit(|_| COMMANDS.iter().map(|command| command.to_string()).collect())
    }

    /// Liveness check, succeeds as long as the state owner is serving.
    pub fn ping(&self) -> Result<(), StateOwnerError> {
        self.owner.submit(|_| ())
    }

    /// Store `value` under `key` locally, overwriting any previous value.
    ///
    /// There is no ownership routing, the key is stored on this node whatever
    /// its [Id](crate::Id) is.
    pub fn put(&self, key: String, value: String) -> Result<(), StateOwnerError> {
        self.owner.submit(move |node| {
            info!(?key, ?value, address = node.address(), "Inserted key");
            node.put(key, value);
        })
    }

    /// Local lookup, `None` if this node does not store `key`.
    pub fn get(&self, key: String) -> Result<Option<String>, StateOwnerError> {
        self.owner
            .submit(move |node| node.get(&key).map(String::from))
    }

    /// Idempotent removal of `key`.
    pub fn delete(&self, key: String) -> Result<(), StateOwnerError> {
        self.owner.submit(move |node| {
            if node.delete(&key).is_some() {
                info!(?key, address = node.address(), "Deleted key");
            }
        })
    }

    /// Record the joining node at `address` as this node's predecessor.
    ///
    /// Neither the store nor the successor list change, and nothing is
    /// propagated to other nodes.
    pub fn join(&self, address: String) -> Result<(), StateOwnerError> {
        self.owner.submit(move |node| {
            info!(predecessor = ?address, "Node joined");
            node.set_predecessor(address);
        })
    }

    /// Snapshot of the local node.
    pub fn info(&self) -> Result<Info, StateOwnerError> {
        self.owner.submit(|node| node.info())
    }

    /// Dispatch a decoded request to the matching operation.
    pub fn handle(&self, request: Request) -> Result<Response, StateOwnerError> {
        Ok(match request {
            Request::Help => Response::Help(self.help()?),
            Request::Ping => {
                self.ping()?;
                Response::Ping
            }
            Request::Put { key, value } => {
                self.put(key, value)?;
                Response::Put
            }
            Request::Get { key } => Response::Get(self.get(key)?),
            Request::Delete { key } => {
                self.delete(key)?;
                Response::Delete
            }
            Request::Join { address } => {
                self.join(address)?;
                Response::Join
            }
            Request::Dump => Response::Dump(self.info()?),
        })
    }
}

impl RequestHandler for Rpc {
    fn handle_request(
        &self,
        from: SocketAddr,
        request: Request,
    ) -> Result<Response, ErrorSpecific> {
        debug!(?from, ?request, "Received a request");

        self.handle(request).map_err(|error| ErrorSpecific {
            description: error.to_string(),
        })
    }
}

/// Read one whole message, the peer half-closes its side once it is sent.
pub(crate) fn read_frame(stream: &mut TcpStream) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();

    stream
        .take(MAX_MESSAGE_SIZE as u64 + 1)
        .read_to_end(&mut buf)?;

    if buf.len() > MAX_MESSAGE_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "message exceeds MAX_MESSAGE_SIZE",
        ));
    }

    Ok(buf)
}

/// Write one whole message and half-close the stream to mark its end.
pub(crate) fn write_frame(stream: &mut TcpStream, bytes: &[u8]) -> io::Result<()> {
    stream.write_all(bytes)?;
    stream.flush()?;
    stream.shutdown(Shutdown::Write)
}
