//! TCP listener binding a [RequestHandler] to a network address.

use std::fmt::Debug;
use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info, trace};

use crate::common::{ErrorSpecific, Message, Request, Response};

use super::{read_frame, write_frame};

/// Node server that can handle incoming rpc requests
pub trait RequestHandler: Debug + Send + Sync + 'static {
    /// Handle a decoded request and return the response, or an error to send back
    /// to the requester.
    ///
    /// Called concurrently from one thread per connection.
    fn handle_request(&self, from: SocketAddr, request: Request)
        -> Result<Response, ErrorSpecific>;
}

#[derive(Debug)]
/// A bound listener, serving one request/response exchange per connection.
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    request_timeout: Duration,
}

impl Server {
    /// Bind a listener on `address`, returns an error if the address is unavailable.
    ///
    /// Nothing is served until [Server::spawn] or [Server::run].
    pub fn bind(address: &str, request_timeout: Duration) -> io::Result<Server> {
        let listener = TcpListener::bind(address)?;
        let local_addr = listener.local_addr()?;

        Ok(Server {
            listener,
            local_addr,
            request_timeout,
        })
    }

    // === Getters ===

    /// Returns the address the server is listening to.
    #[inline]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    // === Public Methods ===

    /// Run the accept loop on its own thread.
    pub fn spawn(self, handler: Arc<dyn RequestHandler>) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("chord-server".to_string())
            .spawn(move || self.run(handler))
    }

    /// Accept connections forever, serving each one with `handler` on its own thread.
    pub fn run(self, handler: Arc<dyn RequestHandler>) {
        info!(address = ?self.local_addr, "Chord node listening");

        for stream in self.listener.incoming() {
            let stream = match stream {
                Ok(stream) => stream,
                Err(error) => {
                    debug!(?error, "Failed to accept connection");
                    continue;
                }
            };

            let handler = handler.clone();
            let request_timeout = self.request_timeout;

            let spawned = thread::Builder::new()
                .name("chord-connection".to_string())
                .spawn(move || {
                    if let Err(error) = serve(stream, handler.as_ref(), request_timeout) {
                        debug!(?error, "Connection closed with an error");
                    }
                });

            if let Err(error) = spawned {
                error!(?error, "Failed to spawn a connection thread");
            }
        }
    }
}

/// Perform exactly one request/response exchange on `stream`.
fn serve(
    mut stream: TcpStream,
    handler: &dyn RequestHandler,
    request_timeout: Duration,
) -> io::Result<()> {
    let from = stream.peer_addr()?;

    stream.set_read_timeout(Some(request_timeout))?;
    stream.set_write_timeout(Some(request_timeout))?;

    let bytes = read_frame(&mut stream)?;

    let reply = match Message::from_bytes(&bytes) {
        Ok(Message::Request(request)) => match handler.handle_request(from, request) {
            Ok(response) => Message::Response(response),
            Err(error) => Message::Error(error),
        },
        Ok(message) => {
            debug!(?from, ?message, "Expected a request");
            Message::Error(ErrorSpecific {
                description: "expected a request".to_string(),
            })
        }
        Err(error) => {
            debug!(?from, ?error, "Malformed request");
            Message::Error(ErrorSpecific {
                description: error.to_string(),
            })
        }
    };

    trace!(?from, ?reply, "Sending reply");

    let bytes = reply
        .to_bytes()
        .map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error))?;

    write_frame(&mut stream, &bytes)
}

#[cfg(test)]
mod test {
    use std::io::{Read, Write};
    use std::net::Shutdown;

    use crate::actor::StateOwner;
    use crate::common::Node;
    use crate::rpc::{Rpc, DEFAULT_REQUEST_TIMEOUT};

    use super::*;

    fn server() -> SocketAddr {
        let owner = StateOwner::spawn(Node::create("127.0.0.1:0")).unwrap();

        let server = Server::bind("127.0.0.1:0", DEFAULT_REQUEST_TIMEOUT).unwrap();

        let address = server.local_addr();
        server.spawn(Arc::new(Rpc::new(owner))).unwrap();

        address
    }

    fn raw_exchange(address: SocketAddr, bytes: &[u8]) -> Message {
        let mut stream = TcpStream::connect(address).unwrap();
        stream.write_all(bytes).unwrap();
        stream.shutdown(Shutdown::Write).unwrap();

        let mut reply = Vec::new();
        stream.read_to_end(&mut reply).unwrap();

        Message::from_bytes(reply).unwrap()
    }

    #[test]
    fn serves_a_request() {
        let address = server();

        let reply = raw_exchange(
            address,
            &Message::Request(Request::Ping).to_bytes().unwrap(),
        );

        assert_eq!(reply, Message::Response(Response::Ping));
    }

    #[test]
    fn malformed_request_gets_an_error() {
        let address = server();

        assert!(matches!(
            raw_exchange(address, b"not bencode"),
            Message::Error(_)
        ));
        assert!(matches!(
            raw_exchange(address, b"d1:al1:xe1:q3:put1:y1:qe"),
            Message::Error(_)
        ));
        assert!(matches!(
            raw_exchange(
                address,
                &Message::Response(Response::Ping).to_bytes().unwrap()
            ),
            Message::Error(_)
        ));
    }

    #[test]
    fn bind_failure_is_reported() {
        let first = Server::bind("127.0.0.1:0", DEFAULT_REQUEST_TIMEOUT).unwrap();
        let taken = first.local_addr().to_string();

        assert!(Server::bind(&taken, DEFAULT_REQUEST_TIMEOUT).is_err());
    }
}
