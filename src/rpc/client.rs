//! Client side of the transport, used alike by peers and by the local front-end.

use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, trace};

use crate::common::{Info, Message, MessageError, Request, Response};

use super::{read_frame, write_frame, DEFAULT_REQUEST_TIMEOUT};

/// Perform a single request/response exchange with the node at `address` (`host:port`).
///
/// The connection lives only for the duration of the call and is closed on
/// every exit path. A [Response] means the remote node handled the request;
/// anything that kept the exchange from completing is a [CallError].
///
/// `timeout` applies to connecting and to every read and write, so waiting
/// for a reply counts the time spent queued on the remote node. A timed out
/// call is not cancelled remotely and may still be applied.
pub fn call(address: &str, request: Request, timeout: Duration) -> Result<Response, CallError> {
    let method = request.method();

    let result = exchange(address, request, timeout);

    if let Err(error) = &result {
        debug!(?address, method, ?error, "Call failed");
    }

    result
}

fn exchange(address: &str, request: Request, timeout: Duration) -> Result<Response, CallError> {
    let method = request.method();

    trace!(?address, ?request, "Sending request");

    let mut stream = connect(address, timeout)?;
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))?;

    write_frame(&mut stream, &Message::Request(request).to_bytes()?)?;

    let bytes = read_frame(&mut stream)?;

    match Message::from_bytes(bytes)? {
        Message::Response(response) if response.method() == method => Ok(response),
        Message::Error(error) => Err(CallError::Remote(error.description)),
        _ => Err(CallError::UnexpectedResponse(method)),
    }
}

fn connect(address: &str, timeout: Duration) -> io::Result<TcpStream> {
    let mut last_error = None;

    for socket_address in address.to_socket_addrs()? {
        match TcpStream::connect_timeout(&socket_address, timeout) {
            Ok(stream) => return Ok(stream),
            Err(error) => last_error = Some(error),
        }
    }

    Err(last_error.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{address} did not resolve to any socket address"),
        )
    }))
}

#[derive(Debug, Clone)]
/// Typed wrappers around [call].
pub struct Client {
    request_timeout: Duration,
}

impl Default for Client {
    fn default() -> Self {
        Client::new(DEFAULT_REQUEST_TIMEOUT)
    }
}

impl Client {
    pub fn new(request_timeout: Duration) -> Self {
        Self { request_timeout }
    }

    pub fn call(&self, address: &str, request: Request) -> Result<Response, CallError> {
        call(address, request, self.request_timeout)
    }

    /// Command names recognized by the node at `address`.
    pub fn help(&self, address: &str) -> Result<Vec<String>, CallError> {
        match self.call(address, Request::Help)? {
            Response::Help(commands) => Ok(commands),
            _ => Err(CallError::UnexpectedResponse(Request::Help.method())),
        }
    }

    /// Returns `Ok(())` if the node at `address` is alive.
    pub fn ping(&self, address: &str) -> Result<(), CallError> {
        self.call(address, Request::Ping).map(|_| ())
    }

    pub fn put(&self, address: &str, key: &str, value: &str) -> Result<(), CallError> {
        let request = Request::Put {
            key: key.to_string(),
            value: value.to_string(),
        };

        self.call(address, request).map(|_| ())
    }

    /// Returns `Ok(None)` if the node at `address` does not store `key`.
    pub fn get(&self, address: &str, key: &str) -> Result<Option<String>, CallError> {
        let request = Request::Get {
            key: key.to_string(),
        };

        match self.call(address, request)? {
            Response::Get(value) => Ok(value),
            response => Err(CallError::UnexpectedResponse(response.method())),
        }
    }

    pub fn delete(&self, address: &str, key: &str) -> Result<(), CallError> {
        let request = Request::Delete {
            key: key.to_string(),
        };

        self.call(address, request).map(|_| ())
    }

    /// Announce the node at `own_address` as the predecessor of the node at `address`.
    pub fn join(&self, address: &str, own_address: &str) -> Result<(), CallError> {
        let request = Request::Join {
            address: own_address.to_string(),
        };

        self.call(address, request).map(|_| ())
    }

    /// Snapshot of the node at `address`.
    pub fn dump(&self, address: &str) -> Result<Info, CallError> {
        match self.call(address, Request::Dump)? {
            Response::Dump(info) => Ok(info),
            response => Err(CallError::UnexpectedResponse(response.method())),
        }
    }
}

#[derive(thiserror::Error, Debug)]
/// A call that did not complete, as opposed to a domain result such as a missing key.
pub enum CallError {
    #[error(transparent)]
    /// Transparent [std::io::Error]
    IO(#[from] io::Error),

    /// The exchanged bytes were not a valid message.
    #[error(transparent)]
    Message(#[from] MessageError),

    /// The remote node answered with an error.
    #[error("Remote error: {0}")]
    Remote(String),

    #[error("Unexpected response to {0}")]
    UnexpectedResponse(&'static str),
}

#[cfg(test)]
mod test {
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpListener};
    use std::sync::Arc;
    use std::thread;

    use crate::actor::StateOwner;
    use crate::common::{ErrorSpecific, Node};
    use crate::rpc::{RequestHandler, Rpc, Server};

    use super::*;

    fn node() -> String {
        let server = Server::bind("127.0.0.1:0", DEFAULT_REQUEST_TIMEOUT).unwrap();

        let address = server.local_addr().to_string();
        server.spawn(Arc::new(Rpc::new(owner()))).unwrap();

        address
    }

    fn owner() -> StateOwner {
        StateOwner::spawn(Node::create("127.0.0.1:0")).unwrap()
    }

    /// An address nothing listens on.
    fn unreachable() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().to_string()
    }

    #[test]
    fn typed_calls() {
        let address = node();
        let client = Client::default();

        client.ping(&address).unwrap();
        assert_eq!(client.help(&address).unwrap().len(), crate::rpc::COMMANDS.len());

        client.put(&address, "x", "1").unwrap();
        assert_eq!(client.get(&address, "x").unwrap(), Some("1".into()));

        client.delete(&address, "x").unwrap();
        assert_eq!(client.get(&address, "x").unwrap(), None);

        client.join(&address, "127.0.0.1:9999").unwrap();
        let info = client.dump(&address).unwrap();
        assert_eq!(info.predecessor(), Some("127.0.0.1:9999"));
        assert!(info.data().is_empty());
    }

    #[test]
    fn ping_unreachable_is_a_transport_failure() {
        let address = unreachable();

        assert!(matches!(
            Client::default().ping(&address),
            Err(CallError::IO(_))
        ));
    }

    #[test]
    fn garbage_reply_is_a_message_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap().to_string();

        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();

            let mut request = Vec::new();
            stream.read_to_end(&mut request).unwrap();
            stream.write_all(b"not bencode").unwrap();
        });

        assert!(matches!(
            Client::default().ping(&address),
            Err(CallError::Message(_))
        ));
    }

    #[derive(Debug)]
    /// Answers every request with a pong.
    struct AlwaysPing;

    impl RequestHandler for AlwaysPing {
        fn handle_request(
            &self,
            _from: SocketAddr,
            _request: Request,
        ) -> Result<Response, ErrorSpecific> {
            Ok(Response::Ping)
        }
    }

    #[test]
    fn mismatched_reply_is_unexpected() {
        let server = Server::bind("127.0.0.1:0", DEFAULT_REQUEST_TIMEOUT).unwrap();
        let address = server.local_addr().to_string();
        server.spawn(Arc::new(AlwaysPing)).unwrap();

        let client = Client::default();

        assert!(matches!(
            client.get(&address, "x"),
            Err(CallError::UnexpectedResponse("get"))
        ));
        client.ping(&address).unwrap();
    }

    #[test]
    fn timed_out_call_may_still_be_applied() {
        let owner = owner();

        let server = Server::bind("127.0.0.1:0", DEFAULT_REQUEST_TIMEOUT).unwrap();
        let address = server.local_addr().to_string();
        server.spawn(Arc::new(Rpc::new(owner.clone()))).unwrap();

        // Keep the state owner busy well past the caller's timeout.
        let busy = owner.clone();
        let blocker = thread::spawn(move || {
            busy.submit(|_| thread::sleep(Duration::from_millis(500)))
                .unwrap()
        });
        thread::sleep(Duration::from_millis(50));

        let impatient = Client::new(Duration::from_millis(100));
        assert!(matches!(
            impatient.put(&address, "x", "1"),
            Err(CallError::IO(_))
        ));

        blocker.join().unwrap();
        assert_eq!(
            Client::default().get(&address, "x").unwrap(),
            Some("1".into())
        );
    }

    #[test]
    fn unresolvable_address_is_a_transport_failure() {
        assert!(matches!(
            call("not an address", Request::Ping, DEFAULT_REQUEST_TIMEOUT),
            Err(CallError::IO(_))
        ));
    }
}
