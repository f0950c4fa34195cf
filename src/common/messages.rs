//! Serialize and deserialize Chord rpc messages.
//!
//! On the wire every message is a bencoded dictionary:
//! - request: `{"y": "q", "q": <method>, "a": [<arguments>]}`
//! - response: `{"y": "r", "q": <method>, "r": [<values>]}`
//! - error: `{"y": "e", "e": <description>}`

mod internal;

use crate::common::{Id, Info, SUCCESSOR_LIST_SIZE};

use internal::RpcMessage;

pub const HELP: &str = "help";
pub const PING: &str = "ping";
pub const PUT: &str = "put";
pub const GET: &str = "get";
pub const DELETE: &str = "delete";
pub const JOIN: &str = "join";
pub const DUMP: &str = "dump";

/// Upper bound on an encoded message, anything bigger is rejected.
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

#[derive(Debug, PartialEq, Clone)]
pub enum Message {
    Request(Request),

    Response(Response),

    Error(ErrorSpecific),
}

#[derive(Debug, PartialEq, Clone)]
pub enum Request {
    Help,
    Ping,
    Put { key: String, value: String },
    Get { key: String },
    Delete { key: String },
    /// Sent by a node joining the ring, carrying its own address.
    Join { address: String },
    Dump,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Response {
    Help(Vec<String>),
    Ping,
    Put,
    /// `None` if the key is not stored on the responding node.
    Get(Option<String>),
    Delete,
    Join,
    Dump(Info),
}

#[derive(Debug, PartialEq, Clone)]
pub struct ErrorSpecific {
    pub description: String,
}

impl Request {
    /// Name of the remote method this request invokes.
    pub fn method(&self) -> &'static str {
        match self {
            Request::Help => HELP,
            Request::Ping => PING,
            Request::Put { .. } => PUT,
            Request::Get { .. } => GET,
            Request::Delete { .. } => DELETE,
            Request::Join { .. } => JOIN,
            Request::Dump => DUMP,
        }
    }

    /// Build a request from a method name and its raw string arguments,
    /// checking the argument count.
    pub fn from_parts(method: &str, arguments: Vec<String>) -> Result<Request, MessageError> {
        let expected = match method {
            HELP | PING | DUMP => 0,
            GET | DELETE | JOIN => 1,
            PUT => 2,
            _ => return Err(MessageError::UnknownMethod(method.to_string())),
        };

        if arguments.len() != expected {
            return Err(MessageError::InvalidArguments {
                method: method.to_string(),
                expected,
                got: arguments.len(),
            });
        }

        let mut arguments = arguments.into_iter();
        let mut next = || arguments.next().unwrap_or_default();

        Ok(match method {
            HELP => Request::Help,
            PING => Request::Ping,
            DUMP => Request::Dump,
            GET => Request::Get { key: next() },
            DELETE => Request::Delete { key: next() },
            JOIN => Request::Join { address: next() },
            _ => Request::Put {
                key: next(),
                value: next(),
            },
        })
    }

    fn into_arguments(self) -> Vec<String> {
        match self {
            Request::Help | Request::Ping | Request::Dump => vec![],
            Request::Put { key, value } => vec![key, value],
            Request::Get { key } | Request::Delete { key } => vec![key],
            Request::Join { address } => vec![address],
        }
    }
}

impl Response {
    /// Name of the remote method this response answers.
    pub fn method(&self) -> &'static str {
        match self {
            Response::Help(_) => HELP,
            Response::Ping => PING,
            Response::Put => PUT,
            Response::Get(_) => GET,
            Response::Delete => DELETE,
            Response::Join => JOIN,
            Response::Dump(_) => DUMP,
        }
    }

    fn into_values(self) -> Vec<String> {
        match self {
            Response::Help(commands) => commands,
            Response::Ping | Response::Put | Response::Delete | Response::Join => vec![],
            Response::Get(value) => value.into_iter().collect(),
            Response::Dump(info) => {
                let mut values = vec![
                    info.address,
                    info.id.to_string(),
                    info.predecessor.unwrap_or_default(),
                ];
                values.extend(info.successors.into_vec());
                for (key, value) in info.data.into_vec() {
                    values.push(key);
                    values.push(value);
                }
                values
            }
        }
    }

    fn from_parts(method: &str, values: Vec<String>) -> Result<Response, MessageError> {
        let invalid = || MessageError::InvalidResponse(method.to_string());

        match method {
            HELP => Ok(Response::Help(values)),
            GET => match values.len() {
                0 => Ok(Response::Get(None)),
                1 => Ok(Response::Get(values.into_iter().next())),
                _ => Err(invalid()),
            },
            PING | PUT | DELETE | JOIN => {
                if !values.is_empty() {
                    return Err(invalid());
                }

                Ok(match method {
                    PING => Response::Ping,
                    PUT => Response::Put,
                    DELETE => Response::Delete,
                    _ => Response::Join,
                })
            }
            DUMP => {
                let header = 3 + SUCCESSOR_LIST_SIZE;
                if values.len() < header || (values.len() - header) % 2 != 0 {
                    return Err(invalid());
                }

                let mut values = values.into_iter();
                let mut next = || values.next().unwrap_or_default();

                let address = next();
                let id: Id = next().parse().map_err(|_| invalid())?;
                let predecessor = Some(next()).filter(|p| !p.is_empty());
                let successors: Box<[String]> = (0..SUCCESSOR_LIST_SIZE).map(|_| next()).collect();

                let rest: Vec<String> = values.collect();
                let data = rest
                    .chunks_exact(2)
                    .map(|pair| (pair[0].clone(), pair[1].clone()))
                    .collect();

                Ok(Response::Dump(Info {
                    address,
                    id,
                    successors,
                    predecessor,
                    data,
                }))
            }
            _ => Err(MessageError::UnknownMethod(method.to_string())),
        }
    }
}

impl Message {
    fn into_serde_message(self) -> RpcMessage {
        match self {
            Message::Request(request) => RpcMessage::Request {
                method: request.method().to_string(),
                arguments: request.into_arguments(),
            },
            Message::Response(response) => RpcMessage::Response {
                method: response.method().to_string(),
                values: response.into_values(),
            },
            Message::Error(error) => RpcMessage::Error {
                description: error.description,
            },
        }
    }

    fn from_serde_message(msg: RpcMessage) -> Result<Message, MessageError> {
        Ok(match msg {
            RpcMessage::Request { method, arguments } => {
                Message::Request(Request::from_parts(&method, arguments)?)
            }
            RpcMessage::Response { method, values } => {
                Message::Response(Response::from_parts(&method, values)?)
            }
            RpcMessage::Error { description } => Message::Error(ErrorSpecific { description }),
        })
    }

    pub fn from_bytes<T: AsRef<[u8]>>(bytes: T) -> Result<Message, MessageError> {
        Message::from_serde_message(RpcMessage::from_bytes(bytes)?)
    }

    pub fn to_bytes(self) -> Result<Vec<u8>, MessageError> {
        Ok(self.into_serde_message().to_bytes()?)
    }
}

#[derive(thiserror::Error, Debug)]
/// Errors decoding or validating rpc messages.
pub enum MessageError {
    /// Errors related to parsing bencoded messages.
    #[error("Failed to parse message bytes: {0}")]
    BencodeError(#[from] serde_bencode::Error),

    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    #[error("Method {method} expects {expected} arguments, got {got}")]
    InvalidArguments {
        method: String,
        expected: usize,
        got: usize,
    },

    #[error("Malformed {0} response")]
    InvalidResponse(String),
}
