#![doc = include_str!("../README.md")]
//! ## Feature flags
#![doc = document_features::document_features!()]
//!

// Public modules
mod common;
mod error;

pub mod actor;
pub mod rpc;
pub mod session;

pub use crate::common::{messages, ring_offset, Id, Info, Node, ID_BITS, ID_SIZE, SUCCESSOR_LIST_SIZE};
pub use crate::error::{Error, Result};
pub use actor::{StateOwner, StateOwnerError};
pub use rpc::{call, CallError, Client, Config, Rpc, Server};
pub use session::{Session, SessionError};
