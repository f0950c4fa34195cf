//! The mutable record of this peer's position on the ring and its local data.
use std::collections::HashMap;

use tracing::trace;

use crate::common::{Id, Info};

/// Number of entries kept in a [Node]'s successor list.
pub const SUCCESSOR_LIST_SIZE: usize = 5;

#[derive(Debug, Clone, PartialEq)]
/// This peer's state: its position on the ring, its neighbours and its store.
///
/// Only ever mutated by the [StateOwner](crate::actor::StateOwner) it is moved into.
pub struct Node {
    address: String,
    id: Id,
    successors: [String; SUCCESSOR_LIST_SIZE],
    predecessor: Option<String>,
    data: HashMap<String, String>,
}

impl Node {
    /// Creates the first node of a new ring, every successor slot points back at itself.
    pub fn create(address: &str) -> Node {
        Node::with_successor(address, address)
    }

    /// Creates a node joining an existing ring through `peer`, which seeds every
    /// successor slot until the ring grows.
    pub fn join(address: &str, peer: &str) -> Node {
        Node::with_successor(address, peer)
    }

    fn with_successor(address: &str, successor: &str) -> Node {
        Node {
            address: address.to_string(),
            id: Id::from_address(address),
            successors: std::array::from_fn(|_| successor.to_string()),
            predecessor: None,
            data: HashMap::new(),
        }
    }

    // === Getters ===

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn id(&self) -> &Id {
        &self.id
    }

    pub fn successors(&self) -> &[String; SUCCESSOR_LIST_SIZE] {
        &self.successors
    }

    /// Returns `None` while the predecessor is unknown.
    pub fn predecessor(&self) -> Option<&str> {
        self.predecessor.as_deref()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }

    /// Number of key/value pairs stored locally.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Snapshot of this node.
    pub fn info(&self) -> Info {
        Info::from(self)
    }

    pub(crate) fn data(&self) -> &HashMap<String, String> {
        &self.data
    }

    // === Mutations ===

    /// Insert or overwrite `key`, returning the previous value if any.
    pub fn put(&mut self, key: String, value: String) -> Option<String> {
        trace!(?key, "Storing value");
        self.data.insert(key, value)
    }

    /// Remove `key`, a missing key is a no-op.
    pub fn delete(&mut self, key: &str) -> Option<String> {
        trace!(?key, "Deleting value");
        self.data.remove(key)
    }

    /// Record `address` as this node's predecessor, an empty address means unknown.
    pub fn set_predecessor(&mut self, address: String) {
        trace!(?address, "Updating predecessor");
        self.predecessor = Some(address).filter(|address| !address.is_empty());
    }
}
