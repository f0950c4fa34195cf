use crate::common::{Id, Node};

/// Read-only snapshot of a [Node], as printed by `dump`.
#[derive(Debug, Clone, PartialEq)]
pub struct Info {
    pub(crate) address: String,
    pub(crate) id: Id,
    pub(crate) successors: Box<[String]>,
    pub(crate) predecessor: Option<String>,
    pub(crate) data: Box<[(String, String)]>,
}

impl Info {
    /// Address the node was created with.
    pub fn address(&self) -> &str {
        &self.address
    }
    /// This Node's [Id]
    pub fn id(&self) -> &Id {
        &self.id
    }
    /// Successor list, closest first.
    pub fn successors(&self) -> &[String] {
        &self.successors
    }
    /// Predecessor address, `None` if unknown.
    pub fn predecessor(&self) -> Option<&str> {
        self.predecessor.as_deref()
    }
    /// Stored key/value pairs sorted by key.
    pub fn data(&self) -> &[(String, String)] {
        &self.data
    }
}

impl From<&Node> for Info {
    fn from(node: &Node) -> Self {
        let mut data: Vec<(String, String)> = node
            .data()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        data.sort();

        Self {
            address: node.address().to_string(),
            id: *node.id(),
            successors: node.successors().to_vec().into(),
            predecessor: node.predecessor().map(String::from),
            data: data.into(),
        }
    }
}
