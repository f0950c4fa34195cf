use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "y")]
pub enum RpcMessage {
    #[serde(rename = "q")]
    Request {
        #[serde(rename = "q")]
        method: String,

        #[serde(rename = "a", default)]
        arguments: Vec<String>,
    },

    #[serde(rename = "r")]
    Response {
        #[serde(rename = "q")]
        method: String,

        #[serde(rename = "r", default)]
        values: Vec<String>,
    },

    #[serde(rename = "e")]
    Error {
        #[serde(rename = "e")]
        description: String,
    },
}

impl RpcMessage {
    pub fn from_bytes<T: AsRef<[u8]>>(bytes: T) -> Result<RpcMessage, serde_bencode::Error> {
        let obj = serde_bencode::from_bytes(bytes.as_ref())?;
        Ok(obj)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_bencode::Error> {
        serde_bencode::to_bytes(self)
    }
}
