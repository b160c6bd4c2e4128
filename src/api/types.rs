use crate::coordinator::{PeerAddress, ProgressEvent, TransferOffer};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectRequest {
    pub address: String,
}

impl From<&PeerAddress> for ConnectRequest {
    fn from(address: &PeerAddress) -> Self {
        Self {
            address: address.as_str().to_string(),
        }
    }
}

/// Success payload of `/connect` and `/sendfile`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// Failure payload of the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}

/// Server → client frames of the push channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum PushMessage {
    FileOffer(TransferOffer),
    ProgressUpdate(ProgressEvent),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileAccept {
    pub accept: bool,
}

/// Client → server frames of the push channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    FileAccept(FileAccept),
}
