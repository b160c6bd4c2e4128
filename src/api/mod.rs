//! Client side of the transfer backend API: REST requests and the push channel.

mod error;
mod rest;
mod types;
mod websocket;

pub use error::{ApiError, ApiResult};
pub use rest::RestClient;
pub use types::*;
pub use websocket::{decode_frame, PushChannel, PushReceiver, PushSender};
