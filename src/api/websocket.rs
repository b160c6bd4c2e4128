use crate::api::error::{ApiError, ApiResult};
use crate::api::types::{ClientMessage, FileAccept, PushMessage};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use reqwest::Url;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Push-notification channel to the backend.
pub struct PushChannel {
    socket: Socket,
}

impl PushChannel {
    pub async fn connect(url: &Url) -> ApiResult<Self> {
        let (socket, _response) = connect_async(url.as_str()).await?;
        tracing::debug!("Notification channel open at {}", url);
        Ok(Self { socket })
    }

    /// Split into independent writer and reader halves.
    pub fn split(self) -> (PushSender, PushReceiver) {
        let (sink, stream) = self.socket.split();
        (PushSender { sink }, PushReceiver { stream })
    }
}

pub struct PushSender {
    sink: SplitSink<Socket, Message>,
}

impl PushSender {
    /// Send a `file_accept` decision. Fire-and-forget: no acknowledgment exists.
    pub async fn send_decision(&mut self, accept: bool) -> ApiResult<()> {
        let frame = serde_json::to_string(&ClientMessage::FileAccept(FileAccept { accept }))?;
        self.sink.send(Message::Text(frame)).await?;
        Ok(())
    }

    pub async fn close(&mut self) -> ApiResult<()> {
        self.sink.close().await?;
        Ok(())
    }
}

pub struct PushReceiver {
    stream: SplitStream<Socket>,
}

impl PushReceiver {
    /// Next notification in arrival order.
    ///
    /// Returns `None` once the server closes the channel. Frames that are not
    /// a known notification are logged and skipped.
    pub async fn next_message(&mut self) -> Option<ApiResult<PushMessage>> {
        while let Some(frame) = self.stream.next().await {
            match frame {
                Ok(Message::Text(text)) => match decode_frame(&text) {
                    Ok(msg) => return Some(Ok(msg)),
                    Err(e) => tracing::warn!("Skipping notification frame: {}", e),
                },
                Ok(Message::Close(_)) => return None,
                Ok(_) => {}
                Err(e) => {
                    return match ApiError::from(e) {
                        ApiError::ChannelClosed => None,
                        other => Some(Err(other)),
                    }
                }
            }
        }
        None
    }
}

pub fn decode_frame(text: &str) -> ApiResult<PushMessage> {
    Ok(serde_json::from_str(text)?)
}
