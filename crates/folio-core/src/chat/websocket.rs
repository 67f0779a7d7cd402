//! WebSocket transport for the chat channel. Frames are JSON text messages.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use super::{ChatConnection, ChatError, ChatTransport, InboundChatFrame, OutboundChatFrame};

pub struct WebSocketTransport {
    url: String,
}

impl WebSocketTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl ChatTransport for WebSocketTransport {
    async fn connect(&self) -> Result<Box<dyn ChatConnection>, ChatError> {
        let (stream, _response) = connect_async(self.url.as_str())
            .await
            .map_err(|e| ChatError::Connect(e.to_string()))?;
        tracing::debug!(url = %self.url, "chat websocket connected");
        Ok(Box::new(WebSocketConnection { stream }))
    }
}

struct WebSocketConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl ChatConnection for WebSocketConnection {
    async fn send(&mut self, frame: OutboundChatFrame) -> Result<(), ChatError> {
        let payload = serde_json::to_string(&frame).map_err(|e| ChatError::Codec(e.to_string()))?;
        self.stream
            .send(Message::Text(payload))
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))
    }

    async fn next(&mut self) -> Option<Result<InboundChatFrame, ChatError>> {
        loop {
            let message = self.stream.next().await?;
            match message {
                Ok(Message::Text(payload)) => {
                    return Some(
                        serde_json::from_str(&payload)
                            .map_err(|e| ChatError::Codec(e.to_string())),
                    );
                }
                // Control frames and binary payloads are transport noise.
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Binary(_) | Message::Frame(_)) => {
                }
                Ok(Message::Close(_)) => return None,
                Err(e) => return Some(Err(ChatError::Transport(e.to_string()))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outbound_frame_serializes_to_the_wire_shape() {
        let frame = OutboundChatFrame {
            message: "hello".to_string(),
            token: "tok".to_string(),
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "message": "hello", "token": "tok" })
        );
    }

    #[test]
    fn inbound_frame_parses_the_wire_shape() {
        let frame: InboundChatFrame = serde_json::from_str(
            r#"{ "message": "hi", "username": "bob", "avatar": "b.png" }"#,
        )
        .unwrap();
        assert_eq!(frame.message, "hi");
        assert_eq!(frame.username, "bob");
        assert_eq!(frame.avatar, "b.png");
    }
}
