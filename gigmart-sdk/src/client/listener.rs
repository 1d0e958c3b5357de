//! Notification channel listener.

use futures_util::StreamExt;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

use super::ClientError;
use crate::objects::{AudienceRole, ServerEnvelope};

/// A live subscription to the server's notification channel.
///
/// The first envelope received is always the connection acknowledgement.
pub struct EventListener {
    stream: WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
}

impl EventListener {
    /// Connect to `GET /ws/auth/{token}`.
    ///
    /// `base_url` must use the `ws` or `wss` scheme.
    pub async fn connect(base_url: &Url, token: &str) -> Result<Self, ClientError> {
        Self::open(base_url.join(&format!("/ws/auth/{token}"))?).await
    }

    /// Connect to `GET /ws/audience/{audience}/{token}`.
    ///
    /// The server closes with `4003` if `audience` does not belong to the
    /// token's role.
    pub async fn connect_audience(
        base_url: &Url,
        audience: AudienceRole,
        token: &str,
    ) -> Result<Self, ClientError> {
        Self::open(base_url.join(&format!("/ws/audience/{}/{token}", audience.as_str()))?).await
    }

    async fn open(url: Url) -> Result<Self, ClientError> {
        let (stream, _response) = connect_async(url.as_str()).await?;
        Ok(Self { stream })
    }

    /// Wait for the next envelope.
    ///
    /// Returns `None` once the server closes the connection normally.
    pub async fn next_envelope(&mut self) -> Option<Result<ServerEnvelope, ClientError>> {
        while let Some(frame) = self.stream.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    return Some(serde_json::from_str(&text).map_err(ClientError::Json));
                }
                Ok(Message::Close(Some(close))) if close.code != CloseCode::Normal => {
                    return Some(Err(ClientError::Closed {
                        code: close.code.into(),
                        reason: close.reason.to_string(),
                    }));
                }
                Ok(Message::Close(_)) => return None,
                Ok(_) => continue,
                Err(e) => return Some(Err(e.into())),
            }
        }
        None
    }
}
