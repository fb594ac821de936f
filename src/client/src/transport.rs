use async_trait::async_trait;
use common::model::{
    game::{Card, CardEffect},
    messages::{CardQuery, ClientId, ErrorBody, IdQuery, SideQuery},
};
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::TransportError;

/// Requests the session makes of the game server. Every request carries the
/// transport's [`ClientId`].
#[async_trait]
pub trait Transport: Send + Sync {
    fn id(&self) -> ClientId;

    /// `false` when the server answered with anything but 200.
    async fn join(&self) -> Result<bool, TransportError>;

    /// `Some(message)` when the server rejected the choice.
    async fn submit_side(&self, side: bool) -> Result<Option<String>, TransportError>;

    /// `Some(message)` when the server rejected the card.
    async fn submit_card(
        &self,
        card: Card,
        effect: CardEffect,
    ) -> Result<Option<String>, TransportError>;

    async fn fetch_snapshot(&self) -> Result<Value, TransportError>;
}

pub struct HttpTransport {
    client: Client,
    base: Url,
    id: ClientId,
}

impl HttpTransport {
    pub fn new(base: Url) -> Self {
        HttpTransport {
            client: Client::new(),
            base,
            id: ClientId::new(),
        }
    }

    pub async fn pass(&self) -> Result<Option<String>, TransportError> {
        self.submit_card(Card::Pass, CardEffect::Pass).await
    }

    fn url(&self, endpoint: &'static str) -> Result<Url, TransportError> {
        self.base.join(endpoint).map_err(|e| TransportError::Url {
            endpoint,
            detail: e.to_string(),
        })
    }

    async fn get<Q>(
        &self,
        endpoint: &'static str,
        query: &Q,
    ) -> Result<reqwest::Response, TransportError>
    where
        Q: Serialize + Sync,
    {
        let url = self.url(endpoint)?;
        self.client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|source| TransportError::Request { endpoint, source })
    }

    // Shared by /side and /card: an empty body is success, otherwise the body
    // carries the rejection.
    async fn command<Q>(
        &self,
        endpoint: &'static str,
        query: &Q,
    ) -> Result<Option<String>, TransportError>
    where
        Q: Serialize + Sync,
    {
        debug!("Sending '{}' request", endpoint);
        let response = self.get(endpoint, query).await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(TransportError::Status { endpoint, status });
        }
        let body = response
            .bytes()
            .await
            .map_err(|source| TransportError::Request { endpoint, source })?;
        if body.iter().all(u8::is_ascii_whitespace) {
            debug!("'{}' request OK", endpoint);
            return Ok(None);
        }
        let ErrorBody { error } =
            serde_json::from_slice(&body).map_err(|e| TransportError::Body {
                endpoint,
                detail: e.to_string(),
            })?;
        debug!("'{}' request error returned by server", endpoint);
        Ok(Some(error))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn id(&self) -> ClientId {
        self.id
    }

    async fn join(&self) -> Result<bool, TransportError> {
        let response = self.get("join", &IdQuery { id: self.id }).await?;
        let status = response.status();
        if status != StatusCode::OK {
            warn!("join returned HTTP {}", status);
            return Ok(false);
        }
        Ok(true)
    }

    async fn submit_side(&self, side: bool) -> Result<Option<String>, TransportError> {
        self.command("side", &SideQuery { id: self.id, side })
            .await
    }

    async fn submit_card(
        &self,
        card: Card,
        effect: CardEffect,
    ) -> Result<Option<String>, TransportError> {
        let query = CardQuery {
            id: self.id,
            card,
            card_effect: effect,
        };
        self.command("card", &query).await
    }

    async fn fetch_snapshot(&self) -> Result<Value, TransportError> {
        let endpoint = "render";
        let response = self.get(endpoint, &IdQuery { id: self.id }).await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(TransportError::Status { endpoint, status });
        }
        response.json::<Value>().await.map_err(|e| TransportError::Body {
            endpoint,
            detail: e.to_string(),
        })
    }
}
