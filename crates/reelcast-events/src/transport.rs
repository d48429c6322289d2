//! Connections to the notification broker.

use std::pin::Pin;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reelcast_core::ClientConfig;
use reqwest::header::ACCEPT;
use reqwest::{Client, Url};

use crate::sse::SseParser;

/// Raw payloads of one connection, in broker order. The stream ends when the
/// broker closes the connection.
pub type MessageStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

#[async_trait]
pub trait BrokerTransport: Send + Sync + 'static {
    /// Open one connection on `topic`.
    async fn connect(&self, topic: &str) -> Result<MessageStream>;
}

/// Broker reached over Server-Sent Events at `<broker>/events?topic=<topic>`.
#[derive(Debug, Clone)]
pub struct SseBrokerTransport {
    client: Client,
    broker_url: String,
    api_key: Option<String>,
}

impl SseBrokerTransport {
    pub fn new(broker_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            broker_url: broker_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.broker_url.clone(), config.api_key.clone())
    }

    pub fn events_url(&self, topic: &str) -> Result<Url> {
        Url::parse_with_params(&format!("{}/events", self.broker_url), &[("topic", topic)])
            .context("Invalid broker URL")
    }
}

#[async_trait]
impl BrokerTransport for SseBrokerTransport {
    async fn connect(&self, topic: &str) -> Result<MessageStream> {
        let url = self.events_url(topic)?;
        let mut request = self
            .client
            .get(url)
            .header(ACCEPT, "text/event-stream");
        if let Some(key) = &self.api_key {
            request = request.header("X-API-Key", key.as_str());
        }

        let response = request
            .send()
            .await
            .context("Failed to connect to broker")?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Broker responded with status {}", status);
        }

        let mut bytes = response.bytes_stream();
        let stream: MessageStream = Box::pin(async_stream::try_stream! {
            let mut parser = SseParser::new();
            while let Some(chunk) = bytes.next().await {
                let chunk = chunk.context("Broker stream interrupted")?;
                for frame in parser.feed(&chunk) {
                    if frame.is_message() {
                        yield frame.data;
                    }
                }
            }
        });

        Ok(stream)
    }
}
