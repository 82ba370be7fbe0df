use crate::config::ForwardingCfg;
use crate::types::Signal;
use reqwest::Client;
use tokio::sync::mpsc;
use tracing::{info, warn};

pub const FORWARD_QUEUE: usize = 1000;

/// Posts accepted signals to a webhook as JSON.
#[derive(Clone)]
pub struct WebhookClient {
    client: Client,
    url: String,
    token: Option<String>,
}

impl WebhookClient {
    pub fn new(cfg: &ForwardingCfg) -> Self {
        Self {
            client: Client::new(),
            url: cfg.url.clone(),
            token: cfg.token.clone(),
        }
    }

    pub async fn post(&self, signal: &Signal) -> Result<(), reqwest::Error> {
        let mut request = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(signal);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }
        request.send().await?.error_for_status()?;
        Ok(())
    }
}

/// Spawns the forwarding task and returns the sender feeding it.
pub fn spawn(cfg: &ForwardingCfg) -> mpsc::Sender<Signal> {
    let (tx, rx) = mpsc::channel::<Signal>(FORWARD_QUEUE);
    let client = WebhookClient::new(cfg);
    info!("[Forwarder] forwarding signals to {}", client.url);
    tokio::spawn(run(client, rx));
    tx
}

async fn run(client: WebhookClient, mut rx: mpsc::Receiver<Signal>) {
    while let Some(signal) = rx.recv().await {
        match client.post(&signal).await {
            Ok(()) => info!("[Forwarder] forwarded {} from {}", signal.ticker, signal.source),
            Err(e) => warn!("[Forwarder] failed to forward {}: {}", signal.ticker, e),
        }
    }
}
