use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction { Long, Short }

impl Direction {
    /// Case-insensitive parse of a captured direction (`Long`, `SHORT`, ...).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "long" => Some(Self::Long),
            "short" => Some(Self::Short),
            _ => None,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self { Self::Long => "LONG", Self::Short => "SHORT" })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractKind { DirectMint, ExplorerLink, LabeledField, LinkField }

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractInfo { pub kind: ContractKind, pub chain: String, pub contract: String, pub url: String }

impl ContractInfo {
    pub fn new(kind: ContractKind, chain: &str, contract: &str) -> Self {
        Self {
            kind,
            chain: chain.to_string(),
            contract: contract.to_string(),
            url: format!("https://gmgn.ai/{}/token/{}", chain, contract),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Signal {
    pub ticker: String,
    pub direction: Option<Direction>,
    /// Direction exactly as the source wrote it.
    pub direction_raw: Option<String>,
    pub contract: Option<ContractInfo>,
    pub source: String,
    pub message_id: i64,
    pub received_at: DateTime<Utc>,
}

impl Signal {
    pub fn mexc_symbol(&self) -> String {
        format!("MEXC:{}USDT.p", self.ticker)
    }
}

/// One event as delivered by the chat bridge.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundEvent {
    pub sender: String,
    #[serde(default)]
    pub text: String,
    pub message_id: i64,
    /// Hidden link entities and inline button URLs.
    #[serde(default)]
    pub urls: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("undecodable msgpack frame: {0}")]
    MsgPack(#[from] rmp_serde::decode::Error),
    #[error("undecodable json frame: {0}")]
    Json(#[from] serde_json::Error),
    #[error("event {0} from {1} carries no text")]
    Empty(i64, String),
}

impl InboundEvent {
    pub fn from_msgpack(data: &[u8]) -> Result<Self, EventError> {
        Ok(rmp_serde::from_slice(data)?)
    }

    pub fn from_json(data: &str) -> Result<Self, EventError> {
        Ok(serde_json::from_str(data)?)
    }

    /// Text the engine scans: the message body followed by every embedded URL,
    /// since the contract locator only looks at plain text.
    pub fn scan_text(&self) -> Result<String, EventError> {
        if self.text.trim().is_empty() && self.urls.is_empty() {
            return Err(EventError::Empty(self.message_id, self.sender.clone()));
        }
        if self.urls.is_empty() {
            return Ok(self.text.clone());
        }
        Ok(format!("{}\n{}", self.text, self.urls.join(" \n")))
    }
}
