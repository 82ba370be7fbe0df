use crate::pipeline::Extraction;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

/// Counters kept by whoever drives the pipeline. Informational only.
#[derive(Debug, Clone, Serialize)]
pub struct RunStats {
    pub messages_seen: u64,
    pub signals_produced: u64,
    pub duplicates: u64,
    pub blacklisted_hits: u64,
    pub errors: u64,
    pub started_at: DateTime<Utc>,
    pub last_activity: Option<DateTime<Utc>>,
}

impl RunStats {
    pub fn new() -> Self {
        Self {
            messages_seen: 0,
            signals_produced: 0,
            duplicates: 0,
            blacklisted_hits: 0,
            errors: 0,
            started_at: Utc::now(),
            last_activity: None,
        }
    }

    pub fn record(&mut self, outcome: &Extraction) {
        match outcome {
            Extraction::Duplicate => {
                self.duplicates += 1;
                return;
            }
            Extraction::Accepted(_) => self.signals_produced += 1,
            Extraction::Blacklisted { .. } => self.blacklisted_hits += 1,
            Extraction::NoMatch => {}
        }
        self.messages_seen += 1;
        self.last_activity = Some(Utc::now());
    }

    pub fn record_error(&mut self) -> u64 {
        self.errors += 1;
        self.errors
    }

    pub fn log_summary(&self) {
        let uptime = Utc::now() - self.started_at;
        let last = self
            .last_activity
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "N/A".into());
        info!(
            "[Stats] processed {} messages, {} signals, {} blacklisted, {} duplicates, {} errors, uptime {}s, last activity {}",
            self.messages_seen,
            self.signals_produced,
            self.blacklisted_hits,
            self.duplicates,
            self.errors,
            uptime.num_seconds(),
            last
        );
    }
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}
