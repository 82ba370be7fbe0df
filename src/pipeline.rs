use crate::contract;
use crate::deduplication::{Blacklist, Decision, Fingerprint, SignalFilter};
use crate::grammar::{classify_and_extract, SourceGrammar};
use crate::types::{Direction, Signal};
use chrono::Utc;
use tracing::debug;

/// Result of running one message through the engine.
#[derive(Debug, Clone)]
pub enum Extraction {
    Accepted(Signal),
    Duplicate,
    NoMatch,
    Blacklisted { ticker: String },
}

impl Extraction {
    pub fn into_signal(self) -> Option<Signal> {
        match self {
            Self::Accepted(signal) => Some(signal),
            _ => None,
        }
    }
}

/// Grammar table plus filter state, built once at startup.
pub struct SignalPipeline {
    grammars: Vec<SourceGrammar>,
    filter: SignalFilter,
}

impl SignalPipeline {
    pub fn new(grammars: Vec<SourceGrammar>, blacklist: Blacklist, max_fingerprints: usize) -> Self {
        Self {
            grammars,
            filter: SignalFilter::new(max_fingerprints, blacklist),
        }
    }

    pub fn extract(&self, message: &str, source: &str, message_id: i64) -> Option<Signal> {
        self.evaluate(message, source, message_id).into_signal()
    }

    pub fn evaluate(&self, message: &str, source: &str, message_id: i64) -> Extraction {
        if self.filter.record(Fingerprint::new(source, message_id, message)) == Decision::Duplicate {
            debug!("[Pipeline] duplicate message {} from {}", message_id, source);
            return Extraction::Duplicate;
        }

        // A sender we know maps straight to its own grammar, and a disabled
        // one is dropped. Anything else is tried against every enabled
        // grammar in configured order.
        let extracted = match self.grammars.iter().find(|g| g.matches_sender(source)) {
            Some(grammar) if grammar.enabled => grammar.extract(message),
            Some(grammar) => {
                debug!("[Pipeline] {} is disabled, ignoring message {}", grammar.name, message_id);
                None
            }
            None => classify_and_extract(message, &self.grammars),
        };
        let Some(extracted) = extracted else {
            debug!("[Pipeline] no ticker in message {} from {}", message_id, source);
            return Extraction::NoMatch;
        };

        if self.filter.check_ticker(&extracted.ticker) == Decision::Blacklisted {
            return Extraction::Blacklisted { ticker: extracted.ticker };
        }

        let direction = extracted.direction.as_deref().and_then(Direction::parse);
        Extraction::Accepted(Signal {
            ticker: extracted.ticker,
            direction,
            direction_raw: extracted.direction,
            contract: contract::locate(message),
            source: extracted.grammar.name.clone(),
            message_id,
            received_at: Utc::now(),
        })
    }

    pub fn grammars(&self) -> &[SourceGrammar] {
        &self.grammars
    }

    pub fn filter(&self) -> &SignalFilter {
        &self.filter
    }
}
