use lazy_static::lazy_static;
use regex::Regex;

/// Which capture group of a grammar's pattern carries which field.
/// Sources disagree on group order, so every grammar states it explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLayout {
    pub ticker_group: usize,
    pub direction_group: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct SourceGrammar {
    pub name: String,
    pub sender_identifier: String,
    pub ticker_pattern: Regex,
    pub field_layout: FieldLayout,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted<'g> {
    pub ticker: String,
    /// As captured; sources mix `Long`, `LONG`, ...
    pub direction: Option<String>,
    pub grammar: &'g SourceGrammar,
}

impl PartialEq for SourceGrammar {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for SourceGrammar {}

#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    #[error("grammar {name}: invalid pattern: {source}")]
    Pattern { name: String, source: regex::Error },
    #[error("grammar {name}: capture group {group} not present in pattern ({available} groups)")]
    MissingGroup { name: String, group: usize, available: usize },
    #[error("grammar {name}: ticker and direction share capture group {group}")]
    SharedGroup { name: String, group: usize },
}

impl SourceGrammar {
    pub fn new(
        name: &str,
        sender_identifier: &str,
        pattern: &str,
        field_layout: FieldLayout,
        enabled: bool,
    ) -> Result<Self, GrammarError> {
        let ticker_pattern = Regex::new(pattern).map_err(|source| GrammarError::Pattern {
            name: name.to_string(),
            source,
        })?;

        // captures_len counts group 0 as well
        let available = ticker_pattern.captures_len() - 1;
        let groups = std::iter::once(field_layout.ticker_group).chain(field_layout.direction_group);
        for group in groups {
            if group == 0 || group > available {
                return Err(GrammarError::MissingGroup { name: name.to_string(), group, available });
            }
        }
        if field_layout.direction_group == Some(field_layout.ticker_group) {
            return Err(GrammarError::SharedGroup { name: name.to_string(), group: field_layout.ticker_group });
        }

        Ok(Self {
            name: name.to_string(),
            sender_identifier: sender_identifier.to_string(),
            ticker_pattern,
            field_layout,
            enabled,
        })
    }

    pub fn matches_sender(&self, sender: &str) -> bool {
        let sender = sender.trim_start_matches('@');
        self.sender_identifier == sender || self.name == sender
    }

    /// Single search; only the first occurrence counts.
    pub fn extract(&self, message: &str) -> Option<Extracted<'_>> {
        let caps = self.ticker_pattern.captures(message)?;
        let ticker = caps.get(self.field_layout.ticker_group)?.as_str().to_string();
        let direction = self
            .field_layout
            .direction_group
            .and_then(|g| caps.get(g))
            .map(|m| m.as_str().to_string());
        Some(Extracted { ticker, direction, grammar: self })
    }
}

/// Tries the grammars in order and returns the first that matches.
pub fn classify_and_extract<'g>(message: &str, grammars: &'g [SourceGrammar]) -> Option<Extracted<'g>> {
    grammars
        .iter()
        .filter(|g| g.enabled)
        .find_map(|g| g.extract(message))
}

pub struct BuiltinGrammar {
    pub name: &'static str,
    pub sender: &'static str,
    pub pattern: &'static str,
    pub layout: FieldLayout,
}

lazy_static! {
    // Built-in sources:
    // - mexcTracker:        "DEXE | 8.17% | Long"            ticker=1, direction=2
    // - kormushka_mexc:     "FTT +3.61% in 10 secs!"         ticker=1, no direction
    // - pumply_futures_dex: "🔻 SHORT $RICE +6.32% on MEXC"  direction=1, ticker=2
    pub static ref BUILTIN_GRAMMARS: Vec<BuiltinGrammar> = vec![
        BuiltinGrammar {
            name: "mexcTracker",
            sender: "mexcTracker",
            pattern: r"(\w+)\s+\|\s+[\d.]+%\s+\|\s+(Long|Short)",
            layout: FieldLayout { ticker_group: 1, direction_group: Some(2) },
        },
        BuiltinGrammar {
            name: "kormushka_mexc",
            sender: "kormushka_mexc",
            pattern: r"(\w+)\s+\+[\d.]+%\s+in\s+\d+\s+secs!",
            layout: FieldLayout { ticker_group: 1, direction_group: None },
        },
        BuiltinGrammar {
            name: "pumply_futures_dex",
            sender: "pumply_futures_dex",
            pattern: r"🔻\s+(SHORT|LONG)\s+\$(\w+)\s+\+[\d.]+%\s+on\s+MEXC",
            layout: FieldLayout { ticker_group: 2, direction_group: Some(1) },
        },
    ];
}

pub fn builtin_grammars() -> Result<Vec<SourceGrammar>, GrammarError> {
    BUILTIN_GRAMMARS
        .iter()
        .map(|b| SourceGrammar::new(b.name, b.sender, b.pattern, b.layout, true))
        .collect()
}
