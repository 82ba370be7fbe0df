use crate::chains;
use crate::types::{ContractInfo, ContractKind};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

lazy_static! {
    static ref MINT_RE: Regex = Regex::new(r"\b([1-9A-HJ-NP-Za-km-z]{32,44})\b").unwrap();
    static ref SOLANA_MARKER_RE: Regex = Regex::new(r"(?i)(#SOLANA\b|\bsolana\b|\bSOL\b)").unwrap();
    static ref GMGN_RE: Regex =
        Regex::new(r"gmgn\.ai/(\w+)/token/(0x[a-fA-F0-9]+|[1-9A-HJ-NP-Za-km-z]+)").unwrap();
    static ref CA_RE: Regex = Regex::new(r"CA:\s*(\S+)").unwrap();
    static ref CHAIN_RE: Regex = Regex::new(r"Chain:\s*(\w+)").unwrap();
    static ref CONTRACT_RE: Regex = Regex::new(r"(?i)contract:\s*(\S+)").unwrap();
    static ref NETWORK_RE: Regex = Regex::new(r"(?i)network:\s*(\w+)").unwrap();
    static ref DEX_CHAIN_RE: Regex = Regex::new(r"dexscreener\.com/(\w+)/").unwrap();
    static ref DEX_LINK_RE: Regex = Regex::new(r"dexscreener\.com/(\w+)/([^)\s]+)").unwrap();
}

const FALLBACK_CHAIN: &str = "ethereum";

type Strategy = fn(&str) -> Option<ContractInfo>;

// Priority order; the first strategy that matches wins.
const STRATEGIES: &[(&str, Strategy)] = &[
    ("direct_mint", direct_mint),
    ("explorer_link", explorer_link),
    ("ca_field", ca_field),
    ("contract_field", contract_field),
    ("dexscreener_link", dexscreener_link),
];

/// Finds the token contract referenced by a message, if any.
pub fn locate(message: &str) -> Option<ContractInfo> {
    let found = STRATEGIES.iter().find_map(|(name, strategy)| {
        strategy(message).map(|info| {
            debug!("[Contract] {} matched {}/{}", name, info.chain, info.contract);
            info
        })
    });
    if found.is_none() {
        debug!("[Contract] no contract in message");
    }
    found
}

/// Heuristic: any base58-looking token plus a Solana marker anywhere in the
/// message is taken as a Solana mint. Over-matches when a long alphanumeric
/// token happens to sit next to an unrelated "sol"; kept as is until the
/// intended behaviour is confirmed.
fn direct_mint(message: &str) -> Option<ContractInfo> {
    let mint = MINT_RE.captures(message)?.get(1)?.as_str();
    if !SOLANA_MARKER_RE.is_match(message) {
        return None;
    }
    Some(ContractInfo::new(ContractKind::DirectMint, "sol", mint))
}

// Chain is taken verbatim: gmgn links already carry the canonical code.
fn explorer_link(message: &str) -> Option<ContractInfo> {
    let caps = GMGN_RE.captures(message)?;
    Some(ContractInfo::new(ContractKind::ExplorerLink, &caps[1], &caps[2]))
}

fn ca_field(message: &str) -> Option<ContractInfo> {
    let contract = first_capture(&CA_RE, message)?;
    let chain = first_capture(&CHAIN_RE, message)
        .or_else(|| first_capture(&DEX_CHAIN_RE, message))
        .unwrap_or(FALLBACK_CHAIN);
    Some(ContractInfo::new(ContractKind::LabeledField, &chains::normalize(chain), contract))
}

fn contract_field(message: &str) -> Option<ContractInfo> {
    let contract = first_capture(&CONTRACT_RE, message)?;
    let chain = first_capture(&NETWORK_RE, message)
        .or_else(|| first_capture(&DEX_CHAIN_RE, message))
        .unwrap_or(FALLBACK_CHAIN);
    Some(ContractInfo::new(ContractKind::LabeledField, &chains::normalize(chain), contract))
}

fn dexscreener_link(message: &str) -> Option<ContractInfo> {
    let caps = DEX_LINK_RE.captures(message)?;
    Some(ContractInfo::new(ContractKind::LinkField, &chains::normalize(&caps[1]), &caps[2]))
}

fn first_capture<'a>(re: &Regex, message: &'a str) -> Option<&'a str> {
    re.captures(message).and_then(|c| c.get(1)).map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOL_MINT: &str = "7GCihgDB8fe6KNjn2MYtkzZcRjQy3t9GHdC8uHYmW2hr";

    #[test]
    fn mint_needs_solana_marker() {
        let with_marker = format!("new launch #SOLANA {}", SOL_MINT);
        let info = locate(&with_marker).unwrap();
        assert_eq!(info.kind, ContractKind::DirectMint);
        assert_eq!(info.chain, "sol");
        assert_eq!(info.contract, SOL_MINT);

        let without = format!("new launch {}", SOL_MINT);
        assert!(direct_mint(&without).is_none());
    }

    #[test]
    fn sol_marker_must_stand_alone() {
        let msg = format!("console {} solar", SOL_MINT);
        assert!(direct_mint(&msg).is_none());
        let msg = format!("price in Sol: {}", SOL_MINT);
        assert!(direct_mint(&msg).is_some());
    }

    #[test]
    fn hashtag_marker_needs_word_boundary() {
        assert!(direct_mint(&format!("#SOLANAX {}", SOL_MINT)).is_none());
        assert!(direct_mint(&format!("#solana: {}", SOL_MINT)).is_some());
    }

    #[test]
    fn hex_addresses_are_not_mints() {
        let msg = "solana CA: 0x25118290e6A5f4139381D072181157035864099d";
        assert!(direct_mint(msg).is_none());
    }

    #[test]
    fn gmgn_link_keeps_chain_verbatim() {
        let info = explorer_link("GMGN (https://gmgn.ai/eth/token/0x50d1c9771902476076ecfc8b2a83ad6b9355a4c9)").unwrap();
        assert_eq!(info.chain, "eth");
        assert_eq!(info.contract, "0x50d1c9771902476076ecfc8b2a83ad6b9355a4c9");
        assert_eq!(info.kind, ContractKind::ExplorerLink);

        let info = explorer_link(&format!("https://gmgn.ai/sol/token/{}", SOL_MINT)).unwrap();
        assert_eq!(info.contract, SOL_MINT);
    }

    #[test]
    fn ca_field_chain_resolution_order() {
        let explicit = "CA: 0xabc\nChain: arbitrum\n(https://dexscreener.com/bsc/0xabc)";
        assert_eq!(ca_field(explicit).unwrap().chain, "arb");

        let from_link = "Price (https://dexscreener.com/bsc/0xabc): 1\nCA: 0xabc";
        assert_eq!(ca_field(from_link).unwrap().chain, "bsc");

        let fallback = "CA: 0xabc";
        assert_eq!(ca_field(fallback).unwrap().chain, "eth");
    }

    #[test]
    fn contract_field_is_case_insensitive() {
        let info = contract_field("NETWORK: Polygon\nContract: 0xdef").unwrap();
        assert_eq!(info.chain, "polygon");
        assert_eq!(info.contract, "0xdef");
    }

    #[test]
    fn bare_dexscreener_link() {
        let info = locate("chart (https://dexscreener.com/base/0x1234abcd) now").unwrap();
        assert_eq!(info.kind, ContractKind::LinkField);
        assert_eq!(info.chain, "base");
        assert_eq!(info.contract, "0x1234abcd");
        assert_eq!(info.url, "https://gmgn.ai/base/token/0x1234abcd");
    }

    #[test]
    fn nothing_found() {
        assert!(locate("BTC pumping, no links here").is_none());
    }
}
