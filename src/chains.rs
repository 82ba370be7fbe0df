use lazy_static::lazy_static;
use std::collections::HashMap;

lazy_static! {
    // Free-text chain names as bots write them -> short codes used in gmgn.ai paths.
    static ref CHAIN_CODES: HashMap<&'static str, &'static str> = HashMap::from([
        ("ethereum", "eth"),
        ("arbitrum", "arb"),
        ("bsc", "bsc"),
        ("polygon", "polygon"),
        ("base", "base"),
        ("solana", "sol"),
        ("sol", "sol"),
        ("avalanche", "avax"),
        ("bep20", "bsc"),
    ]);
}

/// Maps a chain name to its canonical short code.
///
/// Unknown names pass through lower-cased: a guessed code still yields an
/// explorer URL worth trying, so this never fails.
pub fn normalize(raw_chain: &str) -> String {
    let folded = raw_chain.to_lowercase();
    match CHAIN_CODES.get(folded.as_str()) {
        Some(&code) => code.to_string(),
        None => folded,
    }
}
