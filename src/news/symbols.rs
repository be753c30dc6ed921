//! Best-guess ticker extraction from a headline.
//!
//! Patterns run in strict precedence order, stopping at the first match, so
//! explicit low-false-positive markers win before the noisy all-caps
//! fallback gets a look.

use regex::Regex;
use std::collections::HashSet;

/// Acronyms and common words the all-caps fallback must never treat as a
/// ticker. Known precision trade-off: any 1-5 letter acronym outside this
/// list still matches.
const STOPWORDS: &[&str] = &[
    "THE", "AND", "FOR", "WITH", "FROM", "THIS", "WALL", "STREET", "CNBC", "MARKET", "NEWS",
    "FED", "ECB", "BOE", "OPEC", "GDP", "CPI", "PPI", "EPS", "ETF", "IPO", "AI", "USA", "US",
    "MORE", "LIVE", "DAILY", "TODAY", "BREAKING", "UPDATE", "UPDATES", "TOP", "OF", "IN",
    "ON", "AT", "WARNS", "SAYS",
];

pub struct SymbolDetector {
    cashtag: Regex,
    parenthesized: Regex,
    exchange_prefixed: Regex,
    all_caps: Regex,
    stopwords: HashSet<&'static str>,
}

impl SymbolDetector {
    pub fn new() -> Self {
        Self {
            cashtag: Regex::new(r"\$([A-Z]{1,5})\b").unwrap(),
            parenthesized: Regex::new(r"\(([A-Z]{1,5})\)").unwrap(),
            exchange_prefixed: Regex::new(r"\b(?:NASDAQ|NYSE|AMEX|LSE|TSX)[:\s\-]+([A-Z]{1,5})\b")
                .unwrap(),
            all_caps: Regex::new(r"\b([A-Z]{1,5})\b").unwrap(),
            stopwords: STOPWORDS.iter().copied().collect(),
        }
    }

    /// First match across the precedence chain, or None.
    pub fn detect(&self, title: &str) -> Option<String> {
        for pattern in [&self.cashtag, &self.parenthesized, &self.exchange_prefixed] {
            if let Some(caps) = pattern.captures(title) {
                return Some(caps[1].to_uppercase());
            }
        }

        self.all_caps
            .captures_iter(title)
            .map(|caps| caps[1].to_string())
            .find(|word| !self.stopwords.contains(word.as_str()))
    }
}

impl Default for SymbolDetector {
    fn default() -> Self {
        Self::new()
    }
}
