//! Unit tests for headline ticker detection and its precedence order.

#[cfg(test)]
mod symbols_tests {
    use crate::news::symbols::SymbolDetector;

    #[test]
    fn test_cashtag_wins_over_everything() {
        let detector = SymbolDetector::new();
        // Both a cashtag and a parenthesized ticker present
        assert_eq!(
            detector.detect("$AAPL surges after (MSFT) deal"),
            Some("AAPL".to_string())
        );
    }

    #[test]
    fn test_parenthesized_ticker() {
        let detector = SymbolDetector::new();
        assert_eq!(
            detector.detect("Microsoft (MSFT) beats estimates"),
            Some("MSFT".to_string())
        );
    }

    #[test]
    fn test_exchange_prefixed_forms() {
        let detector = SymbolDetector::new();
        assert_eq!(detector.detect("NASDAQ: TSLA rallies"), Some("TSLA".to_string()));
        assert_eq!(detector.detect("Big move on NYSE-GE today"), Some("GE".to_string()));
        assert_eq!(detector.detect("LSE: VOD slides"), Some("VOD".to_string()));
    }

    #[test]
    fn test_all_caps_fallback_skips_stopwords() {
        let detector = SymbolDetector::new();
        // Every word here is stopworded, including the verb and preposition
        assert_eq!(detector.detect("THE FED WARNS ON GDP"), None);
        assert_eq!(detector.detect("FED WARNS ON inflation risks"), None);
        // First non-stopword all-caps token wins
        assert_eq!(
            detector.detect("FED decision lifts NVDA shares"),
            Some("NVDA".to_string())
        );
    }

    #[test]
    fn test_plain_headline_yields_none() {
        let detector = SymbolDetector::new();
        assert_eq!(detector.detect("Stocks drift ahead of earnings season"), None);
        assert_eq!(detector.detect(""), None);
    }

    #[test]
    fn test_length_bounds() {
        let detector = SymbolDetector::new();
        // Six letters is past the ticker length cap
        assert_eq!(detector.detect("GOOGLE announces new chip"), None);
        assert_eq!(detector.detect("$GOOG hits a record"), Some("GOOG".to_string()));
    }

    #[test]
    fn test_mixed_case_words_are_not_tickers() {
        let detector = SymbolDetector::new();
        assert_eq!(detector.detect("Apple unveils new iPhone lineup"), None);
    }
}
