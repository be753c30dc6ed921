//! Unit tests for YAML configuration loading.

#[cfg(test)]
mod config_tests {
    use crate::config::AppConfig;
    use crate::error::ConfigError;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_minimal_config_gets_defaults() {
        let file = write_config("symbols:\n  - aapl\n  - msft\n");
        let config = AppConfig::load_from(file.path().to_str().unwrap()).unwrap();

        assert_eq!(config.symbols, vec!["aapl", "msft"]);
        assert_eq!(config.history_days, 365);
        assert_eq!(config.settings_file, "settings.json");
        assert_eq!(config.quotes.refresh_seconds, 5);
        assert_eq!(config.news.refresh_seconds, 8);
        assert_eq!(config.news.feeds.len(), 4);
        assert!(config.endpoints.chart_base.contains("/v8/finance/chart"));
        assert!(config.endpoints.quote_base.contains("/v7/finance/quote"));
    }

    #[test]
    fn test_full_config_overrides_defaults() {
        let yaml = r#"
symbols: ["SPY"]
history_days: 30
settings_file: /tmp/deck-settings.json
quotes:
  refresh_seconds: 15
news:
  refresh_seconds: 60
  feeds:
    - https://example.com/feed.xml
endpoints:
  chart_base: https://chart.example/v8
  quote_base: https://quote.example/v7
"#;
        let file = write_config(yaml);
        let config = AppConfig::load_from(file.path().to_str().unwrap()).unwrap();

        assert_eq!(config.history_days, 30);
        assert_eq!(config.quotes.refresh_seconds, 15);
        assert_eq!(config.news.refresh_seconds, 60);
        assert_eq!(config.news.feeds, vec!["https://example.com/feed.xml"]);
        assert_eq!(config.endpoints.chart_base, "https://chart.example/v8");
    }

    #[test]
    fn test_bom_prefix_is_stripped() {
        let file = write_config("\u{feff}symbols: [NVDA]\n");
        let config = AppConfig::load_from(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.symbols, vec!["NVDA"]);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = AppConfig::load_from("/definitely/not/here.yaml");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_invalid_yaml_is_parse_error() {
        let file = write_config("symbols: [unclosed\n");
        let result = AppConfig::load_from(file.path().to_str().unwrap());
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }
}
