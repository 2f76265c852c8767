//! Tests for TOML configuration parsing.

use super::toml::{TomlConfig, default_config_template};

mod parsing {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let toml = r#"
            [request]
            url = "https://example.com/api"
        "#;

        let config = TomlConfig::parse(toml).unwrap();
        assert_eq!(config.request.url.as_deref(), Some("https://example.com/api"));
        assert!(config.request.headers.is_empty());
        assert!(!config.request.json);
    }

    #[test]
    fn parse_full_request_section() {
        let toml = r#"
            [request]
            url = "https://api.example.com/items"
            method = "PUT"
            body = '{"name": "demo"}'
            json = true
            log = false

            [request.headers]
            X-Custom-Header = "custom-value"
            Accept = "application/json"
        "#;

        let config = TomlConfig::parse(toml).unwrap();
        let request = &config.request;

        assert_eq!(request.method.as_deref(), Some("PUT"));
        assert_eq!(request.body.as_deref(), Some(r#"{"name": "demo"}"#));
        assert!(request.json);
        assert_eq!(request.log, Some(false));
        assert_eq!(request.headers.len(), 2);
        assert_eq!(
            request.headers.get("X-Custom-Header").map(String::as_str),
            Some("custom-value")
        );
    }

    #[test]
    fn parse_transport_section() {
        let toml = r"
            [transport]
            timeout = 5
            pooled_connection_lifetime = 300
            max_connections_per_host = 16
            idle_timeout = 30
            keep_alive_interval = 10
        ";

        let config = TomlConfig::parse(toml).unwrap();
        let transport = &config.transport;

        assert_eq!(transport.timeout, Some(5));
        assert_eq!(transport.pooled_connection_lifetime, Some(300));
        assert_eq!(transport.max_connections_per_host, Some(16));
        assert_eq!(transport.idle_timeout, Some(30));
        assert_eq!(transport.keep_alive_interval, Some(10));
    }

    #[test]
    fn parse_retry_section() {
        let toml = r#"
            [retry]
            max_retries = 5
            initial_delay = 1
            max_delay = 30
            multiplier = 1.5
            status = "transient"
        "#;

        let config = TomlConfig::parse(toml).unwrap();
        let retry = &config.retry;

        assert_eq!(retry.max_retries, Some(5));
        assert_eq!(retry.initial_delay, Some(1));
        assert_eq!(retry.max_delay, Some(30));
        assert_eq!(retry.multiplier, Some(1.5));
        assert_eq!(retry.status.as_deref(), Some("transient"));
    }

    #[test]
    fn parse_filter_section() {
        let toml = r#"
            [filter]
            blocked_hosts = ["abc", "legacy.example"]
            blocked_patterns = ['\.internal$']
        "#;

        let config = TomlConfig::parse(toml).unwrap();

        assert_eq!(config.filter.blocked_hosts, vec!["abc", "legacy.example"]);
        assert_eq!(config.filter.blocked_patterns, vec![r"\.internal$"]);
    }

    #[test]
    fn parse_empty_config() {
        let config = TomlConfig::parse("").unwrap();

        assert!(config.request.url.is_none());
        assert!(config.transport.timeout.is_none());
        assert!(config.retry.max_retries.is_none());
        assert!(config.filter.blocked_hosts.is_empty());
    }
}

mod errors {
    use super::*;

    #[test]
    fn unknown_section_is_rejected() {
        let result = TomlConfig::parse("[proxy]\nurl = \"https://example.com\"");

        assert!(result.is_err());
    }

    #[test]
    fn unknown_field_is_rejected() {
        let result = TomlConfig::parse("[retry]\nmax_attempts = 3");

        assert!(result.is_err());
    }

    #[test]
    fn wrong_type_is_rejected() {
        let result = TomlConfig::parse("[transport]\ntimeout = \"fast\"");

        assert!(result.is_err());
    }
}

mod template {
    use super::*;

    #[test]
    fn template_parses_as_valid_config() {
        let config = TomlConfig::parse(&default_config_template()).unwrap();

        // Everything is commented out, so all built-in defaults apply
        assert!(config.request.url.is_none());
        assert!(config.retry.max_retries.is_none());
    }

    #[test]
    fn template_documents_every_section() {
        let template = default_config_template();

        for section in ["[request]", "[transport]", "[retry]", "[filter]"] {
            assert!(template.contains(section), "missing {section}");
        }
    }
}
