//! Tests for configuration loading and required fields.

use std::fs;
use std::io::Write;

use tempfile::{NamedTempFile, tempdir};

use super::*;

mod required_fields {
    use super::*;

    #[test]
    fn missing_url_returns_error() {
        let result = ValidatedConfig::from_raw(&cli(&[]), None);

        assert!(matches!(
            result,
            Err(ConfigError::MissingRequired { field: "url", .. })
        ));
    }

    #[test]
    fn url_from_cli() {
        let config = ValidatedConfig::from_raw(&cli(&["--url", "https://example.com"]), None).unwrap();

        assert_eq!(config.request.url().unwrap().as_str(), "https://example.com/");
    }

    #[test]
    fn url_from_toml() {
        let toml = toml(
            r#"
            [request]
            url = "https://example.com/api"
        "#,
        );

        let config = ValidatedConfig::from_raw(&cli(&[]), Some(&toml)).unwrap();

        assert_eq!(config.request.url().unwrap().as_str(), "https://example.com/api");
    }

    #[test]
    fn invalid_url_returns_error() {
        let result = ValidatedConfig::from_raw(&cli(&["--url", "not a url"]), None);

        assert!(matches!(
            result,
            Err(ConfigError::Request(
                crate::dispatch::RequestError::InvalidUri { .. }
            ))
        ));
    }

    #[test]
    fn insecure_url_is_accepted_by_config() {
        // The URL safety filter refuses it at send time, not at load time
        let result = ValidatedConfig::from_raw(&cli(&["--url", "http://example.com"]), None);

        assert!(result.is_ok());
    }
}

mod config_load {
    use super::*;

    #[test]
    fn load_from_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [request]
            url = "https://example.com/api"
            method = "POST"
        "#
        )
        .unwrap();

        let cli = cli(&["--config", file.path().to_str().unwrap()]);
        let config = ValidatedConfig::load(&cli).unwrap();

        assert_eq!(config.request.url().unwrap().as_str(), "https://example.com/api");
        assert_eq!(config.request.method(), &http::Method::POST);
    }

    #[test]
    fn load_without_config_file() {
        let cli = cli(&["--url", "https://example.com"]);
        let config = ValidatedConfig::load(&cli).unwrap();

        assert_eq!(config.request.method(), &http::Method::GET);
    }

    #[test]
    fn load_nonexistent_config_file_returns_error() {
        let cli = cli(&["--config", "nonexistent_file_12345.toml"]);
        let result = ValidatedConfig::load(&cli);

        assert!(matches!(result, Err(ConfigError::FileRead { .. })));
    }

    #[test]
    fn load_malformed_config_file_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[request\nurl = ").unwrap();

        let cli = cli(&["--config", file.path().to_str().unwrap()]);
        let result = ValidatedConfig::load(&cli);

        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }
}

mod write_config {
    use super::super::super::validated::write_default_config;
    use super::*;

    #[test]
    fn write_default_config_creates_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test-config.toml");

        write_default_config(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("[request]"));
        assert!(TomlConfig::parse(&content).is_ok());
    }

    #[test]
    fn write_to_missing_directory_returns_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("config.toml");

        let result = write_default_config(&path);

        assert!(matches!(result, Err(ConfigError::FileWrite { .. })));
    }
}

mod display {
    use super::*;

    #[test]
    fn display_summarizes_config() {
        let config = ValidatedConfig::from_raw(
            &cli(&["--url", "https://example.com/x", "--block-host", "abc"]),
            None,
        )
        .unwrap();

        let rendered = config.to_string();

        assert!(rendered.contains("url: https://example.com/x"));
        assert!(rendered.contains("method: GET"));
        assert!(rendered.contains("blocked_hosts: 1"));
        assert!(rendered.contains("log: true"));
    }
}
