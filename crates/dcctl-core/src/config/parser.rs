//! TOML parser with helpful error messages

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;

use super::schema::ClientConfig;

/// Read and parse any TOML file, with line context on syntax errors
pub fn parse_toml_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    parse_toml_str(&content).with_context(|| format!("Failed to parse file: {}", path.display()))
}

/// Parse TOML content from string
pub fn parse_toml_str<T: DeserializeOwned>(content: &str) -> Result<T> {
    toml::from_str(content).map_err(|e| enhance_toml_error(e, content))
}

/// Parse a client config file. Required fields are not checked here since
/// the environment may still supply them.
pub fn parse_client_toml(path: &Path) -> Result<ClientConfig> {
    parse_toml_file(path)
}

pub fn parse_client_toml_str(content: &str) -> Result<ClientConfig> {
    parse_toml_str(content)
}

/// Enhance TOML parsing errors with helpful context
fn enhance_toml_error(error: toml::de::Error, content: &str) -> anyhow::Error {
    let error_msg = error.to_string();

    let line_hint = error
        .span()
        .and_then(|span| content.get(..span.start))
        .map(|prefix| prefix.matches('\n').count() + 1)
        .or_else(|| {
            error_msg
                .lines()
                .find(|line| line.contains("line "))
                .and_then(|line| {
                    line.split("line ")
                        .nth(1)
                        .and_then(|s| s.split_whitespace().next())
                        .and_then(|s| s.parse::<usize>().ok())
                })
        });

    if let Some(line_num) = line_hint {
        let context = get_line_context(content, line_num);
        anyhow::anyhow!(
            "TOML parsing error at line {}:\n{}\n\nError: {}",
            line_num,
            context,
            error_msg
        )
    } else {
        anyhow::anyhow!("TOML parsing error: {}", error_msg)
    }
}

/// Get context lines around an error
fn get_line_context(content: &str, line_num: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let start = line_num.saturating_sub(2).min(lines.len());
    let end = (line_num + 2).min(lines.len());

    lines[start..end]
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let num = start + i + 1;
            let marker = if num == line_num { ">>>" } else { "   " };
            format!("{} {:4} | {}", marker, num, line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Serialize a value to a TOML string
pub fn to_toml<T: Serialize>(value: &T) -> Result<String> {
    toml::to_string_pretty(value).with_context(|| "Failed to serialize configuration to TOML")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_valid_config() {
        let toml = r#"
organization = "acme"
deployment = "prod"
api_token = "user:abc"
timeout_secs = 10
"#;

        let config = parse_client_toml_str(toml).unwrap();
        assert_eq!(config.organization, "acme");
        assert_eq!(config.deployment, "prod");
        assert_eq!(config.timeout_secs, Some(10));
        assert!(config.version.is_none());
    }

    #[test]
    fn test_parse_empty_config() {
        let config = parse_client_toml_str("").unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_parse_invalid_toml_shows_line() {
        let toml = "organization = \"acme\"\ndeployment = prod\n";

        let err = parse_client_toml_str(toml).unwrap_err().to_string();
        assert!(err.contains("TOML parsing error"));
        assert!(err.contains(">>>"), "missing line marker in: {err}");
    }

    #[test]
    fn test_line_context_marks_target_line() {
        let content = "a = 1\nb = 2\nc = 3\nd = 4";
        let context = get_line_context(content, 3);
        assert!(context.contains(">>>    3 | c = 3"));
        assert!(context.contains("       2 | b = 2"));
    }

    #[test]
    fn test_line_context_past_end_is_empty() {
        assert_eq!(get_line_context("a = 1", 10), "");
    }

    #[test]
    fn test_to_toml_roundtrip() {
        let mut original = ClientConfig::new("acme", "prod", "tok");
        original.scope = Some("deployment".to_string());

        let toml = to_toml(&original).unwrap();
        let parsed = parse_client_toml_str(&toml).unwrap();
        assert_eq!(parsed, original);
        assert!(!toml.contains("timeout_secs"));
    }

    #[test]
    fn test_parse_file_error_names_path() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "organization = [").unwrap();

        let err = parse_client_toml(file.path()).unwrap_err();
        let rendered = format!("{err:#}");
        assert!(rendered.contains(&file.path().display().to_string()));
    }
}
