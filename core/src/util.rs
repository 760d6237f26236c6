//! Validation helpers for remote endpoint settings

use crate::error::{AgentError, Result};

/// Reject values that cannot be sent in an HTTP header
fn check_header_chars(value: &str, field_name: &str) -> Result<()> {
    if let Some((index, ch)) = value
        .char_indices()
        .find(|(_, ch)| ch.is_ascii_control())
    {
        return Err(AgentError::invalid_config(format!(
            "{} contains a control character at position {} ({:#04x})",
            field_name, index, ch as u32
        )));
    }
    Ok(())
}

/// Validate an API key can be used in a bearer Authorization header.
///
/// Returns the trimmed key.
pub fn validate_api_key(api_key: &str) -> Result<String> {
    let trimmed = api_key.trim();

    if trimmed.is_empty() {
        return Err(AgentError::invalid_config("API key is empty"));
    }

    check_header_chars(trimmed, "API key")?;

    format!("Bearer {}", trimmed)
        .parse::<reqwest::header::HeaderValue>()
        .map_err(|_| {
            AgentError::invalid_config(format!(
                "API key results in an invalid Authorization header ({} characters)",
                trimmed.len()
            ))
        })?;

    Ok(trimmed.to_string())
}

/// Validate a base URL for chat completion requests.
///
/// Returns the URL without surrounding whitespace or a trailing slash.
pub fn sanitize_base_url(url: &str) -> Result<String> {
    let trimmed = url.trim();

    if trimmed.is_empty() {
        return Err(AgentError::invalid_config("base URL cannot be empty"));
    }

    if trimmed.contains("%2F") || trimmed.contains("%3D") || trimmed.contains("%20") {
        return Err(AgentError::invalid_config(format!(
            "base URL appears to be URL-encoded: {}",
            trimmed
        )));
    }

    if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
        return Err(AgentError::invalid_config(format!(
            "base URL must start with 'http://' or 'https://'. Got: {}",
            trimmed
        )));
    }

    check_header_chars(trimmed, "base URL")?;

    Ok(trimmed.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_api_key() {
        assert_eq!(validate_api_key("  sk-test123 ").unwrap(), "sk-test123");
        assert!(validate_api_key("").is_err());
        assert_eq!(validate_api_key("none").unwrap(), "none");
        assert!(validate_api_key(" \n ").is_err());
        assert!(validate_api_key("sk-abc\n123").is_err());
        assert!(validate_api_key("sk-abc\x7f123").is_err());
    }

    #[test]
    fn test_sanitize_base_url() {
        assert_eq!(
            sanitize_base_url("https://openrouter.ai/api/v1/").unwrap(),
            "https://openrouter.ai/api/v1"
        );
        assert_eq!(
            sanitize_base_url(" http://localhost:11434/v1 ").unwrap(),
            "http://localhost:11434/v1"
        );
    }

    #[test]
    fn test_sanitize_base_url_invalid() {
        assert!(sanitize_base_url("").is_err());
        assert!(sanitize_base_url("openrouter.ai/api/v1").is_err());
        assert!(sanitize_base_url("https://api.example%2Fcom").is_err());
        let err = sanitize_base_url("ftp://example.com").unwrap_err();
        assert!(err.is_configuration());
    }
}
