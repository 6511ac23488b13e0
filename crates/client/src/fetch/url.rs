//! Endpoint canonicalization for the dataset URL.

/// Reasons an endpoint string cannot be used.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty endpoint")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("endpoint has no host")]
    MissingHost,

    #[error("invalid endpoint: {0}")]
    Invalid(String),
}

/// Normalize a configured endpoint before it is requested.
///
/// Surrounding whitespace is trimmed, a missing scheme defaults to `https`,
/// the host is lowercased and any fragment is dropped. The query string is
/// kept as written.
pub fn canonicalize(input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let with_scheme = if trimmed.contains("://") { trimmed.to_string() } else { format!("https://{trimmed}") };
    let mut endpoint = url::Url::parse(&with_scheme).map_err(|e| UrlError::Invalid(e.to_string()))?;

    if !matches!(endpoint.scheme(), "http" | "https") {
        return Err(UrlError::UnsupportedScheme(endpoint.scheme().to_string()));
    }

    let host = endpoint.host_str().ok_or(UrlError::MissingHost)?.to_lowercase();
    endpoint
        .set_host(Some(&host))
        .map_err(|e| UrlError::Invalid(e.to_string()))?;
    endpoint.set_fragment(None);

    Ok(endpoint)
}
