use crate::error::ValidationError;
use url::Url;

/// Check that a link is an absolute URI with a scheme and a host.
///
/// Side-effect free; the parsed URL is returned so callers do not parse twice.
pub fn validate(link: &str) -> Result<Url, ValidationError> {
    if link.is_empty() {
        return Err(ValidationError::Empty);
    }

    let url = Url::parse(link).map_err(|e| ValidationError::Malformed(e.to_string()))?;

    if url.scheme().is_empty() {
        return Err(ValidationError::Malformed("missing scheme".to_string()));
    }
    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(ValidationError::Malformed("missing host".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_link() {
        assert_eq!(validate(""), Err(ValidationError::Empty));
    }

    #[test]
    fn test_relative_link_is_malformed() {
        assert!(matches!(
            validate("not-a-url"),
            Err(ValidationError::Malformed(_))
        ));
        assert!(matches!(
            validate("/just/a/path"),
            Err(ValidationError::Malformed(_))
        ));
    }

    #[test]
    fn test_link_without_host_is_malformed() {
        assert!(matches!(
            validate("mailto:someone@example.com"),
            Err(ValidationError::Malformed(_))
        ));
        assert!(matches!(
            validate("file:///tmp/page.html"),
            Err(ValidationError::Malformed(_))
        ));
    }

    #[test]
    fn test_absolute_links() {
        let url = validate("https://example.com/").unwrap();
        assert_eq!(url.host_str(), Some("example.com"));

        let url = validate("http://127.0.0.1:8080/a?b=c").unwrap();
        assert_eq!(url.port(), Some(8080));
    }
}
