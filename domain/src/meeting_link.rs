//! Normalization of user-supplied meeting links.
//!
//! Users paste whatever their calendar shows: bare hosts, full invitations with
//! dial-in text, or a clean URL. The first embedded `http(s)://` URL wins.

use crate::error::Error;

/// Normalize free text into a meeting URL.
///
/// Takes the first `http://` or `https://` URL (up to whitespace), otherwise the
/// whole trimmed input, and prefixes `https://` when no scheme is present.
pub fn normalize(input: &str) -> Result<String, Error> {
    let candidate = first_url(input).unwrap_or_else(|| input.trim());
    if candidate.is_empty() {
        return Err(Error::invalid("Meeting link is required"));
    }

    if candidate.starts_with("http://") || candidate.starts_with("https://") {
        Ok(candidate.to_string())
    } else {
        Ok(format!("https://{candidate}"))
    }
}

fn first_url(input: &str) -> Option<&str> {
    let start = ["https://", "http://"]
        .iter()
        .filter_map(|scheme| input.find(scheme))
        .min()?;
    let rest = &input[start..];
    let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    Some(&rest[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_host_gets_https_prefix() {
        assert_eq!(normalize("zoom.us/j/123").unwrap(), "https://zoom.us/j/123");
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        assert_eq!(
            normalize("  meet.google.com/abc-defg-hij \n").unwrap(),
            "https://meet.google.com/abc-defg-hij"
        );
    }

    #[test]
    fn first_embedded_url_wins() {
        let invite = "Join Zoom Meeting https://zoom.us/j/123?pwd=x Meeting ID: 123 http://other.example";
        assert_eq!(normalize(invite).unwrap(), "https://zoom.us/j/123?pwd=x");
    }

    #[test]
    fn http_scheme_is_kept() {
        assert_eq!(
            normalize("see http://intranet.local/call now").unwrap(),
            "http://intranet.local/call"
        );
    }

    #[test]
    fn blank_input_is_invalid() {
        assert!(normalize("   ").is_err());
    }
}
