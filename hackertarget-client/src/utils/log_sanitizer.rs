//! Log sanitization utilities
//!
//! Keeps API keys out of request logs and stops multi-kilobyte scan
//! output (nmap, pagelinks, zone transfers) from flooding debug logs.

/// Maximum number of characters to include in truncated log output.
const TRUNCATE_LIMIT: usize = 256;

/// MSRV-compatible replacement for `str::floor_char_boundary` (stable since 1.91.0).
fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        s.len()
    } else {
        let mut i = index;
        while i > 0 && !s.is_char_boundary(i) {
            i -= 1;
        }
        i
    }
}

/// Truncate a string for safe logging.
///
/// Returns the original string if it's within the limit,
/// otherwise returns the first `TRUNCATE_LIMIT` characters with a suffix
/// indicating the total length.
pub fn truncate_for_log(s: &str) -> String {
    if s.len() <= TRUNCATE_LIMIT {
        s.to_string()
    } else {
        format!(
            "{}... [truncated, total {} bytes]",
            &s[..floor_char_boundary(s, TRUNCATE_LIMIT)],
            s.len()
        )
    }
}

/// Mask the value of the `apikey` query parameter in a request URL.
pub fn redact_api_key(url: &str) -> String {
    let Some(start) = url.find("apikey=") else {
        return url.to_string();
    };
    let value_start = start + "apikey=".len();
    let value_end = url[value_start..]
        .find('&')
        .map_or(url.len(), |i| value_start + i);
    format!("{}***{}", &url[..value_start], &url[value_end..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_redacted() {
        assert_eq!(
            redact_api_key("https://api.hackertarget.com/whois/?q=example.com&apikey=s3cr3t"),
            "https://api.hackertarget.com/whois/?q=example.com&apikey=***"
        );
    }

    #[test]
    fn api_key_redacted_mid_query() {
        assert_eq!(
            redact_api_key("https://h/x/?apikey=s3cr3t&q=a.com"),
            "https://h/x/?apikey=***&q=a.com"
        );
    }

    #[test]
    fn url_without_key_unchanged() {
        let url = "https://api.hackertarget.com/dnslookup/?q=example.com";
        assert_eq!(redact_api_key(url), url);
    }

    #[test]
    fn short_string_unchanged() {
        let s = "hello world";
        assert_eq!(truncate_for_log(s), s);
    }

    #[test]
    fn exactly_at_limit() {
        let s = "a".repeat(TRUNCATE_LIMIT);
        assert_eq!(truncate_for_log(&s), s);
    }

    #[test]
    fn over_limit_truncated() {
        let s = "a".repeat(TRUNCATE_LIMIT + 100);
        let result = truncate_for_log(&s);
        assert!(result.contains("... [truncated, total"));
        assert!(result.contains(&format!("{} bytes]", TRUNCATE_LIMIT + 100)));
        assert!(result.len() < s.len());
    }

    #[test]
    fn multibyte_chars_safe() {
        // whois output for IDN registrants can be multi-byte
        let s = "é".repeat(300);
        let result = truncate_for_log(&s);
        assert!(result.contains("... [truncated, total"));
    }
}
