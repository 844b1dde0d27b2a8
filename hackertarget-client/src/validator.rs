//! Target validation and normalisation.
//!
//! Pure functions only: nothing here touches the network. A target that
//! fails here is reported as [`ErrorKind::Validation`](crate::ErrorKind::Validation)
//! and never sent.

use std::net::IpAddr;
use std::sync::LazyLock;

use ipnet::IpNet;
use regex::Regex;
use url::Url;

use crate::error::ValidationError;
use crate::tool::{TargetKind, Tool};

/// Maximum length of a fully-qualified domain name.
const MAX_DOMAIN_LEN: usize = 253;

/// Multi-label hostname: 1-63 char labels, no edge hyphens, alphabetic or punycode TLD.
static DOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+(?:[A-Za-z]{2,63}|xn--[A-Za-z0-9-]{1,59})$",
    )
    .unwrap_or_else(|e| unreachable!("domain regex is valid: {e}"))
});

static LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?$")
        .unwrap_or_else(|e| unreachable!("label regex is valid: {e}"))
});

/// Host and optional port pulled out of a loosely written target
/// (`https://example.com:8443/path` → `example.com`, `8443`).
#[derive(Debug, PartialEq, Eq)]
struct HostPort<'a> {
    host: &'a str,
    port: Option<&'a str>,
}

fn split_host_port(target: &str) -> HostPort<'_> {
    let rest = target.split_once("://").map_or(target, |(_, rest)| rest);
    let authority = rest.split(['/', '?', '#']).next().unwrap_or(rest);

    if let Some(bracketed) = authority.strip_prefix('[') {
        if let Some((host, tail)) = bracketed.split_once(']') {
            return HostPort {
                host,
                port: tail.strip_prefix(':'),
            };
        }
    }

    match authority.matches(':').count() {
        1 => {
            let (host, port) = authority.split_once(':').unwrap_or((authority, ""));
            HostPort {
                host,
                port: Some(port),
            }
        }
        _ => HostPort {
            host: authority,
            port: None,
        },
    }
}

/// Check that `target` is acceptable input for `tool`.
pub fn validate(tool: Tool, target: &str) -> Result<(), ValidationError> {
    let target = target.trim();
    if target.is_empty() {
        return Err(ValidationError::new("target", "Target cannot be empty"));
    }

    match tool.target_kind() {
        TargetKind::Url => validate_url(target),
        TargetKind::Cidr => validate_cidr(target),
        kind => {
            let HostPort { host, port } = split_host_port(target);
            if let Some(port) = port {
                validate_port(port)?;
            }
            match kind {
                TargetKind::Domain => {
                    if host.parse::<IpAddr>().is_ok() {
                        return Err(ValidationError::new(
                            "domain",
                            format!("{} expects a domain name, got IP address {host}", tool.display_name()),
                        ));
                    }
                    validate_domain(host, false)
                }
                TargetKind::Ip => validate_ip(host),
                _ => {
                    if validate_ip(host).is_ok() {
                        return Ok(());
                    }
                    validate_domain(host, false).map_err(|_| {
                        ValidationError::new(
                            "target",
                            format!("Invalid target: '{target}' is neither a valid domain nor IP address"),
                        )
                    })
                }
            }
        }
    }
}

/// Normalise a validated target into what the API expects as `q`.
///
/// URL tools keep the full URL; every other tool gets the bare host (or CIDR
/// block) with scheme, port and path stripped.
pub fn clean_target(tool: Tool, target: &str) -> String {
    let target = target.trim();
    match tool.target_kind() {
        TargetKind::Url | TargetKind::Cidr => target.to_string(),
        _ => split_host_port(target).host.to_string(),
    }
}

/// Validate a hostname.
///
/// Single-label names (`localhost`, intranet hosts) are only accepted when
/// `allow_single_label` is set.
pub fn validate_domain(domain: &str, allow_single_label: bool) -> Result<(), ValidationError> {
    if domain.is_empty() {
        return Err(ValidationError::new("domain", "Domain cannot be empty"));
    }
    let domain = domain.strip_suffix('.').unwrap_or(domain);
    if domain.len() > MAX_DOMAIN_LEN {
        return Err(ValidationError::new(
            "domain",
            format!(
                "Domain name exceeds maximum length of {MAX_DOMAIN_LEN} characters (got {})",
                domain.len()
            ),
        ));
    }
    let valid = DOMAIN_RE.is_match(domain)
        || (allow_single_label && !domain.contains('.') && LABEL_RE.is_match(domain));
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new(
            "domain",
            format!("Invalid domain format: {domain}"),
        ))
    }
}

pub fn validate_ip(ip: &str) -> Result<(), ValidationError> {
    ip.parse::<IpAddr>()
        .map(|_| ())
        .map_err(|_| ValidationError::new("ip", format!("Invalid IP address format: {ip}")))
}

/// Parse a port number in `1..=65535`.
pub fn validate_port(port: &str) -> Result<u16, ValidationError> {
    let parsed: u32 = port
        .trim()
        .parse()
        .map_err(|_| ValidationError::new("port", format!("Invalid port format: {port}")))?;
    u16::try_from(parsed)
        .ok()
        .filter(|p| *p != 0)
        .ok_or_else(|| {
            ValidationError::new(
                "port",
                format!("Port must be between 1 and 65535, got {parsed}"),
            )
        })
}

fn validate_cidr(target: &str) -> Result<(), ValidationError> {
    if target.parse::<IpNet>().is_ok() || target.parse::<IpAddr>().is_ok() {
        Ok(())
    } else {
        Err(ValidationError::new(
            "cidr",
            format!("Invalid IP address or CIDR block: {target}"),
        ))
    }
}

fn validate_url(target: &str) -> Result<(), ValidationError> {
    let url = Url::parse(target).map_err(|e| {
        ValidationError::new(
            "url",
            format!("Invalid URL format: {target} ({e}); include the http:// or https:// scheme"),
        )
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ValidationError::new(
            "url",
            format!("Unsupported URL scheme '{}': expected http or https", url.scheme()),
        ));
    }
    if url.port() == Some(0) {
        return Err(ValidationError::new(
            "url",
            "Port must be between 1 and 65535, got 0",
        ));
    }
    match url.host() {
        Some(url::Host::Domain(domain)) if !domain.contains('.') => {
            if domain.eq_ignore_ascii_case("localhost") {
                Ok(())
            } else {
                Err(ValidationError::new(
                    "url",
                    format!("Invalid URL host: {domain} (single-label hosts other than localhost are not allowed)"),
                ))
            }
        }
        Some(url::Host::Domain(domain)) => validate_domain(domain, false).map_err(|e| {
            ValidationError::new("url", format!("Invalid URL host: {}", e.reason))
        }),
        Some(url::Host::Ipv4(_) | url::Host::Ipv6(_)) => Ok(()),
        None => Err(ValidationError::new(
            "url",
            format!("URL has no host: {target}"),
        )),
    }
}
