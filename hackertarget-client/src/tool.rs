//! The fixed table of HackerTarget tools.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// What kind of target a tool accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// A public domain name.
    Domain,
    /// An IPv4 or IPv6 literal.
    Ip,
    /// A domain name or an IP literal.
    Host,
    /// An IP literal or a CIDR block.
    Cidr,
    /// A scheme-qualified `http`/`https` URL.
    Url,
}

impl TargetKind {
    /// Short description used in validation messages and `tools` listings.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Domain => "domain",
            Self::Ip => "IP address",
            Self::Host => "domain or IP address",
            Self::Cidr => "IP address or CIDR block",
            Self::Url => "http(s) URL",
        }
    }
}

/// One of the 14 remote reconnaissance tools.
///
/// Serialized as its slug (`"dns"`, `"whois"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Traceroute,
    Ping,
    Dns,
    Rdns,
    HostSearch,
    SharedDns,
    ZoneTransfer,
    Whois,
    GeoIp,
    ReverseIp,
    PortScan,
    Subnet,
    Headers,
    PageLinks,
}

impl Tool {
    const ALL: [Self; 14] = [
        Self::Traceroute,
        Self::Ping,
        Self::Dns,
        Self::Rdns,
        Self::HostSearch,
        Self::SharedDns,
        Self::ZoneTransfer,
        Self::Whois,
        Self::GeoIp,
        Self::ReverseIp,
        Self::PortScan,
        Self::Subnet,
        Self::Headers,
        Self::PageLinks,
    ];

    /// All tools in id order.
    pub fn all() -> &'static [Self] {
        &Self::ALL
    }

    /// Numeric id (1-14).
    pub fn id(self) -> u8 {
        match self {
            Self::Traceroute => 1,
            Self::Ping => 2,
            Self::Dns => 3,
            Self::Rdns => 4,
            Self::HostSearch => 5,
            Self::SharedDns => 6,
            Self::ZoneTransfer => 7,
            Self::Whois => 8,
            Self::GeoIp => 9,
            Self::ReverseIp => 10,
            Self::PortScan => 11,
            Self::Subnet => 12,
            Self::Headers => 13,
            Self::PageLinks => 14,
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Self::Traceroute => "traceroute",
            Self::Ping => "ping",
            Self::Dns => "dns",
            Self::Rdns => "rdns",
            Self::HostSearch => "hostsearch",
            Self::SharedDns => "shareddns",
            Self::ZoneTransfer => "zonetransfer",
            Self::Whois => "whois",
            Self::GeoIp => "geoip",
            Self::ReverseIp => "reverseip",
            Self::PortScan => "portscan",
            Self::Subnet => "subnet",
            Self::Headers => "headers",
            Self::PageLinks => "pagelinks",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Traceroute => "Traceroute (MTR)",
            Self::Ping => "Ping Test",
            Self::Dns => "DNS Lookup",
            Self::Rdns => "Reverse DNS",
            Self::HostSearch => "Find DNS Host",
            Self::SharedDns => "Find Shared DNS",
            Self::ZoneTransfer => "Zone Transfer",
            Self::Whois => "Whois Lookup",
            Self::GeoIp => "IP Location Lookup",
            Self::ReverseIp => "Reverse IP Lookup",
            Self::PortScan => "TCP Port Scan (Nmap)",
            Self::Subnet => "Subnet Lookup",
            Self::Headers => "HTTP Header Check",
            Self::PageLinks => "Extract Page Links",
        }
    }

    /// Endpoint path on the API host, with leading and trailing slash.
    pub fn path(self) -> &'static str {
        match self {
            Self::Traceroute => "/mtr/",
            Self::Ping => "/nping/",
            Self::Dns => "/dnslookup/",
            Self::Rdns => "/reversedns/",
            Self::HostSearch => "/hostsearch/",
            Self::SharedDns => "/findshareddns/",
            Self::ZoneTransfer => "/zonetransfer/",
            Self::Whois => "/whois/",
            Self::GeoIp => "/geoip/",
            Self::ReverseIp => "/reverseiplookup/",
            Self::PortScan => "/nmap/",
            Self::Subnet => "/subnetcalc/",
            Self::Headers => "/httpheaders/",
            Self::PageLinks => "/pagelinks/",
        }
    }

    pub fn target_kind(self) -> TargetKind {
        match self {
            Self::Dns | Self::HostSearch | Self::SharedDns | Self::ZoneTransfer => {
                TargetKind::Domain
            }
            Self::Rdns => TargetKind::Ip,
            Self::Subnet => TargetKind::Cidr,
            Self::Headers | Self::PageLinks => TargetKind::Url,
            Self::Traceroute
            | Self::Ping
            | Self::Whois
            | Self::GeoIp
            | Self::ReverseIp
            | Self::PortScan => TargetKind::Host,
        }
    }

    /// The endpoint name without slashes, accepted as an alias (`mtr`, `dnslookup`, ...).
    fn endpoint_alias(self) -> &'static str {
        self.path().trim_matches('/')
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

impl TryFrom<u8> for Tool {
    type Error = ClientError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .iter()
            .copied()
            .find(|tool| tool.id() == id)
            .ok_or_else(|| ClientError::UnknownTool(id.to_string()))
    }
}

impl FromStr for Tool {
    type Err = ClientError;

    /// Accepts a numeric id, a slug, or an endpoint alias, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        if let Ok(id) = needle.parse::<u8>() {
            return Self::try_from(id);
        }
        Self::ALL
            .iter()
            .copied()
            .find(|tool| tool.slug() == needle || tool.endpoint_alias() == needle)
            .ok_or_else(|| ClientError::UnknownTool(s.trim().to_string()))
    }
}
