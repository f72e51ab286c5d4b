use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// One endpoint a probe can be pointed at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// A domain resolved through one specific resolver.
    Dns { resolver: SocketAddr, domain: String },
    /// A host for TCP handshakes; latency echoes only use the host part.
    Host { host: String, port: u16 },
    /// An HTTP(S) resource for download or upload.
    Url(String),
    /// A local network interface by OS name.
    Interface(String),
}

impl Target {
    pub fn dns(resolver: SocketAddr, domain: impl Into<String>) -> Self {
        Self::Dns {
            resolver,
            domain: domain.into(),
        }
    }

    pub fn host(host: impl Into<String>, port: u16) -> Self {
        Self::Host {
            host: host.into(),
            port,
        }
    }

    pub fn url(url: impl Into<String>) -> Self {
        Self::Url(url.into())
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self::Interface(name.into())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dns { resolver, domain } => write!(f, "{domain} via {resolver}"),
            Self::Host { host, port } if host.contains(':') => write!(f, "[{host}]:{port}"),
            Self::Host { host, port } => write!(f, "{host}:{port}"),
            Self::Url(url) => f.write_str(url),
            Self::Interface(name) => write!(f, "iface {name}"),
        }
    }
}

/// Targets for every metric kind, loaded once per session and shared read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointCatalog {
    pub dns: Vec<Target>,
    pub latency: Vec<Target>,
    pub tcp: Vec<Target>,
    pub download: Vec<Target>,
    pub upload: Vec<Target>,
    /// `None` means every non-loopback interface found when the session starts.
    pub interfaces: Option<Vec<Target>>,
}

const PUBLIC_RESOLVERS: [(Ipv4Addr, &str); 3] = [
    (Ipv4Addr::new(1, 1, 1, 1), "cloudflare.com"),
    (Ipv4Addr::new(8, 8, 8, 8), "google.com"),
    (Ipv4Addr::new(9, 9, 9, 9), "quad9.net"),
];

const DOWNLOAD_URLS: [&str; 3] = [
    "https://speed.cloudflare.com/__down?bytes=10000000",
    "https://proof.ovh.net/files/10Mb.dat",
    "http://speedtest.tele2.net/10MB.zip",
];

const UPLOAD_URLS: [&str; 1] = ["https://speed.cloudflare.com/__up"];

impl Default for EndpointCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl EndpointCatalog {
    /// Well-known public anycast endpoints.
    pub fn builtin() -> Self {
        let resolver = |ip: Ipv4Addr| SocketAddr::new(IpAddr::V4(ip), 53);

        Self {
            dns: PUBLIC_RESOLVERS
                .iter()
                .map(|(ip, domain)| Target::dns(resolver(*ip), *domain))
                .collect(),
            latency: PUBLIC_RESOLVERS
                .iter()
                .map(|(ip, _)| Target::host(ip.to_string(), 443))
                .collect(),
            tcp: PUBLIC_RESOLVERS
                .iter()
                .map(|(ip, _)| Target::host(ip.to_string(), 443))
                .collect(),
            download: DOWNLOAD_URLS.iter().map(|u| Target::url(*u)).collect(),
            upload: UPLOAD_URLS.iter().map(|u| Target::url(*u)).collect(),
            interfaces: None,
        }
    }

    /// A catalog with no targets at all.
    pub fn empty() -> Self {
        Self {
            dns: Vec::new(),
            latency: Vec::new(),
            tcp: Vec::new(),
            download: Vec::new(),
            upload: Vec::new(),
            interfaces: Some(Vec::new()),
        }
    }
}
