use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use netgauge_core::{EndpointCatalog, Target};
use serde::Deserialize;

const DNS_PORT: u16 = 53;
const DEFAULT_HOST_PORT: u16 = 443;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid catalog `{path}`: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid resolver `{0}` (expected an IP address, optionally with a port)")]
    InvalidResolver(String),

    #[error("empty {0} entry")]
    EmptyEntry(&'static str),

    #[error("unsupported url `{0}` (expected http:// or https://)")]
    InvalidUrl(String),
}

/// On-disk catalog. An omitted list keeps the built-in one; an empty list disables it.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogYaml {
    dns: Option<Vec<DnsYaml>>,
    latency: Option<Vec<HostYaml>>,
    tcp: Option<Vec<HostYaml>>,
    download: Option<Vec<String>>,
    upload: Option<Vec<String>>,
    interfaces: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DnsYaml {
    resolver: String,
    domain: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct HostYaml {
    host: String,
    #[serde(default = "default_host_port")]
    port: u16,
}

fn default_host_port() -> u16 {
    DEFAULT_HOST_PORT
}

pub(crate) async fn load(path: &Path) -> Result<EndpointCatalog, CatalogError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    parse(&text, path)
}

fn parse(text: &str, path: &Path) -> Result<EndpointCatalog, CatalogError> {
    // An empty document deserializes as unit, not as a map.
    let yaml: CatalogYaml = if text.trim().is_empty() {
        CatalogYaml::default()
    } else {
        serde_yaml::from_str(text).map_err(|source| CatalogError::Parse {
            path: path.to_path_buf(),
            source,
        })?
    };

    let builtin = EndpointCatalog::builtin();

    let dns = match yaml.dns {
        Some(entries) => entries
            .into_iter()
            .map(|e| dns_target(&e))
            .collect::<Result<_, _>>()?,
        None => builtin.dns,
    };
    let latency = match yaml.latency {
        Some(entries) => host_targets(entries, "latency")?,
        None => builtin.latency,
    };
    let tcp = match yaml.tcp {
        Some(entries) => host_targets(entries, "tcp")?,
        None => builtin.tcp,
    };
    let download = match yaml.download {
        Some(urls) => url_targets(urls)?,
        None => builtin.download,
    };
    let upload = match yaml.upload {
        Some(urls) => url_targets(urls)?,
        None => builtin.upload,
    };
    let interfaces = match yaml.interfaces {
        Some(names) => Some(
            names
                .into_iter()
                .map(|name| {
                    let name = name.trim();
                    if name.is_empty() {
                        Err(CatalogError::EmptyEntry("interfaces"))
                    } else {
                        Ok(Target::interface(name))
                    }
                })
                .collect::<Result<_, _>>()?,
        ),
        None => builtin.interfaces,
    };

    Ok(EndpointCatalog {
        dns,
        latency,
        tcp,
        download,
        upload,
        interfaces,
    })
}

fn dns_target(entry: &DnsYaml) -> Result<Target, CatalogError> {
    let raw = entry.resolver.trim();
    let resolver = raw
        .parse::<SocketAddr>()
        .or_else(|_| raw.parse::<IpAddr>().map(|ip| SocketAddr::new(ip, DNS_PORT)))
        .map_err(|_| CatalogError::InvalidResolver(raw.to_string()))?;

    let domain = entry.domain.trim();
    if domain.is_empty() {
        return Err(CatalogError::EmptyEntry("dns domain"));
    }
    Ok(Target::dns(resolver, domain))
}

fn host_targets(entries: Vec<HostYaml>, list: &'static str) -> Result<Vec<Target>, CatalogError> {
    entries
        .into_iter()
        .map(|e| {
            let host = e.host.trim();
            if host.is_empty() {
                Err(CatalogError::EmptyEntry(list))
            } else {
                Ok(Target::host(host, e.port))
            }
        })
        .collect()
}

fn url_targets(urls: Vec<String>) -> Result<Vec<Target>, CatalogError> {
    urls.into_iter()
        .map(|url| {
            let url = url.trim();
            if url.starts_with("http://") || url.starts_with("https://") {
                Ok(Target::url(url))
            } else {
                Err(CatalogError::InvalidUrl(url.to_string()))
            }
        })
        .collect()
}
