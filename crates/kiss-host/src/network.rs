//! Network interface and address discovery.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, ToSocketAddrs};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::system::hostname;
use crate::{HostError, Result};

/// Default public IP service.
pub const DEFAULT_PUBLIC_IP_URL: &str = "https://api.ipify.org?format=json";

/// Timeout for the public IP lookup.
const PUBLIC_IP_TIMEOUT: Duration = Duration::from_secs(10);

/// One IPv4 address bound to a non-loopback interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceAddr {
    pub name: String,
    pub ip: Ipv4Addr,
    pub netmask: Ipv4Addr,
}

/// Snapshot of the host's network identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInfo {
    pub hostname: String,
    pub local_ip: IpAddr,
    pub interfaces: Vec<InterfaceAddr>,
    pub public_ip: Option<IpAddr>,
}

impl NetworkInfo {
    /// Enumerate interfaces and resolve the host name. Blocking.
    ///
    /// Any failure aborts the whole snapshot so callers never report a
    /// half-filled result.
    pub fn collect() -> Result<Self> {
        let hostname = hostname()
            .ok_or_else(|| HostError::Network("cannot determine host name".to_string()))?;
        let local_ip = resolve_host(&hostname)?;

        Ok(Self {
            hostname,
            local_ip,
            interfaces: list_interfaces()?,
            public_ip: None,
        })
    }

    /// Attach a public address obtained from [`lookup_public_ip`].
    pub fn with_public_ip(mut self, ip: IpAddr) -> Self {
        self.public_ip = Some(ip);
        self
    }
}

impl fmt::Display for NetworkInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Hostname: {}", self.hostname)?;
        writeln!(f, "Local IP: {}", self.local_ip)?;
        if let Some(ip) = self.public_ip {
            writeln!(f, "Public IP: {}", ip)?;
        }
        for iface in &self.interfaces {
            write!(
                f,
                "\nInterface: {}\nIP: {}\nNetmask: {}\n",
                iface.name, iface.ip, iface.netmask
            )?;
        }
        Ok(())
    }
}

/// List IPv4 addresses of all non-loopback interfaces, ordered by name.
pub fn list_interfaces() -> Result<Vec<InterfaceAddr>> {
    let mut addrs: Vec<InterfaceAddr> = if_addrs::get_if_addrs()
        .map_err(|e| HostError::Network(format!("cannot enumerate interfaces: {}", e)))?
        .into_iter()
        .filter(|iface| !iface.is_loopback())
        .filter_map(|iface| match iface.addr {
            if_addrs::IfAddr::V4(v4) => Some(InterfaceAddr {
                name: iface.name,
                ip: v4.ip,
                netmask: v4.netmask,
            }),
            _ => None,
        })
        .collect();

    addrs.sort_by(|a, b| a.name.cmp(&b.name).then(a.ip.cmp(&b.ip)));
    debug!(count = addrs.len(), "interfaces enumerated");
    Ok(addrs)
}

/// Resolve a host name to its first address, preferring IPv4.
fn resolve_host(hostname: &str) -> Result<IpAddr> {
    let addrs: Vec<IpAddr> = (hostname, 0)
        .to_socket_addrs()
        .map_err(|e| HostError::Network(format!("cannot resolve {}: {}", hostname, e)))?
        .map(|sa| sa.ip())
        .collect();

    addrs
        .iter()
        .find(|ip| ip.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
        .ok_or_else(|| HostError::Network(format!("{} has no addresses", hostname)))
}

#[derive(Debug, Deserialize)]
struct PublicIpResponse {
    ip: String,
}

/// Parse a public IP service response, either `{"ip": "..."}` or a bare address.
pub fn parse_public_ip(body: &str) -> Result<IpAddr> {
    let body = body.trim();
    let raw = if body.starts_with('{') {
        serde_json::from_str::<PublicIpResponse>(body)
            .map_err(|e| HostError::Http(format!("unexpected response: {}", e)))?
            .ip
    } else {
        body.to_string()
    };

    raw.trim()
        .parse()
        .map_err(|_| HostError::Http(format!("not an IP address: {}", raw)))
}

/// Ask an external service for this host's public address.
pub async fn lookup_public_ip(client: &reqwest::Client, url: &str) -> Result<IpAddr> {
    let body = client
        .get(url)
        .timeout(PUBLIC_IP_TIMEOUT)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let ip = parse_public_ip(&body)?;
    debug!(ip = %ip, "public ip resolved");
    Ok(ip)
}
