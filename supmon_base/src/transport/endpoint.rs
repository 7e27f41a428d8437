//! Endpoint validation
//!
//! Runs before any request leaves the process. Rejects anything that is not
//! an absolute http(s) URL, carries credentials, or (unless loopback is
//! explicitly allowed) targets an internal address.

use crate::api::MonitorError;
use reqwest::Url;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, ToSocketAddrs};

/// Validate a collection endpoint and return the parsed URL
///
/// Runs [`check_endpoint`] and then [`check_resolution`]; the latter may
/// block on the system resolver.
pub fn validate_endpoint(endpoint: &str, allow_loopback: bool) -> Result<Url, MonitorError> {
    let url = check_endpoint(endpoint, allow_loopback)?;
    check_resolution(&url, allow_loopback)?;
    Ok(url)
}

/// Every check that needs no network: shape, credentials, loopback names and
/// internal IP literals
pub fn check_endpoint(endpoint: &str, allow_loopback: bool) -> Result<Url, MonitorError> {
    let invalid = |reason: &str| invalid_endpoint(endpoint, reason);

    let url = Url::parse(endpoint.trim()).map_err(|e| invalid(&e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }

    let host = match url.host_str() {
        Some(host) if !host.is_empty() => host.to_ascii_lowercase(),
        _ => return Err(invalid("missing host")),
    };

    if !url.username().is_empty() || url.password().is_some() {
        return Err(invalid("credentials are not allowed in the URL"));
    }

    if allow_loopback {
        return Ok(url);
    }

    if host == "localhost" || host.ends_with(".localhost") {
        return Err(invalid("loopback host"));
    }

    let literal = host.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = literal.parse::<IpAddr>() {
        if is_internal(&ip) {
            return Err(invalid("internal address"));
        }
    }

    Ok(url)
}

/// Reject host names that resolve only to internal addresses
///
/// IP literals and unresolvable names pass; the request itself fails later.
pub fn check_resolution(url: &Url, allow_loopback: bool) -> Result<(), MonitorError> {
    if allow_loopback {
        return Ok(());
    }

    let Some(host) = url.host_str() else {
        return Ok(());
    };
    if host.trim_start_matches('[').trim_end_matches(']').parse::<IpAddr>().is_ok() {
        return Ok(());
    }

    let port = url.port_or_known_default().unwrap_or(80);
    if resolves_only_internally(host, port) {
        return Err(invalid_endpoint(
            url.as_str(),
            "host resolves to an internal address",
        ));
    }
    Ok(())
}

fn invalid_endpoint(endpoint: &str, reason: &str) -> MonitorError {
    MonitorError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason: reason.to_string(),
    }
}

/// True only when the name resolves and every address is internal
fn resolves_only_internally(host: &str, port: u16) -> bool {
    match (host, port).to_socket_addrs() {
        Ok(addrs) => {
            let ips: Vec<IpAddr> = addrs.map(|addr| addr.ip()).collect();
            !ips.is_empty() && ips.iter().all(is_internal)
        }
        Err(_) => false,
    }
}

/// Loopback, private, link-local, unspecified or broadcast
pub fn is_internal(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_internal_v4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_internal_v4(&v4),
            None => is_internal_v6(v6),
        },
    }
}

fn is_internal_v4(ip: &Ipv4Addr) -> bool {
    ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
}

fn is_internal_v6(ip: &Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    ip.is_loopback()
        || ip.is_unspecified()
        // fc00::/7 unique local
        || (first & 0xfe00) == 0xfc00
        // fe80::/10 link local
        || (first & 0xffc0) == 0xfe80
}
