use crate::error::GatewayError;
use std::net::{Ipv4Addr, Ipv6Addr};
use url::{Host, Url};

/// Validate that an origin URL is safe to fetch (SSRF protection).
///
/// Accepts only `http://` and `https://` URLs with a non-private host.
///
/// **IP literals** are checked against blocked ranges.
/// **Hostnames** are accepted without DNS resolution — DNS rebinding is a
/// known limitation accepted here; full mitigation requires async DNS lookup.
///
/// # Errors
/// Returns [`GatewayError::blocked_origin`] for:
/// - Invalid or relative URLs
/// - Non-HTTP(S) schemes
/// - IPv4 addresses in private/reserved ranges
/// - IPv6 loopback or link-local/unique-local addresses
pub fn validate_origin_url(url: &str) -> Result<(), GatewayError> {
    let parsed =
        Url::parse(url).map_err(|_| GatewayError::blocked_origin(format!("invalid URL: {url}")))?;

    // Only allow HTTP(S)
    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(GatewayError::blocked_origin(format!(
                "scheme '{scheme}' not allowed — only http/https permitted"
            )));
        }
    }

    // Require a host
    let host = parsed
        .host()
        .ok_or_else(|| GatewayError::blocked_origin(format!("no host in URL: {url}")))?;

    match host {
        Host::Ipv4(ip) => {
            if is_blocked_ipv4(ip) {
                return Err(GatewayError::blocked_origin(format!(
                    "private or reserved IPv4 address not allowed: {ip}"
                )));
            }
        }
        Host::Ipv6(ip) => {
            if is_blocked_ipv6(ip) {
                return Err(GatewayError::blocked_origin(format!(
                    "private or reserved IPv6 address not allowed: {ip}"
                )));
            }
        }
        // Hostnames are allowed — we cannot resolve them without async DNS
        Host::Domain(_) => {}
    }

    Ok(())
}

/// Returns `true` for IPv4 addresses in private or reserved ranges.
///
/// Blocked ranges:
/// - `0.0.0.0/8`      — "this" network (RFC 1122)
/// - `10.0.0.0/8`     — RFC 1918 private
/// - `127.0.0.0/8`    — loopback
/// - `169.254.0.0/16` — link-local / cloud-metadata (AWS, GCP, Azure)
/// - `172.16.0.0/12`  — RFC 1918 private
/// - `192.168.0.0/16` — RFC 1918 private
fn is_blocked_ipv4(ip: Ipv4Addr) -> bool {
    let octets = ip.octets();
    let (a, b) = (octets[0], octets[1]);

    a == 0                               // 0.0.0.0/8
        || a == 10                       // 10.0.0.0/8
        || a == 127                      // 127.0.0.0/8 loopback
        || (a == 169 && b == 254)        // 169.254.0.0/16 link-local
        || (a == 172 && (16..=31).contains(&b)) // 172.16.0.0/12
        || (a == 192 && b == 168) // 192.168.0.0/16
}

/// Returns `true` for IPv6 addresses in private or reserved ranges.
///
/// Blocked ranges:
/// - `::1/128`     — loopback
/// - `fe80::/10`   — link-local
/// - `fc00::/7`    — unique-local (ULA)
fn is_blocked_ipv6(ip: Ipv6Addr) -> bool {
    let s = ip.segments();

    ip.is_loopback()                     // ::1
        || (s[0] & 0xffc0) == 0xfe80    // fe80::/10 link-local
        || (s[0] & 0xfe00) == 0xfc00 // fc00::/7 unique-local
}
