use std::{
    net::IpAddr,
    str::FromStr,
};

use actix_web::HttpRequest;
use log::{debug, trace};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("'{0}' is not a valid IP network")]
pub struct InvalidNetwork(String);

/// An IP network in CIDR notation. A bare address is treated as a single-host
/// network (/32 or /128).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpNetwork {
    addr: IpAddr,
    prefix: u8,
}

impl IpNetwork {
    pub fn contains(&self, ip: IpAddr) -> bool {
        match (self.addr, ip) {
            (IpAddr::V4(net), IpAddr::V4(ip)) => {
                if self.prefix == 0 {
                    return true;
                }
                let shift = 32 - u32::from(self.prefix);
                (u32::from(net) >> shift) == (u32::from(ip) >> shift)
            },
            (IpAddr::V6(net), IpAddr::V6(ip)) => {
                if self.prefix == 0 {
                    return true;
                }
                let shift = 128 - u32::from(self.prefix);
                (u128::from(net) >> shift) == (u128::from(ip) >> shift)
            },
            _ => false,
        }
    }
}

impl FromStr for IpNetwork {
    type Err = InvalidNetwork;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, prefix) = match s.split_once('/') {
            Some((addr, prefix)) => {
                let addr = IpAddr::from_str(addr.trim()).map_err(|_| InvalidNetwork(s.to_string()))?;
                let prefix = u8::from_str(prefix.trim()).map_err(|_| InvalidNetwork(s.to_string()))?;
                (addr, prefix)
            },
            None => {
                let addr = IpAddr::from_str(s.trim()).map_err(|_| InvalidNetwork(s.to_string()))?;
                let prefix = if addr.is_ipv4() { 32 } else { 128 };
                (addr, prefix)
            },
        };
        let max = if addr.is_ipv4() { 32 } else { 128 };
        if prefix > max {
            return Err(InvalidNetwork(s.to_string()));
        }
        Ok(Self { addr, prefix })
    }
}

/// Get the remote IP address from the request.
///
/// When `use_x_forwarded_for` is set, the first entry of the `X-Forwarded-For`
/// header (the originating client as reported by the proxy) takes precedence
/// over the peer address of the connection.
pub fn get_remote_ip(req: &HttpRequest, use_x_forwarded_for: bool) -> Option<IpAddr> {
    let mut result = None;
    if use_x_forwarded_for {
        trace!("Checking X-Forwarded-For header");
        result = req
            .headers()
            .get("X-Forwarded-For")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| IpAddr::from_str(s.trim()).ok());
        if let Some(ip) = result {
            debug!("Using X-Forwarded-For header for remote address: {ip}");
        }
    }
    result.or_else(|| {
        let peer_addr = req.peer_addr().map(|a| a.ip());
        trace!("Using Peer address for remote address: {peer_addr:?}");
        peer_addr
    })
}

/// True when `ip` falls inside at least one of the given networks.
pub fn allowed_client_ip(ip: IpAddr, networks: &[IpNetwork]) -> bool {
    networks.iter().any(|net| net.contains(ip))
}

#[cfg(test)]
mod test {
    use std::{net::IpAddr, str::FromStr};

    use actix_web::test::TestRequest;

    use super::{allowed_client_ip, get_remote_ip, IpNetwork};

    fn ip(s: &str) -> IpAddr {
        IpAddr::from_str(s).unwrap()
    }

    #[test]
    fn cidr_membership() {
        let net = IpNetwork::from_str("192.168.1.0/24").unwrap();
        assert!(net.contains(ip("192.168.1.1")));
        assert!(net.contains(ip("192.168.1.254")));
        assert!(!net.contains(ip("192.168.2.1")));
        assert!(!net.contains(ip("10.0.0.1")));
    }

    #[test]
    fn bare_address_is_a_single_host_network() {
        let net = IpNetwork::from_str("41.74.28.10").unwrap();
        assert!(net.contains(ip("41.74.28.10")));
        assert!(!net.contains(ip("41.74.28.11")));
    }

    #[test]
    fn ipv6_networks() {
        let net = IpNetwork::from_str("2001:db8::/32").unwrap();
        assert!(net.contains(ip("2001:db8::1")));
        assert!(!net.contains(ip("2001:db9::1")));
        // An IPv4 client never matches an IPv6 network.
        assert!(!net.contains(ip("192.168.1.1")));
    }

    #[test]
    fn zero_prefix_matches_everything() {
        let net = IpNetwork::from_str("0.0.0.0/0").unwrap();
        assert!(net.contains(ip("8.8.8.8")));
    }

    #[test]
    fn rejects_malformed_networks() {
        assert!(IpNetwork::from_str("192.168.1.0/33").is_err());
        assert!(IpNetwork::from_str("not-an-ip").is_err());
        assert!(IpNetwork::from_str("192.168.1.0/abc").is_err());
    }

    #[test]
    fn allow_list_check() {
        let nets =
            vec![IpNetwork::from_str("196.20.110.0/24").unwrap(), IpNetwork::from_str("41.74.28.10").unwrap()];
        assert!(allowed_client_ip(ip("196.20.110.50"), &nets));
        assert!(allowed_client_ip(ip("41.74.28.10"), &nets));
        assert!(!allowed_client_ip(ip("41.74.28.9"), &nets));
    }

    #[test]
    fn first_forwarded_entry_wins() {
        let req = TestRequest::default()
            .insert_header(("X-Forwarded-For", "196.20.110.50, 10.0.0.1"))
            .to_http_request();
        assert_eq!(get_remote_ip(&req, true), Some(ip("196.20.110.50")));
        // Header ignored unless the proxy flag is set.
        assert_eq!(get_remote_ip(&req, false), None);
    }
}
