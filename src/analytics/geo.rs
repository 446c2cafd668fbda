//! Best-effort IP geolocation via a remote JSON endpoint.
//!
//! Lookups are bounded by a short client timeout and cached per IP, hits
//! and known misses alike, so repeated clicks from one address cost at
//! most one network round trip. Every failure mode collapses to the empty
//! enrichment; a redirect never waits on more than one bounded attempt.

use dashmap::DashMap;
use serde::Deserialize;
use std::net::IpAddr;
use std::time::Duration;

const DEFAULT_ENDPOINT: &str = "http://ip-api.com/json";

/// Coarse location attached to a click. Both fields may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeoInfo {
    pub country: Option<String>,
    pub region: Option<String>,
}

impl GeoInfo {
    pub fn is_empty(&self) -> bool {
        self.country.is_none() && self.region.is_none()
    }
}

#[derive(Deserialize)]
struct ProviderResponse {
    status: String,
    country: Option<String>,
    #[serde(rename = "regionName")]
    region_name: Option<String>,
}

pub struct GeoClient {
    http: reqwest::Client,
    endpoint: String,
    cache: DashMap<IpAddr, GeoInfo>,
}

impl GeoClient {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        Self::with_endpoint(DEFAULT_ENDPOINT, timeout)
    }

    pub fn with_endpoint(endpoint: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            cache: DashMap::new(),
        })
    }

    /// Look up `ip`, returning the empty enrichment on any failure.
    pub async fn lookup(&self, ip: IpAddr) -> GeoInfo {
        // Addresses that can never be geolocated skip the network entirely.
        if is_private(ip) {
            return GeoInfo::default();
        }

        if let Some(cached) = self.cache.get(&ip) {
            return cached.value().clone();
        }

        let info = self.fetch(ip).await.unwrap_or_default();
        // Cache misses too, so a dead provider is asked once per address.
        self.cache.insert(ip, info.clone());
        info
    }

    async fn fetch(&self, ip: IpAddr) -> Option<GeoInfo> {
        let url = format!("{}/{}?fields=status,country,regionName", self.endpoint, ip);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|err| tracing::debug!("geo lookup failed for {ip}: {err}"))
            .ok()?;

        let body: ProviderResponse = response
            .json()
            .await
            .map_err(|err| tracing::debug!("geo response unreadable for {ip}: {err}"))
            .ok()?;

        if body.status != "success" {
            tracing::debug!("geo provider returned {} for {ip}", body.status);
            return None;
        }

        let info = GeoInfo {
            country: body.country.filter(|s| !s.is_empty()),
            region: body.region_name.filter(|s| !s.is_empty()),
        };
        if info.is_empty() {
            None
        } else {
            Some(info)
        }
    }
}

/// Loopback, link-local, private-range, and unspecified addresses are
/// never sent to the public provider.
fn is_private(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(addr) => {
            let octets = addr.octets();
            addr.is_loopback()
                || addr.is_link_local()
                || addr.is_unspecified()
                || addr.is_broadcast()
                || octets[0] == 10
                || (octets[0] == 172 && (16..=31).contains(&octets[1]))
                || (octets[0] == 192 && octets[1] == 168)
        }
        IpAddr::V6(addr) => {
            addr.is_loopback()
                || addr.is_unspecified()
                || (addr.segments()[0] & 0xffc0) == 0xfe80
                || (addr.segments()[0] & 0xfe00) == 0xfc00
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn private_ranges_are_detected() {
        for ip in ["127.0.0.1", "10.1.2.3", "172.16.0.1", "192.168.1.1", "0.0.0.0", "::1"] {
            assert!(is_private(ip.parse().unwrap()), "{ip} should be private");
        }
        assert!(!is_private("8.8.8.8".parse().unwrap()));
    }

    #[tokio::test]
    async fn private_address_short_circuits_to_empty() {
        let client = GeoClient::new(Duration::from_millis(100)).unwrap();
        let info = client.lookup(IpAddr::V4(Ipv4Addr::LOCALHOST)).await;
        assert!(info.is_empty());
    }

    #[tokio::test]
    async fn unreachable_provider_yields_empty_and_is_cached() {
        // Reserved TEST-NET endpoint: the request fails fast.
        let client = GeoClient::with_endpoint(
            "http://192.0.2.1/json",
            Duration::from_millis(200),
        )
        .unwrap();

        let ip: IpAddr = "8.8.8.8".parse().unwrap();
        assert!(client.lookup(ip).await.is_empty());
        // Second call is served from the miss cache.
        assert!(client.cache.contains_key(&ip));
        assert!(client.lookup(ip).await.is_empty());
    }
}
