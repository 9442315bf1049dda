//! Reserved-address classification.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

use crate::error::ProxyError;
use crate::guard::ranges::{ReservedRange, ReservedRanges};
use crate::guard::resolver::ResolvedAddress;

const MALFORMED_LITERAL: &str = "malformed address literal";

/// An address the classifier has cleared for dialing.
///
/// Only [`AddressClassifier::admit`] constructs one, so a fetch can never
/// start from an address that skipped classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllowedAddress(ResolvedAddress);

impl AllowedAddress {
    pub fn ip(&self) -> IpAddr {
        self.0.ip()
    }

    pub fn resolved(&self) -> ResolvedAddress {
        self.0
    }
}

/// Pure classifier over a shared [`ReservedRanges`] table.
#[derive(Debug, Clone)]
pub struct AddressClassifier {
    ranges: Arc<ReservedRanges>,
}

impl AddressClassifier {
    pub fn new(ranges: Arc<ReservedRanges>) -> Self {
        Self { ranges }
    }

    /// Label of the reserved block `ip` falls into, if any.
    ///
    /// IPv6 addresses that embed an IPv4 address (mapped `::ffff:a.b.c.d` or
    /// compatible `::a.b.c.d`) are also checked through the embedded address.
    pub fn classify(&self, ip: IpAddr) -> Option<&'static str> {
        if let Some(range) = self.ranges.find(ip) {
            return Some(range.label);
        }

        match ip {
            IpAddr::V4(_) => None,
            IpAddr::V6(v6) => embedded_ipv4(v6)
                .and_then(|v4| self.ranges.find(IpAddr::V4(v4)))
                .map(|range: &ReservedRange| range.label),
        }
    }

    pub fn is_reserved(&self, ip: IpAddr) -> bool {
        self.classify(ip).is_some()
    }

    /// Classify a textual literal. Anything that does not parse as an IPv4
    /// or IPv6 address counts as reserved.
    pub fn classify_literal(&self, literal: &str) -> Option<&'static str> {
        let trimmed = literal.trim_start_matches('[').trim_end_matches(']');
        match trimmed.parse::<IpAddr>() {
            Ok(ip) => self.classify(ip),
            Err(_) => Some(MALFORMED_LITERAL),
        }
    }

    pub fn is_reserved_literal(&self, literal: &str) -> bool {
        self.classify_literal(literal).is_some()
    }

    /// Clear `address` for dialing or reject it.
    pub fn admit(&self, host: &str, address: ResolvedAddress) -> Result<AllowedAddress, ProxyError> {
        match self.classify(address.ip()) {
            Some(range) => Err(ProxyError::ReservedAddress {
                host: host.to_string(),
                ip: address.ip(),
                range,
            }),
            None => Ok(AllowedAddress(address)),
        }
    }
}

/// IPv4 address carried in the low 32 bits of a mapped or compatible IPv6
/// address. `::` and `::1` are left to the IPv6 table.
fn embedded_ipv4(ip: Ipv6Addr) -> Option<Ipv4Addr> {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return Some(v4);
    }

    let segments = ip.segments();
    if segments[..6] == [0, 0, 0, 0, 0, 0] && (segments[6] != 0 || segments[7] > 1) {
        let [a, b] = segments[6].to_be_bytes();
        let [c, d] = segments[7].to_be_bytes();
        return Some(Ipv4Addr::new(a, b, c, d));
    }

    None
}
